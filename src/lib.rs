//! Image background remover - library crate.
//!
//! Uploads a picked image to a hosted image service for background removal
//! and shows the original and processed images side by side.

pub mod app;
pub mod cloud;
pub mod config;
pub mod controller;
pub mod fit;
pub mod image_io;
pub mod preview;
pub mod task;
