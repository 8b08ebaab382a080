//! Contain-fit placement of an image inside a fixed-size canvas.

use eframe::egui;

/// Preview canvas width in logical pixels.
pub const PREVIEW_WIDTH: f32 = 288.0;
/// Preview canvas height in logical pixels.
pub const PREVIEW_HEIGHT: f32 = 240.0;

/// Where inside a canvas an image is drawn so it keeps its aspect ratio
/// without being cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitRect {
    /// Screen rectangle for this placement, relative to the canvas origin.
    pub fn to_rect(self, origin: egui::Pos2) -> egui::Rect {
        egui::Rect::from_min_size(
            origin + egui::vec2(self.offset_x, self.offset_y),
            egui::vec2(self.draw_width, self.draw_height),
        )
    }
}

/// Letterbox/pillarbox an image of natural size `image_w`×`image_h` into a
/// `canvas_w`×`canvas_h` canvas.
///
/// Wider-than-canvas images use the full width and are centred vertically;
/// everything else uses the full height and is centred horizontally.
pub fn contain_fit(image_w: f32, image_h: f32, canvas_w: f32, canvas_h: f32) -> FitRect {
    let image_aspect = image_w / image_h;
    let canvas_aspect = canvas_w / canvas_h;

    if image_aspect > canvas_aspect {
        let draw_height = canvas_w / image_aspect;
        FitRect {
            draw_width: canvas_w,
            draw_height,
            offset_x: 0.0,
            offset_y: (canvas_h - draw_height) / 2.0,
        }
    } else {
        let draw_width = canvas_h * image_aspect;
        FitRect {
            draw_width,
            draw_height: canvas_h,
            offset_x: (canvas_w - draw_width) / 2.0,
            offset_y: 0.0,
        }
    }
}
