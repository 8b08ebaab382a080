//! Fixed-size preview surfaces that paint an image with a contain fit.

use eframe::egui;
use image::DynamicImage;

use crate::fit::{self, FitRect, PREVIEW_HEIGHT, PREVIEW_WIDTH};
use crate::image_io;

/// Largest texture kept per canvas: twice the canvas for sharp scaling,
/// clamped to the renderer's limit.
fn texture_bounds(max_texture_side: u32) -> (u32, u32) {
    let w = (PREVIEW_WIDTH * 2.0) as u32;
    let h = (PREVIEW_HEIGHT * 2.0) as u32;
    (w.min(max_texture_side).max(1), h.min(max_texture_side).max(1))
}

pub struct PreviewCanvas {
    name: &'static str,
    texture: Option<egui::TextureHandle>,
    natural_size: [usize; 2],
}

impl PreviewCanvas {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            texture: None,
            natural_size: [0, 0],
        }
    }

    /// Decode `bytes` and show them. On a decode failure the canvas keeps
    /// whatever it showed before and `false` is returned.
    pub fn load(&mut self, ctx: &egui::Context, bytes: &[u8]) -> bool {
        match image_io::decode_image(bytes) {
            Ok(img) => {
                self.set_image(ctx, &img);
                true
            }
            Err(e) => {
                log::debug!("{}: {e}", self.name);
                false
            }
        }
    }

    /// Show `img`. The texture is scaled down to at most twice the canvas
    /// size (and never past the renderer's texture limit); the natural size
    /// is kept for placement.
    pub fn set_image(&mut self, ctx: &egui::Context, img: &DynamicImage) {
        let max_side = ctx.input(|i| i.max_texture_side) as u32;
        let (max_w, max_h) = texture_bounds(max_side);

        let natural_size = [img.width() as usize, img.height() as usize];
        let rgba = if img.width() > max_w || img.height() > max_h {
            img.thumbnail(max_w, max_h).to_rgba8()
        } else {
            img.to_rgba8()
        };
        let size = [rgba.width() as usize, rgba.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        self.texture = Some(ctx.load_texture(self.name, color_image, egui::TextureOptions::LINEAR));
        self.natural_size = natural_size;
    }

    /// Size of the uploaded texture, which may be smaller than the image.
    pub fn texture_size(&self) -> Option<[usize; 2]> {
        self.texture.as_ref().map(|tex| tex.size())
    }

    /// Natural width and height of the current image.
    pub fn natural_size(&self) -> Option<[usize; 2]> {
        self.texture.as_ref().map(|_| self.natural_size)
    }

    pub fn fit(&self) -> Option<FitRect> {
        let [w, h] = self.natural_size()?;
        Some(fit::contain_fit(w as f32, h as f32, PREVIEW_WIDTH, PREVIEW_HEIGHT))
    }

    /// Clear the whole surface, then paint the image into its fit rectangle.
    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(PREVIEW_WIDTH, PREVIEW_HEIGHT),
            egui::Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        if let (Some(tex), Some(fit)) = (&self.texture, self.fit()) {
            painter.image(
                tex.id(),
                fit.to_rect(rect.min),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        response
    }
}
