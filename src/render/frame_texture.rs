//! Frame texture
//!
//! Holds the GPU texture for the frame currently on screen. The handle is
//! retained here so the bitmap is never disposed while displayed; uploads
//! reuse the allocation once the first frame has been loaded.

use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use image::RgbImage;

/// GPU texture for the current video frame.
#[derive(Default)]
pub struct FrameTexture {
    texture: Option<TextureHandle>,
}

impl FrameTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload an RGB frame, replacing whatever is currently displayed.
    pub fn set(&mut self, ctx: &egui::Context, frame: &RgbImage) {
        let size = [frame.width() as usize, frame.height() as usize];
        let image = ColorImage::from_rgb(size, frame.as_raw());

        match self.texture {
            Some(ref mut texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("video-frame", image, TextureOptions::LINEAR));
            }
        }
    }

    /// Draw the current frame into `area`, letterboxed to preserve aspect.
    pub fn paint(&self, ui: &egui::Ui, area: Rect) {
        if let Some(ref texture) = self.texture {
            let rect = letterbox(texture.size_vec2(), area);
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    pub fn has_frame(&self) -> bool {
        self.texture.is_some()
    }
}

/// Largest rectangle with the frame's aspect ratio that fits in `area`.
fn letterbox(frame: Vec2, area: Rect) -> Rect {
    if frame.x <= 0.0 || frame.y <= 0.0 {
        return area;
    }

    let scale = (area.width() / frame.x).min(area.height() / frame.y);
    let size = frame * scale;
    let min = area.min + (area.size() - size) * 0.5;
    Rect::from_min_size(min, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(width: f32, height: f32) -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(width, height))
    }

    #[test]
    fn wide_frame_is_pillarboxed_vertically() {
        let rect = letterbox(Vec2::new(1920.0, 1080.0), area(960.0, 960.0));
        assert_eq!(rect.width(), 960.0);
        assert_eq!(rect.height(), 540.0);
        // Centered in the spare vertical space
        assert_eq!(rect.min.y, 210.0);
    }

    #[test]
    fn tall_frame_is_pillarboxed_horizontally() {
        let rect = letterbox(Vec2::new(540.0, 960.0), area(960.0, 960.0));
        assert_eq!(rect.height(), 960.0);
        assert_eq!(rect.width(), 540.0);
        assert_eq!(rect.min.x, 210.0);
    }

    #[test]
    fn degenerate_frame_fills_the_area() {
        let rect = letterbox(Vec2::ZERO, area(100.0, 100.0));
        assert_eq!(rect, area(100.0, 100.0));
    }
}
