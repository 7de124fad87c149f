//! Texture cache for rendered basemap frames.
//!
//! The canvas is only re-rendered when the view changes, so the GPU texture
//! is only re-uploaded when a new frame exists.

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};

/// Holds the texture for the most recently uploaded frame.
pub struct BasemapTextureCache {
    texture: Option<TextureHandle>,
    /// Frame number the texture was uploaded from
    frame: Option<u64>,
}

impl Default for BasemapTextureCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BasemapTextureCache {
    pub fn new() -> Self {
        Self {
            texture: None,
            frame: None,
        }
    }

    /// Check if the cache holds the texture for the given frame.
    pub fn is_valid(&self, frame: u64) -> bool {
        self.frame == Some(frame) && self.texture.is_some()
    }

    /// Upload a newly rendered frame, reusing the texture allocation when
    /// one exists.
    pub fn update(&mut self, ctx: &egui::Context, frame: u64, image: ColorImage) {
        log::debug!(
            "Uploading basemap frame {}: {}x{}",
            frame,
            image.width(),
            image.height()
        );

        let options = TextureOptions {
            magnification: egui::TextureFilter::Linear,
            minification: egui::TextureFilter::Linear,
            ..Default::default()
        };

        match &mut self.texture {
            Some(texture) => texture.set(image, options),
            None => self.texture = Some(ctx.load_texture("basemap_texture", image, options)),
        }
        self.frame = Some(frame);
    }

    /// Get the cached texture if available.
    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }
}
