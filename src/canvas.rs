use eframe::egui::ColorImage;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::color::Rgb;
use crate::error::Result;
use crate::grid::CellRect;
use crate::snapshot;

/// What the tools need from a raster surface.
pub trait RenderSurface {
    /// Fill a device-space rectangle, clipped to the surface.
    fn fill_rect(&mut self, rect: CellRect, color: Rgb);

    /// Color of the single pixel under a device-space position, `None`
    /// outside the surface.
    fn pixel_at(&self, x: f32, y: f32) -> Option<Rgb>;

    /// Draw an external image at the origin, stretched to the surface size.
    fn draw_image(&mut self, image: &RgbaImage);

    /// Encode the current bitmap as a snapshot string.
    fn export_snapshot(&self) -> Result<String>;
}

// ============================================================================
// RasterCanvas: CPU bitmap backing the drawing field
// ============================================================================

pub struct RasterCanvas {
    pixels: RgbaImage,
}

impl RasterCanvas {
    /// A blank white square canvas.
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size, size, Rgb::WHITE.into()),
        }
    }

    /// Copy of the bitmap in the form egui uploads as a texture.
    pub fn to_color_image(&self) -> ColorImage {
        let (w, h) = self.pixels.dimensions();
        ColorImage::from_rgba_unmultiplied([w as usize, h as usize], self.pixels.as_raw())
    }

    /// Clamp a rectangle edge pair to `[0, limit]` pixel indices.
    fn span(start: f32, len: f32, limit: u32) -> (u32, u32) {
        let lo = start.round().clamp(0.0, limit as f32) as u32;
        let hi = (start + len).round().clamp(0.0, limit as f32) as u32;
        (lo, hi)
    }
}

impl RenderSurface for RasterCanvas {
    fn fill_rect(&mut self, rect: CellRect, color: Rgb) {
        let (w, h) = self.pixels.dimensions();
        let (x0, x1) = Self::span(rect.x, rect.w, w);
        let (y0, y1) = Self::span(rect.y, rect.h, h);
        let px: Rgba<u8> = color.into();
        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.put_pixel(x, y, px);
            }
        }
    }

    fn pixel_at(&self, x: f32, y: f32) -> Option<Rgb> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        self.pixels
            .get_pixel_checked(x.floor() as u32, y.floor() as u32)
            .map(|px| Rgb::from(*px))
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (w, h) = self.pixels.dimensions();
        if image.dimensions() == (w, h) {
            imageops::overlay(&mut self.pixels, image, 0, 0);
        } else {
            let scaled = imageops::resize(image, w, h, FilterType::Nearest);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    fn export_snapshot(&self) -> Result<String> {
        snapshot::encode_data_url(&self.pixels)
    }
}
