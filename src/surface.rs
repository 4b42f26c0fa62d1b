use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tiny_skia::Pixmap;

pub const MIN_CANVAS_SIZE: u32 = 100;
pub const MAX_CANVAS_SIZE: u32 = 2000;

/// Loaded images are scaled down to fit this box; smaller images keep their
/// natural size.
pub const MAX_FIT_WIDTH: u32 = 1200;
pub const MAX_FIT_HEIGHT: u32 = 800;

/// The raster surface everything is composited onto. Pixels are
/// premultiplied RGBA; straight-alpha conversions happen only at the
/// import/export edges.
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} surface"))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        let size = [self.width() as usize, self.height() as usize];
        egui::ColorImage::from_rgba_unmultiplied(size, &self.demultiplied_rgba())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let image = RgbaImage::from_raw(self.width(), self.height(), self.demultiplied_rgba())
            .ok_or_else(|| anyhow!("cannot construct output image"))?;
        let mut buffer = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .context("cannot encode PNG")?;
        Ok(buffer.into_inner())
    }

    fn demultiplied_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}

/// The optional backdrop bitmap, kept at its natural size and premultiplied
/// once on load so compositing and mosaic sampling can use it directly.
pub struct Background {
    pixmap: Pixmap,
}

impl Background {
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let rgba = image.to_rgba8();
        let mut pixmap = Pixmap::new(image.width(), image.height())
            .ok_or_else(|| anyhow!("cannot allocate background pixmap"))?;
        let data = pixmap.data_mut();
        for (i, pixel) in rgba.pixels().enumerate() {
            let [r, g, b, a] = pixel.0;
            let idx = i * 4;
            data[idx] = premultiply(r, a);
            data[idx + 1] = premultiply(g, a);
            data[idx + 2] = premultiply(b, a);
            data[idx + 3] = a;
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}

/// Shrinks `width`x`height` to fit inside `max_width`x`max_height`,
/// preserving aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut w = width as f32;
    let mut h = height as f32;

    if w > max_width as f32 {
        h = h * max_width as f32 / w;
        w = max_width as f32;
    }
    if h > max_height as f32 {
        w = w * max_height as f32 / h;
        h = max_height as f32;
    }

    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

pub fn validate_canvas_size(width: u32, height: u32) -> Result<()> {
    if !(MIN_CANVAS_SIZE..=MAX_CANVAS_SIZE).contains(&width)
        || !(MIN_CANVAS_SIZE..=MAX_CANVAS_SIZE).contains(&height)
    {
        bail!(
            "Canvas size must be between {MIN_CANVAS_SIZE}x{MIN_CANVAS_SIZE} \
             and {MAX_CANVAS_SIZE}x{MAX_CANVAS_SIZE} pixels."
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{fit_within, validate_canvas_size, Background, Surface};
    use image::{DynamicImage, RgbaImage};

    #[test]
    fn fit_shrinks_oversized_images_preserving_aspect() {
        assert_eq!(fit_within(2400, 1500, 1200, 800), (1200, 750));
        assert_eq!(fit_within(1000, 1600, 1200, 800), (500, 800));
        assert_eq!(fit_within(640, 480, 1200, 800), (640, 480));
    }

    #[test]
    fn fit_chains_both_axes() {
        // Wider than max and, after the width clamp, still taller than max.
        assert_eq!(fit_within(2400, 2400, 1200, 800), (800, 800));
    }

    #[test]
    fn canvas_size_bounds_are_inclusive() {
        assert!(validate_canvas_size(100, 100).is_ok());
        assert!(validate_canvas_size(2000, 2000).is_ok());
        assert!(validate_canvas_size(99, 500).is_err());
        assert!(validate_canvas_size(500, 2001).is_err());
    }

    #[test]
    fn surface_rejects_zero_dimensions() {
        assert!(Surface::new(0, 100).is_err());
        assert!(Surface::new(100, 0).is_err());
    }

    #[test]
    fn encode_png_round_trips_dimensions() {
        let surface = Surface::new(64, 48).unwrap();
        let png = surface.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn background_premultiplies_semi_transparent_pixels() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([200, 100, 50, 128]),
        ));
        let background = Background::from_image(&image).unwrap();
        let pixel = background.pixmap().pixels()[0];
        assert_eq!(pixel.alpha(), 128);
        assert!(pixel.red() <= 128);
        assert_eq!(pixel.red(), ((200u16 * 128 + 127) / 255) as u8);
    }

    #[test]
    fn color_image_matches_surface_size() {
        let surface = Surface::new(32, 16).unwrap();
        let image = surface.to_color_image();
        assert_eq!(image.size, [32, 16]);
    }
}
