use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use tiny_skia::Pixmap;

/// Loads one system font at startup and answers every text measurement and
/// rasterization request from it. Without a usable font, measurement falls
/// back to a per-character estimate so hit-testing keeps working; drawing
/// becomes a no-op.
pub struct FontStore {
    font: Option<FontArc>,
}

impl FontStore {
    pub fn load() -> Self {
        let font = load_system_font();
        if font.is_none() {
            log::warn!("no usable system font found; text will not be rasterized");
        }
        Self { font }
    }

    /// Advance width of `text` at `size` pixels, matching what `draw` will
    /// actually produce when a font is loaded.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                let mut width = 0.0;
                let mut prev = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(prev_id) = prev {
                        width += scaled.kern(prev_id, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            None => text.chars().count() as f32 * size * 0.6,
        }
    }

    /// Rasterizes `text` with its baseline-left corner at (`x`, `y`),
    /// blending straight onto the premultiplied pixmap.
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, size: f32, color: [u8; 4]) {
        let Some(font) = &self.font else {
            return;
        };

        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;

        let mut caret = x;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev_id) = prev {
                caret += scaled.kern(prev_id, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, y));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let data = pixmap.data_mut();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let idx = (py * width + px) as usize * 4;
                blend_premultiplied(&mut data[idx..idx + 4], color, coverage.min(1.0));
            });
        }
    }
}

/// Source-over blend of a straight-alpha color, scaled by glyph coverage,
/// into one premultiplied RGBA pixel.
fn blend_premultiplied(dst: &mut [u8], color: [u8; 4], coverage: f32) {
    let alpha = f32::from(color[3]) / 255.0 * coverage;
    if alpha <= 0.0 {
        return;
    }
    let inv = 1.0 - alpha;
    for channel in 0..3 {
        let src = f32::from(color[channel]) / 255.0 * alpha;
        let out = src + f32::from(dst[channel]) / 255.0 * inv;
        dst[channel] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    let out_a = alpha + f32::from(dst[3]) / 255.0 * inv;
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn load_system_font() -> Option<FontArc> {
    if let Ok(path) = std::env::var("PIXMARK_FONT") {
        if let Some(font) = read_font(&path) {
            log::info!("using font from PIXMARK_FONT: {path}");
            return Some(font);
        }
        log::warn!("PIXMARK_FONT set but unreadable: {path}");
    }

    let candidates = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Helvetica.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
        "C:\\Windows\\Fonts\\segoeui.ttf",
    ];

    for path in candidates {
        if let Some(font) = read_font(path) {
            log::debug!("loaded system font {path}");
            return Some(font);
        }
    }

    None
}

fn read_font(path: &str) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::{blend_premultiplied, FontStore};

    #[test]
    fn fallback_measure_scales_with_length_and_size() {
        let fonts = FontStore { font: None };
        assert_eq!(fonts.measure("hello", 20.0), 5.0 * 20.0 * 0.6);
        assert_eq!(fonts.measure("", 20.0), 0.0);
        assert!(fonts.measure("hello", 30.0) > fonts.measure("hello", 20.0));
    }

    #[test]
    fn draw_without_font_is_a_noop() {
        let fonts = FontStore { font: None };
        let mut pixmap = tiny_skia::Pixmap::new(8, 8).unwrap();
        fonts.draw(&mut pixmap, "hi", 1.0, 6.0, 12.0, [255, 0, 0, 255]);
        assert!(pixmap.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn blend_full_coverage_opaque_replaces_pixel() {
        let mut dst = [10, 20, 30, 255];
        blend_premultiplied(&mut dst, [200, 100, 50, 255], 1.0);
        assert_eq!(dst, [200, 100, 50, 255]);
    }

    #[test]
    fn blend_zero_coverage_leaves_pixel() {
        let mut dst = [10, 20, 30, 40];
        blend_premultiplied(&mut dst, [200, 100, 50, 255], 0.0);
        assert_eq!(dst, [10, 20, 30, 40]);
    }
}
