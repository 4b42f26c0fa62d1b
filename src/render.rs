use tiny_skia::{
    Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Rect, Stroke, StrokeDash, Transform,
};

use crate::geometry::{Handle, Point};
use crate::shape::{Shape, ShapeId, ShapeKind, Tool};
use crate::surface::{Background, Surface};
use crate::text::FontStore;

const ROUNDED_CORNER_RADIUS: f32 = 20.0;
const ARROW_MIN_LENGTH: f32 = 10.0;
const ARROW_BODY_SEGMENTS: usize = 20;
const HIGHLIGHT_RGB: [u8; 3] = [0, 122, 204];
const HANDLE_SIZE: f32 = 8.0;
const DASH_PATTERN: [f32; 2] = [5.0, 5.0];

/// An in-progress drag, drawn on top of everything else until the pointer
/// is released.
pub struct Preview {
    pub tool: Tool,
    pub start: Point,
    pub current: Point,
    pub color: [u8; 4],
    pub stroke_width: f32,
}

/// Composites one full frame: white base, stretched background, every shape
/// in collection order, selection decoration, then any drag preview.
/// Degenerate geometry is skipped rather than reported; a `selected` id not
/// present in `shapes` draws no decoration.
pub fn render(
    surface: &mut Surface,
    background: Option<&Background>,
    shapes: &[Shape],
    selected: Option<ShapeId>,
    preview: Option<&Preview>,
    fonts: &FontStore,
) {
    let width = surface.width();
    let height = surface.height();
    let pixmap = surface.pixmap_mut();

    pixmap.fill(Color::WHITE);

    if let Some(bg) = background {
        let transform = Transform::from_scale(
            width as f32 / bg.width() as f32,
            height as f32 / bg.height() as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        pixmap.draw_pixmap(0, 0, bg.pixmap().as_ref(), &paint, transform, None);
    }

    for shape in shapes {
        draw_shape(pixmap, shape, background.is_some(), fonts);
    }

    if let Some(shape) = selected.and_then(|id| shapes.iter().find(|s| s.id == id)) {
        draw_selection(pixmap, shape, fonts);
    }

    if let Some(preview) = preview {
        draw_preview(pixmap, preview);
    }
}

fn draw_shape(pixmap: &mut Pixmap, shape: &Shape, has_background: bool, fonts: &FontStore) {
    let paint = solid_paint(shape.color);
    let stroke = round_stroke(shape.stroke_width);

    match &shape.kind {
        ShapeKind::Rectangle { start, end } => {
            stroke_box(pixmap, *start, *end, &paint, &stroke);
        }
        ShapeKind::RoundedRectangle { start, end } => {
            stroke_rounded_box(pixmap, *start, *end, &paint, &stroke);
        }
        ShapeKind::Ellipse { start, end } => {
            stroke_oval(pixmap, *start, *end, &paint, &stroke);
        }
        ShapeKind::Arrow { start, end } => {
            draw_arrow(pixmap, *start, *end, shape.stroke_width, shape.color, 1.0);
        }
        ShapeKind::Mosaic {
            start,
            end,
            block_size,
        } => {
            if has_background {
                apply_mosaic(pixmap, *start, *end, *block_size);
            }
        }
        ShapeKind::Text {
            pos,
            content,
            font_size,
        } => {
            fonts.draw(pixmap, content, pos.x, pos.y, *font_size, shape.color);
        }
    }
}

fn draw_preview(pixmap: &mut Pixmap, preview: &Preview) {
    let paint = solid_paint(preview.color);
    let stroke = round_stroke(preview.stroke_width);

    match preview.tool {
        Tool::Rectangle => stroke_box(pixmap, preview.start, preview.current, &paint, &stroke),
        Tool::RoundedRectangle => {
            stroke_rounded_box(pixmap, preview.start, preview.current, &paint, &stroke);
        }
        Tool::Ellipse => stroke_oval(pixmap, preview.start, preview.current, &paint, &stroke),
        Tool::Arrow => {
            // Translucent while dragging so the target stays visible.
            draw_arrow(
                pixmap,
                preview.start,
                preview.current,
                preview.stroke_width,
                preview.color,
                0.7,
            );
        }
        Tool::Mosaic => {
            // The filter itself only runs on commit; the drag shows a frame.
            let mut frame = round_stroke(preview.stroke_width);
            frame.dash = StrokeDash::new(DASH_PATTERN.to_vec(), 0.0);
            let paint = solid_paint([255, 0, 0, 204]);
            stroke_box(pixmap, preview.start, preview.current, &paint, &frame);
        }
        Tool::Text => {}
    }
}

fn solid_paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

fn box_rect(start: Point, end: Point) -> Option<Rect> {
    Rect::from_ltrb(
        start.x.min(end.x),
        start.y.min(end.y),
        start.x.max(end.x),
        start.y.max(end.y),
    )
}

fn stroke_box(pixmap: &mut Pixmap, start: Point, end: Point, paint: &Paint, stroke: &Stroke) {
    if let Some(rect) = box_rect(start, end) {
        let path = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }
}

fn stroke_rounded_box(
    pixmap: &mut Pixmap,
    start: Point,
    end: Point,
    paint: &Paint,
    stroke: &Stroke,
) {
    let x = start.x.min(end.x);
    let y = start.y.min(end.y);
    let w = (end.x - start.x).abs();
    let h = (end.y - start.y).abs();
    let r = ROUNDED_CORNER_RADIUS.min(w / 2.0).min(h / 2.0);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();

    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }
}

fn stroke_oval(pixmap: &mut Pixmap, start: Point, end: Point, paint: &Paint, stroke: &Stroke) {
    let Some(rect) = box_rect(start, end) else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.push_oval(rect);
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }
}

/// Tapered arrow: a filled body that widens from tail to head along a cubic
/// ease-in, capped with a filled triangular head. The body stops where the
/// head begins so the outline stays continuous. Arrows shorter than the
/// minimum draw nothing.
fn draw_arrow(
    pixmap: &mut Pixmap,
    start: Point,
    end: Point,
    stroke_width: f32,
    color: [u8; 4],
    opacity: f32,
) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < ARROW_MIN_LENGTH {
        return;
    }

    let mut paint = solid_paint(color);
    if opacity < 1.0 {
        let alpha = (f32::from(color[3]) * opacity).round() as u8;
        paint.set_color_rgba8(color[0], color[1], color[2], alpha);
    }

    let dir_x = dx / length;
    let dir_y = dy / length;
    let perp_x = -dir_y;
    let perp_y = dir_x;

    let base_width = stroke_width * 0.6;
    let max_width = stroke_width * 2.8;
    let head_length = (length * 0.25).min(30.0);
    let head_width = (stroke_width * 5.0).max(20.0);

    let body_end_x = end.x - head_length * dir_x;
    let body_end_y = end.y - head_length * dir_y;

    if length - head_length > 0.0 {
        let mut top = Vec::with_capacity(ARROW_BODY_SEGMENTS + 1);
        let mut bottom = Vec::with_capacity(ARROW_BODY_SEGMENTS + 1);
        for i in 0..=ARROW_BODY_SEGMENTS {
            let t = i as f32 / ARROW_BODY_SEGMENTS as f32;
            let cx = start.x + t * (body_end_x - start.x);
            let cy = start.y + t * (body_end_y - start.y);
            let half = (base_width + (max_width - base_width) * ease_in_cubic(t)) / 2.0;
            top.push((cx + perp_x * half, cy + perp_y * half));
            bottom.push((cx - perp_x * half, cy - perp_y * half));
        }

        let mut pb = PathBuilder::new();
        pb.move_to(top[0].0, top[0].1);
        for i in 1..top.len() {
            let cp_x = top[i - 1].0 + (top[i].0 - top[i - 1].0) * 0.5;
            let cp_y = top[i - 1].1 + (top[i].1 - top[i - 1].1) * 0.5;
            pb.quad_to(cp_x, cp_y, top[i].0, top[i].1);
        }
        pb.line_to(bottom[bottom.len() - 1].0, bottom[bottom.len() - 1].1);
        for i in (0..bottom.len() - 1).rev() {
            let cp_x = bottom[i + 1].0 + (bottom[i].0 - bottom[i + 1].0) * 0.5;
            let cp_y = bottom[i + 1].1 + (bottom[i].1 - bottom[i + 1].1) * 0.5;
            pb.quad_to(cp_x, cp_y, bottom[i].0, bottom[i].1);
        }
        pb.close();
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    let base_x = end.x - head_length * dir_x;
    let base_y = end.y - head_length * dir_y;
    let mut pb = PathBuilder::new();
    pb.move_to(end.x, end.y);
    pb.line_to(base_x + perp_x * head_width / 2.0, base_y + perp_y * head_width / 2.0);
    pb.line_to(base_x - perp_x * head_width / 2.0, base_y - perp_y * head_width / 2.0);
    pb.close();
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

fn ease_in_cubic(t: f32) -> f32 {
    t * t * t
}

/// Replaces every cell of the region with its average color, sampled from
/// whatever is already composited underneath (background plus earlier
/// shapes). Partial cells at the right and bottom edges average over the
/// pixels they actually contain.
fn apply_mosaic(pixmap: &mut Pixmap, start: Point, end: Point, block_size: u32) {
    let surface_w = pixmap.width() as i64;
    let surface_h = pixmap.height() as i64;

    let x0 = (start.x.min(end.x).round() as i64).clamp(0, surface_w);
    let y0 = (start.y.min(end.y).round() as i64).clamp(0, surface_h);
    let x1 = (start.x.max(end.x).round() as i64).clamp(0, surface_w);
    let y1 = (start.y.max(end.y).round() as i64).clamp(0, surface_h);

    let region_w = (x1 - x0) as usize;
    let region_h = (y1 - y0) as usize;
    if region_w == 0 || region_h == 0 {
        return;
    }

    let block = block_size.max(1) as usize;
    let stride = surface_w as usize * 4;
    let data = pixmap.data_mut();

    let mut block_y = 0;
    while block_y < region_h {
        let cell_h = block.min(region_h - block_y);
        let mut block_x = 0;
        while block_x < region_w {
            let cell_w = block.min(region_w - block_x);

            let mut sums = [0u64; 4];
            for py in 0..cell_h {
                let row = (y0 as usize + block_y + py) * stride;
                for px in 0..cell_w {
                    let idx = row + (x0 as usize + block_x + px) * 4;
                    sums[0] += u64::from(data[idx]);
                    sums[1] += u64::from(data[idx + 1]);
                    sums[2] += u64::from(data[idx + 2]);
                    sums[3] += u64::from(data[idx + 3]);
                }
            }

            let count = (cell_w * cell_h) as u64;
            let avg = [
                (sums[0] / count) as u8,
                (sums[1] / count) as u8,
                (sums[2] / count) as u8,
                (sums[3] / count) as u8,
            ];

            for py in 0..cell_h {
                let row = (y0 as usize + block_y + py) * stride;
                for px in 0..cell_w {
                    let idx = row + (x0 as usize + block_x + px) * 4;
                    data[idx..idx + 4].copy_from_slice(&avg);
                }
            }

            block_x += block;
        }
        block_y += block;
    }
}

fn draw_selection(pixmap: &mut Pixmap, shape: &Shape, fonts: &FontStore) {
    let bounds = shape.bounds(fonts);

    let highlight = match &shape.kind {
        ShapeKind::Arrow { .. } => bounds.expand(10.0),
        // Text keeps its baseline padding below; only sides and top grow.
        ShapeKind::Text { .. } => egui::Rect::from_min_max(
            egui::Pos2::new(bounds.min.x - 5.0, bounds.min.y - 5.0),
            egui::Pos2::new(bounds.max.x + 5.0, bounds.max.y),
        ),
        _ => bounds.expand(5.0),
    };

    let paint = solid_paint([HIGHLIGHT_RGB[0], HIGHLIGHT_RGB[1], HIGHLIGHT_RGB[2], 255]);
    let stroke = Stroke {
        width: 2.0,
        dash: StrokeDash::new(DASH_PATTERN.to_vec(), 0.0),
        ..Default::default()
    };
    if let Some(rect) = Rect::from_ltrb(highlight.min.x, highlight.min.y, highlight.max.x, highlight.max.y)
    {
        let path = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    let fill = solid_paint([HIGHLIGHT_RGB[0], HIGHLIGHT_RGB[1], HIGHLIGHT_RGB[2], 255]);
    let border = solid_paint([255, 255, 255, 255]);
    let border_stroke = Stroke {
        width: 1.0,
        ..Default::default()
    };
    for (_, pos) in Handle::positions(bounds) {
        let Some(square) = Rect::from_xywh(
            pos.x - HANDLE_SIZE / 2.0,
            pos.y - HANDLE_SIZE / 2.0,
            HANDLE_SIZE,
            HANDLE_SIZE,
        ) else {
            continue;
        };
        pixmap.fill_rect(square, &fill, Transform::identity(), None);
        let path = PathBuilder::from_rect(square);
        pixmap.stroke_path(&path, &border, &border_stroke, Transform::identity(), None);
    }
}
