use egui::{Color32, Pos2, Rect, Vec2};

use crate::geometry::{distance_to_segment, Handle, Point, ARROW_HIT_TOLERANCE, MIN_SHAPE_SIZE};
use crate::text::FontStore;

pub type ShapeId = u64;

/// Visual extent of a text shape above and below its baseline.
pub const TEXT_ASCENT: f32 = 20.0;
pub const TEXT_DESCENT: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Arrow,
    Mosaic,
    Text,
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub color: [u8; 4],
    pub stroke_width: f32,
}

/// Corner pairs are stored exactly as dragged; `start` may lie on any side
/// of `end`. Normalization happens in `bounds`, never in storage, so resize
/// and move keep operating on the corners the user actually placed.
#[derive(Clone, Debug)]
pub enum ShapeKind {
    Rectangle {
        start: Point,
        end: Point,
    },
    RoundedRectangle {
        start: Point,
        end: Point,
    },
    Ellipse {
        start: Point,
        end: Point,
    },
    Arrow {
        start: Point,
        end: Point,
    },
    Mosaic {
        start: Point,
        end: Point,
        block_size: u32,
    },
    Text {
        pos: Point,
        content: String,
        font_size: f32,
    },
}

impl Shape {
    pub fn color32(&self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.color[0], self.color[1], self.color[2], self.color[3])
    }

    pub fn bounds(&self, fonts: &FontStore) -> Rect {
        match &self.kind {
            ShapeKind::Rectangle { start, end }
            | ShapeKind::RoundedRectangle { start, end }
            | ShapeKind::Ellipse { start, end }
            | ShapeKind::Arrow { start, end }
            | ShapeKind::Mosaic { start, end, .. } => {
                Rect::from_two_pos(start.to_pos2(), end.to_pos2())
            }
            ShapeKind::Text {
                pos,
                content,
                font_size,
            } => {
                let width = fonts.measure(content, *font_size);
                Rect::from_min_max(
                    Pos2::new(pos.x, pos.y - TEXT_ASCENT),
                    Pos2::new(pos.x + width, pos.y + TEXT_DESCENT),
                )
            }
        }
    }

    pub fn contains(&self, point: Pos2, fonts: &FontStore) -> bool {
        match &self.kind {
            ShapeKind::Rectangle { .. }
            | ShapeKind::RoundedRectangle { .. }
            | ShapeKind::Mosaic { .. }
            | ShapeKind::Text { .. } => self.bounds(fonts).contains(point),
            ShapeKind::Ellipse { start, end } => {
                let center_x = (start.x + end.x) / 2.0;
                let center_y = (start.y + end.y) / 2.0;
                let radius_x = (end.x - start.x).abs() / 2.0;
                let radius_y = (end.y - start.y).abs() / 2.0;
                if radius_x <= 0.0 || radius_y <= 0.0 {
                    return false;
                }
                let nx = (point.x - center_x) / radius_x;
                let ny = (point.y - center_y) / radius_y;
                nx * nx + ny * ny <= 1.0
            }
            ShapeKind::Arrow { start, end } => {
                distance_to_segment(point, start.to_pos2(), end.to_pos2()) <= ARROW_HIT_TOLERANCE
            }
        }
    }

    /// Reference point used by move operations: the normalized top-left
    /// corner for box shapes, the tail for arrows, the baseline anchor for
    /// text.
    pub fn anchor(&self) -> Point {
        match &self.kind {
            ShapeKind::Rectangle { start, end }
            | ShapeKind::RoundedRectangle { start, end }
            | ShapeKind::Ellipse { start, end }
            | ShapeKind::Mosaic { start, end, .. } => {
                Point::new(start.x.min(end.x), start.y.min(end.y))
            }
            ShapeKind::Arrow { start, .. } => *start,
            ShapeKind::Text { pos, .. } => *pos,
        }
    }

    /// Translates the whole shape so its anchor lands on `new_anchor`.
    pub fn move_to(&mut self, new_anchor: Point) {
        let anchor = self.anchor();
        let delta = Vec2::new(new_anchor.x - anchor.x, new_anchor.y - anchor.y);
        match &mut self.kind {
            ShapeKind::Rectangle { start, end }
            | ShapeKind::RoundedRectangle { start, end }
            | ShapeKind::Ellipse { start, end }
            | ShapeKind::Arrow { start, end }
            | ShapeKind::Mosaic { start, end, .. } => {
                start.translate(delta);
                end.translate(delta);
            }
            ShapeKind::Text { pos, .. } => pos.translate(delta),
        }
    }

    pub fn handles(&self, fonts: &FontStore) -> [(Handle, Pos2); 8] {
        Handle::positions(self.bounds(fonts))
    }

    /// Drags one handle to `pointer`. Box shapes refuse to shrink an axis
    /// below the minimum size; the update on that axis is simply skipped.
    /// Arrows reinterpret top handles as the tail and bottom handles as the
    /// head. Text does not resize.
    pub fn resize_from_handle(&mut self, handle: Handle, pointer: Pos2) {
        match &mut self.kind {
            ShapeKind::Rectangle { start, end }
            | ShapeKind::RoundedRectangle { start, end }
            | ShapeKind::Ellipse { start, end }
            | ShapeKind::Mosaic { start, end, .. } => {
                resize_box(start, end, handle, pointer);
            }
            ShapeKind::Arrow { start, end } => match handle {
                Handle::TopLeft | Handle::Top | Handle::TopRight => {
                    *start = Point::from_pos2(pointer);
                }
                Handle::BottomRight | Handle::Bottom | Handle::BottomLeft => {
                    *end = Point::from_pos2(pointer);
                }
                Handle::Right => end.x = pointer.x,
                Handle::Left => start.x = pointer.x,
            },
            ShapeKind::Text { .. } => {}
        }
    }
}

fn resize_box(start: &mut Point, end: &mut Point, handle: Handle, pointer: Pos2) {
    let can_pull_x = pointer.x < end.x - MIN_SHAPE_SIZE;
    let can_pull_y = pointer.y < end.y - MIN_SHAPE_SIZE;
    let can_push_x = pointer.x > start.x + MIN_SHAPE_SIZE;
    let can_push_y = pointer.y > start.y + MIN_SHAPE_SIZE;

    match handle {
        Handle::TopLeft => {
            if can_pull_x {
                start.x = pointer.x;
            }
            if can_pull_y {
                start.y = pointer.y;
            }
        }
        Handle::Top => {
            if can_pull_y {
                start.y = pointer.y;
            }
        }
        Handle::TopRight => {
            if can_push_x {
                end.x = pointer.x;
            }
            if can_pull_y {
                start.y = pointer.y;
            }
        }
        Handle::Right => {
            if can_push_x {
                end.x = pointer.x;
            }
        }
        Handle::BottomRight => {
            if can_push_x {
                end.x = pointer.x;
            }
            if can_push_y {
                end.y = pointer.y;
            }
        }
        Handle::Bottom => {
            if can_push_y {
                end.y = pointer.y;
            }
        }
        Handle::BottomLeft => {
            if can_pull_x {
                start.x = pointer.x;
            }
            if can_push_y {
                end.y = pointer.y;
            }
        }
        Handle::Left => {
            if can_pull_x {
                start.x = pointer.x;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Shape, ShapeKind};
    use crate::geometry::Handle;
    use crate::text::FontStore;
    use egui::Pos2;

    fn rect_shape(start: (f32, f32), end: (f32, f32)) -> Shape {
        Shape {
            id: 1,
            kind: ShapeKind::Rectangle {
                start: Point::new(start.0, start.1),
                end: Point::new(end.0, end.1),
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        }
    }

    #[test]
    fn bounds_normalize_inverted_corners() {
        let fonts = FontStore::load();
        let shape = rect_shape((110.0, 60.0), (10.0, 20.0));
        let bounds = shape.bounds(&fonts);
        assert_eq!(bounds.min, Pos2::new(10.0, 20.0));
        assert_eq!(bounds.max, Pos2::new(110.0, 60.0));
    }

    #[test]
    fn every_variant_contains_its_center() {
        let fonts = FontStore::load();
        let kinds = vec![
            ShapeKind::Rectangle {
                start: Point::new(10.0, 10.0),
                end: Point::new(110.0, 60.0),
            },
            ShapeKind::RoundedRectangle {
                start: Point::new(10.0, 10.0),
                end: Point::new(110.0, 60.0),
            },
            ShapeKind::Ellipse {
                start: Point::new(10.0, 10.0),
                end: Point::new(110.0, 60.0),
            },
            ShapeKind::Arrow {
                start: Point::new(10.0, 10.0),
                end: Point::new(110.0, 60.0),
            },
            ShapeKind::Mosaic {
                start: Point::new(10.0, 10.0),
                end: Point::new(110.0, 60.0),
                block_size: 8,
            },
            ShapeKind::Text {
                pos: Point::new(10.0, 40.0),
                content: "hello".into(),
                font_size: 16.0,
            },
        ];

        for kind in kinds {
            let shape = Shape {
                id: 1,
                kind,
                color: [255, 0, 0, 255],
                stroke_width: 4.0,
            };
            let center = shape.bounds(&fonts).center();
            assert!(shape.contains(center, &fonts), "center missed: {:?}", shape.kind);
        }
    }

    #[test]
    fn move_round_trip_restores_coordinates() {
        let mut shape = rect_shape((10.0, 10.0), (110.0, 60.0));
        let anchor = shape.anchor();
        shape.move_to(Point::new(anchor.x + 20.0, anchor.y + 5.0));
        shape.move_to(Point::new(anchor.x, anchor.y));
        match shape.kind {
            ShapeKind::Rectangle { start, end } => {
                assert_eq!(start, Point::new(10.0, 10.0));
                assert_eq!(end, Point::new(110.0, 60.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn anchor_is_normalized_min_for_inverted_boxes() {
        let shape = rect_shape((110.0, 60.0), (10.0, 20.0));
        assert_eq!(shape.anchor(), Point::new(10.0, 20.0));
    }

    #[test]
    fn resize_guard_refuses_to_collapse_axis() {
        let mut shape = rect_shape((10.0, 10.0), (110.0, 60.0));
        shape.resize_from_handle(Handle::BottomRight, Pos2::new(15.0, 70.0));
        match shape.kind {
            ShapeKind::Rectangle { start, end } => {
                assert_eq!(start, Point::new(10.0, 10.0));
                assert_eq!(end.x, 110.0, "x axis must not collapse");
                assert_eq!(end.y, 70.0, "y axis still follows the pointer");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn resize_se_follows_pointer_when_guard_allows() {
        let mut shape = rect_shape((10.0, 10.0), (110.0, 60.0));
        shape.resize_from_handle(Handle::BottomRight, Pos2::new(140.0, 90.0));
        match shape.kind {
            ShapeKind::Rectangle { end, .. } => assert_eq!(end, Point::new(140.0, 90.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn arrow_top_handles_move_the_tail() {
        let mut shape = Shape {
            id: 1,
            kind: ShapeKind::Arrow {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 100.0),
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        };
        shape.resize_from_handle(Handle::TopLeft, Pos2::new(-20.0, -30.0));
        match shape.kind {
            ShapeKind::Arrow { start, end } => {
                assert_eq!(start, Point::new(-20.0, -30.0));
                assert_eq!(end, Point::new(100.0, 100.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn arrow_side_handles_move_only_x() {
        let mut shape = Shape {
            id: 1,
            kind: ShapeKind::Arrow {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 100.0),
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        };
        shape.resize_from_handle(Handle::Right, Pos2::new(150.0, 999.0));
        match shape.kind {
            ShapeKind::Arrow { end, .. } => assert_eq!(end, Point::new(150.0, 100.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn text_resize_is_a_noop() {
        let mut shape = Shape {
            id: 1,
            kind: ShapeKind::Text {
                pos: Point::new(30.0, 40.0),
                content: "note".into(),
                font_size: 16.0,
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        };
        shape.resize_from_handle(Handle::BottomRight, Pos2::new(500.0, 500.0));
        match shape.kind {
            ShapeKind::Text { pos, .. } => assert_eq!(pos, Point::new(30.0, 40.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn zero_radius_ellipse_contains_nothing() {
        let fonts = FontStore::load();
        let shape = Shape {
            id: 1,
            kind: ShapeKind::Ellipse {
                start: Point::new(50.0, 10.0),
                end: Point::new(50.0, 60.0),
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        };
        assert!(!shape.contains(Pos2::new(50.0, 35.0), &fonts));
    }

    #[test]
    fn arrow_hit_respects_tolerance() {
        let fonts = FontStore::load();
        let shape = Shape {
            id: 1,
            kind: ShapeKind::Arrow {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 0.0),
            },
            color: [255, 0, 0, 255],
            stroke_width: 4.0,
        };
        assert!(shape.contains(Pos2::new(50.0, 9.0), &fonts));
        assert!(!shape.contains(Pos2::new(50.0, 11.0), &fonts));
    }
}
