use egui::{CursorIcon, Pos2, Rect, Vec2};

/// Pointer must land within this many pixels of a handle center to grab it.
pub const HANDLE_TOLERANCE: f32 = 6.0;
/// How far from an arrow's spine a point may be and still count as a hit.
pub const ARROW_HIT_TOLERANCE: f32 = 10.0;
/// Resizing refuses to shrink an axis below this many pixels.
pub const MIN_SHAPE_SIZE: f32 = 10.0;
/// A drag must travel more than this on some axis to commit a new shape.
pub const DRAG_COMMIT_DISTANCE: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub fn from_pos2(value: Pos2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Resize handles, one per corner and edge midpoint of a bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// All eight handles with their anchor points on `bounds`, in the order
    /// they are hit-tested (corners take priority over the edges they touch).
    pub fn positions(bounds: Rect) -> [(Handle, Pos2); 8] {
        let c = bounds.center();
        [
            (Handle::TopLeft, bounds.left_top()),
            (Handle::Top, Pos2::new(c.x, bounds.top())),
            (Handle::TopRight, bounds.right_top()),
            (Handle::Right, Pos2::new(bounds.right(), c.y)),
            (Handle::BottomRight, bounds.right_bottom()),
            (Handle::Bottom, Pos2::new(c.x, bounds.bottom())),
            (Handle::BottomLeft, bounds.left_bottom()),
            (Handle::Left, Pos2::new(bounds.left(), c.y)),
        ]
    }

    /// Whether `point` grabs the handle anchored at `anchor`. Uses a square
    /// tolerance zone, not a radius, so corner handles stay easy to catch.
    pub fn hit(anchor: Pos2, point: Pos2) -> bool {
        (point.x - anchor.x).abs() <= HANDLE_TOLERANCE
            && (point.y - anchor.y).abs() <= HANDLE_TOLERANCE
    }

    pub fn cursor(self) -> CursorIcon {
        match self {
            Handle::TopLeft | Handle::BottomRight => CursorIcon::ResizeNwSe,
            Handle::TopRight | Handle::BottomLeft => CursorIcon::ResizeNeSw,
            Handle::Top | Handle::Bottom => CursorIcon::ResizeVertical,
            Handle::Right | Handle::Left => CursorIcon::ResizeHorizontal,
        }
    }
}

/// Distance from `point` to the segment `a`..`b`, clamped to the endpoints.
pub fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.length_sq();
    if ab_len_sq <= f32::EPSILON {
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}
