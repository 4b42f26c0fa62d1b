use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use egui::{CursorIcon, Pos2, Vec2};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::geometry::{Handle, Point, DRAG_COMMIT_DISTANCE};
use crate::render::{self, Preview};
use crate::shape::{Shape, ShapeId, ShapeKind, Tool};
use crate::surface::{self, Background, Surface, MAX_FIT_HEIGHT, MAX_FIT_WIDTH};
use crate::text::FontStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Draw,
    Move,
    Resize,
}

#[derive(Clone, Copy, Debug)]
pub struct DragState {
    pub mode: DragMode,
    pub start: Point,
    pub current: Point,
    pub grab_offset: Vec2,
    pub handle: Option<Handle>,
}

#[derive(Clone, Debug)]
pub enum TextEditTarget {
    NewText { pos: Point },
    Existing { shape_id: ShapeId },
}

#[derive(Clone, Debug)]
pub struct TextEditState {
    pub buffer: String,
    pub target: TextEditTarget,
    /// Set when the entry opens so the widget grabs keyboard focus once.
    pub request_focus: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub last_color: [u8; 4],
    pub last_stroke: f32,
    pub last_font_size: f32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_color: [255, 0, 0, 255],
            last_stroke: 4.0,
            last_font_size: 16.0,
        }
    }
}

impl UserSettings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "pixmark", "pixmark")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// The single owner of everything the canvas shows: the surface, the
/// optional background bitmap, the ordered shape collection, the selection
/// and the drag/text-edit sub-states. All pointer coordinates arriving here
/// are in image space; the shell translates from screen space.
pub struct EditorState {
    pub surface: Option<Surface>,
    pub background: Option<Background>,
    pub shapes: Vec<Shape>,
    pub active_tool: Tool,
    pub active_color: [u8; 4],
    pub active_stroke: f32,
    pub active_font_size: f32,
    pub selection: Option<ShapeId>,
    pub drag: Option<DragState>,
    pub text_edit: Option<TextEditState>,
    pub fonts: FontStore,
    pub settings: UserSettings,
    next_id: ShapeId,
    revision: u64,
    composited: u64,
}

impl Default for EditorState {
    fn default() -> Self {
        let settings = UserSettings::load().unwrap_or_default();
        Self {
            surface: None,
            background: None,
            shapes: Vec::new(),
            active_tool: Tool::Rectangle,
            active_color: settings.last_color,
            active_stroke: settings.last_stroke,
            active_font_size: settings.last_font_size,
            selection: None,
            drag: None,
            text_edit: None,
            fonts: FontStore::load(),
            settings,
            next_id: 1,
            revision: 1,
            composited: 0,
        }
    }
}

impl EditorState {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn mark_dirty(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn has_canvas(&self) -> bool {
        self.surface.is_some()
    }

    /// Clear is offered once there is anything to lose.
    pub fn has_content(&self) -> bool {
        self.background.is_some() || !self.shapes.is_empty()
    }

    fn next_shape_id(&mut self) -> ShapeId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selection
            .and_then(|id| self.shapes.iter().find(|shape| shape.id == id))
    }

    pub fn find_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|shape| shape.id == id)
    }

    /// Topmost shape under the point, or none. Later shapes win.
    pub fn shape_at(&self, pos: Pos2) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .find(|shape| shape.contains(pos, &self.fonts))
            .map(|shape| shape.id)
    }

    // ----- canvas lifecycle -----

    pub fn create_blank_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        surface::validate_canvas_size(width, height)?;
        self.surface = Some(Surface::new(width, height)?);
        self.background = None;
        self.reset_editing_state();
        log::debug!("created blank canvas {width}x{height}");
        Ok(())
    }

    /// Replaces the background wholesale. Placed shapes survive an image
    /// swap; only transient input state resets.
    pub fn load_background(&mut self, image: &DynamicImage) -> Result<()> {
        let (width, height) = surface::fit_within(
            image.width(),
            image.height(),
            MAX_FIT_WIDTH,
            MAX_FIT_HEIGHT,
        );
        self.surface = Some(Surface::new(width, height)?);
        self.background = Some(Background::from_image(image)?);
        self.drag = None;
        self.text_edit = None;
        self.mark_dirty();
        log::debug!(
            "loaded background {}x{} shown at {width}x{height}",
            image.width(),
            image.height()
        );
        Ok(())
    }

    /// Drops the whole canvas and returns to the start screen.
    pub fn clear_canvas(&mut self) {
        self.surface = None;
        self.background = None;
        self.reset_editing_state();
    }

    fn reset_editing_state(&mut self) {
        self.shapes.clear();
        self.selection = None;
        self.drag = None;
        self.text_edit = None;
        self.mark_dirty();
    }

    // ----- rendering -----

    /// Re-composites the surface if anything changed since the last call.
    pub fn composite_if_dirty(&mut self) {
        if self.composited == self.revision {
            return;
        }
        let preview = self.current_preview();
        let Some(surface) = self.surface.as_mut() else {
            self.composited = self.revision;
            return;
        };
        render::render(
            surface,
            self.background.as_ref(),
            &self.shapes,
            self.selection,
            preview.as_ref(),
            &self.fonts,
        );
        self.composited = self.revision;
    }

    fn current_preview(&self) -> Option<Preview> {
        let drag = self.drag.as_ref()?;
        if drag.mode != DragMode::Draw {
            return None;
        }
        Some(Preview {
            tool: self.active_tool,
            start: drag.start,
            current: drag.current,
            color: self.active_color,
            stroke_width: self.active_stroke,
        })
    }

    /// Flattens background and shapes, without selection decoration or
    /// preview, into PNG bytes.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        let surface = self.surface.as_ref().context("no canvas to export")?;
        let mut flat = Surface::new(surface.width(), surface.height())?;
        render::render(
            &mut flat,
            self.background.as_ref(),
            &self.shapes,
            None,
            None,
            &self.fonts,
        );
        flat.encode_png()
    }

    // ----- pointer state machine -----

    pub fn pointer_down(&mut self, pos: Pos2) {
        if self.surface.is_none() {
            return;
        }

        // A grabbed handle on the selected shape wins over everything.
        let mut next_drag = None;
        if let Some(shape) = self.selected_shape() {
            for (handle, anchor) in shape.handles(&self.fonts) {
                if Handle::hit(anchor, pos) {
                    next_drag = Some(DragState {
                        mode: DragMode::Resize,
                        start: Point::from_pos2(pos),
                        current: Point::from_pos2(pos),
                        grab_offset: Vec2::ZERO,
                        handle: Some(handle),
                    });
                    break;
                }
            }
            if next_drag.is_none() && shape.contains(pos, &self.fonts) {
                let anchor = shape.anchor();
                next_drag = Some(DragState {
                    mode: DragMode::Move,
                    start: Point::from_pos2(pos),
                    current: Point::from_pos2(pos),
                    grab_offset: Vec2::new(pos.x - anchor.x, pos.y - anchor.y),
                    handle: None,
                });
            }
        }
        if let Some(drag) = next_drag {
            self.drag = Some(drag);
            return;
        }

        // Selecting and dragging an unselected shape is one gesture.
        if let Some(id) = self.shape_at(pos) {
            self.select_shape(id);
            if let Some(shape) = self.selected_shape() {
                let anchor = shape.anchor();
                self.drag = Some(DragState {
                    mode: DragMode::Move,
                    start: Point::from_pos2(pos),
                    current: Point::from_pos2(pos),
                    grab_offset: Vec2::new(pos.x - anchor.x, pos.y - anchor.y),
                    handle: None,
                });
            }
            return;
        }

        if self.selection.is_some() {
            self.selection = None;
            self.mark_dirty();
        }

        // Text placement happens on click, not on drag.
        if self.active_tool == Tool::Text {
            return;
        }

        self.drag = Some(DragState {
            mode: DragMode::Draw,
            start: Point::from_pos2(pos),
            current: Point::from_pos2(pos),
            grab_offset: Vec2::ZERO,
            handle: None,
        });
        self.mark_dirty();
    }

    pub fn pointer_moved(&mut self, pos: Pos2) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.current = Point::from_pos2(pos);
        let mode = drag.mode;
        let grab_offset = drag.grab_offset;
        let handle = drag.handle;

        match mode {
            DragMode::Draw => self.mark_dirty(),
            DragMode::Move => {
                let Some(id) = self.selection else { return };
                if let Some(shape) = self.find_shape_mut(id) {
                    shape.move_to(Point::new(pos.x - grab_offset.x, pos.y - grab_offset.y));
                    self.mark_dirty();
                }
            }
            DragMode::Resize => {
                let (Some(id), Some(handle)) = (self.selection, handle) else {
                    return;
                };
                if let Some(shape) = self.find_shape_mut(id) {
                    shape.resize_from_handle(handle, pos);
                    self.mark_dirty();
                }
            }
        }
    }

    pub fn pointer_up(&mut self, pos: Pos2) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.mode != DragMode::Draw {
            return;
        }

        self.mark_dirty();
        let start = drag.start;
        if (pos.x - start.x).abs() <= DRAG_COMMIT_DISTANCE
            && (pos.y - start.y).abs() <= DRAG_COMMIT_DISTANCE
        {
            return;
        }

        let end = Point::from_pos2(pos);
        let kind = match self.active_tool {
            Tool::Rectangle => ShapeKind::Rectangle { start, end },
            Tool::RoundedRectangle => ShapeKind::RoundedRectangle { start, end },
            Tool::Ellipse => ShapeKind::Ellipse { start, end },
            Tool::Arrow => ShapeKind::Arrow { start, end },
            Tool::Mosaic => ShapeKind::Mosaic {
                start,
                end,
                block_size: mosaic_block_size(self.active_stroke),
            },
            Tool::Text => return,
        };
        let shape = Shape {
            id: self.next_shape_id(),
            kind,
            color: self.active_color,
            stroke_width: self.active_stroke,
        };
        self.shapes.push(shape);
    }

    /// Click with the text tool: select a hit shape, otherwise open the
    /// inline text entry at the click point.
    pub fn click(&mut self, pos: Pos2) {
        if self.surface.is_none() || self.active_tool != Tool::Text {
            return;
        }
        if let Some(id) = self.shape_at(pos) {
            self.select_shape(id);
            return;
        }
        self.text_edit = Some(TextEditState {
            buffer: String::new(),
            target: TextEditTarget::NewText {
                pos: Point::from_pos2(pos),
            },
            request_focus: true,
        });
    }

    /// Double-click opens an existing text shape for editing, with the
    /// current content preloaded.
    pub fn double_click(&mut self, pos: Pos2) {
        if self.surface.is_none() {
            return;
        }
        let Some(id) = self.shape_at(pos) else {
            return;
        };
        let Some(shape) = self.shapes.iter().find(|shape| shape.id == id) else {
            return;
        };
        if let ShapeKind::Text { content, .. } = &shape.kind {
            self.text_edit = Some(TextEditState {
                buffer: content.clone(),
                target: TextEditTarget::Existing { shape_id: id },
                request_focus: true,
            });
        }
    }

    // ----- text editing -----

    pub fn commit_text_edit(&mut self) {
        let Some(edit) = self.text_edit.take() else {
            return;
        };
        let text = edit.buffer.trim().to_string();
        match edit.target {
            TextEditTarget::NewText { pos } => {
                if text.is_empty() {
                    self.mark_dirty();
                    return;
                }
                let shape = Shape {
                    id: self.next_shape_id(),
                    kind: ShapeKind::Text {
                        pos,
                        content: text,
                        font_size: self.active_font_size,
                    },
                    color: self.active_color,
                    stroke_width: self.active_stroke,
                };
                self.shapes.push(shape);
                self.mark_dirty();
            }
            TextEditTarget::Existing { shape_id } => {
                if text.is_empty() {
                    // Editing down to nothing removes the shape.
                    self.shapes.retain(|shape| shape.id != shape_id);
                    if self.selection == Some(shape_id) {
                        self.selection = None;
                    }
                } else if let Some(shape) = self.find_shape_mut(shape_id) {
                    if let ShapeKind::Text { content, .. } = &mut shape.kind {
                        *content = text;
                    }
                }
                self.mark_dirty();
            }
        }
    }

    pub fn cancel_text_edit(&mut self) {
        if self.text_edit.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Anchor of the open text entry in image space, if one is open.
    pub fn text_edit_anchor(&self) -> Option<Point> {
        match &self.text_edit.as_ref()?.target {
            TextEditTarget::NewText { pos } => Some(*pos),
            TextEditTarget::Existing { shape_id } => {
                let shape = self.shapes.iter().find(|shape| shape.id == *shape_id)?;
                match &shape.kind {
                    ShapeKind::Text { pos, .. } => Some(*pos),
                    _ => None,
                }
            }
        }
    }

    /// Style the open text entry should use: the edited shape's for existing
    /// text, the active pickers' for new text.
    pub fn text_edit_style(&self) -> ([u8; 4], f32) {
        if let Some(TextEditState {
            target: TextEditTarget::Existing { shape_id },
            ..
        }) = &self.text_edit
        {
            if let Some(shape) = self.shapes.iter().find(|shape| shape.id == *shape_id) {
                if let ShapeKind::Text { font_size, .. } = &shape.kind {
                    return (shape.color, *font_size);
                }
            }
        }
        (self.active_color, self.active_font_size)
    }

    // ----- keyboard -----

    /// Escape cancels an in-progress drawing and any open text entry.
    pub fn escape(&mut self) {
        let mut changed = false;
        if self.text_edit.take().is_some() {
            changed = true;
        }
        if matches!(
            self.drag,
            Some(DragState {
                mode: DragMode::Draw,
                ..
            })
        ) {
            self.drag = None;
            changed = true;
        }
        if changed {
            self.mark_dirty();
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(selected) = self.selection.take() {
            self.shapes.retain(|shape| shape.id != selected);
            self.mark_dirty();
        }
    }

    // ----- selection and styles -----

    /// Selects a shape and mirrors its style into the active pickers, the
    /// same sync the pickers apply in reverse while the shape stays
    /// selected.
    pub fn select_shape(&mut self, id: ShapeId) {
        self.selection = Some(id);
        if let Some(shape) = self.shapes.iter().find(|shape| shape.id == id) {
            self.active_color = shape.color;
            match &shape.kind {
                ShapeKind::Text { font_size, .. } => self.active_font_size = *font_size,
                ShapeKind::Mosaic { block_size, .. } => {
                    self.active_stroke = *block_size as f32 / 2.0;
                }
                _ => self.active_stroke = shape.stroke_width,
            }
        }
        self.mark_dirty();
    }

    /// Switching tools always drops the selection.
    pub fn set_tool(&mut self, tool: Tool) {
        self.active_tool = tool;
        if self.selection.take().is_some() {
            self.mark_dirty();
        }
    }

    pub fn set_color(&mut self, rgba: [u8; 4]) {
        self.active_color = rgba;
        self.settings.last_color = rgba;
        let _ = self.settings.save();

        if let Some(id) = self.selection {
            if let Some(shape) = self.find_shape_mut(id) {
                if shape.color != rgba {
                    shape.color = rgba;
                    self.mark_dirty();
                }
            }
        }
    }

    pub fn set_stroke(&mut self, width: f32) {
        self.active_stroke = width;
        self.settings.last_stroke = width;
        let _ = self.settings.save();

        if let Some(id) = self.selection {
            if let Some(shape) = self.find_shape_mut(id) {
                match &mut shape.kind {
                    ShapeKind::Mosaic { block_size, .. } => {
                        *block_size = mosaic_block_size(width);
                    }
                    _ => shape.stroke_width = width,
                }
                self.mark_dirty();
            }
        }
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.active_font_size = size;
        self.settings.last_font_size = size;
        let _ = self.settings.save();

        if let Some(id) = self.selection {
            if let Some(shape) = self.find_shape_mut(id) {
                if let ShapeKind::Text { font_size, .. } = &mut shape.kind {
                    *font_size = size;
                    self.mark_dirty();
                }
            }
        }
    }

    /// What the size indicator shows for the current tool or selection.
    pub fn style_display(&self) -> (&'static str, f32) {
        match self.active_tool {
            Tool::Text => ("Font", self.active_font_size),
            Tool::Mosaic => ("Block", self.active_stroke * 2.0),
            _ => ("Stroke", self.active_stroke),
        }
    }

    // ----- cursor affordance -----

    pub fn cursor_hint(&self, pos: Pos2) -> CursorIcon {
        if let Some(drag) = &self.drag {
            return match drag.mode {
                DragMode::Move => CursorIcon::Grabbing,
                DragMode::Resize => drag
                    .handle
                    .map(Handle::cursor)
                    .unwrap_or(CursorIcon::Default),
                DragMode::Draw => CursorIcon::Crosshair,
            };
        }
        if let Some(shape) = self.selected_shape() {
            for (handle, anchor) in shape.handles(&self.fonts) {
                if Handle::hit(anchor, pos) {
                    return handle.cursor();
                }
            }
        }
        if self.shape_at(pos).is_some() {
            return CursorIcon::Grab;
        }
        CursorIcon::Crosshair
    }
}

fn mosaic_block_size(stroke_width: f32) -> u32 {
    (stroke_width * 2.0).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::{DragMode, EditorState, TextEditTarget};
    use crate::shape::{ShapeKind, Tool};
    use egui::Pos2;
    use image::{DynamicImage, RgbaImage};

    fn editor_with_canvas() -> EditorState {
        let mut editor = EditorState::default();
        editor.create_blank_canvas(400, 300).unwrap();
        editor.active_tool = Tool::Rectangle;
        editor.active_color = [255, 0, 0, 255];
        editor.active_stroke = 4.0;
        editor.active_font_size = 16.0;
        editor
    }

    fn draw_rect(editor: &mut EditorState, from: (f32, f32), to: (f32, f32)) {
        editor.pointer_down(Pos2::new(from.0, from.1));
        editor.pointer_moved(Pos2::new(to.0, to.1));
        editor.pointer_up(Pos2::new(to.0, to.1));
    }

    #[test]
    fn tiny_drag_commits_nothing() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (13.0, 13.0));
        assert!(editor.shapes.is_empty());
    }

    #[test]
    fn six_pixel_drag_commits_one_shape() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (16.0, 10.0));
        assert_eq!(editor.shapes.len(), 1);
    }

    #[test]
    fn commit_keeps_drag_direction_in_storage() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (110.0, 60.0), (10.0, 10.0));
        match &editor.shapes[0].kind {
            ShapeKind::Rectangle { start, end } => {
                assert_eq!((start.x, start.y), (110.0, 60.0));
                assert_eq!((end.x, end.y), (10.0, 10.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn select_and_drag_is_one_gesture() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        assert!(editor.selection.is_none(), "drawing must not select");

        editor.pointer_down(Pos2::new(50.0, 30.0));
        let id = editor.shapes[0].id;
        assert_eq!(editor.selection, Some(id));
        assert_eq!(editor.drag.as_ref().unwrap().mode, DragMode::Move);
        editor.pointer_up(Pos2::new(50.0, 30.0));
        assert_eq!(editor.selection, Some(id), "click without drag keeps selection");
    }

    #[test]
    fn overlapping_shapes_hit_topmost_first() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        // Second rect starts on empty space and drags back over the first.
        draw_rect(&mut editor, (150.0, 90.0), (50.0, 30.0));
        assert_eq!(editor.shapes.len(), 2);
        let top_id = editor.shapes[1].id;

        editor.pointer_down(Pos2::new(60.0, 40.0));
        editor.pointer_up(Pos2::new(60.0, 40.0));
        assert_eq!(editor.selection, Some(top_id), "later shapes draw and pick on top");
    }

    #[test]
    fn pointer_down_on_handle_starts_resize_not_move() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.pointer_down(Pos2::new(50.0, 30.0));
        editor.pointer_up(Pos2::new(50.0, 30.0));

        // Bottom-right handle of the normalized bounds.
        editor.pointer_down(Pos2::new(110.0, 60.0));
        let drag = editor.drag.as_ref().unwrap();
        assert_eq!(drag.mode, DragMode::Resize);
        assert!(drag.handle.is_some());
    }

    #[test]
    fn pointer_down_on_empty_space_deselects() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.pointer_down(Pos2::new(50.0, 30.0));
        editor.pointer_up(Pos2::new(50.0, 30.0));
        assert!(editor.selection.is_some());

        editor.pointer_down(Pos2::new(300.0, 200.0));
        assert!(editor.selection.is_none());
        editor.pointer_up(Pos2::new(300.0, 200.0));
    }

    #[test]
    fn move_gesture_translates_shape() {
        let mut editor = editor_with_canvas();
        let background =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 300, image::Rgba([9, 9, 9, 255])));
        editor.load_background(&background).unwrap();

        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.pointer_down(Pos2::new(50.0, 30.0));
        editor.pointer_moved(Pos2::new(70.0, 35.0));
        editor.pointer_up(Pos2::new(70.0, 35.0));

        match &editor.shapes[0].kind {
            ShapeKind::Rectangle { start, end } => {
                assert_eq!((start.x, start.y), (30.0, 15.0));
                assert_eq!((end.x, end.y), (130.0, 65.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let png = editor.export_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[test]
    fn delete_selected_removes_exactly_one_and_clears_selection() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        draw_rect(&mut editor, (150.0, 10.0), (250.0, 60.0));
        editor.pointer_down(Pos2::new(50.0, 30.0));
        editor.pointer_up(Pos2::new(50.0, 30.0));

        editor.delete_selected();
        assert_eq!(editor.shapes.len(), 1);
        assert!(editor.selection.is_none());

        // No selection left, so this must change nothing.
        editor.delete_selected();
        assert_eq!(editor.shapes.len(), 1);
    }

    #[test]
    fn whitespace_text_commit_adds_nothing() {
        let mut editor = editor_with_canvas();
        editor.set_tool(Tool::Text);
        editor.click(Pos2::new(40.0, 50.0));
        editor.text_edit.as_mut().unwrap().buffer = "   ".into();
        editor.commit_text_edit();
        assert!(editor.shapes.is_empty());
        assert!(editor.text_edit.is_none());
    }

    #[test]
    fn text_commit_trims_and_adds_one_shape() {
        let mut editor = editor_with_canvas();
        editor.set_tool(Tool::Text);
        editor.click(Pos2::new(40.0, 50.0));
        editor.text_edit.as_mut().unwrap().buffer = "  hello  ".into();
        editor.commit_text_edit();

        assert_eq!(editor.shapes.len(), 1);
        match &editor.shapes[0].kind {
            ShapeKind::Text { content, pos, .. } => {
                assert_eq!(content, "hello");
                assert_eq!((pos.x, pos.y), (40.0, 50.0));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn editing_text_to_empty_deletes_the_shape() {
        let mut editor = editor_with_canvas();
        editor.set_tool(Tool::Text);
        editor.click(Pos2::new(40.0, 50.0));
        editor.text_edit.as_mut().unwrap().buffer = "note".into();
        editor.commit_text_edit();
        let id = editor.shapes[0].id;
        editor.select_shape(id);

        editor.double_click(Pos2::new(41.0, 49.0));
        match &editor.text_edit.as_ref().unwrap().target {
            TextEditTarget::Existing { shape_id } => assert_eq!(*shape_id, id),
            other => panic!("unexpected target {other:?}"),
        }
        assert_eq!(editor.text_edit.as_ref().unwrap().buffer, "note");

        editor.text_edit.as_mut().unwrap().buffer = "  ".into();
        editor.commit_text_edit();
        assert!(editor.shapes.is_empty());
        assert!(editor.selection.is_none());
    }

    #[test]
    fn text_tool_click_on_shape_selects_instead_of_editing() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.set_tool(Tool::Text);
        editor.click(Pos2::new(50.0, 30.0));
        assert!(editor.selection.is_some());
        assert!(editor.text_edit.is_none());
    }

    #[test]
    fn mosaic_keeps_block_size_after_stroke_changes() {
        let mut editor = editor_with_canvas();
        editor.set_tool(Tool::Mosaic);
        editor.set_stroke(5.0);
        draw_rect(&mut editor, (0.0, 0.0), (50.0, 50.0));

        match &editor.shapes[0].kind {
            ShapeKind::Mosaic { block_size, .. } => assert_eq!(*block_size, 10),
            other => panic!("unexpected kind {other:?}"),
        }

        editor.set_stroke(8.0);
        match &editor.shapes[0].kind {
            ShapeKind::Mosaic { block_size, .. } => {
                assert_eq!(*block_size, 10, "unselected mosaic must keep its block size");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn stroke_change_with_mosaic_selected_updates_block_size() {
        let mut editor = editor_with_canvas();
        editor.set_tool(Tool::Mosaic);
        editor.set_stroke(5.0);
        draw_rect(&mut editor, (0.0, 0.0), (50.0, 50.0));
        let id = editor.shapes[0].id;
        editor.select_shape(id);

        editor.set_stroke(6.0);
        match &editor.shapes[0].kind {
            ShapeKind::Mosaic { block_size, .. } => assert_eq!(*block_size, 12),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn selecting_syncs_shape_style_into_pickers() {
        let mut editor = editor_with_canvas();
        editor.active_color = [1, 2, 3, 255];
        editor.active_stroke = 7.0;
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));

        editor.active_color = [9, 9, 9, 255];
        editor.active_stroke = 2.0;
        let id = editor.shapes[0].id;
        editor.select_shape(id);

        assert_eq!(editor.active_color, [1, 2, 3, 255]);
        assert_eq!(editor.active_stroke, 7.0);
    }

    #[test]
    fn color_change_writes_through_to_selection() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        let id = editor.shapes[0].id;
        editor.select_shape(id);

        editor.set_color([0, 255, 0, 255]);
        assert_eq!(editor.shapes[0].color, [0, 255, 0, 255]);
    }

    #[test]
    fn tool_switch_clears_selection() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        let id = editor.shapes[0].id;
        editor.select_shape(id);

        editor.set_tool(Tool::Arrow);
        assert!(editor.selection.is_none());
    }

    #[test]
    fn escape_cancels_drawing_without_commit() {
        let mut editor = editor_with_canvas();
        editor.pointer_down(Pos2::new(10.0, 10.0));
        editor.pointer_moved(Pos2::new(80.0, 80.0));
        editor.escape();
        editor.pointer_up(Pos2::new(80.0, 80.0));
        assert!(editor.shapes.is_empty());
        assert!(editor.drag.is_none());
    }

    #[test]
    fn canvas_size_validation_rejects_out_of_bounds() {
        let mut editor = EditorState::default();
        assert!(editor.create_blank_canvas(50, 500).is_err());
        assert!(editor.create_blank_canvas(500, 2001).is_err());
        assert!(!editor.has_canvas(), "rejected sizes must not create a canvas");

        assert!(editor.create_blank_canvas(100, 2000).is_ok());
        assert!(editor.has_canvas());
    }

    #[test]
    fn clear_canvas_returns_to_start_screen() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.clear_canvas();
        assert!(!editor.has_canvas());
        assert!(editor.shapes.is_empty());
        assert!(editor.selection.is_none());
        assert!(!editor.has_content());
    }

    #[test]
    fn image_swap_keeps_placed_shapes() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        let background =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 200, image::Rgba([7, 7, 7, 255])));
        editor.load_background(&background).unwrap();
        assert_eq!(editor.shapes.len(), 1);
    }

    #[test]
    fn oversized_background_is_fit_within_limits() {
        let mut editor = EditorState::default();
        let big = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2400,
            1500,
            image::Rgba([4, 4, 4, 255]),
        ));
        editor.load_background(&big).unwrap();
        let surface = editor.surface.as_ref().unwrap();
        assert_eq!((surface.width(), surface.height()), (1200, 750));
    }

    #[test]
    fn stale_selection_operations_are_noops() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));
        editor.selection = Some(999);

        editor.set_color([0, 0, 1, 255]);
        editor.set_stroke(9.0);
        editor.pointer_moved(Pos2::new(50.0, 50.0));
        editor.delete_selected();
        assert_eq!(editor.shapes.len(), 1, "missing ids must never touch shapes");
    }

    #[test]
    fn style_display_follows_tool() {
        let mut editor = editor_with_canvas();
        editor.active_stroke = 4.0;
        editor.active_font_size = 16.0;

        editor.set_tool(Tool::Rectangle);
        assert_eq!(editor.style_display(), ("Stroke", 4.0));
        editor.set_tool(Tool::Mosaic);
        assert_eq!(editor.style_display(), ("Block", 8.0));
        editor.set_tool(Tool::Text);
        assert_eq!(editor.style_display(), ("Font", 16.0));
    }

    #[test]
    fn cursor_reflects_context() {
        let mut editor = editor_with_canvas();
        draw_rect(&mut editor, (10.0, 10.0), (110.0, 60.0));

        assert_eq!(
            editor.cursor_hint(Pos2::new(300.0, 200.0)),
            egui::CursorIcon::Crosshair
        );
        assert_eq!(
            editor.cursor_hint(Pos2::new(50.0, 30.0)),
            egui::CursorIcon::Grab
        );

        let id = editor.shapes[0].id;
        editor.select_shape(id);
        assert_eq!(
            editor.cursor_hint(Pos2::new(110.0, 60.0)),
            egui::CursorIcon::ResizeNwSe
        );
        assert_eq!(
            editor.cursor_hint(Pos2::new(110.0, 35.0)),
            egui::CursorIcon::ResizeHorizontal
        );
    }
}
