use egui::{
    vec2, Color32, Context, FontId, Id, Key, Pos2, Rect, Response, ScrollArea, Sense, Stroke,
    TextureHandle, TextureOptions, Ui,
};

use crate::editor::{EditorState, TextEditTarget};
use crate::theme;

/// Inline text entry offsets, in image pixels above the text anchor.
const NEW_TEXT_ENTRY_LIFT: f32 = 10.0;
const EDIT_TEXT_ENTRY_LIFT: f32 = 20.0;

/// Shows the composited surface as one texture and feeds pointer input back
/// into the editor. The texture is re-uploaded only when the editor revision
/// moved on.
pub struct CanvasView {
    texture: Option<TextureHandle>,
    uploaded_revision: u64,
}

impl CanvasView {
    pub fn new() -> Self {
        Self {
            texture: None,
            uploaded_revision: 0,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, ctx: &Context, editor: &mut EditorState) {
        if !editor.has_canvas() {
            self.texture = None;
            return;
        }

        editor.composite_if_dirty();
        self.ensure_texture(ctx, editor);
        let Some(texture) = self.texture.as_ref() else {
            return;
        };
        let image_size = texture.size_vec2();
        let texture_id = texture.id();

        let available = ui.available_size();
        let canvas_size = vec2(
            (image_size.x + 48.0).max(available.x),
            (image_size.y + 48.0).max(available.y),
        );

        ScrollArea::both()
            .id_source("pixmark_canvas_scroll")
            .show(ui, |ui| {
                let (canvas_rect, response) =
                    ui.allocate_exact_size(canvas_size, Sense::click_and_drag());

                let origin = Pos2::new(
                    canvas_rect.center().x - image_size.x * 0.5,
                    canvas_rect.center().y - image_size.y * 0.5,
                );
                let image_rect = Rect::from_min_size(origin, image_size);

                let painter = ui.painter_at(canvas_rect);
                let theme = theme::app_theme();
                painter.rect_filled(canvas_rect, 16.0, theme.surfaces.canvas_bg);
                let image_card = image_rect.expand(10.0);
                painter.rect_filled(image_card, 12.0, theme.surfaces.card_bg);
                painter.rect_stroke(image_card, 12.0, Stroke::new(1.0, theme.surfaces.stroke_soft));

                painter.image(
                    texture_id,
                    image_rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );

                handle_pointer_interaction(ctx, editor, &response, image_rect);
                draw_text_entry(ui, editor, image_rect);
            });
    }

    fn ensure_texture(&mut self, ctx: &Context, editor: &EditorState) {
        let Some(surface) = editor.surface.as_ref() else {
            self.texture = None;
            return;
        };
        if self.texture.is_some() && self.uploaded_revision == editor.revision() {
            return;
        }
        let image = surface.to_color_image();
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("pixmark_canvas", image, TextureOptions::LINEAR));
            }
        }
        self.uploaded_revision = editor.revision();
    }
}

fn handle_pointer_interaction(
    ctx: &Context,
    editor: &mut EditorState,
    response: &Response,
    image_rect: Rect,
) {
    let pointer_pos = response
        .interact_pointer_pos()
        .or_else(|| response.hover_pos());
    let Some(pointer_pos) = pointer_pos else {
        return;
    };
    let image_pos = screen_to_image(pointer_pos, image_rect);

    // A press on the canvas blurs and commits an open text entry before the
    // press itself is interpreted.
    let pressed_here = ctx.input(|input| input.pointer.primary_pressed())
        && (response.drag_started() || response.is_pointer_button_down_on());
    if pressed_here && editor.text_edit.is_some() {
        editor.commit_text_edit();
    }

    if response.double_clicked() {
        editor.double_click(image_pos);
        return;
    }

    if response.drag_started() {
        let start = ctx
            .input(|input| input.pointer.press_origin())
            .map(|pos| screen_to_image(pos, image_rect))
            .unwrap_or(image_pos);
        editor.pointer_down(start);
    }

    if response.dragged() {
        editor.pointer_moved(image_pos);
    }

    if response.drag_stopped() {
        editor.pointer_up(image_pos);
    }

    // A plain click is a press and release in place: it runs the selection
    // logic and, for the text tool, opens the inline entry.
    if response.clicked() {
        editor.pointer_down(image_pos);
        editor.pointer_up(image_pos);
        editor.click(image_pos);
    }

    if response.hovered() || response.dragged() {
        ctx.set_cursor_icon(editor.cursor_hint(image_pos));
    }
}

fn draw_text_entry(ui: &mut Ui, editor: &mut EditorState, image_rect: Rect) {
    let Some(edit) = editor.text_edit.as_ref() else {
        return;
    };
    let Some(anchor) = editor.text_edit_anchor() else {
        editor.cancel_text_edit();
        return;
    };

    let lift = match edit.target {
        TextEditTarget::NewText { .. } => NEW_TEXT_ENTRY_LIFT,
        TextEditTarget::Existing { .. } => EDIT_TEXT_ENTRY_LIFT,
    };
    let screen_pos = image_to_screen(anchor.to_pos2(), image_rect) - vec2(0.0, lift);
    let (color, font_size) = editor.text_edit_style();
    let text_color = Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3]);

    let mut buffer = edit.buffer.clone();
    let request_focus = edit.request_focus;
    let mut commit = false;
    let mut cancel = false;

    egui::Area::new(Id::new("pixmark_text_entry"))
        .order(egui::Order::Foreground)
        .fixed_pos(screen_pos)
        .show(ui.ctx(), |ui| {
            let theme = theme::app_theme();
            egui::Frame::none()
                .fill(theme.surfaces.card_bg)
                .rounding(egui::Rounding::same(4.0))
                .stroke(Stroke::new(1.0, theme.surfaces.accent))
                .inner_margin(egui::Margin::symmetric(6.0, 4.0))
                .show(ui, |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut buffer)
                            .font(FontId::proportional(font_size))
                            .text_color(text_color)
                            .desired_width(220.0)
                            .hint_text("Type text..."),
                    );
                    if request_focus {
                        response.request_focus();
                    }

                    if ui.input(|input| input.key_pressed(Key::Escape)) {
                        cancel = true;
                    } else if response.lost_focus() {
                        // Enter and click-away both land here; both commit.
                        commit = true;
                    }
                });
        });

    if cancel {
        editor.cancel_text_edit();
        return;
    }

    if let Some(edit) = editor.text_edit.as_mut() {
        edit.buffer = buffer;
        edit.request_focus = false;
    }
    if commit {
        editor.commit_text_edit();
    }
}

fn image_to_screen(pos: Pos2, image_rect: Rect) -> Pos2 {
    Pos2::new(image_rect.min.x + pos.x, image_rect.min.y + pos.y)
}

fn screen_to_image(pos: Pos2, image_rect: Rect) -> Pos2 {
    Pos2::new(pos.x - image_rect.min.x, pos.y - image_rect.min.y)
}
