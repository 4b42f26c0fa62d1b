use egui::{vec2, Align, Layout, Ui};

use crate::editor::EditorState;
use crate::theme;
use crate::ui_controls;

pub struct ActionBarOutput {
    pub save: bool,
    pub copy: bool,
    pub delete: bool,
    pub clear: bool,
}

/// Which actions are available: save and copy need a canvas, delete needs a
/// selection, clear needs content worth losing.
pub fn enablement(editor: &EditorState) -> (bool, bool, bool, bool) {
    let canvas = editor.has_canvas();
    (
        canvas,
        canvas,
        editor.selection.is_some(),
        editor.has_content(),
    )
}

pub fn show_action_bar(ui: &mut Ui, editor: &EditorState, copied_feedback: bool) -> ActionBarOutput {
    let theme = theme::app_theme();
    let action_h = 28.0;
    let button_gap = theme.layout.space_3;
    let (can_save, can_copy, can_delete, can_clear) = enablement(editor);

    let mut out = ActionBarOutput {
        save: false,
        copy: false,
        delete: false,
        clear: false,
    };

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing = vec2(button_gap, 0.0);

        let delete_button = ui.add_enabled_ui(can_delete, |ui| {
            ui_controls::ghost_button(ui, &theme, "Delete", vec2(92.0, action_h))
                .on_hover_text("Delete selected shape (Del)")
        });
        if delete_button.inner.clicked() {
            out.delete = true;
        }

        let clear_button = ui.add_enabled_ui(can_clear, |ui| {
            ui_controls::danger_button(ui, &theme, "Clear", vec2(92.0, action_h))
                .on_hover_text("Remove the image and all shapes")
        });
        if clear_button.inner.clicked() {
            out.clear = true;
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.add_space(theme.layout.space_2);

            let save_button = ui.add_enabled_ui(can_save, |ui| {
                ui_controls::primary_button(ui, &theme, "Save", vec2(108.0, action_h))
                    .on_hover_text("Download as PNG (Ctrl+S)")
            });
            if save_button.inner.clicked() {
                out.save = true;
            }

            ui.add_space(button_gap);

            let copy_text = if copied_feedback { "Copied" } else { "Copy" };
            let copy_button = ui.add_enabled_ui(can_copy, |ui| {
                ui_controls::ghost_button(ui, &theme, copy_text, vec2(96.0, action_h))
                    .on_hover_text("Copy PNG to clipboard (Ctrl+C)")
            });
            if copy_button.inner.clicked() {
                out.copy = true;
            }
        });
    });

    out
}

#[cfg(test)]
mod tests {
    use super::enablement;
    use crate::editor::EditorState;
    use egui::Pos2;

    #[test]
    fn actions_unlock_as_state_accumulates() {
        let mut editor = EditorState::default();
        assert_eq!(enablement(&editor), (false, false, false, false));

        editor.create_blank_canvas(400, 300).unwrap();
        let (save, copy, delete, clear) = enablement(&editor);
        assert!(save && copy);
        assert!(!delete, "nothing selected yet");
        assert!(!clear, "blank canvas has nothing to clear");

        editor.pointer_down(Pos2::new(10.0, 10.0));
        editor.pointer_moved(Pos2::new(80.0, 80.0));
        editor.pointer_up(Pos2::new(80.0, 80.0));
        let (_, _, delete, clear) = enablement(&editor);
        assert!(!delete);
        assert!(clear, "a shape is content");

        let id = editor.shapes[0].id;
        editor.select_shape(id);
        let (_, _, delete, _) = enablement(&editor);
        assert!(delete);
    }
}
