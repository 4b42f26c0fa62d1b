use std::ops::RangeInclusive;

use egui::{vec2, Align, Align2, Color32, FontId, Layout, Pos2, RichText, Shape, Stroke, Ui};

use crate::editor::EditorState;
use crate::shape::Tool;
use crate::theme;
use crate::ui_controls;

const PALETTE: [[u8; 4]; 8] = [
    [0xFF, 0x00, 0x00, 0xFF],
    [0xDD, 0x6B, 0x20, 0xFF],
    [0xD6, 0x9E, 0x2E, 0xFF],
    [0x38, 0xA1, 0x69, 0xFF],
    [0x31, 0x82, 0xCE, 0xFF],
    [0x80, 0x5A, 0xD5, 0xFF],
    [0xFF, 0xFF, 0xFF, 0xFF],
    [0x1A, 0x20, 0x2C, 0xFF],
];

pub fn show_toolbar(ui: &mut Ui, editor: &mut EditorState) {
    let theme = theme::app_theme();

    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
        ui.spacing_mut().item_spacing = vec2(theme.layout.control_gap, 0.0);

        tool_button(ui, editor, Tool::Rectangle, "Rectangle");
        tool_button(ui, editor, Tool::RoundedRectangle, "Rounded rectangle");
        tool_button(ui, editor, Tool::Ellipse, "Ellipse");
        tool_button(ui, editor, Tool::Arrow, "Arrow");
        tool_button(ui, editor, Tool::Mosaic, "Mosaic");
        tool_button(ui, editor, Tool::Text, "Text");

        group_separator(ui, &theme);
        render_palette(ui, editor, &theme);

        group_separator(ui, &theme);
        size_control(ui, editor, &theme);
    });
}

fn group_separator(ui: &mut Ui, theme: &theme::AppTheme) {
    ui.add_space(theme.layout.space_1);
    ui_controls::vertical_divider(ui, theme, theme.controls.chip_size);
    ui.add_space(theme.layout.space_1);
}

fn render_palette(ui: &mut Ui, editor: &mut EditorState, theme: &theme::AppTheme) {
    for color in PALETTE.iter() {
        let color32 = Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3]);
        let selected = editor.active_color == *color;
        if ui_controls::color_chip(ui, theme, color32, selected)
            .on_hover_text("Choose color")
            .clicked()
        {
            editor.set_color(*color);
        }
    }

    // Free picker for colors outside the palette.
    let active = editor.active_color;
    let mut custom = Color32::from_rgba_unmultiplied(active[0], active[1], active[2], active[3]);
    if ui
        .color_edit_button_srgba(&mut custom)
        .on_hover_text("Custom color")
        .changed()
    {
        editor.set_color([custom.r(), custom.g(), custom.b(), custom.a()]);
    }
}

/// One size control serves every tool: font size for text, block size for
/// mosaic, stroke width for the rest.
fn size_control(ui: &mut Ui, editor: &mut EditorState, theme: &theme::AppTheme) {
    let (label, shown) = editor.style_display();
    ui.label(RichText::new(label).color(theme.text.muted).size(12.0));

    let mut value = shown;
    let response = ui.add(
        egui::DragValue::new(&mut value)
            .clamp_range(size_control_range(editor.active_tool))
            .speed(1.0)
            .fixed_decimals(0),
    );
    if response.changed() && value != shown {
        match editor.active_tool {
            Tool::Text => editor.set_font_size(value),
            Tool::Mosaic => editor.set_stroke(value / 2.0),
            _ => editor.set_stroke(value),
        }
    }
}

fn size_control_range(tool: Tool) -> RangeInclusive<f32> {
    match tool {
        Tool::Text => 8.0..=72.0,
        Tool::Mosaic => 2.0..=40.0,
        _ => 1.0..=20.0,
    }
}

fn tool_button(ui: &mut Ui, editor: &mut EditorState, tool: Tool, hint: &str) {
    let theme = theme::app_theme();
    let selected = editor.active_tool == tool;
    let response = ui_controls::tool_chip(ui, &theme, selected).on_hover_text(hint);
    draw_tool_icon(ui, response.rect, tool, selected);
    if response.clicked() {
        editor.set_tool(tool);
    }
}

fn draw_tool_icon(ui: &Ui, rect: egui::Rect, tool: Tool, selected: bool) {
    let theme = theme::app_theme();
    let color = if selected {
        theme.text.primary
    } else {
        theme.text.secondary
    };
    let stroke = Stroke::new(1.65, color);
    let painter = ui.painter();
    let icon_rect = rect.shrink(8.0);

    match tool {
        Tool::Rectangle => {
            painter.rect_stroke(icon_rect, 0.0, stroke);
        }
        Tool::RoundedRectangle => {
            painter.rect_stroke(icon_rect, 5.0, stroke);
        }
        Tool::Ellipse => {
            let radius = icon_rect.width().min(icon_rect.height()) * 0.5;
            painter.circle_stroke(icon_rect.center(), radius, stroke);
        }
        Tool::Arrow => {
            let start = icon_rect.left_bottom();
            let tip = icon_rect.right_top();
            painter.line_segment([start, tip], stroke);
            let dir = (tip - start).normalized();
            let normal = vec2(-dir.y, dir.x);
            let base = tip - dir * 6.0;
            painter.add(Shape::convex_polygon(
                vec![tip, base + normal * 3.5, base - normal * 3.5],
                color,
                Stroke::NONE,
            ));
        }
        Tool::Mosaic => {
            let cell = icon_rect.width() * 0.5;
            for row in 0..2 {
                for col in 0..2 {
                    if (row + col) % 2 == 0 {
                        let min = Pos2::new(
                            icon_rect.left() + col as f32 * cell,
                            icon_rect.top() + row as f32 * cell,
                        );
                        painter.rect_filled(
                            egui::Rect::from_min_size(min, vec2(cell, cell)),
                            0.0,
                            color,
                        );
                    }
                }
            }
            painter.rect_stroke(icon_rect, 0.0, Stroke::new(1.0, color));
        }
        Tool::Text => {
            painter.text(
                icon_rect.center(),
                Align2::CENTER_CENTER,
                "T",
                FontId::proportional(15.0),
                color,
            );
        }
    }
}
