use anyhow::{Context as _, Result};
use eframe::egui::{self, Context as EguiContext, Key, RichText, TopBottomPanel};
use eframe::{App, Frame};

use crate::action_bar;
use crate::canvas::CanvasView;
use crate::clipboard;
use crate::editor::EditorState;
use crate::loader::{ImageLoader, LoadEvent};
use crate::theme;
use crate::toolbar;
use crate::ui_controls;

const CANVAS_PRESETS: [(u32, u32); 3] = [(800, 600), (1024, 768), (1200, 800)];

pub struct PixmarkApp {
    editor: EditorState,
    canvas: CanvasView,
    loader: ImageLoader,
    theme: theme::AppTheme,
    ui_flags: UiFlags,
}

struct UiFlags {
    show_size_form: bool,
    canvas_width: u32,
    canvas_height: u32,
    show_clear_confirm: bool,
    copy_feedback_until: Option<f64>,
    pending_load: bool,
}

impl Default for UiFlags {
    fn default() -> Self {
        Self {
            show_size_form: false,
            canvas_width: 800,
            canvas_height: 600,
            show_clear_confirm: false,
            copy_feedback_until: None,
            pending_load: false,
        }
    }
}

impl PixmarkApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme = theme::app_theme();
        theme::apply_theme(&cc.egui_ctx, &theme);

        Self {
            editor: EditorState::default(),
            canvas: CanvasView::new(),
            loader: ImageLoader::new(),
            theme,
            ui_flags: UiFlags::default(),
        }
    }

    fn process_loader_events(&mut self) {
        while let Some(event) = self.loader.try_recv() {
            self.ui_flags.pending_load = false;
            match event {
                LoadEvent::Decoded { image, .. } => {
                    if let Err(err) = self.editor.load_background(&image) {
                        show_error("Open failed", &format!("{err:#}"));
                    }
                }
                LoadEvent::Failed { message, .. } => {
                    log::warn!("image decode failed: {message}");
                    show_error("Open failed", &message);
                }
            }
        }
    }

    /// The drop target exists only on the start screen, like the drop zone
    /// it replaces.
    fn handle_dropped_files(&mut self, ctx: &EguiContext) {
        if self.editor.has_canvas() {
            return;
        }
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if let Some(path) = file.path {
            self.loader.load_path(path);
            self.ui_flags.pending_load = true;
        } else if let Some(bytes) = file.bytes {
            self.loader.load_bytes(bytes.to_vec());
            self.ui_flags.pending_load = true;
        }
    }

    fn handle_shortcuts(&mut self, ctx: &EguiContext) {
        // Keys go to whichever text field has focus first.
        if ctx.wants_keyboard_input() {
            return;
        }
        let cmd = ctx.input(|input| input.modifiers.command || input.modifiers.ctrl);

        if ctx.input(|input| input.key_pressed(Key::Escape)) {
            self.editor.escape();
        }

        if !cmd {
            if ctx
                .input(|input| input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace))
            {
                self.editor.delete_selected();
            }
            return;
        }

        if ctx.input(|input| input.key_pressed(Key::C)) {
            if let Err(err) = self.copy_to_clipboard(ctx) {
                show_error("Copy failed", &format!("{err:#}"));
            }
        }

        if ctx.input(|input| input.key_pressed(Key::S)) {
            if let Err(err) = self.save_to_file() {
                show_error("Save failed", &format!("{err:#}"));
            }
        }

        if ctx.input(|input| input.key_pressed(Key::V)) {
            self.paste_image();
        }
    }

    fn paste_image(&mut self) {
        match clipboard::read_image_from_clipboard() {
            Ok(Some(image)) => {
                if let Err(err) = self.editor.load_background(&image) {
                    show_error("Paste failed", &format!("{err:#}"));
                }
            }
            Ok(None) => {}
            Err(err) => show_error("Paste failed", &format!("{err:#}")),
        }
    }

    fn open_image_dialog(&mut self) {
        let file = rfd::FileDialog::new()
            .set_title("Open image")
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
            .pick_file();
        if let Some(path) = file {
            self.loader.load_path(path);
            self.ui_flags.pending_load = true;
        }
    }

    fn create_canvas(&mut self, width: u32, height: u32) {
        match self.editor.create_blank_canvas(width, height) {
            Ok(()) => self.ui_flags.show_size_form = false,
            Err(err) => show_error("Invalid canvas size", &format!("{err:#}")),
        }
    }

    fn copy_to_clipboard(&mut self, ctx: &EguiContext) -> Result<()> {
        if !self.editor.has_canvas() {
            return Ok(());
        }
        let png = self.editor.export_png()?;
        clipboard::write_png_to_clipboard(&png)?;
        self.ui_flags.copy_feedback_until = Some(ctx.input(|input| input.time) + 1.5);
        log::info!("copied composite to clipboard");
        Ok(())
    }

    fn save_to_file(&mut self) -> Result<()> {
        if !self.editor.has_canvas() {
            return Ok(());
        }

        let file = rfd::FileDialog::new()
            .set_title("Save image")
            .set_file_name("edited-image.png")
            .add_filter("PNG", &["png"])
            .save_file();
        let Some(path) = file else {
            return Ok(());
        };

        let png = self.editor.export_png().context("export failed")?;
        std::fs::write(&path, png)
            .with_context(|| format!("cannot save png to {}", path.display()))?;
        log::info!("saved {}", path.display());
        Ok(())
    }

    fn show_clear_dialog(&mut self, ctx: &EguiContext) {
        if !self.ui_flags.show_clear_confirm {
            return;
        }

        let app_theme = self.theme.clone();
        egui::Window::new("Clear canvas")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .frame(ui_controls::card_frame(&app_theme))
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("Remove the image and all shapes? This cannot be undone.")
                        .color(app_theme.text.secondary)
                        .size(15.0),
                );
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui_controls::danger_button(ui, &app_theme, "Clear", egui::vec2(108.0, 32.0))
                        .clicked()
                    {
                        self.editor.clear_canvas();
                        self.ui_flags.show_clear_confirm = false;
                    }
                    if ui_controls::ghost_button(ui, &app_theme, "Cancel", egui::vec2(108.0, 32.0))
                        .clicked()
                    {
                        self.ui_flags.show_clear_confirm = false;
                    }
                });
            });
    }

    fn show_start_screen(&mut self, ui: &mut egui::Ui, ctx: &EguiContext) {
        let app_theme = self.theme.clone();
        let hovering_files = ctx.input(|input| !input.raw.hovered_files.is_empty());

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.16);
            ui.heading("Pixmark");
            ui.label(
                RichText::new("Annotate images with shapes, arrows, mosaic and text")
                    .color(app_theme.text.secondary),
            );
            ui.add_space(24.0);

            let mut card = ui_controls::card_frame(&app_theme);
            if hovering_files {
                card = card.stroke(egui::Stroke::new(2.0, app_theme.surfaces.accent));
            }
            card.show(ui, |ui| {
                ui.set_min_width(430.0);
                if self.ui_flags.show_size_form {
                    self.show_size_form(ui, &app_theme);
                } else {
                    self.show_start_actions(ui, &app_theme, hovering_files);
                }
            });
        });
    }

    fn show_start_actions(
        &mut self,
        ui: &mut egui::Ui,
        app_theme: &theme::AppTheme,
        hovering_files: bool,
    ) {
        ui.vertical_centered(|ui| {
            let drop_hint = if hovering_files {
                "Drop to open"
            } else {
                "Drop an image anywhere in this window"
            };
            ui.label(RichText::new(drop_hint).size(17.0));
            ui.label(RichText::new("or").color(app_theme.text.muted).size(12.0));
            ui.add_space(12.0);

            ui.horizontal(|ui| {
                if ui_controls::primary_button(ui, app_theme, "Open Image…", egui::vec2(132.0, 34.0))
                    .clicked()
                {
                    self.open_image_dialog();
                }
                if ui_controls::ghost_button(ui, app_theme, "Paste", egui::vec2(96.0, 34.0))
                    .on_hover_text("Paste an image from the clipboard (Ctrl+V)")
                    .clicked()
                {
                    self.paste_image();
                }
                if ui_controls::ghost_button(ui, app_theme, "Blank Canvas", egui::vec2(120.0, 34.0))
                    .clicked()
                {
                    self.ui_flags.show_size_form = true;
                }
            });

            if self.ui_flags.pending_load {
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(
                        RichText::new("Decoding image…")
                            .color(app_theme.text.muted)
                            .size(13.0),
                    );
                });
            }
        });
    }

    fn show_size_form(&mut self, ui: &mut egui::Ui, app_theme: &theme::AppTheme) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Blank canvas size").size(16.0));
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label(RichText::new("Width").color(app_theme.text.muted).size(12.0));
                ui.add(
                    egui::DragValue::new(&mut self.ui_flags.canvas_width)
                        .clamp_range(1..=4000)
                        .suffix(" px"),
                );
                ui.add_space(8.0);
                ui.label(RichText::new("Height").color(app_theme.text.muted).size(12.0));
                ui.add(
                    egui::DragValue::new(&mut self.ui_flags.canvas_height)
                        .clamp_range(1..=4000)
                        .suffix(" px"),
                );
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                for (width, height) in CANVAS_PRESETS {
                    if ui_controls::ghost_button(
                        ui,
                        app_theme,
                        &format!("{width}×{height}"),
                        egui::vec2(96.0, 30.0),
                    )
                    .clicked()
                    {
                        self.create_canvas(width, height);
                    }
                }
            });

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui_controls::primary_button(ui, app_theme, "Create", egui::vec2(108.0, 32.0))
                    .clicked()
                {
                    let (width, height) =
                        (self.ui_flags.canvas_width, self.ui_flags.canvas_height);
                    self.create_canvas(width, height);
                }
                if ui_controls::ghost_button(ui, app_theme, "Back", egui::vec2(96.0, 32.0))
                    .clicked()
                {
                    self.ui_flags.show_size_form = false;
                }
            });
        });
    }
}

fn show_error(title: &str, message: &str) {
    log::warn!("{title}: {message}");
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .show();
}

impl App for PixmarkApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        self.process_loader_events();
        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        let app_theme = self.theme.clone();

        if !self.editor.has_canvas() {
            egui::CentralPanel::default()
                .frame(egui::Frame::none().fill(app_theme.surfaces.app_bg))
                .show(ctx, |ui| {
                    self.show_start_screen(ui, ctx);
                });
            if self.ui_flags.pending_load {
                ctx.request_repaint_after(std::time::Duration::from_millis(50));
            }
            return;
        }

        TopBottomPanel::top("toolbar")
            .exact_height(app_theme.layout.toolbar_height)
            .frame(ui_controls::toolbar_frame(&app_theme))
            .show(ctx, |ui| {
                toolbar::show_toolbar(ui, &mut self.editor);
            });

        let copied_feedback = self
            .ui_flags
            .copy_feedback_until
            .is_some_and(|deadline| ctx.input(|input| input.time) <= deadline);

        let action_output = TopBottomPanel::bottom("action_bar")
            .exact_height(app_theme.layout.action_bar_height)
            .frame(ui_controls::toolbar_frame(&app_theme))
            .show(ctx, |ui| {
                action_bar::show_action_bar(ui, &self.editor, copied_feedback)
            })
            .inner;

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(app_theme.surfaces.app_bg)
                    .inner_margin(egui::Margin::symmetric(
                        app_theme.layout.space_3,
                        app_theme.layout.space_2,
                    )),
            )
            .show(ctx, |ui| {
                self.canvas.show(ui, ctx, &mut self.editor);
            });

        self.show_clear_dialog(ctx);

        if action_output.delete {
            self.editor.delete_selected();
        }
        if action_output.clear {
            self.ui_flags.show_clear_confirm = true;
        }
        if action_output.copy {
            if let Err(err) = self.copy_to_clipboard(ctx) {
                show_error("Copy failed", &format!("{err:#}"));
            }
        }
        if action_output.save {
            if let Err(err) = self.save_to_file() {
                show_error("Save failed", &format!("{err:#}"));
            }
        }
    }
}
