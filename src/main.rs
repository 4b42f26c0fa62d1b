mod action_bar;
mod app;
mod canvas;
mod clipboard;
mod editor;
mod geometry;
mod loader;
mod render;
mod shape;
mod surface;
mod text;
mod theme;
mod toolbar;
mod ui_controls;

use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let viewport = egui::ViewportBuilder::default()
        .with_title("Pixmark")
        .with_inner_size([1360.0, 900.0])
        .with_min_inner_size([900.0, 620.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Pixmark",
        options,
        Box::new(|cc| Box::new(app::PixmarkApp::new(cc))),
    )
}
