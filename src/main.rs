#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    use std::rc::Rc;

    use eframe_whiteboard::resource::native::NativeLoader;
    use eframe_whiteboard::{EditorConfig, WhiteboardApp};

    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config = EditorConfig::from_env();
    // Every argument is an image or video url/path to place on the canvas.
    let sources: Vec<String> = std::env::args().skip(1).collect();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("Whiteboard"),
        ..Default::default()
    };
    eframe::run_native(
        "whiteboard",
        native_options,
        Box::new(move |cc| {
            let loader = Rc::new(NativeLoader::new(Some(cc.egui_ctx.clone())));
            Ok(Box::new(WhiteboardApp::new(cc, config, loader, &sources)))
        }),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {}
