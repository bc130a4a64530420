mod capture;
mod editor;
mod gui;
mod hook;
mod icon_cache;
mod icons;
mod logging;
mod overlay;
mod platform;
mod relaunch;
mod report;
mod settings;
mod tray;

use anyhow::anyhow;

use crate::gui::theme::{POPUP_POS, POPUP_SIZE};
use crate::gui::VolumeOverlayApp;
use crate::settings::Settings;

fn main() -> anyhow::Result<()> {
    if let Err(e) = logging::init() {
        eprintln!("[Main] File logging unavailable: {}", e);
    }
    tracing::info!("=== Volume Overlay {} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load();
    let disabled_glyph =
        icons::disabled_glyph_path().and_then(|path| icons::load_disabled_glyph(&path));

    // stdin reader -> UI loop
    let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();

    // The root viewport is the popup itself. It starts click-through and
    // empty; the first report paints it.
    let viewport_builder = egui::ViewportBuilder::default()
        .with_title("Volume Overlay")
        .with_position(POPUP_POS)
        .with_inner_size(POPUP_SIZE)
        .with_decorations(false)
        .with_transparent(true)
        .with_resizable(false)
        .with_always_on_top()
        .with_taskbar(false)
        .with_mouse_passthrough(true);

    let options = eframe::NativeOptions {
        viewport: viewport_builder,
        ..Default::default()
    };

    tracing::info!("[Main] Starting GUI...");

    // Run the app (this blocks until the window closes)
    eframe::run_native(
        "VolumeOverlay",
        options,
        Box::new(move |cc| {
            let repaint = cc.egui_ctx.clone();
            report::spawn_stdin_reader(inbound_tx, move || repaint.request_repaint());
            Ok(Box::new(VolumeOverlayApp::new(inbound_rx, settings, disabled_glyph)))
        }),
    )
    .map_err(|e| anyhow!("GUI exited with an error: {}", e))?;

    tracing::info!("[Main] Shutdown complete");
    Ok(())
}
