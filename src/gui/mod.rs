pub mod overlay_view;
pub mod settings_window;
pub mod theme;
pub mod tray_view;
pub mod widgets;

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use image::RgbaImage;

use crate::capture::KeyEvent;
use crate::editor::SettingsEditor;
use crate::hook::KeyboardHook;
use crate::icons::{IconResolver, ResolvedIcon};
use crate::overlay::{OverlayContent, OverlayState};
use crate::platform::{DesktopShell, PlatformShell, ProcessTable, SysinfoProcesses};
use crate::report::{Inbound, VolumeLevel, VolumeReport};
use crate::settings::{settings_path, Settings};
use crate::tray::{MutedTray, TrayChange};

use self::settings_window::EditorAction;
use self::tray_view::TrayTexture;

/// Open settings editor plus where it was placed
struct EditorWindow {
    editor: SettingsEditor,
    position: Option<egui::Pos2>,
}

// Main Application GUI - owns the popup, the tray and the editor
pub struct VolumeOverlayApp<S = PlatformShell, P = SysinfoProcesses> {
    /// Reports and commands from the stdin reader
    inbound_rx: Receiver<Inbound>,

    /// Settings currently in effect
    settings: Settings,

    overlay: OverlayState,
    popup_texture: Option<egui::TextureHandle>,
    icons: IconResolver<S, P>,
    tray: MutedTray<TrayTexture>,

    editor: Option<EditorWindow>,
    key_tx: Sender<KeyEvent>,
    key_rx: Receiver<KeyEvent>,
    hook: Option<KeyboardHook>,

    /// Last values sent to the window manager, to avoid spamming it
    last_passthrough: Option<bool>,
    last_popup_size: Option<egui::Vec2>,
    texture_seq: u64,
}

impl VolumeOverlayApp {
    pub fn new(
        inbound_rx: Receiver<Inbound>,
        settings: Settings,
        disabled_glyph: Option<RgbaImage>,
    ) -> Self {
        let icons =
            IconResolver::new(PlatformShell::new(), SysinfoProcesses::new(), disabled_glyph);
        Self::with_icons(inbound_rx, settings, icons)
    }
}

impl<S: DesktopShell, P: ProcessTable> VolumeOverlayApp<S, P> {
    fn with_icons(
        inbound_rx: Receiver<Inbound>,
        settings: Settings,
        icons: IconResolver<S, P>,
    ) -> Self {
        let (key_tx, key_rx) = crossbeam_channel::unbounded();
        Self {
            inbound_rx,
            settings,
            overlay: OverlayState::default(),
            popup_texture: None,
            icons,
            tray: MutedTray::new(),
            editor: None,
            key_tx,
            key_rx,
            hook: None,
            last_passthrough: None,
            last_popup_size: None,
            texture_seq: 0,
        }
    }

    fn next_texture_name(&mut self, prefix: &str) -> String {
        self.texture_seq += 1;
        format!("{}-{}", prefix, self.texture_seq)
    }

    fn handle_report(&mut self, ctx: &egui::Context, report: VolumeReport, now: Instant) {
        // Tray first: it follows every report, even with the popup disabled
        let tray_name = self.next_texture_name("tray");
        let icons = &mut self.icons;
        let change = self.tray.apply(&report, |name| {
            let resolved = icons.resolve_tray_icon(name);
            let texture = resolved
                .image
                .map(|image| widgets::upload_icon(ctx, &tray_name, &image));
            (resolved.app_name, texture)
        });
        match change {
            TrayChange::Added => tracing::info!("[Tray] '{}' muted", report.app_name),
            TrayChange::Removed => tracing::info!("[Tray] '{}' unmuted", report.app_name),
            TrayChange::Emptied => tracing::info!("[Tray] Last app unmuted, hiding tray"),
            TrayChange::Unchanged => {}
        }

        if !self.settings.overlay_enabled {
            return;
        }

        // The popup always shows the undimmed icon; only the tray marks mutes
        let resolved = match report.level {
            VolumeLevel::Level(_) => self.icons.resolve(&report.app_name, false),
            VolumeLevel::NoSource => ResolvedIcon {
                app_name: self.icons.display_name(&report.app_name),
                image: None,
            },
        };
        let content = OverlayContent::select(&resolved.app_name, report.level, resolved.image);

        self.popup_texture = match &content {
            OverlayContent::Volume { icon, .. } => {
                let name = self.next_texture_name("popup");
                Some(widgets::upload_icon(ctx, &name, icon))
            }
            OverlayContent::NoSource { .. } => None,
        };

        tracing::debug!("[Overlay] Showing '{}'", content.message());
        self.overlay.show(content, now);
    }

    fn open_editor(&mut self, ctx: &egui::Context) {
        if self.editor.is_some() {
            ctx.send_viewport_cmd_to(
                egui::ViewportId::from_hash_of("settings_viewport"),
                egui::ViewportCommand::Focus,
            );
            return;
        }
        tracing::info!("[Settings] Opening editor");
        let monitor = ctx.input(|i| i.viewport().monitor_size);
        self.editor = Some(EditorWindow {
            editor: SettingsEditor::open(settings_path()),
            position: settings_window::centered_position(monitor),
        });
    }

    fn close_editor(&mut self) {
        self.editor = None;
        self.hook = None;
    }

    fn apply_saved(&mut self, saved: Settings) {
        let relaunch = self.settings.hotkeys_differ(&saved);
        self.settings = saved;
        if !self.settings.overlay_enabled {
            self.overlay.hide();
        }
        tracing::info!(
            "[Settings] Applied (overlay {})",
            if self.settings.overlay_enabled { "on" } else { "off" }
        );
        self.close_editor();

        if relaunch {
            tracing::info!("[Settings] Hotkeys changed, relaunching");
            crate::relaunch::relaunch_and_exit();
        }
    }

    /// Run one editor frame. Panics inside it close the editor instead of the app.
    fn update_editor(&mut self, ctx: &egui::Context) {
        let Some(window) = self.editor.as_mut() else {
            return;
        };

        // Keys captured by the global listener since the last frame
        while let Ok(event) = self.key_rx.try_recv() {
            window.editor.handle_key(&event);
        }

        let position = window.position;
        let editor = &mut window.editor;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            settings_window::show_settings(ctx, editor, position)
        }));

        match result {
            Ok(EditorAction::None) => {}
            Ok(EditorAction::Saved(saved)) => self.apply_saved(saved),
            Ok(EditorAction::Close) => {
                tracing::info!("[Settings] Editor closed");
                self.close_editor();
            }
            Err(_) => {
                tracing::error!("[Settings] Editor crashed, closing it");
                self.close_editor();
            }
        }

        self.sync_hook(ctx);
    }

    /// Keep the keyboard hook installed exactly while a field is capturing
    fn sync_hook(&mut self, ctx: &egui::Context) {
        let capturing = self
            .editor
            .as_ref()
            .and_then(|w| w.editor.capturing())
            .is_some();

        match (capturing, self.hook.is_some()) {
            (true, false) => {
                let repaint = ctx.clone();
                self.hook = Some(KeyboardHook::install(self.key_tx.clone(), move || {
                    repaint.request_repaint()
                }));
            }
            (false, true) => {
                self.hook = None;
                // Drop keys that arrived after the capture ended
                while self.key_rx.try_recv().is_ok() {}
            }
            _ => {}
        }
    }

    /// Hidden popups stay mapped but ignore the mouse
    fn sync_root_window(&mut self, ctx: &egui::Context) {
        let passthrough = !self.overlay.is_visible();
        if self.last_passthrough != Some(passthrough) {
            ctx.send_viewport_cmd(egui::ViewportCommand::MousePassthrough(passthrough));
            self.last_passthrough = Some(passthrough);
        }

        if let Some(content) = self.overlay.content() {
            let size = overlay_view::popup_size(ctx, content);
            if self.last_popup_size != Some(size) {
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
                self.last_popup_size = Some(size);
            }
        }
    }
}

impl<S: DesktopShell, P: ProcessTable> eframe::App for VolumeOverlayApp<S, P> {
    /// Clear to full transparency so a hidden popup shows nothing
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // --- Poll the stdin reader ---
        while let Ok(inbound) = self.inbound_rx.try_recv() {
            match inbound {
                Inbound::Report(report) => self.handle_report(ctx, report, now),
                Inbound::OpenSettings => self.open_editor(ctx),
            }
        }

        // --- Fade timers ---
        self.overlay.poll(now);
        self.sync_root_window(ctx);

        // === Popup (root viewport) ===
        let mut open_settings = false;
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::TRANSPARENT))
            .show(ctx, |ui| {
                if !self.overlay.is_visible() {
                    return;
                }
                let Some(content) = self.overlay.content() else {
                    return;
                };
                let rect = ui.max_rect();
                overlay_view::draw_popup(
                    ui,
                    rect,
                    content,
                    self.popup_texture.as_ref(),
                    self.overlay.opacity(),
                );

                let response = ui.interact(rect, ui.id().with("popup_menu"), egui::Sense::click());
                response.context_menu(|ui| {
                    if ui.button("⚙ Settings").clicked() {
                        open_settings = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("❌ Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        if open_settings {
            self.open_editor(ctx);
        }

        // === Muted tray ===
        tray_view::show_tray(ctx, &self.tray);

        // === Settings editor ===
        self.update_editor(ctx);

        // Sleep until the next fade step; reports and keys wake us earlier
        if let Some(deadline) = self.overlay.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
    }
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::FOCUSED_TAG;
    use crate::platform::fake::{FakeProcesses, FakeShell, FAKE_ICON_PIXEL};
    use std::path::PathBuf;

    type TestApp = VolumeOverlayApp<FakeShell, FakeProcesses>;

    fn app(settings: Settings, shell: FakeShell) -> TestApp {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let icons = IconResolver::new(shell, FakeProcesses::new(&[(20, "brave.exe")]), None);
        VolumeOverlayApp::with_icons(rx, settings, icons)
    }

    fn report(app: &mut TestApp, ctx: &egui::Context, name: &str, level: VolumeLevel) {
        app.handle_report(ctx, VolumeReport::new(name, level), Instant::now());
    }

    fn popup_message(app: &TestApp) -> Option<String> {
        app.overlay.content().map(|c| c.message())
    }

    #[test]
    fn test_disabled_overlay_still_tracks_mutes() {
        let ctx = egui::Context::default();
        let settings = Settings {
            overlay_enabled: false,
            ..Settings::default()
        };
        let mut app = app(settings, FakeShell::new(None));

        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.0));
        assert!(app.tray.contains("brave.exe"));
        assert!(!app.overlay.is_visible());
        assert!(app.popup_texture.is_none());

        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.5));
        assert!(!app.tray.is_visible());
        assert!(!app.overlay.is_visible());
    }

    #[test]
    fn test_no_source_shows_fallback_and_leaves_tray_alone() {
        let ctx = egui::Context::default();
        let mut app = app(Settings::default(), FakeShell::new(None));

        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.0));
        report(&mut app, &ctx, "brave.exe", VolumeLevel::NoSource);

        assert!(app.tray.contains("brave.exe"));
        assert!(app.overlay.is_visible());
        assert!(app.popup_texture.is_none());
        assert_eq!(
            popup_message(&app).as_deref(),
            Some("No audio source detected for brave.exe")
        );
    }

    #[test]
    fn test_focused_no_source_names_foreground_app() {
        let ctx = egui::Context::default();
        let mut app = app(Settings::default(), FakeShell::new(Some(20)));

        report(&mut app, &ctx, FOCUSED_TAG, VolumeLevel::NoSource);
        assert_eq!(
            popup_message(&app).as_deref(),
            Some("No audio source detected for brave.exe")
        );
        assert!(app.popup_texture.is_none());
    }

    #[test]
    fn test_focused_icon_failure_names_foreground_app() {
        let ctx = egui::Context::default();
        let mut shell = FakeShell::new(Some(20));
        shell.broken = Some(PathBuf::from("/apps/brave.exe"));
        let mut app = app(Settings::default(), shell);

        report(&mut app, &ctx, FOCUSED_TAG, VolumeLevel::Level(0.4));
        assert_eq!(
            popup_message(&app).as_deref(),
            Some("No audio source detected for brave.exe")
        );
    }

    #[test]
    fn test_muted_report_shows_undimmed_popup_icon() {
        let ctx = egui::Context::default();
        let mut app = app(Settings::default(), FakeShell::new(None));

        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.0));
        assert!(app.popup_texture.is_some());
        assert_eq!(popup_message(&app).as_deref(), Some("0%"));

        let Some(OverlayContent::Volume { icon, .. }) = app.overlay.content() else {
            panic!("expected the volume layout");
        };
        let px = icon.get_pixel(icon.width() / 2, icon.height() / 2).0;
        for c in 0..3 {
            let diff = (px[c] as i32 - FAKE_ICON_PIXEL[c] as i32).abs();
            assert!(diff <= 1, "channel {} is {}", c, px[c]);
        }

        // The tray still gets its own muted entry
        assert!(app.tray.contains("brave.exe"));
    }

    #[test]
    fn test_saving_with_overlay_off_hides_popup() {
        let ctx = egui::Context::default();
        let mut app = app(Settings::default(), FakeShell::new(None));
        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.5));
        assert!(app.overlay.is_visible());

        let saved = Settings {
            overlay_enabled: false,
            ..app.settings.clone()
        };
        app.apply_saved(saved);
        assert!(!app.overlay.is_visible());
        assert!(!app.settings.overlay_enabled);

        report(&mut app, &ctx, "brave.exe", VolumeLevel::Level(0.7));
        assert!(!app.overlay.is_visible());
    }
}
