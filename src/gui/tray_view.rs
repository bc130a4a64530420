use eframe::egui::{self, Color32, Context, Vec2};

use crate::gui::theme::*;
use crate::gui::widgets;
use crate::tray::{MutedTray, TrayEntry};

pub type TrayTexture = egui::TextureHandle;

fn chip_size(ctx: &Context, entry: &TrayEntry<TrayTexture>) -> Vec2 {
    match &entry.icon {
        Some(texture) => texture.size_vec2(),
        None => {
            let galley = ctx.fonts(|f| {
                f.layout_no_wrap(entry.label.clone(), title_font(), POPUP_TEXT)
            });
            galley.size() + egui::vec2(12.0, 8.0)
        }
    }
}

/// Window size for the current entries
pub fn tray_size(ctx: &Context, tray: &MutedTray<TrayTexture>) -> Vec2 {
    let mut width = 0.0_f32;
    let mut height = 0.0_f32;
    for (i, entry) in tray.entries().iter().enumerate() {
        let size = chip_size(ctx, entry);
        if i > 0 {
            width += TRAY_ICON_GAP;
        }
        width += size.x;
        height = height.max(size.y);
    }
    egui::vec2(width, height) + TRAY_PAD * 2.0
}

/// Show the always-on-top muted tray. Does nothing while the tray is empty.
pub fn show_tray(ctx: &Context, tray: &MutedTray<TrayTexture>) {
    if !tray.is_visible() {
        return;
    }
    let size = tray_size(ctx, tray);

    ctx.show_viewport_immediate(
        egui::ViewportId::from_hash_of("muted_tray"),
        egui::ViewportBuilder::default()
            .with_title("Muted")
            .with_position(TRAY_POS)
            .with_inner_size(size)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false)
            .with_resizable(false)
            .with_mouse_passthrough(true),
        |ctx, _class| {
            let frame = egui::Frame::none().fill(Color32::TRANSPARENT);
            egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                let area = ui.max_rect();
                let mut x = area.left() + TRAY_PAD.x;

                for entry in tray.entries() {
                    let chip = chip_size(ctx, entry);
                    let min = egui::pos2(x, area.center().y - chip.y / 2.0);
                    match &entry.icon {
                        Some(texture) => {
                            widgets::paint_texture(ui, texture, min, Color32::WHITE);
                        }
                        None => {
                            let rect = egui::Rect::from_min_size(min, chip);
                            ui.painter().rect_filled(rect, 4.0, TRAY_CHIP_BG);
                            ui.painter().text(
                                rect.center(),
                                egui::Align2::CENTER_CENTER,
                                &entry.label,
                                title_font(),
                                POPUP_TEXT,
                            );
                        }
                    }
                    x += chip.x + TRAY_ICON_GAP;
                }
            });
        },
    );
}
