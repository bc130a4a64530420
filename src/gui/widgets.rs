use eframe::egui::{self, Color32, Context, Rect, Response, Sense, Ui};
use image::RgbaImage;

use crate::gui::theme::*;

// =======================================================================================
// TEXTURES
// =======================================================================================

/// Upload a decoded icon to the GPU
pub fn upload_icon(ctx: &Context, name: &str, icon: &RgbaImage) -> egui::TextureHandle {
    let size = [icon.width() as _, icon.height() as _];
    let pixels = icon.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

/// Paint a texture at its natural size with the given tint
pub fn paint_texture(ui: &Ui, texture: &egui::TextureHandle, min: egui::Pos2, tint: Color32) -> Rect {
    let rect = Rect::from_min_size(min, texture.size_vec2());
    ui.painter().image(
        texture.id(),
        rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        tint,
    );
    rect
}

// =======================================================================================
// WINDOW CHROME (Drag, Close)
// =======================================================================================

/// Custom title bar for an undecorated viewport.
///
/// Pressing anywhere on the bar except the close button starts an OS drag.
/// Returns true when the close button was clicked.
pub fn title_bar(ui: &mut Ui, ctx: &Context, title: &str) -> bool {
    let (bar_rect, bar) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), TITLE_BAR_HEIGHT),
        Sense::click(),
    );
    let painter = ui.painter();
    painter.rect_filled(bar_rect, 0.0, TITLE_BAR_BG);
    painter.text(
        bar_rect.left_center() + egui::vec2(10.0, 0.0),
        egui::Align2::LEFT_CENTER,
        title,
        title_font(),
        TITLE_TEXT,
    );

    let close_rect = Rect::from_min_max(
        egui::pos2(bar_rect.right() - TITLE_BAR_HEIGHT, bar_rect.top()),
        bar_rect.right_bottom(),
    );
    let close = ui.interact(close_rect, bar.id.with("close"), Sense::click());
    if close.hovered() {
        ui.painter().rect_filled(close_rect, 0.0, CLOSE_HOVER);
    }
    ui.painter().text(
        close_rect.center(),
        egui::Align2::CENTER_CENTER,
        "×",
        egui::FontId::proportional(18.0),
        TITLE_TEXT,
    );

    // Drag is triggered on press so it works before egui decides it is a drag
    if bar.hovered()
        && !close.hovered()
        && ui.input(|i| i.pointer.button_pressed(egui::PointerButton::Primary))
    {
        ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
    }

    close.clicked()
}

// =======================================================================================
// SETTING UI COMPONENTS
// =======================================================================================

/// Clickable hotkey field; highlighted while it is capturing
pub fn hotkey_field(ui: &mut Ui, text: &str, capturing: bool) -> Response {
    let label = if text.is_empty() { " " } else { text };
    let button = egui::Button::new(egui::RichText::new(label).monospace())
        .selected(capturing)
        .min_size(egui::vec2(120.0, 22.0));
    let response = ui.add(button);
    if capturing {
        ui.painter().rect_stroke(
            response.rect,
            2.0,
            egui::Stroke::new(1.5, CAPTURE_HIGHLIGHT),
        );
    }
    response.on_hover_text("Click, then press the new key combination")
}

/// Small modal-style window with a message and an OK button.
/// Returns true when dismissed.
pub fn error_dialog(ctx: &Context, title: &str, message: &str) -> bool {
    let mut dismissed = false;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });
    dismissed
}
