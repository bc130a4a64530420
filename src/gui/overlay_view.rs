use eframe::egui::{self, Color32, Context, Rect, Ui, Vec2};

use crate::gui::theme::*;
use crate::gui::widgets;
use crate::overlay::{fill_width, OverlayContent};

/// Window size the content needs
pub fn popup_size(ctx: &Context, content: &OverlayContent) -> Vec2 {
    match content {
        OverlayContent::Volume { .. } => POPUP_SIZE,
        OverlayContent::NoSource { .. } => {
            let galley = ctx.fonts(|f| f.layout_no_wrap(content.message(), message_font(), POPUP_TEXT));
            egui::vec2(no_source_width(galley.size().x), POPUP_SIZE.y)
        }
    }
}

/// Draw the popup into `rect` at the given fade opacity
pub fn draw_popup(
    ui: &Ui,
    rect: Rect,
    content: &OverlayContent,
    icon: Option<&egui::TextureHandle>,
    opacity: f32,
) {
    let painter = ui.painter();
    painter.rect_filled(rect, 0.0, faded(POPUP_BG, opacity));

    match (content, icon) {
        (OverlayContent::Volume { fraction, .. }, Some(texture)) => {
            let icon_size = texture.size_vec2();
            let icon_min = egui::pos2(
                rect.left() + POPUP_PAD_X,
                rect.center().y - icon_size.y / 2.0,
            );
            let icon_rect = widgets::paint_texture(ui, texture, icon_min, faded(Color32::WHITE, opacity));

            let column = Rect::from_min_max(
                egui::pos2(icon_rect.right() + POPUP_ICON_GAP, rect.top()),
                egui::pos2(rect.right() - POPUP_PAD_X, rect.bottom()),
            );
            draw_level(ui, column, *fraction, opacity);
        }
        _ => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                content.message(),
                message_font(),
                faded(POPUP_TEXT, opacity),
            );
        }
    }
}

/// Percentage label with the two-tone bar under it
fn draw_level(ui: &Ui, column: Rect, fraction: f32, opacity: f32) {
    let painter = ui.painter();
    let galley = painter.layout_no_wrap(
        crate::overlay::percent_label(fraction),
        percent_font(),
        faded(POPUP_TEXT, opacity),
    );

    let block_height = galley.size().y + 4.0 + BAR_HEIGHT;
    let top = column.center().y - block_height / 2.0;
    let text_pos = egui::pos2(column.center().x - galley.size().x / 2.0, top);
    painter.galley(text_pos, galley.clone(), faded(POPUP_TEXT, opacity));

    let track = Rect::from_min_size(
        egui::pos2(column.left(), top + galley.size().y + 4.0),
        egui::vec2(column.width(), BAR_HEIGHT),
    );
    painter.rect_filled(track, 0.0, faded(BAR_TRACK, opacity));

    let fill = Rect::from_min_size(track.min, egui::vec2(fill_width(fraction, track.width()), BAR_HEIGHT));
    painter.rect_filled(fill, 0.0, faded(BAR_FILL, opacity));
}
