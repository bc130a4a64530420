use egui::{Color32, FontFamily, FontId, Pos2, Vec2};

// === Overlay Design Tokens ===

// 1. Popup
pub const POPUP_BG: Color32 = Color32::from_rgb(0x2b, 0x2b, 0x2b);
pub const POPUP_TEXT: Color32 = Color32::WHITE;
pub const POPUP_POS: Pos2 = Pos2::new(10.0, 80.0);
pub const POPUP_SIZE: Vec2 = Vec2::new(165.0, 65.0);
/// Horizontal padding inside the popup
pub const POPUP_PAD_X: f32 = 10.0;
/// Gap between the icon and the percentage column
pub const POPUP_ICON_GAP: f32 = 10.0;

// 2. Progress bar (track underneath, fill on top)
pub const BAR_TRACK: Color32 = Color32::from_rgb(0x0f, 0x0f, 0x0f);
pub const BAR_FILL: Color32 = Color32::from_rgb(0xff, 0xff, 0xff);
pub const BAR_HEIGHT: f32 = 4.0;

// 3. "No audio source" layout
pub const NO_SOURCE_MIN_WIDTH: f32 = 300.0;
pub const NO_SOURCE_PAD: f32 = 40.0;

// 4. Tray
pub const TRAY_POS: Pos2 = Pos2::new(5.0, 20.0);
pub const TRAY_PAD: Vec2 = Vec2::new(10.0, 5.0);
pub const TRAY_ICON_GAP: f32 = 10.0;
pub const TRAY_CHIP_BG: Color32 = Color32::from_rgba_premultiplied(20, 20, 20, 200);

// 5. Settings editor chrome
pub const EDITOR_SIZE: Vec2 = Vec2::new(600.0, 400.0);
pub const TITLE_BAR_HEIGHT: f32 = 30.0;
pub const TITLE_BAR_BG: Color32 = Color32::from_rgb(0x20, 0x20, 0x20);
pub const TITLE_TEXT: Color32 = Color32::from_rgb(0xe0, 0xe0, 0xe0);
pub const CLOSE_HOVER: Color32 = Color32::from_rgb(0xc4, 0x2b, 0x1c);
pub const CAPTURE_HIGHLIGHT: Color32 = Color32::from_rgb(0x3a, 0x6e, 0xa5);

// === Fonts ===

pub fn percent_font() -> FontId {
    FontId::new(20.0, FontFamily::Proportional)
}

pub fn message_font() -> FontId {
    FontId::new(16.0, FontFamily::Proportional)
}

pub fn title_font() -> FontId {
    FontId::new(13.0, FontFamily::Proportional)
}

// == Helper Functions ==

/// Scale a color for the popup's current fade opacity
pub fn faded(color: Color32, opacity: f32) -> Color32 {
    color.linear_multiply(opacity.clamp(0.0, 1.0))
}

/// `max(300, text + 40)` wide
pub fn no_source_width(text_width: f32) -> f32 {
    (text_width + NO_SOURCE_PAD).max(NO_SOURCE_MIN_WIDTH)
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_source_width() {
        assert_eq!(no_source_width(100.0), 300.0);
        assert_eq!(no_source_width(260.0), 300.0);
        assert_eq!(no_source_width(320.0), 360.0);
    }

    #[test]
    fn test_faded_bounds() {
        assert_eq!(faded(BAR_FILL, 1.0), BAR_FILL);
        assert_eq!(faded(BAR_FILL, 0.0), Color32::TRANSPARENT);
        assert_eq!(faded(BAR_FILL, 2.0), BAR_FILL);
    }
}
