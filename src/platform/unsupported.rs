use std::path::Path;

use image::RgbaImage;

use super::DesktopShell;
use crate::icons::IconError;

/// Fallback shell: no foreground lookup and no icons. Every report then
/// renders with the text layout.
pub struct UnsupportedShell;

impl UnsupportedShell {
    pub fn new() -> Self {
        tracing::warn!("[Platform] Icon extraction is not supported on this OS");
        Self
    }
}

impl DesktopShell for UnsupportedShell {
    fn foreground_pid(&self) -> Option<u32> {
        None
    }

    fn icon_metric(&self) -> u32 {
        32
    }

    fn extract_icon(&self, exe: &Path) -> Result<RgbaImage, IconError> {
        Err(IconError::Unsupported(exe.display().to_string()))
    }
}
