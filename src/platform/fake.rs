// In-memory shell and process table for resolver and app tests

use std::cell::Cell;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use super::{DesktopShell, ProcessEntry, ProcessTable};
use crate::icons::IconError;

/// Colour of every icon the fake shell extracts
pub const FAKE_ICON_PIXEL: [u8; 4] = [200, 100, 50, 255];

pub struct FakeShell {
    pub foreground: Option<u32>,
    pub extractions: Cell<usize>,
    pub broken: Option<PathBuf>,
}

impl FakeShell {
    pub fn new(foreground: Option<u32>) -> Self {
        Self {
            foreground,
            extractions: Cell::new(0),
            broken: None,
        }
    }
}

impl DesktopShell for FakeShell {
    fn foreground_pid(&self) -> Option<u32> {
        self.foreground
    }

    fn icon_metric(&self) -> u32 {
        32
    }

    fn extract_icon(&self, exe: &Path) -> Result<RgbaImage, IconError> {
        self.extractions.set(self.extractions.get() + 1);
        if self.broken.as_deref() == Some(exe) {
            return Err(IconError::Extraction("corrupt".into()));
        }
        Ok(RgbaImage::from_pixel(32, 32, Rgba(FAKE_ICON_PIXEL)))
    }
}

/// Processes live at `/apps/<name>`
pub struct FakeProcesses {
    pub entries: Vec<ProcessEntry>,
    pub scans: usize,
}

impl FakeProcesses {
    pub fn new(names: &[(u32, &str)]) -> Self {
        let entries = names
            .iter()
            .map(|(pid, name)| ProcessEntry {
                pid: *pid,
                name: name.to_string(),
                exe: Some(PathBuf::from(format!("/apps/{}", name))),
            })
            .collect();
        Self { entries, scans: 0 }
    }
}

impl ProcessTable for FakeProcesses {
    fn snapshot(&mut self) -> Vec<ProcessEntry> {
        self.scans += 1;
        self.entries.clone()
    }
}
