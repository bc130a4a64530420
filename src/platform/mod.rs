use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::icons::IconError;

mod processes;
pub use processes::SysinfoProcesses;

#[cfg(test)]
pub mod fake;

/// One running process as seen by the resolver
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub exe: Option<PathBuf>,
}

/// Window-system queries needed to find and draw an application icon
pub trait DesktopShell {
    /// Process id owning the foreground window, if any
    fn foreground_pid(&self) -> Option<u32>;

    /// Native large-icon edge length in pixels
    fn icon_metric(&self) -> u32;

    /// Extract the large icon embedded in an executable
    fn extract_icon(&self, exe: &Path) -> Result<RgbaImage, IconError>;
}

/// Enumeration of running processes
pub trait ProcessTable {
    fn snapshot(&mut self) -> Vec<ProcessEntry>;

    /// Name of the process with the given id
    fn name_of(&mut self, pid: u32) -> Option<String> {
        self.snapshot()
            .into_iter()
            .find(|p| p.pid == pid)
            .map(|p| p.name)
    }

    /// Executable of the first process whose name matches, ignoring case
    fn find_exe(&mut self, name: &str) -> Option<PathBuf> {
        self.snapshot()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name) && p.exe.is_some())
            .and_then(|p| p.exe)
    }
}

// ==============================================================
// OS SELECTION FACTORY
// ==============================================================

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub type PlatformShell = windows::WindowsShell;

// Icons come from PE resources, so every other OS gets the fallback
#[cfg(not(target_os = "windows"))]
mod unsupported;
#[cfg(not(target_os = "windows"))]
pub type PlatformShell = unsupported::UnsupportedShell;
