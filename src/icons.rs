//! Application icon lookup
//!
//! name -> executable path (memoized) -> extracted icon -> scaled/darkened
//! bitmap (bounded cache). Tray icons additionally get the "disabled" glyph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

use crate::icon_cache::{BoundedCache, ExePathMemo, ICON_CACHE_CAPACITY};
use crate::platform::{DesktopShell, ProcessTable};

/// Pseudo app name meaning "whoever owns the foreground window"
pub const FOCUSED_TAG: &str = "focused";
/// Icons are drawn at this multiple of the system icon size
pub const ICON_SCALE: f32 = 1.5;
/// RGB multiplier for muted icons
pub const MUTED_DARKEN: f32 = 0.66;

#[derive(Debug, Error)]
pub enum IconError {
    #[error("no foreground window")]
    NoForegroundWindow,
    #[error("process '{0}' not found")]
    ProcessNotFound(String),
    #[error("icon extraction failed: {0}")]
    Extraction(String),
    #[error("icon extraction unsupported on this platform ({0})")]
    Unsupported(String),
}

/// Result of a lookup. `image` is `None` when anything along the way failed.
#[derive(Debug, Clone)]
pub struct ResolvedIcon {
    /// Real process name (differs from the request for "focused")
    pub app_name: String,
    pub image: Option<Arc<RgbaImage>>,
}

pub struct IconResolver<S, P> {
    shell: S,
    processes: P,
    cache: BoundedCache<String, Arc<RgbaImage>>,
    exe_paths: ExePathMemo,
    disabled_glyph: Option<RgbaImage>,
}

impl<S: DesktopShell, P: ProcessTable> IconResolver<S, P> {
    pub fn new(shell: S, processes: P, disabled_glyph: Option<RgbaImage>) -> Self {
        Self {
            shell,
            processes,
            cache: BoundedCache::new(ICON_CACHE_CAPACITY),
            exe_paths: ExePathMemo::new(),
            disabled_glyph,
        }
    }

    #[cfg(test)]
    pub fn cached_icons(&self) -> usize {
        self.cache.len()
    }

    /// Look up the overlay icon for `app_name`, darkened when muted
    pub fn resolve(&mut self, app_name: &str, muted: bool) -> ResolvedIcon {
        let real_name = match self.real_name(app_name) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("[Icons] Cannot resolve '{}': {}", app_name, e);
                return ResolvedIcon {
                    app_name: app_name.to_string(),
                    image: None,
                };
            }
        };

        let key = cache_key(&real_name, muted);
        if let Some(hit) = self.cache.get(&key) {
            return ResolvedIcon {
                app_name: real_name,
                image: Some(hit.clone()),
            };
        }

        let image = match self.load(&real_name, muted) {
            Ok(image) => {
                let image = Arc::new(image);
                if let Some(evicted) = self.cache.insert(key, image.clone()) {
                    tracing::debug!("[Icons] Evicted '{}'", evicted);
                }
                Some(image)
            }
            Err(e) => {
                tracing::warn!("[Icons] No icon for '{}': {}", real_name, e);
                None
            }
        };

        ResolvedIcon {
            app_name: real_name,
            image,
        }
    }

    /// Muted icon with the disabled glyph in the lower-right quadrant
    pub fn resolve_tray_icon(&mut self, app_name: &str) -> ResolvedIcon {
        let mut resolved = self.resolve(app_name, true);
        if let (Some(base), Some(glyph)) = (&resolved.image, &self.disabled_glyph) {
            resolved.image = Some(Arc::new(composite_disabled(base, glyph)));
        }
        resolved
    }

    /// Name to show for `app_name` without loading an icon.
    /// "focused" becomes the foreground process when there is one.
    pub fn display_name(&mut self, app_name: &str) -> String {
        self.real_name(app_name).unwrap_or_else(|e| {
            tracing::warn!("[Icons] Cannot resolve '{}': {}", app_name, e);
            app_name.to_string()
        })
    }

    fn real_name(&mut self, app_name: &str) -> Result<String, IconError> {
        if app_name != FOCUSED_TAG {
            return Ok(app_name.to_string());
        }
        let pid = self
            .shell
            .foreground_pid()
            .ok_or(IconError::NoForegroundWindow)?;
        self.processes
            .name_of(pid)
            .ok_or_else(|| IconError::ProcessNotFound(format!("pid {}", pid)))
    }

    fn load(&mut self, name: &str, muted: bool) -> Result<RgbaImage, IconError> {
        let processes = &mut self.processes;
        let exe = self
            .exe_paths
            .get_or_scan(name, |n| processes.find_exe(n))
            .ok_or_else(|| IconError::ProcessNotFound(name.to_string()))?;

        let raw = match self.shell.extract_icon(&exe) {
            Ok(raw) => raw,
            Err(e) => {
                // The process may have moved since it was memoized
                self.exe_paths.invalidate(name);
                return Err(e);
            }
        };

        let size = scaled_size(self.shell.icon_metric());
        let mut icon = imageops::resize(&raw, size, size, FilterType::Lanczos3);
        if muted {
            darken(&mut icon, MUTED_DARKEN);
        }
        Ok(icon)
    }
}

fn cache_key(app_name: &str, muted: bool) -> String {
    format!("{}_{}", app_name, if muted { "muted" } else { "normal" })
}

pub fn scaled_size(icon_metric: u32) -> u32 {
    ((icon_metric as f32 * ICON_SCALE).round() as u32).max(1)
}

/// Scale RGB by `factor`, leaving alpha alone
pub fn darken(image: &mut RgbaImage, factor: f32) {
    for px in image.pixels_mut() {
        for c in 0..3 {
            px.0[c] = (px.0[c] as f32 * factor) as u8;
        }
    }
}

/// Paste the glyph at half size onto the lower-right quadrant
pub fn composite_disabled(base: &RgbaImage, glyph: &RgbaImage) -> RgbaImage {
    let (w, h) = base.dimensions();
    let mut out = base.clone();
    let (gw, gh) = ((w / 2).max(1), (h / 2).max(1));
    let glyph = imageops::resize(glyph, gw, gh, FilterType::Lanczos3);
    imageops::overlay(&mut out, &glyph, (w / 2) as i64, (h / 2) as i64);
    out
}

/// Where the disabled glyph lives relative to the running executable
pub fn disabled_glyph_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("assets").join("disabled.ico"))
}

/// Load the glyph once at startup. Missing or broken files just disable it.
pub fn load_disabled_glyph(path: &Path) -> Option<RgbaImage> {
    match image::open(path) {
        Ok(img) => {
            tracing::info!("[Icons] Loaded disabled glyph from {}", path.display());
            Some(img.to_rgba8())
        }
        Err(e) => {
            tracing::warn!(
                "[Icons] Disabled glyph unavailable ({}): {}",
                path.display(),
                e
            );
            None
        }
    }
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeProcesses, FakeShell};
    use image::Rgba;

    fn resolver(foreground: Option<u32>) -> IconResolver<FakeShell, FakeProcesses> {
        IconResolver::new(
            FakeShell::new(foreground),
            FakeProcesses::new(&[(10, "Discord.exe"), (20, "brave.exe")]),
            None,
        )
    }

    #[test]
    fn test_resolve_scales_to_one_and_a_half_metric() {
        let mut icons = resolver(None);
        let icon = icons.resolve("discord.exe", false);
        let image = icon.image.unwrap();
        assert_eq!(image.dimensions(), (48, 48));
        assert_eq!(image.get_pixel(24, 24).0[3], 255);
    }

    #[test]
    fn test_cache_hit_skips_extraction() {
        let mut icons = resolver(None);
        icons.resolve("brave.exe", false);
        icons.resolve("brave.exe", false);
        assert_eq!(icons.shell.extractions.get(), 1);

        // The muted variant is a separate entry
        icons.resolve("brave.exe", true);
        assert_eq!(icons.shell.extractions.get(), 2);
        assert_eq!(icons.cached_icons(), 2);
    }

    #[test]
    fn test_muted_icon_is_darkened_keeping_alpha() {
        let mut icons = resolver(None);
        let normal = icons.resolve("brave.exe", false).image.unwrap();
        let muted = icons.resolve("brave.exe", true).image.unwrap();

        let n = normal.get_pixel(24, 24).0;
        let m = muted.get_pixel(24, 24).0;
        for c in 0..3 {
            assert_eq!(m[c], (n[c] as f32 * MUTED_DARKEN) as u8);
        }
        assert_eq!(m[3], n[3]);
    }

    #[test]
    fn test_focused_resolves_to_foreground_process() {
        let mut icons = resolver(Some(20));
        let icon = icons.resolve(FOCUSED_TAG, false);
        assert_eq!(icon.app_name, "brave.exe");
        assert!(icon.image.is_some());

        // Focus moved; the cache must not hand back brave's icon
        icons.shell.foreground = Some(10);
        let icon = icons.resolve(FOCUSED_TAG, false);
        assert_eq!(icon.app_name, "Discord.exe");
        assert_eq!(icons.shell.extractions.get(), 2);
    }

    #[test]
    fn test_no_foreground_window_yields_no_icon() {
        let mut icons = resolver(None);
        let icon = icons.resolve(FOCUSED_TAG, false);
        assert!(icon.image.is_none());
        assert_eq!(icon.app_name, FOCUSED_TAG);
    }

    #[test]
    fn test_display_name_skips_extraction() {
        let mut icons = resolver(Some(10));
        assert_eq!(icons.display_name(FOCUSED_TAG), "Discord.exe");
        assert_eq!(icons.display_name("brave.exe"), "brave.exe");
        assert_eq!(icons.shell.extractions.get(), 0);

        icons.shell.foreground = None;
        assert_eq!(icons.display_name(FOCUSED_TAG), FOCUSED_TAG);
    }

    #[test]
    fn test_unknown_process_yields_no_icon_and_is_rescanned() {
        let mut icons = resolver(None);
        assert!(icons.resolve("spotify.exe", false).image.is_none());
        assert!(icons.resolve("spotify.exe", false).image.is_none());
        assert_eq!(icons.processes.scans, 2);
        assert_eq!(icons.cached_icons(), 0);
    }

    #[test]
    fn test_exe_path_is_memoized() {
        let mut icons = resolver(None);
        icons.resolve("brave.exe", false);
        icons.resolve("brave.exe", true);
        assert_eq!(icons.processes.scans, 1);
    }

    #[test]
    fn test_extraction_failure_invalidates_memo() {
        let mut icons = resolver(None);
        icons.shell.broken = Some(PathBuf::from("/apps/brave.exe"));

        assert!(icons.resolve("brave.exe", false).image.is_none());
        assert!(icons.exe_paths.get("brave.exe").is_none());

        icons.shell.broken = None;
        assert!(icons.resolve("brave.exe", false).image.is_some());
        assert_eq!(icons.processes.scans, 2);
    }

    #[test]
    fn test_cache_stays_bounded() {
        let names: Vec<(u32, String)> = (0..30).map(|i| (i, format!("app{}.exe", i))).collect();
        let refs: Vec<(u32, &str)> = names.iter().map(|(p, n)| (*p, n.as_str())).collect();
        let mut icons = IconResolver::new(FakeShell::new(None), FakeProcesses::new(&refs), None);

        for (_, name) in &names {
            icons.resolve(name, false);
        }
        assert_eq!(icons.cached_icons(), ICON_CACHE_CAPACITY);
    }

    #[test]
    fn test_tray_icon_composites_glyph_in_lower_right() {
        let glyph = RgbaImage::from_pixel(16, 16, Rgba([255, 0, 0, 255]));
        let mut icons = IconResolver::new(
            FakeShell::new(None),
            FakeProcesses::new(&[(1, "brave.exe")]),
            Some(glyph),
        );

        let plain = icons.resolve("brave.exe", true).image.unwrap();
        let tray = icons.resolve_tray_icon("brave.exe").image.unwrap();
        assert_eq!(tray.dimensions(), plain.dimensions());

        // Upper-left untouched, lower-right covered by the opaque glyph
        assert_eq!(tray.get_pixel(5, 5), plain.get_pixel(5, 5));
        assert_eq!(tray.get_pixel(40, 40).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_tray_icon_without_glyph_is_plain_muted_icon() {
        let mut icons = resolver(None);
        let plain = icons.resolve("brave.exe", true).image.unwrap();
        let tray = icons.resolve_tray_icon("brave.exe").image.unwrap();
        assert_eq!(*tray, *plain);
    }

    #[test]
    fn test_missing_glyph_file_is_tolerated() {
        assert!(load_disabled_glyph(Path::new("/definitely/not/here.ico")).is_none());
    }
}
