use crate::report::{VolumeLevel, VolumeReport};

/// One muted application in the tray
#[derive(Debug, Clone, PartialEq)]
pub struct TrayEntry<E> {
    /// Name from the report; used as the key
    pub app_name: String,
    /// Name shown on the text chip when there is no icon
    pub label: String,
    pub icon: Option<E>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayChange {
    Unchanged,
    /// An entry was added; the tray is visible
    Added,
    /// An entry was removed and others remain
    Removed,
    /// The last entry was removed; the tray should hide
    Emptied,
}

/// Muted applications, in the order they were muted.
///
/// Generic over the icon type so the model does not depend on the renderer.
#[derive(Debug)]
pub struct MutedTray<E> {
    entries: Vec<TrayEntry<E>>,
}

impl<E> Default for MutedTray<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E> MutedTray<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TrayEntry<E>] {
        &self.entries
    }

    pub fn is_visible(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn contains(&self, app_name: &str) -> bool {
        self.entries.iter().any(|e| e.app_name == app_name)
    }

    /// Fold one report into the tray.
    ///
    /// `resolve` is only called when a new entry is added and returns the
    /// display label plus the icon, if one could be found.
    pub fn apply<F>(&mut self, report: &VolumeReport, resolve: F) -> TrayChange
    where
        F: FnOnce(&str) -> (String, Option<E>),
    {
        let level = match report.level {
            VolumeLevel::Level(v) => v,
            VolumeLevel::NoSource => return TrayChange::Unchanged,
        };

        let name = report.app_name.as_str();
        if level == 0.0 {
            if self.contains(name) {
                return TrayChange::Unchanged;
            }
            let (label, icon) = resolve(name);
            if icon.is_none() {
                tracing::info!("[Tray] No icon for '{}', showing name", name);
            }
            self.entries.push(TrayEntry {
                app_name: name.to_string(),
                label,
                icon,
            });
            tracing::debug!("[Tray] Added '{}' ({} muted)", name, self.entries.len());
            TrayChange::Added
        } else {
            let before = self.entries.len();
            self.entries.retain(|e| e.app_name != name);
            if self.entries.len() == before {
                TrayChange::Unchanged
            } else if self.entries.is_empty() {
                tracing::debug!("[Tray] Removed '{}', tray empty", name);
                TrayChange::Emptied
            } else {
                tracing::debug!("[Tray] Removed '{}'", name);
                TrayChange::Removed
            }
        }
    }
}
