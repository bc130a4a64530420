use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::icons::FOCUSED_TAG;

pub const SETTINGS_FILE: &str = "settings.json";
const APP_DIR: &str = "VolumeOverlay";
const OVERLAY_KEY: &str = "overlay_enabled";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid settings at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
    #[error("Settings path {0} has no parent directory")]
    NoParent(PathBuf),
}

/// The three hotkeys every application row carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Down,
    Up,
    Mute,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Down, Slot::Up, Slot::Mute];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::Down => "down",
            Slot::Up => "up",
            Slot::Mute => "mute",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "down" => Some(Slot::Down),
            "up" => Some(Slot::Up),
            "mute" => Some(Slot::Mute),
            _ => None,
        }
    }

    /// Column header in the editor
    pub fn title(&self) -> &'static str {
        match self {
            Slot::Down => "Volume Down",
            Slot::Up => "Volume Up",
            Slot::Mute => "Mute Toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub tag: String,
    pub app_name: String,
    pub down: String,
    pub up: String,
    pub mute: String,
}

impl HotkeyBinding {
    fn new(tag: &str, app_name: &str, down: &str, up: &str, mute: &str) -> Self {
        Self {
            tag: tag.to_string(),
            app_name: app_name.to_string(),
            down: down.to_string(),
            up: up.to_string(),
            mute: mute.to_string(),
        }
    }

    pub fn hotkey(&self, slot: Slot) -> &str {
        match slot {
            Slot::Down => &self.down,
            Slot::Up => &self.up,
            Slot::Mute => &self.mute,
        }
    }

    pub fn hotkey_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::Down => &mut self.down,
            Slot::Up => &mut self.up,
            Slot::Mute => &mut self.mute,
        }
    }

    /// The focused row always targets the foreground app
    pub fn is_focused(&self) -> bool {
        self.tag == FOCUSED_TAG
    }
}

/// Value stored under each `{tag}_{slot}` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub hotkey: String,
    pub app_name: String,
}

/// One value of the flat settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DocumentValue {
    Entry(SlotEntry),
    Flag(bool),
}

/// Same shape as `SlotEntry` but tolerant of missing fields
#[derive(Debug, Default, Deserialize)]
struct PartialSlotEntry {
    hotkey: Option<String>,
    app_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bindings: Vec<HotkeyBinding>,
    pub overlay_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
            overlay_enabled: true,
        }
    }
}

pub fn default_bindings() -> Vec<HotkeyBinding> {
    vec![
        HotkeyBinding::new(
            "brave",
            "brave.exe",
            "ctrl+alt+shift+!",
            "ctrl+alt+shift+\"",
            "ctrl+alt+shift+£",
        ),
        HotkeyBinding::new(
            "discord",
            "discord.exe",
            "ctrl+alt+shift+$",
            "ctrl+alt+shift+%",
            "ctrl+alt+shift+^",
        ),
        HotkeyBinding::new(
            FOCUSED_TAG,
            FOCUSED_TAG,
            "ctrl+alt+shift+&",
            "ctrl+alt+shift+*",
            "ctrl+alt+shift+(",
        ),
    ]
}

/// `<config dir>/VolumeOverlay/settings.json`, or the working directory
/// when the platform has no config dir
pub fn settings_path() -> PathBuf {
    match ProjectDirs::from("", "", APP_DIR) {
        Some(dirs) => dirs.config_dir().join(SETTINGS_FILE),
        None => {
            tracing::warn!("[Settings] No config directory, using working directory");
            PathBuf::from(SETTINGS_FILE)
        }
    }
}

impl Settings {
    pub fn binding(&self, tag: &str) -> Option<&HotkeyBinding> {
        self.bindings.iter().find(|b| b.tag == tag)
    }

    /// True when any tag's down/up/mute hotkey differs
    pub fn hotkeys_differ(&self, other: &Settings) -> bool {
        self.bindings.len() != other.bindings.len()
            || self.bindings.iter().any(|b| match other.binding(&b.tag) {
                Some(o) => Slot::ALL.iter().any(|s| b.hotkey(*s) != o.hotkey(*s)),
                None => true,
            })
    }

    /// Load from the default location. Never fails: problems are logged and
    /// defaults fill the gaps.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::read_from(path) {
            Ok(settings) => {
                tracing::info!("[Settings] Loaded {}", path.display());
                settings
            }
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!("[Settings] {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::error!("[Settings] {}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn read_from(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Map<String, Value> =
            serde_json::from_str(&text).map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_document(&doc))
    }

    /// Merge a flat `{tag}_{slot}` document over the defaults
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let mut settings = Self::default();

        for (key, value) in doc {
            if key == OVERLAY_KEY {
                match value.as_bool() {
                    Some(enabled) => settings.overlay_enabled = enabled,
                    None => tracing::warn!("[Settings] '{}' is not a boolean", key),
                }
                continue;
            }

            // Tags may contain '_', slots never do
            let Some((tag, slot)) = key.rsplit_once('_') else {
                tracing::debug!("[Settings] Ignoring key '{}'", key);
                continue;
            };
            let Some(slot) = Slot::from_key(slot) else {
                tracing::debug!("[Settings] Ignoring key '{}'", key);
                continue;
            };
            let Some(binding) = settings.bindings.iter_mut().find(|b| b.tag == tag) else {
                tracing::debug!("[Settings] Ignoring unknown tag '{}'", tag);
                continue;
            };

            let entry: PartialSlotEntry = match serde_json::from_value(value.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[Settings] Bad entry for '{}': {}", key, e);
                    continue;
                }
            };

            if let Some(hotkey) = entry.hotkey {
                *binding.hotkey_mut(slot) = hotkey;
            }
            if let Some(app_name) = entry.app_name {
                if !binding.is_focused() && !app_name.is_empty() {
                    binding.app_name = app_name;
                }
            }
        }

        settings
    }

    pub fn to_document(&self) -> BTreeMap<String, DocumentValue> {
        let mut doc = BTreeMap::new();
        for binding in &self.bindings {
            for slot in Slot::ALL {
                let entry = SlotEntry {
                    hotkey: binding.hotkey(slot).to_string(),
                    app_name: binding.app_name.clone(),
                };
                doc.insert(
                    format!("{}_{}", binding.tag, slot.key()),
                    DocumentValue::Entry(entry),
                );
            }
        }
        doc.insert(
            OVERLAY_KEY.to_string(),
            DocumentValue::Flag(self.overlay_enabled),
        );
        doc
    }

    /// Rewrite the whole file atomically, 4-space indented
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let dir = match path.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => return Err(SettingsError::NoParent(path.to_path_buf())),
        };
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_document()
            .serialize(&mut ser)
            .map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&buf).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(path).map_err(|source| SettingsError::Persist {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("[Settings] Saved {}", path.display());
        Ok(())
    }
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.overlay_enabled);
        let tags: Vec<&str> = settings.bindings.iter().map(|b| b.tag.as_str()).collect();
        assert_eq!(tags, vec!["brave", "discord", "focused"]);
        assert_eq!(settings.binding("brave").unwrap().up, "ctrl+alt+shift+\"");
        assert_eq!(settings.binding("focused").unwrap().app_name, "focused");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut settings = Settings::default();
        settings.overlay_enabled = false;
        settings.bindings[1].app_name = "Discord.exe".to_string();
        settings.bindings[1].mute = "ctrl+m".to_string();
        settings.bindings[2].down = String::new();
        settings.save_to(&path).unwrap();

        let loaded = Settings::read_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_file_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        Settings::default().save_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"brave_down\": {"));
        assert!(text.contains("\"overlay_enabled\": true"));

        let doc: Map<String, Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.len(), 10);
        let entry: SlotEntry = serde_json::from_value(doc["discord_mute"].clone()).unwrap();
        assert_eq!(
            entry,
            SlotEntry {
                hotkey: "ctrl+alt+shift+^".to_string(),
                app_name: "discord.exe".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_entries_merge_with_defaults() {
        let doc: Map<String, Value> = serde_json::from_str(
            r#"{ "brave_up": { "hotkey": "ctrl+u" }, "discord_down": { "app_name": "vesktop.exe" } }"#,
        )
        .unwrap();
        let settings = Settings::from_document(&doc);

        let brave = settings.binding("brave").unwrap();
        assert_eq!(brave.up, "ctrl+u");
        assert_eq!(brave.down, "ctrl+alt+shift+!");
        assert_eq!(brave.app_name, "brave.exe");

        let discord = settings.binding("discord").unwrap();
        assert_eq!(discord.app_name, "vesktop.exe");
        assert_eq!(discord.down, "ctrl+alt+shift+$");
        assert!(settings.overlay_enabled);
    }

    #[test]
    fn test_unknown_keys_and_focused_app_name_are_ignored() {
        let doc: Map<String, Value> = serde_json::from_str(
            r#"{
                "spotify_down": { "hotkey": "ctrl+s", "app_name": "spotify.exe" },
                "brave_sideways": { "hotkey": "ctrl+x", "app_name": "x" },
                "garbage": 3,
                "focused_mute": { "hotkey": "ctrl+f", "app_name": "notepad.exe" },
                "overlay_enabled": false
            }"#,
        )
        .unwrap();
        let settings = Settings::from_document(&doc);

        assert_eq!(settings.bindings.len(), 3);
        assert!(settings.binding("spotify").is_none());
        let focused = settings.binding("focused").unwrap();
        assert_eq!(focused.mute, "ctrl+f");
        assert_eq!(focused.app_name, "focused");
        assert!(!settings.overlay_enabled);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Settings::read_from(&path),
            Err(SettingsError::Json { .. })
        ));
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        // A regular file sits where the parent directory should be
        let err = Settings::default()
            .save_to(&blocker.join(SETTINGS_FILE))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_hotkeys_differ() {
        let a = Settings::default();
        let mut b = a.clone();
        b.overlay_enabled = false;
        b.bindings[0].app_name = "chrome.exe".to_string();
        assert!(!a.hotkeys_differ(&b));

        b.bindings[2].up = "ctrl+up".to_string();
        assert!(a.hotkeys_differ(&b));
    }
}
