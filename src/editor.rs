use std::path::PathBuf;

use crate::capture::{CaptureOutcome, CaptureSession, KeyEvent};
use crate::settings::{default_bindings, HotkeyBinding, Settings, SettingsError, Slot};

/// Which hotkey field a capture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldId {
    pub row: usize,
    pub slot: Slot,
}

/// Editor state behind the settings window
#[derive(Debug)]
pub struct SettingsEditor {
    pub rows: Vec<HotkeyBinding>,
    pub overlay_enabled: bool,
    capture: Option<(FieldId, CaptureSession)>,
    /// Modal error text from the last failed save
    pub error: Option<String>,
    path: PathBuf,
}

impl SettingsEditor {
    /// Open the editor on the file at `path`, defaults filling any gaps
    pub fn open(path: PathBuf) -> Self {
        let settings = Settings::load_from(&path);
        Self::from_settings(settings, path)
    }

    pub fn from_settings(settings: Settings, path: PathBuf) -> Self {
        Self {
            rows: settings.bindings,
            overlay_enabled: settings.overlay_enabled,
            capture: None,
            error: None,
            path,
        }
    }

    pub fn capturing(&self) -> Option<FieldId> {
        self.capture.as_ref().map(|(field, _)| *field)
    }

    /// Text a hotkey field should show right now
    pub fn field_text(&self, field: FieldId) -> &str {
        match &self.capture {
            Some((active, session)) if *active == field => session.text(),
            _ => self
                .rows
                .get(field.row)
                .map(|row| row.hotkey(field.slot))
                .unwrap_or(""),
        }
    }

    /// Start capturing into `field`. Any other open capture ends as if the
    /// user clicked away from it.
    pub fn begin_capture(&mut self, field: FieldId) {
        if field.row >= self.rows.len() {
            return;
        }
        if self.capturing() == Some(field) {
            return;
        }
        self.click_away();
        let original = self.rows[field.row].hotkey(field.slot).to_string();
        self.capture = Some((field, CaptureSession::begin(original)));
    }

    /// Feed a key press to the open capture. Returns true when capture ended.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        let Some((field, session)) = self.capture.as_mut() else {
            return false;
        };
        match session.handle_key(event) {
            CaptureOutcome::Finished(value) => {
                let field = *field;
                self.capture = None;
                self.store(field, value);
                true
            }
            CaptureOutcome::Updated(_) | CaptureOutcome::Ignored => false,
        }
    }

    /// Focus left the capturing field
    pub fn click_away(&mut self) {
        if let Some((field, session)) = self.capture.take() {
            let value = session.click_away();
            self.store(field, value);
        }
    }

    fn store(&mut self, field: FieldId, value: String) {
        if let Some(row) = self.rows.get_mut(field.row) {
            *row.hotkey_mut(field.slot) = value;
        }
    }

    /// Revert every in-memory value to the defaults. Nothing is written.
    pub fn reset_to_defaults(&mut self) {
        self.capture = None;
        self.rows = default_bindings();
        self.overlay_enabled = true;
        tracing::info!("[Settings] Editor reset to defaults");
    }

    pub fn to_settings(&self) -> Settings {
        Settings {
            bindings: self.rows.clone(),
            overlay_enabled: self.overlay_enabled,
        }
    }

    /// Write the document. On failure the error is kept for the modal and
    /// the editor stays open.
    pub fn save(&mut self) -> Result<Settings, SettingsError> {
        self.click_away();
        let settings = self.to_settings();
        match settings.save_to(&self.path) {
            Ok(()) => {
                self.error = None;
                Ok(settings)
            }
            Err(e) => {
                tracing::error!("[Settings] Save failed: {}", e);
                self.error = Some(format!("Failed to save settings: {}", e));
                Err(e)
            }
        }
    }
}
