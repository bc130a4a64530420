//! Hotkey capture for one editor field.
//!
//! begin -> key* -> (Escape | Enter | click-away) -> finished
//!
//! While the session is open the field text is owned by the session; the
//! editor copies it back when the session ends.

pub const PLACEHOLDER: &str = "Press keys...";

/// Modifier state at the time of a key press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key-down delivered by the global listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Lowercase key name ("k", "!", "esc", "enter", "f5", "ctrl", ...)
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// What a key press did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Still capturing; the field now shows this text
    Updated(String),
    /// Capture ended; the field keeps this value
    Finished(String),
    /// Nothing changed
    Ignored,
}

const MODIFIER_KEYS: [&str; 3] = ["ctrl", "shift", "alt"];

/// Held modifiers in fixed order followed by the key, joined by '+'
pub fn combo_string(event: &KeyEvent) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if event.modifiers.ctrl {
        parts.push("ctrl");
    }
    if event.modifiers.shift {
        parts.push("shift");
    }
    if event.modifiers.alt {
        parts.push("alt");
    }
    // A held modifier is already covered by the flags above
    if !MODIFIER_KEYS.contains(&event.key.as_str()) || parts.is_empty() {
        parts.push(&event.key);
    }
    parts.join("+")
}

#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Value before capture started
    original: String,
    /// Text currently shown in the field
    current: String,
}

impl CaptureSession {
    pub fn begin(original: impl Into<String>) -> Self {
        let original = original.into();
        tracing::debug!("[Capture] Started (was '{}')", original);
        Self {
            original,
            current: PLACEHOLDER.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.current
    }

    #[cfg(test)]
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn showing_placeholder(&self) -> bool {
        self.current == PLACEHOLDER
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> CaptureOutcome {
        match event.key.as_str() {
            "esc" => {
                tracing::debug!("[Capture] Cleared");
                self.current.clear();
                CaptureOutcome::Finished(String::new())
            }
            "enter" => {
                if self.showing_placeholder() {
                    CaptureOutcome::Ignored
                } else {
                    tracing::debug!("[Capture] Accepted '{}'", self.current);
                    CaptureOutcome::Finished(self.current.clone())
                }
            }
            _ => {
                self.current = combo_string(event);
                CaptureOutcome::Updated(self.current.clone())
            }
        }
    }

    /// Focus left the field. Returns the value the field keeps.
    pub fn click_away(self) -> String {
        if self.showing_placeholder() {
            tracing::debug!("[Capture] Cancelled, restoring '{}'", self.original);
            self.original
        } else {
            self.current
        }
    }
}
