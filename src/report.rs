//! Volume reports coming from the external hotkey dispatcher.
//!
//! The dispatcher pipes one report per line into stdin:
//!     `<app_name> <fraction>`
//! where `fraction` is in [0, 1], or `-1` when no audio session was found.
//! A line holding only `settings` opens the settings editor.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::Sender;
use thiserror::Error;

/// Sentinel the dispatcher sends when the app has no audio session
pub const NO_SOURCE_SENTINEL: f32 = -1.0;

/// The reported level for one application
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeLevel {
    /// Volume fraction, always within [0, 1]
    Level(f32),
    /// No audio endpoint was found for the application
    NoSource,
}

impl VolumeLevel {
    /// Build a level from the raw dispatcher value (`-1` is the sentinel)
    pub fn from_fraction(raw: f32) -> Self {
        if raw == NO_SOURCE_SENTINEL {
            VolumeLevel::NoSource
        } else {
            VolumeLevel::Level(raw.clamp(0.0, 1.0))
        }
    }

    /// Only an exact zero counts as muted
    pub fn is_muted(&self) -> bool {
        matches!(self, VolumeLevel::Level(v) if *v == 0.0)
    }
}

/// One message from the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeReport {
    /// Tag or process name ("focused" resolves to the foreground app)
    pub app_name: String,
    pub level: VolumeLevel,
}

impl VolumeReport {
    pub fn new(app_name: impl Into<String>, level: VolumeLevel) -> Self {
        Self { app_name: app_name.into(), level }
    }
}

/// Line that opens the settings editor
pub const OPEN_SETTINGS_COMMAND: &str = "settings";

/// Anything the dispatcher can send
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Report(VolumeReport),
    OpenSettings,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReportParseError {
    #[error("expected '<app_name> <fraction>', got '{0}'")]
    MissingField(String),
    #[error("invalid volume fraction '{0}'")]
    InvalidFraction(String),
}

/// Parse one dispatcher line. Returns `Ok(None)` for blank lines.
///
/// The fraction is the last whitespace-separated token so app names may
/// contain spaces.
pub fn parse_report_line(line: &str) -> Result<Option<VolumeReport>, ReportParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (app_name, raw) = line
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| ReportParseError::MissingField(line.to_string()))?;

    let app_name = app_name.trim();
    if app_name.is_empty() {
        return Err(ReportParseError::MissingField(line.to_string()));
    }

    let fraction: f32 = raw
        .parse()
        .map_err(|_| ReportParseError::InvalidFraction(raw.to_string()))?;
    if !fraction.is_finite() {
        return Err(ReportParseError::InvalidFraction(raw.to_string()));
    }

    Ok(Some(VolumeReport::new(app_name, VolumeLevel::from_fraction(fraction))))
}

/// Parse one stdin line, commands included
pub fn parse_inbound_line(line: &str) -> Result<Option<Inbound>, ReportParseError> {
    if line.trim() == OPEN_SETTINGS_COMMAND {
        return Ok(Some(Inbound::OpenSettings));
    }
    Ok(parse_report_line(line)?.map(Inbound::Report))
}

/// Spawn the stdin reader thread.
///
/// Every parsed line is forwarded to the UI loop and `wake` is called so the
/// loop repaints even while the overlay is idle.
pub fn spawn_stdin_reader<W>(tx: Sender<Inbound>, wake: W)
where
    W: Fn() + Send + 'static,
{
    thread::spawn(move || {
        tracing::info!("[Report] Listening for volume reports on stdin");
        let stdin = std::io::stdin();

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("[Report] Failed to read stdin: {}", e);
                    break;
                }
            };

            match parse_inbound_line(&line) {
                Ok(Some(inbound)) => {
                    tracing::debug!("[Report] {:?}", inbound);
                    if tx.send(inbound).is_err() {
                        // UI loop is gone
                        break;
                    }
                    wake();
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("[Report] Skipping line: {}", e),
            }
        }

        tracing::info!("[Report] stdin closed, reader exiting");
    });
}

// === Tests ===
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_line() {
        let report = parse_report_line("discord.exe 0.45").unwrap().unwrap();
        assert_eq!(report.app_name, "discord.exe");
        assert_eq!(report.level, VolumeLevel::Level(0.45));
    }

    #[test]
    fn test_parse_sentinel_line() {
        let report = parse_report_line("focused -1").unwrap().unwrap();
        assert_eq!(report.app_name, "focused");
        assert_eq!(report.level, VolumeLevel::NoSource);
    }

    #[test]
    fn test_app_names_may_contain_spaces() {
        let report = parse_report_line("  My Player.exe   1  ").unwrap().unwrap();
        assert_eq!(report.app_name, "My Player.exe");
        assert_eq!(report.level, VolumeLevel::Level(1.0));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_report_line(""), Ok(None));
        assert_eq!(parse_report_line("   \t "), Ok(None));
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(
            parse_report_line("discord.exe"),
            Err(ReportParseError::MissingField("discord.exe".to_string()))
        );
        assert_eq!(
            parse_report_line("discord.exe loud"),
            Err(ReportParseError::InvalidFraction("loud".to_string()))
        );
        assert!(parse_report_line("discord.exe NaN").is_err());
    }

    #[test]
    fn test_settings_command() {
        assert_eq!(parse_inbound_line(" settings "), Ok(Some(Inbound::OpenSettings)));
        assert_eq!(
            parse_inbound_line("settings 0.5"),
            Ok(Some(Inbound::Report(VolumeReport::new("settings", VolumeLevel::Level(0.5)))))
        );
        assert_eq!(parse_inbound_line(""), Ok(None));
    }

    #[test]
    fn test_out_of_range_fractions_are_clamped() {
        assert_eq!(VolumeLevel::from_fraction(1.7), VolumeLevel::Level(1.0));
        assert_eq!(VolumeLevel::from_fraction(-0.3), VolumeLevel::Level(0.0));
        assert_eq!(VolumeLevel::from_fraction(-1.0), VolumeLevel::NoSource);
    }

    #[test]
    fn test_only_exact_zero_is_muted() {
        assert!(VolumeLevel::Level(0.0).is_muted());
        assert!(!VolumeLevel::Level(0.01).is_muted());
        assert!(!VolumeLevel::NoSource.is_muted());
    }
}
