//! Overlay display state machine
//!
//! hidden -> visible (opaque, dwelling) -> fading -> hidden
//!
//! The machine is clock-driven: callers pass `Instant`s into `show` and `poll`,
//! and the GUI asks for a repaint at `next_deadline()`. There is exactly one
//! animation timer; any new `show` replaces it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::report::VolumeLevel;

/// Full-opacity time before the fade begins
pub const DWELL: Duration = Duration::from_millis(1000);
/// Total fade-out time
pub const FADE_DURATION: Duration = Duration::from_millis(300);
/// Number of opacity decrements in one fade
pub const FADE_STEPS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Hidden,
    /// Fully opaque, waiting for the dwell timer
    Visible,
    Fading,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTimings {
    pub dwell: Duration,
    pub fade_duration: Duration,
    pub fade_steps: u32,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            dwell: DWELL,
            fade_duration: FADE_DURATION,
            fade_steps: FADE_STEPS,
        }
    }
}

impl FadeTimings {
    /// Delay between two opacity decrements
    pub fn step_interval(&self) -> Duration {
        self.fade_duration / self.fade_steps.max(1)
    }
}

/// What the popup shows
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    /// Icon, percentage and progress bar
    Volume {
        app_name: String,
        icon: Arc<RgbaImage>,
        fraction: f32,
    },
    /// "No audio source detected for {app}"
    NoSource { app_name: String },
}

impl OverlayContent {
    /// Pick the layout for a report.
    ///
    /// The sentinel always wins, even when an icon would have resolved. A
    /// missing icon falls back to the same layout.
    pub fn select(app_name: &str, level: VolumeLevel, icon: Option<Arc<RgbaImage>>) -> Self {
        match (level, icon) {
            (VolumeLevel::Level(fraction), Some(icon)) => OverlayContent::Volume {
                app_name: app_name.to_string(),
                icon,
                fraction,
            },
            _ => OverlayContent::NoSource {
                app_name: app_name.to_string(),
            },
        }
    }

    pub fn app_name(&self) -> &str {
        match self {
            OverlayContent::Volume { app_name, .. } => app_name,
            OverlayContent::NoSource { app_name } => app_name,
        }
    }

    pub fn message(&self) -> String {
        match self {
            OverlayContent::Volume { fraction, .. } => percent_label(*fraction),
            OverlayContent::NoSource { app_name } => {
                format!("No audio source detected for {}", app_name)
            }
        }
    }
}

/// "45%" style label. Partial percents are dropped, not rounded.
pub fn percent_label(fraction: f32) -> String {
    format!("{}%", (fraction.clamp(0.0, 1.0) * 100.0) as u32)
}

/// Width of the bright part of the progress bar, in whole pixels
pub fn fill_width(fraction: f32, track_width: f32) -> f32 {
    let track_width = track_width.max(0.0);
    (fraction * track_width).round().clamp(0.0, track_width)
}

pub struct OverlayState {
    phase: OverlayPhase,
    opacity: f32,
    steps_left: u32,
    /// The single pending animation deadline
    timer: Option<Instant>,
    content: Option<OverlayContent>,
    timings: FadeTimings,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new(FadeTimings::default())
    }
}

impl OverlayState {
    pub fn new(timings: FadeTimings) -> Self {
        Self {
            phase: OverlayPhase::Hidden,
            opacity: 0.0,
            steps_left: 0,
            timer: None,
            content: None,
            timings,
        }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn content(&self) -> Option<&OverlayContent> {
        self.content.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.phase != OverlayPhase::Hidden
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer
    }

    /// Display new content at full opacity and restart the dwell timer.
    /// Any fade in progress is cancelled.
    pub fn show(&mut self, content: OverlayContent, now: Instant) {
        if self.phase == OverlayPhase::Fading {
            tracing::debug!("[Overlay] Fade interrupted by new report");
        }
        self.content = Some(content);
        self.phase = OverlayPhase::Visible;
        self.opacity = 1.0;
        self.steps_left = self.timings.fade_steps.max(1);
        self.timer = Some(now + self.timings.dwell);
    }

    /// Hide immediately and drop the pending timer
    pub fn hide(&mut self) {
        self.phase = OverlayPhase::Hidden;
        self.opacity = 0.0;
        self.timer = None;
    }

    /// Fire every timer that is due at `now`. Returns true if anything changed.
    ///
    /// Each step is rescheduled from its own deadline, not from `now`, so a
    /// late poll never stretches the fade.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Some(due) = self.timer {
            if due > now {
                break;
            }
            self.fire(due);
            changed = true;
        }
        changed
    }

    fn fire(&mut self, due: Instant) {
        let step = self.timings.step_interval();
        match self.phase {
            OverlayPhase::Visible => {
                // Dwell over; the first decrement lands one step later
                self.phase = OverlayPhase::Fading;
                self.timer = Some(due + step);
            }
            OverlayPhase::Fading => {
                self.steps_left = self.steps_left.saturating_sub(1);
                self.opacity = self.steps_left as f32 / self.timings.fade_steps.max(1) as f32;
                if self.steps_left == 0 {
                    self.hide();
                } else {
                    self.timer = Some(due + step);
                }
            }
            OverlayPhase::Hidden => {
                self.timer = None;
            }
        }
    }
}
