//! Input synthesizer: logical gestures → ordered raw event sequences.
//!
//! `Mouse` and `Keyboard` each own one `EventSink` bound to the device
//! selected at construction. Gestures are not atomic: a concurrent observer
//! may see intermediate states (e.g. X moved but not yet Y).

mod keyboard;
mod mouse;

use std::time::Duration;

pub use keyboard::Keyboard;
pub use mouse::Mouse;

/// Delays between events, tuned so receivers do not coalesce or drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Typing: press → release.
    pub key_hold: Duration,
    /// Typing: release → next press.
    pub key_gap: Duration,
    /// Click: button down → button up.
    pub click_hold: Duration,
    /// After a relative move.
    pub move_settle: Duration,
    /// Drag: between reaching the start, pressing and the bulk move.
    pub drag_step: Duration,
    /// Drag: final move → button up.
    pub drag_release: Duration,
    /// After a scroll.
    pub scroll_settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            key_hold: Duration::from_millis(50),
            key_gap: Duration::from_millis(10),
            click_hold: Duration::from_millis(50),
            move_settle: Duration::from_millis(50),
            drag_step: Duration::from_millis(100),
            drag_release: Duration::from_millis(200),
            scroll_settle: Duration::from_millis(100),
        }
    }
}

impl Timing {
    /// No delays at all.
    pub fn immediate() -> Self {
        Self {
            key_hold: Duration::ZERO,
            key_gap: Duration::ZERO,
            click_hold: Duration::ZERO,
            move_settle: Duration::ZERO,
            drag_step: Duration::ZERO,
            drag_release: Duration::ZERO,
            scroll_settle: Duration::ZERO,
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------
