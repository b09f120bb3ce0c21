//! Desktop effects muted while a screenshot is taken.
//!
//! Capture tools tend to flash the screen and play a shutter sound. Around a
//! capture we turn off GNOME animations and event sounds with `gsettings`
//! and mute the default sink with `pactl`. Every step is best effort: a
//! desktop without GNOME or PulseAudio still gets its screenshot.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::fallback::EffectSuppressor;
use crate::platform::linux::process::{CommandRunner, CommandSpec};

const SETTINGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Time for the settings to reach the compositor before capturing.
const DEFAULT_SETTLE: Duration = Duration::from_millis(300);

/// (schema, key) pairs switched off during a capture.
const TOGGLES: [(&str, &str); 2] = [
    ("org.gnome.desktop.interface", "enable-animations"),
    ("org.gnome.desktop.sound", "event-sounds"),
];

pub struct DesktopEffects {
    runner: Arc<dyn CommandRunner>,
    settle: Duration,
    /// Values read before suppression, one per entry of `TOGGLES`.
    saved: Mutex<Option<[Option<bool>; 2]>>,
}

impl DesktopEffects {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            settle: DEFAULT_SETTLE,
            saved: Mutex::new(None),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    async fn read(&self, schema: &str, key: &str) -> Option<bool> {
        let spec = CommandSpec::new("gsettings", SETTINGS_TIMEOUT).args(["get", schema, key]);
        match self.runner.run(&spec).await {
            Ok(out) => parse_bool(&out.stdout),
            Err(e) => {
                log::debug!("effects: cannot read {schema} {key}: {e}");
                None
            }
        }
    }

    async fn write(&self, schema: &str, key: &str, value: bool) {
        let spec = CommandSpec::new("gsettings", SETTINGS_TIMEOUT)
            .args(["set", schema, key])
            .arg(value.to_string());
        if let Err(e) = self.runner.run(&spec).await {
            log::warn!("effects: cannot set {schema} {key}: {e}");
        }
    }

    async fn mute(&self, muted: bool) {
        let spec = CommandSpec::new("pactl", SETTINGS_TIMEOUT)
            .args(["set-sink-mute", "@DEFAULT_SINK@", if muted { "1" } else { "0" }])
            .env("SOUND_THEME", "silent");
        if let Err(e) = self.runner.run(&spec).await {
            log::debug!("effects: pactl mute={muted} failed: {e}");
        }
    }
}

#[async_trait]
impl EffectSuppressor for DesktopEffects {
    async fn suppress(&self) {
        let mut previous = [None; 2];
        for (slot, (schema, key)) in previous.iter_mut().zip(TOGGLES) {
            *slot = self.read(schema, key).await;
            self.write(schema, key, false).await;
        }
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(previous);
        }
        self.mute(true).await;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        log::debug!("effects: suppressed");
    }

    async fn restore(&self) {
        let previous = self
            .saved
            .lock()
            .ok()
            .and_then(|mut saved| saved.take())
            .unwrap_or([None; 2]);

        for (value, (schema, key)) in previous.into_iter().zip(TOGGLES) {
            self.write(schema, key, value.unwrap_or(true)).await;
        }
        self.mute(false).await;
        log::debug!("effects: restored");
    }
}

/// Parses `gsettings get` output (`true` / `false`).
fn parse_bool(output: &str) -> Option<bool> {
    match output.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
