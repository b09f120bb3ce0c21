//! Configuration loading.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file: `--config`, else `DESKPILOT_CONFIG`, else
//!    `<config dir>/deskpilot/config.toml` (skipped when absent)
//! 3. `DESKPILOT_MOUSE_DEVICE` / `DESKPILOT_KEYBOARD_DEVICE`
//!
//! ```toml
//! [devices]
//! input_dir = "/dev/input"
//! probe = "native"          # or "evemu"
//! emitter = "evemu"         # or "native"
//!
//! [capture]
//! backends = ["grim", "portal"]
//! include_cursor = false
//!
//! [chain]
//! non_critical = ["scroll:"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::synth::Timing;

pub const CONFIG_ENV: &str = "DESKPILOT_CONFIG";
pub const MOUSE_DEVICE_ENV: &str = "DESKPILOT_MOUSE_DEVICE";
pub const KEYBOARD_DEVICE_ENV: &str = "DESKPILOT_KEYBOARD_DEVICE";

/// Capture backend names, in default priority order.
pub const CAPTURE_BACKENDS: &[&str] = &["ksnip", "gnome-screenshot", "spectacle", "portal", "grim"];

/// Pointer backend names, in default priority order.
pub const POINTER_BACKENDS: &[&str] = &["evdev", "ydotool", "xdotool", "xtest"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown {section} backend \"{name}\" (expected one of: {expected})")]
    UnknownBackend {
        section: &'static str,
        name: String,
        expected: String,
    },

    #[error("{0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// How device capabilities are read and events written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// `evemu-describe` / `evemu-event` subprocesses.
    #[default]
    Evemu,
    /// Direct access through the evdev ioctl interface.
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub input_dir: PathBuf,
    /// Mouse node to use without scanning.
    pub mouse: Option<PathBuf>,
    /// Keyboard node to use without scanning.
    pub keyboard: Option<PathBuf>,
    pub probe: Strategy,
    pub emitter: Strategy,
    pub probe_timeout_ms: u64,
    /// Per-event timeout for the `evemu` emitter.
    pub emit_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/dev/input"),
            mouse: None,
            keyboard: None,
            probe: Strategy::Evemu,
            emitter: Strategy::Evemu,
            probe_timeout_ms: 1_000,
            emit_timeout_ms: 2_000,
        }
    }
}

impl DeviceConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn emit_timeout(&self) -> Duration {
        Duration::from_millis(self.emit_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub backends: Vec<String>,
    /// Default output file; relative paths resolve against the working
    /// directory.
    pub output: PathBuf,
    pub include_cursor: bool,
    /// Mute sounds and animations while capturing.
    pub suppress_effects: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backends: owned(CAPTURE_BACKENDS),
            output: PathBuf::from("screenshot.png"),
            include_cursor: true,
            suppress_effects: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointerConfig {
    pub backends: Vec<String>,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            backends: owned(POINTER_BACKENDS),
        }
    }
}

/// Synthesizer delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub key_hold_ms: u64,
    pub key_gap_ms: u64,
    pub click_hold_ms: u64,
    pub move_settle_ms: u64,
    pub drag_step_ms: u64,
    pub drag_release_ms: u64,
    pub scroll_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::from(Timing::default())
    }
}

impl From<Timing> for TimingConfig {
    fn from(t: Timing) -> Self {
        let ms = |d: Duration| d.as_millis() as u64;
        Self {
            key_hold_ms: ms(t.key_hold),
            key_gap_ms: ms(t.key_gap),
            click_hold_ms: ms(t.click_hold),
            move_settle_ms: ms(t.move_settle),
            drag_step_ms: ms(t.drag_step),
            drag_release_ms: ms(t.drag_release),
            scroll_settle_ms: ms(t.scroll_settle),
        }
    }
}

impl TimingConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            key_hold: Duration::from_millis(self.key_hold_ms),
            key_gap: Duration::from_millis(self.key_gap_ms),
            click_hold: Duration::from_millis(self.click_hold_ms),
            move_settle: Duration::from_millis(self.move_settle_ms),
            drag_step: Duration::from_millis(self.drag_step_ms),
            drag_release: Duration::from_millis(self.drag_release_ms),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Action prefixes whose failure does not stop a chain.
    pub non_critical: Vec<String>,
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub devices: DeviceConfig,
    pub capture: CaptureConfig,
    pub pointer: PointerConfig,
    pub timing: TimingConfig,
    pub chain: ChainConfig,
}

impl Config {
    /// Loads the configuration for this process (file, then environment).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => match default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    log::debug!("config: no config file, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_device_overrides(
            std::env::var_os(MOUSE_DEVICE_ENV).map(PathBuf::from),
            std::env::var_os(KEYBOARD_DEVICE_ENV).map(PathBuf::from),
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Device overrides from the environment beat the file.
    pub fn apply_device_overrides(&mut self, mouse: Option<PathBuf>, keyboard: Option<PathBuf>) {
        if let Some(path) = mouse.filter(|p| !p.as_os_str().is_empty()) {
            self.devices.mouse = Some(path);
        }
        if let Some(path) = keyboard.filter(|p| !p.as_os_str().is_empty()) {
            self.devices.keyboard = Some(path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_backends("capture", &self.capture.backends, CAPTURE_BACKENDS)?;
        check_backends("pointer", &self.pointer.backends, POINTER_BACKENDS)?;
        for (key, value) in [
            ("probe_timeout_ms", self.devices.probe_timeout_ms),
            ("emit_timeout_ms", self.devices.emit_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "devices.{key} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("deskpilot").join("config.toml"))
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn check_backends(
    section: &'static str,
    names: &[String],
    known: &[&str],
) -> Result<(), ConfigError> {
    if names.is_empty() {
        return Err(ConfigError::Invalid(format!("{section}.backends is empty")));
    }
    match names.iter().find(|name| !known.contains(&name.as_str())) {
        Some(name) => Err(ConfigError::UnknownBackend {
            section,
            name: name.clone(),
            expected: known.join(", "),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
