//! Capability probes for raw input device nodes.
//!
//! A probe answers "which events can this node generate?" for one path.
//! Failure of any kind (tool missing, timeout, unreadable node) yields
//! `None`, which the scanner treats as "not a candidate".

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::platform::linux::process::{CommandRunner, CommandSpec};
use crate::platform::DeviceClass;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Capability flags relevant to device selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    pub left_button: bool,
    pub right_button: bool,
    pub rel_x: bool,
    pub wheel: bool,
    pub hwheel: bool,
    pub alpha_key: bool,
    pub enter_key: bool,
}

impl Capabilities {
    /// Parses an `evemu-describe` listing by token containment.
    ///
    /// Tokens are whole identifiers, so `REL_WHEEL_HI_RES` does not count as
    /// `REL_WHEEL`.
    pub fn from_description(desc: &str) -> Self {
        let tokens: HashSet<&str> = desc
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            left_button: tokens.contains("BTN_LEFT"),
            right_button: tokens.contains("BTN_RIGHT"),
            rel_x: tokens.contains("REL_X"),
            wheel: tokens.contains("REL_WHEEL"),
            hwheel: tokens.contains("REL_HWHEEL"),
            alpha_key: tokens.contains("KEY_A"),
            enter_key: tokens.contains("KEY_ENTER"),
        }
    }

    /// Minimum capabilities for the class.
    pub fn qualifies(&self, class: DeviceClass) -> bool {
        match class {
            DeviceClass::Mouse => self.left_button && self.rel_x,
            DeviceClass::Keyboard => self.alpha_key && self.enter_key,
        }
    }

    /// Mouse ranking: one point each for right button, wheel and
    /// horizontal wheel.
    pub fn mouse_score(&self) -> u8 {
        [self.right_button, self.wheel, self.hwheel]
            .iter()
            .filter(|&&flag| flag)
            .count() as u8
    }
}

// ---------------------------------------------------------------------------
// Probe trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Returns the node's capabilities, or `None` if it could not be probed.
    async fn probe(&self, path: &Path) -> Option<Capabilities>;
}

// ---------------------------------------------------------------------------
// evemu-describe
// ---------------------------------------------------------------------------

/// Probes with the external `evemu-describe` tool.
pub struct EvemuProbe {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl EvemuProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

#[async_trait]
impl CapabilityProbe for EvemuProbe {
    async fn probe(&self, path: &Path) -> Option<Capabilities> {
        let spec = CommandSpec::new("evemu-describe", self.timeout).arg(path.display().to_string());
        match self.runner.run(&spec).await {
            Ok(output) => Some(Capabilities::from_description(&output.stdout)),
            Err(e) => {
                log::debug!("probe: device check failed for {}: {e}", path.display());
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Native evdev query
// ---------------------------------------------------------------------------

/// Probes by opening the node with the `evdev` crate.
pub struct NativeProbe {
    timeout: Duration,
}

impl NativeProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CapabilityProbe for NativeProbe {
    async fn probe(&self, path: &Path) -> Option<Capabilities> {
        let owned = path.to_owned();
        let query = tokio::task::spawn_blocking(move || query_native(&owned));

        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(Ok(caps))) => Some(caps),
            Ok(Ok(Err(e))) => {
                log::debug!("probe: cannot open {}: {e}", path.display());
                None
            }
            Ok(Err(e)) => {
                log::debug!("probe: query task for {} failed: {e}", path.display());
                None
            }
            Err(_) => {
                log::debug!("probe: query for {} timed out", path.display());
                None
            }
        }
    }
}

fn query_native(path: &Path) -> std::io::Result<Capabilities> {
    use evdev::{Key, RelativeAxisType};

    let device = evdev::Device::open(path)?;
    let keys = device.supported_keys();
    let rels = device.supported_relative_axes();
    let has_key = |k: Key| keys.is_some_and(|set| set.contains(k));
    let has_rel = |a: RelativeAxisType| rels.is_some_and(|set| set.contains(a));

    Ok(Capabilities {
        left_button: has_key(Key::BTN_LEFT),
        right_button: has_key(Key::BTN_RIGHT),
        rel_x: has_rel(RelativeAxisType::REL_X),
        wheel: has_rel(RelativeAxisType::REL_WHEEL),
        hwheel: has_rel(RelativeAxisType::REL_HWHEEL),
        alpha_key: has_key(Key::KEY_A),
        enter_key: has_key(Key::KEY_ENTER),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
