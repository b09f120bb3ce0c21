//! Input device discovery and ranking.
//!
//! `DeviceScanner` walks the input directory (normally `/dev/input`), keeps
//! the nodes this process can write to, probes their capabilities and ranks
//! the ones that qualify for the requested class.
//!
//! Required permissions: write access to the event nodes, e.g. membership of
//! the `input` group (`sudo usermod -aG input $USER`, then log in again).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::probe::{Capabilities, CapabilityProbe};
use crate::platform::{DeviceClass, PlatformError};

/// Environment switch that makes every scan fail without touching the
/// filesystem, for deterministic tests of the no-device path.
pub const TEST_NO_DEVICE_ENV: &str = "DESKPILOT_TEST_NO_DEVICE";

// ---------------------------------------------------------------------------
// Device record
// ---------------------------------------------------------------------------

/// A candidate input device, scored once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InputDevice {
    pub path: PathBuf,
    pub capabilities: Capabilities,
    pub score: u8,
    /// `false` for caller-supplied overrides, which are never probed.
    pub verified: bool,
}

impl InputDevice {
    fn trusted(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
            capabilities: Capabilities::default(),
            score: 0,
            verified: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

pub struct DeviceScanner {
    dir: PathBuf,
    probe: Arc<dyn CapabilityProbe>,
    test_mode: bool,
}

impl DeviceScanner {
    pub fn new(dir: impl Into<PathBuf>, probe: Arc<dyn CapabilityProbe>) -> Self {
        Self {
            dir: dir.into(),
            probe,
            test_mode: false,
        }
    }

    /// Enables test mode when `DESKPILOT_TEST_NO_DEVICE=1`.
    pub fn with_env_test_mode(self) -> Self {
        let enabled = std::env::var(TEST_NO_DEVICE_ENV).is_ok_and(|v| v == "1");
        self.with_test_mode(enabled)
    }

    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Picks the device to use for `class`.
    ///
    /// An override path is trusted as-is; otherwise the top-ranked scan
    /// result is returned.
    pub async fn select(
        &self,
        class: DeviceClass,
        override_path: Option<&Path>,
    ) -> Result<InputDevice, PlatformError> {
        if let Some(path) = override_path {
            log::info!("scan: using {class} device override {}", path.display());
            return Ok(InputDevice::trusted(path));
        }

        let ranked = self.scan(class).await?;
        let selected = ranked
            .into_iter()
            .next()
            .ok_or(PlatformError::DeviceNotFound(class))?;
        log::info!(
            "scan: selected {class} device {} (score {})",
            selected.path.display(),
            selected.score
        );
        Ok(selected)
    }

    /// Returns every qualifying device, best first.
    ///
    /// Mice are ordered by score with ties kept in discovery order; keyboards
    /// are unscored and stay in discovery order.
    pub async fn scan(&self, class: DeviceClass) -> Result<Vec<InputDevice>, PlatformError> {
        if self.test_mode {
            log::warn!("scan: test mode, simulating no {class} devices");
            return Err(PlatformError::DeviceNotFound(class));
        }

        let mut qualifying = Vec::new();
        for path in self.candidates(class) {
            if !is_writable(&path) {
                log::debug!("scan: skipping {} - no write permission", path.display());
                continue;
            }
            let Some(capabilities) = self.probe.probe(&path).await else {
                continue;
            };
            if !capabilities.qualifies(class) {
                continue;
            }
            let score = match class {
                DeviceClass::Mouse => capabilities.mouse_score(),
                DeviceClass::Keyboard => 0,
            };
            log::debug!("scan: {} qualifies as {class} (score {score})", path.display());
            qualifying.push(InputDevice {
                path,
                capabilities,
                score,
                verified: true,
            });
        }

        // Stable: equal scores keep discovery order.
        qualifying.sort_by(|a, b| b.score.cmp(&a.score));

        if qualifying.is_empty() {
            log::error!(
                "scan: no suitable {class} device found in {}",
                self.dir.display()
            );
            return Err(PlatformError::DeviceNotFound(class));
        }
        Ok(qualifying)
    }

    /// Node paths to consider, in discovery order: one pass per name prefix,
    /// each pass in sorted name order.
    fn candidates(&self, class: DeviceClass) -> Vec<PathBuf> {
        let prefixes: &[&str] = match class {
            DeviceClass::Mouse => &["event", "mouse"],
            DeviceClass::Keyboard => &["event"],
        };

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("scan: cannot read {}: {e}", self.dir.display());
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        prefixes
            .iter()
            .flat_map(|prefix| names.iter().filter(move |name| name.starts_with(prefix)))
            .map(|name| self.dir.join(name))
            .collect()
    }
}

fn is_writable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
