//! Platform abstraction layer.
//!
//! Defines the raw input event model, the `EventSink` trait the synthesizer
//! writes through, and the `PlatformError` taxonomy shared by every layer.
//! Linux implementations (device scanning, evemu/evdev sinks, capture and
//! pointer backends) live in the `linux` child module.

pub mod keycodes;
#[cfg(target_os = "linux")]
pub mod linux;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use keycodes::Key;

use crate::fallback::Request;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by platform operations.
///
/// Probe and backend failures never appear here while alternatives remain;
/// they are logged and the next candidate is tried.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// No device of the requested class qualified after a scan.
    #[error("no suitable {0} device found; check permissions and devices in /dev/input/")]
    DeviceNotFound(DeviceClass),

    /// Every backend for a logical operation failed.
    #[error("all {0} methods failed")]
    BackendExhausted(String),

    /// Malformed action syntax or parameters.
    #[error("{0}")]
    InvalidAction(String),

    /// A low-level event write failed; the current gesture was aborted.
    #[error("event emission failed: {0}")]
    EmissionFailure(String),

    /// A component needed by the operation was never constructed.
    #[error("{0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Devices and events
// ---------------------------------------------------------------------------

/// The two device classes the scanner can look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Mouse,
    Keyboard,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Mouse => f.write_str("mouse"),
            DeviceClass::Keyboard => f.write_str("keyboard"),
        }
    }
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Down,
    Up,
}

impl KeyState {
    /// Event value written to the device (1 = press, 0 = release).
    pub fn value(self) -> i32 {
        match self {
            KeyState::Down => 1,
            KeyState::Up => 0,
        }
    }
}

/// Relative axes used by the synthesizer (`linux/input-event-codes.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelAxis {
    X,
    Y,
    Wheel,
    WheelHiRes,
}

impl RelAxis {
    pub fn code(self) -> u16 {
        match self {
            RelAxis::X => 0x00,
            RelAxis::Y => 0x01,
            RelAxis::Wheel => 0x08,
            RelAxis::WheelHiRes => 0x0b,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RelAxis::X => "REL_X",
            RelAxis::Y => "REL_Y",
            RelAxis::Wheel => "REL_WHEEL",
            RelAxis::WheelHiRes => "REL_WHEEL_HI_RES",
        }
    }
}

/// One raw event as written to an input device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// `EV_KEY`: keyboard keys and mouse buttons.
    Key { key: Key, state: KeyState },
    /// `EV_REL`: relative motion and wheel.
    Rel { axis: RelAxis, value: i32 },
    /// `EV_SYN / SYN_REPORT`: marks the end of one atomic report.
    Sync,
}

impl InputEvent {
    pub fn key(key: Key, state: KeyState) -> Self {
        InputEvent::Key { key, state }
    }

    pub fn rel(axis: RelAxis, value: i32) -> Self {
        InputEvent::Rel { axis, value }
    }
}

// ---------------------------------------------------------------------------
// Fallback requests
// ---------------------------------------------------------------------------

/// What part of the screen a capture covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// The whole screen.
    #[default]
    Auto,
    /// A rectangle: the request geometry, or one picked interactively.
    Region,
    /// The active window.
    Window,
}

impl std::str::FromStr for CaptureMode {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(CaptureMode::Auto),
            "region" => Ok(CaptureMode::Region),
            "window" => Ok(CaptureMode::Window),
            other => Err(PlatformError::InvalidAction(format!(
                "Unknown capture mode: {other}"
            ))),
        }
    }
}

/// One screenshot to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub output: PathBuf,
    pub mode: CaptureMode,
    /// `x,y WxH`, as printed by `slurp`.
    pub geometry: Option<String>,
    pub include_cursor: bool,
}

impl Request for CaptureRequest {
    fn operation(&self) -> &'static str {
        "screenshot"
    }
}

/// Anchors a relative output path to the working directory.
pub fn resolve_output(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_owned();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_owned(),
    }
}

/// A pointer gesture in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRequest {
    Click { x: i32, y: i32 },
    Drag { from: (i32, i32), to: (i32, i32) },
}

impl Request for PointerRequest {
    fn operation(&self) -> &'static str {
        match self {
            PointerRequest::Click { .. } => "click",
            PointerRequest::Drag { .. } => "drag",
        }
    }
}

/// Returns `true` for a geometry of the form `x,y WxH`.
pub fn is_valid_geometry(geometry: &str) -> bool {
    let Some((origin, size)) = geometry.trim().split_once(' ') else {
        return false;
    };
    let origin_ok = origin
        .split_once(',')
        .is_some_and(|(x, y)| x.parse::<i32>().is_ok() && y.parse::<i32>().is_ok());
    let size_ok = size
        .split_once('x')
        .is_some_and(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok());
    origin_ok && size_ok
}

// ---------------------------------------------------------------------------
// Event sink trait
// ---------------------------------------------------------------------------

/// Writes raw events to one selected device.
///
/// Implementations must preserve call order: the synthesizer relies on the
/// sequence of `emit` calls reaching the device in the same order.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Writes a single event.
    async fn emit(&self, event: InputEvent) -> Result<(), PlatformError>;

    /// Writes an event followed by a sync report.
    ///
    /// Sinks that can do both in one write (e.g. `evemu-event --sync`)
    /// override this.
    async fn emit_synced(&self, event: InputEvent) -> Result<(), PlatformError> {
        self.emit(event).await?;
        self.emit(InputEvent::Sync).await
    }

    /// Path of the device node events are written to.
    fn device(&self) -> &Path;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_state_values() {
        assert_eq!(KeyState::Down.value(), 1);
        assert_eq!(KeyState::Up.value(), 0);
    }

    #[test]
    fn rel_axis_codes_match_kernel_headers() {
        assert_eq!(RelAxis::X.code(), 0);
        assert_eq!(RelAxis::Y.code(), 1);
        assert_eq!(RelAxis::Wheel.code(), 8);
        assert_eq!(RelAxis::WheelHiRes.code(), 11);
    }

    #[test]
    fn capture_mode_parses_case_insensitively() {
        assert_eq!("Region".parse::<CaptureMode>().unwrap(), CaptureMode::Region);
        assert_eq!("auto".parse::<CaptureMode>().unwrap(), CaptureMode::Auto);
        assert!("fullscreen".parse::<CaptureMode>().is_err());
    }

    #[test]
    fn relative_output_is_anchored_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_output(Path::new("shot.png")), cwd.join("shot.png"));
        assert_eq!(resolve_output(Path::new("/tmp/a.png")), PathBuf::from("/tmp/a.png"));
    }

    #[test]
    fn geometry_validation() {
        assert!(is_valid_geometry("10,20 300x200"));
        assert!(is_valid_geometry("-1920,0 1920x1080"));
        assert!(!is_valid_geometry("10,20"));
        assert!(!is_valid_geometry("10 20 300 200"));
        assert!(!is_valid_geometry("a,b cxd"));
    }

    #[test]
    fn pointer_operations_are_named_by_gesture() {
        assert_eq!(PointerRequest::Click { x: 1, y: 2 }.operation(), "click");
        let drag = PointerRequest::Drag { from: (0, 0), to: (5, 5) };
        assert_eq!(drag.operation(), "drag");
    }

    #[test]
    fn device_not_found_names_the_class() {
        let err = PlatformError::DeviceNotFound(DeviceClass::Keyboard);
        assert!(err.to_string().contains("keyboard"));
    }
}
