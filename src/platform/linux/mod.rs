//! Linux platform backend.
//!
//! Devices: raw `/dev/input` nodes, probed and written either through the
//! `evemu-*` tools or natively through the `evdev` crate.
//! Capture: screenshot tools, the desktop portal and `grim`, tried in order.
//! Pointer: the evdev synthesizer, `ydotool`, `xdotool` and XTest.
//!
//! Startup detection:
//! 1. `WAYLAND_DISPLAY` set  → Wayland; `grim` becomes eligible
//! 2. `DISPLAY` set or `/tmp/.X11-unix/X0` present → X11 pointer backends
//! 3. `DBUS_SESSION_BUS_ADDRESS` set → portal capture

pub mod capture;
pub mod detect;
pub mod devices;
pub mod pointer;
pub mod process;
mod x11;

use std::path::Path;
use std::sync::Arc;

use crate::config::{DeviceConfig, Strategy};
use crate::platform::{EventSink, PlatformError};
use devices::{CapabilityProbe, DeviceScanner, EvemuProbe, EvemuSink, NativeProbe, NativeSink};
use process::CommandRunner;

// ---------------------------------------------------------------------------
// Factory: device scanner
// ---------------------------------------------------------------------------

/// Returns a scanner over the configured input directory, honouring the
/// test-mode environment switch.
pub fn create_scanner(config: &DeviceConfig, runner: Arc<dyn CommandRunner>) -> DeviceScanner {
    let probe: Arc<dyn CapabilityProbe> = match config.probe {
        Strategy::Evemu => Arc::new(EvemuProbe::new(runner, config.probe_timeout())),
        Strategy::Native => Arc::new(NativeProbe::new(config.probe_timeout())),
    };
    DeviceScanner::new(&config.input_dir, probe).with_env_test_mode()
}

// ---------------------------------------------------------------------------
// Factory: event sink
// ---------------------------------------------------------------------------

/// Returns a sink writing to `device` with the configured emitter.
///
/// Requires write access to the node (usually `input` group membership).
pub fn create_sink(
    device: &Path,
    config: &DeviceConfig,
    runner: Arc<dyn CommandRunner>,
) -> Result<Arc<dyn EventSink>, PlatformError> {
    let sink: Arc<dyn EventSink> = match config.emitter {
        Strategy::Evemu => Arc::new(EvemuSink::new(device, runner, config.emit_timeout())),
        Strategy::Native => Arc::new(NativeSink::open(device)?),
    };
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::linux::process::testing::FakeRunner;

    #[test]
    fn evemu_sink_needs_no_open_device() {
        let config = DeviceConfig::default();
        let sink = create_sink(
            Path::new("/dev/input/event42"),
            &config,
            Arc::new(FakeRunner::new()),
        )
        .unwrap();
        assert_eq!(sink.device(), Path::new("/dev/input/event42"));
    }

    #[test]
    fn native_sink_fails_on_missing_node() {
        let config = DeviceConfig {
            emitter: Strategy::Native,
            ..DeviceConfig::default()
        };
        let result = create_sink(
            Path::new("/nonexistent/event0"),
            &config,
            Arc::new(FakeRunner::new()),
        );
        assert!(matches!(result, Err(PlatformError::Unavailable(_))));
    }
}
