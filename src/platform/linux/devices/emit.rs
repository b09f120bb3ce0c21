//! Event sinks for a selected device node.
//!
//! `EvemuSink` shells out to `evemu-event` once per event (optionally with
//! `--sync`). `NativeSink` keeps the node open through the `evdev` crate and
//! writes events directly, which avoids a process spawn per event.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evdev::EventType;

use crate::platform::linux::process::{CommandRunner, CommandSpec};
use crate::platform::{EventSink, InputEvent, PlatformError};

// ---------------------------------------------------------------------------
// evemu-event
// ---------------------------------------------------------------------------

pub struct EvemuSink {
    device: PathBuf,
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl EvemuSink {
    pub fn new(
        device: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        timeout: Duration,
    ) -> Self {
        Self {
            device: device.into(),
            runner,
            timeout,
        }
    }

    fn command(&self, event: InputEvent) -> CommandSpec {
        let (kind, code, value) = match event {
            InputEvent::Key { key, state } => ("EV_KEY", key.name(), state.value()),
            InputEvent::Rel { axis, value } => ("EV_REL", axis.name(), value),
            InputEvent::Sync => ("EV_SYN", "SYN_REPORT", 0),
        };
        CommandSpec::new("evemu-event", self.timeout)
            .arg(self.device.display().to_string())
            .args(["--type", kind, "--code", code, "--value"])
            .arg(value.to_string())
    }

    async fn run(&self, spec: CommandSpec) -> Result<(), PlatformError> {
        self.runner.run(&spec).await.map(|_| ()).map_err(|e| {
            log::error!("emit: {} failed: {e}", spec.command_line());
            PlatformError::EmissionFailure(e.to_string())
        })
    }
}

#[async_trait]
impl EventSink for EvemuSink {
    async fn emit(&self, event: InputEvent) -> Result<(), PlatformError> {
        self.run(self.command(event)).await
    }

    async fn emit_synced(&self, event: InputEvent) -> Result<(), PlatformError> {
        if event == InputEvent::Sync {
            return self.emit(event).await;
        }
        self.run(self.command(event).arg("--sync")).await
    }

    fn device(&self) -> &Path {
        &self.device
    }
}

// ---------------------------------------------------------------------------
// Native evdev writes
// ---------------------------------------------------------------------------

pub struct NativeSink {
    device: PathBuf,
    handle: Mutex<evdev::Device>,
}

impl NativeSink {
    /// Opens the node for writing.
    pub fn open(device: impl Into<PathBuf>) -> Result<Self, PlatformError> {
        let device = device.into();
        let handle = evdev::Device::open(&device).map_err(|e| {
            PlatformError::Unavailable(format!("cannot open {}: {e}", device.display()))
        })?;
        log::debug!(
            "emit: opened {} ({})",
            device.display(),
            handle.name().unwrap_or("unnamed")
        );
        Ok(Self {
            device,
            handle: Mutex::new(handle),
        })
    }

    fn write(&self, events: &[evdev::InputEvent]) -> Result<(), PlatformError> {
        let mut handle = self
            .handle
            .lock()
            .map_err(|_| PlatformError::EmissionFailure("device handle poisoned".into()))?;
        handle.send_events(events).map_err(|e| {
            log::error!("emit: write to {} failed: {e}", self.device.display());
            PlatformError::EmissionFailure(e.to_string())
        })
    }
}

fn to_evdev(event: InputEvent) -> evdev::InputEvent {
    match event {
        InputEvent::Key { key, state } => {
            evdev::InputEvent::new(EventType::KEY, key.code(), state.value())
        }
        InputEvent::Rel { axis, value } => {
            evdev::InputEvent::new(EventType::RELATIVE, axis.code(), value)
        }
        InputEvent::Sync => evdev::InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
    }
}

#[async_trait]
impl EventSink for NativeSink {
    async fn emit(&self, event: InputEvent) -> Result<(), PlatformError> {
        self.write(&[to_evdev(event)])
    }

    async fn emit_synced(&self, event: InputEvent) -> Result<(), PlatformError> {
        if event == InputEvent::Sync {
            return self.emit(event).await;
        }
        self.write(&[to_evdev(event), to_evdev(InputEvent::Sync)])
    }

    fn device(&self) -> &Path {
        &self.device
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
