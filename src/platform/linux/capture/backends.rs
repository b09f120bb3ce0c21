//! Screenshot tools driven as subprocesses.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::fallback::{Backend, BackendError, BackendSuccess};
use crate::platform::linux::process::{CommandRunner, CommandSpec};
use crate::platform::{CaptureMode, CaptureRequest};

const SLURP_TIMEOUT: Duration = Duration::from_secs(60);
const GRIM_TIMEOUT: Duration = Duration::from_secs(20);

/// Builds a capture command with the shutter sound silenced.
fn capture_command(program: &str, timeout: Duration) -> CommandSpec {
    CommandSpec::new(program, timeout).env("SOUND_THEME", "silent")
}

fn output_arg(path: &Path) -> String {
    path.display().to_string()
}

fn written(request: &CaptureRequest) -> BackendSuccess {
    BackendSuccess {
        detail: Some(output_arg(&request.output)),
        warnings: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// ksnip
// ---------------------------------------------------------------------------

/// `ksnip`: supports cursor inclusion.
pub struct Ksnip {
    runner: Arc<dyn CommandRunner>,
}

impl Ksnip {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, request: &CaptureRequest) -> CommandSpec {
        let mut cmd = capture_command("ksnip", self.timeout(request))
            .arg("-f")
            .arg(output_arg(&request.output));
        cmd = match request.mode {
            CaptureMode::Window => cmd.arg("-a"),
            _ => cmd.arg("-m"),
        };
        if request.include_cursor {
            cmd = cmd.arg("-c");
        }
        cmd
    }
}

#[async_trait]
impl Backend<CaptureRequest> for Ksnip {
    fn name(&self) -> &'static str {
        "ksnip"
    }

    async fn available(&self, request: &CaptureRequest) -> bool {
        request.mode != CaptureMode::Region && self.runner.has_binary("ksnip")
    }

    fn timeout(&self, _: &CaptureRequest) -> Duration {
        Duration::from_secs(15)
    }

    async fn attempt(&self, request: &CaptureRequest) -> Result<BackendSuccess, BackendError> {
        self.runner.run(&self.command(request)).await?;
        Ok(written(request))
    }
}

// ---------------------------------------------------------------------------
// gnome-screenshot
// ---------------------------------------------------------------------------

pub struct GnomeScreenshot {
    runner: Arc<dyn CommandRunner>,
}

impl GnomeScreenshot {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, request: &CaptureRequest) -> CommandSpec {
        let mut cmd = capture_command("gnome-screenshot", self.timeout(request))
            .arg("-f")
            .arg(output_arg(&request.output));
        if request.mode == CaptureMode::Window {
            cmd = cmd.arg("-w");
        }
        if request.include_cursor {
            cmd = cmd.arg("--include-pointer");
        }
        cmd
    }
}

#[async_trait]
impl Backend<CaptureRequest> for GnomeScreenshot {
    fn name(&self) -> &'static str {
        "gnome-screenshot"
    }

    async fn available(&self, request: &CaptureRequest) -> bool {
        request.mode != CaptureMode::Region && self.runner.has_binary("gnome-screenshot")
    }

    fn timeout(&self, _: &CaptureRequest) -> Duration {
        Duration::from_secs(30)
    }

    async fn attempt(&self, request: &CaptureRequest) -> Result<BackendSuccess, BackendError> {
        self.runner.run(&self.command(request)).await?;
        Ok(written(request))
    }
}

// ---------------------------------------------------------------------------
// spectacle
// ---------------------------------------------------------------------------

/// KDE's `spectacle`, run in background mode.
pub struct Spectacle {
    runner: Arc<dyn CommandRunner>,
}

impl Spectacle {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn command(&self, request: &CaptureRequest) -> CommandSpec {
        let area = match request.mode {
            CaptureMode::Window => "--activewindow",
            _ => "--fullscreen",
        };
        let mut cmd = capture_command("spectacle", self.timeout(request))
            .args([area, "--background", "--nonotify"]);
        if request.include_cursor {
            cmd = cmd.arg("--pointer");
        }
        cmd.arg("--output").arg(output_arg(&request.output))
    }
}

#[async_trait]
impl Backend<CaptureRequest> for Spectacle {
    fn name(&self) -> &'static str {
        "spectacle"
    }

    async fn available(&self, request: &CaptureRequest) -> bool {
        request.mode != CaptureMode::Region && self.runner.has_binary("spectacle")
    }

    fn timeout(&self, _: &CaptureRequest) -> Duration {
        Duration::from_secs(30)
    }

    async fn attempt(&self, request: &CaptureRequest) -> Result<BackendSuccess, BackendError> {
        self.runner.run(&self.command(request)).await?;
        Ok(written(request))
    }
}

// ---------------------------------------------------------------------------
// grim
// ---------------------------------------------------------------------------

/// `grim`: Wayland only, cannot draw the cursor.
///
/// In region mode without a geometry the region is picked with `slurp`.
pub struct Grim {
    runner: Arc<dyn CommandRunner>,
    wayland: bool,
}

impl Grim {
    /// `wayland` says whether a Wayland display is reachable.
    pub fn new(runner: Arc<dyn CommandRunner>, wayland: bool) -> Self {
        Self { runner, wayland }
    }

    async fn select_region(&self) -> Result<String, BackendError> {
        let out = self
            .runner
            .run(&CommandSpec::new("slurp", SLURP_TIMEOUT))
            .await?;
        let geometry = out.stdout.trim().to_owned();
        if geometry.is_empty() {
            return Err(BackendError::new("slurp returned no region"));
        }
        Ok(geometry)
    }
}

#[async_trait]
impl Backend<CaptureRequest> for Grim {
    fn name(&self) -> &'static str {
        "grim"
    }

    async fn available(&self, request: &CaptureRequest) -> bool {
        if !self.wayland || !self.runner.has_binary("grim") {
            return false;
        }
        match request.mode {
            CaptureMode::Auto => true,
            CaptureMode::Region => request.geometry.is_some() || self.runner.has_binary("slurp"),
            CaptureMode::Window => false,
        }
    }

    /// Interactive selection gets its own budget on top of the capture.
    fn timeout(&self, request: &CaptureRequest) -> Duration {
        if request.mode == CaptureMode::Region && request.geometry.is_none() {
            SLURP_TIMEOUT + GRIM_TIMEOUT
        } else {
            GRIM_TIMEOUT
        }
    }

    async fn attempt(&self, request: &CaptureRequest) -> Result<BackendSuccess, BackendError> {
        let geometry = match (request.mode, &request.geometry) {
            (CaptureMode::Region, Some(geometry)) => Some(geometry.clone()),
            (CaptureMode::Region, None) => Some(self.select_region().await?),
            _ => None,
        };

        let mut cmd = capture_command("grim", GRIM_TIMEOUT);
        if let Some(geometry) = geometry {
            cmd = cmd.arg("-g").arg(geometry);
        }
        self.runner
            .run(&cmd.arg(output_arg(&request.output)))
            .await?;

        let success = written(request);
        Ok(if request.include_cursor {
            success.with_warning("grim cannot capture the cursor")
        } else {
            success
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
