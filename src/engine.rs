//! Engine: every component built once from configuration.
//!
//! Startup order: scanner, then mouse and keyboard selection (a missing
//! device is logged and leaves that controller absent), then the pointer and
//! capture executors, then the handler registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::chain::{
    builtin_registry, ChainProcessor, Controllers, CriticalityPolicy, ExecutionResult,
};
use crate::config::Config;
use crate::fallback::FallbackExecutor;
use crate::platform::linux::capture::{capture_executor, Session};
use crate::platform::linux::detect::resolve_x11_env;
use crate::platform::linux::devices::{DeviceScanner, InputDevice};
use crate::platform::linux::pointer::pointer_executor;
use crate::platform::linux::process::{CommandRunner, SystemRunner};
use crate::platform::linux::{create_scanner, create_sink};
use crate::platform::{resolve_output, CaptureRequest, DeviceClass, EventSink, PlatformError};
use crate::synth::{Keyboard, Mouse};

/// Outcome of one capture request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// What the backend reported, e.g. the file it wrote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Engine {
    config: Config,
    scanner: DeviceScanner,
    capture: Arc<FallbackExecutor<CaptureRequest>>,
    chain: ChainProcessor,
}

impl Engine {
    pub async fn new(config: Config) -> Result<Self, PlatformError> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let scanner = create_scanner(&config.devices, runner.clone());
        let timing = config.timing.timing();

        let mouse = open_device(
            &scanner,
            &config,
            runner.clone(),
            DeviceClass::Mouse,
            config.devices.mouse.as_deref(),
        )
        .await?
        .map(|sink| Arc::new(Mouse::new(sink, timing)));
        let keyboard = open_device(
            &scanner,
            &config,
            runner.clone(),
            DeviceClass::Keyboard,
            config.devices.keyboard.as_deref(),
        )
        .await?
        .map(|sink| Arc::new(Keyboard::new(sink, timing)));
        if let Some(mouse) = &mouse {
            log::info!("engine: mouse on {}", mouse.device().display());
        }
        if let Some(keyboard) = &keyboard {
            log::info!("engine: keyboard on {}", keyboard.device().display());
        }

        let pointer = Arc::new(pointer_executor(
            &config.pointer.backends,
            runner.clone(),
            mouse.clone(),
            resolve_x11_env(),
        )?);
        let capture = Arc::new(capture_executor(
            &config.capture.backends,
            runner,
            Session::detect(),
            config.capture.suppress_effects,
        )?);
        log::info!("engine: pointer backends {:?}", pointer.backend_names());
        log::info!("engine: capture backends {:?}", capture.backend_names());

        let registry = builtin_registry(Controllers {
            mouse,
            keyboard,
            pointer,
            capture: capture.clone(),
            capture_output: resolve_output(&config.capture.output),
            include_cursor: config.capture.include_cursor,
        });
        let policy = CriticalityPolicy::with_non_critical(config.chain.non_critical.clone());
        let chain = ChainProcessor::new(Arc::new(registry), policy);

        Ok(Self {
            config,
            scanner,
            capture,
            chain,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run_chain(&self, raw: &str) -> ExecutionResult {
        self.chain.run(raw).await
    }

    /// Runs one action as a single-step chain.
    pub async fn run_action(&self, prefix: &str, params: &str) -> ExecutionResult {
        self.chain.run_action(prefix, params).await
    }

    /// Captures the screen. An empty output path means the configured
    /// default.
    pub async fn capture(&self, mut request: CaptureRequest) -> CaptureResult {
        if request.output.as_os_str().is_empty() {
            request.output.clone_from(&self.config.capture.output);
        }
        request.output = resolve_output(&request.output);

        match self.capture.run(&request).await {
            Ok(outcome) => {
                log::info!(
                    "capture: saved {} via {}",
                    request.output.display(),
                    outcome.backend
                );
                CaptureResult {
                    success: true,
                    filename: Some(request.output),
                    backend: Some(outcome.backend.to_owned()),
                    detail: outcome.success.detail,
                    warnings: outcome.success.warnings,
                    error: None,
                }
            }
            Err(e) => CaptureResult {
                error: Some(e.to_string()),
                ..CaptureResult::default()
            },
        }
    }

    /// Every qualifying device of `class`, best first.
    pub async fn devices(&self, class: DeviceClass) -> Result<Vec<InputDevice>, PlatformError> {
        self.scanner.scan(class).await
    }
}

/// Selects and opens the device for `class`. `Ok(None)` when none qualifies.
async fn open_device(
    scanner: &DeviceScanner,
    config: &Config,
    runner: Arc<dyn CommandRunner>,
    class: DeviceClass,
    override_path: Option<&Path>,
) -> Result<Option<Arc<dyn EventSink>>, PlatformError> {
    let device = match scanner.select(class, override_path).await {
        Ok(device) => device,
        Err(PlatformError::DeviceNotFound(_)) => {
            log::warn!("engine: no {class} device, {class} actions will fail");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    match create_sink(&device.path, &config.devices, runner) {
        Ok(sink) => Ok(Some(sink)),
        Err(e) => {
            log::warn!("engine: cannot open {}: {e}", device.path.display());
            Ok(None)
        }
    }
}
