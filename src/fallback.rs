//! Ordered backend fallback for one logical operation.
//!
//! A `FallbackExecutor` holds a ranked list of `Backend`s. Each backend is a
//! precondition (`available`), an action (`attempt`) and a timeout. Backends
//! are tried strictly in order; the first success wins and a timeout counts
//! as a failure. Per-backend diagnostics are logged as they happen, so the
//! exhaustion error itself stays generic.
//!
//! An optional `EffectSuppressor` brackets the whole operation: it is
//! suppressed once before the first backend and restored once afterwards on
//! every exit path, including a panic inside a backend.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use crate::platform::PlatformError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A request a fallback executor can run.
pub trait Request: Send + Sync + 'static {
    /// Logical operation name, used in logs and the exhaustion error.
    fn operation(&self) -> &'static str;
}

/// Why a single backend attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// What a successful attempt reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSuccess {
    /// Human-readable result, e.g. the file written.
    pub detail: Option<String>,
    /// Capability gaps of this backend (e.g. cannot render the cursor).
    pub warnings: Vec<String>,
}

impl BackendSuccess {
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// One way of carrying out an operation.
#[async_trait]
pub trait Backend<R: Request>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Precondition: binary installed, session type, device present.
    async fn available(&self, request: &R) -> bool;

    /// Upper bound for a single `attempt` of `request`.
    fn timeout(&self, request: &R) -> Duration;

    async fn attempt(&self, request: &R) -> Result<BackendSuccess, BackendError>;
}

/// Desktop side effects muted around an operation.
///
/// Both calls are best effort and must not fail the operation.
#[async_trait]
pub trait EffectSuppressor: Send + Sync {
    async fn suppress(&self);
    async fn restore(&self);
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Name of the backend that succeeded.
    pub backend: &'static str,
    pub success: BackendSuccess,
}

pub struct FallbackExecutor<R: Request> {
    backends: Vec<Box<dyn Backend<R>>>,
    effects: Option<Arc<dyn EffectSuppressor>>,
}

impl<R: Request> FallbackExecutor<R> {
    pub fn new(backends: Vec<Box<dyn Backend<R>>>) -> Self {
        Self {
            backends,
            effects: None,
        }
    }

    pub fn with_effects(mut self, effects: Arc<dyn EffectSuppressor>) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Backend names in priority order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Runs `request` through the backends until one succeeds.
    ///
    /// A panic inside a backend is re-raised after effects were restored.
    pub async fn run(&self, request: &R) -> Result<Outcome, PlatformError> {
        if let Some(effects) = &self.effects {
            effects.suppress().await;
        }

        let result = AssertUnwindSafe(self.try_backends(request))
            .catch_unwind()
            .await;

        if let Some(effects) = &self.effects {
            effects.restore().await;
        }

        match result {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn try_backends(&self, request: &R) -> Result<Outcome, PlatformError> {
        let operation = request.operation();

        for backend in &self.backends {
            let name = backend.name();
            if !backend.available(request).await {
                log::debug!("{operation}: {name} not available, skipping");
                continue;
            }

            log::info!("{operation}: trying {name}");
            let timeout = backend.timeout(request);
            match tokio::time::timeout(timeout, backend.attempt(request)).await {
                Ok(Ok(success)) => {
                    log::info!("{operation}: {name} succeeded");
                    for warning in &success.warnings {
                        log::warn!("{operation}: {name}: {warning}");
                    }
                    return Ok(Outcome {
                        backend: name,
                        success,
                    });
                }
                Ok(Err(e)) => log::warn!("{operation}: {name} failed: {e}"),
                Err(_) => log::warn!(
                    "{operation}: {name} timed out after {:.1}s",
                    timeout.as_secs_f32()
                ),
            }
        }

        log::error!("{operation}: all methods failed");
        Err(PlatformError::BackendExhausted(operation.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
