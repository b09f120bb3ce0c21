//! Screenshot capture backends.
//!
//! Default priority: `ksnip` (cursor support), `gnome-screenshot`,
//! `spectacle`, the desktop portal, then `grim` as the Wayland last resort.
//! `DesktopEffects` is attached to the executor so the shutter flash and
//! sound are muted once per capture, whichever backend ends up working.

mod backends;
mod effects;
mod portal;

use std::sync::Arc;

pub use backends::{GnomeScreenshot, Grim, Ksnip, Spectacle};
pub use effects::DesktopEffects;
pub use portal::Portal;

use super::detect::{detect_display_server, has_session_bus, DisplayServer};
use super::process::CommandRunner;
use crate::fallback::{Backend, FallbackExecutor};
use crate::platform::{CaptureRequest, PlatformError};

/// Session facts the backends' preconditions depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub wayland: bool,
    pub session_bus: bool,
}

impl Session {
    pub fn detect() -> Self {
        Self {
            wayland: detect_display_server() == Some(DisplayServer::Wayland),
            session_bus: has_session_bus(),
        }
    }
}

/// Constructs the named backend.
pub fn capture_backend(
    name: &str,
    runner: &Arc<dyn CommandRunner>,
    session: Session,
) -> Option<Box<dyn Backend<CaptureRequest>>> {
    let backend: Box<dyn Backend<CaptureRequest>> = match name {
        "ksnip" => Box::new(Ksnip::new(runner.clone())),
        "gnome-screenshot" => Box::new(GnomeScreenshot::new(runner.clone())),
        "spectacle" => Box::new(Spectacle::new(runner.clone())),
        "portal" => Box::new(Portal::new(session.session_bus)),
        "grim" => Box::new(Grim::new(runner.clone(), session.wayland)),
        _ => return None,
    };
    Some(backend)
}

/// Builds the capture executor for `names`, optionally muting effects.
pub fn capture_executor(
    names: &[String],
    runner: Arc<dyn CommandRunner>,
    session: Session,
    suppress_effects: bool,
) -> Result<FallbackExecutor<CaptureRequest>, PlatformError> {
    let backends = names
        .iter()
        .map(|name| {
            capture_backend(name, &runner, session).ok_or_else(|| {
                PlatformError::Unavailable(format!("unknown capture backend: {name}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let executor = FallbackExecutor::new(backends);
    Ok(if suppress_effects {
        executor.with_effects(Arc::new(DesktopEffects::new(runner)))
    } else {
        executor
    })
}
