//! Screenshot through xdg-desktop-portal.
//!
//! Sends a non-interactive `org.freedesktop.portal.Screenshot` request via
//! `ashpd`. The portal writes the image wherever the desktop is configured
//! to (usually `~/Pictures`) and answers with a `file://` URI; the file is
//! then copied to the requested output path.

use std::path::PathBuf;
use std::time::Duration;

use ashpd::desktop::screenshot::Screenshot;
use async_trait::async_trait;

use crate::fallback::{Backend, BackendError, BackendSuccess};
use crate::platform::{CaptureMode, CaptureRequest};

pub struct Portal {
    session_bus: bool,
}

impl Portal {
    /// `session_bus` says whether a D-Bus session bus is advertised.
    pub fn new(session_bus: bool) -> Self {
        Self { session_bus }
    }

    async fn request_file(&self) -> Result<PathBuf, BackendError> {
        let response = Screenshot::request()
            .interactive(false)
            .modal(false)
            .send()
            .await
            .and_then(|request| request.response())
            .map_err(|e| BackendError::new(format!("portal request failed: {e}")))?;

        let uri = response.uri();
        log::debug!("portal: screenshot saved at {uri}");
        uri.to_file_path()
            .map_err(|_| BackendError::new(format!("portal returned a non-file URI: {uri}")))
    }
}

#[async_trait]
impl Backend<CaptureRequest> for Portal {
    fn name(&self) -> &'static str {
        "portal"
    }

    async fn available(&self, request: &CaptureRequest) -> bool {
        self.session_bus && request.mode == CaptureMode::Auto
    }

    fn timeout(&self, _: &CaptureRequest) -> Duration {
        Duration::from_secs(30)
    }

    async fn attempt(&self, request: &CaptureRequest) -> Result<BackendSuccess, BackendError> {
        let saved = self.request_file().await?;
        if saved != request.output {
            tokio::fs::copy(&saved, &request.output).await.map_err(|e| {
                BackendError::new(format!(
                    "cannot copy {} to {}: {e}",
                    saved.display(),
                    request.output.display()
                ))
            })?;
        }

        let success = BackendSuccess {
            detail: Some(request.output.display().to_string()),
            warnings: Vec::new(),
        };
        Ok(if request.include_cursor {
            success.with_warning("the screenshot portal does not control cursor visibility")
        } else {
            success
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn request(mode: CaptureMode) -> CaptureRequest {
        CaptureRequest {
            output: PathBuf::from("/tmp/shot.png"),
            mode,
            geometry: None,
            include_cursor: false,
        }
    }

    #[tokio::test]
    async fn needs_session_bus() {
        assert!(!Portal::new(false).available(&request(CaptureMode::Auto)).await);
        assert!(Portal::new(true).available(&request(CaptureMode::Auto)).await);
    }

    #[tokio::test]
    async fn full_screen_only() {
        let portal = Portal::new(true);
        assert!(!portal.available(&request(CaptureMode::Region)).await);
        assert!(!portal.available(&request(CaptureMode::Window)).await);
    }
}
