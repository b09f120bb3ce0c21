//! Relative-pointer gestures.

use std::path::Path;
use std::sync::Arc;

use super::{pause, Timing};
use crate::platform::keycodes::BTN_LEFT;
use crate::platform::{EventSink, InputEvent, KeyState, PlatformError, RelAxis};

/// Relative move assumed to exceed any screen in both axes; the compositor
/// clamps the pointer at (0, 0).
const ORIGIN_RESET: i32 = -50_000;

/// High-resolution wheel units per detent.
const HI_RES_PER_DETENT: i32 = 120;

/// Drives a relative pointer device.
pub struct Mouse {
    sink: Arc<dyn EventSink>,
    timing: Timing,
}

impl Mouse {
    pub fn new(sink: Arc<dyn EventSink>, timing: Timing) -> Self {
        Self { sink, timing }
    }

    pub fn device(&self) -> &Path {
        self.sink.device()
    }

    /// Moves by (dx, dy): horizontal event first, then vertical.
    pub async fn move_relative(&self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        self.motion(dx, dy).await?;
        pause(self.timing.move_settle).await;
        Ok(())
    }

    /// Moves to screen coordinates by clamping at the origin first.
    pub async fn move_absolute(&self, x: i32, y: i32) -> Result<(), PlatformError> {
        self.motion(ORIGIN_RESET, ORIGIN_RESET).await?;
        log::debug!("mouse: moving to absolute ({x}, {y})");
        self.move_relative(x, y).await
    }

    /// Left click at the current position.
    pub async fn click(&self) -> Result<(), PlatformError> {
        self.button(KeyState::Down).await?;
        pause(self.timing.click_hold).await;
        self.button(KeyState::Up).await
    }

    /// Left-button drag between two screen points.
    ///
    /// After the button goes down, the horizontal displacement is split into
    /// a bulk move and a trailing 1-unit move: some compositors only commit a
    /// drag once a small motion arrives after the press.
    pub async fn drag(&self, from: (i32, i32), to: (i32, i32)) -> Result<(), PlatformError> {
        self.move_absolute(from.0, from.1).await?;
        pause(self.timing.drag_step).await;
        self.button(KeyState::Down).await?;
        pause(self.timing.drag_step).await;

        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        if dx.abs() > 1 {
            self.motion(dx - 1, dy).await?;
            pause(self.timing.drag_step).await;
            self.motion(1, 0).await?;
        } else {
            self.motion(dx, dy).await?;
        }
        pause(self.timing.drag_release).await;

        self.button(KeyState::Up).await
    }

    /// Vertical scroll by `amount` detents (positive = up).
    ///
    /// Emits both the coarse and the high-resolution wheel event so either
    /// kind of receiver sees it.
    pub async fn scroll(&self, amount: i32) -> Result<(), PlatformError> {
        self.sink
            .emit_synced(InputEvent::rel(RelAxis::Wheel, amount))
            .await?;
        self.sink
            .emit_synced(InputEvent::rel(
                RelAxis::WheelHiRes,
                amount.saturating_mul(HI_RES_PER_DETENT),
            ))
            .await?;
        pause(self.timing.scroll_settle).await;
        Ok(())
    }

    async fn motion(&self, dx: i32, dy: i32) -> Result<(), PlatformError> {
        self.sink.emit_synced(InputEvent::rel(RelAxis::X, dx)).await?;
        self.sink.emit_synced(InputEvent::rel(RelAxis::Y, dy)).await
    }

    async fn button(&self, state: KeyState) -> Result<(), PlatformError> {
        self.sink.emit_synced(InputEvent::key(BTN_LEFT, state)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
