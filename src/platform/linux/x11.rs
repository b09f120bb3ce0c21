//! Native X11 pointer injection through the XTest extension.
//!
//! Only reaches X11 clients (or XWayland clients under Wayland), which is
//! why it is the last pointer backend.

use std::time::Duration;

use async_trait::async_trait;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT, MOTION_NOTIFY_EVENT};
use x11rb::protocol::xtest::ConnectionExt as _;

use super::detect::X11Env;
use crate::fallback::{Backend, BackendError, BackendSuccess};
use crate::platform::PointerRequest;

const LEFT_BUTTON: u8 = 1;

/// Delay between fake inputs so the server sees distinct events.
const STEP_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeInput {
    Motion { x: i16, y: i16 },
    Press,
    Release,
}

fn coordinate(value: i32) -> Result<i16, BackendError> {
    i16::try_from(value)
        .map_err(|_| BackendError::new(format!("coordinate {value} out of X11 range")))
}

fn motion((x, y): (i32, i32)) -> Result<FakeInput, BackendError> {
    Ok(FakeInput::Motion {
        x: coordinate(x)?,
        y: coordinate(y)?,
    })
}

/// Fake input sequence for a pointer gesture.
fn fake_inputs(request: &PointerRequest) -> Result<Vec<FakeInput>, BackendError> {
    Ok(match *request {
        PointerRequest::Click { x, y } => {
            vec![motion((x, y))?, FakeInput::Press, FakeInput::Release]
        }
        PointerRequest::Drag { from, to } => vec![
            motion(from)?,
            FakeInput::Press,
            motion(to)?,
            FakeInput::Release,
        ],
    })
}

/// Connects to `display` and replays `inputs`. Blocking.
fn replay(display: &str, inputs: &[FakeInput]) -> Result<(), BackendError> {
    let (conn, screen) = x11rb::connect(Some(display))
        .map_err(|e| BackendError::new(format!("cannot connect to {display}: {e}")))?;
    let root = conn
        .setup()
        .roots
        .get(screen)
        .map(|s| s.root)
        .ok_or_else(|| BackendError::new(format!("no screen {screen} on {display}")))?;

    let x11_err = |e: &dyn std::fmt::Display| BackendError::new(format!("xtest: {e}"));
    for (i, input) in inputs.iter().enumerate() {
        if i > 0 {
            std::thread::sleep(STEP_DELAY);
        }
        let (kind, detail, x, y) = match *input {
            FakeInput::Motion { x, y } => (MOTION_NOTIFY_EVENT, 0, x, y),
            FakeInput::Press => (BUTTON_PRESS_EVENT, LEFT_BUTTON, 0, 0),
            FakeInput::Release => (BUTTON_RELEASE_EVENT, LEFT_BUTTON, 0, 0),
        };
        conn.xtest_fake_input(kind, detail, x11rb::CURRENT_TIME, root, x, y, 0)
            .map_err(|e| x11_err(&e))?
            .check()
            .map_err(|e| x11_err(&e))?;
    }
    conn.flush().map_err(|e| x11_err(&e))
}

pub struct XTest {
    x11: Option<X11Env>,
}

impl XTest {
    pub fn new(x11: Option<X11Env>) -> Self {
        Self { x11 }
    }
}

#[async_trait]
impl Backend<PointerRequest> for XTest {
    fn name(&self) -> &'static str {
        "xtest"
    }

    async fn available(&self, _: &PointerRequest) -> bool {
        self.x11.is_some()
    }

    fn timeout(&self, _: &PointerRequest) -> Duration {
        Duration::from_secs(5)
    }

    async fn attempt(&self, request: &PointerRequest) -> Result<BackendSuccess, BackendError> {
        let display = self
            .x11
            .as_ref()
            .map(|env| env.display.clone())
            .ok_or_else(|| BackendError::new("no X11 display"))?;
        let inputs = fake_inputs(request)?;

        tokio::task::spawn_blocking(move || replay(&display, &inputs))
            .await
            .map_err(|e| BackendError::new(format!("xtest task failed: {e}")))??;
        Ok(BackendSuccess::default())
    }
}
