//! Pointer backends for clicks and drags at absolute coordinates.
//!
//! Default priority: the evdev synthesizer on the scanned mouse, `ydotool`,
//! `xdotool` and finally native XTest. The X11 backends need a resolvable
//! display (see `detect::resolve_x11_env`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::detect::X11Env;
use super::process::{CommandRunner, CommandSpec};
use super::x11::XTest;
use crate::fallback::{Backend, BackendError, BackendSuccess, FallbackExecutor};
use crate::platform::{PlatformError, PointerRequest};
use crate::synth::Mouse;

const TOOL_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// evdev
// ---------------------------------------------------------------------------

/// Drives the scanned mouse through the synthesizer.
pub struct EvdevPointer {
    mouse: Option<Arc<Mouse>>,
}

impl EvdevPointer {
    pub fn new(mouse: Option<Arc<Mouse>>) -> Self {
        Self { mouse }
    }
}

#[async_trait]
impl Backend<PointerRequest> for EvdevPointer {
    fn name(&self) -> &'static str {
        "evdev"
    }

    async fn available(&self, _: &PointerRequest) -> bool {
        self.mouse.is_some()
    }

    fn timeout(&self, _: &PointerRequest) -> Duration {
        Duration::from_secs(10)
    }

    async fn attempt(&self, request: &PointerRequest) -> Result<BackendSuccess, BackendError> {
        let mouse = self
            .mouse
            .as_ref()
            .ok_or_else(|| BackendError::new("no mouse device"))?;
        let result = match *request {
            PointerRequest::Click { x, y } => match mouse.move_absolute(x, y).await {
                Ok(()) => mouse.click().await,
                Err(e) => Err(e),
            },
            PointerRequest::Drag { from, to } => mouse.drag(from, to).await,
        };
        result.map_err(|e| BackendError::new(e.to_string()))?;
        Ok(BackendSuccess {
            detail: Some(mouse.device().display().to_string()),
            warnings: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// ydotool
// ---------------------------------------------------------------------------

/// `ydotool` button codes: 0x40 = left down, 0x80 = left up, 0xC0 = both.
const YDOTOOL_LEFT_DOWN: &str = "0x40";
const YDOTOOL_LEFT_UP: &str = "0x80";
const YDOTOOL_LEFT_CLICK: &str = "0xC0";

pub struct Ydotool {
    runner: Arc<dyn CommandRunner>,
}

impl Ydotool {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn move_to(x: i32, y: i32) -> CommandSpec {
        CommandSpec::new("ydotool", TOOL_TIMEOUT)
            .args(["mousemove", "--absolute", "-x"])
            .arg(x.to_string())
            .arg("-y")
            .arg(y.to_string())
    }

    fn click(code: &str) -> CommandSpec {
        CommandSpec::new("ydotool", TOOL_TIMEOUT).args(["click", code])
    }

    fn commands(request: &PointerRequest) -> Vec<CommandSpec> {
        match *request {
            PointerRequest::Click { x, y } => {
                vec![Self::move_to(x, y), Self::click(YDOTOOL_LEFT_CLICK)]
            }
            PointerRequest::Drag { from, to } => vec![
                Self::move_to(from.0, from.1),
                Self::click(YDOTOOL_LEFT_DOWN),
                Self::move_to(to.0, to.1),
                Self::click(YDOTOOL_LEFT_UP),
            ],
        }
    }
}

#[async_trait]
impl Backend<PointerRequest> for Ydotool {
    fn name(&self) -> &'static str {
        "ydotool"
    }

    async fn available(&self, _: &PointerRequest) -> bool {
        self.runner.has_binary("ydotool")
    }

    fn timeout(&self, _: &PointerRequest) -> Duration {
        TOOL_TIMEOUT
    }

    async fn attempt(&self, request: &PointerRequest) -> Result<BackendSuccess, BackendError> {
        for cmd in Self::commands(request) {
            self.runner.run(&cmd).await?;
        }
        Ok(BackendSuccess::default())
    }
}

// ---------------------------------------------------------------------------
// xdotool
// ---------------------------------------------------------------------------

pub struct Xdotool {
    runner: Arc<dyn CommandRunner>,
    x11: Option<X11Env>,
}

impl Xdotool {
    pub fn new(runner: Arc<dyn CommandRunner>, x11: Option<X11Env>) -> Self {
        Self { runner, x11 }
    }

    /// One `xdotool` invocation with its own `sleep` steps chained in.
    fn command(&self, env: &X11Env, request: &PointerRequest) -> CommandSpec {
        let args: Vec<String> = match *request {
            PointerRequest::Click { x, y } => vec![
                "mousemove".into(),
                x.to_string(),
                y.to_string(),
                "sleep".into(),
                "0.1".into(),
                "click".into(),
                "1".into(),
            ],
            PointerRequest::Drag { from, to } => vec![
                "mousemove".into(),
                from.0.to_string(),
                from.1.to_string(),
                "sleep".into(),
                "0.2".into(),
                "mousedown".into(),
                "1".into(),
                "sleep".into(),
                "0.2".into(),
                "mousemove".into(),
                to.0.to_string(),
                to.1.to_string(),
                "sleep".into(),
                "0.2".into(),
                "mouseup".into(),
                "1".into(),
            ],
        };
        env.vars()
            .into_iter()
            .fold(CommandSpec::new("xdotool", TOOL_TIMEOUT).args(args), |cmd, (k, v)| {
                cmd.env(k, v)
            })
    }
}

#[async_trait]
impl Backend<PointerRequest> for Xdotool {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    async fn available(&self, _: &PointerRequest) -> bool {
        self.x11.is_some() && self.runner.has_binary("xdotool")
    }

    fn timeout(&self, _: &PointerRequest) -> Duration {
        TOOL_TIMEOUT
    }

    async fn attempt(&self, request: &PointerRequest) -> Result<BackendSuccess, BackendError> {
        let env = self
            .x11
            .as_ref()
            .ok_or_else(|| BackendError::new("no X11 display"))?;
        self.runner.run(&self.command(env, request)).await?;
        Ok(BackendSuccess::default())
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds the pointer executor for `names`.
pub fn pointer_executor(
    names: &[String],
    runner: Arc<dyn CommandRunner>,
    mouse: Option<Arc<Mouse>>,
    x11: Option<X11Env>,
) -> Result<FallbackExecutor<PointerRequest>, PlatformError> {
    let backends = names
        .iter()
        .map(|name| {
            let backend: Box<dyn Backend<PointerRequest>> = match name.as_str() {
                "evdev" => Box::new(EvdevPointer::new(mouse.clone())),
                "ydotool" => Box::new(Ydotool::new(runner.clone())),
                "xdotool" => Box::new(Xdotool::new(runner.clone(), x11.clone())),
                "xtest" => Box::new(XTest::new(x11.clone())),
                other => {
                    return Err(PlatformError::Unavailable(format!(
                        "unknown pointer backend: {other}"
                    )))
                }
            };
            Ok(backend)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FallbackExecutor::new(backends))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::POINTER_BACKENDS;
    use crate::platform::linux::process::testing::{failed, FakeRunner};
    use crate::platform::{InputEvent, RelAxis};
    use crate::synth::testing::RecordingSink;
    use crate::synth::Timing;

    fn x11() -> X11Env {
        X11Env {
            display: ":0".into(),
            xauthority: Some(PathBuf::from("/home/u/.Xauthority")),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn ydotool_click_and_drag() {
        let runner = Arc::new(FakeRunner::new().installed(&["ydotool"]));
        let ydotool = Ydotool::new(runner.clone());
        ydotool
            .attempt(&PointerRequest::Click { x: 10, y: 20 })
            .await
            .unwrap();
        ydotool
            .attempt(&PointerRequest::Drag {
                from: (1, 2),
                to: (3, 4),
            })
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "ydotool mousemove --absolute -x 10 -y 20",
                "ydotool click 0xC0",
                "ydotool mousemove --absolute -x 1 -y 2",
                "ydotool click 0x40",
                "ydotool mousemove --absolute -x 3 -y 4",
                "ydotool click 0x80",
            ]
        );
    }

    #[tokio::test]
    async fn xdotool_click_carries_x11_env() {
        let runner = Arc::new(FakeRunner::new().installed(&["xdotool"]));
        Xdotool::new(runner.clone(), Some(x11()))
            .attempt(&PointerRequest::Click { x: 5, y: 6 })
            .await
            .unwrap();
        let call = &runner.calls()[0];
        assert_eq!(call.command_line(), "xdotool mousemove 5 6 sleep 0.1 click 1");
        assert!(call.env.contains(&("DISPLAY".into(), ":0".into())));
        assert!(call
            .env
            .contains(&("XAUTHORITY".into(), "/home/u/.Xauthority".into())));
    }

    #[tokio::test]
    async fn xdotool_drag_sequence() {
        let runner = Arc::new(FakeRunner::new().installed(&["xdotool"]));
        Xdotool::new(runner.clone(), Some(x11()))
            .attempt(&PointerRequest::Drag {
                from: (10, 10),
                to: (90, 40),
            })
            .await
            .unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "xdotool mousemove 10 10 sleep 0.2 mousedown 1 sleep 0.2 \
                 mousemove 90 40 sleep 0.2 mouseup 1"
            ]
        );
    }

    #[tokio::test]
    async fn xdotool_needs_display() {
        let runner = Arc::new(FakeRunner::new().installed(&["xdotool"]));
        let req = PointerRequest::Click { x: 0, y: 0 };
        assert!(!Xdotool::new(runner, None).available(&req).await);
    }

    #[tokio::test]
    async fn evdev_click_moves_then_clicks() {
        let sink = Arc::new(RecordingSink::new());
        let mouse = Arc::new(Mouse::new(sink.clone(), Timing::immediate()));
        EvdevPointer::new(Some(mouse))
            .attempt(&PointerRequest::Click { x: 100, y: 50 })
            .await
            .unwrap();
        let payload = sink.payload();
        assert_eq!(payload[0], InputEvent::rel(RelAxis::X, -50_000));
        assert_eq!(payload[2], InputEvent::rel(RelAxis::X, 100));
        assert_eq!(payload.len(), 6);
    }

    #[tokio::test]
    async fn falls_back_past_missing_mouse_and_failing_ydotool() {
        let runner = Arc::new(
            FakeRunner::new()
                .installed(&["ydotool", "xdotool"])
                .respond(|spec| match spec.program.as_str() {
                    "ydotool" => failed("ydotool"),
                    _ => Ok(Default::default()),
                }),
        );
        let exec = pointer_executor(&names(POINTER_BACKENDS), runner.clone(), None, Some(x11()))
            .unwrap();
        let outcome = exec.run(&PointerRequest::Click { x: 1, y: 1 }).await.unwrap();
        assert_eq!(outcome.backend, "xdotool");
    }

    #[tokio::test]
    async fn nothing_available_is_exhausted() {
        let runner = Arc::new(FakeRunner::new());
        let exec = pointer_executor(&names(POINTER_BACKENDS), runner, None, None).unwrap();
        let err = exec
            .run(&PointerRequest::Drag {
                from: (0, 0),
                to: (1, 1),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "all drag methods failed");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let runner = Arc::new(FakeRunner::new());
        assert!(pointer_executor(&names(&["robotjs"]), runner, None, None).is_err());
    }
}
