//! Built-in action handlers.
//!
//! | prefix     | parameter            | effect                              |
//! |------------|----------------------|-------------------------------------|
//! | `click`    | none                 | left click at the current position  |
//! | `click:`   | `x,y`                | pointer fallback click              |
//! | `drag:`    | `x1,y1:x2,y2`        | pointer fallback drag               |
//! | `move_to:` | `x,y` / `rel:dx,dy`  | absolute or relative move           |
//! | `scroll:`  | signed integer       | wheel scroll                        |
//! | `type:`    | text                 | type text                           |
//! | `press:`   | key or `mod+key`     | key press or combo                  |
//! | `capture`  | optional output path | screenshot via capture fallback     |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::registry::{ActionHandler, HandlerRegistry};
use crate::fallback::FallbackExecutor;
use crate::platform::{
    resolve_output, CaptureMode, CaptureRequest, DeviceClass, PlatformError, PointerRequest,
};
use crate::synth::{Keyboard, Mouse};

// ---------------------------------------------------------------------------
// Parameter parsing
// ---------------------------------------------------------------------------

fn invalid(message: String) -> PlatformError {
    PlatformError::InvalidAction(message)
}

/// Parses `x,y`.
fn parse_point(text: &str) -> Result<(i32, i32), PlatformError> {
    let parsed = text.split_once(',').and_then(|(x, y)| {
        Some((x.trim().parse::<i32>().ok()?, y.trim().parse::<i32>().ok()?))
    });
    parsed.ok_or_else(|| invalid(format!("Invalid coordinate format: {text}")))
}

/// Parses `x,y` and requires both coordinates to be on screen.
fn parse_screen_point(text: &str) -> Result<(i32, i32), PlatformError> {
    let (x, y) = parse_point(text)?;
    if x < 0 || y < 0 {
        return Err(invalid(format!(
            "Invalid coordinates: {x},{y} - must be positive"
        )));
    }
    Ok((x, y))
}

fn require<'a, T>(
    device: &'a Option<Arc<T>>,
    class: DeviceClass,
) -> Result<&'a T, PlatformError> {
    device
        .as_deref()
        .ok_or_else(|| PlatformError::Unavailable(format!("{class} not available")))
}

// ---------------------------------------------------------------------------
// Pointer
// ---------------------------------------------------------------------------

/// `click`: click wherever the pointer is.
pub struct ClickHere {
    pub mouse: Option<Arc<Mouse>>,
}

#[async_trait]
impl ActionHandler for ClickHere {
    async fn handle(&self, _: &str) -> Result<String, PlatformError> {
        require(&self.mouse, DeviceClass::Mouse)?.click().await?;
        Ok("Clicked at current position".to_owned())
    }
}

/// `click:x,y`
pub struct ClickAt {
    pub pointer: Arc<FallbackExecutor<PointerRequest>>,
}

#[async_trait]
impl ActionHandler for ClickAt {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let (x, y) = parse_screen_point(params)?;
        let outcome = self.pointer.run(&PointerRequest::Click { x, y }).await?;
        Ok(format!("Clicked at ({x}, {y}) via {}", outcome.backend))
    }
}

/// `drag:x1,y1:x2,y2`
pub struct DragTo {
    pub pointer: Arc<FallbackExecutor<PointerRequest>>,
}

#[async_trait]
impl ActionHandler for DragTo {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let parts: Vec<&str> = params.split(':').collect();
        let [from, to] = parts.as_slice() else {
            return Err(invalid(format!(
                "Invalid drag format: {params} - expected x1,y1:x2,y2"
            )));
        };
        let from = parse_screen_point(from)?;
        let to = parse_screen_point(to)?;
        let outcome = self.pointer.run(&PointerRequest::Drag { from, to }).await?;
        Ok(format!(
            "Dragged from ({}, {}) to ({}, {}) via {}",
            from.0, from.1, to.0, to.1, outcome.backend
        ))
    }
}

/// `move_to:x,y` or `move_to:rel:dx,dy`
pub struct MoveTo {
    pub mouse: Option<Arc<Mouse>>,
}

#[async_trait]
impl ActionHandler for MoveTo {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let mouse = require(&self.mouse, DeviceClass::Mouse)?;
        match params.trim().strip_prefix("rel:") {
            Some(delta) => {
                let (dx, dy) = parse_point(delta)?;
                mouse.move_relative(dx, dy).await?;
                Ok(format!("Moved by ({dx}, {dy})"))
            }
            None => {
                let (x, y) = parse_screen_point(params)?;
                mouse.move_absolute(x, y).await?;
                Ok(format!("Moved to ({x}, {y})"))
            }
        }
    }
}

/// `scroll:n`, positive scrolls up.
pub struct Scroll {
    pub mouse: Option<Arc<Mouse>>,
}

#[async_trait]
impl ActionHandler for Scroll {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let amount: i32 = params
            .trim()
            .parse()
            .map_err(|_| invalid(format!("Invalid scroll amount: {params}")))?;
        require(&self.mouse, DeviceClass::Mouse)?.scroll(amount).await?;
        Ok(format!("Scrolled {amount}"))
    }
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// `type:text`
pub struct TypeText {
    pub keyboard: Option<Arc<Keyboard>>,
}

#[async_trait]
impl ActionHandler for TypeText {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let typed = require(&self.keyboard, DeviceClass::Keyboard)?
            .type_text(params)
            .await?;
        Ok(format!("Typed {typed} characters"))
    }
}

/// `press:key` or `press:ctrl+c`
pub struct Press {
    pub keyboard: Option<Arc<Keyboard>>,
}

#[async_trait]
impl ActionHandler for Press {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        require(&self.keyboard, DeviceClass::Keyboard)?.press(params).await?;
        Ok(format!("Pressed {}", params.trim()))
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// `capture` / `capture:path`. Relative paths resolve against the working
/// directory.
pub struct Capture {
    pub capture: Arc<FallbackExecutor<CaptureRequest>>,
    pub default_output: PathBuf,
    pub include_cursor: bool,
}

#[async_trait]
impl ActionHandler for Capture {
    async fn handle(&self, params: &str) -> Result<String, PlatformError> {
        let output = match params.trim() {
            "" => resolve_output(&self.default_output),
            path => resolve_output(Path::new(path)),
        };
        let request = CaptureRequest {
            output,
            mode: CaptureMode::Auto,
            geometry: None,
            include_cursor: self.include_cursor,
        };
        let outcome = self.capture.run(&request).await?;
        Ok(format!(
            "Screenshot saved to {} via {}",
            request.output.display(),
            outcome.backend
        ))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Everything the built-in handlers act on.
pub struct Controllers {
    pub mouse: Option<Arc<Mouse>>,
    pub keyboard: Option<Arc<Keyboard>>,
    pub pointer: Arc<FallbackExecutor<PointerRequest>>,
    pub capture: Arc<FallbackExecutor<CaptureRequest>>,
    pub capture_output: PathBuf,
    pub include_cursor: bool,
}

/// Registry with every built-in handler.
pub fn builtin_registry(c: Controllers) -> HandlerRegistry {
    let capture: Arc<dyn ActionHandler> = Arc::new(Capture {
        capture: c.capture,
        default_output: c.capture_output,
        include_cursor: c.include_cursor,
    });

    let click_here = ClickHere {
        mouse: c.mouse.clone(),
    };
    let click_at = ClickAt {
        pointer: c.pointer.clone(),
    };
    let move_to = MoveTo {
        mouse: c.mouse.clone(),
    };
    let type_text = TypeText {
        keyboard: c.keyboard.clone(),
    };

    let mut registry = HandlerRegistry::new();
    registry.register("click", Arc::new(click_here));
    registry.register("click:", Arc::new(click_at));
    registry.register("drag:", Arc::new(DragTo { pointer: c.pointer }));
    registry.register("move_to:", Arc::new(move_to));
    registry.register("scroll:", Arc::new(Scroll { mouse: c.mouse }));
    registry.register("type:", Arc::new(type_text));
    registry.register("press:", Arc::new(Press { keyboard: c.keyboard }));
    registry.register("capture", capture.clone());
    registry.register("capture:", capture);
    registry
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
