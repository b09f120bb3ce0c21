//! Display server detection for Linux.
//!
//! Determines whether the current session is Wayland or X11-only by inspecting
//! the environment variables set by the session manager, and resolves the
//! X11 connection environment the xdotool and XTest pointer backends need.
//!
//! Note: `DISPLAY` being set alongside `WAYLAND_DISPLAY` means XWayland is
//! running as a compatibility layer. X11 tools then only reach XWayland
//! clients, which is why they sit behind the evdev and ydotool backends.

use std::env;
use std::path::{Path, PathBuf};

/// Socket of display `:0`; its presence lets us default `DISPLAY`.
const DEFAULT_X11_SOCKET: &str = "/tmp/.X11-unix/X0";

// ---------------------------------------------------------------------------
// Display server type
// ---------------------------------------------------------------------------

/// The active Linux display server protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayServer {
    /// Wayland session. `WAYLAND_DISPLAY` is set (with or without `DISPLAY`).
    Wayland,
    /// Pure X11 session. Only `DISPLAY` is set; no Wayland compositor present.
    X11,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Detects the active display server from environment variables.
///
/// Returns `None` when neither `WAYLAND_DISPLAY` nor `DISPLAY` is set,
/// which indicates the process is running outside of any graphical session.
pub fn detect_display_server() -> Option<DisplayServer> {
    classify_display(env_flag("WAYLAND_DISPLAY"), env_flag("DISPLAY"))
}

/// Returns `true` when a D-Bus session bus address is advertised.
pub fn has_session_bus() -> bool {
    env_flag("DBUS_SESSION_BUS_ADDRESS")
}

fn env_flag(name: &str) -> bool {
    env::var_os(name).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Classifies the display server from boolean presence flags.
///
/// Extracted from `detect_display_server` so the classification logic
/// can be unit-tested without mutating process environment variables.
fn classify_display(has_wayland: bool, has_display: bool) -> Option<DisplayServer> {
    match (has_wayland, has_display) {
        (true, _) => Some(DisplayServer::Wayland),
        (false, true) => Some(DisplayServer::X11),
        (false, false) => None,
    }
}

// ---------------------------------------------------------------------------
// X11 connection environment
// ---------------------------------------------------------------------------

/// Environment an X11 client needs to reach the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X11Env {
    pub display: String,
    pub xauthority: Option<PathBuf>,
}

impl X11Env {
    /// Variables to pass to an X11 child process.
    pub fn vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![("DISPLAY".to_owned(), self.display.clone())];
        if let Some(xauth) = &self.xauthority {
            vars.push(("XAUTHORITY".to_owned(), xauth.display().to_string()));
        }
        vars
    }
}

/// Resolves `DISPLAY` and `XAUTHORITY`, defaulting to `:0` and
/// `~/.Xauthority` when those exist on disk.
pub fn resolve_x11_env() -> Option<X11Env> {
    let home_xauthority = dirs::home_dir()
        .map(|home| home.join(".Xauthority"))
        .filter(|path| path.exists());
    resolve_x11(
        env::var("DISPLAY").ok(),
        env::var_os("XAUTHORITY").map(PathBuf::from),
        Path::new(DEFAULT_X11_SOCKET).exists(),
        home_xauthority,
    )
}

/// Pure resolution logic behind `resolve_x11_env`.
///
/// `home_xauthority` is only `Some` when the file exists.
fn resolve_x11(
    display: Option<String>,
    xauthority: Option<PathBuf>,
    default_socket_exists: bool,
    home_xauthority: Option<PathBuf>,
) -> Option<X11Env> {
    let display = match display.filter(|d| !d.is_empty()) {
        Some(display) => display,
        None if default_socket_exists => {
            log::info!("detect: DISPLAY not set, defaulting to :0");
            ":0".to_owned()
        }
        None => {
            log::debug!("detect: DISPLAY not set and no socket at {DEFAULT_X11_SOCKET}");
            return None;
        }
    };

    let xauthority = xauthority.or_else(|| {
        if let Some(path) = &home_xauthority {
            log::info!("detect: using default XAUTHORITY {}", path.display());
        }
        home_xauthority
    });

    Some(X11Env {
        display,
        xauthority,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wayland_only_detects_wayland() {
        assert_eq!(classify_display(true, false), Some(DisplayServer::Wayland));
    }

    #[test]
    fn wayland_and_display_still_detects_wayland() {
        assert_eq!(classify_display(true, true), Some(DisplayServer::Wayland));
    }

    #[test]
    fn display_only_detects_x11() {
        assert_eq!(classify_display(false, true), Some(DisplayServer::X11));
    }

    #[test]
    fn no_vars_returns_none() {
        assert_eq!(classify_display(false, false), None);
    }

    #[test]
    fn explicit_display_wins() {
        let env = resolve_x11(Some(":1".into()), None, true, None).unwrap();
        assert_eq!(env.display, ":1");
        assert_eq!(env.xauthority, None);
    }

    #[test]
    fn missing_display_defaults_when_socket_exists() {
        let env = resolve_x11(None, None, true, None).unwrap();
        assert_eq!(env.display, ":0");
    }

    #[test]
    fn empty_display_counts_as_missing() {
        assert_eq!(resolve_x11(Some(String::new()), None, false, None), None);
    }

    #[test]
    fn no_display_and_no_socket_is_none() {
        assert_eq!(resolve_x11(None, None, false, None), None);
    }

    #[test]
    fn explicit_xauthority_beats_home_default() {
        let env = resolve_x11(
            Some(":0".into()),
            Some(PathBuf::from("/run/user/1000/xauth")),
            false,
            Some(PathBuf::from("/home/u/.Xauthority")),
        )
        .unwrap();
        assert_eq!(env.xauthority, Some(PathBuf::from("/run/user/1000/xauth")));
    }

    #[test]
    fn home_xauthority_used_when_unset() {
        let env = resolve_x11(
            Some(":0".into()),
            None,
            false,
            Some(PathBuf::from("/home/u/.Xauthority")),
        )
        .unwrap();
        assert_eq!(
            env.vars(),
            vec![
                ("DISPLAY".to_owned(), ":0".to_owned()),
                ("XAUTHORITY".to_owned(), "/home/u/.Xauthority".to_owned()),
            ]
        );
    }
}
