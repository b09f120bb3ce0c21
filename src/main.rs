//! deskpilot -- command-line front end.
//!
//! Every subcommand prints one JSON result on stdout and exits with status 1
//! when that result is a failure. Logs go to stderr (`RUST_LOG`, default
//! `info`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deskpilot", version, about = "Linux desktop automation engine")]
struct Cli {
    /// Config file (default: $DESKPILOT_CONFIG, then ~/.config/deskpilot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `;`-separated action chain, e.g. "click:10,10;type:hi;press:enter"
    Chain { chain: String },
    /// Take a screenshot
    Capture {
        /// Output file (default from config)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// auto, region or window
        #[arg(long, default_value = "auto")]
        mode: String,
        /// Region as "x,y WxH" (region mode)
        #[arg(long)]
        geometry: Option<String>,
        /// Leave the cursor out of the image
        #[arg(long)]
        no_cursor: bool,
    },
    /// List qualifying input devices, best first
    Devices {
        /// mouse or keyboard
        #[arg(long, default_value = "mouse")]
        class: String,
    },
    /// Click at screen coordinates
    #[command(allow_negative_numbers = true)]
    Click { x: i32, y: i32 },
    /// Drag between two screen points
    #[command(allow_negative_numbers = true)]
    Drag { x1: i32, y1: i32, x2: i32, y2: i32 },
    /// Move the pointer
    #[command(allow_negative_numbers = true)]
    Move {
        x: i32,
        y: i32,
        /// Treat x,y as a delta
        #[arg(long)]
        relative: bool,
    },
    /// Scroll the wheel; positive scrolls up
    #[command(allow_negative_numbers = true)]
    Scroll { amount: i32 },
    /// Type text
    Type { text: String },
    /// Press a key or combo, e.g. "enter" or "ctrl+c"
    Press { key: String },
}

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let success = linux::run(cli).await?;
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
    let _ = Cli::parse();
    anyhow::bail!("deskpilot only supports Linux")
}

#[cfg(target_os = "linux")]
mod linux {
    use anyhow::{Context, Result};
    use serde::Serialize;

    use deskpilot::config::Config;
    use deskpilot::engine::Engine;
    use deskpilot::platform::{is_valid_geometry, CaptureMode, CaptureRequest, DeviceClass};

    use super::{Cli, Command};

    /// Runs one subcommand; returns whether it succeeded.
    pub async fn run(cli: Cli) -> Result<bool> {
        let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
        let engine = Engine::new(config).await.context("starting engine")?;

        let (prefix, params) = match cli.command {
            Command::Chain { chain } => {
                let result = engine.run_chain(&chain).await;
                return print(&result, result.success);
            }
            Command::Capture {
                output,
                mode,
                geometry,
                no_cursor,
            } => {
                let mode: CaptureMode = mode.parse()?;
                if let Some(geometry) = &geometry {
                    anyhow::ensure!(
                        is_valid_geometry(geometry),
                        "invalid geometry '{geometry}', expected \"x,y WxH\""
                    );
                }
                let request = CaptureRequest {
                    output: output.unwrap_or_default(),
                    mode,
                    geometry,
                    include_cursor: engine.config().capture.include_cursor && !no_cursor,
                };
                let result = engine.capture(request).await;
                return print(&result, result.success);
            }
            Command::Devices { class } => {
                let class = match class.as_str() {
                    "mouse" => DeviceClass::Mouse,
                    "keyboard" => DeviceClass::Keyboard,
                    other => anyhow::bail!("unknown device class '{other}'"),
                };
                let devices = engine.devices(class).await?;
                return print(&devices, true);
            }
            Command::Click { x, y } => ("click:", format!("{x},{y}")),
            Command::Drag { x1, y1, x2, y2 } => ("drag:", format!("{x1},{y1}:{x2},{y2}")),
            Command::Move { x, y, relative } if relative => ("move_to:", format!("rel:{x},{y}")),
            Command::Move { x, y, .. } => ("move_to:", format!("{x},{y}")),
            Command::Scroll { amount } => ("scroll:", amount.to_string()),
            Command::Type { text } => ("type:", text),
            Command::Press { key } => ("press:", key),
        };

        let result = engine.run_action(prefix, &params).await;
        print(&result, result.success)
    }

    fn print<T: Serialize>(value: &T, success: bool) -> Result<bool> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(success)
    }
}
