//! deskpilot -- Linux desktop automation engine.
//!
//! Finds usable raw input devices, synthesizes keyboard and mouse input on
//! them, runs screenshot and pointer operations through ranked backend
//! fallback lists, and executes `;`-separated action chains.

pub mod chain;
pub mod config;
#[cfg(target_os = "linux")]
pub mod engine;
pub mod fallback;
pub mod platform;
pub mod synth;
