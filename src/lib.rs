//! `SINKSW` - Sink Switcher
//!
//! Rotates the default audio output among a list of sinks and moves playback
//! streams to the new default. Meant to be bound to a hotkey: each run is a
//! single switch.
//!
//! # Features
//! - Rotation order from the command line, the config file, or the server
//! - Moves all playback streams, or only the most recent one
//! - `PulseAudio` / `pipewire-pulse` via `pactl`, or native `PipeWire` tools
//! - Optional desktop notification and per-call timeouts

pub mod audio;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod notification;
pub mod rotation;
pub mod style;
pub mod switcher;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types for convenience
pub use cli::Args;
pub use config::Config;
pub use error::SwitchError;
pub use switcher::{SwitchOutcome, SwitchRequest};
