//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::audio::BackendKind;

/// SINKSW - Sink Switcher
///
/// Rotate the default audio sink and move playback streams to it.
#[derive(Parser, Debug)]
#[command(name = "sinksw")]
#[command(version)]
#[command(about = "Sink Switcher - Rotate the default audio sink and move playback streams to it")]
#[command(after_help = "\
BEHAVIOR:
  - Each run switches the default sink to the one after the current default
  - The order comes from --sinks (or 'sinks' in the config file); without a
    list every sink is used in the order the audio server reports them
  - After the last sink (or if the current default isn't listed) the first
    sink is selected again
  - Playback streams are moved to the new sink; --last-only moves only the
    most recently started stream

EXAMPLES:
  sinksw                                   Cycle through all sinks
  sinksw --sinks 'Speakers,Headphones'     Cycle between two sinks
  sinksw --last-only                       Move only the newest stream
  sinksw list-sinks                        Show sink names to use in --sinks

CONFIG:
  $XDG_CONFIG_HOME/sinksw/config.toml (optional, CLI flags take precedence)

BACKENDS:
  pulse     pactl (PulseAudio, or PipeWire through pipewire-pulse)
  pipewire  pw-dump and pw-metadata
  auto      pulse if pactl reaches a server, otherwise pipewire")]
pub struct Args {
    /// Comma-separated sink names in rotation order (empty = all sinks)
    #[arg(long, value_name = "NAMES", global = true)]
    pub sinks: Option<String>,

    /// Only move the most recently started playback stream
    #[arg(long)]
    pub last_only: bool,

    /// Audio server interface
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// Timeout for each audio server call in milliseconds (0 = none)
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Show the sink that would be selected without switching
    #[arg(long)]
    pub dry_run: bool,

    /// Don't send a desktop notification
    #[arg(long)]
    pub no_notify: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Use this config file instead of the default
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available sinks and how the rotation list resolves
    ListSinks {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
