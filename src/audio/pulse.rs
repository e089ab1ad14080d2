//! `PulseAudio` integration
//!
//! Talks to `PulseAudio` (or `PipeWire` through `pipewire-pulse`) with `pactl`:
//! - `pactl -f json list sinks`: sink indices and names
//! - `pactl -f json info`: current default sink name
//! - `pactl -f json list sink-inputs`: playback streams
//! - `pactl set-default-sink` / `pactl move-sink-input`: mutations
//!
//! Handles are the server's numeric object indices.
//!
//! `pipewire-pulse` neither lists nor loads the classic protocol modules, so a
//! server answering `pactl info` counts as ready. Module checks only happen
//! when a control module is configured explicitly.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::exec;
use super::{AudioClient, ControlPlane, SinkHandle, StreamHandle};
use crate::error::{Result, SwitchError};

const PACTL: &str = "pactl";

// ============================================================================
// pactl JSON Structures
// ============================================================================

/// One entry of `pactl -f json list sinks`
#[derive(Debug, Deserialize)]
pub struct PactlSink {
    pub index: u32,
    pub name: String,
}

/// Relevant part of `pactl -f json info`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PactlInfo {
    pub default_sink_name: Option<String>,
}

/// One entry of `pactl -f json list sink-inputs`
#[derive(Debug, Deserialize)]
pub struct PactlSinkInput {
    pub index: u32,
}

/// Parse `pactl -f json list sinks` into `(handle, name)` pairs in server order
///
/// # Errors
/// Returns [`SwitchError::Tool`] if the JSON is malformed.
pub fn parse_sinks(json: &[u8]) -> Result<Vec<(SinkHandle, String)>> {
    let sinks: Vec<PactlSink> = serde_json::from_slice(json)
        .map_err(|e| SwitchError::tool(PACTL, format!("failed to parse sink list: {e}")))?;
    Ok(sinks
        .into_iter()
        .map(|s| (SinkHandle(s.index.to_string()), s.name))
        .collect())
}

/// Parse `pactl -f json info` into the default sink name, if any
///
/// # Errors
/// Returns [`SwitchError::Tool`] if the JSON is malformed.
pub fn parse_default_sink_name(json: &[u8]) -> Result<Option<String>> {
    let info: PactlInfo = serde_json::from_slice(json)
        .map_err(|e| SwitchError::tool(PACTL, format!("failed to parse server info: {e}")))?;
    Ok(info.default_sink_name.filter(|n| !n.is_empty()))
}

/// Parse `pactl -f json list sink-inputs` into stream handles in server order
///
/// # Errors
/// Returns [`SwitchError::Tool`] if the JSON is malformed.
pub fn parse_streams(json: &[u8]) -> Result<Vec<StreamHandle>> {
    let inputs: Vec<PactlSinkInput> = serde_json::from_slice(json)
        .map_err(|e| SwitchError::tool(PACTL, format!("failed to parse sink inputs: {e}")))?;
    Ok(inputs
        .into_iter()
        .map(|i| StreamHandle(i.index.to_string()))
        .collect())
}

/// Check `pactl list short modules` output for a loaded module
#[must_use]
pub fn module_listed(short_modules: &str, module: &str) -> bool {
    short_modules
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .any(|name| name.trim() == module)
}

// ============================================================================
// Command
// ============================================================================

/// How to invoke `pactl`: program, leading arguments and per-call timeout
#[derive(Debug, Clone)]
pub struct PactlCommand {
    program: String,
    base_args: Vec<String>,
    timeout: Option<Duration>,
}

impl PactlCommand {
    /// `pactl` from `PATH`
    #[must_use]
    pub fn system(timeout: Option<Duration>) -> Self {
        Self::custom(PACTL, &[], timeout)
    }

    /// Any program speaking the `pactl` command line, e.g. a wrapper script
    #[must_use]
    pub fn custom(program: &str, base_args: &[&str], timeout: Option<Duration>) -> Self {
        Self {
            program: program.to_string(),
            base_args: base_args.iter().map(|a| (*a).to_string()).collect(),
            timeout,
        }
    }

    fn full_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        self.base_args
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect()
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        exec::run(&self.program, &self.full_args(args), self.timeout)
    }

    fn run_text(&self, args: &[&str]) -> Result<String> {
        exec::run_text(&self.program, &self.full_args(args), self.timeout)
    }
}

// ============================================================================
// Control Plane
// ============================================================================

/// `pactl`-based control plane
pub struct PulseControl {
    pactl: PactlCommand,
    control_module: Option<String>,
}

impl PulseControl {
    /// Control plane using the system `pactl`
    #[must_use]
    pub fn new(control_module: Option<String>, timeout: Option<Duration>) -> Self {
        Self::with_command(PactlCommand::system(timeout), control_module)
    }

    #[must_use]
    pub fn with_command(pactl: PactlCommand, control_module: Option<String>) -> Self {
        Self {
            pactl,
            control_module,
        }
    }

    /// Whether `pactl` is installed and a server answers
    #[must_use]
    pub fn server_reachable(timeout: Option<Duration>) -> bool {
        PactlCommand::system(timeout).run(&["info"]).is_ok()
    }
}

impl ControlPlane for PulseControl {
    fn name(&self) -> &'static str {
        "pulse"
    }

    fn is_control_module_loaded(&self) -> Result<bool> {
        let Some(module) = self.control_module.as_deref() else {
            // Answering at all means the native protocol is up
            self.pactl.run(&["info"])?;
            return Ok(true);
        };
        let modules = self.pactl.run_text(&["list", "short", "modules"])?;
        Ok(module_listed(&modules, module))
    }

    fn load_control_module(&self) -> Result<()> {
        let Some(module) = self.control_module.as_deref() else {
            return Ok(());
        };
        self.pactl
            .run(&["load-module", module])
            .map_err(|e| SwitchError::Connection(format!("failed to load module '{module}': {e}")))
            .map(|_| ())
    }

    fn connect(&self) -> Result<Box<dyn AudioClient>> {
        self.pactl
            .run(&["info"])
            .map_err(|e| SwitchError::Connection(format!("failed to connect to pulse: {e}")))?;
        Ok(Box::new(PulseClient {
            pactl: self.pactl.clone(),
            sinks: Vec::new(),
        }))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Connected `pactl` client
///
/// `pactl` is stateless, so "connected" means the server answered once. The
/// last sink listing is cached to answer name lookups without re-querying.
pub struct PulseClient {
    pactl: PactlCommand,
    sinks: Vec<(SinkHandle, String)>,
}

impl PulseClient {
    fn refresh_sinks(&mut self) -> Result<()> {
        let json = self
            .pactl
            .run(&["-f", "json", "list", "sinks"])
            .map_err(|e| SwitchError::Enumeration {
                what: "sinks",
                reason: e.to_string(),
            })?;
        self.sinks = parse_sinks(&json)?;
        Ok(())
    }

    fn cached_name(&self, sink: &SinkHandle) -> Option<&str> {
        self.sinks
            .iter()
            .find(|(h, _)| h == sink)
            .map(|(_, n)| n.as_str())
    }
}

impl AudioClient for PulseClient {
    fn list_sinks(&mut self) -> Result<Vec<SinkHandle>> {
        self.refresh_sinks()?;
        Ok(self.sinks.iter().map(|(h, _)| h.clone()).collect())
    }

    fn sink_name(&mut self, sink: &SinkHandle) -> Result<String> {
        if self.cached_name(sink).is_none() {
            self.refresh_sinks()?;
        }
        self.cached_name(sink)
            .map(String::from)
            .ok_or_else(|| SwitchError::Query {
                what: format!("name of sink {sink}"),
                reason: "no such sink".to_string(),
            })
    }

    fn current_default_sink(&mut self) -> Result<Option<SinkHandle>> {
        let json = self.pactl.run(&["-f", "json", "info"])?;
        let Some(name) = parse_default_sink_name(&json)? else {
            return Ok(None);
        };

        if !self.sinks.iter().any(|(_, n)| *n == name) {
            self.refresh_sinks()?;
        }
        let handle = self
            .sinks
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(h, _)| h.clone());
        if handle.is_none() {
            debug!("Default sink '{}' is not an existing sink", name);
        }
        Ok(handle)
    }

    fn set_default_sink(&mut self, sink: &SinkHandle) -> Result<()> {
        self.pactl
            .run(&["set-default-sink", &sink.0])
            .map_err(|e| SwitchError::SetDefault {
                sink: self.cached_name(sink).unwrap_or(&sink.0).to_string(),
                reason: e.to_string(),
            })?;
        debug!("Set default sink: {}", sink);
        Ok(())
    }

    fn list_streams(&mut self) -> Result<Vec<StreamHandle>> {
        let json = self
            .pactl
            .run(&["-f", "json", "list", "sink-inputs"])
            .map_err(|e| SwitchError::Enumeration {
                what: "streams",
                reason: e.to_string(),
            })?;
        parse_streams(&json)
    }

    fn move_stream(&mut self, stream: &StreamHandle, sink: &SinkHandle) -> Result<()> {
        self.pactl
            .run(&["move-sink-input", &stream.0, &sink.0])
            .map_err(|e| SwitchError::StreamMove {
                stream: stream.0.clone(),
                sink: self.cached_name(sink).unwrap_or(&sink.0).to_string(),
                reason: e.to_string(),
            })?;
        debug!("Moved stream {} to sink {}", stream, sink);
        Ok(())
    }
}
