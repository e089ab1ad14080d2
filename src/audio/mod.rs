//! Audio server control plane
//!
//! The switching core only talks to the audio server through [`AudioClient`].
//! Two backends implement it:
//! - [`pulse`]: `PulseAudio` (or `pipewire-pulse`) via `pactl`
//! - [`pipewire`]: native `PipeWire` via `pw-dump` / `pw-metadata`
//!
//! A connected client is wrapped in a [`Session`], which closes it exactly
//! once when dropped, whatever path the caller leaves by.

pub mod exec;
pub mod pipewire;
pub mod pulse;

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SwitchError};

// ============================================================================
// Handles
// ============================================================================

/// Opaque identifier of a sink, stable for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkHandle(pub String);

/// Opaque identifier of a playback stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(pub String);

impl fmt::Display for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Client Contract
// ============================================================================

/// Operations the switching core needs from a connected audio server
///
/// Calls are blocking request/response. Methods take `&mut self` so
/// implementations can cache what they learn between calls.
pub trait AudioClient {
    /// All sinks, in the server's enumeration order
    ///
    /// # Errors
    /// Returns [`SwitchError::Enumeration`] if the listing fails.
    fn list_sinks(&mut self) -> Result<Vec<SinkHandle>>;

    /// Human-readable (unique) name of a sink
    ///
    /// # Errors
    /// Returns [`SwitchError::Query`] if the sink can't be queried.
    fn sink_name(&mut self, sink: &SinkHandle) -> Result<String>;

    /// Current default (fallback) sink; `None` when none is configured
    ///
    /// # Errors
    /// Returns an error only if the query itself fails.
    fn current_default_sink(&mut self) -> Result<Option<SinkHandle>>;

    /// Make `sink` the default for new streams
    ///
    /// # Errors
    /// Returns [`SwitchError::SetDefault`] on failure.
    fn set_default_sink(&mut self, sink: &SinkHandle) -> Result<()>;

    /// Active playback streams, oldest first
    ///
    /// # Errors
    /// Returns [`SwitchError::Enumeration`] if the listing fails.
    fn list_streams(&mut self) -> Result<Vec<StreamHandle>>;

    /// Re-target one playback stream to `sink`
    ///
    /// # Errors
    /// Returns [`SwitchError::StreamMove`] on failure.
    fn move_stream(&mut self, stream: &StreamHandle, sink: &SinkHandle) -> Result<()>;

    /// Release the connection. Called once by [`Session`].
    fn close(&mut self) {}
}

impl<C: AudioClient + ?Sized> AudioClient for Box<C> {
    fn list_sinks(&mut self) -> Result<Vec<SinkHandle>> {
        (**self).list_sinks()
    }

    fn sink_name(&mut self, sink: &SinkHandle) -> Result<String> {
        (**self).sink_name(sink)
    }

    fn current_default_sink(&mut self) -> Result<Option<SinkHandle>> {
        (**self).current_default_sink()
    }

    fn set_default_sink(&mut self, sink: &SinkHandle) -> Result<()> {
        (**self).set_default_sink(sink)
    }

    fn list_streams(&mut self) -> Result<Vec<StreamHandle>> {
        (**self).list_streams()
    }

    fn move_stream(&mut self, stream: &StreamHandle, sink: &SinkHandle) -> Result<()> {
        (**self).move_stream(stream, sink)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Entry point to an audio server: module management and connection
pub trait ControlPlane {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Whether the server-side control module is available
    ///
    /// # Errors
    /// Returns an error if the check itself can't be performed.
    fn is_control_module_loaded(&self) -> Result<bool>;

    /// Load the server-side control module
    ///
    /// # Errors
    /// Returns [`SwitchError::Connection`] if loading fails.
    fn load_control_module(&self) -> Result<()>;

    /// Connect to the server
    ///
    /// # Errors
    /// Returns [`SwitchError::Connection`] if the server is unreachable.
    fn connect(&self) -> Result<Box<dyn AudioClient>>;
}

// ============================================================================
// Session
// ============================================================================

/// A connected client that is closed when dropped
pub struct Session<C: AudioClient> {
    client: C,
}

impl<C: AudioClient> Session<C> {
    /// Take ownership of a connected client
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Access the connected client
    pub fn client(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: AudioClient> Drop for Session<C> {
    fn drop(&mut self) {
        debug!("Closing audio server connection");
        self.client.close();
    }
}

/// Make sure the control module is loaded, then connect
///
/// # Errors
/// Returns [`SwitchError::Connection`] if the module check, module load or
/// connection fails.
pub fn open_session(plane: &dyn ControlPlane) -> Result<Session<Box<dyn AudioClient>>> {
    let loaded = plane.is_control_module_loaded().map_err(|e| {
        SwitchError::Connection(format!("failed to check if control module is loaded: {e}"))
    })?;

    if !loaded {
        info!("Loading {} control module", plane.name());
        plane.load_control_module().map_err(|e| match e {
            SwitchError::Connection(_) => e,
            other => SwitchError::Connection(format!("failed to load control module: {other}")),
        })?;
    }

    let client = plane.connect().map_err(|e| match e {
        SwitchError::Connection(_) => e,
        other => SwitchError::Connection(other.to_string()),
    })?;
    debug!("Connected via {}", plane.name());

    Ok(Session::new(client))
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Which audio server interface to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `pactl` if it can reach a server, otherwise native `PipeWire` tools
    #[default]
    Auto,
    /// `PulseAudio` or `pipewire-pulse` via `pactl`
    Pulse,
    /// Native `PipeWire` via `pw-dump` and `pw-metadata`
    #[value(name = "pipewire")]
    PipeWire,
}

/// Backend options resolved from config and CLI
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub kind: BackendKind,
    /// Per-call timeout for control tools (`None` waits forever)
    pub timeout: Option<Duration>,
    /// Module to check for and load before using `pactl`; `None` only
    /// requires a reachable server
    pub pulse_control_module: Option<String>,
}

/// Build the control plane for the configured backend
#[must_use]
pub fn select_backend(options: &BackendOptions) -> Box<dyn ControlPlane> {
    let pulse = || {
        Box::new(pulse::PulseControl::new(
            options.pulse_control_module.clone(),
            options.timeout,
        )) as Box<dyn ControlPlane>
    };
    let native = || Box::new(pipewire::PipeWireControl::new(options.timeout)) as Box<dyn ControlPlane>;

    match options.kind {
        BackendKind::Pulse => pulse(),
        BackendKind::PipeWire => native(),
        BackendKind::Auto => {
            if pulse::PulseControl::server_reachable(options.timeout) {
                debug!("Auto backend: pactl reached a server");
                pulse()
            } else {
                debug!("Auto backend: pactl unavailable, using PipeWire tools");
                native()
            }
        }
    }
}
