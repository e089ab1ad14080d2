//! Error types for the switching core
//!
//! Every fatal condition the orchestrator can hit maps to one variant here.
//! Names that fail to resolve while scanning the rotation list are not errors;
//! they are logged and reported through `SwitchOutcome::unresolved`.

use thiserror::Error;

/// Result type for sink switching operations
pub type Result<T> = std::result::Result<T, SwitchError>;

/// Errors that can occur while switching sinks
#[derive(Error, Debug)]
pub enum SwitchError {
    /// Control plane unreachable or its control module failed to load
    #[error("connection to audio server failed: {0}")]
    Connection(String),

    /// Listing sinks or streams failed
    #[error("failed to enumerate {what}: {reason}")]
    Enumeration {
        /// What was being listed ("sinks", "streams")
        what: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// A property of a known object could not be queried
    #[error("failed to query {what}: {reason}")]
    Query {
        /// What was being queried
        what: String,
        /// Underlying failure
        reason: String,
    },

    /// The selected target does not resolve to a sink
    #[error("unknown sink named '{0}'")]
    UnknownSink(String),

    /// No sinks exist, so there is nothing to rotate through
    #[error("no sinks available to switch to")]
    NoSinks,

    /// Setting the default sink failed
    #[error("failed to set default sink '{sink}': {reason}")]
    SetDefault {
        /// Target sink name
        sink: String,
        /// Underlying failure
        reason: String,
    },

    /// Moving a playback stream failed
    #[error("failed to switch stream '{stream}' to target '{sink}': {reason}")]
    StreamMove {
        /// Stream handle
        stream: String,
        /// Target sink name
        sink: String,
        /// Underlying failure
        reason: String,
    },

    /// An external control tool could not run, timed out or returned garbage
    #[error("{tool}: {reason}")]
    Tool {
        /// Tool name (e.g. `pactl`)
        tool: String,
        /// Underlying failure
        reason: String,
    },
}

impl SwitchError {
    /// Shorthand for a [`SwitchError::Tool`] failure
    pub fn tool(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}
