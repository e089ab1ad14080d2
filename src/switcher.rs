//! Sink switching
//!
//! Sequences one switch against a connected [`AudioClient`]:
//! enumerate sinks, resolve the current default, pick the next sink, make it
//! the default and move playback streams over.
//!
//! Every step fails fast. Nothing is rolled back: if the third of five
//! stream moves fails, the first two stay on the new sink.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, info};

use crate::audio::{AudioClient, SinkHandle, StreamHandle};
use crate::error::{Result, SwitchError};
use crate::rotation;

// ============================================================================
// Snapshot
// ============================================================================

/// Sinks seen at the start of a switch
///
/// `by_name` and `by_handle` are inverse views of `sinks`. Sink names are
/// unique per server; should one repeat anyway the first occurrence wins.
#[derive(Debug, Default)]
pub struct SinkSnapshot {
    sinks: Vec<(SinkHandle, String)>,
    by_name: HashMap<String, SinkHandle>,
    by_handle: HashMap<SinkHandle, String>,
}

impl SinkSnapshot {
    /// Enumerate all sinks and their names
    ///
    /// # Errors
    /// Returns an error if listing sinks or querying a sink name fails.
    pub fn capture<C: AudioClient + ?Sized>(client: &mut C) -> Result<Self> {
        let handles = client.list_sinks()?;
        let mut sinks = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = client.sink_name(&handle).map_err(|e| match e {
                SwitchError::Query { .. } => e,
                other => SwitchError::Query {
                    what: format!("name of sink {handle}"),
                    reason: other.to_string(),
                },
            })?;
            sinks.push((handle, name));
        }
        Ok(Self::from_pairs(sinks))
    }

    /// Build from `(handle, name)` pairs in enumeration order
    #[must_use]
    pub fn from_pairs(sinks: Vec<(SinkHandle, String)>) -> Self {
        let mut by_name = HashMap::with_capacity(sinks.len());
        let mut by_handle = HashMap::with_capacity(sinks.len());
        for (handle, name) in &sinks {
            by_name
                .entry(name.clone())
                .or_insert_with(|| handle.clone());
            by_handle
                .entry(handle.clone())
                .or_insert_with(|| name.clone());
        }
        Self {
            sinks,
            by_name,
            by_handle,
        }
    }

    /// Sink names in enumeration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(|(_, n)| n.as_str())
    }

    /// Set of names that resolve to a sink
    #[must_use]
    pub fn known_names(&self) -> HashSet<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn handle(&self, name: &str) -> Option<&SinkHandle> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn name(&self, handle: &SinkHandle) -> Option<&str> {
        self.by_handle.get(handle).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

// ============================================================================
// Switch
// ============================================================================

/// What to switch between and how
#[derive(Debug, Clone, Default)]
pub struct SwitchRequest {
    /// Rotation order; empty means every sink in enumeration order
    pub sinks: Vec<String>,
    /// Only move the most recently created stream
    pub last_only: bool,
    /// Compute the target without changing anything
    pub dry_run: bool,
}

/// Result of a completed switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    /// Default sink before the switch, if there was one
    pub previous: Option<String>,
    /// Sink switched to
    pub target: String,
    /// Number of playback streams moved
    pub moved_streams: usize,
    /// Requested names that matched no sink
    pub unresolved: Vec<String>,
    /// Nothing was changed
    pub dry_run: bool,
}

/// Steps of a switch, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enumerating,
    ResolvingCurrent,
    Selecting,
    SettingDefault,
    MovingStreams,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enumerating => "enumerating sinks",
            Self::ResolvingCurrent => "resolving current default",
            Self::Selecting => "selecting target",
            Self::SettingDefault => "setting default",
            Self::MovingStreams => "moving streams",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(phase: Phase) {
    debug!("Switch phase: {}", phase);
}

/// Rotate the default sink and re-home playback streams
///
/// # Errors
/// Returns the first failure of any step; see [`SwitchError`].
pub fn execute<C: AudioClient + ?Sized>(
    client: &mut C,
    request: &SwitchRequest,
) -> Result<SwitchOutcome> {
    enter(Phase::Enumerating);
    let snapshot = SinkSnapshot::capture(client)?;
    debug!("Found {} sinks", snapshot.len());

    enter(Phase::ResolvingCurrent);
    let previous = resolve_current(client, &snapshot)?;
    debug!("Current default: {:?}", previous);

    enter(Phase::Selecting);
    let candidates: Vec<String> = if request.sinks.is_empty() {
        snapshot.names().map(String::from).collect()
    } else {
        request.sinks.clone()
    };
    if candidates.is_empty() {
        return Err(SwitchError::NoSinks);
    }

    let selection =
        rotation::select_next_sink(previous.as_deref(), &candidates, &snapshot.known_names())?;
    let target_handle = snapshot
        .handle(&selection.target)
        .cloned()
        .ok_or_else(|| SwitchError::UnknownSink(selection.target.clone()))?;

    if request.dry_run {
        info!(
            "Dry run: would switch from {:?} to {:?} ({})",
            previous, selection.target, target_handle
        );
        enter(Phase::Done);
        return Ok(SwitchOutcome {
            previous,
            target: selection.target,
            moved_streams: 0,
            unresolved: selection.unresolved,
            dry_run: true,
        });
    }

    enter(Phase::SettingDefault);
    client.set_default_sink(&target_handle).map_err(|e| match e {
        SwitchError::SetDefault { .. } => e,
        other => SwitchError::SetDefault {
            sink: selection.target.clone(),
            reason: other.to_string(),
        },
    })?;

    enter(Phase::MovingStreams);
    let streams = select_streams(client.list_streams()?, request.last_only);
    for stream in &streams {
        client
            .move_stream(stream, &target_handle)
            .map_err(|e| match e {
                SwitchError::StreamMove { .. } => e,
                other => SwitchError::StreamMove {
                    stream: stream.0.clone(),
                    sink: selection.target.clone(),
                    reason: other.to_string(),
                },
            })?;
    }
    debug!("Moved {} streams", streams.len());

    enter(Phase::Done);
    Ok(SwitchOutcome {
        previous,
        target: selection.target,
        moved_streams: streams.len(),
        unresolved: selection.unresolved,
        dry_run: false,
    })
}

/// Name of the current default sink, `None` if no default is configured
fn resolve_current<C: AudioClient + ?Sized>(
    client: &mut C,
    snapshot: &SinkSnapshot,
) -> Result<Option<String>> {
    let Some(handle) = client.current_default_sink()? else {
        return Ok(None);
    };

    if let Some(name) = snapshot.name(&handle) {
        return Ok(Some(name.to_string()));
    }

    // Default exists but wasn't in the listing; ask for its name directly
    client
        .sink_name(&handle)
        .map(Some)
        .map_err(|e| SwitchError::Query {
            what: "current sink name".to_string(),
            reason: e.to_string(),
        })
}

/// Streams to move: all of them, or only the newest
fn select_streams(mut streams: Vec<StreamHandle>, last_only: bool) -> Vec<StreamHandle> {
    if last_only {
        streams.split_off(streams.len().saturating_sub(1))
    } else {
        streams
    }
}
