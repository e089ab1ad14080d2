//! In-memory audio server for unit tests

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::audio::{AudioClient, SinkHandle, StreamHandle};
use crate::error::{Result, SwitchError};

#[derive(Debug, Default)]
struct FakeState {
    sinks: Vec<(SinkHandle, String)>,
    /// Sinks that answer name queries but are missing from the listing
    unlisted: Vec<(SinkHandle, String)>,
    default: Option<SinkHandle>,
    /// Streams in creation order with the sink each is bound to
    streams: Vec<(StreamHandle, SinkHandle)>,
    fail_list_sinks: bool,
    fail_list_streams: bool,
    fail_set_default: bool,
    /// Position (0-based) of the move call that fails
    fail_move_at: Option<usize>,
    moves: usize,
}

/// Scriptable [`AudioClient`]; clones share the same server state
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeClient {
    state: Rc<RefCell<FakeState>>,
    closed: Rc<Cell<bool>>,
}

impl FakeClient {
    /// Server with the given sinks (handles `sink-0`, `sink-1`, ...) and no default
    pub fn with_sinks(names: &[&str]) -> Self {
        let client = Self::default();
        client.state.borrow_mut().sinks = names
            .iter()
            .enumerate()
            .map(|(i, n)| (SinkHandle(format!("sink-{i}")), (*n).to_string()))
            .collect();
        client
    }

    /// Set the current default by name
    ///
    /// # Panics
    /// Panics if no sink has that name.
    #[must_use]
    pub fn default_sink(self, name: &str) -> Self {
        let handle = self.handle_of(name).expect("default must be an existing sink");
        self.state.borrow_mut().default = Some(handle);
        self
    }

    /// Make the default a sink the listing doesn't include. With `resolvable`
    /// it still answers name queries as `name`; otherwise they fail.
    #[must_use]
    pub fn unlisted_default(self, name: &str, resolvable: bool) -> Self {
        let handle = SinkHandle("sink-unlisted".to_string());
        {
            let mut state = self.state.borrow_mut();
            if resolvable {
                state.unlisted.push((handle.clone(), name.to_string()));
            }
            state.default = Some(handle);
        }
        self
    }

    /// Add `count` playback streams bound to the sink named `on`
    ///
    /// # Panics
    /// Panics if no sink has that name.
    #[must_use]
    pub fn streams_on(self, on: &str, count: usize) -> Self {
        let sink = self.handle_of(on).expect("stream sink must exist");
        {
            let mut state = self.state.borrow_mut();
            let start = state.streams.len();
            for i in start..start + count {
                state
                    .streams
                    .push((StreamHandle(format!("stream-{i}")), sink.clone()));
            }
        }
        self
    }

    #[must_use]
    pub fn failing_list_sinks(self) -> Self {
        self.state.borrow_mut().fail_list_sinks = true;
        self
    }

    #[must_use]
    pub fn failing_list_streams(self) -> Self {
        self.state.borrow_mut().fail_list_streams = true;
        self
    }

    #[must_use]
    pub fn failing_set_default(self) -> Self {
        self.state.borrow_mut().fail_set_default = true;
        self
    }

    #[must_use]
    pub fn failing_move_at(self, position: usize) -> Self {
        self.state.borrow_mut().fail_move_at = Some(position);
        self
    }

    /// Name of the current default sink
    pub fn current_default_name(&self) -> Option<String> {
        let state = self.state.borrow();
        let handle = state.default.as_ref()?;
        state
            .sinks
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, n)| n.clone())
    }

    /// Handle of the current default sink
    pub fn default_handle(&self) -> Option<SinkHandle> {
        self.state.borrow().default.clone()
    }

    /// Name of the sink each stream is bound to, in creation order
    pub fn stream_sink_names(&self) -> Vec<String> {
        let state = self.state.borrow();
        state
            .streams
            .iter()
            .map(|(_, sink)| {
                state
                    .sinks
                    .iter()
                    .find(|(h, _)| h == sink)
                    .map(|(_, n)| n.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Flag set once `close()` has been called
    pub fn closed_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.closed)
    }

    fn handle_of(&self, name: &str) -> Option<SinkHandle> {
        self.state
            .borrow()
            .sinks
            .iter()
            .find(|(_, n)| n == name)
            .map(|(h, _)| h.clone())
    }
}

impl AudioClient for FakeClient {
    fn list_sinks(&mut self) -> Result<Vec<SinkHandle>> {
        let state = self.state.borrow();
        if state.fail_list_sinks {
            return Err(SwitchError::Enumeration {
                what: "sinks",
                reason: "server went away".to_string(),
            });
        }
        Ok(state.sinks.iter().map(|(h, _)| h.clone()).collect())
    }

    fn sink_name(&mut self, sink: &SinkHandle) -> Result<String> {
        let state = self.state.borrow();
        state
            .sinks
            .iter()
            .chain(&state.unlisted)
            .find(|(h, _)| h == sink)
            .map(|(_, n)| n.clone())
            .ok_or_else(|| SwitchError::Query {
                what: format!("name of sink {sink}"),
                reason: "no such sink".to_string(),
            })
    }

    fn current_default_sink(&mut self) -> Result<Option<SinkHandle>> {
        Ok(self.state.borrow().default.clone())
    }

    fn set_default_sink(&mut self, sink: &SinkHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_set_default {
            return Err(SwitchError::SetDefault {
                sink: sink.0.clone(),
                reason: "access denied".to_string(),
            });
        }
        state.default = Some(sink.clone());
        Ok(())
    }

    fn list_streams(&mut self) -> Result<Vec<StreamHandle>> {
        let state = self.state.borrow();
        if state.fail_list_streams {
            return Err(SwitchError::Enumeration {
                what: "streams",
                reason: "server went away".to_string(),
            });
        }
        Ok(state.streams.iter().map(|(h, _)| h.clone()).collect())
    }

    fn move_stream(&mut self, stream: &StreamHandle, sink: &SinkHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let position = state.moves;
        state.moves += 1;
        if state.fail_move_at == Some(position) {
            return Err(SwitchError::StreamMove {
                stream: stream.0.clone(),
                sink: sink.0.clone(),
                reason: "stream vanished".to_string(),
            });
        }
        if let Some(entry) = state.streams.iter_mut().find(|(h, _)| h == stream) {
            entry.1 = sink.clone();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}
