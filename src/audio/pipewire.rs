//! `PipeWire` integration
//!
//! Native `PipeWire` control without the pulse compatibility layer:
//! - `pw-dump`: JSON snapshot of sinks, playback streams and default metadata
//! - `pw-metadata`: setting the default sink and re-targeting streams
//!
//! Handles are node ids. Both tools must be present in `PATH`.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, trace};

use super::exec;
use super::{AudioClient, ControlPlane, SinkHandle, StreamHandle};
use crate::error::{Result, SwitchError};

const PW_DUMP: &str = "pw-dump";
const PW_METADATA: &str = "pw-metadata";

const NODE_TYPE: &str = "PipeWire:Interface:Node";
const METADATA_TYPE: &str = "PipeWire:Interface:Metadata";
const SINK_CLASS: &str = "Audio/Sink";
const PLAYBACK_STREAM_CLASS: &str = "Stream/Output/Audio";

// ============================================================================
// PipeWire JSON Structures (from pw-dump)
// ============================================================================

/// Top-level `PipeWire` object from `pw-dump` output
#[derive(Debug, Deserialize)]
pub struct PwObject {
    pub id: u32,
    #[serde(rename = "type")]
    pub obj_type: String,
    #[serde(default)]
    pub info: Option<PwInfo>,
    #[serde(default)]
    pub props: Option<PwProps>,
    #[serde(default)]
    pub metadata: Option<Vec<PwMetadataEntry>>,
}

impl PwObject {
    /// Props from either info.props or top-level props (metadata objects use top-level)
    #[must_use]
    pub fn get_props(&self) -> Option<&PwProps> {
        self.info
            .as_ref()
            .and_then(|i| i.props.as_ref())
            .or(self.props.as_ref())
    }

    fn is_node_of_class(&self, class: &str) -> bool {
        self.obj_type == NODE_TYPE
            && self
                .get_props()
                .is_some_and(|p| p.media_class.as_deref() == Some(class))
    }
}

#[derive(Debug, Deserialize)]
pub struct PwInfo {
    #[serde(default)]
    pub props: Option<PwProps>,
}

/// `PipeWire` object properties - uses permissive deserialization
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PwProps {
    #[serde(rename = "node.name")]
    pub node_name: Option<String>,
    #[serde(rename = "media.class")]
    pub media_class: Option<String>,
    #[serde(rename = "metadata.name")]
    pub metadata_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PwMetadataEntry {
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl PwMetadataEntry {
    /// Extract sink name from metadata value (object with "name" or plain string)
    #[must_use]
    pub fn get_name(&self) -> Option<String> {
        let value = self.value.as_ref()?;
        if let Some(obj) = value.as_object()
            && let Some(name_val) = obj.get("name")
        {
            return name_val.as_str().map(String::from);
        }
        value.as_str().map(String::from)
    }
}

/// Parse `pw-dump` output
///
/// # Errors
/// Returns [`SwitchError::Tool`] if the JSON is malformed.
pub fn parse_dump(json: &[u8]) -> Result<Vec<PwObject>> {
    let objects: Vec<PwObject> = serde_json::from_slice(json)
        .map_err(|e| SwitchError::tool(PW_DUMP, format!("failed to parse JSON: {e}")))?;
    trace!("pw-dump returned {} objects", objects.len());
    Ok(objects)
}

/// Sinks as `(handle, name)` pairs in dump order
#[must_use]
pub fn sinks_from_objects(objects: &[PwObject]) -> Vec<(SinkHandle, String)> {
    objects
        .iter()
        .filter(|obj| obj.is_node_of_class(SINK_CLASS))
        .filter_map(|obj| {
            let name = obj.get_props()?.node_name.clone()?;
            Some((SinkHandle(obj.id.to_string()), name))
        })
        .collect()
}

/// Playback streams, oldest (lowest id) first
#[must_use]
pub fn streams_from_objects(objects: &[PwObject]) -> Vec<StreamHandle> {
    let mut ids: Vec<u32> = objects
        .iter()
        .filter(|obj| obj.is_node_of_class(PLAYBACK_STREAM_CLASS))
        .map(|obj| obj.id)
        .collect();
    ids.sort_unstable();
    ids.into_iter()
        .map(|id| StreamHandle(id.to_string()))
        .collect()
}

/// Default sink name from the `default` metadata object
#[must_use]
pub fn default_sink_name_from_objects(objects: &[PwObject]) -> Option<String> {
    objects
        .iter()
        .filter(|obj| obj.obj_type == METADATA_TYPE)
        .filter(|obj| {
            obj.get_props()
                .is_some_and(|p| p.metadata_name.as_deref() == Some("default"))
        })
        .filter_map(|obj| obj.metadata.as_ref())
        .flatten()
        .find(|entry| entry.key == "default.audio.sink")
        .and_then(PwMetadataEntry::get_name)
}

// ============================================================================
// Control Plane
// ============================================================================

/// Native `PipeWire` control plane
pub struct PipeWireControl {
    timeout: Option<Duration>,
}

impl PipeWireControl {
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn missing_tools(&self) -> Vec<&'static str> {
        [PW_DUMP, PW_METADATA]
            .into_iter()
            .filter(|tool| exec::run(tool, &["--version"], self.timeout).is_err())
            .collect()
    }
}

impl ControlPlane for PipeWireControl {
    fn name(&self) -> &'static str {
        "pipewire"
    }

    fn is_control_module_loaded(&self) -> Result<bool> {
        Ok(self.missing_tools().is_empty())
    }

    fn load_control_module(&self) -> Result<()> {
        let missing = self.missing_tools();
        if missing.is_empty() {
            return Ok(());
        }
        Err(SwitchError::Connection(format!(
            "Missing required PipeWire tools: {}\n\
             \n\
             Please install the PipeWire utilities package for your distribution:\n\
             - Arch/Manjaro: pacman -S pipewire-tools\n\
             - Fedora: dnf install pipewire-utils\n\
             - Debian/Ubuntu: apt install pipewire-bin\n\
             - openSUSE: zypper install pipewire-tools",
            missing.join(", ")
        )))
    }

    fn connect(&self) -> Result<Box<dyn AudioClient>> {
        let mut client = PipeWireClient {
            timeout: self.timeout,
            objects: Vec::new(),
        };
        client
            .refresh()
            .map_err(|e| SwitchError::Connection(format!("failed to reach PipeWire: {e}")))?;
        Ok(Box::new(client))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Connected `PipeWire` client holding the latest `pw-dump` snapshot
pub struct PipeWireClient {
    timeout: Option<Duration>,
    objects: Vec<PwObject>,
}

impl PipeWireClient {
    fn refresh(&mut self) -> Result<()> {
        let json = exec::run(PW_DUMP, &[], self.timeout)?;
        self.objects = parse_dump(&json)?;
        Ok(())
    }

    fn name_of(&self, sink: &SinkHandle) -> Option<String> {
        sinks_from_objects(&self.objects)
            .into_iter()
            .find(|(h, _)| h == sink)
            .map(|(_, n)| n)
    }
}

impl AudioClient for PipeWireClient {
    fn list_sinks(&mut self) -> Result<Vec<SinkHandle>> {
        self.refresh().map_err(|e| SwitchError::Enumeration {
            what: "sinks",
            reason: e.to_string(),
        })?;
        Ok(sinks_from_objects(&self.objects)
            .into_iter()
            .map(|(h, _)| h)
            .collect())
    }

    fn sink_name(&mut self, sink: &SinkHandle) -> Result<String> {
        self.name_of(sink).ok_or_else(|| SwitchError::Query {
            what: format!("name of sink {sink}"),
            reason: "no such node in PipeWire snapshot".to_string(),
        })
    }

    fn current_default_sink(&mut self) -> Result<Option<SinkHandle>> {
        let Some(name) = default_sink_name_from_objects(&self.objects) else {
            return Ok(None);
        };
        let handle = sinks_from_objects(&self.objects)
            .into_iter()
            .find(|(_, n)| *n == name)
            .map(|(h, _)| h);
        if handle.is_none() {
            debug!("Default sink '{}' has no node", name);
        }
        Ok(handle)
    }

    fn set_default_sink(&mut self, sink: &SinkHandle) -> Result<()> {
        let name = self.sink_name(sink)?;
        let value = serde_json::json!({ "name": name }).to_string();

        exec::run(
            PW_METADATA,
            &["0", "default.audio.sink", &value, "Spa:String:JSON"],
            self.timeout,
        )
        .map_err(|e| SwitchError::SetDefault {
            sink: name.clone(),
            reason: e.to_string(),
        })?;

        debug!("Set default sink: {}", name);
        Ok(())
    }

    fn list_streams(&mut self) -> Result<Vec<StreamHandle>> {
        self.refresh().map_err(|e| SwitchError::Enumeration {
            what: "streams",
            reason: e.to_string(),
        })?;
        Ok(streams_from_objects(&self.objects))
    }

    fn move_stream(&mut self, stream: &StreamHandle, sink: &SinkHandle) -> Result<()> {
        let name = self.sink_name(sink)?;

        exec::run(
            PW_METADATA,
            &[stream.0.as_str(), "target.object", name.as_str()],
            self.timeout,
        )
        .map_err(|e| SwitchError::StreamMove {
            stream: stream.0.clone(),
            sink: name.clone(),
            reason: e.to_string(),
        })?;

        debug!("Moved stream {} to {}", stream, name);
        Ok(())
    }
}
