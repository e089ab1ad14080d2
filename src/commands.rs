//! CLI commands
//!
//! `switch` performs one rotation step; `list-sinks` shows what the audio
//! server knows and how the configured rotation list resolves against it.

use color_eyre::eyre::{Context, Result};
use crossterm::style::Stylize;
use serde::Serialize;
use tracing::{info, warn};

use crate::audio::{self, AudioClient};
use crate::config::Config;
use crate::notification::{get_sink_icon, send_notification};
use crate::style::SinkswStyle;
use crate::switcher::{self, SinkSnapshot, SwitchOutcome};

// ============================================================================
// Switch
// ============================================================================

/// Switch to the next sink in the rotation
///
/// # Errors
/// Returns an error if connecting to the audio server or any switch step fails.
pub fn switch(config: &Config) -> Result<()> {
    for name in config.duplicate_sinks() {
        warn!("Sink '{}' appears more than once in the rotation list", name);
    }

    let plane = audio::select_backend(&config.backend_options());
    let mut session = audio::open_session(plane.as_ref())?;

    let outcome = switcher::execute(session.client(), &config.switch_request())
        .wrap_err("Failed to switch sink")?;

    report(&outcome);

    if config.notify && !outcome.dry_run {
        let icon = get_sink_icon(&outcome.target);
        if let Err(e) = send_notification("Audio Output", &outcome.target, Some(icon)) {
            warn!("Notification failed: {}", e);
        }
    }

    Ok(())
}

fn report(outcome: &SwitchOutcome) {
    if outcome.dry_run {
        let from = outcome.previous.as_deref().unwrap_or("(none)");
        println!(
            "{} {} {} {}",
            "Would switch:".warning(),
            from.dim(),
            "→".dim(),
            outcome.target.as_str().bold()
        );
        return;
    }

    // Printed regardless of the log filter
    println!("{}", success_line(outcome));
    if outcome.moved_streams > 0 {
        info!("moved {} stream(s)", outcome.moved_streams);
    }
}

/// The line printed after every successful switch
#[must_use]
pub fn success_line(outcome: &SwitchOutcome) -> String {
    format!("switched to sink {:?}", outcome.target)
}

// ============================================================================
// List Sinks
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ListSinksJson {
    pub sinks: Vec<SinkJson>,
    pub current_default: Option<String>,
    pub rotation: Vec<RotationEntryJson>,
}

#[derive(Debug, Serialize)]
pub struct SinkJson {
    pub handle: String,
    pub name: String,
    pub is_default: bool,
    pub in_rotation: bool,
}

#[derive(Debug, Serialize)]
pub struct RotationEntryJson {
    pub position: usize,
    pub name: String,
    pub status: &'static str,
}

/// Build the `list-sinks` document from a snapshot
#[must_use]
pub fn describe_sinks(
    snapshot: &SinkSnapshot,
    current_default: Option<&str>,
    rotation: &[String],
) -> ListSinksJson {
    let rotation_entries: Vec<&str> = if rotation.is_empty() {
        snapshot.names().collect()
    } else {
        rotation.iter().map(String::as_str).collect()
    };

    ListSinksJson {
        sinks: snapshot
            .names()
            .map(|name| SinkJson {
                handle: snapshot
                    .handle(name)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                name: name.to_string(),
                is_default: current_default == Some(name),
                in_rotation: rotation_entries.contains(&name),
            })
            .collect(),
        current_default: current_default.map(String::from),
        rotation: rotation_entries
            .iter()
            .enumerate()
            .map(|(i, name)| RotationEntryJson {
                position: i + 1,
                name: (*name).to_string(),
                status: if snapshot.handle(name).is_some() {
                    "active"
                } else {
                    "not_found"
                },
            })
            .collect(),
    }
}

/// List sinks and the resolved rotation
///
/// # Errors
/// Returns an error if the audio server can't be queried or JSON serialization fails.
pub fn list_sinks(config: &Config, json_output: bool) -> Result<()> {
    let plane = audio::select_backend(&config.backend_options());
    let mut session = audio::open_session(plane.as_ref())?;
    let client = session.client();

    let snapshot = SinkSnapshot::capture(client).wrap_err("Failed to list sinks")?;
    let current_default = client
        .current_default_sink()
        .wrap_err("Failed to query default sink")?
        .and_then(|h| snapshot.name(&h).map(String::from));

    let listing = describe_sinks(&snapshot, current_default.as_deref(), &config.sinks);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{}", "SINKS:".header());
    println!("{}", "-".repeat(6));
    if listing.sinks.is_empty() {
        println!("  {}", "(none)".dim());
    } else {
        for sink in &listing.sinks {
            let marker = if sink.is_default { "* " } else { "  " };
            println!(
                "{}{} {}",
                marker,
                sink.name.as_str().bold(),
                format!("[{}]", sink.handle).technical()
            );
        }
        println!("\n  {} = current default", "*".dim());
    }

    println!("\n{}", "ROTATION:".header());
    println!("{}", "-".repeat(9));
    if config.sinks.is_empty() {
        println!("  {}", "(all sinks, in the order above)".dim());
    }
    for entry in &listing.rotation {
        let status = match entry.status {
            "active" => entry.status.success().to_string(),
            _ => "not found".error().to_string(),
        };
        println!(
            "  {}. {} - {}",
            entry.position.to_string().dim(),
            entry.name.as_str().bold(),
            status
        );
    }

    let duplicates = config.duplicate_sinks();
    if !duplicates.is_empty() {
        println!(
            "\n{} {}",
            "Listed more than once:".warning(),
            duplicates.join(", ")
        );
    }

    if let Ok(path) = Config::get_config_path() {
        println!("\n{} {}", "Config:".dim(), path.display());
    }

    Ok(())
}
