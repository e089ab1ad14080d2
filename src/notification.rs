//! Desktop notifications
//!
//! Handles sending notifications via notify-rust and icon detection
//! using `FreeDesktop` standard icon names.

use color_eyre::eyre::{Context, Result};
use notify_rust::Notification;

/// Send a desktop notification
///
/// # Errors
/// Returns an error if the notification cannot be sent (e.g., no notification daemon running).
pub fn send_notification(summary: &str, body: &str, icon: Option<&str>) -> Result<()> {
    let icon = icon.unwrap_or("audio-card");

    Notification::new()
        .summary(summary)
        .body(body)
        .appname("SINKSW")
        .icon(icon)
        .timeout(3000)
        .show()
        .context("Failed to show notification")?;

    Ok(())
}

/// Guess a `FreeDesktop` icon from a sink name
#[must_use]
pub fn get_sink_icon(sink_name: &str) -> &'static str {
    let name = sink_name.to_lowercase();

    if name.contains("hdmi") || name.contains("displayport") || name.contains("tv") {
        "video-display"
    } else if name.contains("bluez")
        || name.contains("bluetooth")
        || name.contains("headphone")
        || name.contains("headset")
    {
        "audio-headphones"
    } else {
        // Speakers, optical, digital, etc.
        "audio-speakers"
    }
}
