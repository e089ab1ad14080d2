//! Configuration management
//!
//! Loads the optional TOML configuration file and merges command-line
//! overrides on top. A missing file is not an error: every setting has a
//! default, and with no sinks configured the rotation covers all sinks.

use color_eyre::eyre::{self, Context, ContextCompat, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::audio::{BackendKind, BackendOptions};
use crate::cli::Args;
use crate::rotation::parse_sink_list;
use crate::switcher::SwitchRequest;

// ============================================================================
// Public Configuration Types
// ============================================================================

/// Effective configuration (file + CLI overrides)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Rotation order; empty means every sink in enumeration order
    pub sinks: Vec<String>,
    pub last_only: bool,
    pub backend: BackendKind,
    /// Per-call timeout for control tools in milliseconds (0 = none)
    pub timeout_ms: u64,
    pub log_level: String,
    /// Desktop notification after a switch
    pub notify: bool,
    pub pulse: PulseSettings,
    /// Only compute the target (CLI only)
    pub dry_run: bool,
}

/// `pactl` backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseSettings {
    /// Server module to check for and load before connecting. With `None`
    /// a reachable server is enough.
    pub control_module: Option<String>,
}

// ============================================================================
// Config File Deserialization (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    sinks: Vec<String>,
    #[serde(default)]
    last_only: bool,
    #[serde(default)]
    backend: BackendKind,
    #[serde(default)]
    timeout_ms: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    notify: bool,
    #[serde(default)]
    pulse: PulseSettingsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PulseSettingsFile {
    #[serde(default)]
    control_module: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sinks: Vec::new(),
            last_only: false,
            backend: BackendKind::Auto,
            timeout_ms: 0,
            log_level: default_log_level(),
            notify: false,
            pulse: PulseSettings::default(),
            dry_run: false,
        }
    }
}

// ============================================================================
// Config Implementation
// ============================================================================

impl Config {
    /// Load configuration from `path`, or from the default XDG path
    ///
    /// A missing file at the default path yields the defaults. A missing file
    /// at an explicitly given path is an error.
    ///
    /// # Errors
    /// Returns an error if the file can't be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = Self::get_config_path()?;
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    debug!("No config at {:?}, using defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    /// Returns an error if the file can't be read, parsed or validated.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {path:?}"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config: {path:?}"))
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    /// Returns an error on malformed TOML or invalid values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(contents).context("Failed to parse config")?;
        Self::from_config_file(config_file)
    }

    fn from_config_file(config_file: ConfigFile) -> Result<Self> {
        let config = Config {
            sinks: config_file
                .sinks
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            last_only: config_file.last_only,
            backend: config_file.backend,
            timeout_ms: config_file.timeout_ms,
            log_level: config_file.log_level,
            notify: config_file.notify,
            pulse: PulseSettings {
                control_module: config_file.pulse.control_module,
            },
            dry_run: false,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_log_level(&self.log_level)?;

        if self
            .pulse
            .control_module
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            eyre::bail!("pulse.control_module must not be empty");
        }

        Ok(())
    }

    /// Apply command-line overrides
    ///
    /// # Errors
    /// Returns an error if an override is invalid.
    pub fn apply_overrides(&mut self, args: &Args) -> Result<()> {
        if let Some(ref raw) = args.sinks {
            self.sinks = parse_sink_list(raw);
        }
        self.last_only |= args.last_only;
        if let Some(backend) = args.backend {
            self.backend = backend;
        }
        if let Some(timeout_ms) = args.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(ref level) = args.log_level {
            validate_log_level(level)?;
            self.log_level.clone_from(level);
        }
        if args.no_notify {
            self.notify = false;
        }
        self.dry_run = args.dry_run;
        Ok(())
    }

    /// Sink names listed more than once (kept in the rotation as given)
    #[must_use]
    pub fn duplicate_sinks(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.sinks.len());
        let mut duplicates = Vec::new();
        for name in &self.sinks {
            if !seen.insert(name.as_str()) && !duplicates.contains(&name.as_str()) {
                duplicates.push(name.as_str());
            }
        }
        duplicates
    }

    /// Per-call timeout, `None` when disabled
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Backend options for [`crate::audio::select_backend`]
    #[must_use]
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            kind: self.backend,
            timeout: self.timeout(),
            pulse_control_module: self.pulse.control_module.clone(),
        }
    }

    /// Switch request for [`crate::switcher::execute`]
    #[must_use]
    pub fn switch_request(&self) -> SwitchRequest {
        SwitchRequest {
            sinks: self.sinks.clone(),
            last_only: self.last_only,
            dry_run: self.dry_run,
        }
    }

    /// Get the XDG config path
    ///
    /// # Errors
    /// Returns an error if the config directory can't be determined.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("sinksw");
        Ok(config_dir.join("config.toml"))
    }
}

fn validate_log_level(level: &str) -> Result<()> {
    match level {
        "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
        level => eyre::bail!(
            "Invalid log_level '{level}'. Must be: error, warn, info, debug, or trace"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("sinksw").chain(argv.iter().copied()))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
sinks = ["Speakers", " Headphones ", ""]
last_only = true
backend = "pipewire"
timeout_ms = 750
log_level = "debug"
notify = true

[pulse]
control_module = "module-dbus-protocol"
"#,
        )
        .unwrap();

        assert_eq!(config.sinks, vec!["Speakers", "Headphones"]);
        assert!(config.last_only);
        assert_eq!(config.backend, BackendKind::PipeWire);
        assert_eq!(config.timeout(), Some(Duration::from_millis(750)));
        assert_eq!(config.log_level, "debug");
        assert!(config.notify);
        assert_eq!(
            config.pulse.control_module.as_deref(),
            Some("module-dbus-protocol")
        );
    }

    #[test_case("log_level = \"verbose\"" ; "bad log level")]
    #[test_case("backend = \"alsa\"" ; "unknown backend")]
    #[test_case("sinks = \"A,B\"" ; "sinks not a list")]
    #[test_case("colour = true" ; "unknown key")]
    #[test_case("[pulse]\ncontrol_module = \" \"" ; "blank control module")]
    fn test_invalid_config_rejected(toml: &str) {
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_cli_sinks_override_file() {
        let mut config = Config::from_toml("sinks = [\"A\", \"B\"]").unwrap();
        config
            .apply_overrides(&args(&["--sinks", "C, D,,"]))
            .unwrap();
        assert_eq!(config.sinks, vec!["C", "D"]);
    }

    #[test]
    fn test_cli_empty_sinks_requests_all() {
        let mut config = Config::from_toml("sinks = [\"A\", \"B\"]").unwrap();
        config.apply_overrides(&args(&["--sinks", ""])).unwrap();
        assert!(config.sinks.is_empty());
    }

    #[test]
    fn test_cli_flags_merge() {
        let mut config = Config::from_toml("last_only = true\nnotify = true").unwrap();
        config
            .apply_overrides(&args(&[
                "--backend",
                "pulse",
                "--timeout-ms",
                "0",
                "--no-notify",
                "--dry-run",
            ]))
            .unwrap();

        assert!(config.last_only);
        assert!(!config.notify);
        assert!(config.dry_run);
        assert_eq!(config.backend, BackendKind::Pulse);
        assert_eq!(config.timeout(), None);

        let request = config.switch_request();
        assert!(request.last_only);
        assert!(request.dry_run);
    }

    #[test]
    fn test_cli_bad_log_level_rejected() {
        let mut config = Config::default();
        assert!(
            config
                .apply_overrides(&args(&["--log-level", "loud"]))
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_sinks_reported_once() {
        let config = Config::from_toml("sinks = [\"A\", \"B\", \"A\", \"A\"]").unwrap();
        assert_eq!(config.duplicate_sinks(), vec!["A"]);
        // Duplicates stay in the rotation
        assert_eq!(config.sinks.len(), 4);
    }

    #[test]
    fn test_backend_options() {
        let config = Config::from_toml("timeout_ms = 200").unwrap();
        let options = config.backend_options();
        assert_eq!(options.kind, BackendKind::Auto);
        assert_eq!(options.timeout, Some(Duration::from_millis(200)));
        assert_eq!(options.pulse_control_module, None);
    }

    #[test]
    fn test_control_module_only_when_configured() {
        assert_eq!(Config::default().pulse.control_module, None);

        let config = Config::from_toml("[pulse]\ncontrol_module = \"module-x\"").unwrap();
        assert_eq!(
            config.backend_options().pulse_control_module.as_deref(),
            Some("module-x")
        );
    }

    #[test]
    fn test_config_path_under_config_dir() {
        // Only meaningful where a config directory can be determined
        if let Ok(path) = Config::get_config_path() {
            assert!(path.ends_with("sinksw/config.toml"));
        }
    }
}
