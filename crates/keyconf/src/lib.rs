//! Configuration loading for keyroll.
//!
//! The analyzer never reads configuration itself; this crate resolves the
//! key range and analysis defaults once and hands plain values to it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use keyconf::KeyrollConfig;
//!
//! let config = KeyrollConfig::load().expect("Failed to load config");
//! let range = config.key_settings.range();
//! println!("Playable: {}..={} ({})", range.min_note, range.max_note, range.black_key_mode);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/keyroll/config.toml` (system)
//! 2. `~/.config/keyroll/config.toml` (user)
//! 3. `./keyroll.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`KEYROLL_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [key_settings]
//! min_note = 48
//! max_note = 83
//! black_key_mode = "auto_sharp"
//!
//! [analysis]
//! hanging_notes = "drop"
//! min_track_notes = 10
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{AnalysisSettings, KeySettings, TelemetrySettings};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete keyroll configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyrollConfig {
    #[serde(default)]
    pub key_settings: KeySettings,

    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl KeyrollConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/keyroll/config.toml`
    /// 3. `~/.config/keyroll/config.toml`
    /// 4. `./keyroll.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` in place of `./keyroll.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = KeyrollConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;
        config.validate()?;

        Ok((config, sources))
    }

    /// Reject settings the analyzer cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = &self.key_settings;
        if keys.min_note > keys.max_note {
            return Err(ConfigError::Invalid(format!(
                "min_note ({}) is above max_note ({})",
                keys.min_note, keys.max_note
            )));
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand to keep section order and comments stable
        let mut output = String::new();

        output.push_str("# keyroll configuration\n\n");

        output.push_str("[key_settings]\n");
        output.push_str(&format!("min_note = {}\n", self.key_settings.min_note));
        output.push_str(&format!("max_note = {}\n", self.key_settings.max_note));
        output.push_str(&format!(
            "black_key_mode = \"{}\"\n",
            self.key_settings.black_key_mode
        ));

        output.push_str("\n[analysis]\n");
        output.push_str(&format!(
            "hanging_notes = \"{}\"\n",
            self.analysis.hanging_notes
        ));
        output.push_str(&format!(
            "min_track_notes = {}\n",
            self.analysis.min_track_notes
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output
    }
}
