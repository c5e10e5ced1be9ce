//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, KeyrollConfig};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. Unlike the
/// discovered locations it is returned even when missing, so a typo on the
/// command line surfaces as a read error instead of silent defaults.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/keyroll/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("keyroll/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(expand_path(&path.to_string_lossy()));
        return files;
    }

    // Local override (current directory)
    let local = PathBuf::from("keyroll.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and layer its values onto `config`.
pub fn apply_file(config: &mut KeyrollConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Layer values from a TOML string onto `config`. Keys that are absent keep
/// whatever an earlier layer set.
pub fn apply_toml(config: &mut KeyrollConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(keys) = table.get("key_settings").and_then(|v| v.as_table()) {
        if let Some(v) = keys.get("min_note") {
            config.key_settings.min_note = integer(v, "key_settings.min_note", path)?;
        }
        if let Some(v) = keys.get("max_note") {
            config.key_settings.max_note = integer(v, "key_settings.max_note", path)?;
        }
        if let Some(v) = keys.get("black_key_mode") {
            config.key_settings.black_key_mode = parsed(v, "key_settings.black_key_mode", path)?;
        }
    }

    if let Some(analysis) = table.get("analysis").and_then(|v| v.as_table()) {
        if let Some(v) = analysis.get("hanging_notes") {
            config.analysis.hanging_notes = parsed(v, "analysis.hanging_notes", path)?;
        }
        if let Some(v) = analysis.get("min_track_notes") {
            config.analysis.min_track_notes = integer(v, "analysis.min_track_notes", path)?;
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            config.telemetry.log_level = v.to_string();
        }
    }

    Ok(())
}

fn integer<T: TryFrom<i64>>(value: &toml::Value, key: &str, path: &Path) -> Result<T, ConfigError> {
    value
        .as_integer()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!("{key}: expected an integer in range, got {value}"),
        })
}

fn parsed<T: FromStr<Err = String>>(
    value: &toml::Value,
    key: &str,
    path: &Path,
) -> Result<T, ConfigError> {
    let raw = value.as_str().ok_or_else(|| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{key}: expected a string, got {value}"),
    })?;
    raw.parse().map_err(|e: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("{key}: {e}"),
    })
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut KeyrollConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_env_from(config, sources, |key| env::var(key).ok())
}

/// Same as [`apply_env_overrides`] with an injectable lookup, so tests do
/// not have to mutate the process environment.
pub fn apply_env_from(
    config: &mut KeyrollConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("KEYROLL_MIN_NOTE") {
        config.key_settings.min_note = env_value("KEYROLL_MIN_NOTE", &v)?;
        sources.env_overrides.push("KEYROLL_MIN_NOTE".to_string());
    }
    if let Some(v) = lookup("KEYROLL_MAX_NOTE") {
        config.key_settings.max_note = env_value("KEYROLL_MAX_NOTE", &v)?;
        sources.env_overrides.push("KEYROLL_MAX_NOTE".to_string());
    }
    if let Some(v) = lookup("KEYROLL_BLACK_KEY_MODE") {
        config.key_settings.black_key_mode = env_value("KEYROLL_BLACK_KEY_MODE", &v)?;
        sources.env_overrides.push("KEYROLL_BLACK_KEY_MODE".to_string());
    }

    if let Some(v) = lookup("KEYROLL_HANGING_NOTES") {
        config.analysis.hanging_notes = env_value("KEYROLL_HANGING_NOTES", &v)?;
        sources.env_overrides.push("KEYROLL_HANGING_NOTES".to_string());
    }
    if let Some(v) = lookup("KEYROLL_MIN_TRACK_NOTES") {
        config.analysis.min_track_notes = env_value("KEYROLL_MIN_TRACK_NOTES", &v)?;
        sources.env_overrides.push("KEYROLL_MIN_TRACK_NOTES".to_string());
    }

    if let Some(v) = lookup("KEYROLL_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("KEYROLL_LOG_LEVEL".to_string());
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

fn env_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid(format!("{key}={raw}: {e}")))
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        let (var_name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
        if let Ok(var_value) = env::var(var_name) {
            return PathBuf::from(var_value).join(rest);
        }
    }

    PathBuf::from(path)
}
