//! Config sections.

use midi_timeline::{BlackKeyMode, HangingNotes, KeyRangeConfig};
use serde::{Deserialize, Serialize};

/// Playable key range, as stored under `[key_settings]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySettings {
    /// Lowest playable MIDI note.
    /// Default: 48 (c)
    #[serde(default = "KeySettings::default_min_note")]
    pub min_note: i32,

    /// Highest playable MIDI note.
    /// Default: 83 (b²)
    #[serde(default = "KeySettings::default_max_note")]
    pub max_note: i32,

    /// Default: auto_sharp
    #[serde(default)]
    pub black_key_mode: BlackKeyMode,
}

impl KeySettings {
    fn default_min_note() -> i32 {
        KeyRangeConfig::DEFAULT_MIN_NOTE
    }

    fn default_max_note() -> i32 {
        KeyRangeConfig::DEFAULT_MAX_NOTE
    }

    /// The range handed to the analyzer.
    pub fn range(&self) -> KeyRangeConfig {
        KeyRangeConfig {
            min_note: self.min_note,
            max_note: self.max_note,
            black_key_mode: self.black_key_mode,
        }
    }
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            min_note: Self::default_min_note(),
            max_note: Self::default_max_note(),
            black_key_mode: BlackKeyMode::default(),
        }
    }
}

/// Analysis defaults under `[analysis]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Default: drop
    #[serde(default)]
    pub hanging_notes: HangingNotes,

    /// Tracks with fewer sounding notes are hidden from track listings.
    /// Default: 10
    #[serde(default = "AnalysisSettings::default_min_track_notes")]
    pub min_track_notes: usize,
}

impl AnalysisSettings {
    fn default_min_track_notes() -> usize {
        10
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            hanging_notes: HangingNotes::default(),
            min_track_notes: Self::default_min_track_notes(),
        }
    }
}

/// Logging under `[telemetry]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// EnvFilter directive.
    /// Default: info
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
