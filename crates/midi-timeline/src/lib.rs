//! MIDI event extraction and tick-to-time resolution.
//!
//! Turns a Standard MIDI File into a flat, time-ordered list of note-on /
//! note-off events with second timestamps, ready for a key-injection player.
//!
//! # Example
//!
//! ```no_run
//! use midi_timeline::{analyze_file, AnalyzeOptions, KeyRangeConfig, Shift};
//!
//! let options = AnalyzeOptions {
//!     shift: Shift::new(2, -1),
//!     ..AnalyzeOptions::default()
//! };
//! let analysis = analyze_file("song.mid", &options, KeyRangeConfig::default())?;
//! for event in &analysis.events {
//!     println!("{:.3} {:?} {}", event.time, event.kind, event.note);
//! }
//! # Ok::<(), midi_timeline::Error>(())
//! ```

pub mod analyze;
pub mod event;
pub mod export;
pub mod groups;
pub mod note;
pub mod pairing;
pub mod source;
pub mod tempo;
pub mod transform;

pub use analyze::{
    analyze, analyze_bytes, analyze_file, list_tracks, Analysis, AnalyzeOptions, Summary,
    TrackInfo,
};
pub use event::{is_well_ordered, materialize, EventKind, PlacedNote, TimedEvent};
pub use export::{to_json, write_csv};
pub use groups::{filter_by_groups, group_for_note, group_label, note_name, Group};
pub use note::{HangingNotes, RawNoteSpan};
pub use pairing::pair_notes;
pub use source::{Division, MidiDocument, TrackEvent, TrackMessage};
pub use tempo::{TempoBreakpoint, TempoMap, TickClock, DEFAULT_TEMPO};
pub use transform::{
    transform_note, BlackKeyMode, KeyRangeConfig, RangeCheck, Shift, TransformedNote,
};

use std::path::PathBuf;

/// Errors from MIDI loading and analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read MIDI file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("Export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, Error>;
