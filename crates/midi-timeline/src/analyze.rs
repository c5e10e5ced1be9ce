use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

use crate::event::{materialize, PlacedNote, TimedEvent};
use crate::groups::{group_label, note_name};
use crate::note::HangingNotes;
use crate::pairing::pair_notes;
use crate::source::{Division, MidiDocument, TrackMessage};
use crate::tempo::{TempoMap, TickClock};
use crate::transform::{transform_note, BlackKeyMode, KeyRangeConfig, RangeCheck, Shift};

/// Per-call analysis inputs. An immutable snapshot: nothing here is read
/// back from shared state during analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// Tracks whose notes appear in the output; empty means all.
    #[serde(default)]
    pub selected_tracks: BTreeSet<usize>,
    #[serde(default)]
    pub shift: Shift,
    /// Per-track shifts replacing `shift` for that track.
    #[serde(default)]
    pub track_shifts: BTreeMap<usize, Shift>,
    #[serde(default)]
    pub hanging_notes: HangingNotes,
    /// Total duration in seconds, used only to time SMPTE files.
    #[serde(default)]
    pub duration_hint: Option<f64>,
}

impl AnalyzeOptions {
    pub fn shift_for(&self, track: usize) -> Shift {
        self.track_shifts.get(&track).copied().unwrap_or(self.shift)
    }
}

/// Structural info for one track, for track pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub index: usize,
    /// First track-name meta event, decoded lossily.
    pub name: Option<String>,
    /// Note-ons with non-zero velocity.
    pub note_count: usize,
}

/// Range statistics over the final notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub min_note: Option<i32>,
    pub max_note: Option<i32>,
    /// Events below `config_min_note` after shifting. Each note counts
    /// twice, once for its note_on and once for its note_off.
    pub under_min_count: usize,
    /// Events above `config_max_note` after shifting, counted like
    /// `under_min_count`.
    pub over_max_count: usize,
    pub total_over_limit_count: usize,
    pub min_note_name: String,
    pub max_note_name: String,
    pub min_note_group: String,
    pub max_note_group: String,
    pub is_min_over_limit: bool,
    pub is_max_over_limit: bool,
    pub black_key_mode: BlackKeyMode,
    pub config_min_note: i32,
    pub config_max_note: i32,
    pub transpose: i32,
    pub octave_shift: i32,
    /// Set when the analysis failed and `events` is empty for that reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Summary {
    fn empty(options: &AnalyzeOptions, config: &KeyRangeConfig) -> Self {
        Self {
            min_note: None,
            max_note: None,
            under_min_count: 0,
            over_max_count: 0,
            total_over_limit_count: 0,
            min_note_name: String::new(),
            max_note_name: String::new(),
            min_note_group: String::new(),
            max_note_group: String::new(),
            is_min_over_limit: false,
            is_max_over_limit: false,
            black_key_mode: config.black_key_mode,
            config_min_note: config.min_note,
            config_max_note: config.max_note,
            transpose: options.shift.transpose,
            octave_shift: options.shift.octave_shift,
            error: None,
        }
    }
}

/// Everything one analysis call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub events: Vec<TimedEvent>,
    pub summary: Summary,
    pub tracks: Vec<TrackInfo>,
}

impl Analysis {
    /// The empty result for a failed analysis, with the error recorded in
    /// the summary.
    pub fn failed(error: &crate::Error, options: &AnalyzeOptions, config: KeyRangeConfig) -> Self {
        let mut summary = Summary::empty(options, &config);
        summary.error = Some(error.to_string());
        Self {
            events: Vec::new(),
            summary,
            tracks: Vec::new(),
        }
    }
}

/// List every track with its name and note count.
pub fn list_tracks(doc: &MidiDocument) -> Vec<TrackInfo> {
    doc.tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let mut name = None;
            let mut note_count = 0;
            for event in track {
                match &event.message {
                    TrackMessage::TrackName(n) if name.is_none() && !n.is_empty() => {
                        name = Some(n.clone());
                    }
                    TrackMessage::NoteOn { velocity, .. } if *velocity > 0 => note_count += 1,
                    _ => {}
                }
            }
            TrackInfo {
                index,
                name,
                note_count,
            }
        })
        .collect()
}

/// Full pipeline: tempo map + pairing → seconds → transform → timeline.
pub fn analyze(doc: &MidiDocument, options: &AnalyzeOptions, config: KeyRangeConfig) -> Analysis {
    let tempo_map = TempoMap::from_document(doc);
    let spans = pair_notes(doc, &options.selected_tracks, options.hanging_notes);
    debug!(
        tracks = doc.track_count(),
        tempo_changes = tempo_map.breakpoints().len(),
        spans = spans.len(),
        "paired notes"
    );

    // The SMPTE rescale spans the whole file, whatever the selection
    let max_tick = match doc.division {
        Division::Timecode { .. } => pair_notes(doc, &BTreeSet::new(), options.hanging_notes)
            .iter()
            .map(|s| s.end_tick)
            .max()
            .unwrap_or(0),
        Division::Metrical(_) => 0,
    };
    let clock = TickClock::for_document(doc.division, &tempo_map, max_tick, options.duration_hint);

    let mut summary = Summary::empty(options, &config);
    let placed: Vec<PlacedNote> = spans
        .iter()
        .map(|span| {
            let note = transform_note(span.note, options.shift_for(span.track), &config);
            // One note_on plus one note_off
            match note.range {
                RangeCheck::Below => summary.under_min_count += 2,
                RangeCheck::Above => summary.over_max_count += 2,
                RangeCheck::Within => {}
            }
            PlacedNote {
                start: clock.seconds(span.start_tick),
                end: clock.seconds(span.end_tick),
                note,
                channel: span.channel,
                track: span.track,
                velocity: span.velocity,
            }
        })
        .collect();

    summary.total_over_limit_count = summary.under_min_count + summary.over_max_count;
    summary.min_note = placed.iter().map(|p| p.note.note).min();
    summary.max_note = placed.iter().map(|p| p.note.note).max();
    if let Some(min) = summary.min_note {
        summary.min_note_name = note_name(min);
        summary.min_note_group = group_label(min).to_string();
        summary.is_min_over_limit = min < config.min_note;
    }
    if let Some(max) = summary.max_note {
        summary.max_note_name = note_name(max);
        summary.max_note_group = group_label(max).to_string();
        summary.is_max_over_limit = max > config.max_note;
    }

    let events = materialize(placed);

    info!(
        events = events.len(),
        min_note = ?summary.min_note,
        max_note = ?summary.max_note,
        under_min = summary.under_min_count,
        over_max = summary.over_max_count,
        "analysis complete"
    );
    if let (Some(first), Some(last)) = (events.first(), events.last()) {
        debug!(first = first.time, last = last.time, "timeline span in seconds");
    }

    Analysis {
        events,
        summary,
        tracks: list_tracks(doc),
    }
}

/// Parse SMF bytes and analyze them.
pub fn analyze_bytes(
    bytes: &[u8],
    options: &AnalyzeOptions,
    config: KeyRangeConfig,
) -> crate::Result<Analysis> {
    let doc = MidiDocument::parse(bytes)?;
    Ok(analyze(&doc, options, config))
}

/// Read, parse and analyze a file.
pub fn analyze_file(
    path: impl AsRef<Path>,
    options: &AnalyzeOptions,
    config: KeyRangeConfig,
) -> crate::Result<Analysis> {
    let path = path.as_ref();
    debug!(path = %path.display(), "analyzing MIDI file");
    let doc = MidiDocument::open(path)?;
    Ok(analyze(&doc, options, config))
}
