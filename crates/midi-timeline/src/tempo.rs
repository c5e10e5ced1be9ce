//! Tempo map construction and tick → seconds conversion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::{Division, MidiDocument, TrackMessage};

/// 120 BPM, the SMF default when no tempo is declared.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Resolution assumed when the header gives none usable (SMPTE fallback or
/// a zero PPQN).
pub const FALLBACK_PPQ: u16 = 480;

/// A point where the tempo changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoBreakpoint {
    pub tick: u64,
    pub microseconds_per_quarter_note: u32,
}

impl TempoBreakpoint {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.microseconds_per_quarter_note as f64
    }
}

/// Sorted tempo breakpoints, one per tick, always starting at tick 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoMap {
    breakpoints: Vec<TempoBreakpoint>,
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::constant(DEFAULT_TEMPO)
    }
}

impl TempoMap {
    pub fn constant(microseconds_per_quarter_note: u32) -> Self {
        Self {
            breakpoints: vec![TempoBreakpoint {
                tick: 0,
                microseconds_per_quarter_note,
            }],
        }
    }

    /// Scan every track for tempo events. Tempo is file-global, so this
    /// always looks at all tracks regardless of any track selection.
    pub fn from_document(doc: &MidiDocument) -> Self {
        let mut changes = Vec::new();
        for track in &doc.tracks {
            let mut tick: u64 = 0;
            for event in track {
                tick += event.delta as u64;
                if let TrackMessage::Tempo(tempo) = event.message {
                    changes.push((tick, tempo));
                }
            }
        }
        Self::from_changes(changes)
    }

    /// Build from raw `(tick, tempo)` pairs in declaration order. On a
    /// duplicate tick the later pair wins. Zero tempos are ignored.
    pub fn from_changes(changes: impl IntoIterator<Item = (u64, u32)>) -> Self {
        let mut all: Vec<(u64, u32)> = vec![(0, DEFAULT_TEMPO)];
        all.extend(changes.into_iter().filter(|&(_, tempo)| tempo > 0));
        // Stable: declaration order survives among equal ticks
        all.sort_by_key(|&(tick, _)| tick);

        let mut breakpoints: Vec<TempoBreakpoint> = Vec::with_capacity(all.len());
        for (tick, tempo) in all {
            match breakpoints.last_mut() {
                Some(last) if last.tick == tick => last.microseconds_per_quarter_note = tempo,
                _ => breakpoints.push(TempoBreakpoint {
                    tick,
                    microseconds_per_quarter_note: tempo,
                }),
            }
        }

        Self { breakpoints }
    }

    pub fn breakpoints(&self) -> &[TempoBreakpoint] {
        &self.breakpoints
    }

    pub fn initial_tempo(&self) -> u32 {
        self.breakpoints[0].microseconds_per_quarter_note
    }
}

/// One constant-tempo stretch of a [`TickClock`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    tick: u64,
    seconds: f64,
    microseconds_per_quarter_note: f64,
}

/// Converts absolute ticks to seconds.
///
/// Segment start times are integrated once at construction; each lookup is a
/// binary search over segments.
#[derive(Debug, Clone, PartialEq)]
pub enum TickClock {
    /// Piecewise-linear over a tempo map.
    Metrical { ppq: u16, segments: Vec<Segment> },
    /// Uniform rescale, used for SMPTE files with a known total duration.
    Linear { total_seconds: f64, max_tick: u64 },
}

impl TickClock {
    /// Exact PPQN clock over `map`.
    pub fn metrical(ppq: u16, map: &TempoMap) -> Self {
        let ppq = if ppq == 0 { FALLBACK_PPQ } else { ppq };

        let mut segments: Vec<Segment> = Vec::with_capacity(map.breakpoints().len());
        for bp in map.breakpoints() {
            let seconds = match segments.last() {
                Some(prev) => prev.seconds + span_seconds(bp.tick - prev.tick, prev, ppq),
                None => 0.0,
            };
            segments.push(Segment {
                tick: bp.tick,
                seconds,
                microseconds_per_quarter_note: bp.microseconds_per_quarter_note as f64,
            });
        }

        Self::Metrical { ppq, segments }
    }

    /// Choose the clock for a document.
    ///
    /// SMPTE files are not integrated frame by frame: with a positive
    /// `duration_hint` and `max_tick`, ticks are rescaled linearly onto the
    /// hinted duration; otherwise the file is timed as 120 BPM at the
    /// fallback PPQN, ignoring its tempo events.
    pub fn for_document(
        division: Division,
        map: &TempoMap,
        max_tick: u64,
        duration_hint: Option<f64>,
    ) -> Self {
        match division {
            Division::Metrical(ppq) => Self::metrical(ppq, map),
            Division::Timecode { fps, subframes } => match duration_hint {
                Some(total) if total > 0.0 && max_tick > 0 => {
                    debug!(fps, subframes, total, max_tick, "SMPTE timing, linear rescale");
                    Self::Linear {
                        total_seconds: total,
                        max_tick,
                    }
                }
                _ => {
                    debug!(fps, subframes, "SMPTE timing without duration hint, assuming 120 BPM");
                    Self::metrical(FALLBACK_PPQ, &TempoMap::default())
                }
            },
        }
    }

    /// Elapsed seconds at `tick`. Monotonic, and 0.0 at tick 0.
    pub fn seconds(&self, tick: u64) -> f64 {
        match self {
            Self::Metrical { ppq, segments } => {
                // segments[0] is always tick 0, so idx >= 1
                let idx = segments.partition_point(|s| s.tick <= tick);
                let seg = &segments[idx - 1];
                seg.seconds + span_seconds(tick - seg.tick, seg, *ppq)
            }
            Self::Linear {
                total_seconds,
                max_tick,
            } => tick as f64 * total_seconds / *max_tick as f64,
        }
    }
}

fn span_seconds(ticks: u64, seg: &Segment, ppq: u16) -> f64 {
    ticks as f64 * seg.microseconds_per_quarter_note / (ppq as f64 * 1_000_000.0)
}
