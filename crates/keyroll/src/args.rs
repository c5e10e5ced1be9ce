//! Analysis flags shared by `analyze` and `export`.

use clap::Args;
use midi_timeline::{AnalyzeOptions, Group, HangingNotes, Shift};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const TRANSPOSE_RANGE: RangeInclusive<i32> = -127..=127;
const OCTAVE_RANGE: RangeInclusive<i32> = -10..=10;

#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Track indices to include, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub tracks: Vec<usize>,

    /// Semitones to transpose every note by
    #[arg(
        long,
        default_value_t = 0,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i32).range(-127..=127)
    )]
    pub transpose: i32,

    /// Octaves to shift every note by
    #[arg(
        long,
        default_value_t = 0,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i32).range(-10..=10)
    )]
    pub octave: i32,

    /// Per-track override as INDEX:TRANSPOSE[:OCTAVE], repeatable
    #[arg(long = "track-shift", value_parser = parse_track_shift)]
    pub track_shifts: Vec<(usize, Shift)>,

    /// Only keep notes in these register groups, repeatable (e.g. one-line)
    #[arg(long = "group", value_parser = parse_group)]
    pub groups: Vec<Group>,

    /// Only keep notes outside the playable range
    #[arg(long)]
    pub over_limit_only: bool,

    /// Close notes still sounding at the end of their track instead of dropping them
    #[arg(long)]
    pub close_hanging: bool,

    /// Total length in seconds, used to time SMPTE-division files
    #[arg(long)]
    pub duration_hint: Option<f64>,
}

impl AnalysisArgs {
    /// Build the per-call options. `configured` is the hanging-note policy
    /// from config; `--close-hanging` overrides it.
    pub fn to_options(&self, configured: HangingNotes) -> AnalyzeOptions {
        let track_shifts: BTreeMap<usize, Shift> = self.track_shifts.iter().copied().collect();
        AnalyzeOptions {
            selected_tracks: self.tracks.iter().copied().collect(),
            shift: Shift::new(self.transpose, self.octave),
            track_shifts,
            hanging_notes: if self.close_hanging {
                HangingNotes::CloseAtTrackEnd
            } else {
                configured
            },
            duration_hint: self.duration_hint,
        }
    }
}

/// Parse `INDEX:TRANSPOSE[:OCTAVE]`.
pub fn parse_track_shift(s: &str) -> Result<(usize, Shift), String> {
    let mut parts = s.split(':');
    let index = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| format!("expected INDEX:TRANSPOSE[:OCTAVE], got '{s}'"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|e| format!("bad track index '{index}': {e}"))?;

    let transpose = match parts.next() {
        Some(p) => p
            .trim()
            .parse()
            .map_err(|e| format!("bad transpose '{p}': {e}"))?,
        None => return Err(format!("expected INDEX:TRANSPOSE[:OCTAVE], got '{s}'")),
    };
    let octave = match parts.next() {
        Some(p) => p.trim().parse().map_err(|e| format!("bad octave '{p}': {e}"))?,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(format!("too many fields in '{s}'"));
    }
    if !TRANSPOSE_RANGE.contains(&transpose) || !OCTAVE_RANGE.contains(&octave) {
        return Err(format!(
            "shift out of range in '{s}' (transpose {TRANSPOSE_RANGE:?}, octave {OCTAVE_RANGE:?})"
        ));
    }

    Ok((index, Shift::new(transpose, octave)))
}

pub fn parse_group(s: &str) -> Result<Group, String> {
    Group::parse(s).ok_or_else(|| {
        let known: Vec<String> = Group::ALL
            .iter()
            .map(|g| g.label().split(' ').next().unwrap_or_default().to_string())
            .collect();
        format!("unknown group '{s}' (expected one of: {})", known.join(", "))
    })
}
