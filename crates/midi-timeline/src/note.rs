use serde::{Deserialize, Serialize};

/// A paired note with absolute tick timing and source metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNoteSpan {
    pub start_tick: u64,
    /// Never before `start_tick`; equal for zero-length notes.
    pub end_tick: u64,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub track: usize,
}

impl RawNoteSpan {
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// What to do with note-ons still waiting for a note-off when their track ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HangingNotes {
    /// Discard them.
    #[default]
    Drop,
    /// Close them at the track's last tick.
    CloseAtTrackEnd,
}

impl std::str::FromStr for HangingNotes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(HangingNotes::Drop),
            "close_at_track_end" | "close" => Ok(HangingNotes::CloseAtTrackEnd),
            other => Err(format!("unknown hanging-note policy: {other}")),
        }
    }
}

impl std::fmt::Display for HangingNotes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HangingNotes::Drop => "drop",
            HangingNotes::CloseAtTrackEnd => "close_at_track_end",
        })
    }
}
