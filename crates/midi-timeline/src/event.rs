//! Timeline events handed to players and displays.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::groups::group_label;
use crate::transform::TransformedNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

impl EventKind {
    /// Sort rank at equal times: releases come before presses.
    fn rank(self) -> u8 {
        match self {
            EventKind::NoteOff => 0,
            EventKind::NoteOn => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::NoteOn => "note_on",
            EventKind::NoteOff => "note_off",
        }
    }
}

/// One press or release on the final timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds from the start of the file.
    pub time: f64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Post-transform note; may fall outside 0..=127.
    pub note: i32,
    pub channel: u8,
    pub track: usize,
    /// Register group label, `"unknown"` outside the piano range.
    pub group: String,
    pub velocity: u8,
    pub is_over_limit: bool,
    /// Note-on only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Note-on only: release time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl TimedEvent {
    pub fn is_note_on(&self) -> bool {
        self.kind == EventKind::NoteOn
    }

    pub fn group_label(&self) -> &str {
        &self.group
    }
}

/// A paired, timed and transformed note ready to be expanded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNote {
    pub start: f64,
    pub end: f64,
    pub note: TransformedNote,
    pub channel: u8,
    pub track: usize,
    pub velocity: u8,
}

/// Expand notes into note_on/note_off pairs and sort the whole timeline.
///
/// The sort is stable on `(time, kind)` with note_off first, so a key
/// released and re-pressed at the same instant is released first.
pub fn materialize(notes: impl IntoIterator<Item = PlacedNote>) -> Vec<TimedEvent> {
    let notes = notes.into_iter();
    let mut events = Vec::with_capacity(notes.size_hint().0 * 2);

    for placed in notes {
        let end = placed.end.max(placed.start);
        let group = group_label(placed.note.note).to_string();
        let base = TimedEvent {
            time: placed.start,
            kind: EventKind::NoteOn,
            note: placed.note.note,
            channel: placed.channel,
            track: placed.track,
            group,
            velocity: placed.velocity,
            is_over_limit: placed.note.is_over_limit(),
            duration: Some(end - placed.start),
            end: Some(end),
        };
        events.push(TimedEvent {
            time: end,
            kind: EventKind::NoteOff,
            duration: None,
            end: None,
            ..base.clone()
        });
        events.push(base);
    }

    events.sort_by(compare_events);
    events
}

fn compare_events(a: &TimedEvent, b: &TimedEvent) -> Ordering {
    a.time
        .total_cmp(&b.time)
        .then(a.kind.rank().cmp(&b.kind.rank()))
}

/// True when times never decrease and no note_on precedes a note_off at the
/// same time.
pub fn is_well_ordered(events: &[TimedEvent]) -> bool {
    events.windows(2).all(|w| compare_events(&w[0], &w[1]) != Ordering::Greater)
}
