//! Piano pitch groups and note naming.
//!
//! The 88-key range (MIDI 21..=108) is split into nine fixed register bands.
//! Playable-range validation downstream is keyed to these boundaries, so the
//! ranges below must not move.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::event::TimedEvent;

/// Lowest note with a table name (A₂).
pub const PIANO_LOW: i32 = 21;
/// Highest note with a table name (c⁵).
pub const PIANO_HIGH: i32 = 108;

/// Label used for notes outside every group.
pub const UNKNOWN_GROUP: &str = "unknown";

const NOTE_NAMES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// One of the nine piano register bands, in Helmholtz naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    SubContra,
    Contra,
    Great,
    Small,
    OneLine,
    TwoLine,
    ThreeLine,
    FourLine,
    FiveLine,
}

impl Group {
    /// All groups, lowest register first.
    pub const ALL: [Group; 9] = [
        Group::SubContra,
        Group::Contra,
        Group::Great,
        Group::Small,
        Group::OneLine,
        Group::TwoLine,
        Group::ThreeLine,
        Group::FourLine,
        Group::FiveLine,
    ];

    /// Inclusive MIDI note range covered by this group.
    pub fn range(self) -> (i32, i32) {
        match self {
            Group::SubContra => (21, 23),
            Group::Contra => (24, 35),
            Group::Great => (36, 47),
            Group::Small => (48, 59),
            Group::OneLine => (60, 71),
            Group::TwoLine => (72, 83),
            Group::ThreeLine => (84, 95),
            Group::FourLine => (96, 107),
            Group::FiveLine => (108, 108),
        }
    }

    pub fn contains(self, note: i32) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&note)
    }

    /// Display label, e.g. `one-line (c¹-b¹)`.
    pub fn label(self) -> &'static str {
        match self {
            Group::SubContra => "sub-contra (A₂-B₂)",
            Group::Contra => "contra (C₁-B₁)",
            Group::Great => "great (C-B)",
            Group::Small => "small (c-b)",
            Group::OneLine => "one-line (c¹-b¹)",
            Group::TwoLine => "two-line (c²-b²)",
            Group::ThreeLine => "three-line (c³-b³)",
            Group::FourLine => "four-line (c⁴-b⁴)",
            Group::FiveLine => "five-line (c⁵)",
        }
    }

    /// Resolve a group from its serde name (`one_line`), its label, or the
    /// label's leading word (`one-line`). Case-insensitive.
    pub fn parse(s: &str) -> Option<Group> {
        let needle = s.trim().to_lowercase();
        Group::ALL.into_iter().find(|g| {
            let label = g.label().to_lowercase();
            let short = label.split(' ').next().unwrap_or_default();
            needle == label || needle == short || needle == short.replace('-', "_")
        })
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The group whose range contains `note`, if any.
pub fn group_for_note(note: i32) -> Option<Group> {
    Group::ALL.into_iter().find(|g| g.contains(note))
}

/// Group label for `note`, or `"unknown"` outside the piano range.
pub fn group_label(note: i32) -> &'static str {
    group_for_note(note).map_or(UNKNOWN_GROUP, Group::label)
}

fn name_table() -> &'static [String] {
    static TABLE: OnceLock<Vec<String>> = OnceLock::new();
    TABLE.get_or_init(|| (PIANO_LOW..=PIANO_HIGH).map(build_name).collect())
}

fn build_name(note: i32) -> String {
    let base = NOTE_NAMES[note.rem_euclid(12) as usize];
    let (upper, marker) = match note {
        108.. => (false, "⁵"),
        96..=107 => (false, "⁴"),
        84..=95 => (false, "³"),
        72..=83 => (false, "²"),
        60..=71 => (false, "¹"),
        48..=59 => (false, ""),
        36..=47 => (true, ""),
        24..=35 => (true, "₁"),
        _ => (true, "₂"),
    };
    let letter = if upper {
        base.to_uppercase()
    } else {
        base.to_string()
    };
    format!("{letter}{marker}")
}

/// Display name of `note` (`c¹` for 60, `C#₁` for 25); the bare integer
/// outside 21..=108.
pub fn note_name(note: i32) -> String {
    if (PIANO_LOW..=PIANO_HIGH).contains(&note) {
        name_table()[(note - PIANO_LOW) as usize].clone()
    } else {
        note.to_string()
    }
}

/// Keep events whose note falls in any of `groups`. An empty selection keeps
/// everything.
pub fn filter_by_groups(events: &[TimedEvent], groups: &[Group]) -> Vec<TimedEvent> {
    if groups.is_empty() {
        return events.to_vec();
    }
    events
        .iter()
        .filter(|e| groups.iter().any(|g| g.contains(e.note)))
        .cloned()
        .collect()
}
