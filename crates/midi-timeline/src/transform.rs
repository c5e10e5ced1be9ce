//! Transpose, range flagging and black-key remapping.

use serde::{Deserialize, Serialize};

/// Pitch classes of the black keys (C#, D#, F#, G#, A#).
const BLACK_PITCH_CLASSES: [i32; 5] = [1, 3, 6, 8, 10];

/// How black keys are handled for notes inside the playable range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackKeyMode {
    /// Move black keys down to the neighbouring white key.
    #[default]
    AutoSharp,
    /// Leave black keys alone; the input device has keys for them.
    SupportBlackKey,
}

impl std::str::FromStr for BlackKeyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto_sharp" => Ok(BlackKeyMode::AutoSharp),
            "support_black_key" => Ok(BlackKeyMode::SupportBlackKey),
            other => Err(format!("unknown black key mode: {other}")),
        }
    }
}

impl std::fmt::Display for BlackKeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BlackKeyMode::AutoSharp => "auto_sharp",
            BlackKeyMode::SupportBlackKey => "support_black_key",
        })
    }
}

/// The playable key range. Owned by the caller and passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRangeConfig {
    pub min_note: i32,
    pub max_note: i32,
    pub black_key_mode: BlackKeyMode,
}

impl KeyRangeConfig {
    pub const DEFAULT_MIN_NOTE: i32 = 48;
    pub const DEFAULT_MAX_NOTE: i32 = 83;

    pub fn contains(&self, note: i32) -> bool {
        (self.min_note..=self.max_note).contains(&note)
    }
}

impl Default for KeyRangeConfig {
    fn default() -> Self {
        Self {
            min_note: Self::DEFAULT_MIN_NOTE,
            max_note: Self::DEFAULT_MAX_NOTE,
            black_key_mode: BlackKeyMode::default(),
        }
    }
}

/// Semitone transpose plus octave shift. The octave shift is sugar for
/// twelve semitones each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub transpose: i32,
    pub octave_shift: i32,
}

impl Shift {
    pub fn new(transpose: i32, octave_shift: i32) -> Self {
        Self {
            transpose,
            octave_shift,
        }
    }

    pub fn offset(&self) -> i32 {
        self.octave_shift.saturating_mul(12).saturating_add(self.transpose)
    }
}

/// Where a note landed relative to the playable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCheck {
    Below,
    Within,
    Above,
}

/// Result of running one note through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformedNote {
    pub note: i32,
    pub range: RangeCheck,
}

impl TransformedNote {
    pub fn is_over_limit(&self) -> bool {
        self.range != RangeCheck::Within
    }
}

pub fn is_black_key(note: i32) -> bool {
    BLACK_PITCH_CLASSES.contains(&note.rem_euclid(12))
}

/// Nearest white key to `note`, preferring the lower one on a tie. Every
/// black key sits between two whites one semitone away, so this always
/// steps down. White keys are returned unchanged.
pub fn nearest_natural(note: i32) -> i32 {
    if is_black_key(note) {
        note - 1
    } else {
        note
    }
}

/// Shift, range-check, then remap black keys for in-range notes.
///
/// The range check sees the shifted note before any remap; out-of-range
/// notes keep their black keys.
pub fn transform_note(note: u8, shift: Shift, config: &KeyRangeConfig) -> TransformedNote {
    let shifted = (note as i32).saturating_add(shift.offset());

    let range = if shifted < config.min_note {
        RangeCheck::Below
    } else if shifted > config.max_note {
        RangeCheck::Above
    } else {
        RangeCheck::Within
    };

    let note = match (range, config.black_key_mode) {
        (RangeCheck::Within, BlackKeyMode::AutoSharp) => nearest_natural(shifted),
        _ => shifted,
    };

    TransformedNote { note, range }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: BlackKeyMode) -> KeyRangeConfig {
        KeyRangeConfig {
            min_note: 48,
            max_note: 83,
            black_key_mode: mode,
        }
    }

    #[test]
    fn octave_shift_is_twelve_semitones() {
        let cfg = config(BlackKeyMode::SupportBlackKey);
        for note in 0..=127u8 {
            for t in -14..=14 {
                for o in -3..=3 {
                    assert_eq!(
                        transform_note(note, Shift::new(t, o), &cfg),
                        transform_note(note, Shift::new(t + 12 * o, 0), &cfg)
                    );
                }
            }
        }
    }

    #[test]
    fn auto_sharp_steps_black_keys_down() {
        let cfg = config(BlackKeyMode::AutoSharp);
        assert_eq!(transform_note(61, Shift::default(), &cfg).note, 60);
        assert_eq!(transform_note(63, Shift::default(), &cfg).note, 62);
        assert_eq!(transform_note(66, Shift::default(), &cfg).note, 65);
        assert_eq!(transform_note(68, Shift::default(), &cfg).note, 67);
        assert_eq!(transform_note(70, Shift::default(), &cfg).note, 69);
    }

    #[test]
    fn auto_sharp_leaves_white_keys() {
        let cfg = config(BlackKeyMode::AutoSharp);
        for note in 48..=83u8 {
            if !is_black_key(note as i32) {
                assert_eq!(transform_note(note, Shift::default(), &cfg).note, note as i32);
            }
        }
        assert_eq!(nearest_natural(nearest_natural(73)), 72);
    }

    #[test]
    fn extreme_shifts_saturate() {
        let cfg = config(BlackKeyMode::AutoSharp);
        let up = transform_note(127, Shift::new(i32::MAX, 200_000_000), &cfg);
        assert_eq!(up, TransformedNote { note: i32::MAX, range: RangeCheck::Above });

        let down = transform_note(0, Shift::new(i32::MIN, -200_000_000), &cfg);
        assert_eq!(down.range, RangeCheck::Below);
        assert_eq!(down.note, i32::MIN);
    }

    #[test]
    fn support_black_key_passes_through() {
        let cfg = config(BlackKeyMode::SupportBlackKey);
        assert_eq!(transform_note(61, Shift::default(), &cfg).note, 61);
    }

    #[test]
    fn over_limit_notes_are_not_remapped() {
        let cfg = config(BlackKeyMode::AutoSharp);
        let high = transform_note(85, Shift::default(), &cfg);
        assert_eq!(high, TransformedNote { note: 85, range: RangeCheck::Above });
        let low = transform_note(46, Shift::default(), &cfg);
        assert_eq!(low, TransformedNote { note: 46, range: RangeCheck::Below });
        assert!(low.is_over_limit());
    }

    #[test]
    fn transpose_can_leave_midi_range() {
        let cfg = config(BlackKeyMode::AutoSharp);
        let t = transform_note(127, Shift::new(5, 1), &cfg);
        assert_eq!(t.note, 144);
        assert!(t.is_over_limit());
        assert_eq!(transform_note(2, Shift::new(0, -1), &cfg).note, -10);
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("auto_sharp".parse::<BlackKeyMode>(), Ok(BlackKeyMode::AutoSharp));
        assert_eq!(
            "support_black_key".parse::<BlackKeyMode>(),
            Ok(BlackKeyMode::SupportBlackKey)
        );
        assert!("sharpish".parse::<BlackKeyMode>().is_err());
    }
}
