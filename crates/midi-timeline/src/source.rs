//! Normalized view of a parsed MIDI file.
//!
//! `midly` is the only parser. Everything downstream works on
//! [`MidiDocument`], which keeps just the messages the timeline needs, with
//! their per-track delta times intact.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Time division from the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    /// Ticks per quarter note.
    Metrical(u16),
    /// SMPTE frames per second and ticks per frame.
    Timecode { fps: u8, subframes: u8 },
}

/// The subset of track messages the timeline cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackMessage {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    /// Microseconds per quarter note.
    Tempo(u32),
    TrackName(String),
    /// Kept so the track's final tick is known.
    EndOfTrack,
}

/// A message tagged with its delta time in ticks from the previous event of
/// the same track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub delta: u32,
    pub message: TrackMessage,
}

impl TrackEvent {
    pub fn new(delta: u32, message: TrackMessage) -> Self {
        Self { delta, message }
    }
}

/// A parsed MIDI file: header division plus one message list per track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiDocument {
    pub division: Division,
    pub tracks: Vec<Vec<TrackEvent>>,
}

impl MidiDocument {
    /// Parse SMF bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes).map_err(|e| Error::MidiParse(e.to_string()))?;
        Ok(Self::from_smf(&smf))
    }

    /// Read and parse a file. A missing file is reported as
    /// [`Error::NotFound`], other I/O failures as [`Error::Read`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::parse(&bytes)
    }

    pub fn from_smf(smf: &Smf) -> Self {
        let division = match smf.header.timing {
            Timing::Metrical(ticks) => Division::Metrical(ticks.as_int()),
            Timing::Timecode(fps, subframes) => Division::Timecode {
                fps: fps.as_int(),
                subframes,
            },
        };

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                // Dropped events still advance time: fold their delta into
                // the next kept event.
                let mut carry: u32 = 0;
                let mut events = Vec::new();
                for event in track {
                    carry = carry.saturating_add(event.delta.as_int());
                    if let Some(message) = normalize(&event.kind) {
                        events.push(TrackEvent::new(carry, message));
                        carry = 0;
                    }
                }
                events
            })
            .collect();

        Self { division, tracks }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

fn normalize(kind: &TrackEventKind) -> Option<TrackMessage> {
    match *kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => Some(TrackMessage::NoteOn {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int(),
                }),
                MidiMessage::NoteOff { key, vel } => Some(TrackMessage::NoteOff {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int(),
                }),
                _ => None,
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => Some(TrackMessage::Tempo(tempo.as_int())),
        TrackEventKind::Meta(MetaMessage::EndOfTrack) => Some(TrackMessage::EndOfTrack),
        TrackEventKind::Meta(MetaMessage::TrackName(bytes)) => Some(TrackMessage::TrackName(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        _ => None,
    }
}
