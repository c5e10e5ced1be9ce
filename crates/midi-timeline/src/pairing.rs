//! Note-on / note-off pairing.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::note::{HangingNotes, RawNoteSpan};
use crate::source::{MidiDocument, TrackEvent, TrackMessage};

/// Pair notes in every selected track (all tracks when `selected` is empty).
///
/// Spans come back sorted by start tick, then track, channel and note, so the
/// output does not depend on message interleaving between tracks.
pub fn pair_notes(
    doc: &MidiDocument,
    selected: &BTreeSet<usize>,
    hanging: HangingNotes,
) -> Vec<RawNoteSpan> {
    let mut spans: Vec<RawNoteSpan> = doc
        .tracks
        .iter()
        .enumerate()
        .filter(|(index, _)| selected.is_empty() || selected.contains(index))
        .flat_map(|(index, track)| pair_track(index, track, hanging))
        .collect();

    spans.sort_by(|a, b| {
        a.start_tick
            .cmp(&b.start_tick)
            .then(a.track.cmp(&b.track))
            .then(a.channel.cmp(&b.channel))
            .then(a.note.cmp(&b.note))
    });
    spans
}

/// Pair one track's messages.
///
/// Each `(channel, note)` key has a FIFO queue of `(start_tick, velocity)`:
/// the first note-on is closed by the first note-off, so overlapping repeats
/// of the same pitch never cross. A note-off with an empty queue is ignored.
pub fn pair_track(track_index: usize, track: &[TrackEvent], hanging: HangingNotes) -> Vec<RawNoteSpan> {
    let mut spans = Vec::new();
    let mut pending: BTreeMap<(u8, u8), VecDeque<(u64, u8)>> = BTreeMap::new();
    let mut current_tick: u64 = 0;

    for event in track {
        current_tick += event.delta as u64;

        match event.message {
            TrackMessage::NoteOn {
                channel,
                key,
                velocity,
            } if velocity > 0 => {
                pending
                    .entry((channel, key))
                    .or_default()
                    .push_back((current_tick, velocity));
            }
            // vel=0 NoteOn is NoteOff
            TrackMessage::NoteOn { channel, key, .. } | TrackMessage::NoteOff { channel, key, .. } => {
                if let Some((start_tick, velocity)) = pending
                    .get_mut(&(channel, key))
                    .and_then(|queue| queue.pop_front())
                {
                    spans.push(RawNoteSpan {
                        start_tick,
                        end_tick: current_tick,
                        channel,
                        note: key,
                        velocity,
                        track: track_index,
                    });
                }
            }
            _ => {}
        }
    }

    if hanging == HangingNotes::CloseAtTrackEnd {
        for ((channel, note), queue) in pending {
            for (start_tick, velocity) in queue {
                spans.push(RawNoteSpan {
                    start_tick,
                    end_tick: current_tick,
                    channel,
                    note,
                    velocity,
                    track: track_index,
                });
            }
        }
    }

    spans
}
