//! Event table export.

use std::io::Write;

use crate::analyze::Analysis;
use crate::event::TimedEvent;
use crate::groups::note_name;
use crate::{Error, Result};

const CSV_HEADER: [&str; 12] = [
    "index",
    "time",
    "type",
    "note",
    "name",
    "channel",
    "track",
    "group",
    "velocity",
    "over_limit",
    "end",
    "duration",
];

fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

/// Write events as CSV, one row per event, numbered from 1.
pub fn write_csv<W: Write>(events: &[TimedEvent], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)
        .map_err(|e| Error::Export(e.to_string()))?;

    for (i, event) in events.iter().enumerate() {
        csv.write_record([
            (i + 1).to_string(),
            format!("{:.3}", event.time),
            event.kind.as_str().to_string(),
            event.note.to_string(),
            note_name(event.note),
            event.channel.to_string(),
            event.track.to_string(),
            event.group_label().to_string(),
            event.velocity.to_string(),
            event.is_over_limit.to_string(),
            seconds(event.end),
            seconds(event.duration),
        ])
        .map_err(|e| Error::Export(e.to_string()))?;
    }

    csv.flush().map_err(|e| Error::Export(e.to_string()))
}

/// Pretty JSON of a whole analysis.
pub fn to_json(analysis: &Analysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).map_err(|e| Error::Export(e.to_string()))
}
