//! End-to-end timeline tests over hand-built Standard MIDI Files.

use midi_timeline::{
    analyze_bytes, analyze_file, is_well_ordered, Analysis, AnalyzeOptions, BlackKeyMode, Error,
    EventKind, HangingNotes, KeyRangeConfig, Shift,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

/// Minimal SMF writer for test fixtures.
struct SmfBuilder {
    format: u16,
    division: [u8; 2],
    tracks: Vec<Vec<u8>>,
}

impl SmfBuilder {
    fn ppq(ppq: u16) -> Self {
        Self {
            format: 1,
            division: ppq.to_be_bytes(),
            tracks: Vec::new(),
        }
    }

    fn smpte(fps: u8, subframes: u8) -> Self {
        Self {
            format: 1,
            division: [(-(fps as i8)) as u8, subframes],
            tracks: Vec::new(),
        }
    }

    fn track(mut self, track: TrackBuilder) -> Self {
        self.tracks.push(track.finish());
        self
    }

    fn build(self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&self.format.to_be_bytes());
        buf.extend_from_slice(&(self.tracks.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.division);
        for track in &self.tracks {
            buf.extend_from_slice(b"MTrk");
            buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
            buf.extend_from_slice(track);
        }
        buf
    }
}

#[derive(Default)]
struct TrackBuilder {
    bytes: Vec<u8>,
}

impl TrackBuilder {
    fn delta(&mut self, mut ticks: u32) {
        let mut groups = vec![(ticks & 0x7F) as u8];
        ticks >>= 7;
        while ticks > 0 {
            groups.push((ticks & 0x7F) as u8 | 0x80);
            ticks >>= 7;
        }
        groups.reverse();
        self.bytes.extend_from_slice(&groups);
    }

    fn name(mut self, name: &str) -> Self {
        self.delta(0);
        self.bytes.extend_from_slice(&[0xFF, 0x03, name.len() as u8]);
        self.bytes.extend_from_slice(name.as_bytes());
        self
    }

    fn tempo(mut self, delta: u32, usec: u32) -> Self {
        self.delta(delta);
        let b = usec.to_be_bytes();
        self.bytes.extend_from_slice(&[0xFF, 0x51, 0x03, b[1], b[2], b[3]]);
        self
    }

    fn on(mut self, delta: u32, channel: u8, key: u8, vel: u8) -> Self {
        self.delta(delta);
        self.bytes.extend_from_slice(&[0x90 | channel, key, vel]);
        self
    }

    fn off(mut self, delta: u32, channel: u8, key: u8) -> Self {
        self.delta(delta);
        self.bytes.extend_from_slice(&[0x80 | channel, key, 64]);
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.delta(0);
        self.bytes.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        self.bytes
    }
}

fn run(bytes: &[u8], options: &AnalyzeOptions, config: KeyRangeConfig) -> Analysis {
    analyze_bytes(bytes, options, config).unwrap()
}

fn single_note_file(key: u8) -> Vec<u8> {
    SmfBuilder::ppq(480)
        .track(
            TrackBuilder::default()
                .tempo(0, 500_000)
                .on(0, 0, key, 64)
                .off(480, 0, key),
        )
        .build()
}

/// Two tracks: a conductor with a tempo change and a busy piano part with
/// chords, repeated pitches and black keys.
fn busy_file() -> Vec<u8> {
    let mut piano = TrackBuilder::default().name("Piano");
    for i in 0..8u8 {
        piano = piano
            .on(0, 0, 60 + i, 90)
            .on(0, 0, 64 + i, 90)
            .on(0, 1, 30 + i * 10, 70)
            .off(240, 0, 60 + i)
            .off(0, 0, 64 + i)
            .off(0, 1, 30 + i * 10);
    }
    SmfBuilder::ppq(480)
        .track(
            TrackBuilder::default()
                .name("Conductor")
                .tempo(0, 500_000)
                .tempo(960, 750_000),
        )
        .track(piano)
        .build()
}

#[test]
fn single_note_at_120_bpm() {
    let analysis = run(&single_note_file(60), &AnalyzeOptions::default(), KeyRangeConfig::default());

    assert_eq!(analysis.events.len(), 2);
    let on = &analysis.events[0];
    assert_eq!(on.kind, EventKind::NoteOn);
    assert_eq!(on.time, 0.0);
    assert_eq!(on.note, 60);
    assert_eq!(on.channel, 0);
    assert_eq!(on.velocity, 64);
    assert_eq!(on.duration, Some(0.5));
    assert_eq!(on.end, Some(0.5));

    let off = &analysis.events[1];
    assert_eq!(off.kind, EventKind::NoteOff);
    assert_eq!(off.time, 0.5);
    assert_eq!(off.note, 60);
    assert_eq!(off.duration, None);
}

#[test]
fn transposed_and_remapped_scenarios() {
    let down = AnalyzeOptions {
        shift: Shift::new(-1, 0),
        ..Default::default()
    };
    let analysis = run(&single_note_file(60), &down, KeyRangeConfig::default());
    assert!(analysis.events.iter().all(|e| e.note == 59));

    let analysis = run(&single_note_file(61), &AnalyzeOptions::default(), KeyRangeConfig::default());
    assert!(analysis.events.iter().all(|e| e.note == 60));
}

#[test]
fn tempo_comes_from_whole_file_even_when_selecting() {
    let bytes = SmfBuilder::ppq(480)
        .track(TrackBuilder::default().tempo(0, 500_000).tempo(960, 1_000_000))
        .track(TrackBuilder::default().on(480, 0, 60, 100).off(960, 0, 60))
        .build();
    let options = AnalyzeOptions {
        selected_tracks: BTreeSet::from([1]),
        ..Default::default()
    };
    let analysis = run(&bytes, &options, KeyRangeConfig::default());

    let on = &analysis.events[0];
    assert_eq!(on.time, 0.5);
    assert_eq!(on.end, Some(2.0));
    assert_eq!(on.duration, Some(1.5));
    assert_eq!(on.track, 1);
}

#[test]
fn non_overlapping_pairs_all_survive() {
    let mut track = TrackBuilder::default();
    for i in 0..12u8 {
        track = track.on(10, 2, 50 + i, 80).off(100, 2, 50 + i);
    }
    let bytes = SmfBuilder::ppq(96).track(track).build();
    let config = KeyRangeConfig {
        black_key_mode: BlackKeyMode::SupportBlackKey,
        ..Default::default()
    };
    let analysis = run(&bytes, &AnalyzeOptions::default(), config);

    let ons: Vec<_> = analysis.events.iter().filter(|e| e.is_note_on()).collect();
    let offs: Vec<_> = analysis.events.iter().filter(|e| !e.is_note_on()).collect();
    assert_eq!(ons.len(), 12);
    assert_eq!(offs.len(), 12);
    for (on, off) in ons.iter().zip(&offs) {
        assert_eq!((on.note, on.channel, on.track), (off.note, off.channel, off.track));
        assert_eq!(on.end, Some(off.time));
        // 100 ticks at 96 PPQN, 120 BPM
        let expected = 100.0 * 500_000.0 / (96.0 * 1_000_000.0);
        assert!((on.duration.unwrap() - expected).abs() < 1e-12);
    }
}

#[test]
fn repeated_pitch_pairs_first_in_first_out() {
    let bytes = SmfBuilder::ppq(480)
        .track(
            TrackBuilder::default()
                .on(0, 0, 72, 100)
                .on(480, 0, 72, 50)
                .off(480, 0, 72)
                .off(480, 0, 72),
        )
        .build();
    let analysis = run(&bytes, &AnalyzeOptions::default(), KeyRangeConfig::default());

    let ons: Vec<_> = analysis.events.iter().filter(|e| e.is_note_on()).collect();
    assert_eq!(ons.len(), 2);
    assert_eq!((ons[0].time, ons[0].end, ons[0].velocity), (0.0, Some(1.0), 100));
    assert_eq!((ons[1].time, ons[1].end, ons[1].velocity), (0.5, Some(1.5), 50));
}

#[test]
fn analysis_is_deterministic() {
    let bytes = busy_file();
    let options = AnalyzeOptions {
        shift: Shift::new(3, 0),
        ..Default::default()
    };
    let first = run(&bytes, &options, KeyRangeConfig::default());
    let second = run(&bytes, &options, KeyRangeConfig::default());
    assert_eq!(first, second);
}

#[test]
fn timeline_is_well_ordered() {
    for transpose in [-7, 0, 5] {
        let options = AnalyzeOptions {
            shift: Shift::new(transpose, 0),
            ..Default::default()
        };
        let analysis = run(&busy_file(), &options, KeyRangeConfig::default());
        assert_eq!(analysis.events.len(), 8 * 3 * 2);
        assert!(is_well_ordered(&analysis.events));
        for pair in analysis.events.windows(2) {
            assert!(pair[0].time <= pair[1].time);
            if pair[0].time == pair[1].time {
                assert!(!(pair[0].is_note_on() && !pair[1].is_note_on()));
            }
        }
    }
}

#[test]
fn octave_shift_matches_equivalent_transpose() {
    let bytes = busy_file();
    for transpose in -4..=4 {
        for octave in -2..=2 {
            let a = run(
                &bytes,
                &AnalyzeOptions {
                    shift: Shift::new(transpose, octave),
                    ..Default::default()
                },
                KeyRangeConfig::default(),
            );
            let b = run(
                &bytes,
                &AnalyzeOptions {
                    shift: Shift::new(transpose + 12 * octave, 0),
                    ..Default::default()
                },
                KeyRangeConfig::default(),
            );
            assert_eq!(a.events, b.events);
        }
    }
}

#[test]
fn over_limit_flag_matches_configured_range() {
    let config = KeyRangeConfig {
        min_note: 55,
        max_note: 79,
        black_key_mode: BlackKeyMode::SupportBlackKey,
    };
    for transpose in [-12, 0, 9] {
        let options = AnalyzeOptions {
            shift: Shift::new(transpose, 0),
            ..Default::default()
        };
        let analysis = run(&busy_file(), &options, config);
        for event in &analysis.events {
            assert_eq!(
                event.is_over_limit,
                event.note < config.min_note || event.note > config.max_note,
                "note {}",
                event.note
            );
        }
        let over = analysis.events.iter().filter(|e| e.is_over_limit).count();
        assert_eq!(analysis.summary.total_over_limit_count, over);
    }
}

#[test]
fn hanging_notes_policy_is_honoured() {
    let bytes = SmfBuilder::ppq(480)
        .track(TrackBuilder::default().on(0, 0, 60, 100).on(0, 0, 64, 100).off(480, 0, 64))
        .build();

    let dropped = run(&bytes, &AnalyzeOptions::default(), KeyRangeConfig::default());
    assert_eq!(dropped.events.len(), 2);

    let closing = AnalyzeOptions {
        hanging_notes: HangingNotes::CloseAtTrackEnd,
        ..Default::default()
    };
    let closed = run(&bytes, &closing, KeyRangeConfig::default());
    assert_eq!(closed.events.len(), 4);
    let hanging = closed.events.iter().find(|e| e.note == 60 && e.is_note_on()).unwrap();
    assert_eq!(hanging.end, Some(0.5));
}

#[test]
fn smpte_file_uses_duration_hint() {
    let bytes = SmfBuilder::smpte(25, 40)
        .track(
            TrackBuilder::default()
                .on(0, 0, 60, 100)
                .off(1000, 0, 60)
                .on(0, 0, 62, 100)
                .off(1000, 0, 62),
        )
        .build();

    let hinted = AnalyzeOptions {
        duration_hint: Some(10.0),
        ..Default::default()
    };
    let analysis = run(&bytes, &hinted, KeyRangeConfig::default());
    let times: Vec<f64> = analysis.events.iter().map(|e| e.time).collect();
    assert_eq!(times, vec![0.0, 5.0, 5.0, 10.0]);

    let analysis = run(&bytes, &AnalyzeOptions::default(), KeyRangeConfig::default());
    let expected_end = 2000.0 * 500_000.0 / (480.0 * 1_000_000.0);
    assert_eq!(analysis.events.last().unwrap().time, expected_end);
}

#[test]
fn smpte_timing_ignores_track_selection() {
    let bytes = SmfBuilder::smpte(25, 40)
        .track(TrackBuilder::default().on(0, 0, 60, 100).off(1000, 0, 60))
        .track(TrackBuilder::default().on(0, 0, 64, 100).off(2000, 0, 64))
        .build();

    let everything = AnalyzeOptions {
        duration_hint: Some(10.0),
        ..Default::default()
    };
    let first_only = AnalyzeOptions {
        selected_tracks: BTreeSet::from([0]),
        ..everything.clone()
    };

    let full = run(&bytes, &everything, KeyRangeConfig::default());
    let partial = run(&bytes, &first_only, KeyRangeConfig::default());

    let track0 = |a: &Analysis| -> Vec<(f64, Option<f64>)> {
        a.events
            .iter()
            .filter(|e| e.track == 0)
            .map(|e| (e.time, e.end))
            .collect()
    };
    assert_eq!(track0(&full), vec![(0.0, Some(5.0)), (5.0, None)]);
    assert_eq!(track0(&partial), track0(&full));
}

#[test]
fn tracks_are_listed_with_names() {
    let analysis = run(&busy_file(), &AnalyzeOptions::default(), KeyRangeConfig::default());
    let names: Vec<_> = analysis
        .tracks
        .iter()
        .map(|t| (t.index, t.name.clone(), t.note_count))
        .collect();
    assert_eq!(
        names,
        vec![
            (0, Some("Conductor".to_string()), 0),
            (1, Some("Piano".to_string()), 24),
        ]
    );
}

#[test]
fn analyze_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.mid");
    std::fs::write(&path, single_note_file(67)).unwrap();

    let analysis = analyze_file(&path, &AnalyzeOptions::default(), KeyRangeConfig::default()).unwrap();
    assert_eq!(analysis.events.len(), 2);
    assert_eq!(analysis.summary.max_note_name, "g¹");
}

#[test]
fn missing_file_is_a_distinct_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = analyze_file(
        dir.path().join("absent.mid"),
        &AnalyzeOptions::default(),
        KeyRangeConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    let failed = Analysis::failed(&err, &AnalyzeOptions::default(), KeyRangeConfig::default());
    assert!(failed.events.is_empty());
    assert!(failed.summary.error.unwrap().contains("absent.mid"));
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let mut bytes = single_note_file(60);
    bytes.truncate(10);
    let err = analyze_bytes(&bytes, &AnalyzeOptions::default(), KeyRangeConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MidiParse(_)));
}
