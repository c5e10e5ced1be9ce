//! CLI command implementations

use anyhow::{Context, Result};
use keyconf::{ConfigSources, KeyrollConfig};
use midi_timeline::{
    analyze_file, filter_by_groups, list_tracks, note_name, to_json, write_csv, Analysis,
    Group, MidiDocument, Summary, TimedEvent,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::args::AnalysisArgs;
use crate::ExportFormat;

/// Run the analyzer and apply the CLI-side event filters.
fn run_analysis(path: &Path, args: &AnalysisArgs, config: &KeyrollConfig) -> Result<Analysis> {
    let options = args.to_options(config.analysis.hanging_notes);
    let analysis = analyze_file(path, &options, config.key_settings.range())
        .with_context(|| format!("Failed to analyze {}", path.display()))?;
    Ok(apply_filters(analysis, args))
}

fn apply_filters(mut analysis: Analysis, args: &AnalysisArgs) -> Analysis {
    if !args.groups.is_empty() {
        analysis.events = filter_by_groups(&analysis.events, &args.groups);
    }
    if args.over_limit_only {
        analysis.events.retain(|e| e.is_over_limit);
    }
    analysis
}

/// Write the analysis as JSON. A failed analysis still produces a document,
/// with no events and `summary.error` set, before the error is returned.
fn write_json_report(
    out: &mut impl Write,
    path: &Path,
    args: &AnalysisArgs,
    config: &KeyrollConfig,
) -> Result<()> {
    let options = args.to_options(config.analysis.hanging_notes);
    let range = config.key_settings.range();
    match analyze_file(path, &options, range) {
        Ok(analysis) => {
            writeln!(out, "{}", to_json(&apply_filters(analysis, args))?)?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "{}", to_json(&Analysis::failed(&e, &options, range))?)?;
            Err(e).with_context(|| format!("Failed to analyze {}", path.display()))
        }
    }
}

pub fn analyze(path: &Path, args: &AnalysisArgs, json: bool, config: &KeyrollConfig) -> Result<()> {
    if json {
        return write_json_report(&mut std::io::stdout().lock(), path, args, config);
    }

    let analysis = run_analysis(path, args, config)?;
    let mut out = std::io::stdout().lock();
    print_summary(&mut out, &analysis.summary)?;
    writeln!(out)?;
    print_events(&mut out, &analysis.events)?;
    Ok(())
}

fn print_summary(out: &mut impl Write, summary: &Summary) -> Result<()> {
    writeln!(
        out,
        "Range:      {} ({}) .. {} ({})",
        summary.min_note_name, summary.min_note_group, summary.max_note_name, summary.max_note_group
    )?;
    writeln!(
        out,
        "Playable:   {} .. {} [{}]",
        note_name(summary.config_min_note),
        note_name(summary.config_max_note),
        summary.black_key_mode
    )?;
    writeln!(
        out,
        "Shift:      {:+} semitones, {:+} octaves",
        summary.transpose, summary.octave_shift
    )?;
    writeln!(
        out,
        "Over limit: {} events ({} below, {} above)",
        summary.total_over_limit_count, summary.under_min_count, summary.over_max_count
    )?;
    Ok(())
}

fn print_events(out: &mut impl Write, events: &[TimedEvent]) -> Result<()> {
    writeln!(
        out,
        "{:>10}  {:<8}  {:<6}  {:>5}  {:>3}  {:>3}",
        "time", "type", "note", "track", "ch", "vel"
    )?;
    for event in events {
        writeln!(
            out,
            "{:>10.3}  {:<8}  {:<6}  {:>5}  {:>3}  {:>3}  {}",
            event.time,
            event.kind.as_str(),
            note_name(event.note),
            event.track,
            event.channel,
            event.velocity,
            if event.is_over_limit { "!" } else { "" }
        )?;
    }
    Ok(())
}

pub fn tracks(path: &Path, all: bool, config: &KeyrollConfig) -> Result<()> {
    let doc = MidiDocument::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let threshold = config.analysis.min_track_notes;

    let listed: Vec<_> = list_tracks(&doc)
        .into_iter()
        .filter(|t| all || t.note_count >= threshold)
        .collect();

    println!("{:>5}  {:>6}  name", "track", "notes");
    for track in &listed {
        println!(
            "{:>5}  {:>6}  {}",
            track.index,
            track.note_count,
            track.name.as_deref().unwrap_or("-")
        );
    }

    let hidden = doc.track_count() - listed.len();
    if hidden > 0 {
        println!("({hidden} tracks with fewer than {threshold} notes hidden; use --all)");
    }
    Ok(())
}

pub fn export(
    path: &Path,
    args: &AnalysisArgs,
    output: &Path,
    format: ExportFormat,
    config: &KeyrollConfig,
) -> Result<()> {
    let analysis = run_analysis(path, args, config)?;

    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Csv => write_csv(&analysis.events, &mut writer)?,
        ExportFormat::Json => {
            writer.write_all(to_json(&analysis)?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    info!(
        output = %output.display(),
        format = ?format,
        events = analysis.events.len(),
        "Exported timeline"
    );
    Ok(())
}

pub fn groups() -> Result<()> {
    for group in Group::ALL {
        let (lo, hi) = group.range();
        println!(
            "{:<22} {:>3}..={:<3}  {} .. {}",
            group.label(),
            lo,
            hi,
            note_name(lo),
            note_name(hi)
        );
    }
    Ok(())
}

pub fn show_config(config: &KeyrollConfig, sources: &ConfigSources) -> Result<()> {
    if sources.files.is_empty() {
        println!("# No config files found, using defaults");
    }
    for file in &sources.files {
        println!("# Loaded: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# Env override: {var}");
    }
    println!();
    print!("{}", config.to_toml());
    Ok(())
}
