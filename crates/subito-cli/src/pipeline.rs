//! Per-file processing: score -> text -> session -> part files.

use crate::tools::Toolchain;
use crate::walk::Source;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use subito::{output_file_name, Outcome, Prompter, Session};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Inputs are notation files that need rendering to MIDI first.
    pub musescore: bool,
    /// Also render each part file to MP3.
    pub mp3: bool,
}

/// What happened to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReport {
    Skipped,
    Written(Vec<PathBuf>),
}

/// Run one source through the converters and the session.
///
/// The intermediate MIDI lives in a temp dir removed before the session
/// runs. Engine errors pass through unwrapped so callers can tell an
/// operator abort from a failed file.
pub fn process_file<P: Prompter>(
    session: &mut Session<P>,
    tools: &Toolchain,
    source: &Source,
    options: PipelineOptions,
) -> Result<FileReport> {
    let text = prepare(tools, source, options)?;

    let score = source.stem();
    let outcome = session.process(&score, &text)?;

    write_parts(tools, source, &score, outcome, options)
}

fn prepare(tools: &Toolchain, source: &Source, options: PipelineOptions) -> Result<String> {
    let scratch = tempfile::tempdir().context("Failed to create temp dir")?;
    let midi = scratch.path().join("score.mid");

    if options.musescore {
        tools.render_score(&source.path, &midi)?;
    } else {
        fs::copy(&source.path, &midi)
            .with_context(|| format!("Failed to copy {}", source.path.display()))?;
    }

    tools.midi_to_text(&midi)
}

fn write_parts(
    tools: &Toolchain,
    source: &Source,
    score: &str,
    outcome: Outcome,
    options: PipelineOptions,
) -> Result<FileReport> {
    let parts = match outcome {
        Outcome::AlreadyProcessed => return Ok(FileReport::Skipped),
        Outcome::Rendered { parts, .. } => parts,
    };

    fs::create_dir_all(&source.out_dir)
        .with_context(|| format!("Failed to create {}", source.out_dir.display()))?;

    let mut written = Vec::with_capacity(parts.len());
    for part in parts {
        let midi = source.out_dir.join(output_file_name(score, &part.label));
        tools
            .text_to_midi(&part.events.render(), &midi)
            .with_context(|| format!("Failed to write part `{}`", part.label))?;
        info!(part = %part.label, path = %midi.display(), "wrote part");

        if options.mp3 {
            let mp3 = midi.with_extension("mp3");
            tools.render_audio(&midi, &mp3)?;
            written.push(mp3);
        }
        written.push(midi);
    }

    Ok(FileReport::Written(written))
}
