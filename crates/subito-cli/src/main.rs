//! subito - generate rehearsal part files from multi-track scores

use anyhow::{bail, Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use subito::{Registry, Session};
use subito_conf::SubitoConfig;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod pipeline;
mod prompt;
mod tools;
mod walk;

use pipeline::{FileReport, PipelineOptions};
use prompt::TerminalPrompter;
use tools::Toolchain;

/// Generate one rehearsal file per part from each score.
///
/// Each output solos one part: its track is brought to the foreground
/// volume and switched to the part's rehearsal sound, every other track
/// is pushed to the background.
#[derive(Parser, Debug)]
#[command(name = "subito", version, about, long_about = None)]
struct Args {
    /// Score file, or directory to search for scores
    #[arg(default_value = ".")]
    source: PathBuf,

    /// Directory for the generated part files
    #[arg(default_value = ".")]
    destdir: PathBuf,

    /// Layout to prefer when several match a score
    #[arg(short, long)]
    layout: Option<String>,

    /// Config file replacing ./subito.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Inputs are MuseScore files (implied by a .mscz source)
    #[arg(short, long)]
    musescore: bool,

    /// Also render each part file to MP3
    #[arg(long)]
    mp3: bool,

    /// File name pattern for directory sources (`*` and `?`)
    #[arg(short, long, default_value = "*")]
    filter: String,
}

#[derive(Debug, Default)]
struct Summary {
    processed: usize,
    skipped: usize,
    failed: usize,
    written: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.source.exists() {
        bail!("Input path does not exist: {}", args.source.display());
    }

    let (mut config, sources) = SubitoConfig::load_with_sources_from(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(layout) = &args.layout {
        config.settings.set_layout_priority(layout);
    }

    init_logging(&config.settings.log_level, args.verbose);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    let mut prompter = TerminalPrompter::new();
    let registry = if prompter.is_interactive() {
        Registry::from_entries_with(&config.parts, &config.layouts, &mut prompter)?
    } else {
        Registry::from_entries(&config.parts, &config.layouts)
    };
    info!(
        parts = registry.part_count(),
        layouts = registry.layout_count(),
        "registry ready"
    );

    let tools = Toolchain::new(config.tools.clone());
    let mut session = Session::new(registry, config.settings.clone(), prompter);
    if let Some(priority) = session.resolve_priority()? {
        info!(priority, "layout priority");
    }

    let options = PipelineOptions {
        musescore: args.musescore || has_extension(&args.source, "mscz"),
        mp3: args.mp3,
    };
    let extension = if options.musescore { ".mscz" } else { ".mid" };

    std::fs::create_dir_all(&args.destdir)
        .with_context(|| format!("Failed to create {}", args.destdir.display()))?;
    let scores = walk::collect_sources(&args.source, &args.destdir, &args.filter, extension)?;
    if scores.is_empty() {
        info!(source = %args.source.display(), "no scores found");
    }

    let mut summary = Summary::default();
    for source in &scores {
        info!(path = %source.path.display(), "processing");
        match pipeline::process_file(&mut session, &tools, source, options) {
            Ok(FileReport::Skipped) => summary.skipped += 1,
            Ok(FileReport::Written(files)) => {
                summary.processed += 1;
                summary.written += files.len();
            }
            Err(e) if is_abort(&e) => {
                return Err(e.context(format!("Stopped at {}", source.path.display())));
            }
            Err(e) => {
                error!(path = %source.path.display(), "{:#}", e);
                summary.failed += 1;
            }
        }
    }

    print_summary(&summary);

    if summary.failed > 0 {
        bail!("{} file(s) failed", summary.failed);
    }
    Ok(())
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        // RUST_LOG is already folded into the configured level
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

fn is_abort(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<subito::Error>(),
        Some(subito::Error::Aborted(_))
    )
}

fn print_summary(summary: &Summary) {
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        written = summary.written,
        "run complete"
    );

    let failed = summary.failed.to_string();
    println!(
        "{} {} processed, {} already processed, {} failed, {} part files written",
        "Done:".bright_cyan(),
        summary.processed.bright_green(),
        summary.skipped.yellow(),
        if summary.failed > 0 {
            failed.bright_red().to_string()
        } else {
            failed
        },
        summary.written.bright_green()
    );
}
