//! words2mp3 - batch text-to-speech from word lists and free text.
//!
//! Reads a spreadsheet (grouped word lists) or free text, synthesizes speech
//! through a neural TTS service, and writes per-item audio files, an optional
//! combined track, and a zip bundle to the output directory.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use words2mp3::config::{AppConfig, Command};
use words2mp3::pipeline::{self, BatchOptions, RunReport, TextMode};
use words2mp3::sheet;
use words2mp3::tts::Synthesizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .unwrap();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🔉 words2mp3 v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    let Some(command) = config.command.clone() else {
        error!("❌ No command given. Use 'batch' or 'speak' (see --help)");
        std::process::exit(2);
    };

    config.log_config();

    let synthesizer = Synthesizer::new(&config.endpoint, config.api_key.clone());
    let voice = config.effective_voice();

    let report = match command {
        Command::Batch { file, groups, with_gloss, repeat } => {
            let table = sheet::load_table(&file)?;
            let grouped = sheet::group_rows(table.rows);
            info!("Loaded {} groups from {}", grouped.len(), file.display());

            let options = BatchOptions { groups, with_gloss, repeat };
            pipeline::run_batch(&synthesizer, voice, config.rate, &grouped, &options, &config.output_dir).await?
        }
        Command::Speak { text, file, combine, gap_ms } => {
            let input = read_text_input(text, file).await?;
            if input.trim().is_empty() {
                warn!("⚠️  No input text, nothing to do");
                return Ok(());
            }

            let mode = if combine { TextMode::Combine { gap_ms } } else { TextMode::PerLine };
            pipeline::run_text(&synthesizer, voice, config.rate, &input, mode, &config.output_dir).await?
        }
    };

    summarize(&report);
    Ok(())
}

/// Resolve the free-text input: inline text, a file, or stdin.
async fn read_text_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return Ok(tokio::fs::read_to_string(&path).await?);
    }
    info!("Reading text from stdin (one item per line, Ctrl+D to finish)");
    Ok(std::io::read_to_string(std::io::stdin())?)
}

/// Log the run outcome the way the host page would present it.
fn summarize(report: &RunReport) {
    if report.artifacts.is_empty() {
        warn!("⚠️  No audio was produced, check the input");
        return;
    }

    info!("✅ Produced {} audio file(s)", report.artifacts.len());
    for skipped in &report.skipped {
        warn!("⚠️  Skipped '{}': {}", skipped.name, skipped.reason);
    }
    if let Some(archive) = &report.archive {
        info!("📦 Bundle ready for download: {}", archive.display());
    }
}
