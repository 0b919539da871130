//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::voices::{self, Language};

/// Batch text-to-speech configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "words2mp3")]
#[command(author, version, about = "Turn word lists and free text into speech via a neural TTS service", long_about = None)]
pub struct AppConfig {
    /// List all available TTS voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Language of the input text (restricts the voice set)
    #[arg(long, short = 'l', value_enum, default_value = "english")]
    pub language: Language,

    /// TTS voice name (must belong to the selected language; defaults per language)
    #[arg(long)]
    pub voice: Option<String>,

    /// Speech rate as a percentage offset in [-100, 100] (the service UI moves in steps of 10)
    #[arg(long, short = 'r', default_value = "0", allow_hyphen_values = true, value_parser = parse_rate)]
    pub rate: i32,

    /// Directory where audio artifacts are written (created if absent, never cleaned)
    #[arg(long, short = 'o', env = "OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Speech service endpoint (OpenAI-compatible speech route)
    #[arg(long, env = "TTS_ENDPOINT", default_value = "http://localhost:5050/v1/audio/speech")]
    pub endpoint: String,

    /// API key for the speech service, if it requires one
    #[arg(long, env = "TTS_API_KEY")]
    pub api_key: Option<String>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Pipeline mode.
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Read a spreadsheet, synthesize one audio file per group, and bundle them as a zip
    Batch {
        /// Input table: .xlsx, .xls, .ods or .csv with columns [group, text, word, explanation]
        #[arg(default_value = "list.xlsx")]
        file: PathBuf,

        /// Only process these groups (comma separated); all groups when omitted
        #[arg(long, value_delimiter = ',')]
        groups: Vec<String>,

        /// Require and echo the word/explanation columns; groups lacking them are skipped
        #[arg(long)]
        with_gloss: bool,

        /// Read each word this many times in the generated track
        #[arg(long, default_value = "1")]
        repeat: usize,
    },
    /// Synthesize free text, one item per line
    Speak {
        /// Text to synthesize (reads the file, or stdin when neither is given)
        #[arg(long, short = 't', conflicts_with = "file")]
        text: Option<String>,

        /// File containing the text, one item per line
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,

        /// Join all items into a single track with silence gaps instead of per-line files
        #[arg(long)]
        combine: bool,

        /// Silence inserted between items in combine mode, in milliseconds
        #[arg(long, default_value = "1000")]
        gap_ms: u64,
    },
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let config = Self::parse();

        if config.list_voices {
            voices::print_voices();
            std::process::exit(0);
        }

        config
    }

    /// The voice to use: the explicit `--voice` or the language default.
    pub fn effective_voice(&self) -> &str {
        self.voice.as_deref().unwrap_or_else(|| voices::default_voice(self.language))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let voice = self.effective_voice();
        match voices::get_voice(voice) {
            Some(lang) if lang == self.language => {}
            Some(lang) => {
                anyhow::bail!("voice '{}' belongs to the {} set, but --language is {}", voice, lang, self.language)
            }
            None => anyhow::bail!("unknown voice '{}'. Run with --list-voices to see available voices", voice),
        }

        if self.endpoint.trim().is_empty() {
            anyhow::bail!("speech endpoint must not be empty");
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Language: {}", self.language);
        info!("  Voice: {}", self.effective_voice());
        info!("  Rate: {:+}%", self.rate);
        info!("  Output directory: {}", self.output_dir.display());
        info!("  Endpoint: {}", self.endpoint);
    }
}

/// Parse and validate a rate value (-100 to 100).
fn parse_rate(s: &str) -> Result<i32, String> {
    let value: i32 = s.parse().map_err(|_| format!("'{}' is not a valid integer", s))?;
    if (-100..=100).contains(&value) {
        Ok(value)
    } else {
        Err(format!("rate must be between -100 and 100, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_parser_enforces_range() {
        assert_eq!(parse_rate("-30"), Ok(-30));
        assert_eq!(parse_rate("100"), Ok(100));
        assert!(parse_rate("101").is_err());
        assert!(parse_rate("-101").is_err());
        assert!(parse_rate("fast").is_err());
    }

    #[test]
    fn voice_must_match_language() {
        let mut config = AppConfig::parse_from(["words2mp3", "--language", "chinese"]);
        assert_eq!(config.effective_voice(), "zh-CN-YunyangNeural");
        assert!(config.validate().is_ok());

        config.voice = Some("en-US-AriaNeural".to_string());
        assert!(config.validate().is_err());

        config.voice = Some("not-a-voice".to_string());
        assert!(config.validate().is_err());
    }
}
