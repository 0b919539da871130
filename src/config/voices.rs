//! Voice catalog for the neural TTS service.
//!
//! Only the voices the tool exposes are listed, partitioned by language the way
//! the service partitions them. Selection is restricted to the active
//! language's set.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Language of the text being synthesized. Determines which voices are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (US neural voices)
    #[default]
    English,
    /// Mandarin Chinese (zh-CN neural voices)
    Chinese,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Chinese => write!(f, "chinese"),
        }
    }
}

/// All voices as a compile-time constant slice (sorted by name for binary search).
const VOICES: &[(&str, Language)] = &[
    ("en-US-AnaNeural", Language::English),
    ("en-US-AriaNeural", Language::English),
    ("en-US-AvaMultilingualNeural", Language::English),
    ("en-US-ChristopherNeural", Language::English),
    ("en-US-EricNeural", Language::English),
    ("en-US-GuyNeural", Language::English),
    ("en-US-JennyNeural", Language::English),
    ("en-US-MichelleNeural", Language::English),
    ("en-US-RogerNeural", Language::English),
    ("en-US-SteffanNeural", Language::English),
    ("zh-CN-XiaoxiaoNeural", Language::Chinese),
    ("zh-CN-XiaoyiNeural", Language::Chinese),
    ("zh-CN-YunyangNeural", Language::Chinese),
];

/// Look up a voice by name using binary search.
pub fn get_voice(name: &str) -> Option<Language> {
    VOICES.binary_search_by_key(&name, |(n, _)| n).ok().map(|idx| VOICES[idx].1)
}

/// All voice names for the given language, in catalog order.
pub fn voices_for(language: Language) -> impl Iterator<Item = &'static str> {
    VOICES.iter().filter(move |(_, lang)| *lang == language).map(|(name, _)| *name)
}

/// Default voice for a language.
pub fn default_voice(language: Language) -> &'static str {
    match language {
        Language::English => "en-US-AriaNeural",
        Language::Chinese => "zh-CN-YunyangNeural",
    }
}

/// Print all available voices grouped by language.
pub fn print_voices() {
    println!("Available voices");
    println!("{}", "─".repeat(40));

    for lang in [Language::English, Language::Chinese] {
        let count = voices_for(lang).count();
        println!("\n── {} ({} voices) ──", lang, count);
        for name in voices_for(lang) {
            if name == default_voice(lang) {
                println!("{name}  (default)");
            } else {
                println!("{name}");
            }
        }
    }

    println!();
    println!("Usage:");
    println!("  words2mp3 --language chinese --voice zh-CN-XiaoxiaoNeural ...");
}
