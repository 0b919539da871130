//! Text-to-speech adapter for the remote neural service.

mod synthesizer;

pub use synthesizer::{SpeechService, SynthesisRequest, Synthesizer, format_rate, parse_rate};
