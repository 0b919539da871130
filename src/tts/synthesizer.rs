//! Speech synthesizer adapter.
//!
//! Wraps one outbound HTTP call per request against an OpenAI-compatible
//! speech route that accepts neural voice names and an edge-style rate
//! offset. Every call is a fresh round trip: no caching, no automatic retry,
//! one request in flight at a time.

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};

/// One synthesis request: the text, a voice from the catalog, and a rate
/// offset in [-100, 100].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub rate: i32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>, rate: i32) -> Self {
        Self { text: text.into(), voice: voice.into(), rate }
    }

    /// The rate as the signed percentage string the service expects ("+10%", "-30%").
    pub fn rate_string(&self) -> String {
        format_rate(self.rate)
    }
}

/// Serialize a rate offset as a signed percentage string.
pub fn format_rate(rate: i32) -> String {
    format!("{:+}%", rate)
}

/// Parse a rate string back to its integer value. Accepts an optional sign
/// and a trailing percent.
pub fn parse_rate(s: &str) -> Option<i32> {
    s.trim().strip_suffix('%').unwrap_or(s.trim()).parse().ok()
}

/// Abstraction over the remote speech service, so the pipeline can be
/// exercised without a network.
pub trait SpeechService {
    /// Perform one synthesis call and return the audio bytes.
    ///
    /// # Errors
    /// * `Error::NoAudio` - the service produced no audio for this text
    /// * `Error::InvalidParameter` - the voice or rate was rejected
    /// * `Error::Synthesis` - transport or other service failure
    fn synthesize(&self, request: &SynthesisRequest) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTP adapter for the speech service.
pub struct Synthesizer {
    client: reqwest::Client, // Shared HTTP client
    endpoint: String,        // Speech route URL
    api_key: Option<String>, // Optional bearer token
}

impl Synthesizer {
    /// Create a new synthesizer against the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), endpoint: endpoint.into(), api_key }
    }
}

impl SpeechService for Synthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        debug!("Synthesizing \"{}\" with {} at {}", request.text, request.voice, request.rate_string());

        let body = json!({
            "input": request.text,
            "voice": request.voice,
            "rate": request.rate_string(),
            "response_format": "mp3",
        });

        let mut http = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await?;
        let status = response.status();

        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err(Error::InvalidParameter(format!("{} (status {})", detail.trim(), status)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err(Error::Synthesis(format!("{} (status {})", detail.trim(), status)));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::NoAudio(request.text.clone()));
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_is_serialized_with_explicit_sign() {
        assert_eq!(format_rate(0), "+0%");
        assert_eq!(format_rate(10), "+10%");
        assert_eq!(format_rate(-30), "-30%");
        assert_eq!(format_rate(-100), "-100%");
    }

    #[test]
    fn rate_round_trips_across_the_whole_range() {
        for rate in -100..=100 {
            assert_eq!(parse_rate(&format_rate(rate)), Some(rate));
        }
    }

    #[test]
    fn parse_accepts_bare_and_unsigned_forms() {
        assert_eq!(parse_rate("10"), Some(10));
        assert_eq!(parse_rate("-30"), Some(-30));
        assert_eq!(parse_rate(" +20% "), Some(20));
        assert_eq!(parse_rate("fast"), None);
    }

    #[test]
    fn request_carries_its_rate_string() {
        let request = SynthesisRequest::new("hello", "en-US-AriaNeural", -30);
        assert_eq!(request.rate_string(), "-30%");
    }
}
