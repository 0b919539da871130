//! Audio assembly: decoding synthesized segments and concatenating them.
//!
//! Segments come back from the TTS service as compressed audio (usually MP3).
//! For the combined track they are decoded to mono PCM, joined strictly in
//! input order with a fixed silence gap between consecutive segments, and
//! written out as one 16-bit WAV track. Any segment that fails to decode
//! aborts the whole assembly; no partial track is emitted.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{Error, Result};

/// Silence inserted between consecutive segments in the combined track.
pub const SILENCE_GAP_MS: u64 = 1000;

/// Decode one audio segment to mono f32 samples and its sample rate.
///
/// Multi-channel segments are mixed down by averaging. Supports the container
/// formats the service produces (MP3, WAV/PCM).
///
/// # Errors
/// Returns `Error::Decode` if the bytes are not valid audio.
pub fn decode_segment(bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("unrecognized audio segment: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("segment has no audio track".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("segment does not declare a sample rate".to_string()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("cannot create decoder: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // Demuxers report a clean end of stream as UnexpectedEof with
            // this exact message; a truncated payload carries a different one.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof && e.to_string() == "end of stream" =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::Decode(format!("truncated or corrupt segment: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| Error::Decode(format!("corrupt audio packet: {}", e)))?;
        let spec = *decoded.spec();
        let channels = spec.channels.count();

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        if channels <= 1 {
            samples.extend_from_slice(buf.samples());
        } else {
            // Mix down to mono by averaging channels
            samples.extend(buf.samples().chunks(channels).map(|frame| frame.iter().sum::<f32>() / channels as f32));
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode("segment contains no audio".to_string()));
    }

    Ok((samples, sample_rate))
}

/// Concatenate segments in input order with `gap_ms` of silence between
/// consecutive segments, producing one WAV track.
///
/// # Errors
/// Returns `Error::Decode` if the segment list is empty, any segment is not
/// valid audio, or the segments disagree on sample rate.
pub fn assemble(segments: &[Vec<u8>], gap_ms: u64) -> Result<Vec<u8>> {
    if segments.is_empty() {
        return Err(Error::Decode("nothing to assemble: no segments".to_string()));
    }

    let mut track: Vec<f32> = Vec::new();
    let mut rate: Option<u32> = None;

    for (i, segment) in segments.iter().enumerate() {
        let (samples, sample_rate) = decode_segment(segment)?;

        match rate {
            None => rate = Some(sample_rate),
            Some(expected) if expected != sample_rate => {
                return Err(Error::Decode(format!(
                    "segment {} has sample rate {} Hz, expected {} Hz",
                    i, sample_rate, expected
                )));
            }
            Some(_) => {}
        }

        if i > 0 {
            let gap_samples = (gap_ms * sample_rate as u64 / 1000) as usize;
            track.resize(track.len() + gap_samples, 0.0);
        }
        track.extend(samples);
    }

    let rate = rate.expect("at least one segment was decoded");
    debug!("Assembled {} segments into {} samples at {} Hz", segments.len(), track.len(), rate);

    encode_wav(&track, rate)
}

/// Encode mono f32 samples as a 16-bit PCM WAV byte stream.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Decode(format!("wav write: {}", e)))?;
    for &sample in samples {
        // Scale by 2^15 so a decode/encode cycle is sample-exact
        let value = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(|e| Error::Decode(format!("wav write: {}", e)))?;
    }
    writer.finalize().map_err(|e| Error::Decode(format!("wav write: {}", e)))?;

    Ok(cursor.into_inner())
}

/// Track duration in milliseconds for a mono sample count.
pub fn duration_ms(sample_count: usize, sample_rate: u32) -> u64 {
    sample_count as u64 * 1000 / sample_rate as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 24000;

    /// A short constant-amplitude WAV segment of the given duration.
    fn segment(ms: u64, amplitude: f32) -> Vec<u8> {
        let samples = vec![amplitude; (ms * RATE as u64 / 1000) as usize];
        encode_wav(&samples, RATE).unwrap()
    }

    #[test]
    fn decode_recovers_sample_count_and_rate() {
        let (samples, rate) = decode_segment(&segment(100, 0.25)).unwrap();
        assert_eq!(rate, RATE);
        assert_eq!(samples.len(), 2400);
    }

    #[test]
    fn combined_duration_is_sum_of_segments_plus_gaps() {
        // Three items joined with 1000 ms silence -> two gaps.
        let segments = vec![segment(100, 0.2), segment(150, 0.4), segment(50, 0.6)];
        let track = assemble(&segments, SILENCE_GAP_MS).unwrap();

        let (samples, rate) = decode_segment(&track).unwrap();
        assert_eq!(duration_ms(samples.len(), rate), 100 + 150 + 50 + 2 * 1000);
    }

    #[test]
    fn concatenation_is_ordered_not_commutative() {
        let a = segment(100, 0.2);
        let b = segment(100, 0.8);
        assert_ne!(assemble(&[a.clone(), b.clone()], 1000).unwrap(), assemble(&[b, a], 1000).unwrap());
    }

    #[test]
    fn concatenation_is_associative_in_effect() {
        let (a, b, c) = (segment(40, 0.2), segment(60, 0.5), segment(80, 0.7));

        let flat = assemble(&[a.clone(), b.clone(), c.clone()], 1000).unwrap();
        let ab = assemble(&[a, b], 1000).unwrap();
        let nested = assemble(&[ab, c], 1000).unwrap();

        assert_eq!(flat, nested);
    }

    #[test]
    fn truncated_segment_is_rejected() {
        // Valid header, payload cut short: must not yield a partial track.
        let full = segment(100, 0.25);
        let truncated = full[..full.len() / 2].to_vec();

        assert!(matches!(decode_segment(&truncated), Err(Error::Decode(_))));
        assert!(matches!(assemble(&[segment(100, 0.2), truncated], 1000), Err(Error::Decode(_))));
    }

    #[test]
    fn invalid_segment_aborts_the_whole_assembly() {
        let segments = vec![segment(100, 0.2), b"not audio at all".to_vec()];
        assert!(matches!(assemble(&segments, 1000), Err(Error::Decode(_))));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(assemble(&[], 1000), Err(Error::Decode(_))));
    }

    #[test]
    fn mismatched_sample_rates_are_rejected() {
        let a = segment(100, 0.2);
        let b = encode_wav(&vec![0.3; 1600], 16000).unwrap();
        assert!(matches!(assemble(&[a, b], 1000), Err(Error::Decode(_))));
    }
}
