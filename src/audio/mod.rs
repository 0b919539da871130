//! Audio decoding and track assembly.

mod assembler;

pub use assembler::{SILENCE_GAP_MS, assemble, decode_segment, duration_ms, encode_wav};
