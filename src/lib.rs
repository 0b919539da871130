//! Batch text-to-speech pipeline.
//!
//! Turns tabular word lists and free text into audio artifacts via a remote
//! neural TTS service: load → group → synthesize → assemble → package. The
//! presentation layer (whatever form or page hosts the run) only passes
//! parameters in and receives artifacts and a [`pipeline::RunReport`] back.

pub mod archive;
pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sheet;
pub mod tts;
