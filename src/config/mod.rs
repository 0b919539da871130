//! Configuration module for the batch TTS tool.
//!
//! Provides CLI argument parsing and the voice catalog.

#[allow(clippy::module_inception)]
mod config;
pub mod voices;

pub use config::{AppConfig, Command};
pub use voices::Language;
