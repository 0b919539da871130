//! Zip packaging of produced audio artifacts.
//!
//! Bundles an ordered set of artifacts into one deflate-compressed archive,
//! each as an entry named by its file name. Duplicate names overwrite
//! silently: the last artifact with a given name wins.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::pipeline::AudioArtifact;

/// File name of the bundle offered for bulk download.
pub const ARCHIVE_NAME: &str = "audio_files.zip";

/// Build a zip archive in memory from the given artifacts.
///
/// Entry bytes are reproducible for a fixed artifact list; archive-level
/// metadata such as timestamps is not guaranteed stable.
pub fn build_archive(artifacts: &[AudioArtifact]) -> Result<Vec<u8>> {
    // Last write wins on name collisions, keeping first-appearance order.
    let mut order: Vec<&str> = Vec::new();
    let mut latest: HashMap<&str, &AudioArtifact> = HashMap::new();
    for artifact in artifacts {
        if latest.insert(artifact.file_name.as_str(), artifact).is_none() {
            order.push(artifact.file_name.as_str());
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for name in &order {
        let artifact = latest[name];
        writer.start_file(artifact.file_name.as_str(), options)?;
        writer.write_all(&artifact.bytes)?;
    }

    let cursor = writer.finish()?;
    debug!("Packaged {} artifacts ({} bytes)", order.len(), cursor.get_ref().len());

    Ok(cursor.into_inner())
}
