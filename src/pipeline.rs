//! Pipeline orchestration: load → group → synthesize → assemble → package.
//!
//! Each run owns the artifacts it produces and writes them to an explicit,
//! run-scoped output directory (created if absent, never cleaned). Items are
//! processed strictly one after another; a failure on one item is reported
//! and never blocks its siblings, while read errors abort the whole run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::archive::{ARCHIVE_NAME, build_archive};
use crate::audio;
use crate::error::{Error, Result};
use crate::sheet::Group;
use crate::tts::{SpeechService, SynthesisRequest};

/// MIME type presentation layers should serve audio artifacts with.
pub const MIME_AUDIO: &str = "audio/mpeg";
/// MIME type for the zip bundle.
pub const MIME_ZIP: &str = "application/zip";

/// A produced audio blob plus its source text, owned by the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// File name the artifact is written and archived under.
    pub file_name: String,
    /// The text that was synthesized.
    pub source_text: String,
    /// Audio bytes as returned by the synthesizer or assembler.
    pub bytes: Vec<u8>,
}

/// An item the run skipped, with the reason reported to the user.
#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub name: String,
    pub reason: String,
}

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Artifacts produced, in processing order.
    pub artifacts: Vec<AudioArtifact>,
    /// Items skipped with their reasons.
    pub skipped: Vec<SkippedItem>,
    /// Path of the zip bundle, when one was written.
    pub archive: Option<PathBuf>,
}

/// Options for a spreadsheet batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Only process these groups; empty means all.
    pub groups: Vec<String>,
    /// Require the word/explanation columns and echo them per row.
    pub with_gloss: bool,
    /// Read each word this many times.
    pub repeat: usize,
}

/// Free-text mode: independent per-line artifacts, or one combined track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    PerLine,
    Combine { gap_ms: u64 },
}

/// Synthesize one audio file per group and bundle the results as a zip.
pub async fn run_batch<S: SpeechService>(
    service: &S,
    voice: &str,
    rate: i32,
    groups: &[Group],
    options: &BatchOptions,
    output_dir: &Path,
) -> Result<RunReport> {
    tokio::fs::create_dir_all(output_dir).await?;

    let mut report = RunReport::default();
    let repeat = options.repeat.max(1);

    for group in groups {
        if !options.groups.is_empty() && !options.groups.iter().any(|g| g == &group.name) {
            continue;
        }

        if options.with_gloss && !group.has_full_schema() {
            warn!("⚠️  Group '{}' is missing word/explanation columns, skipping", group.name);
            report.skipped.push(SkippedItem {
                name: group.name.clone(),
                reason: "missing word/explanation columns".to_string(),
            });
            continue;
        }

        let text = group_text(group, repeat);
        if text.is_empty() {
            warn!("⚠️  Group '{}' has no text to synthesize, skipping", group.name);
            report.skipped.push(SkippedItem { name: group.name.clone(), reason: "no text".to_string() });
            continue;
        }

        let request = SynthesisRequest::new(text, voice, rate);
        let file_name = format!("{}.mp3", sanitize_file_name(&group.name));

        match service.synthesize(&request).await {
            Ok(bytes) => {
                tokio::fs::write(output_dir.join(&file_name), &bytes).await?;
                info!("🔊 Group '{}' -> {} ({} bytes)", group.name, file_name, bytes.len());

                if options.with_gloss {
                    for row in &group.rows {
                        if let (Some(word), Some(gloss)) = (&row.word, &row.gloss) {
                            info!("   {} — {}", word, gloss);
                        }
                    }
                }

                report.artifacts.push(AudioArtifact { file_name, source_text: request.text, bytes });
            }
            Err(e) => report_item_failure(&mut report, &group.name, e)?,
        }
    }

    if !report.artifacts.is_empty() {
        let archive_path = output_dir.join(ARCHIVE_NAME);
        let archive_bytes = build_archive(&report.artifacts)?;
        tokio::fs::write(&archive_path, &archive_bytes).await?;
        info!("📦 Wrote {} ({} entries)", archive_path.display(), report.artifacts.len());
        report.archive = Some(archive_path);
    }

    Ok(report)
}

/// Synthesize free text, one item per non-empty line.
pub async fn run_text<S: SpeechService>(
    service: &S,
    voice: &str,
    rate: i32,
    text: &str,
    mode: TextMode,
    output_dir: &Path,
) -> Result<RunReport> {
    tokio::fs::create_dir_all(output_dir).await?;

    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    let mut report = RunReport::default();

    match mode {
        TextMode::PerLine => {
            let mut used_names: HashSet<String> = HashSet::new();
            for (i, line) in lines.iter().enumerate() {
                let request = SynthesisRequest::new(*line, voice, rate);
                let base = sanitize_file_name(line);
                let mut file_name = format!("{}.mp3", base);
                if !used_names.insert(file_name.clone()) {
                    // Duplicate lines keep distinct files.
                    file_name = format!("{}_{:02}.mp3", base, i + 1);
                    used_names.insert(file_name.clone());
                }

                match service.synthesize(&request).await {
                    Ok(bytes) => {
                        tokio::fs::write(output_dir.join(&file_name), &bytes).await?;
                        info!("🔊 \"{}\" -> {}", line, file_name);
                        report.artifacts.push(AudioArtifact { file_name, source_text: request.text, bytes });
                    }
                    Err(e) => report_item_failure(&mut report, line, e)?,
                }
            }

            if !report.artifacts.is_empty() {
                let archive_path = output_dir.join(ARCHIVE_NAME);
                tokio::fs::write(&archive_path, build_archive(&report.artifacts)?).await?;
                report.archive = Some(archive_path);
            }
        }
        TextMode::Combine { gap_ms } => {
            let mut segments: Vec<Vec<u8>> = Vec::new();
            let mut sources: Vec<&str> = Vec::new();

            for line in &lines {
                let request = SynthesisRequest::new(*line, voice, rate);
                match service.synthesize(&request).await {
                    Ok(bytes) => {
                        segments.push(bytes);
                        sources.push(line);
                    }
                    Err(e) => report_item_failure(&mut report, line, e)?,
                }
            }

            if segments.is_empty() {
                warn!("⚠️  Nothing was synthesized, no combined track written");
                return Ok(report);
            }

            let track = audio::assemble(&segments, gap_ms)?;
            let file_name = "combined.wav".to_string();
            tokio::fs::write(output_dir.join(&file_name), &track).await?;
            info!("🔊 Combined {} items into {} ({} bytes)", segments.len(), file_name, track.len());

            report.artifacts.push(AudioArtifact {
                file_name,
                source_text: sources.join("\n"),
                bytes: track,
            });
        }
    }

    Ok(report)
}

/// Join a group's texts, repeating each `repeat` times.
fn group_text(group: &Group, repeat: usize) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(group.rows.len() * repeat);
    for row in &group.rows {
        if row.text.is_empty() {
            continue;
        }
        for _ in 0..repeat {
            parts.push(&row.text);
        }
    }
    parts.join(" ")
}

/// Record a per-item failure and continue, or propagate run-fatal errors.
fn report_item_failure(report: &mut RunReport, name: &str, error: Error) -> Result<()> {
    match &error {
        Error::NoAudio(text) => warn!("⚠️  No audio received for \"{}\", skipping", text),
        Error::InvalidParameter(detail) => error!("❌ Parameter rejected for '{}': {}", name, detail),
        Error::Synthesis(detail) => error!("❌ Synthesis failed for '{}': {}", name, detail),
        Error::Http(e) => error!("❌ Request failed for '{}': {}", name, e),
        // Anything else (IO, decode, archive) is fatal to the run
        _ => return Err(error),
    }
    report.skipped.push(SkippedItem { name: name.to_string(), reason: error.to_string() });
    Ok(())
}

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex"));

/// Replace non-alphanumeric runs with underscores for use in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized = NON_ALNUM.replace_all(name.trim(), "_").to_string();
    if sanitized.chars().all(|c| c == '_') { "untitled".to_string() } else { sanitized }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    use crate::sheet::{Row, group_rows};

    const RATE: u32 = 24000;

    /// In-process stand-in for the speech service. Returns a 100 ms WAV tone
    /// per request; text containing "quiet" yields `NoAudio`, voice "broken"
    /// is rejected as an invalid parameter.
    struct FakeSpeech {
        texts: Mutex<Vec<String>>,
    }

    impl FakeSpeech {
        fn new() -> Self {
            Self { texts: Mutex::new(Vec::new()) }
        }
    }

    impl SpeechService for FakeSpeech {
        async fn synthesize(&self, request: &SynthesisRequest) -> crate::error::Result<Vec<u8>> {
            self.texts.lock().unwrap().push(request.text.clone());
            if request.text.contains("quiet") {
                return Err(Error::NoAudio(request.text.clone()));
            }
            if request.voice == "broken" {
                return Err(Error::InvalidParameter("unknown voice".to_string()));
            }
            Ok(audio::encode_wav(&vec![0.25; (RATE / 10) as usize], RATE).unwrap())
        }
    }

    fn row(key: &str, text: &str) -> Row {
        Row { key: key.to_string(), text: text.to_string(), word: None, gloss: None }
    }

    fn zip_entry_names(path: &Path) -> Vec<String> {
        let bytes = std::fs::read(path).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn batch_produces_one_artifact_per_group_and_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_rows(vec![row("fruits", "apple"), row("fruits", "banana"), row("animals", "cat")]);

        let report = run_batch(&FakeSpeech::new(), "en-US-AriaNeural", 0, &groups, &BatchOptions::default(), dir.path())
            .await
            .unwrap();

        let names: Vec<&str> = report.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["fruits.mp3", "animals.mp3"]);
        assert!(dir.path().join("fruits.mp3").exists());
        assert!(dir.path().join("animals.mp3").exists());

        let mut entries = zip_entry_names(&report.archive.unwrap());
        entries.sort();
        assert_eq!(entries, ["animals.mp3", "fruits.mp3"]);
    }

    #[tokio::test]
    async fn batch_joins_group_words_with_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_rows(vec![row("g", "apple"), row("g", "banana")]);
        let service = FakeSpeech::new();
        let options = BatchOptions { repeat: 3, ..Default::default() };

        run_batch(&service, "en-US-AriaNeural", 0, &groups, &options, dir.path()).await.unwrap();

        let texts = service.texts.lock().unwrap();
        assert_eq!(texts.as_slice(), ["apple apple apple banana banana banana"]);
    }

    #[tokio::test]
    async fn group_without_full_schema_is_skipped_when_gloss_required() {
        let dir = tempfile::tempdir().unwrap();
        let mut complete = row("fruits", "apple");
        complete.word = Some("apple".to_string());
        complete.gloss = Some("a fruit".to_string());
        let groups = group_rows(vec![complete, row("animals", "cat")]);
        let options = BatchOptions { with_gloss: true, ..Default::default() };

        let report = run_batch(&FakeSpeech::new(), "en-US-AriaNeural", 0, &groups, &options, dir.path()).await.unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].file_name, "fruits.mp3");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "animals");
    }

    #[tokio::test]
    async fn no_audio_skips_the_item_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_rows(vec![row("a", "quiet please"), row("b", "hello")]);

        let report = run_batch(&FakeSpeech::new(), "en-US-AriaNeural", 0, &groups, &BatchOptions::default(), dir.path())
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].file_name, "b.mp3");
        assert_eq!(report.skipped.len(), 1);
    }

    #[tokio::test]
    async fn invalid_parameter_aborts_only_the_current_item() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_rows(vec![row("a", "hello"), row("b", "world")]);

        let report = run_batch(&FakeSpeech::new(), "broken", 0, &groups, &BatchOptions::default(), dir.path())
            .await
            .unwrap();

        assert!(report.artifacts.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(report.archive.is_none());
    }

    #[tokio::test]
    async fn group_filter_limits_processing() {
        let dir = tempfile::tempdir().unwrap();
        let groups = group_rows(vec![row("a", "one"), row("b", "two"), row("c", "three")]);
        let options = BatchOptions { groups: vec!["b".to_string()], ..Default::default() };

        let report = run_batch(&FakeSpeech::new(), "en-US-AriaNeural", 0, &groups, &options, dir.path()).await.unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].file_name, "b.mp3");
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn combine_mode_inserts_gaps_between_lines() {
        let dir = tempfile::tempdir().unwrap();

        let report = run_text(
            &FakeSpeech::new(),
            "en-US-AriaNeural",
            0,
            "one\ntwo\n\nthree\n",
            TextMode::Combine { gap_ms: audio::SILENCE_GAP_MS },
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].file_name, "combined.wav");

        // Three 100 ms items plus two 1000 ms gaps.
        let (samples, rate) = audio::decode_segment(&report.artifacts[0].bytes).unwrap();
        assert_eq!(audio::duration_ms(samples.len(), rate), 3 * 100 + 2 * 1000);
    }

    #[tokio::test]
    async fn per_line_mode_writes_independent_artifacts() {
        let dir = tempfile::tempdir().unwrap();

        let report = run_text(&FakeSpeech::new(), "en-US-AriaNeural", 0, "one\ntwo\n", TextMode::PerLine, dir.path())
            .await
            .unwrap();

        let names: Vec<&str> = report.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["one.mp3", "two.mp3"]);
        assert!(dir.path().join("one.mp3").exists());
        assert!(dir.path().join(ARCHIVE_NAME).exists());
    }

    #[tokio::test]
    async fn per_line_name_collisions_get_an_index_suffix() {
        let dir = tempfile::tempdir().unwrap();

        let report = run_text(&FakeSpeech::new(), "en-US-AriaNeural", 0, "hello\nhello\n", TextMode::PerLine, dir.path())
            .await
            .unwrap();

        let names: Vec<&str> = report.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["hello.mp3", "hello_02.mp3"]);
    }

    #[test]
    fn file_names_replace_non_alphanumeric_runs() {
        assert_eq!(sanitize_file_name("Unit 1: fruits & veggies"), "Unit_1_fruits_veggies");
        assert_eq!(sanitize_file_name("第一组"), "第一组");
        assert_eq!(sanitize_file_name("!!!"), "untitled");
    }
}
