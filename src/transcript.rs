//! Transcript import: turns transcript JSON files into word records.
//!
//! Three layouts are understood: the uploaded-file wrapper
//! (`processed_data.transcript.segments`), a bare `transcript.segments`, and
//! the raw `transcription[]` list of `{segment, words}` entries.

use crate::codec::sanitize_field;
use crate::error::TranscriptError;
use crate::id::{IdGenerator, UuidIdGen};
use crate::record::{UNKNOWN_TIME, WordRecord};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// One imported transcript file.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub path: PathBuf,
    pub records: Vec<WordRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    processed_data: Option<ProcessedData>,
    #[serde(default)]
    transcript: Option<SegmentList>,
    #[serde(default)]
    transcription: Option<Vec<RawEntry>>,
    #[serde(default)]
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct ProcessedData {
    transcript: SegmentList,
}

#[derive(Debug, Deserialize)]
struct SegmentList {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Segment {
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default, alias = "start")]
    start_time: Option<f64>,
    #[serde(default, alias = "end")]
    end_time: Option<f64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    #[serde(alias = "text")]
    word: String,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    segment: Segment,
    #[serde(default)]
    words: Vec<Word>,
}

impl TranscriptFile {
    fn into_segments(self) -> Result<(Vec<Segment>, Option<String>), TranscriptError> {
        let file_id = self.media.and_then(|m| m.id).and_then(|id| match id {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let segments = if let Some(data) = self.processed_data {
            data.transcript.segments
        } else if let Some(list) = self.transcript {
            list.segments
        } else if let Some(entries) = self.transcription {
            entries
                .into_iter()
                .map(|entry| Segment {
                    words: entry.words,
                    ..entry.segment
                })
                .collect()
        } else {
            return Err(TranscriptError::MissingSegments);
        };
        Ok((segments, file_id))
    }
}

/// `"Speaker 1:"` becomes `"Speaker-1"`. Blank names become
/// [`UNKNOWN_SPEAKER`].
pub fn normalize_speaker(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);
    let name = sanitize_field(trimmed);
    if name.is_empty() {
        UNKNOWN_SPEAKER.to_string()
    } else {
        name
    }
}

pub fn parse_transcript(json: &str, file_name: &str) -> Result<Vec<WordRecord>, TranscriptError> {
    parse_transcript_with(json, file_name, &mut UuidIdGen)
}

/// Like [`parse_transcript`], drawing the file id from `ids` when the file
/// does not carry one.
pub fn parse_transcript_with(
    json: &str,
    file_name: &str,
    ids: &mut dyn IdGenerator,
) -> Result<Vec<WordRecord>, TranscriptError> {
    let file: TranscriptFile = serde_json::from_str(json)?;
    let (segments, file_id) = file.into_segments()?;
    let file_id = file_id.unwrap_or_else(|| ids.next_id());
    let file_name = sanitize_field(file_name);

    let mut records = Vec::new();
    for (segment_idx, segment) in segments.into_iter().enumerate() {
        let speaker = normalize_speaker(segment.speaker.as_deref().unwrap_or(""));
        let seg_start = finite_or_unknown(segment.start_time);
        let seg_end = finite_or_unknown(segment.end_time);

        let words = if segment.words.is_empty() {
            untimed_words(segment.text.as_deref().unwrap_or(""))
        } else {
            segment.words
        };
        for (word_idx, word) in words.into_iter().enumerate() {
            let text = sanitize_field(&word.word);
            if text.is_empty() {
                continue;
            }
            records.push(
                WordRecord::new(text, speaker.clone())
                    .with_times(finite_or_unknown(word.start), finite_or_unknown(word.end))
                    .with_segment(segment_idx.to_string(), seg_start, seg_end)
                    .with_source(file_name.clone(), file_id.clone())
                    .with_word_index(word_idx as i64),
            );
        }
    }
    Ok(records)
}

pub fn load_file(path: &Path) -> Result<Source, TranscriptError> {
    let json = fs::read_to_string(path).map_err(|source| TranscriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript.json")
        .to_string();
    let records = parse_transcript(&json, &name)?;
    info!(path = %path.display(), words = records.len(), "imported transcript");
    Ok(Source {
        name,
        path: path.to_path_buf(),
        records,
    })
}

/// Expands directories into the `*.json` files below them, sorted.
pub fn collect_json_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

/// Loads every transcript under `paths`. Files that fail to load are logged
/// and skipped.
pub fn load_sources(paths: &[PathBuf]) -> Vec<Source> {
    collect_json_files(paths)
        .into_iter()
        .filter_map(|path| match load_file(&path) {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping transcript");
                None
            }
        })
        .collect()
}

fn finite_or_unknown(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(UNKNOWN_TIME)
}

fn untimed_words(text: &str) -> Vec<Word> {
    text.split_whitespace()
        .map(|w| Word {
            word: w.to_string(),
            start: None,
            end: None,
        })
        .collect()
}
