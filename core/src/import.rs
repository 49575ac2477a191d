//! Bulk-import validation
//!
//! This module checks word lists before they are submitted to a dictionary:
//! pasted JSON arrays, JSON files (optionally gzip-compressed, `.json.gz`)
//! and CSV uploads. Validation failures are reported as [`WordListError`]
//! with messages meant to be shown inline next to the submitting form.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::error::Category;
use serde_json::Value;

use crate::models::{WordEntry, WordListProcessResult};
use crate::{Error, Result};

/// Most entries accepted in a single bulk-add request
pub const MAX_BATCH_SIZE: usize = 1000;
/// Largest CSV file accepted for upload (10 MiB)
pub const MAX_CSV_BYTES: u64 = 10 * 1024 * 1024;

/// Per-field character limits enforced by the service
const FIELD_LIMITS: &[(&str, usize)] = &[
    ("phonetic", 200),
    ("definition", 2000),
    ("partOfSpeech", 50),
    ("exampleSentence", 1000),
    ("translation", 500),
];
const MAX_WORD_CHARS: usize = 100;

/// Why a word list was rejected; entry indexes are 1-based
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    #[error("word list is empty")]
    EmptyInput,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("word list must be a JSON array")]
    NotAnArray,

    #[error("word list must contain at least one entry")]
    NoEntries,

    #[error("at most {max} entries can be added at once, got {count}")]
    TooManyEntries { count: usize, max: usize },

    #[error("entry {index} must be an object")]
    NotAnObject { index: usize },

    #[error("entry {index} is missing a valid `word` field")]
    MissingWord { index: usize },

    #[error("entry {index}: difficulty must be an integer between 1 and 5")]
    InvalidDifficulty { index: usize },

    #[error("entry {index}: `{field}` exceeds {max} characters")]
    FieldTooLong {
        index: usize,
        field: &'static str,
        max: usize,
    },
}

/// Parse and validate a pasted word list for a single bulk-add request
pub fn parse_word_list(input: &str) -> std::result::Result<Vec<WordEntry>, WordListError> {
    parse_entries(input, Some(MAX_BATCH_SIZE))
}

/// Pretty-print a pasted word list, or explain why it is not valid JSON
pub fn format_json(input: &str) -> std::result::Result<String, WordListError> {
    if input.trim().is_empty() {
        return Err(WordListError::EmptyInput);
    }
    let value: Value = serde_json::from_str(input).map_err(|e| malformed(&e))?;
    serde_json::to_string_pretty(&value).map_err(|e| malformed(&e))
}

/// Human-readable classification of a JSON parse error
pub fn describe_json_error(err: &serde_json::Error) -> String {
    let hint = match err.classify() {
        Category::Eof => "the JSON is incomplete; a bracket, quote or comma may be missing",
        Category::Syntax => "unexpected character; check that quotes, commas and brackets match",
        Category::Data => "the JSON structure is not what was expected",
        Category::Io => "the input could not be read",
    };
    format!("{} (line {}, column {})", hint, err.line(), err.column())
}

/// Read a word-list file (`.json` or `.json.gz`) without the per-request cap
///
/// Large files are submitted in [`batches`].
pub fn read_word_list_file(path: impl AsRef<Path>) -> Result<Vec<WordEntry>> {
    let path = path.as_ref();
    let is_gzipped = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let file = File::open(path)?;
    let mut reader: Box<dyn Read> = if is_gzipped {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let entries = parse_entries(&text, None)?;
    log::debug!("Read {} word entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Split entries into request-sized batches
pub fn batches(entries: &[WordEntry]) -> impl Iterator<Item = &[WordEntry]> {
    entries.chunks(MAX_BATCH_SIZE)
}

/// Running totals across several bulk-add batches
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Batches submitted
    pub batches: u64,
    /// Batches the service rejected outright
    pub failed_batches: u64,
    /// Summed per-entry outcome of accepted batches
    pub result: WordListProcessResult,
}

impl ImportStats {
    pub fn record(&mut self, outcome: &Result<WordListProcessResult>) {
        self.batches += 1;
        match outcome {
            Ok(result) => self.result.merge(result),
            Err(e) => {
                log::debug!("Batch {} failed: {}", self.batches, e);
                self.failed_batches += 1;
            }
        }
    }
}

/// A CSV file checked for upload
#[derive(Debug, Clone)]
pub struct CsvUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl CsvUpload {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidUpload(format!("not a file path: {:?}", path)))?
            .to_string();

        // Check the size before reading the whole file
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CSV_BYTES {
            return Err(too_large(size));
        }

        Self::from_bytes(file_name, std::fs::read(path)?)
    }

    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(Error::InvalidUpload(
                "only .csv files can be imported".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(Error::InvalidUpload("file is empty".to_string()));
        }
        if bytes.len() as u64 > MAX_CSV_BYTES {
            return Err(too_large(bytes.len() as u64));
        }
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn too_large(size: u64) -> Error {
    Error::InvalidUpload(format!(
        "file is {} bytes; the limit is {} bytes",
        size, MAX_CSV_BYTES
    ))
}

fn malformed(err: &serde_json::Error) -> WordListError {
    WordListError::MalformedJson(describe_json_error(err))
}

fn parse_entries(
    input: &str,
    max_entries: Option<usize>,
) -> std::result::Result<Vec<WordEntry>, WordListError> {
    if input.trim().is_empty() {
        return Err(WordListError::EmptyInput);
    }

    let value: Value = serde_json::from_str(input).map_err(|e| malformed(&e))?;
    let Value::Array(items) = value else {
        return Err(WordListError::NotAnArray);
    };

    if items.is_empty() {
        return Err(WordListError::NoEntries);
    }
    if let Some(max) = max_entries {
        if items.len() > max {
            return Err(WordListError::TooManyEntries {
                count: items.len(),
                max,
            });
        }
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_entry(i + 1, item))
        .collect()
}

/// Validate one entry and convert it to a [`WordEntry`]
fn validate_entry(index: usize, item: Value) -> std::result::Result<WordEntry, WordListError> {
    let Value::Object(fields) = &item else {
        return Err(WordListError::NotAnObject { index });
    };

    let word = fields
        .get("word")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or(WordListError::MissingWord { index })?;
    if word.chars().count() > MAX_WORD_CHARS {
        return Err(WordListError::FieldTooLong {
            index,
            field: "word",
            max: MAX_WORD_CHARS,
        });
    }

    let difficulty = match fields.get("difficulty") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_u64() {
            Some(level @ 1..=5) => Some(level as u8),
            _ => return Err(WordListError::InvalidDifficulty { index }),
        },
    };

    for &(field, max) in FIELD_LIMITS {
        if let Some(text) = fields.get(field).and_then(Value::as_str) {
            if text.chars().count() > max {
                return Err(WordListError::FieldTooLong { index, field, max });
            }
        }
    }

    let text = |field: &str| {
        fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(WordEntry {
        word: word.to_string(),
        phonetic: text("phonetic"),
        definition: text("definition"),
        part_of_speech: text("partOfSpeech"),
        example_sentence: text("exampleSentence"),
        translation: text("translation"),
        difficulty,
    })
}
