//! Data models for dictionaries and word entries
//!
//! This module defines the payloads exchanged with the word-list service:
//! dictionaries (named word lists), meta-words (the shared pool of word
//! entries), paged search results, and bulk-import entries and results.

use serde::{Deserialize, Serialize};

/// A canonical word entry shared across dictionaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaWord {
    /// Unique identifier for this word entry
    pub id: i64,
    /// The word itself
    pub word: String,
    /// Phonetic transcription (e.g. "/ˈæpəl/")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    /// Definition text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Part of speech (noun, verb, adjective, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    /// Example sentence demonstrating usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    /// Translation into the learner's language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Difficulty from 1 (easy) to 5 (hard)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// How a dictionary came to exist
///
/// Only user-created dictionaries can receive new words or be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreationType {
    UserCreated,
    #[default]
    Imported,
}

/// A named, ordered collection of meta-words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dictionary {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Size of the source file in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub creation_type: CreationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Default category for newly created dictionaries
pub const DEFAULT_CATEGORY: &str = "其他";

/// Fields for creating a dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDictionary {
    pub name: String,
    pub file_path: String,
    pub file_size: u64,
    pub category: String,
    pub word_count: u64,
}

/// One page of search results as returned by the service
///
/// Accepts both `items`/`totalCount` and the Spring `Page`
/// field names `content`/`totalElements`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(alias = "content")]
    pub items: Vec<MetaWord>,
    #[serde(alias = "totalElements")]
    pub total_count: u64,
}

/// A word entry submitted through bulk import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

/// Outcome of a bulk add or CSV import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordListProcessResult {
    /// Number of entries submitted
    #[serde(default)]
    pub total: u64,
    /// Entries whose meta-word already existed
    #[serde(default)]
    pub existed: u64,
    /// Entries that created a new meta-word
    #[serde(default)]
    pub created: u64,
    /// Entries linked into the dictionary
    #[serde(default)]
    pub added: u64,
    /// Entries that could not be processed
    #[serde(default)]
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MetaWord {
    /// Create a word with only the required fields set
    pub fn new(id: i64, word: impl Into<String>) -> Self {
        Self {
            id,
            word: word.into(),
            phonetic: None,
            definition: None,
            part_of_speech: None,
            example_sentence: None,
            translation: None,
            difficulty: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Short definition text for list views
    pub fn preview(&self, max_chars: usize) -> String {
        self.definition
            .as_deref()
            .map(|text| truncate_preview(text, max_chars))
            .unwrap_or_default()
    }

    /// Human-readable difficulty level
    pub fn difficulty_label(&self) -> Option<&'static str> {
        match self.difficulty? {
            1 => Some("easy"),
            2 => Some("fairly easy"),
            3 => Some("medium"),
            4 => Some("fairly hard"),
            5 => Some("hard"),
            _ => None,
        }
    }
}

impl Dictionary {
    pub fn is_user_created(&self) -> bool {
        self.creation_type == CreationType::UserCreated
    }
}

impl NewDictionary {
    /// Create a dictionary request with the default category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: String::new(),
            file_size: 0,
            category: DEFAULT_CATEGORY.to_string(),
            word_count: 0,
        }
    }

    /// Check the fields the service requires before submission
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::InvalidInput(
                "dictionary name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl WordEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            phonetic: None,
            definition: None,
            part_of_speech: None,
            example_sentence: None,
            translation: None,
            difficulty: None,
        }
    }
}

impl WordListProcessResult {
    /// Fold the counts of another batch into this one
    pub fn merge(&mut self, other: &WordListProcessResult) {
        self.total += other.total;
        self.existed += other.existed;
        self.created += other.created;
        self.added += other.added;
        self.failed += other.failed;
    }
}

/// Truncate text for a preview, preferring a word boundary
fn truncate_preview(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let truncated = &text[..cut];
    match truncated.rfind(' ') {
        Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_word_deserialize_camel_case() {
        let json = r#"{
            "id": 7,
            "word": "apple",
            "phonetic": "/ˈæpəl/",
            "partOfSpeech": "noun",
            "exampleSentence": "I ate an apple.",
            "difficulty": 2
        }"#;
        let word: MetaWord = serde_json::from_str(json).unwrap();
        assert_eq!(word.id, 7);
        assert_eq!(word.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(word.example_sentence.as_deref(), Some("I ate an apple."));
        assert_eq!(word.definition, None);
        assert_eq!(word.difficulty_label(), Some("fairly easy"));
    }

    #[test]
    fn test_dictionary_creation_type_defaults_to_imported() {
        let json = r#"{"id": 1, "name": "CET4", "wordCount": 500}"#;
        let dict: Dictionary = serde_json::from_str(json).unwrap();
        assert_eq!(dict.creation_type, CreationType::Imported);
        assert_eq!(dict.word_count, Some(500));
        assert!(!dict.is_user_created());

        let json = r#"{"id": 2, "name": "Mine", "creationType": "USER_CREATED"}"#;
        let dict: Dictionary = serde_json::from_str(json).unwrap();
        assert!(dict.is_user_created());
    }

    #[test]
    fn test_search_page_accepts_spring_page_fields() {
        let json = r#"{"content": [{"id": 1, "word": "a"}], "totalElements": 23, "number": 0}"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_count, 23);

        let json = r#"{"items": [], "totalCount": 5}"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_count, 5);
    }

    #[test]
    fn test_word_entry_skips_absent_fields() {
        let mut entry = WordEntry::new("banana");
        entry.difficulty = Some(1);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"word":"banana","difficulty":1}"#);
    }

    #[test]
    fn test_new_dictionary_validate() {
        assert!(NewDictionary::new("My words").validate().is_ok());
        assert!(matches!(
            NewDictionary::new("   ").validate(),
            Err(crate::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_process_result_merge() {
        let mut total = WordListProcessResult::default();
        total.merge(&WordListProcessResult {
            total: 10,
            existed: 4,
            created: 6,
            added: 9,
            failed: 1,
            message: None,
        });
        total.merge(&WordListProcessResult {
            total: 5,
            added: 5,
            created: 5,
            ..Default::default()
        });
        assert_eq!(total.total, 15);
        assert_eq!(total.added, 14);
        assert_eq!(total.failed, 1);
    }

    #[test]
    fn test_truncate_preview() {
        assert_eq!(truncate_preview("short", 100), "short");
        assert_eq!(
            truncate_preview("this is a very long text that should be truncated", 20),
            "this is a very long..."
        );
        // Multi-byte text must not be split inside a character
        assert_eq!(truncate_preview("苹果是一种水果", 2), "苹果...");
    }
}
