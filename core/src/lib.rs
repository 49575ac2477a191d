//! # wordlist-core
//!
//! Core library for the Word List Browser.
//!
//! This crate provides:
//! - Data models for dictionaries (word lists) and meta-words
//! - An async REST client for the word-list service
//! - The pagination/search controller that keeps one consistent
//!   "current result set + page" view in sync with user intent
//! - Debounced search input and the async browse session loop
//! - Bulk-import validation for JSON word lists and CSV uploads
//!
//! ## Usage
//!
//! ```ignore
//! use wordlist_core::{connect, PaginationController};
//!
//! let client = connect("http://localhost:8080/api/")?;
//! let mut controller = PaginationController::new(10);
//! let ticket = controller.select_dictionary(1);
//! controller.drive(&client, ticket).await;
//! for word in &controller.result().items {
//!     println!("{}", word.word);
//! }
//! ```

pub mod client;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod dictionary_filter;
pub mod import;
pub mod load_key;
pub mod models;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

use thiserror::Error;

pub use client::{ApiClient, WordService};
pub use config::{BrowseConfig, ClientConfig};
pub use controller::{BrowseState, FetchTicket, PaginationController, ResultPage};
pub use debounce::{DebouncedQueryInput, QueryEvent};
pub use dictionary_filter::{DictionaryFilter, DictionaryPage};
pub use import::{CsvUpload, WordListError};
pub use load_key::{FetchGate, LoadKey, Scope};
pub use models::{
    CreationType, Dictionary, MetaWord, NewDictionary, SearchPage, WordEntry,
    WordListProcessResult,
};
pub use resolver::{resolve, BrowseIntent, BrowseMode, WordQuery};
pub use session::{BrowseEvent, BrowseSession, BrowseSnapshot};

/// Errors that can occur in wordlist-core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid word list: {0}")]
    WordList(#[from] WordListError),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Page {page} is outside 1..={total_pages}")]
    PageOutOfRange { page: u32, total_pages: u32 },
}

/// Result type alias for wordlist-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Create a REST client for the word-list service at `base_url`
///
/// A trailing slash is added to the base if missing so that endpoint
/// paths join underneath it.
///
/// # Example
///
/// ```ignore
/// let client = wordlist_core::connect("http://localhost:8080/api")?;
/// let dictionaries = client.list_dictionaries().await?;
/// ```
pub fn connect(base_url: &str) -> Result<ApiClient> {
    ApiClient::new(&ClientConfig::new(base_url)?)
}
