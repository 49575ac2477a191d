//! Query resolution for the browse view
//!
//! Browsing a dictionary and searching by keyword share one query shape: a
//! dictionary browse is a search with an empty keyword and an explicit
//! dictionary filter, so both paginate the same way.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::load_key::{LoadKey, Scope};

/// Which kind of list the browse view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    Dictionary,
    Search,
}

/// The latest user intent: selected dictionary, search keyword and page
///
/// The mode is derived, never stored: it is `Search` exactly when the
/// trimmed keyword is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseIntent {
    dictionary_id: Option<i64>,
    keyword: String,
    page: u32,
}

impl BrowseIntent {
    /// Build an intent; the keyword is trimmed and the page is at least 1
    pub fn new(dictionary_id: Option<i64>, keyword: &str, page: u32) -> Self {
        Self {
            dictionary_id,
            keyword: keyword.trim().to_string(),
            page: page.max(1),
        }
    }

    /// No dictionary selected and nothing typed
    pub fn idle() -> Self {
        Self::new(None, "", 1)
    }

    pub fn mode(&self) -> BrowseMode {
        if self.keyword.is_empty() {
            BrowseMode::Dictionary
        } else {
            BrowseMode::Search
        }
    }

    pub fn is_idle(&self) -> bool {
        self.mode() == BrowseMode::Dictionary && self.dictionary_id.is_none()
    }

    /// Selected dictionary, if any (only meaningful in dictionary mode)
    pub fn dictionary_id(&self) -> Option<i64> {
        self.dictionary_id
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Fingerprint of the fetch this intent needs, `None` when idle
    pub fn load_key(&self) -> Option<LoadKey> {
        match (self.mode(), self.dictionary_id) {
            (BrowseMode::Search, _) => Some(LoadKey::new(Scope::Search, self.page)),
            (BrowseMode::Dictionary, Some(id)) => Some(LoadKey::new(Scope::Dictionary(id), self.page)),
            (BrowseMode::Dictionary, None) => None,
        }
    }
}

impl Default for BrowseIntent {
    fn default() -> Self {
        Self::idle()
    }
}

/// A paginated word query against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordQuery {
    /// Keyword prefix; empty when browsing a dictionary
    pub keyword: String,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Restrict results to one dictionary
    pub dictionary_scope: Option<i64>,
}

impl WordQuery {
    /// 0-based page index as the service expects it
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Pick the single query to issue for an intent
///
/// A non-empty keyword wins over a selected dictionary; switching back to
/// dictionary browsing requires clearing the keyword first.
pub fn resolve(intent: &BrowseIntent) -> Option<WordQuery> {
    match intent.mode() {
        BrowseMode::Search => Some(WordQuery {
            keyword: intent.keyword.clone(),
            page: intent.page,
            page_size: DEFAULT_PAGE_SIZE,
            dictionary_scope: None,
        }),
        BrowseMode::Dictionary => intent.dictionary_id.map(|id| WordQuery {
            keyword: String::new(),
            page: intent.page,
            page_size: DEFAULT_PAGE_SIZE,
            dictionary_scope: Some(id),
        }),
    }
}
