//! Client-side filter and pager over the loaded dictionary list
//!
//! Independent of the word-list controller and never touches the network.
//! The requested page is kept as typed; [`DictionaryFilter::apply`] clamps
//! it into `[1, total_pages]` for the current filter.

use crate::config::DEFAULT_DICTIONARY_PAGE_SIZE;
use crate::models::Dictionary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryFilter {
    search_text: String,
    page: u32,
    page_size: u32,
}

/// One window of the filtered dictionaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPage<'a> {
    pub items: Vec<&'a Dictionary>,
    pub total_matches: usize,
    pub total_pages: u32,
    /// Effective page after clamping
    pub page: u32,
}

impl Default for DictionaryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DICTIONARY_PAGE_SIZE)
    }
}

impl DictionaryFilter {
    pub fn new(page_size: u32) -> Self {
        Self {
            search_text: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Change the filter text. The page is left alone.
    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.to_string();
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Advance one page if the filtered list has more
    pub fn next_page(&mut self, dictionaries: &[Dictionary]) -> bool {
        let current = self.apply(dictionaries);
        if current.page >= current.total_pages {
            return false;
        }
        self.page = current.page + 1;
        true
    }

    pub fn prev_page(&mut self, dictionaries: &[Dictionary]) -> bool {
        let current = self.apply(dictionaries);
        if current.page <= 1 {
            return false;
        }
        self.page = current.page - 1;
        true
    }

    fn matches(&self, dictionary: &Dictionary) -> bool {
        let needle = self.search_text.trim();
        needle.is_empty() || dictionary.name.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Filter by name (case-insensitive substring) and cut out the current
    /// page window
    pub fn apply<'a>(&self, dictionaries: &'a [Dictionary]) -> DictionaryPage<'a> {
        let matched: Vec<&Dictionary> = dictionaries.iter().filter(|d| self.matches(d)).collect();
        let total_matches = matched.len();
        let page_size = self.page_size as usize;
        let total_pages = total_matches.div_ceil(page_size) as u32;
        let page = self.page.clamp(1, total_pages.max(1));

        let items = matched
            .into_iter()
            .skip((page as usize - 1) * page_size)
            .take(page_size)
            .collect();

        DictionaryPage {
            items,
            total_matches,
            total_pages,
            page,
        }
    }
}
