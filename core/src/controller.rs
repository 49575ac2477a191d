//! Pagination/search state machine for the browse view
//!
//! [`PaginationController`] decides which query (dictionary browse or
//! keyword search) and which page is authoritative, and issues exactly one
//! fetch per distinct `(scope, page)` key. It performs no I/O: transitions
//! return a [`FetchTicket`] describing the fetch to start, and the caller
//! reports the outcome through [`PaginationController::on_fetch_settled`].
//!
//! Two mechanisms guard the network:
//! - the [`FetchGate`] keeps at most one fetch in flight; intent changes
//!   made meanwhile are picked up when that fetch settles
//! - the last loaded [`LoadKey`] is written before the fetch starts, so a
//!   re-evaluation for the same key is a no-op
//!
//! A failed fetch leaves the previous page on screen and is not retried for
//! the same key; changing page, dictionary or keyword retries.

use crate::client::WordService;
use crate::load_key::{FetchGate, LoadKey};
use crate::models::{MetaWord, SearchPage};
use crate::resolver::{resolve, BrowseIntent, WordQuery};
use crate::{Error, Result};

/// The page of results currently shown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub items: Vec<MetaWord>,
    pub total_count: u64,
    /// 1-based page these items belong to
    pub page: u32,
    pub page_size: u32,
}

impl ResultPage {
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page: 1,
            page_size,
        }
    }

    /// `ceil(total_count / page_size)`
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// Named states of the browse view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BrowseState {
    #[default]
    Idle,
    DictionaryBrowse { dictionary_id: i64, page: u32 },
    Searching { keyword: String, page: u32 },
}

/// A fetch the controller wants issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: LoadKey,
    pub query: WordQuery,
}

#[derive(Debug)]
pub struct PaginationController {
    page_size: u32,
    selected_dictionary: Option<i64>,
    /// Selection stashed when typing started, restored by `clear_search`
    previous_dictionary: Option<i64>,
    keyword: String,
    page: u32,
    last_loaded: Option<LoadKey>,
    gate: FetchGate,
    in_flight: Option<LoadKey>,
    result: ResultPage,
    last_error: Option<String>,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            selected_dictionary: None,
            previous_dictionary: None,
            keyword: String::new(),
            page: 1,
            last_loaded: None,
            gate: FetchGate::new(),
            in_flight: None,
            result: ResultPage::empty(page_size),
            last_error: None,
        }
    }

    // ============================================================================
    // Transitions
    // ============================================================================

    /// Select dictionary `id` and go back to page 1
    ///
    /// While a keyword is active the view keeps searching; the selection
    /// takes effect once the keyword is cleared.
    pub fn select_dictionary(&mut self, id: i64) -> Option<FetchTicket> {
        self.selected_dictionary = Some(id);
        self.previous_dictionary = None;
        self.page = 1;
        self.evaluate()
    }

    /// Apply a settled keyword from the search box
    ///
    /// A non-empty keyword starts searching from page 1 and deselects the
    /// dictionary. An empty keyword returns to the dictionary that is still
    /// selected, or to idle.
    pub fn set_keyword(&mut self, keyword: &str) -> Option<FetchTicket> {
        let keyword = keyword.trim();
        if keyword == self.keyword {
            return self.evaluate();
        }

        if !keyword.is_empty() {
            if let Some(id) = self.selected_dictionary.take() {
                self.previous_dictionary = Some(id);
            }
        }
        self.keyword = keyword.to_string();
        self.page = 1;

        // The search scope does not carry the keyword, so a search page
        // loaded for the old keyword no longer satisfies the new one.
        if self.last_loaded.is_some_and(|key| key.is_search()) {
            self.last_loaded = None;
        }
        self.evaluate()
    }

    /// Explicit "clear search": drop the keyword and return to the
    /// dictionary selected before typing started, if any
    pub fn clear_search(&mut self) -> Option<FetchTicket> {
        if self.selected_dictionary.is_none() {
            self.selected_dictionary = self.previous_dictionary.take();
        }
        self.previous_dictionary = None;
        self.keyword.clear();
        self.page = 1;
        if self.last_loaded.is_some_and(|key| key.is_search()) {
            self.last_loaded = None;
        }
        self.evaluate()
    }

    /// Next page; no-op on the last page
    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.can_go_next() {
            log::debug!("next page ignored at page {}/{}", self.page, self.total_pages());
            return None;
        }
        self.page += 1;
        self.evaluate()
    }

    /// Previous page; no-op on the first page
    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        if !self.can_go_prev() {
            return None;
        }
        self.page -= 1;
        self.evaluate()
    }

    /// Jump to `page`, which must lie within `[1, total_pages]`
    pub fn go_to_page(&mut self, page: u32) -> Result<Option<FetchTicket>> {
        let total_pages = self.total_pages();
        if page < 1 || page > total_pages {
            return Err(Error::PageOutOfRange { page, total_pages });
        }
        self.page = page;
        Ok(self.evaluate())
    }

    // ============================================================================
    // Fetch orchestration
    // ============================================================================

    /// Decide whether the current intent needs a fetch
    ///
    /// Returns the ticket to issue, or `None` when idle, when a fetch is
    /// already in flight, or when the intent's key is already loaded.
    pub fn evaluate(&mut self) -> Option<FetchTicket> {
        let intent = self.intent();
        let Some(candidate) = intent.load_key() else {
            // Idle shows the placeholder, not the last list
            self.result = ResultPage::empty(self.page_size);
            self.last_loaded = None;
            return None;
        };

        if self.gate.is_held() {
            log::debug!(
                "fetch for {} deferred; {:?} still in flight",
                candidate,
                self.in_flight
            );
            return None;
        }

        if self.last_loaded == Some(candidate) {
            return None;
        }

        let query = resolve(&intent)?.with_page_size(self.page_size);

        // Record the key before the fetch starts so a re-evaluation during
        // the await sees it as loaded.
        self.last_loaded = Some(candidate);
        let acquired = self.gate.try_acquire();
        debug_assert!(acquired, "gate checked free above");
        self.in_flight = Some(candidate);

        log::debug!("fetching {} keyword={:?}", candidate, query.keyword);
        Some(FetchTicket {
            key: candidate,
            query,
        })
    }

    /// Record the outcome of a ticket and re-evaluate
    ///
    /// The gate is released whatever the outcome. On error the current page
    /// stays as it was and the key is not rolled back.
    pub fn on_fetch_settled(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<SearchPage>,
    ) -> Option<FetchTicket> {
        self.gate.release();
        self.in_flight = None;

        match outcome {
            Ok(page) => {
                if self.intent().load_key() != Some(ticket.key) {
                    log::debug!("showing response for superseded key {}", ticket.key);
                }
                self.result = ResultPage {
                    items: page.items,
                    total_count: page.total_count,
                    page: ticket.key.page,
                    page_size: self.page_size,
                };
                self.last_error = None;
            }
            Err(e) => {
                log::warn!("fetch for {} failed: {}", ticket.key, e);
                self.last_error = Some(e.to_string());
            }
        }

        self.evaluate()
    }

    /// Issue `ticket` and any follow-up fetches one at a time until the
    /// intent is satisfied
    ///
    /// For callers without an event loop: pass the ticket a transition
    /// returned.
    pub async fn drive<S>(&mut self, service: &S, ticket: Option<FetchTicket>)
    where
        S: WordService + ?Sized,
    {
        let mut next = ticket;
        while let Some(ticket) = next {
            let outcome = service.search_words(&ticket.query).await;
            next = self.on_fetch_settled(ticket, outcome);
        }
    }

    // ============================================================================
    // Read-only view
    // ============================================================================

    pub fn intent(&self) -> BrowseIntent {
        BrowseIntent::new(self.selected_dictionary, &self.keyword, self.page)
    }

    pub fn state(&self) -> BrowseState {
        let intent = self.intent();
        match intent.load_key() {
            None => BrowseState::Idle,
            Some(key) if key.is_search() => BrowseState::Searching {
                keyword: self.keyword.clone(),
                page: self.page,
            },
            Some(_) => BrowseState::DictionaryBrowse {
                dictionary_id: self.selected_dictionary.unwrap_or_default(),
                page: self.page,
            },
        }
    }

    pub fn result(&self) -> &ResultPage {
        &self.result
    }

    /// Current 1-based page of the intent (may differ from the shown page
    /// while a fetch is in flight)
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.result.total_pages()
    }

    pub fn can_go_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn can_go_prev(&self) -> bool {
        self.page > 1
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn selected_dictionary(&self) -> Option<i64> {
        self.selected_dictionary
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_held()
    }

    pub fn last_loaded(&self) -> Option<LoadKey> {
        self.last_loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
