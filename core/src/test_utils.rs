//! Shared test doubles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::WordService;
use crate::import::CsvUpload;
use crate::models::{
    Dictionary, MetaWord, NewDictionary, SearchPage, WordEntry, WordListProcessResult,
};
use crate::resolver::WordQuery;
use crate::{Error, Result};

/// `count` distinct words named `word0`, `word1`, ...
pub fn words(count: usize) -> Vec<MetaWord> {
    (0..count)
        .map(|i| MetaWord::new(i as i64, format!("word{}", i)))
        .collect()
}

/// In-memory [`WordService`] that records every search query
///
/// Every scope holds `total` words. An optional delay makes each search
/// take that long (use with a paused tokio clock).
pub struct RecordingService {
    total: u64,
    delay: Option<Duration>,
    fail: bool,
    queries: Mutex<Vec<WordQuery>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingService {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            delay: None,
            fail: false,
            queries: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn queries(&self) -> Vec<WordQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordService for RecordingService {
    async fn list_dictionaries(&self) -> Result<Vec<Dictionary>> {
        Ok(Vec::new())
    }

    async fn search_words(&self, query: &WordQuery) -> Result<SearchPage> {
        self.queries.lock().unwrap().push(query.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let start = u64::from(query.page_index()) * u64::from(query.page_size);
        let count = self.total.saturating_sub(start).min(u64::from(query.page_size));
        Ok(SearchPage {
            items: words(count as usize),
            total_count: self.total,
        })
    }

    async fn get_word(&self, id: i64) -> Result<MetaWord> {
        Ok(MetaWord::new(id, format!("word{}", id)))
    }

    async fn create_dictionary(&self, dictionary: &NewDictionary) -> Result<Dictionary> {
        Err(Error::InvalidInput(format!(
            "not supported in tests: {}",
            dictionary.name
        )))
    }

    async fn delete_dictionary(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    async fn bulk_add_words(
        &self,
        _dictionary_id: i64,
        entries: &[WordEntry],
    ) -> Result<WordListProcessResult> {
        Ok(WordListProcessResult {
            total: entries.len() as u64,
            added: entries.len() as u64,
            ..Default::default()
        })
    }

    async fn import_csv(
        &self,
        _dictionary_id: i64,
        _upload: &CsvUpload,
        _has_header: bool,
    ) -> Result<WordListProcessResult> {
        Ok(WordListProcessResult::default())
    }
}
