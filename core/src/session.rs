//! Async browse session
//!
//! [`BrowseSession::run`] is the single cooperative loop behind the browse
//! view. It multiplexes three sources with `tokio::select!`:
//! - user events from the view ([`BrowseEvent`])
//! - the debounce deadline of the search box
//! - the one search request that may be in flight
//!
//! All state lives in the session and is mutated only by this loop. After
//! every step the loop publishes a [`BrowseSnapshot`] on a watch channel.

use std::sync::Arc;

use futures::future::{BoxFuture, OptionFuture};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::client::WordService;
use crate::config::BrowseConfig;
use crate::controller::{BrowseState, FetchTicket, PaginationController};
use crate::debounce::{DebouncedQueryInput, QueryEvent};
use crate::models::{MetaWord, SearchPage};
use crate::Result;

/// User intents fed into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseEvent {
    /// Full current text of the search box after a keystroke
    Keystroke(String),
    SelectDictionary(i64),
    /// The search box's clear button
    ClearSearch,
    NextPage,
    PrevPage,
    GoToPage(u32),
}

/// Everything the view needs to render the word list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseSnapshot {
    pub state: BrowseState,
    pub items: Vec<MetaWord>,
    /// Requested page; the items may still belong to the previous one
    /// while `loading` is set
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub can_go_next: bool,
    pub can_go_prev: bool,
    /// A search request is in flight
    pub loading: bool,
    /// Typing has not settled yet
    pub searching: bool,
    pub last_error: Option<String>,
}

type PendingFetch = BoxFuture<'static, (FetchTicket, Result<SearchPage>)>;

pub struct BrowseSession {
    service: Arc<dyn WordService>,
    controller: PaginationController,
    input: DebouncedQueryInput,
}

impl BrowseSession {
    pub fn new(service: Arc<dyn WordService>, config: &BrowseConfig) -> Self {
        Self {
            service,
            controller: PaginationController::new(config.page_size),
            input: DebouncedQueryInput::new(config.debounce),
        }
    }

    pub fn snapshot(&self) -> BrowseSnapshot {
        let ctrl = &self.controller;
        let result = ctrl.result();
        BrowseSnapshot {
            state: ctrl.state(),
            items: result.items.clone(),
            page: ctrl.page(),
            total_pages: ctrl.total_pages(),
            total_count: result.total_count,
            can_go_next: ctrl.can_go_next(),
            can_go_prev: ctrl.can_go_prev(),
            loading: ctrl.is_loading(),
            searching: self.input.is_searching(),
            last_error: ctrl.last_error().map(str::to_string),
        }
    }

    /// Run until the event sender is dropped
    ///
    /// On exit the search box is disposed and any in-flight request is
    /// dropped, so nothing is emitted after the view detaches.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<BrowseEvent>,
        view: watch::Sender<BrowseSnapshot>,
    ) {
        let mut in_flight: Option<PendingFetch> = None;
        view.send_replace(self.snapshot());

        loop {
            let deadline = self.input.deadline();

            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    log::debug!("browse event {:?}", event);
                    if let Some(ticket) = self.handle_event(event, Instant::now()) {
                        in_flight = Some(self.start_fetch(ticket));
                    }
                }
                Some((ticket, outcome)) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    if let Some(next) = self.controller.on_fetch_settled(ticket, outcome) {
                        in_flight = Some(self.start_fetch(next));
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(QueryEvent::Settled(keyword)) = self.input.poll(Instant::now()) {
                        log::debug!("keyword settled: {:?}", keyword);
                        if let Some(ticket) = self.controller.set_keyword(&keyword) {
                            in_flight = Some(self.start_fetch(ticket));
                        }
                    }
                }
            }

            view.send_replace(self.snapshot());
        }

        self.input.dispose();
        log::debug!("browse session closed");
    }

    fn handle_event(&mut self, event: BrowseEvent, now: Instant) -> Option<FetchTicket> {
        match event {
            BrowseEvent::Keystroke(text) => match self.input.input(&text, now) {
                Some(QueryEvent::Cleared) => self.controller.set_keyword(""),
                _ => None,
            },
            BrowseEvent::SelectDictionary(id) => self.controller.select_dictionary(id),
            BrowseEvent::ClearSearch => {
                self.input.input("", now);
                self.controller.clear_search()
            }
            BrowseEvent::NextPage => self.controller.next_page(),
            BrowseEvent::PrevPage => self.controller.prev_page(),
            BrowseEvent::GoToPage(page) => self.controller.go_to_page(page).unwrap_or_else(|e| {
                log::debug!("page change rejected: {}", e);
                None
            }),
        }
    }

    /// The controller only hands out a ticket while no fetch is in flight
    fn start_fetch(&self, ticket: FetchTicket) -> PendingFetch {
        let service = Arc::clone(&self.service);
        Box::pin(async move {
            let outcome = service.search_words(&ticket.query).await;
            (ticket, outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::task::JoinHandle;
    use tokio::time::sleep;

    use crate::test_utils::RecordingService;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn spawn_session(
        service: Arc<RecordingService>,
    ) -> (
        mpsc::Sender<BrowseEvent>,
        watch::Receiver<BrowseSnapshot>,
        JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(BrowseSnapshot::default());
        let session = BrowseSession::new(service, &BrowseConfig::default());
        (tx, view_rx, tokio::spawn(session.run(rx, view_tx)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_settles_into_one_search() {
        let service = Arc::new(RecordingService::new(42));
        let (tx, view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::Keystroke("ap".to_string())).await.unwrap();
        sleep(ms(100)).await;
        tx.send(BrowseEvent::Keystroke("app".to_string())).await.unwrap();
        sleep(ms(400)).await;
        drop(tx);
        handle.await.unwrap();

        let queries = service.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].keyword, "app");
        assert_eq!(queries[0].dictionary_scope, None);

        let snapshot = view.borrow().clone();
        assert_eq!(
            snapshot.state,
            BrowseState::Searching {
                keyword: "app".to_string(),
                page: 1
            }
        );
        assert_eq!(snapshot.total_pages, 5);
        assert_eq!(snapshot.items.len(), 10);
        assert!(!snapshot.loading);
        assert!(!snapshot.searching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_is_immediate() {
        let service = Arc::new(RecordingService::new(42));
        let (tx, mut view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::Keystroke("cat".to_string())).await.unwrap();
        sleep(ms(400)).await;
        assert_eq!(view.borrow().items.len(), 10);

        let cleared_at = Instant::now();
        tx.send(BrowseEvent::Keystroke(String::new())).await.unwrap();
        view.wait_for(|s| s.state == BrowseState::Idle).await.unwrap();
        assert!(Instant::now() - cleared_at < ms(300));
        assert!(view.borrow().items.is_empty());

        drop(tx);
        handle.await.unwrap();
        assert_eq!(service.queries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_fetch_in_flight_at_a_time() {
        let service = Arc::new(RecordingService::new(500).with_delay(ms(1000)));
        let (tx, view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::SelectDictionary(1)).await.unwrap();
        sleep(ms(100)).await;
        assert!(view.borrow().loading);
        tx.send(BrowseEvent::SelectDictionary(2)).await.unwrap();
        tx.send(BrowseEvent::SelectDictionary(3)).await.unwrap();
        sleep(ms(3000)).await;
        drop(tx);
        handle.await.unwrap();

        let scopes: Vec<Option<i64>> = service
            .queries()
            .iter()
            .map(|q| q.dictionary_scope)
            .collect();
        assert_eq!(scopes, vec![Some(1), Some(3)]);
        assert_eq!(service.max_in_flight(), 1);

        let snapshot = view.borrow().clone();
        assert_eq!(
            snapshot.state,
            BrowseState::DictionaryBrowse {
                dictionary_id: 3,
                page: 1
            }
        );
        assert!(!snapshot.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paging_through_a_dictionary() {
        let service = Arc::new(RecordingService::new(23));
        let (tx, view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::SelectDictionary(1)).await.unwrap();
        sleep(ms(10)).await;
        tx.send(BrowseEvent::GoToPage(3)).await.unwrap();
        sleep(ms(10)).await;
        tx.send(BrowseEvent::NextPage).await.unwrap();
        tx.send(BrowseEvent::GoToPage(9)).await.unwrap();
        sleep(ms(10)).await;
        drop(tx);
        handle.await.unwrap();

        let pages: Vec<u32> = service.queries().iter().map(|q| q.page_index()).collect();
        assert_eq!(pages, vec![0, 2]);

        let snapshot = view.borrow().clone();
        assert_eq!(snapshot.page, 3);
        assert_eq!(snapshot.items.len(), 3);
        assert!(!snapshot.can_go_next);
        assert!(snapshot.can_go_prev);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_reported() {
        let service = Arc::new(RecordingService::new(10).failing());
        let (tx, view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::SelectDictionary(1)).await.unwrap();
        sleep(ms(10)).await;
        drop(tx);
        handle.await.unwrap();

        let snapshot = view.borrow().clone();
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.loading);
        assert!(snapshot
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("service unavailable")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_search_after_view_detaches() {
        let service = Arc::new(RecordingService::new(10));
        let (tx, _view, handle) = spawn_session(service.clone());

        tx.send(BrowseEvent::Keystroke("cat".to_string())).await.unwrap();
        drop(tx);
        handle.await.unwrap();
        sleep(ms(1000)).await;

        assert!(service.queries().is_empty());
    }
}
