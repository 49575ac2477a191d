//! Debounced search input
//!
//! Raw keystrokes arm a deadline; the trimmed text is emitted as a settled
//! keyword once no further input arrives before the deadline. Blank text is
//! reported immediately so stale results can be dropped without waiting.
//!
//! The type holds no timer itself. The owner asks for [`deadline`] and calls
//! [`poll`] when it elapses, which keeps the behaviour deterministic in tests.
//!
//! [`deadline`]: DebouncedQueryInput::deadline
//! [`poll`]: DebouncedQueryInput::poll

use std::time::Duration;

use tokio::time::Instant;

/// Output of the debounced input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// The text became blank; emitted synchronously on that keystroke
    Cleared,
    /// The trimmed text after a quiet interval
    Settled(String),
}

#[derive(Debug)]
struct Pending {
    keyword: String,
    deadline: Instant,
}

#[derive(Debug)]
pub struct DebouncedQueryInput {
    delay: Duration,
    pending: Option<Pending>,
    disposed: bool,
}

impl DebouncedQueryInput {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            disposed: false,
        }
    }

    /// Feed the full current text of the search box
    ///
    /// Every keystroke cancels the pending deadline. Blank text returns
    /// [`QueryEvent::Cleared`] at once; anything else restarts the delay.
    pub fn input(&mut self, raw: &str, now: Instant) -> Option<QueryEvent> {
        if self.disposed {
            return None;
        }

        self.pending = None;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Some(QueryEvent::Cleared);
        }

        self.pending = Some(Pending {
            keyword: trimmed.to_string(),
            deadline: now + self.delay,
        });
        None
    }

    /// When the pending keyword settles, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Emit the settled keyword once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<QueryEvent> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now >= p.deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|p| QueryEvent::Settled(p.keyword))
    }

    /// Whether typing is still settling ("searching" indicator)
    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending keyword; nothing is emitted afterwards
    pub fn dispose(&mut self) {
        self.pending = None;
        self.disposed = true;
    }
}
