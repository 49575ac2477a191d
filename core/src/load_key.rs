//! Fetch bookkeeping for the browse controller
//!
//! A [`LoadKey`] fingerprints what the result page was last loaded for, and
//! the [`FetchGate`] keeps at most one search request in flight. The two are
//! used together: the gate alone would let an identical request repeat once
//! the previous one settles, and the key alone would let two different
//! requests overlap.

use std::fmt;

/// What a page of results belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Browsing the words of one dictionary
    Dictionary(i64),
    /// Keyword search across all meta-words
    Search,
}

/// Fingerprint of a `(scope, page)` request; equal keys are already satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadKey {
    pub scope: Scope,
    /// 1-based page number
    pub page: u32,
}

impl LoadKey {
    pub fn new(scope: Scope, page: u32) -> Self {
        Self { scope, page }
    }

    pub fn is_search(&self) -> bool {
        self.scope == Scope::Search
    }
}

impl fmt::Display for LoadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            Scope::Dictionary(id) => write!(f, "({},{})", id, self.page),
            Scope::Search => write!(f, "(search,{})", self.page),
        }
    }
}

/// "Fetch in flight" flag
#[derive(Debug, Default)]
pub struct FetchGate {
    in_flight: bool,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate; returns `false` if a fetch already holds it
    pub fn try_acquire(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn release(&mut self) {
        self.in_flight = false;
    }

    pub fn is_held(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_key_equality() {
        assert_eq!(
            LoadKey::new(Scope::Dictionary(1), 1),
            LoadKey::new(Scope::Dictionary(1), 1)
        );
        assert_ne!(
            LoadKey::new(Scope::Dictionary(1), 1),
            LoadKey::new(Scope::Dictionary(1), 2)
        );
        // A dictionary id never collides with the search scope
        assert_ne!(
            LoadKey::new(Scope::Dictionary(0), 1),
            LoadKey::new(Scope::Search, 1)
        );
    }

    #[test]
    fn test_load_key_display() {
        assert_eq!(LoadKey::new(Scope::Dictionary(1), 2).to_string(), "(1,2)");
        assert_eq!(LoadKey::new(Scope::Search, 3).to_string(), "(search,3)");
    }

    #[test]
    fn test_fetch_gate_is_exclusive() {
        let mut gate = FetchGate::new();
        assert!(!gate.is_held());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(gate.is_held());
        gate.release();
        assert!(gate.try_acquire());
    }
}
