//! UI-local suggestion list with a stale-response guard
//!
//! Lookups resolve after the user may have moved on. Every request is issued
//! under a token; only responses carrying the current token are accepted.

use qedit_core::Coding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Default)]
pub struct SuggestionList {
    current: u64,
    items: Vec<Coding>,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, invalidating every earlier token
    pub fn begin(&mut self) -> RequestToken {
        self.current += 1;
        RequestToken(self.current)
    }

    /// Append a response; returns `false` if it was stale and dropped.
    /// Codings already listed (same system and code) are skipped.
    pub fn accept(&mut self, token: RequestToken, results: Vec<Coding>) -> bool {
        if token.0 != self.current {
            return false;
        }
        for coding in results {
            let duplicate = self
                .items
                .iter()
                .any(|c| c.system == coding.system && c.code == coding.code);
            if !duplicate {
                self.items.push(coding);
            }
        }
        true
    }

    /// Forget the list and any request in flight
    pub fn reset(&mut self) {
        self.current += 1;
        self.items.clear();
    }

    pub fn items(&self) -> &[Coding] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
