//! Change detection for polled display slots.
//!
//! Every card field (value, chart, log tail, holdings, transactions) is a
//! slot that remembers what it last handed to the renderer. On each poll
//! the slot compares the freshly fetched value against that memory and
//! answers `Changed` or `Unchanged`, so pollers on a fixed cadence skip
//! redundant re-renders.

use std::time::Duration;
use tracing::warn;

/// Fast cadence for the log tail slot.
pub const LOG_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Slow cadence for value, chart, holdings and transaction slots.
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Poll result for one slot: the caller re-renders only on `Changed`.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<T> {
    Changed(T),
    Unchanged,
}

impl<T> Refresh<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Refresh::Changed(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Refresh::Changed(v) => Some(v),
            Refresh::Unchanged => None,
        }
    }
}

/// Last-rendered state of one display slot.
#[derive(Debug, Default)]
pub struct Slot<T> {
    last: Option<T>,
}

impl<T: Clone + PartialEq> Slot<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Compare `fresh` against the last rendered value. The first update
    /// is always `Changed`.
    pub fn update(&mut self, fresh: T) -> Refresh<T> {
        if self.last.as_ref() == Some(&fresh) {
            return Refresh::Unchanged;
        }
        self.last = Some(fresh.clone());
        Refresh::Changed(fresh)
    }

    /// Run a fallible fetch and feed the slot. A fetch failure is
    /// swallowed at the poll boundary: the slot answers `Unchanged` and
    /// the failure goes to the log, so the polling loop stays alive.
    pub fn update_with<E: std::fmt::Display>(
        &mut self,
        slot: &str,
        fetch: impl FnOnce() -> Result<T, E>,
    ) -> Refresh<T> {
        match fetch() {
            Ok(fresh) => self.update(fresh),
            Err(e) => {
                warn!("{slot} fetch failed: {e} — keeping last rendered state");
                Refresh::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_is_changed() {
        let mut slot = Slot::new();
        assert_eq!(slot.update("a"), Refresh::Changed("a"));
    }

    #[test]
    fn refresh_accessors_match_the_variant() {
        assert!(Refresh::Changed(1).is_changed());
        assert!(!Refresh::<i32>::Unchanged.is_changed());
        assert_eq!(Refresh::Changed("x").into_option(), Some("x"));
        assert_eq!(Refresh::<&str>::Unchanged.into_option(), None);
    }

    #[test]
    fn equal_value_is_unchanged() {
        let mut slot = Slot::new();
        slot.update(42);
        assert_eq!(slot.update(42), Refresh::Unchanged);
    }

    #[test]
    fn different_value_is_changed() {
        let mut slot = Slot::new();
        slot.update("old");
        assert_eq!(slot.update("new"), Refresh::Changed("new"));
        assert_eq!(slot.update("new"), Refresh::Unchanged);
    }

    #[test]
    fn fetch_failure_is_unchanged_and_keeps_state() {
        let mut slot = Slot::new();
        slot.update(7);
        let out = slot.update_with("value", || Err::<i32, _>("db locked"));
        assert_eq!(out, Refresh::Unchanged);
        // The remembered value survived the failed fetch.
        assert_eq!(slot.update(7), Refresh::Unchanged);
    }

    #[test]
    fn fetch_failure_before_any_value_is_unchanged() {
        let mut slot: Slot<i32> = Slot::new();
        let out = slot.update_with("logs", || Err::<i32, _>("no such table"));
        assert_eq!(out, Refresh::Unchanged);
        assert_eq!(slot.update(1), Refresh::Changed(1));
    }
}
