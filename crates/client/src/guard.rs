//! In-flight guard for non-idempotent actions.
//!
//! Starting a task and approving a redeem both create an effect per request.
//! A ticket taken from [`InFlightGuard`] marks the action as outstanding
//! until it is dropped, so a double click sends one request, not two.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of action keys with a request outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as outstanding. Returns `None` if it already is.
    #[must_use]
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightTicket> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightTicket {
            keys: Arc::clone(&self.keys),
            key,
        })
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightTicket {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let guard = InFlightGuard::new();
        let ticket = guard.try_acquire("start_task");
        assert!(ticket.is_some());
        assert!(guard.try_acquire("start_task").is_none());
        drop(ticket);
    }

    #[test]
    fn test_drop_releases_key() {
        let guard = InFlightGuard::new();
        {
            let _ticket = guard.try_acquire("approve_redeem:1");
            assert!(guard.try_acquire("approve_redeem:1").is_none());
        }
        assert!(guard.try_acquire("approve_redeem:1").is_some());
    }

    #[test]
    fn test_keys_are_independent() {
        let guard = InFlightGuard::new();
        let first = guard.try_acquire("approve_redeem:1");
        let second = guard.try_acquire("approve_redeem:2");
        assert!(first.is_some());
        assert!(second.is_some());
        assert!(guard.try_acquire("approve_redeem:2").is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = InFlightGuard::new();
        let clone = guard.clone();
        let _ticket = guard.try_acquire("start_task");
        assert!(clone.try_acquire("start_task").is_none());
    }
}
