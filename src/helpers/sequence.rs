use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Hands out monotonically increasing tickets so a response can tell whether a newer
/// request of the same kind was dispatched after it.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Same as [`RequestSequencer`] but tracked per key, e.g. per restaurant id.
#[derive(Debug, Default)]
pub struct KeyedSequencer {
    counter: AtomicU64,
    latest: Mutex<HashMap<String, u64>>,
}

impl KeyedSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: &str) -> Ticket {
        let ticket = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.insert(key.to_string(), ticket);
        Ticket(ticket)
    }

    pub fn is_current(&self, key: &str, ticket: Ticket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(key).copied() == Some(ticket.0)
    }

    /// Marks `ticket` as answered. Returns whether it was still the newest one for
    /// `key`; the newest ticket's entry is dropped once it completes.
    pub fn complete(&self, key: &str, ticket: Ticket) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if latest.get(key).copied() == Some(ticket.0) {
            latest.remove(key);
            true
        } else {
            false
        }
    }
}
