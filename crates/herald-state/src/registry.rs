//! Conversation registry — every user Herald can reach proactively.

use herald_core::activity::ConversationAddress;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Concurrency-safe map from user identity to the address needed to resume
/// that user's conversation.
///
/// Registration happens on every turn start (hot path); the broadcast path
/// scans a point-in-time copy (cold path). Neither blocks the other beyond
/// the critical section of the copy itself.
#[derive(Default)]
pub struct ConversationRegistry {
    entries: RwLock<HashMap<String, ConversationAddress>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or refresh) the address for a user. Last write wins: a
    /// reconnect that produced a new address supersedes the old one.
    pub fn upsert(&self, address: ConversationAddress) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(address.user_id.clone(), address);
    }

    /// Point-in-time copy of every known address, decoupled from any
    /// mutation that happens after the copy is taken.
    pub fn snapshot(&self) -> Vec<ConversationAddress> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }

    /// Number of registered conversations.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
