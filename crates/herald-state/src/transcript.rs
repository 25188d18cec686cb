//! Append-only utterance transcript with a running turn counter.

use crate::store::{StateScope, StateStore};
use herald_core::error::HeraldError;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const TRANSCRIPT_TAG: &str = "log";

/// One transcript record: everything said, in order, plus the turn count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub utterances: Vec<String>,
    pub turn_number: u64,
}

/// Append-only transcript over the state store.
///
/// All turns share the log stored under `log_id`, whoever they came from.
/// Appends are serialized so `turn_number` always equals the number of
/// utterances, even when turns from different users land concurrently.
pub struct TranscriptLog {
    store: StateStore,
    log_id: String,
    append_lock: Mutex<()>,
}

impl TranscriptLog {
    pub fn new(store: StateStore, log_id: impl Into<String>) -> Self {
        Self {
            store,
            log_id: log_id.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Append one utterance and return the updated entry.
    ///
    /// Read and write failures surface distinctly (`StoreRead` vs
    /// `StoreWrite`); neither is fatal to the calling turn, and a failed
    /// append leaves the stored entry untouched.
    pub async fn append(&self, utterance: &str) -> Result<TranscriptEntry, HeraldError> {
        let _guard = self.append_lock.lock().await;
        let scope = StateScope::Shared(self.log_id.clone());
        let mut entry: TranscriptEntry = self
            .store
            .load(&scope, TRANSCRIPT_TAG)
            .await?
            .unwrap_or_default();
        entry.utterances.push(utterance.to_string());
        entry.turn_number += 1;
        self.store.save(&scope, TRANSCRIPT_TAG, &entry).await?;
        Ok(entry)
    }

    /// Read the current transcript without appending.
    pub async fn entry(&self) -> Result<TranscriptEntry, HeraldError> {
        let scope = StateScope::Shared(self.log_id.clone());
        Ok(self
            .store
            .load(&scope, TRANSCRIPT_TAG)
            .await?
            .unwrap_or_default())
    }
}
