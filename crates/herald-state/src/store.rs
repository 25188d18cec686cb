//! Typed load/save of named records over an abstract key-value backend.

use async_trait::async_trait;
use herald_core::{error::HeraldError, traits::DialogStateHandle};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Abstract key-value backing store.
///
/// Implementations must be safe to call concurrently from independent
/// scopes. Same-key concurrent writes are last-completed-write-wins; no
/// transactional guarantee is offered or required.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Value>, HeraldError>;
    async fn write(&self, key: &str, value: Value) -> Result<(), HeraldError>;
}

/// Process-local backing store.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, Value>>,
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Value>, HeraldError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), HeraldError> {
        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// The lifetime/partition key a record is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateScope {
    /// Lives as long as one conversation.
    Conversation(String),
    /// Lives as long as one user, across conversations.
    User(String),
    /// Process-global slots (the utterance transcript).
    Shared(String),
}

impl StateScope {
    fn key(&self, tag: &str) -> String {
        match self {
            Self::Conversation(id) => format!("conversation/{id}/{tag}"),
            Self::User(id) => format!("user/{id}/{tag}"),
            Self::Shared(id) => format!("shared/{id}/{tag}"),
        }
    }
}

/// Typed facade over a backing store.
///
/// Constructed once at startup and cloned into every component. `load` on
/// an absent key is `Ok(None)` — default construction belongs to the
/// caller, never to the store.
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn StorageBackend>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory — the default single-process setup.
    pub fn in_memory() -> Self {
        tracing::debug!("state store initialized with in-memory backend");
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Load the record stored under `scope`/`tag`, if any.
    pub async fn load<T: DeserializeOwned>(
        &self,
        scope: &StateScope,
        tag: &str,
    ) -> Result<Option<T>, HeraldError> {
        let key = scope.key(tag);
        let value = self
            .backend
            .read(&key)
            .await
            .map_err(|e| HeraldError::StoreRead(format!("read {key}: {e}")))?;
        match value {
            Some(value) => {
                let record = serde_json::from_value(value)
                    .map_err(|e| HeraldError::StoreRead(format!("corrupt record {key}: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Persist a record under `scope`/`tag`. Last completed write wins; no
    /// conflict detection.
    pub async fn save<T: Serialize>(
        &self,
        scope: &StateScope,
        tag: &str,
        record: &T,
    ) -> Result<(), HeraldError> {
        let key = scope.key(tag);
        let value = serde_json::to_value(record)?;
        self.backend
            .write(&key, value)
            .await
            .map_err(|e| HeraldError::StoreWrite(format!("write {key}: {e}")))
    }

    /// Durable handle onto a single scoped slot, for callers that should
    /// not see the rest of the store (the dialog executor).
    pub fn handle(&self, scope: StateScope, tag: impl Into<String>) -> ScopedStateHandle {
        ScopedStateHandle {
            store: self.clone(),
            scope,
            tag: tag.into(),
        }
    }
}

/// A [`DialogStateHandle`] bound to one scope and tag.
pub struct ScopedStateHandle {
    store: StateStore,
    scope: StateScope,
    tag: String,
}

#[async_trait]
impl DialogStateHandle for ScopedStateHandle {
    async fn load(&self) -> Result<Option<Value>, HeraldError> {
        self.store.load(&self.scope, &self.tag).await
    }

    async fn save(&self, value: Value) -> Result<(), HeraldError> {
        self.store.save(&self.scope, &self.tag, &value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        count: u32,
    }

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let store = StateStore::in_memory();
        let scope = StateScope::User("u1".into());
        let loaded: Option<Record> = store.load(&scope, "profile").await.unwrap();
        assert!(loaded.is_none(), "absent key must be None, not a default");
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = StateStore::in_memory();
        let scope = StateScope::Conversation("c1".into());
        store.save(&scope, "flow", &Record { count: 3 }).await.unwrap();
        let loaded: Option<Record> = store.load(&scope, "flow").await.unwrap();
        assert_eq!(loaded, Some(Record { count: 3 }));
    }

    #[tokio::test]
    async fn test_scopes_do_not_collide() {
        let store = StateStore::in_memory();
        let conv = StateScope::Conversation("x".into());
        let user = StateScope::User("x".into());
        store.save(&conv, "t", &Record { count: 1 }).await.unwrap();
        store.save(&user, "t", &Record { count: 2 }).await.unwrap();

        let from_conv: Option<Record> = store.load(&conv, "t").await.unwrap();
        let from_user: Option<Record> = store.load(&user, "t").await.unwrap();
        assert_eq!(from_conv, Some(Record { count: 1 }));
        assert_eq!(from_user, Some(Record { count: 2 }));
    }

    #[tokio::test]
    async fn test_last_write_wins_same_key() {
        let store = StateStore::in_memory();
        let scope = StateScope::User("u1".into());
        store.save(&scope, "profile", &Record { count: 1 }).await.unwrap();
        store.save(&scope, "profile", &Record { count: 2 }).await.unwrap();
        let loaded: Option<Record> = store.load(&scope, "profile").await.unwrap();
        assert_eq!(loaded, Some(Record { count: 2 }));
    }

    #[tokio::test]
    async fn test_scoped_handle_round_trips() {
        use herald_core::traits::DialogStateHandle as _;

        let store = StateStore::in_memory();
        let handle = store.handle(StateScope::Conversation("c1".into()), "dialog");
        assert!(handle.load().await.unwrap().is_none());

        handle.save(serde_json::json!({ "turns": 2 })).await.unwrap();
        let value = handle.load().await.unwrap().unwrap();
        assert_eq!(value["turns"], 2);
    }
}
