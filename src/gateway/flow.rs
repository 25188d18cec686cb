//! Name-collection flow — the per-conversation state machine.

use herald_core::error::HeraldError;
use herald_state::store::{StateScope, StateStore};
use serde::{Deserialize, Serialize};

const FLOW_TAG: &str = "flow";
const PROFILE_TAG: &str = "profile";

/// Conversation-scoped flow record. Created on first access, committed at
/// the end of every turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowRecord {
    pub prompted_for_name: bool,
}

impl FlowRecord {
    /// Load the record for a conversation, or start fresh.
    pub async fn load_or_default(
        store: &StateStore,
        conversation_id: &str,
    ) -> Result<Self, HeraldError> {
        Ok(store
            .load(&StateScope::Conversation(conversation_id.to_string()), FLOW_TAG)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, store: &StateStore, conversation_id: &str) -> Result<(), HeraldError> {
        store
            .save(
                &StateScope::Conversation(conversation_id.to_string()),
                FLOW_TAG,
                self,
            )
            .await
    }
}

/// User-scoped profile record. Survives across conversations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
}

impl UserProfile {
    pub async fn load_or_default(store: &StateStore, user_id: &str) -> Result<Self, HeraldError> {
        Ok(store
            .load(&StateScope::User(user_id.to_string()), PROFILE_TAG)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, store: &StateStore, user_id: &str) -> Result<(), HeraldError> {
        store
            .save(&StateScope::User(user_id.to_string()), PROFILE_TAG, self)
            .await
    }
}

/// Where the name-collection flow stands for the current turn.
///
/// Derived from the two persisted records so the router can match
/// exhaustively instead of scattering boolean checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No name yet and the user has not been asked.
    NotPrompted,
    /// Asked last turn; the next utterance is the name.
    Prompted,
    /// Name known; turns belong to the dialog executor.
    Ready,
}

impl FlowState {
    pub fn derive(profile: &UserProfile, flow: &FlowRecord) -> Self {
        match (&profile.name, flow.prompted_for_name) {
            (Some(_), _) => Self::Ready,
            (None, false) => Self::NotPrompted,
            (None, true) => Self::Prompted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_not_prompted() {
        let state = FlowState::derive(&UserProfile::default(), &FlowRecord::default());
        assert_eq!(state, FlowState::NotPrompted);
    }

    #[test]
    fn test_derive_prompted() {
        let flow = FlowRecord {
            prompted_for_name: true,
        };
        let state = FlowState::derive(&UserProfile::default(), &flow);
        assert_eq!(state, FlowState::Prompted);
    }

    #[test]
    fn test_derive_ready_regardless_of_prompt_flag() {
        let profile = UserProfile {
            name: Some("Alice".to_string()),
        };
        for prompted_for_name in [false, true] {
            let state = FlowState::derive(&profile, &FlowRecord { prompted_for_name });
            assert_eq!(state, FlowState::Ready);
        }
    }

    #[tokio::test]
    async fn test_records_round_trip_per_scope() {
        let store = StateStore::in_memory();

        let flow = FlowRecord {
            prompted_for_name: true,
        };
        flow.save(&store, "conv-1").await.unwrap();

        let profile = UserProfile {
            name: Some("Alice".to_string()),
        };
        profile.save(&store, "user-1").await.unwrap();

        let flow = FlowRecord::load_or_default(&store, "conv-1").await.unwrap();
        assert!(flow.prompted_for_name);

        // A different conversation starts from the default.
        let other = FlowRecord::load_or_default(&store, "conv-2").await.unwrap();
        assert!(!other.prompted_for_name);

        let profile = UserProfile::load_or_default(&store, "user-1").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Alice"));
    }
}
