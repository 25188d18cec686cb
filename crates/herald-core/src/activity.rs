use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The addressing tuple needed to resume delivery into a previously seen
/// conversation without a new inbound message.
///
/// Opaque to the core beyond being the handle the channel adapter needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAddress {
    /// Channel the conversation lives on (e.g. "console", "webchat").
    pub channel_id: String,
    /// Endpoint the adapter reconnects through.
    pub service_url: String,
    pub conversation_id: String,
    /// Platform-specific user ID.
    pub user_id: String,
    pub bot_id: String,
}

/// One inbound message turn from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingActivity {
    pub id: Uuid,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Where this turn came from. Captured fresh on every turn — a
    /// reconnect may change it, and the latest capture wins.
    pub address: ConversationAddress,
}

impl IncomingActivity {
    /// Build an activity stamped with the current instant.
    pub fn new(text: impl Into<String>, address: ConversationAddress) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp: Utc::now(),
            address,
        }
    }
}
