use crate::{
    activity::{ConversationAddress, IncomingActivity},
    error::HeraldError,
};
use async_trait::async_trait;

/// A sendable handle into one open conversation turn.
///
/// Produced by the channel adapter — either for an inbound turn, or when a
/// previously seen conversation is resumed for proactive delivery.
#[async_trait]
pub trait TurnContext: Send + Sync {
    /// Deliver a text message into the conversation.
    async fn send_activity(&self, text: &str) -> Result<(), HeraldError>;
}

/// Messaging channel adapter — the transport seam.
///
/// Implemented by the wire layer outside this crate. The core only needs
/// the ability to reconstitute a sendable context from a stored address.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Reconstitute a sendable context for a previously seen conversation.
    async fn resume_conversation(
        &self,
        app_id: &str,
        address: &ConversationAddress,
    ) -> Result<Box<dyn TurnContext>, HeraldError>;
}

/// Durable state slot handed to the dialog executor.
///
/// The executor's record is opaque to the core; it round-trips as raw JSON.
#[async_trait]
pub trait DialogStateHandle: Send + Sync {
    async fn load(&self) -> Result<Option<serde_json::Value>, HeraldError>;
    async fn save(&self, value: serde_json::Value) -> Result<(), HeraldError>;
}

/// Generic multi-step dialog executor.
///
/// A black box from the router's point of view: it consumes a turn and a
/// state handle and returns control when the turn is done.
#[async_trait]
pub trait Dialog: Send + Sync {
    async fn run(
        &self,
        ctx: &dyn TurnContext,
        activity: &IncomingActivity,
        state: &dyn DialogStateHandle,
    ) -> Result<(), HeraldError>;
}
