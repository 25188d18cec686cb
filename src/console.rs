//! Console channel harness — stdin turns in, stdout deliveries out.
//!
//! Stands in for a real transport so `herald start` exercises the full
//! turn loop locally. A production deployment plugs its own
//! [`ChannelAdapter`] in instead.

use async_trait::async_trait;
use herald_core::{
    activity::{ConversationAddress, IncomingActivity},
    error::HeraldError,
    traits::{ChannelAdapter, Dialog, DialogStateHandle, TurnContext},
};
use serde_json::Value;

/// Turn context that prints deliveries to stdout.
pub struct ConsoleTurnContext {
    user_id: String,
}

#[async_trait]
impl TurnContext for ConsoleTurnContext {
    async fn send_activity(&self, text: &str) -> Result<(), HeraldError> {
        println!("[herald → {}] {text}", self.user_id);
        Ok(())
    }
}

/// Adapter that "resumes" a console conversation by writing to stdout.
pub struct ConsoleAdapter;

#[async_trait]
impl ChannelAdapter for ConsoleAdapter {
    async fn resume_conversation(
        &self,
        _app_id: &str,
        address: &ConversationAddress,
    ) -> Result<Box<dyn TurnContext>, HeraldError> {
        Ok(Box::new(ConsoleTurnContext {
            user_id: address.user_id.clone(),
        }))
    }
}

/// Fixed address for the local console user.
pub fn console_address() -> ConversationAddress {
    ConversationAddress {
        channel_id: "console".to_string(),
        service_url: "local".to_string(),
        conversation_id: "console-session".to_string(),
        user_id: "local-user".to_string(),
        bot_id: "herald".to_string(),
    }
}

/// Minimal dialog executor: echoes the turn and counts how many turns it
/// has handled through its durable state slot.
pub struct EchoDialog;

#[async_trait]
impl Dialog for EchoDialog {
    async fn run(
        &self,
        ctx: &dyn TurnContext,
        activity: &IncomingActivity,
        state: &dyn DialogStateHandle,
    ) -> Result<(), HeraldError> {
        let turns = state
            .load()
            .await?
            .and_then(|v| v.get("turns").and_then(Value::as_u64))
            .unwrap_or(0)
            + 1;
        state.save(serde_json::json!({ "turns": turns })).await?;
        ctx.send_activity(&format!(
            "You said \"{}\" — message {turns} since I learned your name.",
            activity.text
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_state::store::{StateScope, StateStore};
    use std::sync::Mutex;

    struct CollectingContext {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TurnContext for CollectingContext {
        async fn send_activity(&self, text: &str) -> Result<(), HeraldError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_echo_dialog_counts_turns() {
        let store = StateStore::in_memory();
        let handle = store.handle(StateScope::Conversation("c1".into()), "dialog");
        let ctx = CollectingContext {
            sent: Mutex::new(Vec::new()),
        };
        let dialog = EchoDialog;

        for expected in 1..=3u64 {
            let activity = IncomingActivity::new("ping", console_address());
            dialog.run(&ctx, &activity, &handle).await.unwrap();
            let sent = ctx.sent.lock().unwrap();
            assert!(
                sent.last().unwrap().contains(&format!("message {expected}")),
                "turn {expected}: {sent:?}"
            );
        }
    }
}
