//! Gateway — routes each inbound turn through address registration, the
//! shared transcript, and the name/dialog state machine.

mod flow;
pub mod notifier;

use flow::{FlowRecord, FlowState, UserProfile};
use herald_core::{
    activity::IncomingActivity,
    error::HeraldError,
    traits::{Dialog, TurnContext},
};
use herald_state::{
    registry::ConversationRegistry,
    store::{StateScope, StateStore},
    transcript::TranscriptLog,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Slot the dialog executor persists its own record under.
const DIALOG_TAG: &str = "dialog";

const NAME_PROMPT: &str = "Hello! What is your name?";

/// The central turn router.
pub struct Gateway {
    store: StateStore,
    registry: Arc<ConversationRegistry>,
    transcript: TranscriptLog,
    dialog: Arc<dyn Dialog>,
}

impl Gateway {
    pub fn new(
        store: StateStore,
        registry: Arc<ConversationRegistry>,
        transcript: TranscriptLog,
        dialog: Arc<dyn Dialog>,
    ) -> Self {
        Self {
            store,
            registry,
            transcript,
            dialog,
        }
    }

    /// Process one inbound turn end to end.
    ///
    /// Scoped state loaded here is committed exactly once at the end of the
    /// turn, whatever happened in between — a transcript failure must not
    /// lose a prompt flag that was already flipped.
    pub async fn handle_turn(&self, ctx: &dyn TurnContext, activity: &IncomingActivity) {
        let address = &activity.address;
        info!(
            "[{}] turn from {}: {}",
            address.channel_id,
            address.user_id,
            preview(&activity.text)
        );

        // Re-capture the address on every turn; a reconnect may have
        // changed it and the latest capture wins.
        self.registry.upsert(address.clone());

        // Transcript next — the user gets a confirmation line with the
        // running log, or an apology when the store is unhappy.
        match self.transcript.append(&activity.text).await {
            Ok(entry) => {
                let line = format!(
                    "Turn {}: the log now holds: {}",
                    entry.turn_number,
                    entry.utterances.join(", ")
                );
                self.send(ctx, &line).await;
            }
            Err(e @ HeraldError::StoreRead(_)) => {
                warn!("transcript read failed: {e}");
                self.send(ctx, "Sorry, I couldn't read our transcript just now.")
                    .await;
            }
            Err(e) => {
                warn!("transcript write failed: {e}");
                self.send(ctx, "Sorry, I couldn't add that to our transcript.")
                    .await;
            }
        }

        // Load both scoped records up front; defaults stand in when the
        // store misbehaves so the turn still makes progress.
        let mut flow_record =
            match FlowRecord::load_or_default(&self.store, &address.conversation_id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("conversation state read failed: {e}");
                    self.send(ctx, "Sorry, I lost track of where we were. Starting over.")
                        .await;
                    FlowRecord::default()
                }
            };
        let mut profile = match UserProfile::load_or_default(&self.store, &address.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("user profile read failed: {e}");
                UserProfile::default()
            }
        };

        match FlowState::derive(&profile, &flow_record) {
            FlowState::NotPrompted => {
                self.send(ctx, NAME_PROMPT).await;
                flow_record.prompted_for_name = true;
            }
            FlowState::Prompted => {
                let name = activity.text.trim().to_string();
                self.send(ctx, &format!("Thanks, {name}! I'll remember that."))
                    .await;
                profile.name = Some(name);
            }
            FlowState::Ready => {
                let handle = self.store.handle(
                    StateScope::Conversation(address.conversation_id.clone()),
                    DIALOG_TAG,
                );
                if let Err(e) = self.dialog.run(ctx, activity, &handle).await {
                    error!("dialog executor failed: {e}");
                    self.send(ctx, "Sorry, I hit a snag continuing our conversation.")
                        .await;
                }
            }
        }

        // Commit both records, unconditionally.
        if let Err(e) = flow_record.save(&self.store, &address.conversation_id).await {
            error!("failed to save conversation state: {e}");
            self.send(ctx, "Sorry, I may not remember this conversation next time.")
                .await;
        }
        if let Err(e) = profile.save(&self.store, &address.user_id).await {
            error!("failed to save user profile: {e}");
        }
    }

    async fn send(&self, ctx: &dyn TurnContext, text: &str) {
        if let Err(e) = ctx.send_activity(text).await {
            error!("failed to send activity: {e}");
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > 60 {
        let truncated: String = text.chars().take(60).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
