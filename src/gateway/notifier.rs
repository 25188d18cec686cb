//! Daily proactive notification scheduling and broadcast.

use chrono::{NaiveTime, Utc};
use chrono_tz::Tz;
use herald_core::{
    activity::ConversationAddress,
    config::NotifyConfig,
    error::HeraldError,
    traits::ChannelAdapter,
};
use herald_state::registry::ConversationRegistry;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Message delivered when the daily timer fires.
const SCHEDULED_MESSAGE: &str = "Here's your scheduled check-in for today.";
/// Message delivered on a manual trigger.
const TRIGGER_MESSAGE: &str = "Hello! This is a proactive greeting from Herald.";

/// Outcome of an arming attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Timer armed to fire after this many whole seconds.
    Armed(u64),
    /// Today's target has already passed; nothing is armed until the next
    /// manual trigger. A logged no-op, not an error.
    Skipped,
}

/// Confirmation payload returned by the manual trigger.
#[derive(Debug, Serialize)]
pub struct NotifyReceipt {
    pub delivered: usize,
    pub failed: usize,
    /// Whether a follow-up timer was armed.
    pub armed: bool,
}

/// Broadcasts to every registered conversation, on a one-shot wall-clock
/// timer or on demand.
pub struct Notifier {
    adapter: Arc<dyn ChannelAdapter>,
    registry: Arc<ConversationRegistry>,
    app_id: String,
    target: NaiveTime,
    timezone: Tz,
    /// The pending one-shot timer, if any. Arming replaces it.
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Notifier {
    pub fn new(
        adapter: Arc<dyn ChannelAdapter>,
        registry: Arc<ConversationRegistry>,
        app_id: impl Into<String>,
        config: &NotifyConfig,
    ) -> Result<Arc<Self>, HeraldError> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| HeraldError::Config(format!("unknown timezone '{}'", config.timezone)))?;
        let target = NaiveTime::from_hms_opt(config.hour, config.minute, 0).ok_or_else(|| {
            HeraldError::Config(format!(
                "invalid notify time {:02}:{:02}",
                config.hour, config.minute
            ))
        })?;
        Ok(Arc::new(Self {
            adapter,
            registry,
            app_id: app_id.into(),
            target,
            timezone,
            timer: Mutex::new(None),
        }))
    }

    /// Arm the one-shot timer for today's occurrence of the target time,
    /// replacing any pending timer.
    ///
    /// When the target has already passed, nothing is armed and no
    /// broadcast happens until the next manual trigger (known limitation,
    /// see DESIGN.md).
    pub fn arm(self: &Arc<Self>) -> ArmOutcome {
        let now = Utc::now().with_timezone(&self.timezone).time();
        self.arm_at(now)
    }

    fn arm_at(self: &Arc<Self>, now: NaiveTime) -> ArmOutcome {
        let delay = match delay_until(self.target, now) {
            Some(delay) => delay,
            None => {
                info!(
                    "notify: {} already passed in {}, not arming",
                    self.target, self.timezone
                );
                return ArmOutcome::Skipped;
            }
        };
        info!(
            "notify: armed for {} {} ({}s from now)",
            self.target,
            self.timezone,
            delay.as_secs()
        );
        self.spawn_timer(delay);
        ArmOutcome::Armed(delay.as_secs())
    }

    /// Replace the pending timer with one firing after `delay`.
    fn spawn_timer(self: &Arc<Self>, delay: Duration) {
        let notifier = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.broadcast(SCHEDULED_MESSAGE).await;
            // The scheduler owns its own rearm. Today's target has just
            // passed, so this skips until a manual trigger starts the
            // next cycle.
            notifier.arm();
        });

        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = timer.replace(handle) {
            old.abort();
        }
    }

    /// Immediate broadcast plus rearm — the externally invocable
    /// "notify now" entrypoint.
    pub async fn notify_now(self: &Arc<Self>) -> NotifyReceipt {
        let (delivered, failed) = self.broadcast(TRIGGER_MESSAGE).await;
        let armed = matches!(self.arm(), ArmOutcome::Armed(_));
        NotifyReceipt {
            delivered,
            failed,
            armed,
        }
    }

    /// Deliver `text` to every address in a registry snapshot.
    ///
    /// Each address gets its own task so one slow or failing conversation
    /// never holds up the rest; no registry lock is held once the snapshot
    /// is taken.
    async fn broadcast(&self, text: &str) -> (usize, usize) {
        let addresses = self.registry.snapshot();
        info!(
            "notify: broadcasting to {} conversation(s)",
            addresses.len()
        );

        let mut handles = Vec::with_capacity(addresses.len());
        for address in addresses {
            let adapter = self.adapter.clone();
            let app_id = self.app_id.clone();
            let text = text.to_string();
            handles.push(tokio::spawn(async move {
                deliver(&*adapter, &app_id, &address, &text).await
            }));
        }

        let mut delivered = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!("notify: {e}");
                    failed += 1;
                }
                Err(e) => {
                    error!("notify: delivery task panicked: {e}");
                    failed += 1;
                }
            }
        }
        (delivered, failed)
    }

    #[cfg(test)]
    fn timer_is_pending(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Resume one conversation and deliver one message.
async fn deliver(
    adapter: &dyn ChannelAdapter,
    app_id: &str,
    address: &ConversationAddress,
    text: &str,
) -> Result<(), HeraldError> {
    let ctx = adapter
        .resume_conversation(app_id, address)
        .await
        .map_err(|e| {
            HeraldError::Delivery(format!("resume {} failed: {e}", address.conversation_id))
        })?;
    ctx.send_activity(text).await.map_err(|e| {
        HeraldError::Delivery(format!("send to {} failed: {e}", address.conversation_id))
    })
}

/// Time until the next occurrence of `target` today, or `None` when it has
/// already passed.
fn delay_until(target: NaiveTime, now: NaiveTime) -> Option<Duration> {
    let delta = target - now;
    if delta < chrono::Duration::zero() {
        return None;
    }
    delta.to_std().ok()
}
