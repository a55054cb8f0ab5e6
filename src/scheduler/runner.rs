//! Reminder background loop.
//!
//! Spawns a tokio task that waits for the platform connection to report
//! ready, then posts the reminder into the target channel on a fixed period.
//! Per-tick failures are logged and skipped; the loop itself never stops.

use crate::channels::traits::{
    ChannelAdapter, ChannelId, ChannelOutboundMessage, ReadySignal, SendError,
};
use crate::config::ReminderConfig;
use crate::scheduler::history::{TickHistory, TickRecord};
use crate::scheduler::outcome::TickOutcome;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// What the loop posts, where, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    pub channel_id: ChannelId,
    pub text: String,
    pub interval: Duration,
}

impl From<&ReminderConfig> for ReminderSettings {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            channel_id: ChannelId(config.channel_id),
            text: config.text.clone(),
            interval: config.interval(),
        }
    }
}

/// Periodic reminder sender.
///
/// Cheap to clone; clones share the running flag and history, so at most one
/// loop task exists per `ReminderLoop` regardless of how many handles call
/// [`ReminderLoop::start`].
#[derive(Clone)]
pub struct ReminderLoop {
    inner: Arc<Inner>,
}

struct Inner {
    adapter: Arc<dyn ChannelAdapter>,
    settings: ReminderSettings,
    running: AtomicBool,
    history: Mutex<TickHistory>,
}

impl ReminderLoop {
    pub fn new(adapter: Arc<dyn ChannelAdapter>, settings: ReminderSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                adapter,
                settings,
                running: AtomicBool::new(false),
                history: Mutex::new(TickHistory::default()),
            }),
        }
    }

    /// Whether the loop task has been started.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Start the loop. The task waits on `ready` before its first tick.
    ///
    /// Returns `None` without spawning anything when the loop is already running.
    pub fn start(&self, ready: ReadySignal) -> Option<tokio::task::JoinHandle<()>> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("reminder loop already running; start ignored");
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move { this.run(ready).await }))
    }

    async fn run(self, ready: ReadySignal) {
        match ready.await {
            Ok(info) => info!("connected as {}", info.user_name),
            Err(_) => {
                warn!("connection closed before becoming ready; reminder loop not started");
                self.inner.running.store(false, Ordering::Release);
                return;
            }
        }

        let settings = &self.inner.settings;
        info!(
            "reminder loop started: every {}s into channel {}",
            settings.interval.as_secs(),
            settings.channel_id
        );

        // First tick fires immediately; a tick that overruns the period skips, never catches up.
        let mut interval = tokio::time::interval(settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Execute one tick: resolve the channel, send the reminder, log and record the outcome.
    pub async fn tick(&self) -> TickRecord {
        let outcome = self.attempt().await;
        let record = self
            .inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome, Utc::now());

        let at = record.at.format("%H:%M:%S");
        let channel = self.inner.settings.channel_id;
        let label = record.outcome.label();
        match &record.outcome {
            TickOutcome::Sent { .. } => {
                info!(%channel, %at, outcome = label, "{}", record.outcome);
            }
            TickOutcome::ChannelNotFound { .. } => {
                warn!(%channel, %at, outcome = label, "{}", record.outcome);
            }
            TickOutcome::PermissionDenied { .. } | TickOutcome::Failed { .. } => {
                error!(%channel, %at, outcome = label, "{}", record.outcome);
            }
        }
        record
    }

    async fn attempt(&self) -> TickOutcome {
        let settings = &self.inner.settings;
        let adapter = &self.inner.adapter;

        let channel = match adapter.resolve_channel(settings.channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                return TickOutcome::ChannelNotFound {
                    channel_id: settings.channel_id.0,
                };
            }
            Err(e) => {
                warn!("{} channel lookup failed: {e}", adapter.id());
                return TickOutcome::ChannelNotFound {
                    channel_id: settings.channel_id.0,
                };
            }
        };

        let message = ChannelOutboundMessage {
            channel_id: channel.id,
            text: settings.text.clone(),
        };
        match adapter.send(message).await {
            Ok(()) => TickOutcome::Sent {
                channel_name: channel.name,
            },
            Err(SendError::PermissionDenied) => TickOutcome::PermissionDenied {
                channel_id: channel.id.0,
            },
            Err(SendError::Other(detail)) => TickOutcome::Failed { detail },
        }
    }

    /// Recent tick records, oldest first.
    pub fn history(&self) -> Vec<TickRecord> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records()
    }

    /// Total ticks executed since start.
    pub fn total_ticks(&self) -> u64 {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .total_ticks()
    }
}
