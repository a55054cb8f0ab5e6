//! Startup sequencing.
//!
//! Order: liveness endpoint first (so the host sees a port even while the
//! bot is still logging in), then the platform session, then the reminder
//! loop gated on the session's readiness signal. A session that drops after
//! becoming ready is reopened; the reminder loop keeps its schedule.

use crate::channels::discord::DiscordAdapter;
use crate::channels::traits::{ChannelAdapter, ready_signal};
use crate::config::NotifierConfig;
use crate::credentials::Credential;
use crate::error::Result;
use crate::health;
use crate::scheduler::{ReminderLoop, ReminderSettings};
use std::sync::Arc;
use tracing::{info, warn};

/// Connect to Discord with `credential` and run until a fatal error.
pub async fn run(config: &NotifierConfig, credential: Credential) -> Result<()> {
    let adapter = DiscordAdapter::new(credential, &config.discord)?;
    run_with_adapter(config, Arc::new(adapter)).await
}

/// Same as [`run`] over an arbitrary adapter.
pub async fn run_with_adapter(
    config: &NotifierConfig,
    adapter: Arc<dyn ChannelAdapter>,
) -> Result<()> {
    if config.health.enabled {
        health::spawn(config.health.clone());
    } else {
        info!("health check disabled");
    }

    let settings = ReminderSettings::from(&config.reminder);
    info!(
        "starting {} session; reminder every {}s into channel {}",
        adapter.id(),
        settings.interval.as_secs(),
        settings.channel_id
    );

    let (mut ready_tx, ready_rx) = ready_signal();
    let reminder = ReminderLoop::new(Arc::clone(&adapter), settings);
    reminder.start(ready_rx);

    let delay = config.discord.reconnect_delay();
    loop {
        // The session runs on this task; it only returns when it fails or ends.
        match adapter.connect(ready_tx).await {
            Ok(()) => warn!("{} session ended; reconnecting", adapter.id()),
            Err(err) if !err.is_fatal() => {
                warn!("{} {err}; reconnecting in {}ms", adapter.id(), delay.as_millis());
            }
            Err(err) => return Err(err),
        }
        tokio::time::sleep(delay).await;

        let (tx, rx) = ready_signal();
        // Already running: the loop keeps its schedule and this receiver is dropped.
        reminder.start(rx);
        ready_tx = tx;
    }
}
