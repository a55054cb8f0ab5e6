//! Startup sequencing tests.
//!
//! Drive `startup::run_with_adapter` with scripted adapters to check the
//! fatal/non-fatal split, reconnection after a dropped session, and that the
//! liveness endpoint stays independent of the platform session.

use async_trait::async_trait;
use bump_notifier::channels::{
    ChannelAdapter, ChannelId, ChannelOutboundMessage, ReadyInfo, ReadyNotifier, ResolvedChannel,
    SendError,
};
use bump_notifier::config::NotifierConfig;
use bump_notifier::credentials::Credential;
use bump_notifier::{NotifierError, startup};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the scripted session behaves.
enum Session {
    /// Fail immediately with this error.
    Fail(fn() -> NotifierError),
    /// Signal ready, stay up for the given duration, then end. Repeats on every connect.
    ReadyFor(Duration),
    /// Like `ReadyFor`, but the session ends the way a gateway reconnect request does.
    ReadyThenLost(Duration),
    /// Never become ready, never end.
    Hang,
}

struct ScriptedAdapter {
    session: Session,
    channel_visible: bool,
    connects: AtomicUsize,
    sent: Mutex<Vec<ChannelOutboundMessage>>,
}

impl ScriptedAdapter {
    fn new(session: Session, channel_visible: bool) -> Arc<Self> {
        Arc::new(Self {
            session,
            channel_visible,
            connects: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn sent(&self) -> Vec<ChannelOutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelAdapter for ScriptedAdapter {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn connect(&self, ready: ReadyNotifier) -> bump_notifier::Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.session {
            Session::Fail(make) => Err(make()),
            Session::ReadyFor(duration) => {
                let _ = ready.send(ReadyInfo {
                    user_name: "BumpBot".to_owned(),
                });
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            Session::ReadyThenLost(duration) => {
                let _ = ready.send(ReadyInfo {
                    user_name: "BumpBot".to_owned(),
                });
                tokio::time::sleep(*duration).await;
                Err(NotifierError::SessionLost(
                    "discord requested a reconnect".to_owned(),
                ))
            }
            Session::Hang => {
                let _keep = ready;
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn resolve_channel(
        &self,
        channel_id: ChannelId,
    ) -> anyhow::Result<Option<ResolvedChannel>> {
        Ok(self.channel_visible.then(|| ResolvedChannel {
            id: channel_id,
            name: "bump".to_owned(),
        }))
    }

    async fn send(&self, message: ChannelOutboundMessage) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

fn quiet_config() -> NotifierConfig {
    let mut config = NotifierConfig::default();
    config.health.enabled = false;
    config.discord.reconnect_delay_ms = 10;
    config
}

async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn missing_token_is_a_fatal_configuration_error() {
    let err = Credential::from_lookup(|_| None).unwrap_err();
    assert!(matches!(err, NotifierError::ConfigurationMissing(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn invalid_credential_is_fatal_and_sends_nothing() {
    let adapter = ScriptedAdapter::new(
        Session::Fail(|| NotifierError::AuthenticationInvalid("401".to_owned())),
        true,
    );

    let err = startup::run_with_adapter(&quiet_config(), adapter.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, NotifierError::AuthenticationInvalid(_)));
    assert!(err.is_fatal());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(adapter.sent().is_empty());
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let adapter = ScriptedAdapter::new(
        Session::Fail(|| NotifierError::ConnectionFailure("gateway unreachable".to_owned())),
        true,
    );

    let err = startup::run_with_adapter(&quiet_config(), adapter)
        .await
        .unwrap_err();
    assert!(matches!(err, NotifierError::ConnectionFailure(_)));
}

#[tokio::test]
async fn ready_session_sends_reminder_to_target() {
    let adapter = ScriptedAdapter::new(Session::ReadyFor(Duration::from_millis(50)), true);
    let config = quiet_config();

    let outcome = tokio::time::timeout(
        Duration::from_millis(500),
        startup::run_with_adapter(&config, adapter.clone()),
    )
    .await;

    assert!(outcome.is_err(), "dropped sessions must not end the run: {outcome:?}");
    assert!(adapter.connects() >= 2, "session was never reopened");
    // One loop across every reconnect: only the first tick has fired within the 3h period.
    let sent = adapter.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel_id, ChannelId(1_272_611_563_307_794_484));
    assert_eq!(sent[0].text, config.reminder.text);
}

#[tokio::test]
async fn reminder_keeps_ticking_across_reconnects() {
    let adapter = ScriptedAdapter::new(Session::ReadyThenLost(Duration::from_millis(100)), true);
    let mut config = quiet_config();
    config.reminder.interval_secs = 1;

    let outcome = tokio::time::timeout(
        Duration::from_millis(1_500),
        startup::run_with_adapter(&config, adapter.clone()),
    )
    .await;

    assert!(outcome.is_err(), "run returned: {outcome:?}");
    assert!(adapter.connects() >= 3);
    assert_eq!(adapter.sent().len(), 2, "ticks at 0s and 1s, from a single loop");
}

#[tokio::test]
async fn invisible_channel_sends_nothing() {
    let adapter = ScriptedAdapter::new(Session::ReadyFor(Duration::from_millis(200)), false);

    let _ = tokio::time::timeout(
        Duration::from_millis(300),
        startup::run_with_adapter(&quiet_config(), adapter.clone()),
    )
    .await;
    assert!(adapter.sent().is_empty());
}

#[tokio::test]
async fn liveness_answers_while_session_never_connects() {
    let port = free_port().await;
    let mut config = NotifierConfig::default();
    config.health.host = "127.0.0.1".to_owned();
    config.health.port = port;

    let adapter = ScriptedAdapter::new(Session::Hang, true);
    let runner = tokio::spawn(async move {
        let _ = startup::run_with_adapter(&config, adapter).await;
    });

    let url = format!("http://127.0.0.1:{port}/anything");
    let body = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(resp) = reqwest::get(&url).await {
                assert_eq!(resp.status(), reqwest::StatusCode::OK);
                break resp.text().await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("health endpoint never came up");

    assert_eq!(body, "Bot is running and healthy.");
    runner.abort();
}
