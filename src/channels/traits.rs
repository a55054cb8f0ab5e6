use async_trait::async_trait;
use std::fmt;
use tokio::sync::oneshot;

/// Platform channel identifier (a Discord snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel the connection can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChannel {
    pub id: ChannelId,
    /// Display name (`#general` without the hash).
    pub name: String,
}

/// Outbound message posted into a channel.
#[derive(Debug, Clone)]
pub struct ChannelOutboundMessage {
    pub channel_id: ChannelId,
    pub text: String,
}

/// Payload of the readiness signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyInfo {
    /// Name the bot is logged in as.
    pub user_name: String,
}

/// Sending half of the one-shot readiness signal.
pub type ReadyNotifier = oneshot::Sender<ReadyInfo>;

/// Receiving half of the one-shot readiness signal.
pub type ReadySignal = oneshot::Receiver<ReadyInfo>;

/// Create a fresh readiness signal pair.
pub fn ready_signal() -> (ReadyNotifier, ReadySignal) {
    oneshot::channel()
}

/// Why a send failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The bot may not post in this channel.
    #[error("missing permission to send messages")]
    PermissionDenied,

    /// Anything else (HTTP failure, rate limit, server error).
    #[error("{0}")]
    Other(String),
}

/// Channel adapter contract. The reminder loop only needs these operations.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Stable platform identifier (e.g. `discord`).
    fn id(&self) -> &'static str;

    /// Establish the session, fire `ready` once it is usable, then keep it
    /// alive. Returns only when the session ends or fails to start.
    ///
    /// Once `ready` has fired, an ending session is reported as `Ok(())` or
    /// [`NotifierError::SessionLost`](crate::error::NotifierError::SessionLost)
    /// and the caller connects again. Anything else is fatal.
    async fn connect(&self, ready: ReadyNotifier) -> crate::error::Result<()>;

    /// Look a channel up. `Ok(None)` means it does not exist or is not visible.
    async fn resolve_channel(
        &self,
        channel_id: ChannelId,
    ) -> anyhow::Result<Option<ResolvedChannel>>;

    /// Post a message.
    async fn send(&self, message: ChannelOutboundMessage) -> Result<(), SendError>;
}
