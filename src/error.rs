//! Error types for the bump notifier.

/// Top-level error type for the notifier service.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// A required setting (the bot token) is absent.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The platform rejected the credential.
    #[error("invalid credential: {0}")]
    AuthenticationInvalid(String),

    /// Connection to the platform could not be established.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// An established session dropped; the caller reconnects.
    #[error("session lost: {0}")]
    SessionLost(String),

    /// Health check listener could not bind its port.
    #[error("health check bind failed on {addr}: {source}")]
    HealthBind {
        /// Address the listener tried to bind.
        addr: String,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NotifierError {
    /// Whether this error must terminate the process.
    ///
    /// A lost session and a failed health bind are survivable; everything
    /// else happens before the bot is usable and ends it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing(_)
                | Self::Config(_)
                | Self::AuthenticationInvalid(_)
                | Self::ConnectionFailure(_)
                | Self::Io(_)
        )
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NotifierError>;
