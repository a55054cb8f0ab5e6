//! Result of a single reminder tick.

use std::fmt;

/// What happened on one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Reminder posted.
    Sent {
        /// Display name of the channel it went to.
        channel_name: String,
    },
    /// Channel missing or invisible to the bot; nothing was sent.
    ChannelNotFound {
        /// Configured channel snowflake.
        channel_id: u64,
    },
    /// Bot lacks permission to post in the channel.
    PermissionDenied {
        /// Configured channel snowflake.
        channel_id: u64,
    },
    /// Send failed for any other reason.
    Failed {
        /// Error detail.
        detail: String,
    },
}

impl TickOutcome {
    /// Short label used in structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sent { .. } => "sent",
            Self::ChannelNotFound { .. } => "channel_not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Failed { .. } => "failed",
        }
    }
}

// Operator-facing lines stay in French: the bot serves a French-speaking server.
impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent { channel_name } => write!(
                f,
                "SUCCESS : message de rappel envoyé dans le salon '{channel_name}'"
            ),
            Self::ChannelNotFound { channel_id } => write!(
                f,
                "AVERTISSEMENT : salon avec l'ID {channel_id} non trouvé, vérifiez l'ID"
            ),
            Self::PermissionDenied { channel_id } => write!(
                f,
                "ERREUR : pas la permission d'envoyer des messages dans le salon {channel_id}, vérifiez les rôles"
            ),
            Self::Failed { detail } => {
                write!(f, "ERREUR CRITIQUE lors de l'envoi du message : {detail}")
            }
        }
    }
}
