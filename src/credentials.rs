//! Bot token loading.
//!
//! The token is read once from the environment at startup and wrapped in
//! [`Credential`], whose `Debug` and `Display` impls redact the secret so it
//! never reaches the logs.

use crate::error::{NotifierError, Result};
use std::fmt;

/// Environment variable holding the Discord bot token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Opaque bot token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(NotifierError::ConfigurationMissing(format!(
                "{TOKEN_ENV} is empty"
            )));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Read the token from [`TOKEN_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::ConfigurationMissing`] when the variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the token through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(TOKEN_ENV).ok_or_else(|| {
            NotifierError::ConfigurationMissing(format!(
                "environment variable {TOKEN_ENV} is not set"
            ))
        })?;
        Self::new(raw)
    }

    /// `Authorization` header value for the Discord REST API.
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.0)
    }

    /// Raw token, for the gateway IDENTIFY payload only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
