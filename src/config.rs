//! Configuration types for the bump notifier.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "BUMP_NOTIFIER_CONFIG";

/// Environment variable hosting platforms use to assign the listening port.
pub const PORT_ENV: &str = "PORT";

/// Top-level configuration, built once at startup and never mutated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// What to post, where, and how often.
    pub reminder: ReminderConfig,
    /// Liveness endpoint settings.
    pub health: HealthConfig,
    /// Discord API settings.
    pub discord: DiscordConfig,
}

/// Reminder loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Snowflake of the channel receiving the reminder.
    pub channel_id: u64,
    /// Message posted on every tick.
    pub text: String,
    /// Seconds between ticks.
    pub interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            channel_id: 1_272_611_563_307_794_484,
            text: "🚨 @here Il est temps de faire le /bump ! Tapez la commande pour relancer le timer."
                .to_owned(),
            interval_secs: 3 * 3600,
        }
    }
}

impl ReminderConfig {
    /// Tick period. Zero is clamped to one second so the timer never spins.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether the HTTP listener is started at all.
    pub enabled: bool,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Plaintext body returned for every request.
    pub body: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_owned(),
            port: 8000,
            body: "Bot is running and healthy.".to_owned(),
        }
    }
}

impl HealthConfig {
    /// `host:port` string used for binding and logging.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Discord API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// REST API base URL (overridable for tests).
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Pause before reconnecting after an established session drops.
    pub reconnect_delay_ms: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://discord.com/api/v10".to_owned(),
            request_timeout_secs: 30,
            reconnect_delay_ms: 5_000,
        }
    }
}

impl DiscordConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl NotifierConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::NotifierError::Config(e.to_string()))
    }

    /// Load from `path` when given (or named by [`CONFIG_PATH_ENV`]), then apply
    /// environment overrides.
    ///
    /// A configured path that does not exist is an error; no path at all means defaults.
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(PORT_ENV) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.health.port = port,
                Err(_) => tracing::warn!("ignoring invalid {PORT_ENV} value {raw:?}"),
            }
        }
    }
}
