//! bump-notifier: posts a periodic "time to /bump" reminder into one Discord
//! channel and answers HTTP liveness probes.
//!
//! # Architecture
//!
//! - **Startup**: loads config and the bot token, spawns the liveness
//!   endpoint, opens the Discord session and reopens it when it drops
//! - **Scheduler**: a single loop, gated on the session's readiness signal,
//!   that resolves the channel and sends the reminder every period
//! - **Health**: an independent axum listener returning `200` with a fixed body

pub mod channels;
pub mod config;
pub mod credentials;
pub mod error;
pub mod health;
pub mod scheduler;
pub mod startup;

pub use config::NotifierConfig;
pub use credentials::Credential;
pub use error::{NotifierError, Result};
