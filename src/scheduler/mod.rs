//! Periodic reminder scheduling.
//!
//! One loop, one channel, one message. The loop is gated on the platform
//! readiness signal and records each tick's outcome in memory.

pub mod history;
pub mod outcome;
pub mod runner;

pub use history::{TickHistory, TickRecord};
pub use outcome::TickOutcome;
pub use runner::{ReminderLoop, ReminderSettings};
