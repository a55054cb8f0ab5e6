//! Chat platform channels.
//!
//! The reminder loop talks to the platform only through [`ChannelAdapter`],
//! so tests can swap in a double and other platforms only need an adapter.

pub mod discord;
pub mod traits;

pub use discord::DiscordAdapter;
pub use traits::{
    ChannelAdapter, ChannelId, ChannelOutboundMessage, ReadyInfo, ReadyNotifier, ReadySignal,
    ResolvedChannel, SendError, ready_signal,
};
