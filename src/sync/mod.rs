//! Live Sync Channel
//!
//! Subscribes to the per-exhibition push feed and reconciles each mutation
//! into the [`LayoutStore`](crate::floorplan::LayoutStore) as a targeted
//! patch by id.
//!
//! ## Threading
//!
//! ```text
//! sync thread (current-thread tokio)          UI thread
//! ┌───────────────────────────────┐           ┌──────────────────────────┐
//! │ transport.connect / next_event│  bounded  │ SyncHandle::drain_into() │
//! │ fixed-interval reconnect      │ ────────► │   store.set_connection() │
//! └───────────────────────────────┘ crossbeam │   store.apply_sync_event │
//!                                             └──────────────────────────┘
//! ```
//!
//! Events are applied in arrival order. Out-of-order delivery is not
//! corrected: last applied wins, relying on the transport's per-connection
//! ordering.

pub mod channel;
pub mod patch;
pub mod transport;

use floorplan_types::SyncEvent;

pub use channel::{SyncChannel, SyncHandle};
pub use transport::{ChannelTransport, FeedFrame, FeedSender, HttpStreamTransport, SyncTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Connecting,
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn is_online(self) -> bool {
        self == ConnectionStatus::Online
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Online => "online",
            ConnectionStatus::Offline => "offline",
        }
    }
}

/// What the sync thread hands to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Status(ConnectionStatus),
    Event(SyncEvent),
}
