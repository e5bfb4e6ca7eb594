//! Outbound application events.
//!
//! The engine emits these through the [`EventSink`](crate::ports::EventSink)
//! port. Adapters on the other side decide what to do with them, typically
//! forwarding into the owning application's event loop.

use crate::connection::ChannelId;

/// Structured events emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HfEvent {
    /// The service-level connection finished negotiating.
    SlcEstablished { channel: ChannelId },

    /// Negotiation was aborted after the AG returned an error; the engine
    /// is disconnecting the channel.
    SlcEstablishmentFailed { channel: ChannelId },

    /// An outstanding ad hoc request completed. `success` is false when the
    /// AG answered with `ERROR`; the connection stays usable either way.
    CommandComplete { channel: ChannelId, success: bool },

    /// An AG indicator changed value (one event per indicator per sweep).
    AgIndicatorStatusChanged {
        channel: ChannelId,
        index: u8,
        status: u8,
    },
}
