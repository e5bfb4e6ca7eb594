//! Port traits, the boundary between the protocol engine and the stack below.
//!
//! ```text
//!   RFCOMM layer ──▶ RfcommTransport ──▶ HfEngine ──▶ EventSink ──▶ application
//! ```
//!
//! The engine is generic over [`RfcommTransport`], so running it against a
//! real RFCOMM multiplexer, a loopback, or a scripted test double requires
//! zero changes to the protocol logic.

use crate::connection::ChannelId;
use crate::events::HfEvent;

/// Byte-oriented RFCOMM channel access.
pub trait RfcommTransport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Whether the channel can accept a new outbound packet right now.
    /// A `false` answer is a stall, not an error: the engine retries on
    /// the next trigger.
    fn can_send_now(&self, channel: ChannelId) -> bool;

    /// Queue one complete AT command line for transmission.
    fn send(&mut self, channel: ChannelId, data: &[u8]) -> Result<(), Self::Error>;

    /// Tear down the RFCOMM channel.
    fn disconnect(&mut self, channel: ChannelId) -> Result<(), Self::Error>;
}

/// The engine emits [`HfEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &HfEvent);
}

/// A transport that is never ready and discards all writes.
/// Useful as a default when no RFCOMM layer is attached.
pub struct NullTransport;

impl RfcommTransport for NullTransport {
    type Error = ();

    fn can_send_now(&self, _channel: ChannelId) -> bool {
        false
    }

    fn send(&mut self, _channel: ChannelId, data: &[u8]) -> Result<(), ()> {
        let _ = data;
        Ok(())
    }

    fn disconnect(&mut self, _channel: ChannelId) -> Result<(), ()> {
        Ok(())
    }
}
