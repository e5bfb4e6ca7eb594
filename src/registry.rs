//! Connection registry.
//!
//! Fixed-capacity table of live per-peer records, resolvable by RFCOMM
//! channel id or peer address and iterable by the scheduler sweep. The
//! transport layer owns the lifecycle: it registers a record when a channel
//! comes up and unregisters it when the channel goes down.

use log::info;

use crate::connection::{BdAddr, ChannelId, HfConnection};
use crate::error::RegistryError;

/// Maximum number of simultaneous AG peers.
pub const MAX_CONNECTIONS: usize = 4;

/// The set of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: heapless::Vec<HfConnection, MAX_CONNECTIONS>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: heapless::Vec::new(),
        }
    }

    /// Create a record for a just-established RFCOMM channel.
    pub fn register(
        &mut self,
        channel: ChannelId,
        address: BdAddr,
    ) -> Result<&mut HfConnection, RegistryError> {
        if self.connections.iter().any(|c| c.channel() == channel) {
            return Err(RegistryError::DuplicateChannel(channel));
        }
        if self
            .connections
            .push(HfConnection::new(channel, address))
            .is_err()
        {
            return Err(RegistryError::TableFull);
        }
        info!("registered connection to {address} on channel {channel}");
        let idx = self.connections.len() - 1;
        Ok(&mut self.connections[idx])
    }

    /// Drop the record for a closed channel. Returns the record so the
    /// caller can inspect its final state.
    pub fn unregister(&mut self, channel: ChannelId) -> Option<HfConnection> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.channel() == channel)?;
        let conn = self.connections.swap_remove(idx);
        info!(
            "unregistered connection to {} on channel {channel}",
            conn.address()
        );
        Some(conn)
    }

    pub fn by_channel(&mut self, channel: ChannelId) -> Option<&mut HfConnection> {
        self.connections.iter_mut().find(|c| c.channel() == channel)
    }

    pub fn by_address(&mut self, address: BdAddr) -> Option<&mut HfConnection> {
        self.connections.iter_mut().find(|c| c.address() == address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HfConnection> {
        self.connections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut HfConnection> {
        self.connections.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_A: BdAddr = BdAddr([0xA; 6]);
    const ADDR_B: BdAddr = BdAddr([0xB; 6]);

    #[test]
    fn register_and_lookup() {
        let mut reg = ConnectionRegistry::new();
        reg.register(1, ADDR_A).unwrap();
        reg.register(2, ADDR_B).unwrap();

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.by_channel(2).unwrap().address(), ADDR_B);
        assert_eq!(reg.by_address(ADDR_A).unwrap().channel(), 1);
        assert!(reg.by_channel(9).is_none());
    }

    #[test]
    fn duplicate_channel_rejected() {
        let mut reg = ConnectionRegistry::new();
        reg.register(1, ADDR_A).unwrap();
        assert_eq!(
            reg.register(1, ADDR_B).unwrap_err(),
            RegistryError::DuplicateChannel(1)
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn table_full_rejected() {
        let mut reg = ConnectionRegistry::new();
        for channel in 0..MAX_CONNECTIONS as ChannelId {
            reg.register(channel, BdAddr([channel as u8; 6])).unwrap();
        }
        assert_eq!(
            reg.register(99, ADDR_A).unwrap_err(),
            RegistryError::TableFull
        );
    }

    #[test]
    fn unregister_frees_the_slot() {
        let mut reg = ConnectionRegistry::new();
        reg.register(1, ADDR_A).unwrap();
        let conn = reg.unregister(1).unwrap();
        assert_eq!(conn.address(), ADDR_A);
        assert!(reg.is_empty());
        assert!(reg.unregister(1).is_none());

        // The slot is reusable.
        reg.register(1, ADDR_B).unwrap();
        assert_eq!(reg.by_channel(1).unwrap().address(), ADDR_B);
    }
}
