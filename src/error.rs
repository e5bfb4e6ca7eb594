//! Unified error types for the hands-free engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! caller's error handling uniform. All variants are `Copy` so they can be
//! passed through the engine without allocation.

use core::fmt;

use crate::connection::{BdAddr, ChannelId};

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible operation in the engine funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid (oversized codec or indicator list).
    Config(ConfigError),
    /// The connection table rejected an operation.
    Registry(RegistryError),
    /// No live connection exists for the requested peer address.
    UnknownConnection(BdAddr),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::UnknownConnection(addr) => write!(f, "no connection for {addr}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// More codecs supplied than the engine supports. Carries the count given.
    TooManyCodecs(usize),
    /// More HF indicators supplied than the engine supports.
    TooManyIndicators(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyCodecs(n) => write!(f, "{n} codecs exceeds maximum"),
            Self::TooManyIndicators(n) => write!(f, "{n} indicators exceeds maximum"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Connection registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// All connection slots are occupied.
    TableFull,
    /// A connection already exists for this RFCOMM channel.
    DuplicateChannel(ChannelId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "connection table full"),
            Self::DuplicateChannel(cid) => write!(f, "channel {cid} already registered"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
