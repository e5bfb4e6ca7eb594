//! Bluetooth Hands-Free Profile, hands-free (HF) role: the service-level
//! connection engine.
//!
//! Drives the AT-command handshake that brings a headset and an audio
//! gateway (AG) into a fully negotiated session over an RFCOMM byte stream:
//! feature exchange, optional codec negotiation, indicator discovery and
//! subscription, call-hold capability discovery, and optional HF-indicator
//! negotiation. Once established, the engine delivers AG indicator changes
//! to the application and serializes its ad hoc requests (indicator
//! reporting toggles, operator-name queries) over the same
//! one-command-in-flight channel.
//!
//! The crate is pure protocol logic. RFCOMM access and event delivery go
//! through the port traits in [`ports`]; the byte-level line tokenizer,
//! SDP, and the transport stack live in the layers around it.

#![deny(unused_must_use)]

pub mod at;
pub mod config;
pub mod connection;
pub mod engine;
pub mod events;
pub mod features;
pub mod ports;
pub mod registry;
pub mod slc;

mod error;

pub use config::HfConfig;
pub use connection::{AgIndicator, BdAddr, ChannelId, HfConnection};
pub use engine::HfEngine;
pub use error::{ConfigError, Error, RegistryError, Result};
pub use events::HfEvent;
pub use ports::{EventSink, NullTransport, RfcommTransport};
