//! Per-peer connection record.
//!
//! One [`HfConnection`] exists for every negotiating or negotiated AG peer,
//! created by the transport layer through the
//! [`ConnectionRegistry`](crate::registry::ConnectionRegistry) when an
//! RFCOMM channel comes up and destroyed when it goes down. The engine only
//! observes and mutates the record in between.

use core::fmt;

use crate::at::classifier::{BindRequest, ResponseTag};
use crate::config::MAX_NUM_AG_INDICATORS;
use crate::slc::SlcState;

/// RFCOMM channel identifier assigned by the transport layer.
pub type ChannelId = u16;

/// Bluetooth device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdAddr(pub [u8; 6]);

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

/// One AG-reported indicator. Indices are stable once discovery completes;
/// entries are never removed while the connection lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgIndicator {
    /// 1-based position assigned by the AG during discovery.
    pub index: u8,
    /// Last value reported by the AG.
    pub status: u8,
    /// Set by an incoming update, cleared when the change is surfaced.
    pub status_changed: bool,
}

/// State for a single AG peer.
#[derive(Debug)]
pub struct HfConnection {
    channel: ChannelId,
    address: BdAddr,

    /// Current handshake / steady-state position.
    pub state: SlcState,
    /// AG feature bitmap from the `+BRSF:` response; written once.
    pub remote_supported_features: u32,
    /// Indicators reported by the AG, in discovery order.
    pub ag_indicators: heapless::Vec<AgIndicator, MAX_NUM_AG_INDICATORS>,

    /// Pending request: enable or disable reporting for all AG indicators.
    pub enable_all_indicator_updates: Option<bool>,
    /// Pending request: per-indicator reporting bitmap, one bit per entry
    /// of `ag_indicators` in table order.
    pub individual_indicator_updates: Option<u32>,
    /// Pending request: set the operator-name format (first +COPS step).
    pub query_operator_format: bool,
    /// Pending request: read the operator name (second +COPS step, armed
    /// automatically when the format step is consumed).
    pub query_operator_name: bool,

    /// Single-slot gate for ad hoc requests. Correlation is positional:
    /// the next OK/ERROR consumes the slot, with no check that it belongs
    /// to the request that set it.
    pub wait_ok: bool,

    /// Which `+BIND` request is in flight; the classifier consults this to
    /// resolve the shared response prefix.
    pub last_bind_request: Option<BindRequest>,
    /// Most recently classified inbound response; reset every cycle.
    pub response: ResponseTag,

    // In-flight discovery markers. Diagnostics only; control flow keys off
    // `state`, never off these.
    pub retrieving_ag_indicators: bool,
    pub retrieving_ag_indicator_status: bool,
    pub listing_generic_status_indicators: bool,
    pub retrieving_generic_status_indicators: bool,
    pub retrieving_generic_status_indicators_state: bool,
}

impl HfConnection {
    /// A fresh record for a just-established RFCOMM channel. Negotiation
    /// starts at the feature exchange on the first scheduler pass.
    pub fn new(channel: ChannelId, address: BdAddr) -> Self {
        Self {
            channel,
            address,
            state: SlcState::ExchangeSupportedFeatures,
            remote_supported_features: 0,
            ag_indicators: heapless::Vec::new(),
            enable_all_indicator_updates: None,
            individual_indicator_updates: None,
            query_operator_format: false,
            query_operator_name: false,
            wait_ok: false,
            last_bind_request: None,
            response: ResponseTag::None,
            retrieving_ag_indicators: false,
            retrieving_ag_indicator_status: false,
            listing_generic_status_indicators: false,
            retrieving_generic_status_indicators: false,
            retrieving_generic_status_indicators_state: false,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn address(&self) -> BdAddr {
        self.address
    }

    /// Apply an unsolicited `+CIEV` update. Returns false when no entry
    /// carries the given index (the update is then dropped).
    pub fn record_indicator_update(&mut self, index: u8, status: u8) -> bool {
        match self.ag_indicators.iter_mut().find(|i| i.index == index) {
            Some(indicator) => {
                indicator.status = status;
                indicator.status_changed = true;
                true
            }
            None => false,
        }
    }
}
