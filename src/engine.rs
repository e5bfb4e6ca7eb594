//! The hands-free protocol engine.
//!
//! Owns the immutable configuration and the connection registry, and drives
//! every connection through the service-level-connection handshake and the
//! established steady state. All I/O flows through the port traits injected
//! at call sites, making the entire engine testable with scripted doubles.
//!
//! ```text
//!  RFCOMM line ──▶ classify ──▶ advance state ──▶ sweep all connections
//!                                                   │ (transport ready?)
//!  application request ──▶ set pending flag ──▶ one connection pass
//! ```
//!
//! The sweep is the explicit "reconsider all connections" operation: it runs
//! after every inbound line and after every application request, dispatches
//! at most one outbound command per connection, and is a no-op for any
//! connection with nothing to do. One command is in flight per connection at
//! a time, enforced by the wait states and the steady-state `wait_ok` gate.

use log::{debug, info, warn};

use crate::at::classifier::{self, BindRequest, ResponseTag};
use crate::at::emitters;
use crate::config::HfConfig;
use crate::connection::{AgIndicator, BdAddr, ChannelId, HfConnection};
use crate::error::{Error, Result};
use crate::events::HfEvent;
use crate::features::NegotiatedFeatures;
use crate::ports::{EventSink, RfcommTransport};
use crate::registry::ConnectionRegistry;
use crate::slc::{self, OkTransition, SlcState};

/// The protocol engine. One instance serves every AG peer.
pub struct HfEngine {
    config: HfConfig,
    registry: ConnectionRegistry,
}

impl HfEngine {
    /// Build an engine from a validated configuration.
    pub fn new(config: HfConfig) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
        }
    }

    /// The immutable engine configuration.
    pub fn config(&self) -> &HfConfig {
        &self.config
    }

    /// Connection lifecycle access for the transport layer.
    pub fn registry_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.registry
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    // ── Inbound path ──────────────────────────────────────────

    /// Process one completed response line from the AG, then sweep.
    ///
    /// Lines are handled strictly in arrival order per connection; a line
    /// matching no known prefix is ignored without any state change.
    pub fn handle_response_line<T: RfcommTransport, S: EventSink>(
        &mut self,
        channel: ChannelId,
        line: &str,
        transport: &mut T,
        sink: &mut S,
    ) {
        let config = &self.config;
        if let Some(conn) = self.registry.by_channel(channel) {
            let tag = classifier::classify(line, conn.last_bind_request);
            conn.response = tag;
            match tag {
                ResponseTag::Ok => handle_ok(config, conn, sink),
                ResponseTag::Error => handle_error(conn, sink),
                ResponseTag::SupportedFeatures => {
                    if let Some(features) = classifier::brsf_features(line) {
                        conn.remote_supported_features = features;
                        debug!("channel {channel}: AG features {features:#x}");
                    }
                }
                ResponseTag::Indicator => handle_indicator_report(conn, line),
                ResponseTag::IndicatorStatusChanged => {
                    if let Some((index, status)) = classifier::indicator_update(line) {
                        if !conn.record_indicator_update(index, status) {
                            debug!("channel {channel}: update for unknown indicator {index}");
                        }
                    }
                }
                ResponseTag::None => {
                    debug!("channel {channel}: unclassified line ignored");
                }
                // Remaining tags label payload lines whose OK drives the
                // state machine; nothing to do on the line itself.
                _ => {}
            }
        } else {
            debug!("response on unknown channel {channel} ignored");
        }
        self.run(transport, sink);
    }

    // ── Scheduler sweep ───────────────────────────────────────

    /// Reconsider every connection once, sending at most one command per
    /// connection if its transport channel is ready.
    pub fn run<T: RfcommTransport, S: EventSink>(&mut self, transport: &mut T, sink: &mut S) {
        let config = &self.config;
        for conn in self.registry.iter_mut() {
            run_for_connection(config, conn, transport, sink);
        }
    }

    // ── Application request API ───────────────────────────────

    /// Kick the handshake for a registered peer.
    pub fn establish_service_level_connection<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        transport: &mut T,
        sink: &mut S,
    ) -> Result<()> {
        self.for_peer(address, transport, sink, |_| {})
    }

    /// Tear the service-level connection down.
    pub fn release_service_level_connection<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        transport: &mut T,
        sink: &mut S,
    ) -> Result<()> {
        self.for_peer(address, transport, sink, |conn| {
            if conn.state != SlcState::W4RfcommDisconnected {
                conn.state = SlcState::W2DisconnectRfcomm;
            }
        })
    }

    /// Enable or disable status updates for all AG indicators.
    pub fn enable_status_update_for_all_ag_indicators<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        enable: bool,
        transport: &mut T,
        sink: &mut S,
    ) -> Result<()> {
        self.for_peer(address, transport, sink, |conn| {
            conn.enable_all_indicator_updates = Some(enable);
        })
    }

    /// Enable or disable status updates per AG indicator, one bit per table
    /// entry in discovery order.
    pub fn enable_status_update_for_individual_ag_indicators<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        bitmap: u32,
        transport: &mut T,
        sink: &mut S,
    ) -> Result<()> {
        self.for_peer(address, transport, sink, |conn| {
            conn.individual_indicator_updates = Some(bitmap);
        })
    }

    /// Query the network operator name (two-step `AT+COPS` exchange).
    pub fn query_operator_selection<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        transport: &mut T,
        sink: &mut S,
    ) -> Result<()> {
        self.for_peer(address, transport, sink, |conn| {
            conn.query_operator_format = true;
        })
    }

    /// Apply `request` to the peer's connection, then run one scheduler
    /// pass for that connection only.
    fn for_peer<T: RfcommTransport, S: EventSink>(
        &mut self,
        address: BdAddr,
        transport: &mut T,
        sink: &mut S,
        request: impl FnOnce(&mut HfConnection),
    ) -> Result<()> {
        let config = &self.config;
        let Some(conn) = self.registry.by_address(address) else {
            log::error!("no connection for {address}");
            return Err(Error::UnknownConnection(address));
        };
        request(conn);
        run_for_connection(config, conn, transport, sink);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound response handling
// ───────────────────────────────────────────────────────────────

fn handle_ok<S: EventSink>(config: &HfConfig, conn: &mut HfConnection, sink: &mut S) {
    let features = NegotiatedFeatures {
        hf: config.supported_features,
        ag: conn.remote_supported_features,
    };
    let channel = conn.channel();

    match slc::on_ok(conn.state, features) {
        OkTransition::Next(next) => {
            match conn.state {
                SlcState::W4RetrieveIndicators => conn.retrieving_ag_indicators = false,
                SlcState::W4RetrieveIndicatorsStatus => {
                    conn.retrieving_ag_indicator_status = false;
                }
                _ => {}
            }
            info!("channel {channel}: {:?} -> {next:?}", conn.state);
            conn.state = next;
        }
        OkTransition::Established => {
            info!("channel {channel}: service level connection established");
            conn.state = SlcState::ServiceLevelConnectionEstablished;
            sink.emit(&HfEvent::SlcEstablished { channel });
        }
        OkTransition::AdHocComplete => {
            conn.wait_ok = false;
            sink.emit(&HfEvent::CommandComplete {
                channel,
                success: true,
            });
        }
        OkTransition::Ignored => {}
    }
    conn.response = ResponseTag::None;
}

fn handle_error<S: EventSink>(conn: &mut HfConnection, sink: &mut S) {
    let channel = conn.channel();
    if conn.state == SlcState::ServiceLevelConnectionEstablished {
        // The pending gate clears and the failure is surfaced; the
        // connection stays usable and the application decides whether to
        // re-issue the request.
        conn.wait_ok = false;
        sink.emit(&HfEvent::CommandComplete {
            channel,
            success: false,
        });
    } else if slc::is_negotiation_wait(conn.state) {
        warn!(
            "channel {channel}: AG rejected {:?}, aborting negotiation",
            conn.state
        );
        conn.state = SlcState::W2DisconnectRfcomm;
        sink.emit(&HfEvent::SlcEstablishmentFailed { channel });
    }
}

fn handle_indicator_report(conn: &mut HfConnection, line: &str) {
    match conn.state {
        // Discovery answer: allocate one entry per descriptor group.
        // Indices are 1-based and stable for the connection's lifetime.
        SlcState::W4RetrieveIndicators => {
            if !conn.ag_indicators.is_empty() {
                return;
            }
            let count = classifier::indicator_descriptor_count(line);
            for i in 0..count {
                let entry = AgIndicator {
                    index: (i + 1) as u8,
                    status: 0,
                    status_changed: false,
                };
                if conn.ag_indicators.push(entry).is_err() {
                    warn!(
                        "channel {}: AG reported more than {} indicators, rest dropped",
                        conn.channel(),
                        conn.ag_indicators.capacity()
                    );
                    break;
                }
            }
            debug!(
                "channel {}: AG reported {} indicators",
                conn.channel(),
                conn.ag_indicators.len()
            );
        }
        // Status answer: one value per entry, in table order.
        SlcState::W4RetrieveIndicatorsStatus => {
            let values = classifier::indicator_status_values(line);
            for (indicator, value) in conn.ag_indicators.iter_mut().zip(values.iter()) {
                indicator.status = *value;
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// Per-connection scheduler pass
// ───────────────────────────────────────────────────────────────

/// Log a failed transport send. The caller leaves all state untouched on
/// failure, so the action retries on the next trigger.
fn send_succeeded<E: core::fmt::Debug>(result: core::result::Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("transport send failed: {e:?}");
            false
        }
    }
}

fn run_for_connection<T: RfcommTransport, S: EventSink>(
    config: &HfConfig,
    conn: &mut HfConnection,
    transport: &mut T,
    sink: &mut S,
) {
    let channel = conn.channel();
    if !transport.can_send_now(channel) {
        return;
    }

    match conn.state {
        SlcState::ExchangeSupportedFeatures => {
            if send_succeeded(emitters::exchange_supported_features(
                transport,
                channel,
                config.supported_features,
            )) {
                conn.state = SlcState::W4ExchangeSupportedFeatures;
            }
        }
        SlcState::NotifyOnCodecs => {
            if send_succeeded(emitters::notify_on_codecs(transport, channel, &config.codecs)) {
                conn.state = SlcState::W4NotifyOnCodecs;
            }
        }
        SlcState::RetrieveIndicators => {
            if send_succeeded(emitters::retrieve_indicators(transport, channel)) {
                conn.state = SlcState::W4RetrieveIndicators;
                conn.retrieving_ag_indicators = true;
                conn.retrieving_ag_indicator_status = false;
            }
        }
        SlcState::RetrieveIndicatorsStatus => {
            if send_succeeded(emitters::retrieve_indicators_status(transport, channel)) {
                conn.state = SlcState::W4RetrieveIndicatorsStatus;
                conn.retrieving_ag_indicator_status = true;
                conn.retrieving_ag_indicators = false;
            }
        }
        SlcState::EnableIndicatorsStatusUpdate => {
            if send_succeeded(emitters::set_indicator_status_updates(transport, channel, true)) {
                conn.state = SlcState::W4EnableIndicatorsStatusUpdate;
            }
        }
        SlcState::RetrieveCanHoldCall => {
            if send_succeeded(emitters::retrieve_call_hold_services(transport, channel)) {
                conn.state = SlcState::W4RetrieveCanHoldCall;
            }
        }
        SlcState::ListGenericStatusIndicators => {
            if send_succeeded(emitters::list_generic_status_indicators(
                transport,
                channel,
                &config.indicators,
            )) {
                conn.state = SlcState::W4ListGenericStatusIndicators;
                conn.last_bind_request = Some(BindRequest::ListLocal);
                conn.listing_generic_status_indicators = true;
            }
        }
        SlcState::RetrieveGenericStatusIndicators => {
            if send_succeeded(emitters::retrieve_generic_status_indicators(transport, channel)) {
                conn.state = SlcState::W4RetrieveGenericStatusIndicators;
                conn.last_bind_request = Some(BindRequest::QuerySupported);
                conn.retrieving_generic_status_indicators = true;
            }
        }
        SlcState::RetrieveInitialStateGenericStatusIndicators => {
            if send_succeeded(emitters::retrieve_initial_generic_status_indicators(
                transport, channel,
            )) {
                conn.state = SlcState::W4RetrieveInitialStateGenericStatusIndicators;
                conn.last_bind_request = Some(BindRequest::QueryInitialState);
                conn.retrieving_generic_status_indicators_state = true;
            }
        }
        SlcState::W2DisconnectRfcomm => {
            conn.state = SlcState::W4RfcommDisconnected;
            if let Err(e) = transport.disconnect(channel) {
                warn!("channel {channel}: transport disconnect failed: {e:?}");
            }
        }
        SlcState::ServiceLevelConnectionEstablished => {
            steady_state_visit(conn, transport, sink);
        }
        // Wait states stall until the next classified response arrives.
        _ => {}
    }
}

/// One steady-state visit: surface at most one changed indicator, then, if
/// the single-slot gate is free, consume at most one pending request.
fn steady_state_visit<T: RfcommTransport, S: EventSink>(
    conn: &mut HfConnection,
    transport: &mut T,
    sink: &mut S,
) {
    let channel = conn.channel();

    if let Some(indicator) = conn.ag_indicators.iter_mut().find(|i| i.status_changed) {
        indicator.status_changed = false;
        sink.emit(&HfEvent::AgIndicatorStatusChanged {
            channel,
            index: indicator.index,
            status: indicator.status,
        });
    }

    if conn.wait_ok {
        return;
    }

    if let Some(enable) = conn.enable_all_indicator_updates {
        if send_succeeded(emitters::set_indicator_status_updates(transport, channel, enable)) {
            conn.enable_all_indicator_updates = None;
            conn.wait_ok = true;
        }
        return;
    }

    if let Some(bitmap) = conn.individual_indicator_updates {
        if send_succeeded(emitters::set_individual_indicator_updates(
            transport,
            channel,
            bitmap,
            conn.ag_indicators.len(),
        )) {
            conn.individual_indicator_updates = None;
            conn.wait_ok = true;
        }
        return;
    }

    if conn.query_operator_format {
        if send_succeeded(emitters::query_operator_name_format(transport, channel)) {
            conn.query_operator_format = false;
            // The name query follows automatically once this one completes.
            conn.query_operator_name = true;
            conn.wait_ok = true;
        }
        return;
    }

    if conn.query_operator_name
        && send_succeeded(emitters::query_operator_name(transport, channel))
    {
        conn.query_operator_name = false;
        conn.wait_ok = true;
    }
}
