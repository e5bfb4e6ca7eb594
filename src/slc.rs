//! Service-level-connection state machine.
//!
//! Every handshake step pairs a send state with a wait state; the engine
//! fires the send action when the transport is ready and parks in the wait
//! state until the AG's `OK` arrives. Transitions between steps are a pure
//! function of the current state and the feature bits both sides fixed
//! during the `AT+BRSF` exchange:
//!
//! ```text
//!  ExchangeSupportedFeatures
//!        │ OK
//!        ├──[codec negotiation]──▶ NotifyOnCodecs ──OK──┐
//!        ▼                                              │
//!  RetrieveIndicators ◀─────────────────────────────────┘
//!        │ OK
//!  RetrieveIndicatorsStatus ──OK──▶ EnableIndicatorsStatusUpdate
//!        │ OK                            │ OK
//!        │   ┌──[3-way calling]──▶ RetrieveCanHoldCall ──OK──┐
//!        └───┤                                               │
//!            ├──[HF indicators]──▶ ListGenericStatusIndicators ◀┘
//!            │                        │ OK (then =?, then ?)
//!            ▼                        ▼
//!      Established ◀──────────────────┘
//! ```

use crate::features::NegotiatedFeatures;

/// Position of a connection in the handshake or afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlcState {
    ExchangeSupportedFeatures,
    W4ExchangeSupportedFeatures,
    NotifyOnCodecs,
    W4NotifyOnCodecs,
    RetrieveIndicators,
    W4RetrieveIndicators,
    RetrieveIndicatorsStatus,
    W4RetrieveIndicatorsStatus,
    EnableIndicatorsStatusUpdate,
    W4EnableIndicatorsStatusUpdate,
    RetrieveCanHoldCall,
    W4RetrieveCanHoldCall,
    ListGenericStatusIndicators,
    W4ListGenericStatusIndicators,
    RetrieveGenericStatusIndicators,
    W4RetrieveGenericStatusIndicators,
    RetrieveInitialStateGenericStatusIndicators,
    W4RetrieveInitialStateGenericStatusIndicators,
    /// Steady state: indicator delivery plus ad hoc request exchanges.
    ServiceLevelConnectionEstablished,
    /// A release was requested; the next sweep issues the disconnect.
    W2DisconnectRfcomm,
    /// Terminal: the transport disconnect has been issued.
    W4RfcommDisconnected,
}

/// Effect of an `OK` received in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OkTransition {
    /// The handshake continues with the given send state.
    Next(SlcState),
    /// The handshake just finished; the connection is established.
    Established,
    /// Steady state: the outstanding ad hoc request completed.
    AdHocComplete,
    /// `OK` carries no meaning in this state.
    Ignored,
}

/// Apply a classified `OK` to the current state.
///
/// The state never advances speculatively: send states and the two
/// disconnect states ignore `OK` entirely.
pub fn on_ok(state: SlcState, features: NegotiatedFeatures) -> OkTransition {
    use SlcState::*;

    match state {
        W4ExchangeSupportedFeatures => {
            if features.codec_negotiation() {
                OkTransition::Next(NotifyOnCodecs)
            } else {
                OkTransition::Next(RetrieveIndicators)
            }
        }
        W4NotifyOnCodecs => OkTransition::Next(RetrieveIndicators),
        W4RetrieveIndicators => OkTransition::Next(RetrieveIndicatorsStatus),
        W4RetrieveIndicatorsStatus => OkTransition::Next(EnableIndicatorsStatusUpdate),
        W4EnableIndicatorsStatusUpdate => {
            if features.three_way_calling() {
                OkTransition::Next(RetrieveCanHoldCall)
            } else if features.hf_indicators() {
                OkTransition::Next(ListGenericStatusIndicators)
            } else {
                OkTransition::Established
            }
        }
        W4RetrieveCanHoldCall => {
            if features.hf_indicators() {
                OkTransition::Next(ListGenericStatusIndicators)
            } else {
                OkTransition::Established
            }
        }
        W4ListGenericStatusIndicators => OkTransition::Next(RetrieveGenericStatusIndicators),
        W4RetrieveGenericStatusIndicators => {
            OkTransition::Next(RetrieveInitialStateGenericStatusIndicators)
        }
        W4RetrieveInitialStateGenericStatusIndicators => OkTransition::Established,
        ServiceLevelConnectionEstablished => OkTransition::AdHocComplete,
        _ => OkTransition::Ignored,
    }
}

/// Whether a negotiation command is currently in flight (the states in
/// which an AG `ERROR` aborts the handshake).
pub fn is_negotiation_wait(state: SlcState) -> bool {
    use SlcState::*;
    matches!(
        state,
        W4ExchangeSupportedFeatures
            | W4NotifyOnCodecs
            | W4RetrieveIndicators
            | W4RetrieveIndicatorsStatus
            | W4EnableIndicatorsStatusUpdate
            | W4RetrieveCanHoldCall
            | W4ListGenericStatusIndicators
            | W4RetrieveGenericStatusIndicators
            | W4RetrieveInitialStateGenericStatusIndicators
    )
}
