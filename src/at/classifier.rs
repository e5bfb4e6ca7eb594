//! Inbound line classification.
//!
//! Maps a completed response line (assembled by the byte-level tokenizer in
//! the layer below) to one symbolic tag, checking known prefixes in fixed
//! priority order. The `+BIND` prefix is shared by three request types, so
//! classification takes the connection's outstanding [`BindRequest`] to
//! resolve it. A line matching no prefix classifies as [`ResponseTag::None`]
//! and is ignored by the engine.
//!
//! Payload extraction for the handful of lines whose content the engine
//! needs (`+BRSF`, `+CIND`, `+CIEV`) lives here too, as pure functions.
//! Malformed payloads yield empty results and change nothing.

use crate::at;
use crate::config::MAX_NUM_AG_INDICATORS;

/// Symbolic tag for a classified response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseTag {
    /// No known prefix matched.
    #[default]
    None,
    Ok,
    Error,
    /// `+BRSF:` feature bitmap report.
    SupportedFeatures,
    /// `+CIND:` indicator descriptor or status report.
    Indicator,
    /// `+BAC:` codec report.
    AvailableCodecs,
    /// `+CMER` acknowledgement.
    EnableIndicatorStatusUpdate,
    /// `+CHLD:` call hold capability report.
    CallHoldServices,
    /// `+BIND` answer to listing the locally supported indicators.
    ListGenericStatusIndicators,
    /// `+BIND` answer to querying the AG-supported indicators.
    GenericStatusIndicators,
    /// `+BIND` answer to querying the initial indicator state.
    GenericStatusIndicatorsState,
    /// Unsolicited `+CIEV:` indicator value change.
    IndicatorStatusChanged,
}

/// Which `+BIND` request form was last sent on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindRequest {
    /// `AT+BIND=<id,...>`: announce the locally supported indicators.
    ListLocal,
    /// `AT+BIND=?`: ask which indicators the AG supports.
    QuerySupported,
    /// `AT+BIND?`: ask for the initial enabled/disabled state.
    QueryInitialState,
}

/// Classify one completed response line.
pub fn classify(line: &str, last_bind_request: Option<BindRequest>) -> ResponseTag {
    if line.starts_with(at::ERROR) {
        return ResponseTag::Error;
    }
    if line.starts_with(at::OK) {
        return ResponseTag::Ok;
    }
    if line.starts_with(at::SUPPORTED_FEATURES) {
        return ResponseTag::SupportedFeatures;
    }
    if line.starts_with(at::INDICATOR) {
        return ResponseTag::Indicator;
    }
    if line.starts_with(at::AVAILABLE_CODECS) {
        return ResponseTag::AvailableCodecs;
    }
    if line.starts_with(at::ENABLE_INDICATOR_STATUS_UPDATE) {
        return ResponseTag::EnableIndicatorStatusUpdate;
    }
    if line.starts_with(at::CALL_HOLD_SERVICES) {
        return ResponseTag::CallHoldServices;
    }
    if line.starts_with(at::GENERIC_STATUS_INDICATOR) {
        // Same prefix for all three request forms; only the request we sent
        // tells the answers apart.
        return match last_bind_request {
            Some(BindRequest::ListLocal) => ResponseTag::ListGenericStatusIndicators,
            Some(BindRequest::QuerySupported) => ResponseTag::GenericStatusIndicators,
            Some(BindRequest::QueryInitialState) => ResponseTag::GenericStatusIndicatorsState,
            None => ResponseTag::None,
        };
    }
    if line.starts_with(at::INDICATOR_STATUS_CHANGED) {
        return ResponseTag::IndicatorStatusChanged;
    }
    ResponseTag::None
}

/// Extract the AG feature bitmap from a `+BRSF: <features>` line.
pub fn brsf_features(line: &str) -> Option<u32> {
    let (_, rest) = line.split_once(':')?;
    rest.trim().parse().ok()
}

/// Count the indicator descriptors in a `+CIND: ("name",(min,max)),...`
/// discovery line. Each descriptor opens with `("`.
pub fn indicator_descriptor_count(line: &str) -> usize {
    line.matches("(\"").count()
}

/// Extract the comma-separated values of a `+CIND: v,v,...` status line.
/// Returns an empty vector when any field fails to parse.
pub fn indicator_status_values(line: &str) -> heapless::Vec<u8, MAX_NUM_AG_INDICATORS> {
    let mut values = heapless::Vec::new();
    let Some((_, rest)) = line.split_once(':') else {
        return values;
    };
    for field in rest.split(',') {
        let Ok(value) = field.trim().parse() else {
            return heapless::Vec::new();
        };
        if values.push(value).is_err() {
            break;
        }
    }
    values
}

/// Extract `(index, value)` from a `+CIEV: index,value` update line.
pub fn indicator_update(line: &str) -> Option<(u8, u8)> {
    let (_, rest) = line.split_once(':')?;
    let (index, value) = rest.split_once(',')?;
    Some((index.trim().parse().ok()?, value.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ok_and_error() {
        assert_eq!(classify("OK", None), ResponseTag::Ok);
        assert_eq!(classify("ERROR", None), ResponseTag::Error);
    }

    #[test]
    fn error_checked_before_ok() {
        // Neither prefixes the other, but the priority order is fixed.
        assert_eq!(classify("ERROR: busy", None), ResponseTag::Error);
    }

    #[test]
    fn known_response_prefixes() {
        assert_eq!(classify("+BRSF: 1543", None), ResponseTag::SupportedFeatures);
        assert_eq!(
            classify("+CIND: (\"service\",(0,1))", None),
            ResponseTag::Indicator
        );
        assert_eq!(classify("+BAC: 1,2", None), ResponseTag::AvailableCodecs);
        assert_eq!(
            classify("+CMER: ack", None),
            ResponseTag::EnableIndicatorStatusUpdate
        );
        assert_eq!(
            classify("+CHLD: (0,1,2,3)", None),
            ResponseTag::CallHoldServices
        );
        assert_eq!(classify("+CIEV: 4,1", None), ResponseTag::IndicatorStatusChanged);
    }

    #[test]
    fn bind_resolves_through_last_request() {
        let line = "+BIND: (1,2)";
        assert_eq!(
            classify(line, Some(BindRequest::ListLocal)),
            ResponseTag::ListGenericStatusIndicators
        );
        assert_eq!(
            classify(line, Some(BindRequest::QuerySupported)),
            ResponseTag::GenericStatusIndicators
        );
        assert_eq!(
            classify(line, Some(BindRequest::QueryInitialState)),
            ResponseTag::GenericStatusIndicatorsState
        );
    }

    #[test]
    fn bind_without_outstanding_request_is_unclassified() {
        assert_eq!(classify("+BIND: 1,1", None), ResponseTag::None);
    }

    #[test]
    fn unknown_lines_are_unclassified() {
        assert_eq!(classify("", None), ResponseTag::None);
        assert_eq!(classify("+XAPL=iPhone,2", None), ResponseTag::None);
        assert_eq!(classify("RING", None), ResponseTag::None);
    }

    #[test]
    fn brsf_payload_extraction() {
        assert_eq!(brsf_features("+BRSF: 1543"), Some(1543));
        assert_eq!(brsf_features("+BRSF:0"), Some(0));
        assert_eq!(brsf_features("+BRSF"), None);
        assert_eq!(brsf_features("+BRSF: many"), None);
    }

    #[test]
    fn descriptor_count_matches_groups() {
        let line = "+CIND: (\"service\",(0,1)),(\"call\",(0,1)),(\"signal\",(0,5))";
        assert_eq!(indicator_descriptor_count(line), 3);
        assert_eq!(indicator_descriptor_count("+CIND: 1,0,5"), 0);
    }

    #[test]
    fn status_values_parse_in_order() {
        let values = indicator_status_values("+CIND: 1,0,3, 4");
        assert_eq!(values.as_slice(), &[1, 0, 3, 4]);
    }

    #[test]
    fn malformed_status_values_yield_nothing() {
        assert!(indicator_status_values("+CIND: 1,x,3").is_empty());
        assert!(indicator_status_values("no colon here").is_empty());
    }

    #[test]
    fn ciev_payload_extraction() {
        assert_eq!(indicator_update("+CIEV: 4,1"), Some((4, 1)));
        assert_eq!(indicator_update("+CIEV:2,0"), Some((2, 0)));
        assert_eq!(indicator_update("+CIEV: 4"), None);
        assert_eq!(indicator_update("+CIEV: a,b"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary byte salad never panics the classifier or the payload
        /// extractors, and anything that classifies as None stays None
        /// regardless of the outstanding BIND request.
        #[test]
        fn classification_is_total(bytes in proptest::collection::vec(0u8..=255u8, 0..64)) {
            let line = String::from_utf8_lossy(&bytes);
            let tag = classify(&line, None);
            let _ = brsf_features(&line);
            let _ = indicator_descriptor_count(&line);
            let _ = indicator_status_values(&line);
            let _ = indicator_update(&line);

            if tag == ResponseTag::None && !line.starts_with("+BIND") {
                for request in [
                    BindRequest::ListLocal,
                    BindRequest::QuerySupported,
                    BindRequest::QueryInitialState,
                ] {
                    prop_assert_eq!(classify(&line, Some(request)), ResponseTag::None);
                }
            }
        }

        /// A +CIEV line with two well-formed fields always yields them back.
        #[test]
        fn ciev_roundtrip(index in 0u8..=255, value in 0u8..=255) {
            let line = format!("+CIEV: {index},{value}");
            prop_assert_eq!(classify(&line, None), ResponseTag::IndicatorStatusChanged);
            prop_assert_eq!(indicator_update(&line), Some((index, value)));
        }
    }
}
