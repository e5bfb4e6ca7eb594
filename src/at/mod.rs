//! AT command vocabulary shared by the classifier and the emitters.
//!
//! Commands are rendered as `AT<token>...\r\n`; responses arrive as lines
//! beginning with `<token>:` (or bare `OK`/`ERROR`).

pub mod classifier;
pub mod emitters;

pub const OK: &str = "OK";
pub const ERROR: &str = "ERROR";

/// Feature exchange (`AT+BRSF=` / `+BRSF:`).
pub const SUPPORTED_FEATURES: &str = "+BRSF";
/// Available codec notification (`AT+BAC=`).
pub const AVAILABLE_CODECS: &str = "+BAC";
/// Indicator discovery and status (`AT+CIND=?`, `AT+CIND?` / `+CIND:`).
pub const INDICATOR: &str = "+CIND";
/// Indicator event reporting (`AT+CMER=`).
pub const ENABLE_INDICATOR_STATUS_UPDATE: &str = "+CMER";
/// Per-indicator reporting bitmap (`AT+BIEV=`).
pub const ENABLE_INDIVIDUAL_INDICATOR_UPDATES: &str = "+BIEV";
/// Call hold and multiparty capabilities (`AT+CHLD=?`).
pub const CALL_HOLD_SERVICES: &str = "+CHLD";
/// Generic status indicators, all three request forms (`AT+BIND`).
pub const GENERIC_STATUS_INDICATOR: &str = "+BIND";
/// Unsolicited indicator value change (`+CIEV:`).
pub const INDICATOR_STATUS_CHANGED: &str = "+CIEV";
/// Network operator query (`AT+COPS`).
pub const QUERY_OPERATOR_SELECTION: &str = "+COPS";
