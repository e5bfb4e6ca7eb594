//! Engine configuration.
//!
//! The process-wide feature, codec, and HF-indicator sets. Built once at
//! startup, owned by the engine, and read-only thereafter; per-connection
//! state is the only thing mutated during a handshake.

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::features::DEFAULT_HF_SUPPORTED_FEATURES;

/// Maximum number of locally supported codecs.
pub const MAX_NUM_CODECS: usize = 20;

/// Maximum number of locally supported HF (generic status) indicators.
pub const MAX_NUM_HF_INDICATORS: usize = 10;

/// Maximum number of indicators an AG may report during discovery.
pub const MAX_NUM_AG_INDICATORS: usize = 20;

/// Codec id for CVSD, the mandatory narrowband codec.
pub const CODEC_CVSD: u8 = 0x01;
/// Codec id for mSBC, the optional wideband codec.
pub const CODEC_MSBC: u8 = 0x02;

/// Assigned number for the enhanced-safety HF indicator.
pub const HF_INDICATOR_ENHANCED_SAFETY: u16 = 0x01;
/// Assigned number for the battery-level HF indicator.
pub const HF_INDICATOR_BATTERY_LEVEL: u16 = 0x02;

/// Immutable engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfConfig {
    /// HF feature bitmap sent in `AT+BRSF=`.
    pub supported_features: u32,
    /// Ordered codec ids sent in `AT+BAC=`, most preferred first.
    pub codecs: heapless::Vec<u8, MAX_NUM_CODECS>,
    /// Ordered HF indicator ids sent in `AT+BIND=`.
    pub indicators: heapless::Vec<u16, MAX_NUM_HF_INDICATORS>,
    /// Initial enable bitmap for the HF indicators, one bit per entry.
    pub indicators_status: u32,
}

impl HfConfig {
    /// Build a validated configuration from caller-supplied lists.
    ///
    /// Oversized lists are a caller error: they are rejected here, with a
    /// logged diagnostic, before any engine state exists.
    pub fn new(
        supported_features: u32,
        codecs: &[u8],
        indicators: &[u16],
        indicators_status: u32,
    ) -> Result<Self, ConfigError> {
        let codecs = heapless::Vec::from_slice(codecs).map_err(|()| {
            error!(
                "HF config rejected: {} codecs exceeds maximum of {}",
                codecs.len(),
                MAX_NUM_CODECS
            );
            ConfigError::TooManyCodecs(codecs.len())
        })?;
        let indicators = heapless::Vec::from_slice(indicators).map_err(|()| {
            error!(
                "HF config rejected: {} HF indicators exceeds maximum of {}",
                indicators.len(),
                MAX_NUM_HF_INDICATORS
            );
            ConfigError::TooManyIndicators(indicators.len())
        })?;
        Ok(Self {
            supported_features,
            codecs,
            indicators,
            indicators_status,
        })
    }
}

impl Default for HfConfig {
    fn default() -> Self {
        let mut codecs = heapless::Vec::new();
        codecs.push(CODEC_CVSD).ok();
        Self {
            supported_features: DEFAULT_HF_SUPPORTED_FEATURES,
            codecs,
            indicators: heapless::Vec::new(),
            indicators_status: 0,
        }
    }
}
