use serde::{Deserialize, Serialize};

use crate::network::BtcNetwork;

/// Fee-rate band applied to externally supplied estimates.
///
/// The fee estimator is an external collaborator; whatever rate it returns
/// is clamped into `[min_sat_per_vbyte, max_sat_per_vbyte]` before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimationSettings {
    pub min_sat_per_vbyte: u64,
    pub max_sat_per_vbyte: u64,
}

impl Default for FeeEstimationSettings {
    fn default() -> Self {
        Self {
            min_sat_per_vbyte: 5,
            max_sat_per_vbyte: 50,
        }
    }
}

/// Static configuration for the signing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinConfig {
    pub network: BtcNetwork,
    #[serde(default)]
    pub fee: FeeEstimationSettings,
    /// Change below this value is folded into the fee instead of creating
    /// an uneconomical output.
    #[serde(default = "default_dust_threshold")]
    pub change_dust_threshold_sat: u64,
}

fn default_dust_threshold() -> u64 {
    546
}

impl Default for BitcoinConfig {
    fn default() -> Self {
        Self {
            network: BtcNetwork::Regtest,
            fee: FeeEstimationSettings::default(),
            change_dust_threshold_sat: default_dust_threshold(),
        }
    }
}

impl BitcoinConfig {
    /// Clamp an externally supplied fee rate into the configured band.
    pub fn clamp_fee_rate(&self, rate_sat_per_vbyte: u64) -> u64 {
        rate_sat_per_vbyte.clamp(self.fee.min_sat_per_vbyte, self.fee.max_sat_per_vbyte)
    }
}
