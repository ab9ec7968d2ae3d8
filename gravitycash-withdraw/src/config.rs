use std::time::Duration;

use gravitycash_api::domain::Fiat;
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How long a submission may wait for the backend confirmation
    pub confirmation_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            confirmation_timeout_ms: 30_000,
        }
    }
}

impl ControllerConfig {
    /// A zero timeout would fail every submission, it falls back to the default
    pub fn sanitized(self) -> Self {
        if self.confirmation_timeout_ms > 0 {
            self
        } else {
            warn!("Confirmation timeout of 0ms is not usable, using defaults");
            ControllerConfig::default()
        }
    }

    /// Warn when simulated settlements can never beat the confirmation timeout
    pub fn check_simulation(&self, simulation: &SimulationConfig) -> bool {
        let fits = simulation.standard_delay_ms < self.confirmation_timeout_ms;
        if !fits {
            warn!(
                "Confirmation timeout {}ms is not longer than the simulated settlement {}ms, withdrawals will time out",
                self.confirmation_timeout_ms, simulation.standard_delay_ms
            );
        }
        fits
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

/// Settlement delays of the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Expedited settlement of instant withdrawals
    pub instant_delay_ms: u64,
    /// Standard settlement of card and IBAN withdrawals
    pub standard_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            instant_delay_ms: 500,
            standard_delay_ms: 2000,
        }
    }
}

impl SimulationConfig {
    /// Instant settlement has to stay strictly faster than the standard one,
    /// otherwise both delays fall back to defaults.
    pub fn sanitized(self) -> Self {
        if self.instant_delay_ms < self.standard_delay_ms {
            self
        } else {
            warn!(
                "Instant delay {}ms is not shorter than standard delay {}ms, using defaults",
                self.instant_delay_ms, self.standard_delay_ms
            );
            SimulationConfig::default()
        }
    }

    pub fn instant_delay(&self) -> Duration {
        Duration::from_millis(self.instant_delay_ms)
    }

    pub fn standard_delay(&self) -> Duration {
        Duration::from_millis(self.standard_delay_ms)
    }
}

/// Merchant side parameters of contactless sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactlessConfig {
    pub merchant_id: String,
    pub country_code: String,
    pub currency: Fiat,
    pub supported_networks: Vec<String>,
    pub merchant_capabilities: Vec<String>,
}

impl Default for ContactlessConfig {
    fn default() -> Self {
        ContactlessConfig {
            merchant_id: "merchant.com.gravitycash".to_owned(),
            country_code: "FR".to_owned(),
            currency: Fiat::EUR,
            supported_networks: vec!["visa".to_owned(), "masterCard".to_owned(), "amex".to_owned()],
            merchant_capabilities: vec![
                "supports3DS".to_owned(),
                "supportsEMV".to_owned(),
                "supportsCredit".to_owned(),
                "supportsDebit".to_owned(),
            ],
        }
    }
}
