use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use gravitycash_withdraw::config::{ContactlessConfig, ControllerConfig, SimulationConfig};
use serde::Deserialize;

/// Settings read from the TOML file and `GRAVITYCASH_` variables. Nested keys
/// are separated with `__`, e.g. `GRAVITYCASH_CONTROLLER__CONFIRMATION_TIMEOUT_MS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
    pub contactless: ContactlessConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub login_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            login_delay_ms: gravitycash_auth::DEFAULT_LOGIN_DELAY.as_millis() as u64,
        }
    }
}

impl SessionConfig {
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

impl AppConfig {
    /// A missing file leaves every key at its default
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("GRAVITYCASH_").split("__"))
            .extract()
    }
}
