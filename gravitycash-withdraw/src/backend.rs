use async_trait::async_trait;
use chrono::Utc;
use gravitycash_api::domain::WithdrawalMethod;
use gravitycash_api::types::{WithdrawalReceipt, WithdrawalSubmission};
use gravitycash_client::client::GravityClient;
use log::*;
use serde_json::json;
use std::time::Duration;

use crate::config::SimulationConfig;
use crate::error::BackendError;

/// Confirms or rejects a validated withdrawal
#[async_trait]
pub trait WithdrawalBackend: Send + Sync {
    async fn process_withdrawal(
        &self,
        submission: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError>;
}

#[async_trait]
impl WithdrawalBackend for GravityClient {
    async fn process_withdrawal(
        &self,
        submission: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError> {
        debug!("Posting withdrawal {} to {}", submission.id, self.server);
        GravityClient::process_withdrawal(self, &submission)
            .await
            .map_err(BackendError::from)
    }
}

/// Settles every withdrawal after a fixed delay, no money moves
pub struct SimulatedBackend {
    config: SimulationConfig,
}

impl SimulatedBackend {
    pub fn new(config: SimulationConfig) -> Self {
        SimulatedBackend {
            config: config.sanitized(),
        }
    }

    pub fn settlement_delay(&self, method: WithdrawalMethod) -> Duration {
        match method {
            WithdrawalMethod::Instant => self.config.instant_delay(),
            _ => self.config.standard_delay(),
        }
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        SimulatedBackend::new(SimulationConfig::default())
    }
}

#[async_trait]
impl WithdrawalBackend for SimulatedBackend {
    async fn process_withdrawal(
        &self,
        submission: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError> {
        let delay = self.settlement_delay(submission.method);
        debug!(
            "Simulating {} settlement of {} in {:?}",
            submission.method, submission.id, delay
        );
        tokio::time::sleep(delay).await;
        Ok(WithdrawalReceipt {
            id: Some(submission.id.to_string()),
            processed_at: Utc::now(),
            details: json!({
                "simulated": true,
                "method": submission.method,
                "settlement_ms": delay.as_millis() as u64,
            }),
        })
    }
}
