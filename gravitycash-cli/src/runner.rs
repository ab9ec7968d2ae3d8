use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use gravitycash_api::domain::ContactlessMode;
use gravitycash_api::types::{MerchantValidationRequest, PaymentAuthorizationRequest, PaymentResult};
use gravitycash_auth::storage::FileSessionStore;
use gravitycash_auth::Session;
use gravitycash_client::client::GravityClient;
use gravitycash_withdraw::backend::{SimulatedBackend, WithdrawalBackend};
use gravitycash_withdraw::contactless::{
    ContactlessDevice, ContactlessInitiator, DeviceCapability, GatewayInitiator, PaymentGateway,
};
use gravitycash_withdraw::controller::{Submitted, WithdrawalController};
use gravitycash_withdraw::error::BackendError;
use gravitycash_withdraw::state::{Confirmation, FormStage, FormState};
use log::*;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] gravitycash_auth::error::Error),
    #[error(transparent)]
    Withdrawal(#[from] gravitycash_withdraw::error::Error),
    #[error("Withdrawal stopped in {0:?} stage")]
    Unsettled(FormStage),
}

/// Everything needed to fill in and send one withdrawal form
#[derive(Debug, Clone, Default)]
pub struct WithdrawalRequest {
    /// Route parameter, unknown values open the card form
    pub method: Option<String>,
    /// Form inputs by name
    pub fields: Vec<(String, String)>,
    pub mode: ContactlessMode,
}

/// Terminals have neither a wallet nor an NFC antenna
pub struct NoDevice;

impl ContactlessDevice for NoDevice {
    fn capability(&self) -> DeviceCapability {
        DeviceCapability::Unsupported
    }
}

/// Stands in for the payment gateway when no service URL is configured
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn validate_merchant(&self, _: &MerchantValidationRequest) -> Result<Value, BackendError> {
        Err(BackendError::Unavailable("no payment gateway configured".to_owned()))
    }

    async fn process_payment(
        &self,
        _: &PaymentAuthorizationRequest,
    ) -> Result<PaymentResult, BackendError> {
        Err(BackendError::Unavailable("no payment gateway configured".to_owned()))
    }
}

pub fn make_session(config: &AppConfig, session_file: &Path) -> Session {
    Session::new(
        Arc::new(FileSessionStore::new(session_file)),
        config.session.login_delay(),
    )
}

pub fn make_backend(client: Option<&GravityClient>, config: &AppConfig) -> Arc<dyn WithdrawalBackend> {
    match client {
        Some(client) => {
            info!("Sending withdrawals to {}", client.server);
            Arc::new(client.clone())
        }
        None => {
            info!("No withdrawal service configured, settlements are simulated");
            config.controller.check_simulation(&config.simulation);
            Arc::new(SimulatedBackend::new(config.simulation.clone()))
        }
    }
}

pub fn make_initiator(
    client: Option<&GravityClient>,
    config: &AppConfig,
) -> Box<dyn ContactlessInitiator> {
    let contactless = config.contactless.clone();
    match client {
        Some(client) => Box::new(GatewayInitiator::new(NoDevice, client.clone(), contactless)),
        None => Box::new(GatewayInitiator::new(NoDevice, OfflineGateway, contactless)),
    }
}

/// Fill in the form, submit it and wait for the outcome. The pending
/// confirmation is cancelled when `interrupt` resolves first.
pub async fn run_withdrawal<I>(
    controller: &WithdrawalController,
    request: WithdrawalRequest,
    initiator: &dyn ContactlessInitiator,
    interrupt: I,
) -> Result<Confirmation, Error>
where
    I: Future<Output = ()>,
{
    controller.navigate(request.method.as_deref()).await;
    for (name, value) in request.fields {
        controller.update_field(&name, value).await;
    }

    match controller.submit().await? {
        Submitted::Contactless => {
            controller.initiate_contactless(initiator, request.mode).await?;
        }
        Submitted::Processing(id) => {
            info!("Waiting for confirmation of withdrawal {id}");
            tokio::select! {
                _ = controller.settled() => {}
                _ = interrupt => {
                    if controller.cancel().await {
                        warn!("Interrupted, withdrawal {id} cancelled");
                    }
                }
            }
        }
    }

    match controller.state().await {
        FormState::Complete(confirmation) => Ok(confirmation),
        FormState::Editing { error: Some(e) } => Err(e.into()),
        other => Err(Error::Unsettled(other.stage())),
    }
}
