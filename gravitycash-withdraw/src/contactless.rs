use async_trait::async_trait;
use chrono::Utc;
use gravitycash_api::domain::ContactlessMode;
use gravitycash_api::types::{
    MerchantValidationRequest, NdefPayload, NdefRecord, PaymentAuthorizationRequest,
    PaymentRequest, PaymentResult, PaymentTotal,
};
use gravitycash_client::client::GravityClient;
use log::*;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::ContactlessConfig;
use crate::error::{BackendError, TransferError};

/// Runs a tap-to-pay transfer and reports whether it went through
#[async_trait]
pub trait ContactlessInitiator: Send + Sync {
    async fn initiate(&self, amount: Decimal, mode: ContactlessMode) -> Result<(), TransferError>;
}

/// What the device can do for contactless transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCapability {
    /// Platform wallet payment sheet
    Wallet,
    /// Raw NFC tag writes
    Nfc,
    Unsupported,
}

/// Device specific half of a contactless session. Errors are human readable
/// reasons suitable for showing to the user.
#[async_trait]
pub trait ContactlessDevice: Send + Sync {
    fn capability(&self) -> DeviceCapability;

    /// Open the wallet sheet, resolves with the merchant validation URL
    async fn begin_wallet_session(&self, _request: &PaymentRequest) -> Result<String, String> {
        Err("Wallet payments are not available".to_owned())
    }

    async fn complete_merchant_validation(&self, _merchant_session: Value) -> Result<(), String> {
        Err("Wallet payments are not available".to_owned())
    }

    /// Wait until the user authorizes the payment, yields the payment token
    async fn await_authorization(&self) -> Result<Value, String> {
        Err("Wallet payments are not available".to_owned())
    }

    async fn complete_payment(&self, _success: bool) {}

    async fn abort_wallet_session(&self) {}

    async fn write_ndef(&self, _record: NdefRecord) -> Result<(), String> {
        Err("NFC writes are not available".to_owned())
    }
}

/// Merchant backend endpoints a wallet session talks to
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn validate_merchant(
        &self,
        req: &MerchantValidationRequest,
    ) -> Result<Value, BackendError>;

    async fn process_payment(
        &self,
        req: &PaymentAuthorizationRequest,
    ) -> Result<PaymentResult, BackendError>;
}

#[async_trait]
impl PaymentGateway for GravityClient {
    async fn validate_merchant(
        &self,
        req: &MerchantValidationRequest,
    ) -> Result<Value, BackendError> {
        GravityClient::validate_merchant(self, req)
            .await
            .map_err(BackendError::from)
    }

    async fn process_payment(
        &self,
        req: &PaymentAuthorizationRequest,
    ) -> Result<PaymentResult, BackendError> {
        GravityClient::process_payment(self, req)
            .await
            .map_err(BackendError::from)
    }
}

pub struct GatewayInitiator<D, G> {
    pub device: D,
    pub gateway: G,
    pub config: ContactlessConfig,
}

impl<D, G> GatewayInitiator<D, G>
where
    D: ContactlessDevice,
    G: PaymentGateway,
{
    pub fn new(device: D, gateway: G, config: ContactlessConfig) -> Self {
        GatewayInitiator {
            device,
            gateway,
            config,
        }
    }

    pub fn payment_request(&self, amount: Decimal, mode: ContactlessMode) -> PaymentRequest {
        let label = match mode {
            ContactlessMode::Pay => "GravityCash Withdrawal",
            ContactlessMode::Recharge => "GravityCash Recharge",
        };
        PaymentRequest {
            country_code: self.config.country_code.clone(),
            currency_code: self.config.currency,
            supported_networks: self.config.supported_networks.clone(),
            merchant_capabilities: self.config.merchant_capabilities.clone(),
            total: PaymentTotal {
                label: label.to_owned(),
                amount,
            },
        }
    }

    async fn wallet_transfer(
        &self,
        amount: Decimal,
        mode: ContactlessMode,
    ) -> Result<(), TransferError> {
        let request = self.payment_request(amount, mode);
        let validation_url = self
            .device
            .begin_wallet_session(&request)
            .await
            .map_err(TransferError::from_reason)?;

        let validation = MerchantValidationRequest {
            validation_url,
            mode,
        };
        let merchant_session = match self.gateway.validate_merchant(&validation).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Merchant {} validation failed: {e}", self.config.merchant_id);
                self.device.abort_wallet_session().await;
                return Err(TransferError::MerchantValidation);
            }
        };
        self.device
            .complete_merchant_validation(merchant_session)
            .await
            .map_err(TransferError::from_reason)?;

        let payment = self
            .device
            .await_authorization()
            .await
            .map_err(TransferError::from_reason)?;
        let authorization = PaymentAuthorizationRequest {
            payment,
            mode,
            amount,
        };
        match self.gateway.process_payment(&authorization).await {
            Ok(PaymentResult { success: true }) => {
                info!("Wallet {mode} of {amount} authorized");
                self.device.complete_payment(true).await;
                Ok(())
            }
            Ok(PaymentResult { success: false }) => {
                warn!("Wallet {mode} of {amount} declined by the gateway");
                self.device.complete_payment(false).await;
                Err(TransferError::PaymentFailed)
            }
            Err(e) => {
                error!("Wallet {mode} of {amount} failed: {e}");
                self.device.complete_payment(false).await;
                Err(TransferError::PaymentFailed)
            }
        }
    }

    async fn nfc_transfer(&self, amount: Decimal, mode: ContactlessMode) -> Result<(), TransferError> {
        let payload = NdefPayload {
            payload_type: mode.into(),
            amount,
            timestamp: Utc::now(),
            currency: self.config.currency,
        };
        let data = serde_json::to_string(&payload)
            .map_err(|e| TransferError::from_reason(e.to_string()))?;
        let record = NdefRecord {
            record_type: "mime".to_owned(),
            media_type: "application/json".to_owned(),
            data,
        };
        self.device
            .write_ndef(record)
            .await
            .map_err(TransferError::from_reason)?;
        info!("NFC {mode} of {amount} written");
        Ok(())
    }
}

#[async_trait]
impl<D, G> ContactlessInitiator for GatewayInitiator<D, G>
where
    D: ContactlessDevice,
    G: PaymentGateway,
{
    async fn initiate(&self, amount: Decimal, mode: ContactlessMode) -> Result<(), TransferError> {
        match self.device.capability() {
            DeviceCapability::Unsupported => Err(TransferError::NotSupported),
            DeviceCapability::Wallet => self.wallet_transfer(amount, mode).await,
            DeviceCapability::Nfc => self.nfc_transfer(amount, mode).await,
        }
    }
}
