use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{ContactlessMode, Fiat, WithdrawalMethod};

/// Read-only view on the authenticated account used to validate withdrawals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Identity of the authenticated user owning the account
    pub account_id: String,
    /// Last known balance. Never decremented locally
    pub balance: Decimal,
    pub currency: Fiat,
}

/// Session user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub balance: Decimal,
    pub account_number: String,
    /// Masked card number, only the last four digits are visible
    pub card_number: String,
    pub currency: Fiat,
}

impl User {
    /// The demo account every successful login resolves to
    pub fn demo() -> Self {
        User {
            id: "123".to_owned(),
            name: "Alex Johnson".to_owned(),
            email: "alex@example.com".to_owned(),
            balance: Decimal::new(528042, 2),
            account_number: "FR76 3000 6000 0112 3456 7890 189".to_owned(),
            card_number: "**** **** **** 4321".to_owned(),
            currency: Fiat::EUR,
        }
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account_id: self.id.clone(),
            balance: self.balance,
            currency: self.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninEmail {
    pub email: String,
    pub password: String,
}

/// Request to the withdrawal-processing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalSubmission {
    /// Unique id of the submission within the controller
    pub id: Uuid,
    pub account_id: String,
    pub amount: Decimal,
    pub method: WithdrawalMethod,
    pub reference: Option<String>,
    /// Method specific details of the payout target
    pub metadata: Map<String, Value>,
}

/// Argument record of the `process_withdrawal` remote procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessWithdrawalArgs {
    pub p_account_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub p_amount: Decimal,
    pub p_method: WithdrawalMethod,
    pub p_reference: Option<String>,
    pub p_metadata: Map<String, Value>,
}

impl From<&WithdrawalSubmission> for ProcessWithdrawalArgs {
    fn from(value: &WithdrawalSubmission) -> Self {
        ProcessWithdrawalArgs {
            p_account_id: value.account_id.clone(),
            p_amount: value.amount,
            p_method: value.method,
            p_reference: value.reference.clone(),
            p_metadata: value.metadata.clone(),
        }
    }
}

/// Success payload of the withdrawal-processing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Backend side identifier of the withdrawal, if it reports one
    pub id: Option<String>,
    /// Time the confirmation was received
    pub processed_at: DateTime<Utc>,
    /// Raw payload returned by the endpoint
    pub details: Value,
}

impl WithdrawalReceipt {
    pub fn from_payload(details: Value) -> Self {
        let id = match details.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        WithdrawalReceipt {
            id,
            processed_at: Utc::now(),
            details,
        }
    }
}

/// Structured error returned by the remote endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    pub code: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTotal {
    pub label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Payment sheet request handed to the platform wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub country_code: String,
    pub currency_code: Fiat,
    pub supported_networks: Vec<String>,
    pub merchant_capabilities: Vec<String>,
    pub total: PaymentTotal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantValidationRequest {
    #[serde(rename = "validationURL")]
    pub validation_url: String,
    pub mode: ContactlessMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAuthorizationRequest {
    /// Opaque payment token produced by the wallet
    pub payment: Value,
    pub mode: ContactlessMode,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NdefPayloadType {
    Payment,
    Recharge,
}

impl From<ContactlessMode> for NdefPayloadType {
    fn from(value: ContactlessMode) -> Self {
        match value {
            ContactlessMode::Pay => NdefPayloadType::Payment,
            ContactlessMode::Recharge => NdefPayloadType::Recharge,
        }
    }
}

/// JSON body of the NDEF record emitted to the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdefPayload {
    #[serde(rename = "type")]
    pub payload_type: NdefPayloadType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub currency: Fiat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    pub record_type: String,
    pub media_type: String,
    pub data: String,
}
