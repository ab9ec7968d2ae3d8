use std::time::Duration;

use gravitycash_api::domain::WithdrawalMethod;
use gravitycash_client::client::Error as ClientError;
use thiserror::Error;
pub use gravitycash_api::error::GravityError;

/// Message used when a device fails without telling why
pub const GENERIC_TRANSFER_FAILURE: &str = "Failed to initiate transaction";

/// Problems with the data the user entered. Recovered locally, no state
/// transition happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Please fill in all required card fields")]
    MissingCardFields,
    #[error("Please fill in all required IBAN fields")]
    MissingIbanFields,
}

/// Contactless session failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("NFC not supported on this device")]
    NotSupported,
    #[error("Failed to validate merchant")]
    MerchantValidation,
    #[error("Payment processing failed")]
    PaymentFailed,
    #[error("{0}")]
    Failed(String),
}

impl TransferError {
    /// Wrap a device reported reason, an empty reason gets the generic message
    pub fn from_reason(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.trim().is_empty() {
            TransferError::Failed(GENERIC_TRANSFER_FAILURE.to_owned())
        } else {
            TransferError::Failed(reason)
        }
    }
}

/// The withdrawal-processing endpoint did not confirm the withdrawal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Withdrawal service unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed withdrawal service response: {0}")]
    Malformed(String),
}

impl From<ClientError> for BackendError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Remote { status, error } => BackendError::Rejected {
                status,
                message: error.message,
            },
            ClientError::Reqwest(e) => BackendError::Unavailable(e.to_string()),
            ClientError::Json(e) => BackendError::Malformed(e.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    TransferInitiation(#[from] TransferError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Withdrawal confirmation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Withdrawal was cancelled")]
    Cancelled,
    #[error("A withdrawal is already being processed")]
    SubmissionInProgress,
    #[error("Withdrawal is already complete, start a new one first")]
    ResetRequired,
    #[error("{0} withdrawals are not contactless")]
    NotContactless(WithdrawalMethod),
    #[error("Action requires authentication")]
    AuthRequired,
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl GravityError for Error {
    fn subtype() -> &'static str {
        "gravitycash_withdraw"
    }

    fn code(&self) -> u16 {
        match self {
            Error::Validation(ValidationError::InvalidAmount) => 0,
            Error::Validation(ValidationError::InsufficientFunds) => 1,
            Error::Validation(ValidationError::MissingCardFields) => 2,
            Error::Validation(ValidationError::MissingIbanFields) => 3,
            Error::TransferInitiation(_) => 4,
            Error::Backend(_) => 5,
            Error::Timeout(_) => 6,
            Error::Cancelled => 7,
            Error::SubmissionInProgress => 8,
            Error::ResetRequired => 9,
            Error::NotContactless(_) => 10,
            Error::AuthRequired => 11,
        }
    }

    fn status(&self) -> u16 {
        match self {
            Error::Validation(ValidationError::InsufficientFunds) => 417,
            Error::Validation(_) => 400,
            Error::TransferInitiation(_) => 502,
            Error::Backend(BackendError::Rejected { status, .. }) => *status,
            Error::Backend(_) => 502,
            Error::Timeout(_) => 504,
            Error::Cancelled => 409,
            Error::SubmissionInProgress => 409,
            Error::ResetRequired => 409,
            Error::NotContactless(_) => 400,
            Error::AuthRequired => 401,
        }
    }
}
