use std::time::Duration;

use futures::future::AbortHandle;
use gravitycash_api::domain::{Fiat, WithdrawalMethod};
use gravitycash_api::types::WithdrawalReceipt;
use rust_decimal::Decimal;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::Error;

/// Same thing as `FormState`, but carries no additional info, so it's easier to check for equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormStage {
    Editing,
    Processing,
    Complete,
}

/// Withdrawal in flight. Owns the abort handle of its confirmation task.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub id: Uuid,
    pub method: WithdrawalMethod,
    pub amount: Decimal,
    pub currency: Fiat,
    pub started_at: Instant,
    pub(crate) abort: AbortHandle,
}

impl PendingSubmission {
    pub(crate) fn abort(&self) {
        self.abort.abort();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// Missing when an external initiator reported the contactless outcome
    pub submission_id: Option<Uuid>,
    pub method: WithdrawalMethod,
    pub amount: Decimal,
    pub currency: Fiat,
    /// Time spent in `Processing`
    pub processing_time: Duration,
    pub receipt: Option<WithdrawalReceipt>,
}

impl Confirmation {
    pub fn headline(&self) -> &'static str {
        match self.method {
            WithdrawalMethod::Instant => "Instant Withdrawal Complete!",
            _ => "Withdrawal Successful!",
        }
    }

    pub fn formatted_amount(&self) -> String {
        self.currency.format(self.amount)
    }

    pub fn message(&self) -> String {
        let outcome = match self.method {
            WithdrawalMethod::Instant => "instantly processed",
            _ => "processed successfully",
        };
        format!(
            "Your withdrawal request of {} has been {}.",
            self.formatted_amount(),
            outcome
        )
    }
}

/// Where the withdrawal flow is. Exactly one variant at a time, so a request
/// can't be processing and complete at once.
#[derive(Debug, Clone)]
pub enum FormState {
    /// User is filling in the form. Carries the last error shown inline
    Editing { error: Option<Error> },
    Processing(PendingSubmission),
    Complete(Confirmation),
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Editing { error: None }
    }
}

impl FormState {
    pub fn stage(&self) -> FormStage {
        match self {
            FormState::Editing { .. } => FormStage::Editing,
            FormState::Processing(_) => FormStage::Processing,
            FormState::Complete(_) => FormStage::Complete,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            FormState::Editing { error } => error.as_ref(),
            _ => None,
        }
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        match self {
            FormState::Complete(confirmation) => Some(confirmation),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingSubmission> {
        match self {
            FormState::Processing(pending) => Some(pending),
            _ => None,
        }
    }
}
