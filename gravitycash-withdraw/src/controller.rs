use std::sync::Arc;
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use gravitycash_api::domain::{ContactlessMode, Fiat, WithdrawalMethod};
use gravitycash_api::types::{AccountSnapshot, WithdrawalReceipt, WithdrawalSubmission};
use log::*;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::account::AccountContext;
use crate::backend::WithdrawalBackend;
use crate::config::ControllerConfig;
use crate::contactless::ContactlessInitiator;
use crate::error::{Error, TransferError, ValidationError};
use crate::form::{ValidatedWithdrawal, WithdrawalForm};
use crate::state::{Confirmation, FormStage, FormState, PendingSubmission};

/// What a successful `submit` started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// Waiting for the backend confirmation of the submission with this id
    Processing(Uuid),
    /// Nfc request is valid, the transfer is up to the contactless initiator
    Contactless,
}

/// Nfc request that passed validation and waits for the initiator callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedTransfer {
    amount: Decimal,
    currency: Fiat,
}

struct Inner {
    form: WithdrawalForm,
    state: FormState,
    /// Set by a contactless `submit`, consumed by `complete_nfc` or `fail_nfc`
    armed: Option<ArmedTransfer>,
}

/// Drives one withdrawal request from the form to the confirmation.
///
/// Cloning is cheap and every clone controls the same form.
#[derive(Clone)]
pub struct WithdrawalController {
    inner: Arc<Mutex<Inner>>,
    /// Fires on every state transition
    notify: Arc<Notify>,
    account: Arc<dyn AccountContext>,
    backend: Arc<dyn WithdrawalBackend>,
    config: ControllerConfig,
}

impl WithdrawalController {
    pub fn new(
        account: Arc<dyn AccountContext>,
        backend: Arc<dyn WithdrawalBackend>,
        config: ControllerConfig,
        method: WithdrawalMethod,
    ) -> Self {
        WithdrawalController {
            inner: Arc::new(Mutex::new(Inner {
                form: WithdrawalForm::new(method),
                state: FormState::default(),
                armed: None,
            })),
            notify: Arc::new(Notify::new()),
            account,
            backend,
            config: config.sanitized(),
        }
    }

    /// Enter the withdrawal screen with the `method` route parameter. Missing
    /// or unknown methods open the card form.
    pub async fn navigate(&self, method: Option<&str>) {
        let method = match method.map(|m| m.parse::<WithdrawalMethod>()) {
            Some(Ok(method)) => method,
            Some(Err(e)) => {
                warn!("{e}, opening the card form");
                WithdrawalMethod::Card
            }
            None => WithdrawalMethod::Card,
        };
        let mut inner = self.inner.lock().await;
        if let FormState::Processing(pending) = &inner.state {
            info!("Leaving withdrawal {} unconfirmed", pending.id);
            pending.abort();
        }
        inner.form = WithdrawalForm::new(method);
        inner.armed = None;
        self.transition(&mut inner, FormState::default());
    }

    pub async fn select_method(&self, method: WithdrawalMethod) {
        self.inner.lock().await.form.method = method;
    }

    pub async fn update_field(&self, name: &str, value: impl Into<String>) {
        self.inner.lock().await.form.set_field(name, value.into());
    }

    pub async fn submit(&self) -> Result<Submitted, Error> {
        let mut inner = self.inner.lock().await;
        Self::ensure_editing(&inner.state)?;
        inner.state = FormState::default();
        inner.armed = None;

        let (validated, account) = self.checked(&mut inner).await?;
        if validated.method.is_contactless() {
            inner.armed = Some(ArmedTransfer {
                amount: validated.amount,
                currency: account.currency,
            });
            self.notify.notify_waiters();
            return Ok(Submitted::Contactless);
        }

        let (pending, registration) = Self::pending(&validated, &account);
        let id = pending.id;
        let submission = validated.into_submission(id, &account.account_id);
        info!(
            "Submitting {} withdrawal {} of {}",
            pending.method,
            id,
            account.currency.format(pending.amount)
        );
        self.transition(&mut inner, FormState::Processing(pending));
        drop(inner);

        tokio::spawn(self.clone().confirm(submission, registration));
        Ok(Submitted::Processing(id))
    }

    /// Contactless transfer of the last submitted nfc request went through
    pub async fn complete_nfc(&self) {
        let mut inner = self.inner.lock().await;
        let armed = match Self::armed(&inner) {
            Some(armed) => armed,
            None => {
                warn!("Ignoring contactless completion, no nfc request was submitted");
                return;
            }
        };
        inner.armed = None;
        info!(
            "Contactless withdrawal of {} complete",
            armed.currency.format(armed.amount)
        );
        self.transition(
            &mut inner,
            FormState::Complete(Confirmation {
                submission_id: None,
                method: WithdrawalMethod::Nfc,
                amount: armed.amount,
                currency: armed.currency,
                processing_time: Duration::ZERO,
                receipt: None,
            }),
        );
    }

    /// Contactless transfer of the last submitted nfc request failed with `reason`
    pub async fn fail_nfc(&self, reason: impl Into<String>) {
        let error = TransferError::from_reason(reason);
        let mut inner = self.inner.lock().await;
        if Self::armed(&inner).is_none() {
            warn!("Ignoring contactless failure ({error}), no nfc request was submitted");
            return;
        }
        inner.armed = None;
        warn!("Contactless transfer failed: {error}");
        self.transition(
            &mut inner,
            FormState::Editing {
                error: Some(error.into()),
            },
        );
    }

    /// Check amount and balance of the nfc request, then run the transfer
    /// through `initiator` and record its outcome. The controller stays in
    /// `Processing` while the transfer runs, so `cancel` aborts it and no
    /// other request can start.
    pub async fn initiate_contactless(
        &self,
        initiator: &dyn ContactlessInitiator,
        mode: ContactlessMode,
    ) -> Result<(), Error> {
        let (id, amount, registration) = {
            let mut inner = self.inner.lock().await;
            Self::ensure_editing(&inner.state)?;
            let method = inner.form.method;
            if !method.is_contactless() {
                return Err(Error::NotContactless(method));
            }
            inner.state = FormState::default();
            inner.armed = None;
            let (validated, account) = self.checked(&mut inner).await?;
            let (pending, registration) = Self::pending(&validated, &account);
            let (id, amount) = (pending.id, pending.amount);
            self.transition(&mut inner, FormState::Processing(pending));
            (id, amount, registration)
        };

        debug!("Starting contactless {mode} {id} of {amount}");
        let outcome = match Abortable::new(initiator.initiate(amount, mode), registration).await {
            Err(Aborted) => {
                debug!("Contactless transfer {id} aborted");
                return Err(Error::Cancelled);
            }
            Ok(Ok(())) => Ok(None),
            Ok(Err(e)) => {
                warn!("Contactless transfer {id} failed: {e}");
                Err(Error::from(e))
            }
        };
        let result = outcome.as_ref().map(|_| ()).map_err(|e| e.clone());
        self.finish(id, outcome).await;
        result
    }

    /// Abort the pending confirmation. Returns `false` when nothing is pending.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match &inner.state {
            FormState::Processing(pending) => {
                info!("Cancelling withdrawal {}", pending.id);
                pending.abort();
                self.transition(
                    &mut inner,
                    FormState::Editing {
                        error: Some(Error::Cancelled),
                    },
                );
                true
            }
            _ => false,
        }
    }

    /// Start over with an empty form, the selected method stays
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if let FormState::Processing(pending) = &inner.state {
            pending.abort();
        }
        inner.form.clear();
        inner.armed = None;
        self.transition(&mut inner, FormState::default());
    }

    pub async fn state(&self) -> FormState {
        self.inner.lock().await.state.clone()
    }

    pub async fn stage(&self) -> FormStage {
        self.inner.lock().await.state.stage()
    }

    pub async fn form(&self) -> WithdrawalForm {
        self.inner.lock().await.form.clone()
    }

    /// Wait until no submission or contactless transfer is pending
    pub async fn settled(&self) -> FormState {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let inner = self.inner.lock().await;
                if inner.state.stage() != FormStage::Processing {
                    return inner.state.clone();
                }
            }
            notified.await;
        }
    }

    fn ensure_editing(state: &FormState) -> Result<(), Error> {
        match state {
            FormState::Editing { .. } => Ok(()),
            FormState::Processing(_) => Err(Error::SubmissionInProgress),
            FormState::Complete(_) => Err(Error::ResetRequired),
        }
    }

    fn armed(inner: &Inner) -> Option<ArmedTransfer> {
        match inner.state {
            FormState::Editing { .. } => inner.armed,
            _ => None,
        }
    }

    fn pending(
        validated: &ValidatedWithdrawal,
        account: &AccountSnapshot,
    ) -> (PendingSubmission, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let pending = PendingSubmission {
            id: Uuid::new_v4(),
            method: validated.method,
            amount: validated.amount,
            currency: account.currency,
            started_at: Instant::now(),
            abort,
        };
        (pending, registration)
    }

    /// Validate the form and surface the first problem in `Editing`
    async fn checked(
        &self,
        inner: &mut MutexGuard<'_, Inner>,
    ) -> Result<(ValidatedWithdrawal, AccountSnapshot), Error> {
        let checked = self.check(&inner.form).await;
        if let Err(e) = &checked {
            if e.is_validation() {
                debug!("Withdrawal rejected: {e}");
            } else {
                warn!("Withdrawal rejected: {e}");
            }
            self.transition(inner, FormState::Editing { error: Some(e.clone()) });
        }
        checked
    }

    async fn check(
        &self,
        form: &WithdrawalForm,
    ) -> Result<(ValidatedWithdrawal, AccountSnapshot), Error> {
        if form.parse_amount().is_none() {
            return Err(ValidationError::InvalidAmount.into());
        }
        let account = self.account.snapshot().await.ok_or(Error::AuthRequired)?;
        let validated = form.validate(&account)?;
        Ok((validated, account))
    }

    async fn confirm(self, submission: WithdrawalSubmission, registration: AbortRegistration) {
        let id = submission.id;
        let timeout = self.config.confirmation_timeout();
        let backend = self.backend.clone();
        let confirmation = tokio::time::timeout(timeout, async move {
            backend.process_withdrawal(submission).await
        });
        let outcome = match Abortable::new(confirmation, registration).await {
            Err(Aborted) => {
                debug!("Confirmation of withdrawal {id} aborted");
                return;
            }
            Ok(Err(_)) => Err(Error::Timeout(timeout)),
            Ok(Ok(Err(e))) => Err(Error::Backend(e)),
            Ok(Ok(Ok(receipt))) => Ok(Some(receipt)),
        };
        self.finish(id, outcome).await;
    }

    /// Record the outcome of the pending request `id`. The confirmation keeps
    /// the amount and currency that were validated on submit.
    async fn finish(&self, id: Uuid, outcome: Result<Option<WithdrawalReceipt>, Error>) {
        let mut inner = self.inner.lock().await;
        let pending = match &inner.state {
            FormState::Processing(pending) if pending.id == id => pending.clone(),
            _ => {
                warn!("Discarding outcome of stale withdrawal {id}");
                return;
            }
        };
        let next = match outcome {
            Ok(receipt) => {
                info!("Withdrawal {id} confirmed");
                FormState::Complete(Confirmation {
                    submission_id: Some(id),
                    method: pending.method,
                    amount: pending.amount,
                    currency: pending.currency,
                    processing_time: pending.started_at.elapsed(),
                    receipt,
                })
            }
            Err(e) => {
                error!("Withdrawal {id} failed: {e}");
                FormState::Editing { error: Some(e) }
            }
        };
        self.transition(&mut inner, next);
    }

    fn transition(&self, inner: &mut MutexGuard<'_, Inner>, state: FormState) {
        debug!("Withdrawal form {:?} -> {:?}", inner.state.stage(), state.stage());
        inner.state = state;
        self.notify.notify_waiters();
    }
}
