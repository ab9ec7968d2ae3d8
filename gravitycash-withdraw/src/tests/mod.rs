use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use gravitycash_api::domain::{ContactlessMode, Fiat, WithdrawalMethod};
use gravitycash_api::types::{User, WithdrawalReceipt, WithdrawalSubmission};
use gravitycash_auth::storage::MemorySessionStore;
use gravitycash_auth::Session;
use rust_decimal::Decimal;
use serde_json::json;

use crate::account::{AccountContext, StaticAccount};
use crate::backend::{SimulatedBackend, WithdrawalBackend};
use crate::config::ControllerConfig;
use crate::contactless::ContactlessInitiator;
use crate::controller::{Submitted, WithdrawalController};
use crate::error::{BackendError, Error, TransferError, ValidationError};
use crate::state::{FormStage, FormState};

struct FailingBackend;

#[async_trait]
impl WithdrawalBackend for FailingBackend {
    async fn process_withdrawal(
        &self,
        _: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError> {
        Err(BackendError::Rejected {
            status: 400,
            message: "daily limit reached".to_owned(),
        })
    }
}

/// Never answers
struct HangingBackend;

#[async_trait]
impl WithdrawalBackend for HangingBackend {
    async fn process_withdrawal(
        &self,
        _: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError> {
        futures::future::pending().await
    }
}

#[derive(Default)]
struct RecordingBackend {
    submissions: StdMutex<Vec<WithdrawalSubmission>>,
}

#[async_trait]
impl WithdrawalBackend for RecordingBackend {
    async fn process_withdrawal(
        &self,
        submission: WithdrawalSubmission,
    ) -> Result<WithdrawalReceipt, BackendError> {
        self.submissions.lock().unwrap().push(submission);
        Ok(WithdrawalReceipt::from_payload(json!({"id": "wd_1"})))
    }
}

/// Takes a while to reach the terminal
struct SlowInitiator {
    delay: Duration,
    calls: StdMutex<Vec<Decimal>>,
}

impl SlowInitiator {
    fn new(delay: Duration) -> Self {
        SlowInitiator {
            delay,
            calls: StdMutex::new(vec![]),
        }
    }
}

#[async_trait]
impl ContactlessInitiator for SlowInitiator {
    async fn initiate(&self, amount: Decimal, _: ContactlessMode) -> Result<(), TransferError> {
        self.calls.lock().unwrap().push(amount);
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

struct FakeInitiator {
    outcome: Result<(), TransferError>,
    calls: StdMutex<Vec<(Decimal, ContactlessMode)>>,
}

impl FakeInitiator {
    fn new(outcome: Result<(), TransferError>) -> Self {
        FakeInitiator {
            outcome,
            calls: StdMutex::new(vec![]),
        }
    }
}

#[async_trait]
impl ContactlessInitiator for FakeInitiator {
    async fn initiate(&self, amount: Decimal, mode: ContactlessMode) -> Result<(), TransferError> {
        self.calls.lock().unwrap().push((amount, mode));
        self.outcome.clone()
    }
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn demo_account() -> Arc<dyn AccountContext> {
    Arc::new(StaticAccount::new(User::demo().snapshot()))
}

fn controller(backend: Arc<dyn WithdrawalBackend>, method: WithdrawalMethod) -> WithdrawalController {
    init_logs();
    WithdrawalController::new(demo_account(), backend, ControllerConfig::default(), method)
}

async fn fill_card(controller: &WithdrawalController, amount: &str) {
    controller.update_field("amount", amount).await;
    controller.update_field("cardNumber", "4111 1111 1111 1111").await;
    controller.update_field("expiryDate", "12/27").await;
    controller.update_field("cvv", "123").await;
}

fn editing_error(state: &FormState) -> Option<Error> {
    assert_eq!(state.stage(), FormStage::Editing);
    state.error().cloned()
}

#[tokio::test(start_paused = true)]
async fn card_withdrawal_completes() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;

    let submitted = controller.submit().await.expect("submit");
    assert!(matches!(submitted, Submitted::Processing(_)));
    assert_eq!(controller.stage().await, FormStage::Processing);

    let state = controller.settled().await;
    let confirmation = state.confirmation().expect("confirmation");
    assert_eq!(confirmation.formatted_amount(), "€200.00");
    assert_eq!(confirmation.headline(), "Withdrawal Successful!");
    assert_eq!(Submitted::Processing(confirmation.submission_id.unwrap()), submitted);
    assert!(confirmation.processing_time >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn overdraft_is_rejected_in_place() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Card);
    fill_card(&controller, "6000").await;

    let res = controller.submit().await;
    assert_eq!(res, Err(ValidationError::InsufficientFunds.into()));
    let state = controller.state().await;
    assert_eq!(
        editing_error(&state).map(|e| e.to_string()),
        Some("Insufficient funds".to_owned())
    );
    let form = controller.form().await;
    assert_eq!(form.amount, "6000");
    assert_eq!(form.card.cvv, "123");
}

#[tokio::test(start_paused = true)]
async fn new_submit_clears_previous_error() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Iban);
    controller.update_field("amount", "100").await;
    assert_eq!(
        controller.submit().await,
        Err(ValidationError::MissingIbanFields.into())
    );

    controller.update_field("accountName", "Alex Johnson").await;
    controller.update_field("iban", "FR7630006000011234567890189").await;
    controller.update_field("bankName", "BNP").await;
    controller.submit().await.expect("submit");
    let state = controller.state().await;
    assert_eq!(state.stage(), FormStage::Processing);
    assert!(state.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn instant_is_faster_than_card() {
    let mut times = vec![];
    for method in [WithdrawalMethod::Instant, WithdrawalMethod::Card] {
        let controller = controller(Arc::new(SimulatedBackend::default()), method);
        fill_card(&controller, "50").await;
        controller.submit().await.expect("submit");
        let state = controller.settled().await;
        let confirmation = state.confirmation().expect("confirmation").clone();
        times.push(confirmation.processing_time);
        if method == WithdrawalMethod::Instant {
            assert_eq!(confirmation.headline(), "Instant Withdrawal Complete!");
        }
    }
    assert!(times[0] < times[1], "{times:?}");
}

#[tokio::test(start_paused = true)]
async fn reset_after_completion_clears_the_form() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");
    controller.settled().await;

    assert_eq!(controller.submit().await, Err(Error::ResetRequired));
    assert_eq!(controller.stage().await, FormStage::Complete);

    controller.reset().await;
    assert_eq!(controller.stage().await, FormStage::Editing);
    assert_eq!(controller.form().await.method, WithdrawalMethod::Card);
    assert_eq!(
        controller.submit().await,
        Err(ValidationError::InvalidAmount.into())
    );
}

#[tokio::test(start_paused = true)]
async fn switching_method_keeps_entered_values() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.select_method(WithdrawalMethod::Iban).await;
    let form = controller.form().await;
    assert_eq!(form.method, WithdrawalMethod::Iban);
    assert_eq!(form.amount, "200");
    assert_eq!(form.card.card_number, "4111 1111 1111 1111");

    controller.select_method(WithdrawalMethod::Instant).await;
    controller.submit().await.expect("card fields are still filled in");
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_processing_changes_nothing() {
    let controller = controller(Arc::new(HangingBackend), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    let first = controller.submit().await.expect("submit");

    assert_eq!(controller.submit().await, Err(Error::SubmissionInProgress));
    let state = controller.state().await;
    let pending = state.pending().expect("still pending");
    assert_eq!(Submitted::Processing(pending.id), first);
    assert!(state.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn backend_failure_reverts_to_editing() {
    let controller = controller(Arc::new(FailingBackend), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");

    let state = controller.settled().await;
    let error = editing_error(&state).expect("error");
    assert_eq!(error.to_string(), "daily limit reached");
    assert_eq!(controller.form().await.amount, "200");
}

#[tokio::test(start_paused = true)]
async fn unanswered_confirmation_times_out() {
    let controller = controller(Arc::new(HangingBackend), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");

    let state = controller.settled().await;
    assert_eq!(
        editing_error(&state),
        Some(Error::Timeout(Duration::from_secs(30)))
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_pending_confirmation() {
    let controller = controller(Arc::new(HangingBackend), WithdrawalMethod::Card);
    assert!(!controller.cancel().await);

    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");
    assert!(controller.cancel().await);

    let state = controller.settled().await;
    assert_eq!(editing_error(&state), Some(Error::Cancelled));
    assert_eq!(state.error().unwrap().to_string(), "Withdrawal was cancelled");
}

#[tokio::test(start_paused = true)]
async fn reset_while_processing_discards_the_request() {
    let backend = Arc::new(SimulatedBackend::default());
    let controller = controller(backend, WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");
    controller.reset().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = controller.state().await;
    assert_eq!(editing_error(&state), None);
    assert_eq!(controller.form().await.amount, "");
}

#[tokio::test(start_paused = true)]
async fn backend_receives_submission_without_cvv() {
    let backend = Arc::new(RecordingBackend::default());
    let controller = controller(backend.clone(), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");
    let state = controller.settled().await;

    let receipt = state.confirmation().and_then(|c| c.receipt.clone()).expect("receipt");
    assert_eq!(receipt.id.as_deref(), Some("wd_1"));
    let submissions = backend.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].account_id, "123");
    assert_eq!(submissions[0].amount, Decimal::from(200));
    assert!(submissions[0].metadata.get("cvv").is_none());
}

#[tokio::test(start_paused = true)]
async fn anonymous_user_cannot_withdraw() {
    init_logs();
    let controller = WithdrawalController::new(
        Arc::new(StaticAccount::anonymous()),
        Arc::new(SimulatedBackend::default()),
        ControllerConfig::default(),
        WithdrawalMethod::Card,
    );
    fill_card(&controller, "abc").await;
    assert_eq!(
        controller.submit().await,
        Err(ValidationError::InvalidAmount.into())
    );
    controller.update_field("amount", "200").await;
    assert_eq!(controller.submit().await, Err(Error::AuthRequired));
}

#[tokio::test(start_paused = true)]
async fn session_balance_backs_validation() {
    init_logs();
    let session = Session::authenticated(Arc::new(MemorySessionStore::default()), User::demo());
    let controller = WithdrawalController::new(
        Arc::new(session.clone()),
        Arc::new(SimulatedBackend::default()),
        ControllerConfig::default(),
        WithdrawalMethod::Card,
    );
    fill_card(&controller, "5280.42").await;
    controller.submit().await.expect("whole balance");
    controller.settled().await;

    controller.reset().await;
    session.logout().await.expect("logout");
    fill_card(&controller, "10").await;
    assert_eq!(controller.submit().await, Err(Error::AuthRequired));
}

#[tokio::test(start_paused = true)]
async fn nfc_submit_hands_over_to_initiator() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    assert_eq!(controller.submit().await, Ok(Submitted::Contactless));
    assert_eq!(controller.stage().await, FormStage::Editing);

    controller.complete_nfc().await;
    let state = controller.state().await;
    let confirmation = state.confirmation().expect("confirmation");
    assert_eq!(confirmation.method, WithdrawalMethod::Nfc);
    assert_eq!(confirmation.amount, Decimal::from(50));
    assert_eq!(confirmation.currency, Fiat::EUR);
    assert_eq!(confirmation.submission_id, None);
}

#[tokio::test(start_paused = true)]
async fn nfc_failure_stays_editing() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;

    controller.submit().await.expect("submit");
    controller.fail_nfc("NFC permission denied").await;
    let state = controller.state().await;
    assert_eq!(
        editing_error(&state).map(|e| e.to_string()),
        Some("NFC permission denied".to_owned())
    );

    controller.submit().await.expect("submit");
    controller.fail_nfc("").await;
    let state = controller.state().await;
    assert_eq!(
        editing_error(&state).map(|e| e.to_string()),
        Some("Failed to initiate transaction".to_owned())
    );
}

#[tokio::test(start_paused = true)]
async fn nfc_completion_keeps_submitted_amount() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    controller.submit().await.expect("submit");

    controller.update_field("amount", "abc").await;
    controller.select_method(WithdrawalMethod::Card).await;
    controller.complete_nfc().await;

    let state = controller.state().await;
    let confirmation = state.confirmation().expect("confirmation");
    assert_eq!(confirmation.amount, Decimal::from(50));
    assert_eq!(confirmation.formatted_amount(), "€50.00");
}

#[tokio::test(start_paused = true)]
async fn nfc_callbacks_without_submit_are_ignored() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    controller.complete_nfc().await;
    controller.fail_nfc("late failure").await;
    let state = controller.state().await;
    assert_eq!(editing_error(&state), None);

    controller.submit().await.expect("submit");
    controller.complete_nfc().await;
    controller.reset().await;
    controller.fail_nfc("second outcome").await;
    assert_eq!(editing_error(&controller.state().await), None);
}

#[tokio::test(start_paused = true)]
async fn nfc_callbacks_outside_nfc_are_ignored() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Card);
    controller.complete_nfc().await;
    controller.fail_nfc("late failure").await;
    let state = controller.state().await;
    assert_eq!(editing_error(&state), None);
}

#[tokio::test(start_paused = true)]
async fn contactless_initiation_routes_outcome() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "75.5").await;
    let initiator = FakeInitiator::new(Ok(()));
    controller
        .initiate_contactless(&initiator, ContactlessMode::Recharge)
        .await
        .expect("transfer");
    assert_eq!(
        initiator.calls.lock().unwrap().clone(),
        vec![(Decimal::new(755, 1), ContactlessMode::Recharge)]
    );
    assert_eq!(controller.stage().await, FormStage::Complete);

    controller.reset().await;
    controller.update_field("amount", "20").await;
    let initiator = FakeInitiator::new(Err(TransferError::NotSupported));
    let res = controller
        .initiate_contactless(&initiator, ContactlessMode::Pay)
        .await;
    assert_eq!(res, Err(TransferError::NotSupported.into()));
    let state = controller.state().await;
    assert_eq!(
        editing_error(&state).map(|e| e.to_string()),
        Some("NFC not supported on this device".to_owned())
    );
}

#[tokio::test(start_paused = true)]
async fn contactless_initiation_checks_balance_first() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "6000").await;
    let initiator = FakeInitiator::new(Ok(()));
    let res = controller
        .initiate_contactless(&initiator, ContactlessMode::Pay)
        .await;
    assert_eq!(res, Err(ValidationError::InsufficientFunds.into()));
    assert!(initiator.calls.lock().unwrap().is_empty());

    controller.select_method(WithdrawalMethod::Card).await;
    let res = controller
        .initiate_contactless(&initiator, ContactlessMode::Pay)
        .await;
    assert_eq!(res, Err(Error::NotContactless(WithdrawalMethod::Card)));
}

#[tokio::test(start_paused = true)]
async fn navigation_falls_back_to_card() {
    let controller = controller(Arc::new(HangingBackend), WithdrawalMethod::Card);
    fill_card(&controller, "200").await;
    controller.submit().await.expect("submit");

    controller.navigate(Some("iban")).await;
    let form = controller.form().await;
    assert_eq!(form.method, WithdrawalMethod::Iban);
    assert_eq!(form.amount, "");
    assert_eq!(controller.stage().await, FormStage::Editing);

    controller.navigate(Some("crypto")).await;
    assert_eq!(controller.form().await.method, WithdrawalMethod::Card);
    controller.navigate(Some("instant")).await;
    controller.navigate(None).await;
    assert_eq!(controller.form().await.method, WithdrawalMethod::Card);
}

#[tokio::test(start_paused = true)]
async fn one_contactless_transfer_at_a_time() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    let initiator = SlowInitiator::new(Duration::from_secs(1));

    let (first, second) = tokio::join!(
        controller.initiate_contactless(&initiator, ContactlessMode::Pay),
        controller.initiate_contactless(&initiator, ContactlessMode::Pay)
    );
    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(Error::SubmissionInProgress));
    assert_eq!(initiator.calls.lock().unwrap().len(), 1);
    assert_eq!(controller.stage().await, FormStage::Complete);
}

#[tokio::test(start_paused = true)]
async fn submit_waits_for_contactless_transfer() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    let initiator = SlowInitiator::new(Duration::from_secs(1));

    let (transfer, submitted) = tokio::join!(
        controller.initiate_contactless(&initiator, ContactlessMode::Pay),
        async {
            assert_eq!(controller.stage().await, FormStage::Processing);
            controller.submit().await
        }
    );
    assert_eq!(transfer, Ok(()));
    assert_eq!(submitted, Err(Error::SubmissionInProgress));
}

#[tokio::test(start_paused = true)]
async fn edits_during_contactless_transfer_keep_validated_amount() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    let initiator = SlowInitiator::new(Duration::from_secs(1));

    let (transfer, _) = tokio::join!(
        controller.initiate_contactless(&initiator, ContactlessMode::Pay),
        async {
            controller.update_field("amount", "abc").await;
            controller.select_method(WithdrawalMethod::Card).await;
        }
    );
    assert_eq!(transfer, Ok(()));
    let state = controller.settled().await;
    let confirmation = state.confirmation().expect("confirmation");
    assert_eq!(confirmation.method, WithdrawalMethod::Nfc);
    assert_eq!(
        confirmation.message(),
        "Your withdrawal request of €50.00 has been processed successfully."
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_contactless_transfer() {
    let controller = controller(Arc::new(SimulatedBackend::default()), WithdrawalMethod::Nfc);
    controller.update_field("amount", "50").await;
    let initiator = SlowInitiator::new(Duration::from_secs(10));

    let (transfer, cancelled) = tokio::join!(
        controller.initiate_contactless(&initiator, ContactlessMode::Pay),
        async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            controller.cancel().await
        }
    );
    assert!(cancelled);
    assert_eq!(transfer, Err(Error::Cancelled));
    assert_eq!(editing_error(&controller.state().await), Some(Error::Cancelled));
}
