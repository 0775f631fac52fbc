//! End-to-end wizard journeys: navigation, conditional steps, degraded
//! hydration, submit gating, and failure recovery.

mod common;

use std::sync::Arc;

use taxwizard::text::keys;
use taxwizard::{
    AddressField, AdvanceOutcome, FieldPath, FieldValue, PaymentField, PaymentMethod,
    PersonalField, SessionKey, SpouseField, StepId, SubmitOutcome, WizardConfig, WizardController,
    WizardError, WizardPhase,
};

use common::{complete_draft, MemoryGateway};

fn controller(gateway: &Arc<MemoryGateway>) -> WizardController {
    WizardController::new(
        SessionKey::new("flow-session-abc123"),
        Arc::clone(gateway) as Arc<dyn taxwizard::PersistenceGateway>,
        WizardConfig::default(),
    )
}

fn fill_personal(wizard: &mut WizardController) {
    use PersonalField as P;
    wizard
        .update_field(FieldPath::Personal(P::FirstName), FieldValue::text("Wei"))
        .unwrap();
    wizard
        .update_field(FieldPath::Personal(P::LastName), FieldValue::text("Zhang"))
        .unwrap();
    wizard
        .update_field(
            FieldPath::Personal(P::Email),
            FieldValue::text("wei.zhang@example.com"),
        )
        .unwrap();
    wizard
        .update_field(
            FieldPath::Personal(P::PhoneNumber),
            FieldValue::text("5551234567"),
        )
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn single_filer_with_check_refund_reaches_submission() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = controller(&gateway);
    wizard.initialize().await;
    assert_eq!(wizard.phase(), WizardPhase::Active);
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));

    fill_personal(&mut wizard);
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Spouse }
    );

    wizard
        .update_field(FieldPath::Spouse(SpouseField::HasSpouse), FieldValue::flag(false))
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Dependents }
    );

    wizard
        .update_field(
            FieldPath::Dependents(taxwizard::DependentsField::HasDependents),
            FieldValue::flag(false),
        )
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Address }
    );

    use AddressField as A;
    wizard
        .update_field(FieldPath::Address(A::AddressType), FieldValue::text("us"))
        .unwrap();
    wizard
        .update_field(FieldPath::Address(A::UsStreet), FieldValue::text("1 Main St"))
        .unwrap();
    wizard
        .update_field(FieldPath::Address(A::UsCity), FieldValue::text("Seattle"))
        .unwrap();
    wizard
        .update_field(FieldPath::Address(A::UsState), FieldValue::text("WA"))
        .unwrap();
    wizard
        .update_field(FieldPath::Address(A::UsZipCode), FieldValue::text("98101"))
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Payment }
    );

    // Refund by check: the banking step never enters the sequence.
    wizard
        .update_field(FieldPath::Payment(PaymentField::Method), FieldValue::text("check"))
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::EFilePin }
    );

    wizard
        .update_field(FieldPath::EFilePin, FieldValue::text("12345"))
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Immigration }
    );

    wizard
        .update_field(
            FieldPath::Immigration(taxwizard::ImmigrationField::IsUsCitizen),
            FieldValue::flag(true),
        )
        .unwrap();
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Review }
    );

    // Advancing past the final step submits.
    let outcome = wizard.advance().await.unwrap();
    let AdvanceOutcome::Submitted(reference) = outcome else {
        panic!("expected submission, got {outcome:?}");
    };
    assert!(reference.0.starts_with("TQ-"));
    assert_eq!(wizard.phase(), WizardPhase::Completed);
    assert_eq!(wizard.progress_percent(), 100);

    let submissions = gateway.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].2.personal_info.first_name.as_deref(),
        Some("Wei")
    );

    wizard.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn advance_on_incomplete_step_blocks_without_moving() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    let outcome = wizard.advance().await.unwrap();
    let AdvanceOutcome::Blocked(errors) = outcome else {
        panic!("expected blocked advance, got {outcome:?}");
    };
    assert_eq!(
        errors.get(&FieldPath::Personal(PersonalField::FirstName)),
        Some(&keys::REQUIRED_FIELD)
    );
    assert_eq!(errors.len(), 4, "all four personal fields are required");
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));
    assert_eq!(wizard.phase(), WizardPhase::Active);
    assert_eq!(gateway.saves(), 0, "blocked advance flushes nothing");
}

#[tokio::test(start_paused = true)]
async fn spouse_fields_are_required_only_when_married() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    let spouse_first = FieldPath::Spouse(SpouseField::FirstName);
    wizard
        .update_field(FieldPath::Spouse(SpouseField::HasSpouse), FieldValue::flag(false))
        .unwrap();
    assert!(!wizard.errors().contains_key(&spouse_first));

    wizard
        .update_field(FieldPath::Spouse(SpouseField::HasSpouse), FieldValue::flag(true))
        .unwrap();
    assert_eq!(wizard.errors().get(&spouse_first), Some(&keys::REQUIRED_FIELD));
}

#[tokio::test(start_paused = true)]
async fn switching_off_direct_deposit_repositions_past_banking() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = SessionKey::new("flow-session-abc123");
    let mut seeded = complete_draft();
    seeded.payment_method.method = Some(PaymentMethod::DirectDeposit);
    gateway.seed(&session, seeded);

    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    // Bank details are empty, so hydration resumes at the banking step.
    assert_eq!(wizard.current_step_id(), Some(StepId::Banking));
    assert!(wizard
        .effective_steps()
        .iter()
        .any(|step| step.id == StepId::Banking));

    // Changing the refund method while the banking step is active removes
    // it from the sequence; the pointer lands on the next remaining step.
    wizard
        .update_field(FieldPath::Payment(PaymentField::Method), FieldValue::text("check"))
        .unwrap();
    assert_eq!(wizard.current_step_id(), Some(StepId::EFilePin));
    assert!(!wizard
        .effective_steps()
        .iter()
        .any(|step| step.id == StepId::Banking));
    assert!(!wizard.completed_steps().contains(&StepId::Banking));

    // Only the method changed; the rest of the draft is untouched.
    assert_eq!(wizard.draft().personal_info.first_name.as_deref(), Some("Wei"));
    assert_eq!(wizard.draft().e_file_pin.as_deref(), Some("12345"));
}

#[tokio::test(start_paused = true)]
async fn retreat_is_never_blocked_by_validation() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    assert!(!wizard.retreat(), "cannot retreat from the first step");

    fill_personal(&mut wizard);
    wizard.advance().await.unwrap();
    assert_eq!(wizard.current_step_id(), Some(StepId::Spouse));

    // The spouse step is incomplete; going back is still allowed.
    assert!(wizard.retreat());
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));
}

#[tokio::test(start_paused = true)]
async fn load_failure_degrades_to_fresh_draft_with_warning() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.fail_next_loads(1);

    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    assert_eq!(wizard.phase(), WizardPhase::Active);
    assert!(wizard.load_warning().is_some());
    assert!(wizard.draft().personal_info.first_name.is_none());
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));
}

#[tokio::test(start_paused = true)]
async fn hydration_resumes_at_first_incomplete_step() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = SessionKey::new("flow-session-abc123");
    gateway.seed(&session, complete_draft());

    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    // Every data step is clean; review completes only by advancing
    // through it.
    assert_eq!(wizard.current_step_id(), Some(StepId::Review));
    assert!(wizard.completed_steps().contains(&StepId::Personal));
    assert!(wizard.completed_steps().contains(&StepId::Immigration));
    assert!(!wizard.completed_steps().contains(&StepId::Review));

    let outcome = wizard.advance().await.unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Submitted(_)));
    assert!(wizard.completed_steps().contains(&StepId::Review));
}

#[tokio::test(start_paused = true)]
async fn submit_with_invalid_field_repositions_to_first_error() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = SessionKey::new("flow-session-abc123");
    gateway.seed(&session, complete_draft());

    let mut wizard = controller(&gateway);
    wizard.initialize().await;
    assert_eq!(wizard.current_step_id(), Some(StepId::Review));

    let email = FieldPath::Personal(PersonalField::Email);
    wizard
        .update_field(email, FieldValue::text("not-an-email"))
        .unwrap();

    let outcome = wizard.submit().await.unwrap();
    let SubmitOutcome::Blocked(errors) = outcome else {
        panic!("expected blocked submit, got {outcome:?}");
    };
    assert_eq!(errors.get(&email), Some(&keys::INVALID_EMAIL));
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));
    assert_eq!(wizard.phase(), WizardPhase::Active);
    assert!(gateway.submissions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_submit_is_retryable() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = SessionKey::new("flow-session-abc123");
    gateway.seed(&session, complete_draft());
    gateway.fail_next_submits(1);

    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    let error = wizard.submit().await.unwrap_err();
    assert!(matches!(error, WizardError::Submit(_)));
    assert_eq!(wizard.phase(), WizardPhase::Active);
    assert!(wizard.submit_error().is_some());

    let outcome = wizard.submit().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert_eq!(wizard.phase(), WizardPhase::Completed);
    assert!(wizard.submit_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn advance_does_not_move_when_the_flush_fails() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = controller(&gateway);
    wizard.initialize().await;

    fill_personal(&mut wizard);
    gateway.fail_next_saves(1);

    let error = wizard.advance().await.unwrap_err();
    assert!(matches!(error, WizardError::Save(_)));
    assert_eq!(wizard.current_step_id(), Some(StepId::Personal));
    assert!(!wizard.completed_steps().contains(&StepId::Personal));

    // The buffered edits survived the failure; the retry flushes them and
    // navigation proceeds.
    assert_eq!(
        wizard.advance().await.unwrap(),
        AdvanceOutcome::Advanced { to: StepId::Spouse }
    );
    let stored = gateway.stored(wizard.session()).unwrap();
    assert_eq!(stored.personal_info.first_name.as_deref(), Some("Wei"));
}
