//! Wizard Controller
//!
//! Owns the draft, the step pointer, the completed-step set, and the save
//! status for one questionnaire session, and orchestrates the validation
//! engine, step registry, auto-save manager, and persistence gateway.
//!
//! Phases: `Loading → Active → Submitting → {Completed | Active with a
//! submit error}`. All transitions are synchronous and run-to-completion
//! between the awaits on persistence calls, so no torn state is observable
//! mid-transition.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::autosave::{AutoSaveManager, SaveStatus};
use crate::config::WizardConfig;
use crate::draft::{Draft, FieldPath, FieldValue};
use crate::error::WizardError;
use crate::gateway::{PersistenceGateway, ReferenceNumber, SessionKey};
use crate::steps::{StepDefinition, StepId, StepRegistry};
use crate::validation::{RuleCatalog, ValidationErrors};

/// Where the wizard is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Loading,
    Active,
    Submitting,
    Completed,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved forward to the named step.
    Advanced { to: StepId },
    /// Last step was already active; the questionnaire was submitted.
    Submitted(ReferenceNumber),
    /// The current step has validation errors; the pointer did not move.
    Blocked(ValidationErrors),
}

/// Result of a `submit` call that reached a decision without a gateway
/// failure (gateway failures are reported as errors and are retryable).
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(ReferenceNumber),
    /// The draft has validation errors; the wizard repositioned to the
    /// first step containing one.
    Blocked(ValidationErrors),
}

/// The component a host UI binds to; one per active session.
pub struct WizardController {
    session: SessionKey,
    gateway: Arc<dyn PersistenceGateway>,
    registry: StepRegistry,
    rules: RuleCatalog,
    autosave: AutoSaveManager,
    draft: Draft,
    phase: WizardPhase,
    current_index: usize,
    completed: IndexSet<StepId>,
    errors: ValidationErrors,
    submit_error: Option<String>,
    load_warning: Option<String>,
}

impl WizardController {
    /// Build a controller with the standard step registry and rule catalog.
    /// The auto-save manager is created here, scoped to this session, and
    /// destroyed at teardown.
    pub fn new(
        session: SessionKey,
        gateway: Arc<dyn PersistenceGateway>,
        config: WizardConfig,
    ) -> Self {
        let autosave = AutoSaveManager::new(
            session.clone(),
            Arc::clone(&gateway),
            config.autosave.clone(),
        );
        Self {
            session,
            gateway,
            registry: StepRegistry::standard(),
            rules: RuleCatalog::standard(),
            autosave,
            draft: Draft::default(),
            phase: WizardPhase::Loading,
            current_index: 0,
            completed: IndexSet::new(),
            errors: ValidationErrors::new(),
            submit_error: None,
            load_warning: None,
        }
    }

    /// Hydrate from the gateway. A load failure is never fatal: the wizard
    /// degrades to an empty draft and records a recoverable warning.
    pub async fn initialize(&mut self) {
        match self.gateway.load(&self.session).await {
            Ok(Some(draft)) => {
                info!(session = %self.session, "resumed existing questionnaire draft");
                self.draft = draft;
            }
            Ok(None) => {
                debug!(session = %self.session, "no stored draft; starting fresh");
                self.draft = Draft::default();
                self.draft.metadata.created_at = Some(Utc::now());
            }
            Err(error) => {
                warn!(session = %self.session, %error, "draft load failed; starting fresh");
                self.load_warning = Some(error.to_string());
                self.draft = Draft::default();
                self.draft.metadata.created_at = Some(Utc::now());
            }
        }

        self.errors = self.rules.validate_draft(&self.draft);
        self.recompute_completed();
        self.resume_position();
        self.phase = WizardPhase::Active;
    }

    /// Merge one field edit, revalidate synchronously, and buffer the
    /// change for auto-save. Repositions the step pointer if the edit
    /// changed the effective sequence.
    pub fn update_field(&mut self, field: FieldPath, value: FieldValue) -> Result<(), WizardError> {
        match self.phase {
            WizardPhase::Loading => return Err(WizardError::NotInitialized),
            WizardPhase::Completed => return Err(WizardError::AlreadyCompleted),
            WizardPhase::Active | WizardPhase::Submitting => {}
        }

        let departing = self.current_step_id();
        self.draft.apply(field, value.clone())?;
        self.draft.metadata.updated_at = Some(Utc::now());

        self.errors = self.rules.validate_draft(&self.draft);
        self.prune_completed();
        self.reposition(departing);

        self.autosave.enqueue(field, value);
        Ok(())
    }

    /// Validate the current step; if clean, persist pending edits and move
    /// forward. The pointer never moves while the flush is unresolved, and
    /// does not move at all if the flush fails.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, WizardError> {
        match self.phase {
            WizardPhase::Loading => return Err(WizardError::NotInitialized),
            WizardPhase::Completed => return Err(WizardError::AlreadyCompleted),
            WizardPhase::Active | WizardPhase::Submitting => {}
        }

        self.errors = self.rules.validate_draft(&self.draft);
        self.prune_completed();

        let (step_id, step_errors) = {
            let sequence = self.registry.resolve(&self.draft);
            let Some(step) = sequence.get(self.current_index) else {
                return Err(WizardError::NotInitialized);
            };
            let step_errors: ValidationErrors = step
                .required_fields
                .iter()
                .filter_map(|field| self.errors.get(field).map(|msg| (*field, *msg)))
                .collect();
            (step.id, step_errors)
        };

        if !step_errors.is_empty() {
            debug!(session = %self.session, step = %step_id, errors = step_errors.len(),
                "advance blocked by validation");
            return Ok(AdvanceOutcome::Blocked(step_errors));
        }

        // Flush-before-navigate: edits from the departing step must be
        // durable before the pointer moves.
        self.autosave.flush_now().await?;
        self.completed.insert(step_id);

        let next = {
            let sequence = self.registry.resolve(&self.draft);
            let position = sequence
                .iter()
                .position(|step| step.id == step_id)
                .unwrap_or(self.current_index);
            sequence.get(position + 1).map(|step| (position + 1, step.id))
        };

        match next {
            Some((index, to)) => {
                self.current_index = index;
                debug!(session = %self.session, step = %to, "advanced");
                Ok(AdvanceOutcome::Advanced { to })
            }
            None => match self.submit().await? {
                SubmitOutcome::Submitted(reference) => Ok(AdvanceOutcome::Submitted(reference)),
                SubmitOutcome::Blocked(errors) => Ok(AdvanceOutcome::Blocked(errors)),
            },
        }
    }

    /// Move back one step. Never blocked by validation; pending edits stay
    /// on the ordinary debounced schedule.
    pub fn retreat(&mut self) -> bool {
        if self.phase != WizardPhase::Active || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Validate the whole draft and finalize it. Validation errors
    /// reposition to the first erroring step; a gateway failure leaves the
    /// draft intact with a retryable error flag.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        match self.phase {
            WizardPhase::Loading => return Err(WizardError::NotInitialized),
            WizardPhase::Completed => return Err(WizardError::AlreadyCompleted),
            WizardPhase::Active | WizardPhase::Submitting => {}
        }

        self.errors = self.rules.validate_draft(&self.draft);
        self.prune_completed();

        if !self.errors.is_empty() {
            self.phase = WizardPhase::Active;
            self.position_at_first_error();
            debug!(session = %self.session, errors = self.errors.len(),
                "submit blocked by validation");
            return Ok(SubmitOutcome::Blocked(self.errors.clone()));
        }

        self.phase = WizardPhase::Submitting;

        // Drain buffered edits so the stored draft matches what we submit.
        if let Err(error) = self.autosave.flush_now().await {
            self.phase = WizardPhase::Active;
            self.submit_error = Some(error.to_string());
            return Err(error.into());
        }

        match self.gateway.submit(&self.session, &self.draft).await {
            Ok(reference) => {
                info!(session = %self.session, %reference, "questionnaire submitted");
                self.draft.metadata.completed_at = Some(Utc::now());
                self.completed.insert(StepId::Review);
                self.submit_error = None;
                self.phase = WizardPhase::Completed;
                Ok(SubmitOutcome::Submitted(reference))
            }
            Err(error) => {
                warn!(session = %self.session, %error, "submit failed; draft preserved");
                self.submit_error = Some(error.to_string());
                self.phase = WizardPhase::Active;
                Err(error.into())
            }
        }
    }

    /// Final synchronous drain before the session is released
    /// (unmount/logout). Pending timers are cancelled, not abandoned.
    pub async fn teardown(&mut self) {
        self.autosave.shutdown().await;
    }

    // ------------------------------------------------------------------
    // Read-only surface
    // ------------------------------------------------------------------

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The current effective step sequence.
    pub fn effective_steps(&self) -> Vec<&StepDefinition> {
        self.registry.resolve(&self.draft)
    }

    pub fn current_step_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.registry
            .resolve(&self.draft)
            .into_iter()
            .nth(self.current_index)
    }

    pub fn current_step_id(&self) -> Option<StepId> {
        self.current_step().map(|step| step.id)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn completed_steps(&self) -> &IndexSet<StepId> {
        &self.completed
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    /// Event channel for save-status transitions; fires on every
    /// successful flush.
    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.autosave.last_saved()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Warning recorded when hydration failed and the wizard degraded to an
    /// empty draft.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Completed share of the current effective sequence, 0–100.
    pub fn progress_percent(&self) -> u8 {
        let total = self.registry.resolve(&self.draft).len();
        if total == 0 {
            return 0;
        }
        let completed = self.completed.len().min(total);
        ((completed as f32 / total as f32) * 100.0) as u8
    }

    // ------------------------------------------------------------------
    // Internal bookkeeping
    // ------------------------------------------------------------------

    /// Rebuild the completed set from scratch against the current error
    /// map. Steps with no required fields (Review) complete only by being
    /// advanced through, never by recomputation.
    fn recompute_completed(&mut self) {
        self.completed.clear();
        for step in self.registry.definitions() {
            if step.required_fields.is_empty() || !(step.include)(&self.draft) {
                continue;
            }
            let clean = step
                .required_fields
                .iter()
                .all(|field| !self.errors.contains_key(field));
            if clean {
                self.completed.insert(step.id);
            }
        }
    }

    /// Drop completed ids whose steps are now excluded or have errors.
    fn prune_completed(&mut self) {
        let registry = &self.registry;
        let draft = &self.draft;
        let errors = &self.errors;
        self.completed.retain(|id| match registry.definition(*id) {
            Some(step) => {
                (step.include)(draft)
                    && !step
                        .required_fields
                        .iter()
                        .any(|field| errors.contains_key(field))
            }
            None => false,
        });
    }

    /// Keep the pointer on the departing step if it is still included;
    /// otherwise keep the numeric index, which lands on the next
    /// still-included step, clamped to the sequence end.
    fn reposition(&mut self, departing: Option<StepId>) {
        let sequence = self.registry.resolve(&self.draft);
        if sequence.is_empty() {
            self.current_index = 0;
            return;
        }
        if let Some(id) = departing {
            if let Some(position) = sequence.iter().position(|step| step.id == id) {
                self.current_index = position;
                return;
            }
            debug!(session = %self.session, step = %id, "active step left the sequence");
        }
        if self.current_index >= sequence.len() {
            self.current_index = sequence.len() - 1;
        }
    }

    /// Resume at the first incomplete step of the effective sequence.
    fn resume_position(&mut self) {
        let sequence = self.registry.resolve(&self.draft);
        self.current_index = sequence
            .iter()
            .position(|step| !self.completed.contains(&step.id))
            .unwrap_or_else(|| sequence.len().saturating_sub(1));
    }

    /// Point at the first effective step with an error among its required
    /// fields; steps whose fields are all clean keep their position.
    fn position_at_first_error(&mut self) {
        let sequence = self.registry.resolve(&self.draft);
        if let Some(position) = sequence.iter().position(|step| {
            step.required_fields
                .iter()
                .any(|field| self.errors.contains_key(field))
        }) {
            self.current_index = position;
        }
    }
}
