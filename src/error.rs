//! Wizard-level error taxonomy.
//!
//! Validation failures are surfaced through operation outcomes rather than
//! errors; this enum covers the paths that genuinely fail: bad field
//! writes, persistence failures, and calls in the wrong phase. Every
//! variant leaves the controller in a well-defined, resumable state.

use crate::draft::DraftError;
use crate::gateway::{SaveError, SubmitError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// A flush the caller depended on did not complete; nothing moved.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// The submit attempt failed; the draft is intact and retryable.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("wizard is still loading; call initialize first")]
    NotInitialized,

    #[error("questionnaire was already completed")]
    AlreadyCompleted,
}
