//! taxwizard - Bilingual Tax Questionnaire Wizard Engine
//!
//! State-machine core for a multi-step, conditionally-branching tax intake
//! form: step registry with inclusion predicates, a pure validation engine
//! (cross-field and conditional rules included), a debounced auto-save
//! manager with a no-loss flush protocol, and the controller a host UI
//! binds to. Storage, rendering, and transport live behind the
//! [`gateway::PersistenceGateway`] and [`text::TextCatalog`] seams.

pub mod autosave;
pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod steps;
pub mod text;
pub mod validation;

pub use autosave::{AutoSaveConfig, AutoSaveManager, SaveStatus};
pub use config::WizardConfig;
pub use controller::{AdvanceOutcome, SubmitOutcome, WizardController, WizardPhase};
pub use draft::{
    AccountType, AddressField, AddressType, DependentsField, Draft, DraftError, DraftPatch,
    FieldPath, FieldValue, ImmigrationField, PaymentField, PaymentMethod, PersonalField,
    SpouseField,
};
pub use error::WizardError;
pub use gateway::{
    LoadError, PersistenceGateway, ReferenceNumber, SaveError, SessionKey, SubmitError,
};
pub use steps::{StepComponent, StepDefinition, StepId, StepRegistry};
pub use text::{BilingualText, LanguageMode, MessageKey, TextCatalog};
pub use validation::{RuleCatalog, ValidationErrors, ValidationRule};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
