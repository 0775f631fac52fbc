//! Step Registry and Effective Sequence
//!
//! Declares the questionnaire steps in order and filters them through
//! per-step inclusion predicates against the current draft. The effective
//! sequence is recomputed on demand; same draft, same sequence.

use serde::Serialize;
use std::fmt;

use crate::draft::{
    AddressField, DependentsField, Draft, FieldPath, ImmigrationField, PaymentField,
    PaymentMethod, PersonalField, SpouseField,
};
use crate::text::{keys, MessageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Personal,
    Spouse,
    Dependents,
    Address,
    Payment,
    Banking,
    EFilePin,
    Immigration,
    Review,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::Personal => "personal",
            StepId::Spouse => "spouse",
            StepId::Dependents => "dependents",
            StepId::Address => "address",
            StepId::Payment => "payment",
            StepId::Banking => "banking",
            StepId::EFilePin => "efile_pin",
            StepId::Immigration => "immigration",
            StepId::Review => "review",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which host-side form a step renders. Resolved once at registry
/// construction; there is no string-tag lookup at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepComponent {
    PersonalForm,
    SpouseForm,
    DependentForm,
    AddressForm,
    PaymentForm,
    BankingForm,
    EFilePinForm,
    ImmigrationForm,
    ReviewSummary,
}

pub type InclusionPredicate = fn(&Draft) -> bool;

pub struct StepDefinition {
    pub id: StepId,
    pub title: MessageKey,
    /// Fields that must be error-free for the step to count as complete.
    /// Conditional requiredness lives in the rule catalog, so listing a
    /// field here is harmless while its rules do not apply.
    pub required_fields: Vec<FieldPath>,
    pub include: InclusionPredicate,
    pub component: StepComponent,
}

fn always(_draft: &Draft) -> bool {
    true
}

fn direct_deposit_selected(draft: &Draft) -> bool {
    draft.payment_method.method == Some(PaymentMethod::DirectDeposit)
}

/// Ordered set of declared steps.
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    /// The standard nine-step questionnaire flow. Banking only appears once
    /// direct deposit is selected; spouse and immigration steps are always
    /// shown because they ask their own gating question.
    pub fn standard() -> Self {
        use FieldPath as F;
        let steps = vec![
            StepDefinition {
                id: StepId::Personal,
                title: keys::STEP_PERSONAL,
                required_fields: vec![
                    F::Personal(PersonalField::FirstName),
                    F::Personal(PersonalField::LastName),
                    F::Personal(PersonalField::Email),
                    F::Personal(PersonalField::PhoneNumber),
                ],
                include: always,
                component: StepComponent::PersonalForm,
            },
            StepDefinition {
                id: StepId::Spouse,
                title: keys::STEP_SPOUSE,
                required_fields: vec![
                    F::Spouse(SpouseField::HasSpouse),
                    F::Spouse(SpouseField::FirstName),
                    F::Spouse(SpouseField::LastName),
                    F::Spouse(SpouseField::SsnOrItin),
                    F::Spouse(SpouseField::Email),
                    F::Spouse(SpouseField::DateOfBirth),
                    F::Spouse(SpouseField::Occupation),
                ],
                include: always,
                component: StepComponent::SpouseForm,
            },
            StepDefinition {
                id: StepId::Dependents,
                title: keys::STEP_DEPENDENTS,
                required_fields: vec![F::Dependents(DependentsField::HasDependents)],
                include: always,
                component: StepComponent::DependentForm,
            },
            StepDefinition {
                id: StepId::Address,
                title: keys::STEP_ADDRESS,
                required_fields: vec![
                    F::Address(AddressField::AddressType),
                    F::Address(AddressField::UsStreet),
                    F::Address(AddressField::UsCity),
                    F::Address(AddressField::UsState),
                    F::Address(AddressField::UsZipCode),
                    F::Address(AddressField::ForeignStreet),
                    F::Address(AddressField::ForeignCity),
                    F::Address(AddressField::ForeignCountry),
                ],
                include: always,
                component: StepComponent::AddressForm,
            },
            StepDefinition {
                id: StepId::Payment,
                title: keys::STEP_PAYMENT,
                required_fields: vec![F::Payment(PaymentField::Method)],
                include: always,
                component: StepComponent::PaymentForm,
            },
            StepDefinition {
                id: StepId::Banking,
                title: keys::STEP_BANKING,
                required_fields: vec![
                    F::Payment(PaymentField::BankName),
                    F::Payment(PaymentField::AccountHolder),
                    F::Payment(PaymentField::AccountType),
                    F::Payment(PaymentField::AccountNumber),
                    F::Payment(PaymentField::RoutingNumber),
                    F::Payment(PaymentField::AccountNumberConfirm),
                ],
                include: direct_deposit_selected,
                component: StepComponent::BankingForm,
            },
            StepDefinition {
                id: StepId::EFilePin,
                title: keys::STEP_EFILE_PIN,
                required_fields: vec![F::EFilePin],
                include: always,
                component: StepComponent::EFilePinForm,
            },
            StepDefinition {
                id: StepId::Immigration,
                title: keys::STEP_IMMIGRATION,
                required_fields: vec![
                    F::Immigration(ImmigrationField::IsUsCitizen),
                    F::Immigration(ImmigrationField::FirstEntryVisa),
                    F::Immigration(ImmigrationField::FirstEntryDate),
                ],
                include: always,
                component: StepComponent::ImmigrationForm,
            },
            StepDefinition {
                id: StepId::Review,
                title: keys::STEP_REVIEW,
                required_fields: Vec::new(),
                include: always,
                component: StepComponent::ReviewSummary,
            },
        ];
        Self { steps }
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn definition(&self, id: StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.id == id)
    }

    /// The effective sequence: declared order, filtered by inclusion
    /// predicates against the current draft.
    pub fn resolve(&self, draft: &Draft) -> Vec<&StepDefinition> {
        self.steps
            .iter()
            .filter(|step| (step.include)(draft))
            .collect()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
