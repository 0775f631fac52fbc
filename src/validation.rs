//! Validation Engine
//!
//! Pure rule evaluator over the questionnaire draft. The same catalog and
//! code path serve live per-field feedback and the exhaustive pre-submit
//! check, so the two can never disagree.
//!
//! Rules are declared in a fixed order; evaluation stops at the first
//! failing rule for a field, yielding at most one error per field path.

use chrono::NaiveDate;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::draft::{
    AddressField, AddressType, DependentsField, Draft, FieldPath, FieldValue, ImmigrationField,
    PaymentField, PaymentMethod, PersonalField, SpouseField,
};
use crate::text::{keys, MessageKey};

/// Field path → message key, at most one entry per path, declaration order.
pub type ValidationErrors = IndexMap<FieldPath, MessageKey>;

/// Cross-field check; receives the whole draft plus the field's value.
pub type FieldValidator = fn(&Draft, Option<&FieldValue>) -> bool;

/// Gates a rule on other fields (conditional requiredness).
pub type RulePredicate = fn(&Draft) -> bool;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// The documented "I have no U.S. phone number" placeholder. The intake
/// instructions tell filers without a U.S. number to enter this value, so
/// the phone rule accepts it by name rather than by accident of digit count.
pub const NO_US_PHONE_PLACEHOLDER: &str = "0000000000";

const US_PHONE_DIGITS: usize = 10;
const EFILE_PIN_DIGITS: usize = 5;
const EFILE_PIN_FORBIDDEN: &str = "00000";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    /// Value must be present and non-empty.
    Required,
    Email,
    Phone,
    Date,
    /// `None` validator is an explicit always-valid opt-out.
    Custom(Option<FieldValidator>),
}

impl RuleKind {
    fn check(&self, draft: &Draft, value: Option<&FieldValue>) -> bool {
        let absent = value.map(FieldValue::is_empty).unwrap_or(true);
        let text = value.and_then(FieldValue::as_text);
        match self {
            RuleKind::Required => !absent,
            // Non-required rules pass on absent values; Required owns that case.
            RuleKind::Email => absent || EMAIL_RE.is_match(text.unwrap_or_default()),
            RuleKind::Phone => {
                if absent {
                    return true;
                }
                let cleaned = digits(text.unwrap_or_default());
                cleaned == NO_US_PHONE_PLACEHOLDER || cleaned.len() == US_PHONE_DIGITS
            }
            RuleKind::Date => {
                absent
                    || text
                        .map(|t| NaiveDate::parse_from_str(t, DATE_FORMAT).is_ok())
                        .unwrap_or(false)
            }
            RuleKind::Custom(validator) => validator.map(|f| f(draft, value)).unwrap_or(true),
        }
    }
}

pub struct ValidationRule {
    pub field: FieldPath,
    pub kind: RuleKind,
    pub message: MessageKey,
    /// When set, the rule only applies while the predicate holds.
    pub applies_if: Option<RulePredicate>,
}

impl ValidationRule {
    fn new(field: FieldPath, kind: RuleKind, message: MessageKey) -> Self {
        Self {
            field,
            kind,
            message,
            applies_if: None,
        }
    }

    fn when(mut self, predicate: RulePredicate) -> Self {
        self.applies_if = Some(predicate);
        self
    }
}

// Conditional-rule predicates. Address type defaults to U.S. when unanswered.

fn has_spouse(draft: &Draft) -> bool {
    draft.spouse_info.has_spouse == Some(true)
}

fn uses_us_address(draft: &Draft) -> bool {
    draft.address_info.address_type != Some(AddressType::Foreign)
}

fn uses_foreign_address(draft: &Draft) -> bool {
    draft.address_info.address_type == Some(AddressType::Foreign)
}

fn uses_direct_deposit(draft: &Draft) -> bool {
    draft.payment_method.method == Some(PaymentMethod::DirectDeposit)
}

fn is_non_citizen(draft: &Draft) -> bool {
    draft.immigration_history.is_us_citizen == Some(false)
}

fn valid_efile_pin(_draft: &Draft, value: Option<&FieldValue>) -> bool {
    let Some(text) = value.and_then(FieldValue::as_text) else {
        return false;
    };
    let cleaned = digits(text);
    cleaned.len() == EFILE_PIN_DIGITS && cleaned != EFILE_PIN_FORBIDDEN
}

fn account_numbers_match(draft: &Draft, _value: Option<&FieldValue>) -> bool {
    let bank = &draft.payment_method.bank_info;
    match (&bank.account_number, &bank.account_number_confirm) {
        (Some(number), Some(confirm)) => number == confirm,
        // Presence is the Required rule's concern.
        _ => true,
    }
}

/// Declaration-ordered rule set for the questionnaire.
pub struct RuleCatalog {
    rules: Vec<ValidationRule>,
}

impl RuleCatalog {
    /// The standard tax-intake catalog.
    pub fn standard() -> Self {
        use FieldPath as F;
        use RuleKind as K;

        let required = |field| ValidationRule::new(field, K::Required, keys::REQUIRED_FIELD);
        let email = |field| ValidationRule::new(field, K::Email, keys::INVALID_EMAIL);
        let date = |field| ValidationRule::new(field, K::Date, keys::INVALID_DATE);

        let mut rules = vec![
            // Personal
            required(F::Personal(PersonalField::FirstName)),
            required(F::Personal(PersonalField::LastName)),
            required(F::Personal(PersonalField::Email)),
            email(F::Personal(PersonalField::Email)),
            required(F::Personal(PersonalField::PhoneNumber)),
            ValidationRule::new(
                F::Personal(PersonalField::PhoneNumber),
                K::Phone,
                keys::INVALID_PHONE,
            ),
            // Spouse: an answer is always required; details only once yes.
            required(F::Spouse(SpouseField::HasSpouse)),
        ];
        for field in [
            F::Spouse(SpouseField::FirstName),
            F::Spouse(SpouseField::LastName),
            F::Spouse(SpouseField::SsnOrItin),
            F::Spouse(SpouseField::Email),
            F::Spouse(SpouseField::DateOfBirth),
            F::Spouse(SpouseField::Occupation),
        ] {
            rules.push(required(field).when(has_spouse));
        }
        rules.push(email(F::Spouse(SpouseField::Email)).when(has_spouse));
        rules.push(date(F::Spouse(SpouseField::DateOfBirth)).when(has_spouse));

        // Dependents
        rules.push(required(F::Dependents(DependentsField::HasDependents)));

        // Address
        rules.push(required(F::Address(AddressField::AddressType)));
        for field in [
            F::Address(AddressField::UsStreet),
            F::Address(AddressField::UsCity),
            F::Address(AddressField::UsState),
            F::Address(AddressField::UsZipCode),
        ] {
            rules.push(required(field).when(uses_us_address));
        }
        for field in [
            F::Address(AddressField::ForeignStreet),
            F::Address(AddressField::ForeignCity),
            F::Address(AddressField::ForeignCountry),
        ] {
            rules.push(required(field).when(uses_foreign_address));
        }

        // Payment and banking
        rules.push(required(F::Payment(PaymentField::Method)));
        for field in [
            F::Payment(PaymentField::BankName),
            F::Payment(PaymentField::AccountHolder),
            F::Payment(PaymentField::AccountType),
            F::Payment(PaymentField::AccountNumber),
            F::Payment(PaymentField::RoutingNumber),
            F::Payment(PaymentField::AccountNumberConfirm),
        ] {
            rules.push(required(field).when(uses_direct_deposit));
        }
        rules.push(
            ValidationRule::new(
                F::Payment(PaymentField::AccountNumberConfirm),
                K::Custom(Some(account_numbers_match)),
                keys::ACCOUNT_MISMATCH,
            )
            .when(uses_direct_deposit),
        );

        // E-file PIN
        rules.push(required(F::EFilePin));
        rules.push(ValidationRule::new(
            F::EFilePin,
            K::Custom(Some(valid_efile_pin)),
            keys::INVALID_PIN,
        ));

        // Immigration
        rules.push(required(F::Immigration(ImmigrationField::IsUsCitizen)));
        rules.push(required(F::Immigration(ImmigrationField::FirstEntryVisa)).when(is_non_citizen));
        rules.push(required(F::Immigration(ImmigrationField::FirstEntryDate)).when(is_non_citizen));
        rules.push(date(F::Immigration(ImmigrationField::FirstEntryDate)).when(is_non_citizen));

        Self { rules }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Evaluate the rules for one field against a candidate value.
    /// Returns the first failure, if any.
    pub fn validate_field(
        &self,
        draft: &Draft,
        field: FieldPath,
        value: Option<&FieldValue>,
    ) -> Option<MessageKey> {
        for rule in self.rules.iter().filter(|r| r.field == field) {
            if let Some(applies) = rule.applies_if {
                if !applies(draft) {
                    continue;
                }
            }
            if !rule.kind.check(draft, value) {
                return Some(rule.message);
            }
        }
        None
    }

    /// Evaluate every applicable rule; at most one error per field path.
    pub fn validate_draft(&self, draft: &Draft) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rule in &self.rules {
            if errors.contains_key(&rule.field) {
                continue;
            }
            if let Some(applies) = rule.applies_if {
                if !applies(draft) {
                    continue;
                }
            }
            let value = draft.get(rule.field);
            if !rule.kind.check(draft, value.as_ref()) {
                errors.insert(rule.field, rule.message);
            }
        }
        errors
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
