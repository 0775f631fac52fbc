//! Questionnaire Draft Model
//!
//! Defines the mutable, partially-populated questionnaire aggregate
//! ([`Draft`]) and the typed field addressing used everywhere else in the
//! engine:
//! - [`FieldPath`]: tagged enum over section × field, parsed from the dotted
//!   strings the persistence layer stores ("personalInfo.firstName"); unknown
//!   paths are rejected instead of silently no-oping
//! - [`FieldValue`]: the value shapes a field update may carry
//! - [`DraftPatch`]: ordered, last-write-wins partial update
//!
//! Serde renames mirror the stored document shape (camelCase).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::text::LanguageMode;

// ============================================================================
// Section Records
// ============================================================================

/// Filer identity and contact details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub wechat_id: Option<String>,
}

/// Spouse details; only required when `has_spouse` is answered yes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpouseInfo {
    pub has_spouse: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub ssn_or_itin: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DependentInfo {
    pub has_dependents: Option<bool>,
}

/// Mailing address, either U.S. or foreign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInfo {
    pub address_type: Option<AddressType>,
    pub us_address: UsAddress,
    pub foreign_address: ForeignAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Us,
    Foreign,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForeignAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

/// Refund delivery preference plus banking details for direct deposit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub method: Option<PaymentMethod>,
    pub bank_info: BankInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Check,
    Card,
    DirectDeposit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankInfo {
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
    pub account_type: Option<AccountType>,
    pub account_number: Option<String>,
    pub routing_number: Option<String>,
    pub account_number_confirm: Option<String>,
}

/// Visa and entry history for non-citizen filers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImmigrationHistory {
    pub is_us_citizen: Option<bool>,
    pub first_entry_visa: Option<String>,
    pub first_entry_date: Option<String>,
    pub travel_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub language: Option<LanguageMode>,
}

// ============================================================================
// Draft Aggregate
// ============================================================================

/// The in-progress questionnaire record for one session.
///
/// All leaf fields are optional; sections fill in incrementally as the user
/// works through the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
    pub personal_info: PersonalInfo,
    pub spouse_info: SpouseInfo,
    pub dependent_info: DependentInfo,
    pub address_info: AddressInfo,
    pub payment_method: PaymentInfo,
    pub e_file_pin: Option<String>,
    pub immigration_history: ImmigrationHistory,
    pub metadata: Metadata,
}

// ============================================================================
// Field Addressing
// ============================================================================

/// A value carried by a field update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn flag(value: bool) -> Self {
        FieldValue::Flag(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }

    /// Empty text counts as absent for validation purposes.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalField {
    FirstName,
    LastName,
    Email,
    PhoneNumber,
    WechatId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpouseField {
    HasSpouse,
    FirstName,
    LastName,
    SsnOrItin,
    Email,
    DateOfBirth,
    Occupation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependentsField {
    HasDependents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    AddressType,
    UsStreet,
    UsCity,
    UsState,
    UsZipCode,
    ForeignStreet,
    ForeignCity,
    ForeignCountry,
    ForeignPostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentField {
    Method,
    BankName,
    AccountHolder,
    AccountType,
    AccountNumber,
    RoutingNumber,
    AccountNumberConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmigrationField {
    IsUsCitizen,
    FirstEntryVisa,
    FirstEntryDate,
    TravelHistory,
}

/// Typed address of a single questionnaire field.
///
/// `Display`/`FromStr` use the stored dotted form, so hosts that still deal
/// in strings go through an explicit parse that rejects unknown paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Personal(PersonalField),
    Spouse(SpouseField),
    Dependents(DependentsField),
    Address(AddressField),
    Payment(PaymentField),
    EFilePin,
    Immigration(ImmigrationField),
}

impl FieldPath {
    pub fn as_str(self) -> &'static str {
        use AddressField as A;
        use DependentsField as D;
        use ImmigrationField as I;
        use PaymentField as Pay;
        use PersonalField as P;
        use SpouseField as S;
        match self {
            FieldPath::Personal(P::FirstName) => "personalInfo.firstName",
            FieldPath::Personal(P::LastName) => "personalInfo.lastName",
            FieldPath::Personal(P::Email) => "personalInfo.email",
            FieldPath::Personal(P::PhoneNumber) => "personalInfo.phoneNumber",
            FieldPath::Personal(P::WechatId) => "personalInfo.wechatId",
            FieldPath::Spouse(S::HasSpouse) => "spouseInfo.hasSpouse",
            FieldPath::Spouse(S::FirstName) => "spouseInfo.firstName",
            FieldPath::Spouse(S::LastName) => "spouseInfo.lastName",
            FieldPath::Spouse(S::SsnOrItin) => "spouseInfo.ssnOrItin",
            FieldPath::Spouse(S::Email) => "spouseInfo.email",
            FieldPath::Spouse(S::DateOfBirth) => "spouseInfo.dateOfBirth",
            FieldPath::Spouse(S::Occupation) => "spouseInfo.occupation",
            FieldPath::Dependents(D::HasDependents) => "dependentInfo.hasDependents",
            FieldPath::Address(A::AddressType) => "addressInfo.addressType",
            FieldPath::Address(A::UsStreet) => "addressInfo.usAddress.street",
            FieldPath::Address(A::UsCity) => "addressInfo.usAddress.city",
            FieldPath::Address(A::UsState) => "addressInfo.usAddress.state",
            FieldPath::Address(A::UsZipCode) => "addressInfo.usAddress.zipCode",
            FieldPath::Address(A::ForeignStreet) => "addressInfo.foreignAddress.street",
            FieldPath::Address(A::ForeignCity) => "addressInfo.foreignAddress.city",
            FieldPath::Address(A::ForeignCountry) => "addressInfo.foreignAddress.country",
            FieldPath::Address(A::ForeignPostalCode) => "addressInfo.foreignAddress.postalCode",
            FieldPath::Payment(Pay::Method) => "paymentMethod.method",
            FieldPath::Payment(Pay::BankName) => "paymentMethod.bankInfo.bankName",
            FieldPath::Payment(Pay::AccountHolder) => "paymentMethod.bankInfo.accountHolder",
            FieldPath::Payment(Pay::AccountType) => "paymentMethod.bankInfo.accountType",
            FieldPath::Payment(Pay::AccountNumber) => "paymentMethod.bankInfo.accountNumber",
            FieldPath::Payment(Pay::RoutingNumber) => "paymentMethod.bankInfo.routingNumber",
            FieldPath::Payment(Pay::AccountNumberConfirm) => {
                "paymentMethod.bankInfo.accountNumberConfirm"
            }
            FieldPath::EFilePin => "eFilePin",
            FieldPath::Immigration(I::IsUsCitizen) => "immigrationHistory.isUsCitizen",
            FieldPath::Immigration(I::FirstEntryVisa) => "immigrationHistory.firstEntryVisa",
            FieldPath::Immigration(I::FirstEntryDate) => "immigrationHistory.firstEntryDate",
            FieldPath::Immigration(I::TravelHistory) => "immigrationHistory.travelHistory",
        }
    }

    /// Every addressable field, in document order.
    pub fn all() -> &'static [FieldPath] {
        use AddressField as A;
        use DependentsField as D;
        use ImmigrationField as I;
        use PaymentField as Pay;
        use PersonalField as P;
        use SpouseField as S;
        const ALL: &[FieldPath] = &[
            FieldPath::Personal(P::FirstName),
            FieldPath::Personal(P::LastName),
            FieldPath::Personal(P::Email),
            FieldPath::Personal(P::PhoneNumber),
            FieldPath::Personal(P::WechatId),
            FieldPath::Spouse(S::HasSpouse),
            FieldPath::Spouse(S::FirstName),
            FieldPath::Spouse(S::LastName),
            FieldPath::Spouse(S::SsnOrItin),
            FieldPath::Spouse(S::Email),
            FieldPath::Spouse(S::DateOfBirth),
            FieldPath::Spouse(S::Occupation),
            FieldPath::Dependents(D::HasDependents),
            FieldPath::Address(A::AddressType),
            FieldPath::Address(A::UsStreet),
            FieldPath::Address(A::UsCity),
            FieldPath::Address(A::UsState),
            FieldPath::Address(A::UsZipCode),
            FieldPath::Address(A::ForeignStreet),
            FieldPath::Address(A::ForeignCity),
            FieldPath::Address(A::ForeignCountry),
            FieldPath::Address(A::ForeignPostalCode),
            FieldPath::Payment(Pay::Method),
            FieldPath::Payment(Pay::BankName),
            FieldPath::Payment(Pay::AccountHolder),
            FieldPath::Payment(Pay::AccountType),
            FieldPath::Payment(Pay::AccountNumber),
            FieldPath::Payment(Pay::RoutingNumber),
            FieldPath::Payment(Pay::AccountNumberConfirm),
            FieldPath::EFilePin,
            FieldPath::Immigration(I::IsUsCitizen),
            FieldPath::Immigration(I::FirstEntryVisa),
            FieldPath::Immigration(I::FirstEntryDate),
            FieldPath::Immigration(I::TravelHistory),
        ];
        ALL
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::all()
            .iter()
            .find(|path| path.as_str() == s)
            .copied()
            .ok_or_else(|| DraftError::UnknownPath(s.to_string()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered partial update, last-write-wins per field path.
pub type DraftPatch = IndexMap<FieldPath, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("unknown field path: {0}")]
    UnknownPath(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: FieldPath, reason: String },
}

// ============================================================================
// Field Access
// ============================================================================

fn text_of(slot: &Option<String>) -> Option<FieldValue> {
    slot.clone().map(FieldValue::Text)
}

fn flag_of(slot: &Option<bool>) -> Option<FieldValue> {
    slot.map(FieldValue::Flag)
}

fn expect_text(field: FieldPath, value: FieldValue) -> Result<String, DraftError> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| DraftError::InvalidValue {
            field,
            reason: "expected text".to_string(),
        })
}

fn expect_flag(field: FieldPath, value: FieldValue) -> Result<bool, DraftError> {
    value.as_flag().ok_or_else(|| DraftError::InvalidValue {
        field,
        reason: "expected yes/no".to_string(),
    })
}

fn expect_choice<T>(
    field: FieldPath,
    value: FieldValue,
    parse: impl Fn(&str) -> Option<T>,
    allowed: &str,
) -> Result<T, DraftError> {
    let text = expect_text(field, value)?;
    parse(&text).ok_or_else(|| DraftError::InvalidValue {
        field,
        reason: format!("expected one of [{allowed}], got {text:?}"),
    })
}

impl AddressType {
    pub fn as_str(self) -> &'static str {
        match self {
            AddressType::Us => "us",
            AddressType::Foreign => "foreign",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "us" => Some(AddressType::Us),
            "foreign" => Some(AddressType::Foreign),
            _ => None,
        }
    }
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Check => "check",
            PaymentMethod::Card => "card",
            PaymentMethod::DirectDeposit => "direct_deposit",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "check" => Some(PaymentMethod::Check),
            "card" => Some(PaymentMethod::Card),
            "direct_deposit" => Some(PaymentMethod::DirectDeposit),
            _ => None,
        }
    }
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "checking" => Some(AccountType::Checking),
            "savings" => Some(AccountType::Savings),
            _ => None,
        }
    }
}

impl Draft {
    /// Read the current value at a field path.
    pub fn get(&self, path: FieldPath) -> Option<FieldValue> {
        use AddressField as A;
        use DependentsField as D;
        use ImmigrationField as I;
        use PaymentField as Pay;
        use PersonalField as P;
        use SpouseField as S;
        match path {
            FieldPath::Personal(P::FirstName) => text_of(&self.personal_info.first_name),
            FieldPath::Personal(P::LastName) => text_of(&self.personal_info.last_name),
            FieldPath::Personal(P::Email) => text_of(&self.personal_info.email),
            FieldPath::Personal(P::PhoneNumber) => text_of(&self.personal_info.phone_number),
            FieldPath::Personal(P::WechatId) => text_of(&self.personal_info.wechat_id),
            FieldPath::Spouse(S::HasSpouse) => flag_of(&self.spouse_info.has_spouse),
            FieldPath::Spouse(S::FirstName) => text_of(&self.spouse_info.first_name),
            FieldPath::Spouse(S::LastName) => text_of(&self.spouse_info.last_name),
            FieldPath::Spouse(S::SsnOrItin) => text_of(&self.spouse_info.ssn_or_itin),
            FieldPath::Spouse(S::Email) => text_of(&self.spouse_info.email),
            FieldPath::Spouse(S::DateOfBirth) => text_of(&self.spouse_info.date_of_birth),
            FieldPath::Spouse(S::Occupation) => text_of(&self.spouse_info.occupation),
            FieldPath::Dependents(D::HasDependents) => flag_of(&self.dependent_info.has_dependents),
            FieldPath::Address(A::AddressType) => self
                .address_info
                .address_type
                .map(|t| FieldValue::text(t.as_str())),
            FieldPath::Address(A::UsStreet) => text_of(&self.address_info.us_address.street),
            FieldPath::Address(A::UsCity) => text_of(&self.address_info.us_address.city),
            FieldPath::Address(A::UsState) => text_of(&self.address_info.us_address.state),
            FieldPath::Address(A::UsZipCode) => text_of(&self.address_info.us_address.zip_code),
            FieldPath::Address(A::ForeignStreet) => {
                text_of(&self.address_info.foreign_address.street)
            }
            FieldPath::Address(A::ForeignCity) => text_of(&self.address_info.foreign_address.city),
            FieldPath::Address(A::ForeignCountry) => {
                text_of(&self.address_info.foreign_address.country)
            }
            FieldPath::Address(A::ForeignPostalCode) => {
                text_of(&self.address_info.foreign_address.postal_code)
            }
            FieldPath::Payment(Pay::Method) => self
                .payment_method
                .method
                .map(|m| FieldValue::text(m.as_str())),
            FieldPath::Payment(Pay::BankName) => text_of(&self.payment_method.bank_info.bank_name),
            FieldPath::Payment(Pay::AccountHolder) => {
                text_of(&self.payment_method.bank_info.account_holder)
            }
            FieldPath::Payment(Pay::AccountType) => self
                .payment_method
                .bank_info
                .account_type
                .map(|t| FieldValue::text(t.as_str())),
            FieldPath::Payment(Pay::AccountNumber) => {
                text_of(&self.payment_method.bank_info.account_number)
            }
            FieldPath::Payment(Pay::RoutingNumber) => {
                text_of(&self.payment_method.bank_info.routing_number)
            }
            FieldPath::Payment(Pay::AccountNumberConfirm) => {
                text_of(&self.payment_method.bank_info.account_number_confirm)
            }
            FieldPath::EFilePin => text_of(&self.e_file_pin),
            FieldPath::Immigration(I::IsUsCitizen) => {
                flag_of(&self.immigration_history.is_us_citizen)
            }
            FieldPath::Immigration(I::FirstEntryVisa) => {
                text_of(&self.immigration_history.first_entry_visa)
            }
            FieldPath::Immigration(I::FirstEntryDate) => {
                text_of(&self.immigration_history.first_entry_date)
            }
            FieldPath::Immigration(I::TravelHistory) => {
                text_of(&self.immigration_history.travel_history)
            }
        }
    }

    /// Write a value at a field path, rejecting shape mismatches.
    pub fn apply(&mut self, path: FieldPath, value: FieldValue) -> Result<(), DraftError> {
        use AddressField as A;
        use DependentsField as D;
        use ImmigrationField as I;
        use PaymentField as Pay;
        use PersonalField as P;
        use SpouseField as S;
        match path {
            FieldPath::Personal(P::FirstName) => {
                self.personal_info.first_name = Some(expect_text(path, value)?);
            }
            FieldPath::Personal(P::LastName) => {
                self.personal_info.last_name = Some(expect_text(path, value)?);
            }
            FieldPath::Personal(P::Email) => {
                self.personal_info.email = Some(expect_text(path, value)?);
            }
            FieldPath::Personal(P::PhoneNumber) => {
                self.personal_info.phone_number = Some(expect_text(path, value)?);
            }
            FieldPath::Personal(P::WechatId) => {
                self.personal_info.wechat_id = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::HasSpouse) => {
                self.spouse_info.has_spouse = Some(expect_flag(path, value)?);
            }
            FieldPath::Spouse(S::FirstName) => {
                self.spouse_info.first_name = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::LastName) => {
                self.spouse_info.last_name = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::SsnOrItin) => {
                self.spouse_info.ssn_or_itin = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::Email) => {
                self.spouse_info.email = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::DateOfBirth) => {
                self.spouse_info.date_of_birth = Some(expect_text(path, value)?);
            }
            FieldPath::Spouse(S::Occupation) => {
                self.spouse_info.occupation = Some(expect_text(path, value)?);
            }
            FieldPath::Dependents(D::HasDependents) => {
                self.dependent_info.has_dependents = Some(expect_flag(path, value)?);
            }
            FieldPath::Address(A::AddressType) => {
                self.address_info.address_type =
                    Some(expect_choice(path, value, AddressType::parse, "us, foreign")?);
            }
            FieldPath::Address(A::UsStreet) => {
                self.address_info.us_address.street = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::UsCity) => {
                self.address_info.us_address.city = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::UsState) => {
                self.address_info.us_address.state = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::UsZipCode) => {
                self.address_info.us_address.zip_code = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::ForeignStreet) => {
                self.address_info.foreign_address.street = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::ForeignCity) => {
                self.address_info.foreign_address.city = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::ForeignCountry) => {
                self.address_info.foreign_address.country = Some(expect_text(path, value)?);
            }
            FieldPath::Address(A::ForeignPostalCode) => {
                self.address_info.foreign_address.postal_code = Some(expect_text(path, value)?);
            }
            FieldPath::Payment(Pay::Method) => {
                self.payment_method.method = Some(expect_choice(
                    path,
                    value,
                    PaymentMethod::parse,
                    "check, card, direct_deposit",
                )?);
            }
            FieldPath::Payment(Pay::BankName) => {
                self.payment_method.bank_info.bank_name = Some(expect_text(path, value)?);
            }
            FieldPath::Payment(Pay::AccountHolder) => {
                self.payment_method.bank_info.account_holder = Some(expect_text(path, value)?);
            }
            FieldPath::Payment(Pay::AccountType) => {
                self.payment_method.bank_info.account_type = Some(expect_choice(
                    path,
                    value,
                    AccountType::parse,
                    "checking, savings",
                )?);
            }
            FieldPath::Payment(Pay::AccountNumber) => {
                self.payment_method.bank_info.account_number = Some(expect_text(path, value)?);
            }
            FieldPath::Payment(Pay::RoutingNumber) => {
                self.payment_method.bank_info.routing_number = Some(expect_text(path, value)?);
            }
            FieldPath::Payment(Pay::AccountNumberConfirm) => {
                self.payment_method.bank_info.account_number_confirm =
                    Some(expect_text(path, value)?);
            }
            FieldPath::EFilePin => {
                self.e_file_pin = Some(expect_text(path, value)?);
            }
            FieldPath::Immigration(I::IsUsCitizen) => {
                self.immigration_history.is_us_citizen = Some(expect_flag(path, value)?);
            }
            FieldPath::Immigration(I::FirstEntryVisa) => {
                self.immigration_history.first_entry_visa = Some(expect_text(path, value)?);
            }
            FieldPath::Immigration(I::FirstEntryDate) => {
                self.immigration_history.first_entry_date = Some(expect_text(path, value)?);
            }
            FieldPath::Immigration(I::TravelHistory) => {
                self.immigration_history.travel_history = Some(expect_text(path, value)?);
            }
        }
        Ok(())
    }

    /// Apply a partial update in its recorded order.
    pub fn apply_patch(&mut self, patch: &DraftPatch) -> Result<(), DraftError> {
        for (path, value) in patch {
            self.apply(*path, value.clone())?;
        }
        Ok(())
    }
}
