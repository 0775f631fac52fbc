//! Bilingual Text Selection Contract
//!
//! The wizard engine never embeds language-specific strings; it carries
//! [`MessageKey`]s and a [`LanguageMode`] selector propagated from the host.
//! The host supplies the actual catalog through [`TextCatalog`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which language(s) the host wants rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMode {
    /// English only.
    Primary,
    /// Chinese only.
    Secondary,
    /// Both, rendered as "zh / en".
    #[default]
    Combined,
}

/// A single piece of text in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub en: String,
    pub zh: String,
}

impl BilingualText {
    pub fn new(en: impl Into<String>, zh: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            zh: zh.into(),
        }
    }

    /// Render for the given mode. Combined mode shows Chinese first.
    pub fn display(&self, mode: LanguageMode) -> String {
        match mode {
            LanguageMode::Primary => self.en.clone(),
            LanguageMode::Secondary => self.zh.clone(),
            LanguageMode::Combined => format!("{} / {}", self.zh, self.en),
        }
    }
}

/// Stable identifier for a catalog entry (validation message, step title).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey(pub &'static str);

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for MessageKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Known message keys used by the rule catalog and step registry.
pub mod keys {
    use super::MessageKey;

    pub const REQUIRED_FIELD: MessageKey = MessageKey("validation.required_field");
    pub const INVALID_EMAIL: MessageKey = MessageKey("validation.invalid_email");
    pub const INVALID_PHONE: MessageKey = MessageKey("validation.invalid_phone");
    pub const INVALID_DATE: MessageKey = MessageKey("validation.invalid_date");
    pub const INVALID_PIN: MessageKey = MessageKey("validation.invalid_pin");
    pub const ACCOUNT_MISMATCH: MessageKey = MessageKey("validation.account_mismatch");

    pub const STEP_PERSONAL: MessageKey = MessageKey("step.personal");
    pub const STEP_SPOUSE: MessageKey = MessageKey("step.spouse");
    pub const STEP_DEPENDENTS: MessageKey = MessageKey("step.dependents");
    pub const STEP_ADDRESS: MessageKey = MessageKey("step.address");
    pub const STEP_PAYMENT: MessageKey = MessageKey("step.payment");
    pub const STEP_BANKING: MessageKey = MessageKey("step.banking");
    pub const STEP_EFILE_PIN: MessageKey = MessageKey("step.efile_pin");
    pub const STEP_IMMIGRATION: MessageKey = MessageKey("step.immigration");
    pub const STEP_REVIEW: MessageKey = MessageKey("step.review");
}

/// Host-supplied string catalog.
///
/// `resolve` falls back to the raw key so a missing entry degrades to
/// something debuggable instead of panicking.
pub trait TextCatalog {
    fn lookup(&self, key: MessageKey) -> Option<&BilingualText>;

    fn resolve(&self, key: MessageKey, mode: LanguageMode) -> String {
        self.lookup(key)
            .map(|text| text.display(mode))
            .unwrap_or_else(|| key.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_modes() {
        let text = BilingualText::new("Next", "下一步");
        assert_eq!(text.display(LanguageMode::Primary), "Next");
        assert_eq!(text.display(LanguageMode::Secondary), "下一步");
        assert_eq!(text.display(LanguageMode::Combined), "下一步 / Next");
    }

    #[test]
    fn test_default_mode_is_combined() {
        assert_eq!(LanguageMode::default(), LanguageMode::Combined);
    }

    #[test]
    fn test_resolve_falls_back_to_key() {
        struct Empty;
        impl TextCatalog for Empty {
            fn lookup(&self, _key: MessageKey) -> Option<&BilingualText> {
                None
            }
        }
        assert_eq!(
            Empty.resolve(keys::REQUIRED_FIELD, LanguageMode::Combined),
            "validation.required_field"
        );
    }
}
