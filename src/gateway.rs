//! Persistence Gateway Contract
//!
//! The engine consumes, and never implements, a durable key-value store for
//! drafts. `save` has upsert-merge semantics and must be idempotent under
//! retry; `submit` creates an immutable submission record distinct from the
//! mutable draft and must not mutate the draft on failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draft::{Draft, DraftPatch};

/// Identifies one user's questionnaire session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// A fresh random session key.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt for a finalized submission (e.g. "TQ-1735689600000-a1b2c3").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceNumber(pub String);

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load questionnaire draft: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SaveError {
    #[error("failed to save questionnaire draft: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error("failed to submit questionnaire: {0}")]
    Backend(String),

    #[error("questionnaire was already submitted")]
    AlreadySubmitted,
}

/// Durable store for one draft per session key.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch the stored draft, if any.
    async fn load(&self, key: &SessionKey) -> Result<Option<Draft>, LoadError>;

    /// Merge a partial update into the stored draft. Applying the same
    /// patch twice must yield the same stored state.
    async fn save(&self, key: &SessionKey, patch: &DraftPatch) -> Result<(), SaveError>;

    /// Finalize the draft into an immutable submission record.
    async fn submit(&self, key: &SessionKey, draft: &Draft) -> Result<ReferenceNumber, SubmitError>;
}
