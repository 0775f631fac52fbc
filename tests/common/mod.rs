//! Shared test support: an in-memory persistence gateway with failure
//! injection, artificial latency, and concurrency accounting.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use taxwizard::{
    AddressType, Draft, DraftPatch, LoadError, PaymentMethod, PersistenceGateway,
    ReferenceNumber, SaveError, SessionKey, SubmitError,
};

#[derive(Default)]
pub struct MemoryGateway {
    drafts: Mutex<HashMap<String, Draft>>,
    submissions: Mutex<Vec<(String, ReferenceNumber, Draft)>>,
    save_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    save_delay_ms: AtomicU64,
    fail_loads: AtomicUsize,
    fail_saves: AtomicUsize,
    fail_submits: AtomicUsize,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

static TRACING: Once = Once::new();

/// Capture engine logs in test output (run with RUST_LOG to widen).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "taxwizard=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

impl MemoryGateway {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn seed(&self, key: &SessionKey, draft: Draft) {
        self.drafts.lock().insert(key.as_str().to_string(), draft);
    }

    pub fn stored(&self, key: &SessionKey) -> Option<Draft> {
        self.drafts.lock().get(key.as_str()).cloned()
    }

    pub fn saves(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_saves(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(String, ReferenceNumber, Draft)> {
        self.submissions.lock().clone()
    }

    pub fn set_save_delay(&self, delay: Duration) {
        self.save_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_next_loads(&self, count: usize) {
        self.fail_loads.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_saves(&self, count: usize) {
        self.fail_saves.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_submits(&self, count: usize) {
        self.fail_submits.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn load(&self, key: &SessionKey) -> Result<Option<Draft>, LoadError> {
        if take_one(&self.fail_loads) {
            return Err(LoadError::Backend("injected load failure".to_string()));
        }
        Ok(self.drafts.lock().get(key.as_str()).cloned())
    }

    async fn save(&self, key: &SessionKey, patch: &DraftPatch) -> Result<(), SaveError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = if take_one(&self.fail_saves) {
            Err(SaveError::Backend("injected save failure".to_string()))
        } else {
            let mut drafts = self.drafts.lock();
            let draft = drafts.entry(key.as_str().to_string()).or_default();
            match draft.apply_patch(patch) {
                Ok(()) => {
                    draft.metadata.updated_at = Some(Utc::now());
                    self.save_count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                Err(e) => Err(SaveError::Backend(e.to_string())),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn submit(
        &self,
        key: &SessionKey,
        draft: &Draft,
    ) -> Result<ReferenceNumber, SubmitError> {
        if take_one(&self.fail_submits) {
            return Err(SubmitError::Backend("injected submit failure".to_string()));
        }
        let raw = key.as_str();
        let suffix = &raw[raw.len().saturating_sub(6)..];
        let reference = ReferenceNumber(format!(
            "TQ-{}-{}",
            Utc::now().timestamp_millis(),
            suffix
        ));
        self.submissions
            .lock()
            .push((raw.to_string(), reference.clone(), draft.clone()));
        Ok(reference)
    }
}

/// A draft that satisfies every applicable rule: single filer, U.S.
/// address, refund by check, citizen.
pub fn complete_draft() -> Draft {
    let mut draft = Draft::default();
    draft.personal_info.first_name = Some("Wei".to_string());
    draft.personal_info.last_name = Some("Zhang".to_string());
    draft.personal_info.email = Some("wei.zhang@example.com".to_string());
    draft.personal_info.phone_number = Some("5551234567".to_string());
    draft.spouse_info.has_spouse = Some(false);
    draft.dependent_info.has_dependents = Some(false);
    draft.address_info.address_type = Some(AddressType::Us);
    draft.address_info.us_address.street = Some("1 Main St".to_string());
    draft.address_info.us_address.city = Some("Seattle".to_string());
    draft.address_info.us_address.state = Some("WA".to_string());
    draft.address_info.us_address.zip_code = Some("98101".to_string());
    draft.payment_method.method = Some(PaymentMethod::Check);
    draft.e_file_pin = Some("12345".to_string());
    draft.immigration_history.is_us_citizen = Some(true);
    draft
}
