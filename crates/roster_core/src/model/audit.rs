//! Audit metadata and the explicit save hook that stamps it.
//!
//! # Invariants
//! - A create stamp only touches `created_*`; an update stamp only touches
//!   `modified_*`.
//! - Timestamps are Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Creation/modification time and actor tracked on audited entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: Option<i64>,
    pub created_by: Option<String>,
    pub modified_at: Option<i64>,
    pub modified_by: Option<String>,
}

/// Time source for audit stamps.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Pre-save hook stamping audit fields with the current time and actor.
///
/// Repositories call [`Auditor::stamp`] exactly once per save, after
/// validation has passed.
#[derive(Clone)]
pub struct Auditor {
    clock: Arc<dyn Clock>,
    actor: Option<String>,
}

impl Auditor {
    pub fn new(clock: Arc<dyn Clock>, actor: Option<String>) -> Self {
        Self { clock, actor }
    }

    /// System clock, no actor.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), None)
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn on_create(&self, fields: &mut AuditFields) {
        fields.created_at = Some(self.clock.now_millis());
        fields.created_by = self.actor.clone();
    }

    pub fn on_update(&self, fields: &mut AuditFields) {
        fields.modified_at = Some(self.clock.now_millis());
        fields.modified_by = self.actor.clone();
    }

    /// Applies the create or update stamp depending on `is_new`.
    pub fn stamp(&self, fields: &mut AuditFields, is_new: bool) {
        if is_new {
            self.on_create(fields);
        } else {
            self.on_update(fields);
        }
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditFields, Auditor, ManualClock};
    use std::sync::Arc;

    #[test]
    fn create_stamp_leaves_modified_fields_empty() {
        let clock = Arc::new(ManualClock::new(1_000));
        let auditor = Auditor::new(clock, Some("admin".to_string()));
        let mut fields = AuditFields::default();

        auditor.stamp(&mut fields, true);

        assert_eq!(fields.created_at, Some(1_000));
        assert_eq!(fields.created_by.as_deref(), Some("admin"));
        assert_eq!(fields.modified_at, None);
        assert_eq!(fields.modified_by, None);
    }

    #[test]
    fn update_stamp_keeps_created_fields() {
        let clock = Arc::new(ManualClock::new(1_000));
        let auditor = Auditor::new(clock.clone(), None);
        let mut fields = AuditFields::default();
        auditor.stamp(&mut fields, true);

        clock.advance(250);
        let auditor = auditor.with_actor("editor");
        auditor.stamp(&mut fields, false);

        assert_eq!(fields.created_at, Some(1_000));
        assert_eq!(fields.created_by, None);
        assert_eq!(fields.modified_at, Some(1_250));
        assert_eq!(fields.modified_by.as_deref(), Some("editor"));
    }
}
