//! Alert backend abstraction.
//!
//! The OS notification service is modeled as an injected [`TriggerBackend`]
//! so the scheduler can be exercised against an in-memory double. Real
//! backends return opaque trigger identifiers; this crate never inspects
//! them, only stores and replays them for cancellation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::TriggerError;
use crate::types::ReminderEntity;

/// One scheduled point-in-time alert registration.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub title: String,
    pub body: String,
    pub fire_instant: DateTime<Utc>,
}

/// External alert backend.
#[async_trait]
pub trait TriggerBackend: Send + Sync {
    /// Register one trigger; returns the backend's opaque identifier.
    async fn schedule(&self, spec: &TriggerSpec) -> Result<String, TriggerError>;

    /// Cancel a single trigger. Cancelling an unknown id is an error the
    /// caller is expected to swallow.
    async fn cancel(&self, trigger_id: &str) -> Result<(), TriggerError>;

    /// Drop every pending trigger the backend knows about.
    async fn cancel_all(&self) -> Result<(), TriggerError>;
}

/// Render one occurrence of a reminder as a trigger spec.
///
/// The body comes from the reminder description when present, with a fixed
/// prompt line as fallback.
pub fn trigger_spec_for(entity: &ReminderEntity, fire_instant: DateTime<Utc>) -> TriggerSpec {
    let body = entity
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| "Tap to open your reminder.".to_string());

    TriggerSpec {
        title: entity.title.clone(),
        body,
        fire_instant,
    }
}

/// In-memory backend for tests and development shells. Mints uuid trigger
/// ids and keeps pending specs queryable.
#[derive(Default)]
pub struct InMemoryTriggerBackend {
    pending: Mutex<HashMap<String, TriggerSpec>>,
}

impl InMemoryTriggerBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.lock().keys().cloned().collect()
    }

    pub fn pending_spec(&self, trigger_id: &str) -> Option<TriggerSpec> {
        self.pending.lock().get(trigger_id).cloned()
    }

    /// Simulate an external reset of the alert subsystem (device restart):
    /// pending triggers vanish without any cancel call.
    pub fn wipe(&self) {
        self.pending.lock().clear();
    }
}

#[async_trait]
impl TriggerBackend for InMemoryTriggerBackend {
    async fn schedule(&self, spec: &TriggerSpec) -> Result<String, TriggerError> {
        let trigger_id = Uuid::new_v4().to_string();
        self.pending.lock().insert(trigger_id.clone(), spec.clone());
        Ok(trigger_id)
    }

    async fn cancel(&self, trigger_id: &str) -> Result<(), TriggerError> {
        match self.pending.lock().remove(trigger_id) {
            Some(_) => Ok(()),
            None => Err(TriggerError::UnknownTrigger(trigger_id.to_string())),
        }
    }

    async fn cancel_all(&self) -> Result<(), TriggerError> {
        self.pending.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity(description: Option<&str>) -> ReminderEntity {
        ReminderEntity {
            id: "r1".to_string(),
            title: "Buy milk".to_string(),
            description: description.map(str::to_string),
            point_in_time: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            is_completed: false,
            recurrence_rule: Default::default(),
        }
    }

    #[test]
    fn test_trigger_spec_uses_description_as_body() {
        let fire = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let spec = trigger_spec_for(&entity(Some("2 liters, whole")), fire);
        assert_eq!(spec.title, "Buy milk");
        assert_eq!(spec.body, "2 liters, whole");
        assert_eq!(spec.fire_instant, fire);
    }

    #[test]
    fn test_trigger_spec_body_fallback() {
        let fire = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(
            trigger_spec_for(&entity(None), fire).body,
            "Tap to open your reminder."
        );
        assert_eq!(
            trigger_spec_for(&entity(Some("   ")), fire).body,
            "Tap to open your reminder."
        );
    }

    #[tokio::test]
    async fn test_in_memory_backend_round_trip() {
        let backend = InMemoryTriggerBackend::new();
        let fire = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        let id = backend
            .schedule(&trigger_spec_for(&entity(None), fire))
            .await
            .unwrap();
        assert_eq!(backend.pending_count(), 1);

        backend.cancel(&id).await.unwrap();
        assert_eq!(backend.pending_count(), 0);

        assert!(backend.cancel(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_backend_cancel_all() {
        let backend = InMemoryTriggerBackend::new();
        let fire = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        for _ in 0..3 {
            backend
                .schedule(&trigger_spec_for(&entity(None), fire))
                .await
                .unwrap();
        }
        assert_eq!(backend.pending_count(), 3);

        backend.cancel_all().await.unwrap();
        assert_eq!(backend.pending_count(), 0);
    }
}
