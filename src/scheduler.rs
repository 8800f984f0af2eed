//! Trigger lifecycle synchronization for reminders.
//!
//! Keeps OS-level scheduled triggers consistent with the reminder list:
//! cancel-then-register per reminder id, full replacement of that id's slot
//! in the persisted map, graceful degradation when the backend or the store
//! misbehaves. At most one active trigger set exists per reminder id.

use std::sync::Arc;

use chrono::{DateTime, Duration, Months, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::notification::{trigger_spec_for, TriggerBackend};
use crate::store::TriggerStore;
use crate::types::{RecurrenceRule, ReminderEntity, TriggerMap};

/// Recurrence occurrences registered beyond the base trigger.
const MAX_RECURRENCE_OCCURRENCES: u32 = 5;

pub struct NotificationScheduler {
    backend: Arc<dyn TriggerBackend>,
    store: Arc<dyn TriggerStore>,
    /// Per-reminder-id critical sections. Operations on the same id must
    /// not interleave; distinct ids are independent.
    id_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Serializes read-modify-write updates of the single persisted map.
    map_lock: Mutex<()>,
}

impl NotificationScheduler {
    pub fn new(backend: Arc<dyn TriggerBackend>, store: Arc<dyn TriggerStore>) -> Self {
        Self {
            backend,
            store,
            id_locks: DashMap::new(),
            map_lock: Mutex::new(()),
        }
    }

    /// Synchronize backend triggers with one reminder.
    ///
    /// Existing triggers for the id are cancelled first. A completed or
    /// past-dated reminder ends up with zero triggers and no persisted
    /// entry; that is a normal outcome, not an error. Individual
    /// registration failures are skipped and whatever succeeded is
    /// persisted.
    pub async fn schedule_for_reminder(&self, entity: &ReminderEntity) {
        let lock = self.id_lock(&entity.id);
        let _guard = lock.lock().await;

        self.cancel_backend_triggers(&entity.id).await;

        let now = Utc::now();
        if entity.is_completed || entity.point_in_time <= now {
            log::debug!(
                "reminder {} needs no triggers (completed or not in the future)",
                entity.id
            );
            self.replace_entry(&entity.id, Vec::new()).await;
            return;
        }

        let mut trigger_ids = Vec::new();
        for fire_instant in occurrences(entity) {
            if fire_instant <= now {
                continue;
            }
            let spec = trigger_spec_for(entity, fire_instant);
            match self.backend.schedule(&spec).await {
                Ok(trigger_id) => trigger_ids.push(trigger_id),
                Err(e) => {
                    log::warn!(
                        "Failed to register trigger for {} at {}: {}",
                        entity.id,
                        fire_instant,
                        e
                    );
                }
            }
        }

        log::info!(
            "Scheduled {} trigger(s) for reminder {}",
            trigger_ids.len(),
            entity.id
        );
        self.replace_entry(&entity.id, trigger_ids).await;
    }

    /// Cancel every trigger registered for `id` and forget the mapping.
    /// Per-trigger backend failures are swallowed; the entry is removed
    /// regardless of individual outcomes.
    pub async fn cancel_for_reminder(&self, id: &str) {
        let lock = self.id_lock(id);
        let _guard = lock.lock().await;

        self.cancel_backend_triggers(id).await;
        self.replace_entry(id, Vec::new()).await;
    }

    /// Read-only probe: trigger ids currently persisted for `id`.
    pub async fn scheduled_trigger_ids(&self, id: &str) -> Vec<String> {
        self.load_map().await.get(id).cloned().unwrap_or_default()
    }

    /// Wipe every backend trigger and the persisted map. Recovery primitive
    /// for the reschedule coordinator; not part of the per-id contract.
    pub(crate) async fn reset_all(&self) {
        if let Err(e) = self.backend.cancel_all().await {
            log::warn!("cancel_all failed during reset: {}", e);
        }

        let _guard = self.map_lock.lock().await;
        if let Err(e) = self.store.set(&TriggerMap::new()).await {
            log::warn!("Failed to clear trigger map: {}", e);
        }
    }

    fn id_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.id_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn cancel_backend_triggers(&self, id: &str) {
        let map = self.load_map().await;
        let Some(trigger_ids) = map.get(id) else {
            return;
        };
        for trigger_id in trigger_ids {
            if let Err(e) = self.backend.cancel(trigger_id).await {
                log::warn!("Failed to cancel trigger {} for {}: {}", trigger_id, id, e);
            }
        }
    }

    async fn load_map(&self) -> TriggerMap {
        match self.store.get().await {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Trigger map read failed, treating as empty: {}", e);
                TriggerMap::new()
            }
        }
    }

    /// Full replacement of one id's slot. An empty set removes the key
    /// rather than storing an empty list. Applied only after the backend
    /// calls completed, so the map reflects exactly what succeeded.
    async fn replace_entry(&self, id: &str, trigger_ids: Vec<String>) {
        let _guard = self.map_lock.lock().await;
        let mut map = self.load_map().await;
        if trigger_ids.is_empty() {
            map.remove(id);
        } else {
            map.insert(id.to_string(), trigger_ids);
        }
        if let Err(e) = self.store.set(&map).await {
            log::warn!("Trigger map write failed, dropping update for {}: {}", id, e);
        }
    }
}

/// Base occurrence plus up to five recurrence occurrences, k × one period
/// ahead of the base instant.
fn occurrences(entity: &ReminderEntity) -> Vec<DateTime<Utc>> {
    let mut out = vec![entity.point_in_time];
    for k in 1..=MAX_RECURRENCE_OCCURRENCES {
        let next = match entity.recurrence_rule {
            RecurrenceRule::None => break,
            RecurrenceRule::Daily => entity
                .point_in_time
                .checked_add_signed(Duration::days(i64::from(k))),
            RecurrenceRule::Weekly => entity
                .point_in_time
                .checked_add_signed(Duration::days(7 * i64::from(k))),
            RecurrenceRule::Monthly => entity.point_in_time.checked_add_months(Months::new(k)),
        };
        match next {
            Some(instant) => out.push(instant),
            None => break,
        }
    }
    out
}
