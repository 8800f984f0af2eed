//! Full trigger recovery and periodic cleanup.
//!
//! The alert backend can be reset underneath us (a device restart wipes
//! every pending OS alert) while the persisted map still references the
//! vanished trigger ids. The coordinator repairs that in one pass: wipe
//! everything, then re-derive triggers from the reminder list. It must run
//! before any per-id schedule or cancel call.
//!
//! Between repairs, a cleanup sweep keeps the invariant that completed or
//! past-dated reminders hold no triggers. The sweep is started explicitly
//! and stopped through the handle it returns; there is no hidden shared
//! state behind it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::scheduler::NotificationScheduler;
use crate::types::ReminderEntity;

/// External reminder store, read-only from this crate's point of view.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    async fn reminders(&self) -> Vec<ReminderEntity>;
}

pub struct RescheduleCoordinator {
    scheduler: Arc<NotificationScheduler>,
}

impl RescheduleCoordinator {
    pub fn new(scheduler: Arc<NotificationScheduler>) -> Self {
        Self { scheduler }
    }

    /// Cancel every backend trigger (best-effort), reset the persisted map,
    /// then schedule every active, future-dated reminder from scratch.
    pub async fn reschedule_all(&self, entities: &[ReminderEntity]) {
        log::info!("Rebuilding triggers for {} reminder(s)", entities.len());
        self.scheduler.reset_all().await;

        let now = Utc::now();
        let mut scheduled = 0usize;
        for entity in entities {
            if entity.is_completed || entity.point_in_time <= now {
                continue;
            }
            self.scheduler.schedule_for_reminder(entity).await;
            scheduled += 1;
        }
        log::info!("Reschedule pass complete, {} reminder(s) scheduled", scheduled);
    }

    /// Start a periodic cleanup sweep.
    ///
    /// Every `every`, reminders that are completed or no longer in the
    /// future get their remaining triggers cancelled, one id at a time
    /// through the scheduler's per-id critical sections. The sweep runs
    /// until [`SweepHandle::stop`] is called on the returned handle.
    pub fn start_cleanup_sweep(
        &self,
        source: Arc<dyn ReminderSource>,
        every: Duration,
    ) -> SweepHandle {
        let scheduler = self.scheduler.clone();
        let (shutdown, mut rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(every) => {}
                    _ = rx.changed() => return,
                }

                let now = Utc::now();
                for reminder in source.reminders().await {
                    if !(reminder.is_completed || reminder.point_in_time <= now) {
                        continue;
                    }
                    if scheduler.scheduled_trigger_ids(&reminder.id).await.is_empty() {
                        continue;
                    }
                    log::info!("Cleanup sweep cancelling triggers for {}", reminder.id);
                    scheduler.cancel_for_reminder(&reminder.id).await;
                }
            }
        });

        SweepHandle { shutdown, task }
    }
}

/// Token for a running cleanup sweep, returned by
/// [`RescheduleCoordinator::start_cleanup_sweep`] and consumed by `stop`.
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the sweep and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
