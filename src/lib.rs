//! Natural-language reminder interpretation and trigger scheduling.
//!
//! Takes an already-transcribed utterance ("remind me to buy milk tomorrow
//! at 9 am"), turns it into a structured reminder draft with a confidence
//! score, and keeps OS-level scheduled alerts consistent with the reminder
//! list — including recovery after the alert subsystem is externally reset.
//!
//! Modules:
//! - datetime: ranked pattern cascade for date/time extraction
//! - parser: utterance → reminder draft (title, category, priority)
//! - notification: alert backend abstraction
//! - store: persisted trigger-map storage
//! - scheduler: per-reminder trigger lifecycle
//! - reschedule: full recovery pass at process start
//!
//! Rendering, authentication, reminder storage, and speech-to-text are
//! external collaborators; this crate consumes text and `ReminderEntity`
//! values and drives an injected trigger backend.

pub mod datetime;
pub mod error;
pub mod notification;
pub mod parser;
pub mod reschedule;
pub mod scheduler;
pub mod store;
pub mod types;

pub use datetime::parse_date_time;
pub use error::{StoreError, TriggerError};
pub use notification::{trigger_spec_for, InMemoryTriggerBackend, TriggerBackend, TriggerSpec};
pub use parser::{
    is_valid_parsed_reminder, is_valid_parsed_reminder_at, parse_reminder_from_speech,
    parse_reminder_from_speech_at,
};
pub use reschedule::{ReminderSource, RescheduleCoordinator, SweepHandle};
pub use scheduler::NotificationScheduler;
pub use store::{InMemoryTriggerStore, JsonFileTriggerStore, TriggerStore};
pub use types::{
    RecurrenceRule, ReminderCategory, ReminderDraft, ReminderEntity, ReminderPriority,
    TimeCandidate, TriggerMap,
};
