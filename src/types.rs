use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted mapping from reminder id to the ordered list of opaque trigger
/// identifiers currently registered with the alert backend for that reminder.
///
/// Absence of a key means "nothing currently scheduled" for that id. An empty
/// list is never stored; the key is removed instead.
pub type TriggerMap = HashMap<String, Vec<String>>;

/// Priority extracted from an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    High,
    Medium,
    Low,
}

/// Category inferred from an utterance by keyword lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderCategory {
    Work,
    Health,
    Finance,
    Shopping,
    Personal,
}

impl ReminderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderCategory::Work => "work",
            ReminderCategory::Health => "health",
            ReminderCategory::Finance => "finance",
            ReminderCategory::Shopping => "shopping",
            ReminderCategory::Personal => "personal",
        }
    }
}

/// Policy for generating future occurrences from a base time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceRule {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

/// One datetime interpretation of a span of text.
///
/// Produced per `parse_date_time` call and never persisted. `matched_span` is
/// the exact substring of the (normalized) input that the winning strategy
/// consumed; the interpreter removes it before deriving a title.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeCandidate {
    pub point_in_time: DateTime<Utc>,
    /// Heuristic certainty in [0, 1]. Fixed per-strategy policy constant.
    pub confidence: f64,
    pub matched_span: String,
}

/// A parsed-but-not-yet-stored reminder.
///
/// The external reminder store turns an accepted draft into a
/// [`ReminderEntity`]; drafts themselves are ephemeral.
#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub title: String,
    pub point_in_time: Option<DateTime<Utc>>,
    pub category: Option<ReminderCategory>,
    pub priority: Option<ReminderPriority>,
    pub recurrence: Option<RecurrenceRule>,
    /// Aggregate interpretation confidence in [0, 1].
    pub confidence: f64,
    /// The utterance as received, before normalization.
    pub raw_text: String,
}

/// Reminder row as supplied by the external reminder store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntity {
    /// Stable unique identifier owned by the external store.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub point_in_time: DateTime<Utc>,
    pub is_completed: bool,
    #[serde(default)]
    pub recurrence_rule: RecurrenceRule,
}
