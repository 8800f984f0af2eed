//! Natural-language reminder interpretation.
//!
//! Turns an already-transcribed utterance ("remind me to buy milk tomorrow
//! at 9 am") into a [`ReminderDraft`]. The pipeline runs over shrinking
//! text: each stage may consume a span, and whatever survives becomes the
//! title. Interpretation is pure and never fails with an error; the only
//! failure mode is `None` when no usable title remains.

use chrono::{DateTime, Utc};

use crate::datetime::parse_date_time;
use crate::types::{RecurrenceRule, ReminderCategory, ReminderDraft, ReminderPriority};

/// Leading trigger phrases. The first one that matches as a whole-word
/// prefix is stripped; at most one removal happens.
const TRIGGER_PHRASES: &[&str] = &[
    "remind me to",
    "remind me about",
    "remind me",
    "set a reminder for",
    "set a reminder to",
    "set a reminder",
    "set reminder for",
    "set reminder to",
    "set reminder",
    "add a reminder to",
    "add a reminder",
];

/// Fixed three-tier priority table. Matching picks the longest keyword
/// present so "not urgent" never reads as high-tier "urgent".
const PRIORITY_KEYWORDS: &[(&str, ReminderPriority)] = &[
    ("high priority", ReminderPriority::High),
    ("urgent", ReminderPriority::High),
    ("important", ReminderPriority::High),
    ("critical", ReminderPriority::High),
    ("medium priority", ReminderPriority::Medium),
    ("normal", ReminderPriority::Medium),
    ("low priority", ReminderPriority::Low),
    ("not urgent", ReminderPriority::Low),
];

/// Category cue words, probed in table order. Matched text is left in the
/// title on purpose: a cue like "buy" is also meaningful title text.
const CATEGORY_KEYWORDS: &[(ReminderCategory, &[&str])] = &[
    (
        ReminderCategory::Work,
        &["meeting", "work", "office", "project", "deadline", "presentation", "email", "boss", "interview"],
    ),
    (
        ReminderCategory::Health,
        &["doctor", "dentist", "medicine", "medication", "pill", "gym", "workout", "exercise", "appointment"],
    ),
    (
        ReminderCategory::Finance,
        &["pay", "bill", "bank", "rent", "invoice", "tax", "insurance", "money"],
    ),
    (
        ReminderCategory::Shopping,
        &["buy", "shop", "purchase", "grocery", "groceries", "store", "order"],
    ),
    (
        ReminderCategory::Personal,
        &["birthday", "anniversary", "mom", "dad", "family", "friend", "dinner", "home"],
    ),
];

/// Recurrence phrases; the matched span is removed like a priority keyword.
const RECURRENCE_KEYWORDS: &[(&str, RecurrenceRule)] = &[
    ("every day", RecurrenceRule::Daily),
    ("daily", RecurrenceRule::Daily),
    ("every week", RecurrenceRule::Weekly),
    ("weekly", RecurrenceRule::Weekly),
    ("every month", RecurrenceRule::Monthly),
    ("monthly", RecurrenceRule::Monthly),
];

/// Connector words dropped from the title after extraction.
const TITLE_STOPWORDS: &[&str] = &["at", "on", "in", "to", "for", "the", "a", "an", "about", "my", "me"];

const MAX_TITLE_LEN: usize = 100;
const MIN_TITLE_CHARS: usize = 2;
const MIN_VALID_CONFIDENCE: f64 = 0.5;

/// Confidence contributions, capped at 1.0 in aggregate.
const TITLE_CONFIDENCE: f64 = 0.5;
const DATETIME_WEIGHT: f64 = 0.3;
const NO_DATETIME_CONFIDENCE: f64 = 0.2;
const CATEGORY_CONFIDENCE: f64 = 0.1;
const PRIORITY_CONFIDENCE: f64 = 0.1;

/// Interpret a transcribed utterance against the current wall clock.
pub fn parse_reminder_from_speech(text: &str) -> Option<ReminderDraft> {
    parse_reminder_from_speech_at(text, Utc::now())
}

/// Reference-instant variant of [`parse_reminder_from_speech`]; ambiguous
/// phrases resolve relative to `reference`.
pub fn parse_reminder_from_speech_at(raw: &str, reference: DateTime<Utc>) -> Option<ReminderDraft> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let text = strip_trigger_phrase(&normalized).to_string();
    let (priority, text) = extract_priority(&text);
    let category = detect_category(&text);
    let (recurrence, text) = extract_recurrence(&text);

    let (candidate, text) = match parse_date_time(&text, reference) {
        Some(candidate) => {
            let remaining = text.replacen(&candidate.matched_span, "", 1);
            (Some(candidate), remaining)
        }
        None => (None, text),
    };

    let title = derive_title(&text);
    if title.is_empty() {
        log::debug!("no usable title in utterance, dropping draft");
        return None;
    }

    let mut confidence = TITLE_CONFIDENCE;
    confidence += match &candidate {
        Some(c) => c.confidence * DATETIME_WEIGHT,
        None => NO_DATETIME_CONFIDENCE,
    };
    if category.is_some() {
        confidence += CATEGORY_CONFIDENCE;
    }
    if priority.is_some() {
        confidence += PRIORITY_CONFIDENCE;
    }

    Some(ReminderDraft {
        title,
        point_in_time: candidate.as_ref().map(|c| c.point_in_time),
        category,
        priority,
        recurrence,
        confidence: confidence.min(1.0),
        raw_text: raw.to_string(),
    })
}

/// Acceptance predicate for a parsed draft, against the current wall clock.
pub fn is_valid_parsed_reminder(draft: &ReminderDraft) -> bool {
    is_valid_parsed_reminder_at(draft, Utc::now())
}

/// Reference-instant variant of [`is_valid_parsed_reminder`]. A draft is
/// acceptable when the title has at least two characters, aggregate
/// confidence reaches 0.5, and any datetime is strictly in the future.
pub fn is_valid_parsed_reminder_at(draft: &ReminderDraft, now: DateTime<Utc>) -> bool {
    if draft.title.chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    if draft.confidence < MIN_VALID_CONFIDENCE {
        return false;
    }
    match draft.point_in_time {
        Some(point) => point > now,
        None => true,
    }
}

fn strip_trigger_phrase(text: &str) -> &str {
    for phrase in TRIGGER_PHRASES {
        if let Some(rest) = text.strip_prefix(phrase) {
            if rest.is_empty() || rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    text
}

fn extract_priority(text: &str) -> (Option<ReminderPriority>, String) {
    let mut best: Option<(&'static str, ReminderPriority)> = None;
    for &(keyword, priority) in PRIORITY_KEYWORDS {
        if text.contains(keyword) {
            let longer = best.map_or(true, |(k, _)| keyword.len() > k.len());
            if longer {
                best = Some((keyword, priority));
            }
        }
    }

    match best {
        Some((keyword, priority)) => (Some(priority), text.replacen(keyword, "", 1)),
        None => (None, text.to_string()),
    }
}

fn detect_category(text: &str) -> Option<ReminderCategory> {
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return Some(*category);
        }
    }
    None
}

fn extract_recurrence(text: &str) -> (Option<RecurrenceRule>, String) {
    for (keyword, rule) in RECURRENCE_KEYWORDS {
        if text.contains(keyword) {
            return (Some(*rule), text.replacen(keyword, "", 1));
        }
    }
    (None, text.to_string())
}

/// Drop stoplist connectors, collapse whitespace, capitalize, truncate.
fn derive_title(text: &str) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|word| !TITLE_STOPWORDS.contains(word))
        .collect();

    capitalize_first(kept.join(" ").trim())
        .chars()
        .take(MAX_TITLE_LEN)
        .collect()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_buy_milk_full_pipeline() {
        let draft =
            parse_reminder_from_speech_at("remind me to buy milk tomorrow at 9 am", reference())
                .unwrap();

        assert_eq!(draft.title, "Buy milk");
        assert_eq!(
            draft.point_in_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap())
        );
        assert_eq!(draft.category, Some(ReminderCategory::Shopping));
        assert!(draft.confidence >= 0.5);
        assert!(is_valid_parsed_reminder_at(&draft, reference()));
    }

    #[test]
    fn test_bare_trigger_phrase_is_rejected() {
        let draft = parse_reminder_from_speech_at("set reminder", reference());
        match draft {
            None => {}
            Some(d) => assert!(!is_valid_parsed_reminder_at(&d, reference())),
        }

        assert!(parse_reminder_from_speech_at("remind me", reference()).is_none());
        assert!(parse_reminder_from_speech_at("", reference()).is_none());
        assert!(parse_reminder_from_speech_at("   ", reference()).is_none());
    }

    #[test]
    fn test_trigger_phrase_stripped_once_only() {
        // The second occurrence is title text, not a trigger phrase.
        let draft =
            parse_reminder_from_speech_at("remind me to remind me gently", reference()).unwrap();
        assert!(draft.title.to_lowercase().contains("remind"));
    }

    #[test]
    fn test_priority_tiers() {
        let high =
            parse_reminder_from_speech_at("urgent call landlord tomorrow", reference()).unwrap();
        assert_eq!(high.priority, Some(ReminderPriority::High));
        assert!(!high.title.to_lowercase().contains("urgent"));

        let medium =
            parse_reminder_from_speech_at("medium priority water plants", reference()).unwrap();
        assert_eq!(medium.priority, Some(ReminderPriority::Medium));

        let low = parse_reminder_from_speech_at("water plants not urgent", reference()).unwrap();
        assert_eq!(low.priority, Some(ReminderPriority::Low));
        assert!(!low.title.to_lowercase().contains("urgent"));
    }

    #[test]
    fn test_category_keyword_stays_in_title() {
        let draft = parse_reminder_from_speech_at("pay rent on friday", reference()).unwrap();
        assert_eq!(draft.category, Some(ReminderCategory::Finance));
        assert_eq!(draft.title, "Pay rent");
    }

    #[test]
    fn test_no_datetime_gets_flat_contribution() {
        let draft = parse_reminder_from_speech_at("remind me to buy milk", reference()).unwrap();
        assert!(draft.point_in_time.is_none());
        // title 0.5 + no-datetime 0.2 + shopping 0.1
        assert!((draft.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_aggregation_with_datetime() {
        let draft =
            parse_reminder_from_speech_at("remind me to buy milk tomorrow at 9 am", reference())
                .unwrap();
        // title 0.5 + 0.95 * 0.3 + shopping 0.1
        assert!((draft.confidence - 0.885).abs() < 1e-9);
    }

    #[test]
    fn test_recurrence_phrase_extracted_and_removed() {
        let draft =
            parse_reminder_from_speech_at("remind me to take pills every day at 8 am", reference())
                .unwrap();

        assert_eq!(draft.recurrence, Some(RecurrenceRule::Daily));
        assert_eq!(draft.category, Some(ReminderCategory::Health));
        assert_eq!(draft.title, "Take pills");
        // 8 am is already past a 10:00 reference, so it rolls to tomorrow.
        assert_eq!(
            draft.point_in_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_raw_text_preserved_verbatim() {
        let raw = "Remind me to Buy Milk";
        let draft = parse_reminder_from_speech_at(raw, reference()).unwrap();
        assert_eq!(draft.raw_text, raw);
    }

    #[test]
    fn test_title_truncated_to_hundred_chars() {
        let long_task = "organize ".repeat(30);
        let draft = parse_reminder_from_speech_at(&long_task, reference()).unwrap();
        assert!(draft.title.chars().count() <= 100);
    }

    #[test]
    fn test_validation_rejects_short_title() {
        let mut draft = parse_reminder_from_speech_at("remind me to buy milk", reference()).unwrap();
        draft.title = "x".to_string();
        assert!(!is_valid_parsed_reminder_at(&draft, reference()));
    }

    #[test]
    fn test_validation_rejects_low_confidence() {
        let mut draft = parse_reminder_from_speech_at("remind me to buy milk", reference()).unwrap();
        draft.confidence = 0.4;
        assert!(!is_valid_parsed_reminder_at(&draft, reference()));
    }

    #[test]
    fn test_validation_rejects_past_datetime() {
        let mut draft =
            parse_reminder_from_speech_at("remind me to buy milk tomorrow at 9 am", reference())
                .unwrap();
        draft.point_in_time = Some(Utc.with_ymd_and_hms(2023, 12, 31, 9, 0, 0).unwrap());
        assert!(!is_valid_parsed_reminder_at(&draft, reference()));
    }

    #[test]
    fn test_parsing_is_pure() {
        let first = parse_reminder_from_speech_at("buy milk tomorrow at 9 am", reference());
        let second = parse_reminder_from_speech_at("buy milk tomorrow at 9 am", reference());
        assert_eq!(
            first.as_ref().map(|d| (&d.title, d.point_in_time, d.confidence)),
            second.as_ref().map(|d| (&d.title, d.point_in_time, d.confidence))
        );
    }
}
