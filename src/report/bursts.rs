//! Burst-based spam detection over a livestream's chat events.
//!
//! Three windowed passes run per sender, each scanning the sender's messages
//! in send order: starting from an anchor, every later message inside the
//! window that satisfies the pass predicate is collected; when the collected
//! count meets the threshold a record is emitted and the scan resumes past
//! the burst (non-overlapping semantics).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ReportOptions;
use crate::persistence::models::ChatEvent;
use crate::text::{jaccard, normalize, unique_sorted_times, unique_strings};

/// Issue tag for senders caught by the rapid-fire pass.
pub const ISSUE_RAPID_BURSTS: &str = "rapid_message_bursts";
/// Issue tag for senders whose handle matches the suspicious pattern.
pub const ISSUE_SUSPICIOUS_USERNAME: &str = "suspicious_username";

static SUSPICIOUS_HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(bot|spam|ad|free\s*vbucks|nude\s*link|crypto|follow|sub|cash|giveaway|win|join|discord|telegram|link|onlyfans|of|\d{5,}$)",
    )
    .expect("suspicious-handle pattern")
});

/// A run of identical (after normalisation) messages from one sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactDuplicateBurst {
    pub username: String,
    pub content: String,
    pub count: i64,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// A run of near-identical messages from one sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMessageBurst {
    pub username: String,
    /// The distinct message texts of the burst joined with `" / "`.
    pub pattern: String,
    pub count: i64,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// A sender that accumulated one or more issue tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousChatter {
    pub user_id: i64,
    pub username: String,
    pub potential_issues: Vec<String>,
    pub message_timestamps: Vec<DateTime<Utc>>,
    pub example_messages: Vec<String>,
}

/// Everything the burst passes produced for one livestream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpamFindings {
    pub exact_duplicate_bursts: Vec<ExactDuplicateBurst>,
    pub similar_message_bursts: Vec<SimilarMessageBurst>,
    pub suspicious_chatters: Vec<SuspiciousChatter>,
}

/// Runs all burst passes and the suspicious-username scan over the events.
///
/// Burst lists come back sorted by count descending.
#[must_use]
pub fn detect(events: &[ChatEvent], opts: &ReportOptions) -> SpamFindings {
    let mut by_sender: BTreeMap<i64, Vec<&ChatEvent>> = BTreeMap::new();
    for event in events {
        by_sender.entry(event.sender_id).or_default().push(event);
    }
    for messages in by_sender.values_mut() {
        messages.sort_by_key(|m| m.sent_at);
    }

    let mut findings = SpamFindings::default();
    let mut roster_index: HashMap<i64, usize> = HashMap::new();

    for messages in by_sender.values() {
        scan_exact_duplicates(messages, opts, &mut findings.exact_duplicate_bursts);
        scan_similar_messages(messages, opts, &mut findings.similar_message_bursts);
        scan_rapid_fire(
            messages,
            opts,
            &mut findings.suspicious_chatters,
            &mut roster_index,
        );
    }

    for (&sender_id, messages) in &by_sender {
        let Some(first) = messages.first() else {
            continue;
        };
        if SUSPICIOUS_HANDLE_RE.is_match(&first.sender_handle) {
            note_suspicious(
                &mut findings.suspicious_chatters,
                &mut roster_index,
                sender_id,
                &first.sender_handle,
                ISSUE_SUSPICIOUS_USERNAME,
                &[],
                &[],
            );
        }
    }

    findings
        .exact_duplicate_bursts
        .sort_by(|a, b| b.count.cmp(&a.count));
    findings
        .similar_message_bursts
        .sort_by(|a, b| b.count.cmp(&a.count));

    findings
}

fn scan_exact_duplicates(
    messages: &[&ChatEvent],
    opts: &ReportOptions,
    out: &mut Vec<ExactDuplicateBurst>,
) {
    let mut i = 0;
    while i < messages.len() {
        let anchor = messages[i];
        let anchor_norm = normalize(&anchor.body);
        let mut count = 1usize;
        let mut timestamps = vec![anchor.sent_at];

        let mut j = i + 1;
        while j < messages.len() && messages[j].sent_at - anchor.sent_at <= opts.exact_window {
            if normalize(&messages[j].body) == anchor_norm {
                count += 1;
                timestamps.push(messages[j].sent_at);
            }
            j += 1;
        }

        if count >= opts.exact_min_count {
            out.push(ExactDuplicateBurst {
                username: anchor.sender_handle.clone(),
                content: anchor.body.clone(),
                count: count as i64,
                timestamps: unique_sorted_times(&timestamps),
            });
            i += count;
        } else {
            i += 1;
        }
    }
}

fn scan_similar_messages(
    messages: &[&ChatEvent],
    opts: &ReportOptions,
    out: &mut Vec<SimilarMessageBurst>,
) {
    let mut i = 0;
    while i < messages.len() {
        let anchor = messages[i];
        let anchor_norm = normalize(&anchor.body);
        let mut count = 1usize;
        let mut texts = vec![anchor.body.clone()];
        let mut timestamps = vec![anchor.sent_at];

        let mut j = i + 1;
        while j < messages.len() && messages[j].sent_at - anchor.sent_at <= opts.similar_window {
            if jaccard(&anchor_norm, &normalize(&messages[j].body)) >= opts.similar_min_similarity
            {
                count += 1;
                texts.push(messages[j].body.clone());
                timestamps.push(messages[j].sent_at);
            }
            j += 1;
        }

        if count >= opts.similar_min_count {
            out.push(SimilarMessageBurst {
                username: anchor.sender_handle.clone(),
                pattern: unique_strings(&texts).join(" / "),
                count: count as i64,
                timestamps: unique_sorted_times(&timestamps),
            });
            i += count;
        } else {
            i += 1;
        }
    }
}

fn scan_rapid_fire(
    messages: &[&ChatEvent],
    opts: &ReportOptions,
    roster: &mut Vec<SuspiciousChatter>,
    roster_index: &mut HashMap<i64, usize>,
) {
    let mut i = 0;
    while i < messages.len() {
        let anchor = messages[i];
        let mut count = 1usize;
        let mut timestamps = vec![anchor.sent_at];
        let mut examples = vec![anchor.body.clone()];

        let mut j = i + 1;
        while j < messages.len() && messages[j].sent_at - anchor.sent_at <= opts.rapid_window {
            count += 1;
            timestamps.push(messages[j].sent_at);
            examples.push(messages[j].body.clone());
            j += 1;
        }

        if count >= opts.rapid_min_count {
            note_suspicious(
                roster,
                roster_index,
                anchor.sender_id,
                &anchor.sender_handle,
                ISSUE_RAPID_BURSTS,
                &timestamps,
                &examples,
            );
            i += count;
        } else {
            i += 1;
        }
    }
}

/// Adds an issue tag for a sender, merging with any existing roster entry:
/// tags are deduplicated, timestamps and examples extended with
/// deduplication.
fn note_suspicious(
    roster: &mut Vec<SuspiciousChatter>,
    roster_index: &mut HashMap<i64, usize>,
    user_id: i64,
    username: &str,
    issue: &str,
    timestamps: &[DateTime<Utc>],
    examples: &[String],
) {
    if let Some(&pos) = roster_index.get(&user_id) {
        let entry = &mut roster[pos];
        if !entry.potential_issues.iter().any(|tag| tag == issue) {
            entry.potential_issues.push(issue.to_string());
        }
        if !timestamps.is_empty() {
            let mut merged = entry.message_timestamps.clone();
            merged.extend_from_slice(timestamps);
            entry.message_timestamps = unique_sorted_times(&merged);
        }
        if !examples.is_empty() {
            let mut merged = entry.example_messages.clone();
            merged.extend_from_slice(examples);
            entry.example_messages = unique_strings(&merged);
        }
    } else {
        roster_index.insert(user_id, roster.len());
        roster.push(SuspiciousChatter {
            user_id,
            username: username.to_string(),
            potential_issues: vec![issue.to_string()],
            message_timestamps: unique_sorted_times(timestamps),
            example_messages: unique_strings(examples),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use uuid::Uuid;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(offset_secs)
    }

    fn tms(offset_millis: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + TimeDelta::milliseconds(offset_millis)
    }

    fn event(sender_id: i64, handle: &str, body: &str, sent_at: DateTime<Utc>) -> ChatEvent {
        ChatEvent {
            id: Uuid::new_v4(),
            chatroom_id: 75033,
            livestream_id: Some(9),
            sender_id,
            sender_handle: handle.to_string(),
            event_tag: "App\\Events\\ChatMessageEvent".to_string(),
            body: body.to_string(),
            metadata: serde_json::Value::Null,
            sent_at,
            stored_at: sent_at,
        }
    }

    #[test]
    fn exact_duplicate_burst_normalises_and_records_anchor_content() {
        let events = vec![
            event(101, "alice", "GG", t(0)),
            event(101, "alice", "gg  ", t(2)),
            event(101, "alice", "GG", t(4)),
        ];
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.exact_duplicate_bursts.len(), 1);
        let burst = &findings.exact_duplicate_bursts[0];
        assert_eq!(burst.username, "alice");
        assert_eq!(burst.content, "GG");
        assert_eq!(burst.count, 3);
        assert_eq!(burst.timestamps, vec![t(0), t(2), t(4)]);
    }

    #[test]
    fn below_threshold_emits_no_exact_burst() {
        let events = vec![
            event(101, "alice", "GG", t(0)),
            event(101, "alice", "GG", t(2)),
        ];
        let findings = detect(&events, &ReportOptions::default());
        assert!(findings.exact_duplicate_bursts.is_empty());
    }

    #[test]
    fn duplicates_outside_window_do_not_join_the_burst() {
        let events = vec![
            event(101, "alice", "GG", t(0)),
            event(101, "alice", "GG", t(2)),
            event(101, "alice", "GG", t(20)),
        ];
        let findings = detect(&events, &ReportOptions::default());
        assert!(findings.exact_duplicate_bursts.is_empty());
    }

    #[test]
    fn greedy_skip_yields_non_overlapping_bursts() {
        let events = vec![
            event(101, "alice", "GG", t(0)),
            event(101, "alice", "GG", t(1)),
            event(101, "alice", "GG", t(2)),
            event(101, "alice", "GG", t(10)),
            event(101, "alice", "GG", t(11)),
            event(101, "alice", "GG", t(12)),
        ];
        let findings = detect(&events, &ReportOptions::default());
        assert_eq!(findings.exact_duplicate_bursts.len(), 2);
        assert!(findings.exact_duplicate_bursts.iter().all(|b| b.count == 3));
    }

    #[test]
    fn similar_burst_joins_distinct_texts_into_pattern() {
        let events = vec![
            event(102, "caleb", "buy now here", t(0)),
            event(102, "caleb", "buy here now", t(2)),
            event(102, "caleb", "now buy here", t(4)),
            event(102, "caleb", "here buy now", t(6)),
        ];
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.similar_message_bursts.len(), 1);
        let burst = &findings.similar_message_bursts[0];
        assert_eq!(burst.count, 4);
        assert_eq!(
            burst.pattern,
            "buy now here / buy here now / now buy here / here buy now"
        );
        assert_eq!(burst.timestamps, vec![t(0), t(2), t(4), t(6)]);
    }

    #[test]
    fn rapid_fire_marks_sender_suspicious() {
        let events = vec![
            event(103, "eve", "m1", tms(0)),
            event(103, "eve", "m2", tms(500)),
            event(103, "eve", "m3", tms(1_200)),
            event(103, "eve", "m4", tms(2_100)),
            event(103, "eve", "m5", tms(3_000)),
        ];
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.suspicious_chatters.len(), 1);
        let chatter = &findings.suspicious_chatters[0];
        assert_eq!(chatter.user_id, 103);
        assert_eq!(chatter.potential_issues, vec![ISSUE_RAPID_BURSTS]);
        assert_eq!(
            chatter.message_timestamps,
            vec![tms(0), tms(500), tms(1_200), tms(2_100), tms(3_000)]
        );
        assert_eq!(chatter.example_messages, vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn suspicious_username_alone_gets_tag_without_timestamps() {
        let events = vec![event(104, "crypto_giveaway_12345", "hello", t(0))];
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.suspicious_chatters.len(), 1);
        let chatter = &findings.suspicious_chatters[0];
        assert_eq!(chatter.potential_issues, vec![ISSUE_SUSPICIOUS_USERNAME]);
        assert!(chatter.message_timestamps.is_empty());
        assert!(chatter.example_messages.is_empty());
    }

    #[test]
    fn rapid_fire_and_username_tags_merge_into_one_entry() {
        let events = vec![
            event(105, "spam_spree", "x1", tms(0)),
            event(105, "spam_spree", "x2", tms(600)),
            event(105, "spam_spree", "x3", tms(1_300)),
            event(105, "spam_spree", "x4", tms(2_000)),
            event(105, "spam_spree", "x5", tms(2_800)),
        ];
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.suspicious_chatters.len(), 1);
        let chatter = &findings.suspicious_chatters[0];
        assert_eq!(
            chatter.potential_issues,
            vec![ISSUE_RAPID_BURSTS, ISSUE_SUSPICIOUS_USERNAME]
        );
        assert_eq!(chatter.message_timestamps.len(), 5);
        assert_eq!(chatter.example_messages.len(), 5);
    }

    #[test]
    fn plain_handles_are_not_flagged() {
        let events = vec![event(106, "alice", "hello", t(0))];
        let findings = detect(&events, &ReportOptions::default());
        assert!(findings.suspicious_chatters.is_empty());
    }

    #[test]
    fn burst_lists_sort_by_count_descending() {
        let mut events = Vec::new();
        for k in 0..3 {
            events.push(event(107, "alice", "GG", t(k)));
        }
        for k in 0..4 {
            events.push(event(108, "dave", "no way", t(k)));
        }
        let findings = detect(&events, &ReportOptions::default());

        assert_eq!(findings.exact_duplicate_bursts.len(), 2);
        assert_eq!(findings.exact_duplicate_bursts[0].count, 4);
        assert_eq!(findings.exact_duplicate_bursts[0].username, "dave");
        assert_eq!(findings.exact_duplicate_bursts[1].count, 3);
    }
}
