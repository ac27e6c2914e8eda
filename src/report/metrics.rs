//! Per-message report counters.
//!
//! [`ReportMetrics`] accumulates the independent message-level metrics while
//! a bounded worker pool drains the event list. Sequence-dependent signals
//! (bursts) are computed afterwards in [`super::bursts`].

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::normalize;

static EMOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[emote:\d+:\w+\]").expect("emote pattern"));

static EMOTE_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*\[emote:\d+:\w+\]\s*)+$").expect("emote-only pattern"));

/// Aggregated message-level counters for one report run.
#[derive(Debug, Default)]
pub struct ReportMetrics {
    /// Distinct sender handles seen.
    pub unique_chatters: HashSet<String>,
    pub messages_with_emotes: i64,
    pub messages_multi_emote_only: i64,
    pub messages_from_apps: i64,
    /// Occurrences per normalised body, for duplicate counting.
    pub occurrences: HashMap<String, i64>,
}

impl ReportMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one message into the counters.
    pub fn observe(&mut self, sender_handle: &str, body: &str, app_senders: &HashSet<String>) {
        self.unique_chatters.insert(sender_handle.to_string());

        if EMOTE_RE.is_match(body) {
            self.messages_with_emotes += 1;
            if EMOTE_ONLY_RE.is_match(body.trim()) {
                self.messages_multi_emote_only += 1;
            }
        }

        if app_senders.contains(sender_handle) {
            self.messages_from_apps += 1;
        }

        *self.occurrences.entry(normalize(body)).or_insert(0) += 1;
    }

    /// Total surplus duplicates: Σ over normalised bodies seen at least
    /// twice of (occurrences − 1).
    #[must_use]
    pub fn duplicate_count(&self) -> i64 {
        self.occurrences
            .values()
            .filter(|&&count| count > 1)
            .map(|count| count - 1)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps() -> HashSet<String> {
        ["botrix", "@fossabot", "fossabot", "kicbot"]
            .into_iter()
            .map(ToOwned::to_owned)
            .collect()
    }

    #[test]
    fn counts_unique_chatters_by_handle() {
        let mut m = ReportMetrics::new();
        m.observe("alice", "hi", &apps());
        m.observe("bob", "hi", &apps());
        m.observe("alice", "hello again", &apps());
        assert_eq!(m.unique_chatters.len(), 2);
    }

    #[test]
    fn emote_messages_are_counted() {
        let mut m = ReportMetrics::new();
        m.observe("alice", "nice one [emote:37226:KEKW]", &apps());
        m.observe("alice", "plain text", &apps());
        assert_eq!(m.messages_with_emotes, 1);
        assert_eq!(m.messages_multi_emote_only, 0);
    }

    #[test]
    fn emote_only_messages_are_counted_separately() {
        let mut m = ReportMetrics::new();
        m.observe("alice", "  [emote:37226:KEKW] [emote:37227:LUL]  ", &apps());
        m.observe("alice", "[emote:37226:KEKW] gg", &apps());
        assert_eq!(m.messages_with_emotes, 2);
        assert_eq!(m.messages_multi_emote_only, 1);
    }

    #[test]
    fn app_sender_matching_is_case_sensitive() {
        let mut m = ReportMetrics::new();
        m.observe("botrix", "!points", &apps());
        m.observe("Botrix", "!points", &apps());
        m.observe("@fossabot", "hello", &apps());
        assert_eq!(m.messages_from_apps, 2);
    }

    #[test]
    fn duplicate_count_sums_surplus_occurrences() {
        let mut m = ReportMetrics::new();
        m.observe("alice", "GG", &apps());
        m.observe("alice", "gg  ", &apps());
        m.observe("alice", "GG", &apps());
        m.observe("bob", "unique message", &apps());
        // "gg" seen 3× ⇒ 2 surplus
        assert_eq!(m.duplicate_count(), 2);
    }
}
