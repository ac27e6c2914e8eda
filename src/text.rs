//! Chat-text normalisation and similarity helpers used by the report engine.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// Normalises a chat message for comparison: lower-cases, trims, and
/// collapses runs of whitespace to a single space.
#[must_use]
pub fn normalize(message: &str) -> String {
    message
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-based Jaccard similarity between two strings.
///
/// Tokenises on whitespace and computes |intersection| / |union| over the
/// word sets. Both empty ⇒ `1.0`; exactly one empty ⇒ `0.0`.
#[must_use]
pub fn jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    intersection as f64 / union as f64
}

/// Deduplicates timestamps at full precision and returns them in
/// chronologically ascending order.
#[must_use]
pub fn unique_sorted_times(times: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let mut unique: Vec<DateTime<Utc>> = times.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
}

/// Deduplicates strings preserving first-seen order.
#[must_use]
pub fn unique_strings(items: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        if seen.insert(item.as_str()) {
            result.push(item.clone());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn normalize_lowercases_and_collapses() {
        assert_eq!(normalize("  Hello   WORLD  "), "hello world");
        assert_eq!(normalize("GG"), "gg");
        assert_eq!(normalize("gg  "), "gg");
        assert_eq!(normalize("a\t b\n  c"), "a b c");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn jaccard_identical_is_one() {
        assert!((jaccard("buy now link", "buy now link") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_same_words_reordered_is_one() {
        assert!((jaccard("buy now link", "link buy now") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_is_symmetric() {
        let ab = jaccard("one two three", "two three four");
        let ba = jaccard("two three four", "one two three");
        assert!((ab - ba).abs() < f64::EPSILON);
        assert!((ab - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_empty_cases() {
        assert!((jaccard("", "") - 1.0).abs() < f64::EPSILON);
        assert!((jaccard("", "word") - 0.0).abs() < f64::EPSILON);
        assert!((jaccard("word", "") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_disjoint_is_zero() {
        assert!((jaccard("aaa bbb", "ccc ddd") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unique_sorted_times_dedups_and_sorts() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 2).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 4).unwrap();

        let out = unique_sorted_times(&[t2, t0, t1, t0, t2]);
        assert_eq!(out, vec![t0, t1, t2]);
    }

    #[test]
    fn unique_sorted_times_is_idempotent() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 2).unwrap();

        let once = unique_sorted_times(&[t1, t0, t1]);
        let twice = unique_sorted_times(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn unique_strings_preserves_first_seen_order() {
        let items = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        assert_eq!(unique_strings(&items), vec!["b", "a", "c"]);
    }
}
