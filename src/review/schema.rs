//! Typed mapping between `ReviewItem` and frontmatter keys
//!
//! Decoding is lenient: missing or mistyped keys fall back to defaults.
//! Encoding only rewrites keys whose decoded value changed, so unknown
//! keys and untouched fields keep their original text.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::models::{ItemStatus, ReviewItem, Understanding};
use crate::frontmatter::{Frontmatter, Record, Scalar, Value};

pub mod keys {
    pub const REVIEW_COUNT: &str = "reviewCount";
    pub const REPEATS: &str = "repeats";
    pub const DIFFICULTY: &str = "difficulty";
    pub const UNDERSTANDING: &str = "understanding";
    pub const LAST_REVIEW: &str = "lastReview";
    /// Older notes carry the review date under `date`
    pub const LAST_REVIEW_FALLBACK: &str = "date";
    pub const NEXT_REVIEW: &str = "nextReview";
    pub const STATUS: &str = "status";
    pub const TOTAL_TIME: &str = "totalTime";
    pub const AVG_TIME: &str = "avgTime";
    pub const FEEDBACK_HISTORY: &str = "feedbackHistory";
    pub const REVIEW_HISTORY: &str = "reviewHistory";
    pub const COMPLETED_SEGMENTS: &str = "completedSegments";
    pub const TOTAL_SEGMENTS: &str = "totalSegments";
    pub const SERIES: &str = "series";
    pub const COMPLETION_THRESHOLD: &str = "completionThreshold";
    pub const AUTO_COMPLETE_ENABLED: &str = "autoCompleteEnabled";
    pub const STUDY_START_TIME: &str = "studyStartTime";
    pub const STUDY_END_TIME: &str = "studyEndTime";
}

/// Date format used for every persisted date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for study start/end stamps
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl ReviewItem {
    pub fn from_frontmatter(fm: &Frontmatter) -> Self {
        let defaults = ReviewItem::default();
        Self {
            review_count: read_u32(fm, keys::REVIEW_COUNT).unwrap_or(0),
            repeats: read_repeats(fm),
            difficulty: fm.get(keys::DIFFICULTY).and_then(Value::as_i64).unwrap_or(0),
            understanding: fm
                .get(keys::UNDERSTANDING)
                .and_then(Value::as_str)
                .map(Understanding::parse_lenient)
                .unwrap_or_default(),
            last_review: read_date(fm, keys::LAST_REVIEW)
                .or_else(|| read_date(fm, keys::LAST_REVIEW_FALLBACK)),
            next_review: read_date(fm, keys::NEXT_REVIEW),
            status: fm
                .get(keys::STATUS)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            total_time_secs: read_u64(fm, keys::TOTAL_TIME).unwrap_or(0),
            avg_time_secs: read_u64(fm, keys::AVG_TIME).unwrap_or(0),
            feedback_history: read_records(fm, keys::FEEDBACK_HISTORY),
            review_history: read_records(fm, keys::REVIEW_HISTORY),
            completed_segments: read_u32(fm, keys::COMPLETED_SEGMENTS).unwrap_or(0),
            total_segments: read_u32(fm, keys::TOTAL_SEGMENTS).unwrap_or(0),
            series: read_string(fm, keys::SERIES),
            completion_threshold: read_u32(fm, keys::COMPLETION_THRESHOLD),
            auto_complete_enabled: fm
                .get(keys::AUTO_COMPLETE_ENABLED)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.auto_complete_enabled),
            study_start_time: read_string(fm, keys::STUDY_START_TIME),
            study_end_time: read_string(fm, keys::STUDY_END_TIME),
        }
    }

    /// Write every field that differs from what `fm` currently decodes to
    pub fn write_to(&self, fm: &mut Frontmatter) {
        let before = ReviewItem::from_frontmatter(fm);

        if self.review_count != before.review_count {
            fm.insert(keys::REVIEW_COUNT, self.review_count);
        }
        if self.repeats != before.repeats {
            let list: Vec<Scalar> = self
                .repeats
                .iter()
                .map(|&n| Scalar::Integer(i64::from(n)))
                .collect();
            fm.insert(keys::REPEATS, list);
        }
        if self.difficulty != before.difficulty {
            fm.insert(keys::DIFFICULTY, self.difficulty);
        }
        if self.understanding != before.understanding {
            fm.insert(keys::UNDERSTANDING, self.understanding.as_str());
        }
        if self.last_review != before.last_review {
            set_optional(fm, keys::LAST_REVIEW, self.last_review.map(format_date));
        }
        if self.next_review != before.next_review {
            set_optional(fm, keys::NEXT_REVIEW, self.next_review.map(format_date));
        }
        if self.status != before.status {
            set_optional(fm, keys::STATUS, self.status.map(|s| s.as_str().to_string()));
        }
        if self.total_time_secs != before.total_time_secs {
            fm.insert(keys::TOTAL_TIME, self.total_time_secs);
        }
        if self.avg_time_secs != before.avg_time_secs {
            fm.insert(keys::AVG_TIME, self.avg_time_secs);
        }
        if self.feedback_history != before.feedback_history {
            fm.insert(keys::FEEDBACK_HISTORY, self.feedback_history.clone());
        }
        if self.review_history != before.review_history {
            fm.insert(keys::REVIEW_HISTORY, self.review_history.clone());
        }
        if self.completed_segments != before.completed_segments {
            fm.insert(keys::COMPLETED_SEGMENTS, self.completed_segments);
        }
        if self.total_segments != before.total_segments {
            fm.insert(keys::TOTAL_SEGMENTS, self.total_segments);
        }
        if self.series != before.series {
            set_optional(fm, keys::SERIES, self.series.clone());
        }
        if self.completion_threshold != before.completion_threshold {
            match self.completion_threshold {
                Some(t) => {
                    fm.insert(keys::COMPLETION_THRESHOLD, t);
                }
                None => {
                    fm.remove(keys::COMPLETION_THRESHOLD);
                }
            }
        }
        if self.auto_complete_enabled != before.auto_complete_enabled {
            fm.insert(keys::AUTO_COMPLETE_ENABLED, self.auto_complete_enabled);
        }
        if self.study_start_time != before.study_start_time {
            set_optional(fm, keys::STUDY_START_TIME, self.study_start_time.clone());
        }
        if self.study_end_time != before.study_end_time {
            set_optional(fm, keys::STUDY_END_TIME, self.study_end_time.clone());
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    // Accept full timestamps by looking at the date part only
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

fn set_optional(fm: &mut Frontmatter, key: &str, value: Option<String>) {
    match value {
        Some(v) => {
            fm.insert(key, v);
        }
        None => {
            fm.remove(key);
        }
    }
}

fn read_u32(fm: &Frontmatter, key: &str) -> Option<u32> {
    fm.get(key)
        .and_then(Value::as_i64)
        .and_then(|n| u32::try_from(n).ok())
}

fn read_u64(fm: &Frontmatter, key: &str) -> Option<u64> {
    fm.get(key)
        .and_then(Value::as_i64)
        .and_then(|n| u64::try_from(n).ok())
}

fn read_string(fm: &Frontmatter, key: &str) -> Option<String> {
    match fm.get(key)? {
        Value::Scalar(Scalar::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Value::Scalar(Scalar::Integer(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn read_date(fm: &Frontmatter, key: &str) -> Option<NaiveDate> {
    fm.get(key).and_then(Value::as_str).and_then(parse_date)
}

fn read_repeats(fm: &Frontmatter) -> BTreeSet<u32> {
    fm.get(keys::REPEATS)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Scalar::as_i64)
                .filter_map(|n| u32::try_from(n).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn read_records(fm: &Frontmatter, key: &str) -> Vec<Record> {
    fm.get(key)
        .and_then(Value::as_records)
        .map(<[Record]>::to_vec)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::{parse, serialize};

    #[test]
    fn test_decode_note() {
        let text = "---\nreviewCount: 2\nrepeats: [1, 2]\ndifficulty: 4\nunderstanding: ok\nlastReview: 2024-01-01\nnextReview: 2024-01-05\nstatus: reviewing\ntotalTime: 130\navgTime: 65\nseries: Calculus\n---\n";
        let item = ReviewItem::from_frontmatter(&parse(text).unwrap());

        assert_eq!(item.review_count, 2);
        assert_eq!(item.repeats, BTreeSet::from([1, 2]));
        assert_eq!(item.difficulty, 4);
        assert_eq!(item.understanding, Understanding::Ok);
        assert_eq!(item.last_review, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(item.next_review, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(item.status, Some(ItemStatus::Reviewing));
        assert_eq!(item.total_time_secs, 130);
        assert_eq!(item.series.as_deref(), Some("Calculus"));
        assert!(item.auto_complete_enabled);
    }

    #[test]
    fn test_date_fallback_key() {
        let fm = parse("---\ndate: 2024-02-03T10:00:00\n---\n").unwrap();
        let item = ReviewItem::from_frontmatter(&fm);
        assert_eq!(item.last_review, NaiveDate::from_ymd_opt(2024, 2, 3));
    }

    #[test]
    fn test_write_only_touches_changed_keys() {
        let text = "---\ntitle: Limits\nstatus: Custom State\nreviewCount: 1\n---\n";
        let mut fm = parse(text).unwrap();
        let mut item = ReviewItem::from_frontmatter(&fm);
        assert_eq!(item.status, None);

        item.review_count = 2;
        item.write_to(&mut fm);

        assert_eq!(
            serialize(&fm),
            "---\ntitle: Limits\nstatus: Custom State\nreviewCount: 2\n---\n"
        );
    }

    #[test]
    fn test_write_then_read_back() {
        let mut item = ReviewItem::new();
        item.review_count = 3;
        item.repeats = BTreeSet::from([1, 2, 3]);
        item.understanding = Understanding::Perfect;
        item.last_review = NaiveDate::from_ymd_opt(2024, 1, 1);
        item.status = Some(ItemStatus::Reviewing);
        item.feedback_history = vec![Record::new("2024-01-01", "solid")];
        item.completion_threshold = Some(90);
        item.auto_complete_enabled = false;
        item.study_start_time = Some("2024-01-01 09:30".to_string());

        let mut fm = Frontmatter::new();
        item.write_to(&mut fm);
        let reparsed = parse(&serialize(&fm)).unwrap();

        assert_eq!(ReviewItem::from_frontmatter(&reparsed), item);
    }
}
