//! Review interval ladder
//!
//! The base interval grows along a fixed ladder indexed by review count,
//! then shrinks for hard material and self-reported weak understanding:
//!
//! | reviews | 0 | 1 | 2 | 3  | 4  | 5  | 6+  |
//! |---------|---|---|---|----|----|----|-----|
//! | days    | 1 | 3 | 7 | 14 | 30 | 60 | 120 |
//!
//! Every function here is total: out-of-range inputs are clamped or treated
//! as neutral, and intervals never drop below one day.

use chrono::{Duration, NaiveDate};

use super::models::{ItemStatus, Understanding};

/// Interval ladder in days
pub const REVIEW_LADDER: [i64; 7] = [1, 3, 7, 14, 30, 60, 120];

/// Shortest interval any modulation can produce
const MIN_INTERVAL_DAYS: i64 = 1;

/// Review count at which an item is mastered
const MASTERED_AT: u32 = 5;

/// Review count at which an item moves to regular review
const REVIEWING_AT: u32 = 2;

/// Points below the threshold at which a "nearly done" warning is shown
pub const NEAR_THRESHOLD_MARGIN: u32 = 10;

/// Ladder interval for a review count
pub fn base_interval(review_count: u32) -> i64 {
    let idx = (review_count as usize).min(REVIEW_LADDER.len() - 1);
    REVIEW_LADDER[idx]
}

/// Difficulty multiplier in percent
fn difficulty_factor(difficulty: i64) -> i64 {
    match difficulty {
        4 | 5 => 70,
        3 => 85,
        _ => 100,
    }
}

/// Understanding multiplier in percent
fn understanding_factor(understanding: Understanding) -> i64 {
    match understanding {
        Understanding::Hard => 50,
        Understanding::Ok => 80,
        Understanding::Perfect => 120,
        Understanding::Good | Understanding::Unrated => 100,
    }
}

/// Apply a percentage multiplier, flooring and clamping to the minimum
fn scale(days: i64, percent: i64) -> i64 {
    (days * percent / 100).max(MIN_INTERVAL_DAYS)
}

/// Interval in days after modulation.
///
/// Difficulty is applied first; understanding scales the result of that.
pub fn review_interval(review_count: u32, difficulty: i64, understanding: Understanding) -> i64 {
    let base = base_interval(review_count);
    let after_difficulty = scale(base, difficulty_factor(difficulty));
    scale(after_difficulty, understanding_factor(understanding))
}

/// Calculate when an item is next due
pub fn next_review_date(
    last_review: NaiveDate,
    review_count: u32,
    difficulty: i64,
    understanding: Understanding,
) -> NaiveDate {
    let days = review_interval(review_count, difficulty, understanding);
    last_review
        .checked_add_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Status from the number of reviews done
pub fn status_from_review_count(review_count: u32) -> ItemStatus {
    if review_count >= MASTERED_AT {
        ItemStatus::Mastered
    } else if review_count >= REVIEWING_AT {
        ItemStatus::Reviewing
    } else {
        ItemStatus::Learning
    }
}

/// Status from segment completion against a threshold
pub fn status_from_completion_percent(percent: u32, completed: u32, threshold: u32) -> ItemStatus {
    if percent >= threshold {
        ItemStatus::Completed
    } else if completed > 0 {
        ItemStatus::InProgress
    } else {
        ItemStatus::NotStarted
    }
}

/// `completed / total` as a whole percentage, rounded half up
pub fn completion_percent(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((completed * 200 + total) / (total * 2)) as u32
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i64) -> String {
    if days <= 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

/// Format a duration in seconds as `"1m 5s"`
pub fn format_elapsed(secs: u64) -> String {
    let (minutes, seconds) = (secs / 60, secs % 60);
    if minutes >= 60 {
        format!("{}h {}m {}s", minutes / 60, minutes % 60, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}
