//! Review events applied to a single item
//!
//! Review events always derive status from the review count; segment
//! completion uses the percent-based derivation in `progress`.

use chrono::NaiveDate;

use super::algorithm::{format_elapsed, next_review_date, status_from_review_count};
use super::models::{ReviewItem, Understanding};
use super::schema::format_date;
use crate::frontmatter::Record;

/// Mark repeat `repeat_index` as done.
///
/// Idempotent: repeating an index only refreshes the dates and status.
/// Returns whether the index was new.
pub fn check_repeat(item: &mut ReviewItem, repeat_index: u32, today: NaiveDate) -> bool {
    let added = item.repeats.insert(repeat_index);
    item.review_count = u32::try_from(item.repeats.len()).unwrap_or(u32::MAX);
    mark_reviewed(item, today);
    added
}

/// Record one timed practice session.
///
/// Not idempotent: every call counts as another review.
pub fn record_timed_review(item: &mut ReviewItem, elapsed_secs: u64, today: NaiveDate) {
    item.review_count = item.review_count.saturating_add(1);
    item.total_time_secs = item.total_time_secs.saturating_add(elapsed_secs);
    item.avg_time_secs = item.total_time_secs / u64::from(item.review_count);
    mark_reviewed(item, today);
    item.review_history
        .push(Record::new(format_date(today), format_elapsed(elapsed_secs)));
}

/// Append a dated feedback note
pub fn add_feedback(item: &mut ReviewItem, content: &str, today: NaiveDate) {
    item.feedback_history
        .push(Record::new(format_date(today), content.trim()));
}

pub fn set_understanding(item: &mut ReviewItem, understanding: Understanding) {
    item.understanding = understanding;
    reschedule(item);
}

pub fn set_difficulty(item: &mut ReviewItem, difficulty: i64) {
    item.difficulty = difficulty;
    reschedule(item);
}

fn mark_reviewed(item: &mut ReviewItem, today: NaiveDate) {
    item.last_review = Some(today);
    reschedule(item);
    item.status = Some(status_from_review_count(item.review_count));
}

/// Recompute the next date from the last review, if there was one
fn reschedule(item: &mut ReviewItem) {
    if let Some(last) = item.last_review {
        item.next_review = Some(next_review_date(
            last,
            item.review_count,
            item.difficulty,
            item.understanding,
        ));
    }
}
