use std::sync::Arc;

use serde::Serialize;

use super::markers::{MarkerScanner, SegmentCounts};
use crate::clock::Clock;
use crate::frontmatter::Document;
use crate::notifier::{Notification, NotificationKind};
use crate::review::algorithm::{
    completion_percent, status_from_completion_percent, NEAR_THRESHOLD_MARGIN,
};
use crate::review::schema::STAMP_FORMAT;
use crate::review::{ItemStatus, ReviewItem};
use crate::store::{DocumentStore, ItemId};
use crate::Result;

/// Result of one recompute cycle for a tracked item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub item: ItemId,
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
    pub threshold: u32,
    pub status: ItemStatus,
    pub previous_status: Option<ItemStatus>,
    pub auto_complete: bool,
    /// Whether `completedSegments` differs from the persisted value
    pub segments_changed: bool,
    /// Whether the note had to be rewritten
    pub persisted: bool,
    pub series: Option<String>,
    /// Message for this cycle; delivering it is up to the caller
    pub notification: Option<Notification>,
}

impl ProgressReport {
    /// Whether this cycle moved the item into or out of `Completed`
    pub fn completion_changed(&self) -> bool {
        let was = self.previous_status == Some(ItemStatus::Completed);
        let is = self.status == ItemStatus::Completed;
        was != is
    }

    /// Series to re-aggregate after this cycle, if any.
    ///
    /// A completed member re-aggregates on every cycle, not just on the
    /// transition, so a cycle that died after its write is caught up by
    /// the next one.
    pub fn series_to_update(&self) -> Option<&str> {
        if !self.auto_complete {
            return None;
        }
        let series = self.series.as_deref()?;
        (self.status == ItemStatus::Completed || self.completion_changed()).then_some(series)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    /// The note has no segment markers
    NotTracked,
    Updated(ProgressReport),
}

/// Recomputes an item's segment progress from its persisted note.
///
/// Each cycle starts from what is stored, never from in-memory deltas, so
/// an interrupted cycle is repaired by the next one.
pub struct ProgressTracker {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    scanner: MarkerScanner,
    default_threshold: u32,
}

impl ProgressTracker {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        scanner: MarkerScanner,
        default_threshold: u32,
    ) -> Self {
        Self {
            store,
            clock,
            scanner,
            default_threshold,
        }
    }

    /// Threshold in force for an item
    pub fn threshold_for(&self, item: &ReviewItem) -> u32 {
        item.completion_threshold
            .unwrap_or(self.default_threshold)
            .clamp(1, 100)
    }

    pub async fn recompute(&self, id: &ItemId) -> Result<ProgressOutcome> {
        let text = self.store.read(id).await?;
        let mut doc = Document::parse(&text)?;

        let SegmentCounts { total, completed } = self.scanner.scan(&doc.body);
        if total == 0 {
            log::debug!("{} has no {} markers, not tracked", id, self.scanner.marker());
            return Ok(ProgressOutcome::NotTracked);
        }

        let mut item = ReviewItem::from_frontmatter(&doc.frontmatter);
        let previous_completed = item.completed_segments;
        let previous_status = item.status;
        let auto_complete = item.auto_complete_enabled;

        let threshold = self.threshold_for(&item);
        let percent = completion_percent(completed, total);
        let status = status_from_completion_percent(percent, completed, threshold);

        let now = self.clock.now();
        if completed > 0 && item.study_start_time.is_none() {
            item.study_start_time = Some(now.format(STAMP_FORMAT).to_string());
        }
        if auto_complete && status == ItemStatus::Completed && item.study_end_time.is_none() {
            item.study_end_time = Some(now.format(STAMP_FORMAT).to_string());
            log::info!("{} auto-completed at {}% (threshold {}%)", id, percent, threshold);
        }

        item.completed_segments = completed;
        item.total_segments = total;
        item.status = Some(status);
        item.write_to(&mut doc.frontmatter);

        let rendered = doc.render();
        let persisted = rendered != text;
        if persisted {
            self.store.write(id, &rendered).await?;
        }

        let segments_changed = previous_completed != completed;
        let notification = segments_changed.then(|| {
            progress_notification(
                &display_name(id),
                SegmentCounts { total, completed },
                percent,
                threshold,
                status,
                auto_complete,
            )
        });

        log::debug!(
            "{}: {}/{} segments ({}%), status {}",
            id,
            completed,
            total,
            percent,
            status
        );

        Ok(ProgressOutcome::Updated(ProgressReport {
            item: id.clone(),
            completed,
            total,
            percent,
            threshold,
            status,
            previous_status,
            auto_complete,
            segments_changed,
            persisted,
            series: item.series,
            notification,
        }))
    }
}

fn progress_notification(
    name: &str,
    counts: SegmentCounts,
    percent: u32,
    threshold: u32,
    status: ItemStatus,
    auto_complete: bool,
) -> Notification {
    let SegmentCounts { total, completed } = counts;
    if status == ItemStatus::Completed {
        let message = if auto_complete {
            format!(
                "Well done! \"{}\" reached {}% and is complete",
                name, percent
            )
        } else {
            format!(
                "\"{}\" is complete: {}/{} segments ({}%)",
                name, completed, total, percent
            )
        };
        Notification::new(NotificationKind::ItemCompleted, message)
    } else if percent + NEAR_THRESHOLD_MARGIN >= threshold {
        Notification::new(
            NotificationKind::NearThreshold,
            format!(
                "\"{}\" is {} points from completion ({}% of {}%)",
                name,
                threshold.saturating_sub(percent),
                percent,
                threshold
            ),
        )
    } else {
        Notification::new(
            NotificationKind::Progress,
            format!(
                "\"{}\": {}/{} segments ({}%)",
                name, completed, total, percent
            ),
        )
    }
}

/// Note name without folders or extension
pub fn display_name(id: &ItemId) -> String {
    let file = id.as_str().rsplit('/').next().unwrap_or(id.as_str());
    file.strip_suffix(".md").unwrap_or(file).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::clock::FixedClock;
    use crate::frontmatter::{parse, Value};
    use crate::progress::DEFAULT_MARKER;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        tracker: ProgressTracker,
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let tracker = ProgressTracker::new(
            store.clone(),
            Arc::new(FixedClock::new(noon())),
            MarkerScanner::new(DEFAULT_MARKER).unwrap(),
            80,
        );
        Fixture { store, tracker }
    }

    fn note(frontmatter: &str, checked: usize, total: usize) -> String {
        let mut text = format!("---\n{}---\n\n# Lecture\n\n", frontmatter);
        for i in 0..total {
            let state = if i < checked { 'x' } else { ' ' };
            text.push_str(&format!("- [{}] Part {} #segment\n", state, i + 1));
        }
        text
    }

    fn report(outcome: ProgressOutcome) -> ProgressReport {
        match outcome {
            ProgressOutcome::Updated(report) => report,
            ProgressOutcome::NotTracked => panic!("expected a tracked item"),
        }
    }

    fn kind(report: &ProgressReport) -> Option<NotificationKind> {
        report.notification.as_ref().map(|n| n.kind)
    }

    #[tokio::test]
    async fn test_below_threshold_is_in_progress() {
        let f = fixture();
        let id = ItemId::from("lectures/01.md");
        f.store.insert(id.clone(), note("", 3, 5));

        let report = report(f.tracker.recompute(&id).await.unwrap());

        assert_eq!(report.percent, 60);
        assert_eq!(report.status, ItemStatus::InProgress);
        assert_eq!(kind(&report), Some(NotificationKind::Progress));
        assert!(report.persisted);

        let fm = parse(&f.store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("completedSegments").and_then(Value::as_i64), Some(3));
        assert_eq!(fm.get("totalSegments").and_then(Value::as_i64), Some(5));
        assert_eq!(fm.get("status").and_then(Value::as_str), Some("in-progress"));
        assert_eq!(fm.get("studyStartTime").and_then(Value::as_str), Some("2024-01-01 12:00"));
        assert!(fm.get("studyEndTime").is_none());
    }

    #[tokio::test]
    async fn test_reaching_threshold_completes() {
        let f = fixture();
        let id = ItemId::from("01.md");
        f.store.insert(id.clone(), note("", 4, 5));

        let report = report(f.tracker.recompute(&id).await.unwrap());

        assert_eq!(report.status, ItemStatus::Completed);
        assert!(report.completion_changed());
        assert_eq!(kind(&report), Some(NotificationKind::ItemCompleted));
        let fm = parse(&f.store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("studyEndTime").and_then(Value::as_str), Some("2024-01-01 12:00"));
    }

    #[tokio::test]
    async fn test_unchanged_cycle_is_silent() {
        let f = fixture();
        let id = ItemId::from("01.md");
        f.store.insert(id.clone(), note("", 1, 5));

        let first = report(f.tracker.recompute(&id).await.unwrap());
        assert!(first.notification.is_some());
        let writes = f.store.write_count();

        let second = report(f.tracker.recompute(&id).await.unwrap());
        assert!(!second.segments_changed);
        assert!(!second.persisted);
        assert!(second.notification.is_none());
        assert_eq!(f.store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_near_threshold_warning() {
        let f = fixture();
        let id = ItemId::from("01.md");
        // 7/10 = 70%, threshold 80
        f.store.insert(id.clone(), note("", 7, 10));

        let report = report(f.tracker.recompute(&id).await.unwrap());
        assert_eq!(kind(&report), Some(NotificationKind::NearThreshold));
    }

    #[tokio::test]
    async fn test_per_item_threshold() {
        let f = fixture();
        let id = ItemId::from("strict.md");
        f.store.insert(id.clone(), note("completionThreshold: 100\n", 4, 5));

        let report = report(f.tracker.recompute(&id).await.unwrap());

        assert_eq!(report.threshold, 100);
        assert_eq!(report.status, ItemStatus::InProgress);
    }

    #[tokio::test]
    async fn test_auto_complete_off_still_completes_without_end_stamp() {
        let f = fixture();
        let id = ItemId::from("manual.md");
        f.store.insert(
            id.clone(),
            note("series: calculus\nautoCompleteEnabled: false\n", 4, 5),
        );

        let report = report(f.tracker.recompute(&id).await.unwrap());

        assert_eq!(report.threshold, 80);
        assert_eq!(report.status, ItemStatus::Completed);
        assert_eq!(kind(&report), Some(NotificationKind::ItemCompleted));
        assert_eq!(report.series_to_update(), None);
        let fm = parse(&f.store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("status").and_then(Value::as_str), Some("completed"));
        assert!(fm.get("studyEndTime").is_none());
    }

    #[tokio::test]
    async fn test_completed_member_always_updates_series() {
        let f = fixture();
        let id = ItemId::from("01.md");
        f.store.insert(
            id.clone(),
            note("series: calculus\nstatus: completed\ncompletedSegments: 2\n", 2, 2),
        );

        let report = report(f.tracker.recompute(&id).await.unwrap());

        assert!(!report.completion_changed());
        assert!(report.notification.is_none());
        assert_eq!(report.series_to_update(), Some("calculus"));
    }

    #[tokio::test]
    async fn test_start_time_is_never_overwritten() {
        let f = fixture();
        let id = ItemId::from("01.md");
        f.store.insert(
            id.clone(),
            note("studyStartTime: 2023-12-01 08:00\ncompletedSegments: 1\n", 2, 5),
        );

        f.tracker.recompute(&id).await.unwrap();

        let fm = parse(&f.store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("studyStartTime").and_then(Value::as_str), Some("2023-12-01 08:00"));
    }

    #[tokio::test]
    async fn test_no_markers_is_not_tracked() {
        let f = fixture();
        let id = ItemId::from("plain.md");
        f.store.insert(id.clone(), "---\nstatus: learning\n---\nNo tasks here\n");

        let outcome = f.tracker.recompute(&id).await.unwrap();

        assert_eq!(outcome, ProgressOutcome::NotTracked);
        assert_eq!(f.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_block_leaves_note_untouched() {
        let f = fixture();
        let id = ItemId::from("broken.md");
        let text = "---\nstatus: learning\n- [x] Part 1 #segment\n";
        f.store.insert(id.clone(), text);

        let result = f.tracker.recompute(&id).await;

        assert!(matches!(result, Err(crate::Error::Format(_))));
        assert_eq!(f.store.get(&id).as_deref(), Some(text));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_note_untouched() {
        let f = fixture();
        let id = ItemId::from("01.md");
        let text = note("", 2, 5);
        f.store.insert(id.clone(), text.clone());
        f.store.reject_writes(true);

        let result = f.tracker.recompute(&id).await;

        assert!(matches!(result, Err(crate::Error::Storage(_))));
        assert_eq!(f.store.get(&id), Some(text));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(&ItemId::from("a/b/01-limits.md")), "01-limits");
        assert_eq!(display_name(&ItemId::from("notes")), "notes");
    }
}
