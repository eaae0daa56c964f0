use std::sync::Arc;

use serde::Serialize;

use super::ledger::AnnouncementLedger;
use crate::clock::Clock;
use crate::frontmatter::Document;
use crate::notifier::{Notification, NotificationKind};
use crate::review::algorithm::completion_percent;
use crate::review::{ItemStatus, ReviewItem};
use crate::store::{DocumentStore, ItemId, StorageError};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMember {
    pub item: ItemId,
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesProgress {
    pub series: String,
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
    pub members: Vec<SeriesMember>,
}

impl SeriesProgress {
    /// An empty series is never complete
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesReport {
    pub progress: SeriesProgress,
    /// Set only on the first observation of a complete series
    pub newly_completed: bool,
    /// Completion announcement, or a progress summary for an unfinished series
    pub notification: Option<Notification>,
}

/// Rolls member statuses up into series completion
pub struct SeriesAggregator {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn AnnouncementLedger>,
}

impl SeriesAggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn AnnouncementLedger>,
    ) -> Self {
        Self {
            store,
            clock,
            ledger,
        }
    }

    /// Current completion of `series`, without side effects
    pub async fn progress(&self, series: &str) -> Result<SeriesProgress> {
        let mut members = Vec::new();

        for id in self.store.list().await? {
            let text = match self.store.read(&id).await {
                Ok(text) => text,
                // Removed between listing and reading
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            let doc = match Document::parse(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("Skipping {} while scanning series {}: {}", id, series, e);
                    continue;
                }
            };
            let item = ReviewItem::from_frontmatter(&doc.frontmatter);
            if item.series.as_deref() == Some(series) {
                members.push(SeriesMember {
                    item: id,
                    status: item.status,
                });
            }
        }

        let total = u32::try_from(members.len()).unwrap_or(u32::MAX);
        let completed = members
            .iter()
            .filter(|m| m.status == Some(ItemStatus::Completed))
            .count();
        let completed = u32::try_from(completed).unwrap_or(u32::MAX);

        Ok(SeriesProgress {
            series: series.to_string(),
            completed,
            total,
            percent: completion_percent(completed, total),
            members,
        })
    }

    /// Compute progress and record completion the first time it is seen.
    ///
    /// The returned notification is not sent; the caller delivers it once
    /// the rest of its cycle has succeeded.
    pub async fn aggregate(&self, series: &str) -> Result<SeriesReport> {
        let progress = self.progress(series).await?;
        let mut newly_completed = false;
        let mut notification = None;

        if progress.is_complete() {
            if !self.ledger.is_announced(series)? {
                self.ledger.mark_announced(series, self.clock.today())?;
                newly_completed = true;
                log::info!("Series {} completed ({} items)", series, progress.total);
                notification = Some(Notification::new(
                    NotificationKind::SeriesCompleted,
                    format!(
                        "Series \"{}\" is complete: all {} items done",
                        series, progress.total
                    ),
                ));
            }
        } else {
            self.ledger.clear(series)?;
            if progress.total > 0 {
                notification = Some(Notification::new(
                    NotificationKind::SeriesProgress,
                    format!(
                        "Series \"{}\": {}/{} items completed ({}%)",
                        series, progress.completed, progress.total, progress.percent
                    ),
                ));
            }
        }

        Ok(SeriesReport {
            progress,
            newly_completed,
            notification,
        })
    }
}
