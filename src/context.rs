//! Application context
//!
//! Everything a running instance needs is built once here and passed
//! around explicitly.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError};
use crate::notifier::{LogNotifier, Notification, NotificationKind, Notifier};
use crate::progress::{display_name, MarkerScanner, ProgressOutcome, ProgressTracker};
use crate::review::ReviewService;
use crate::series::{
    AnnouncementLedger, FileLedger, MemoryLedger, SeriesAggregator, SeriesReport,
};
use crate::signals::{spawn_signal_loop, ChangeSignals, SignalHandler};
use crate::store::{DocumentStore, FileStore, ItemId};
use crate::Result;

pub struct StudyContext {
    config: Config,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    tracker: ProgressTracker,
    series: SeriesAggregator,
    reviews: ReviewService,
}

impl StudyContext {
    /// Context with a process-lifetime announcement ledger
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::with_ledger(config, store, notifier, clock, Arc::new(MemoryLedger::new()))
    }

    pub fn with_ledger(
        config: Config,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn AnnouncementLedger>,
    ) -> Result<Self> {
        let scanner = MarkerScanner::new(&config.marker)
            .map_err(|e| ConfigError::Invalid(format!("marker: {}", e)))?;
        let tracker = ProgressTracker::new(
            store.clone(),
            clock.clone(),
            scanner,
            config.completion_threshold,
        );
        let series = SeriesAggregator::new(store.clone(), clock.clone(), ledger);
        let reviews = ReviewService::new(store, clock.clone());

        Ok(Self {
            config,
            notifier,
            clock,
            tracker,
            series,
            reviews,
        })
    }

    /// Context over the configured vault, with the given notifier
    pub fn from_config(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let vault = config
            .vault_path
            .clone()
            .ok_or_else(|| ConfigError::Invalid("vault_path is not set".to_string()))?;
        let ledger: Arc<dyn AnnouncementLedger> = match config.state_dir() {
            Some(dir) if config.durable_announcements => Arc::new(FileLedger::new(&dir)?),
            Some(_) => Arc::new(MemoryLedger::new()),
            None => {
                log::warn!("No state directory available, series announcements will not persist");
                Arc::new(MemoryLedger::new())
            }
        };
        log::info!("Using vault {}", vault.display());

        Self::with_ledger(
            config,
            Arc::new(FileStore::new(vault)),
            notifier,
            Arc::new(SystemClock),
            ledger,
        )
    }

    /// `from_config` with notifications going to the log
    pub fn from_config_logged(config: Config) -> Result<Self> {
        Self::from_config(config, Arc::new(LogNotifier))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn reviews(&self) -> &ReviewService {
        &self.reviews
    }

    /// Recompute an item and roll its series up.
    ///
    /// Notifications are sent only once the whole cycle has succeeded, so
    /// a failed cycle leaves the caller to report a single error.
    pub async fn update_progress(&self, id: &ItemId) -> Result<ProgressOutcome> {
        let (outcome, notifications) = self.run_cycle(id).await?;
        for notification in notifications {
            self.notifier.notify(notification);
        }
        Ok(outcome)
    }

    /// Aggregate a series on demand and deliver its notification
    pub async fn aggregate_series(&self, series: &str) -> Result<SeriesReport> {
        let report = self.series.aggregate(series).await?;
        if let Some(notification) = &report.notification {
            self.notifier.notify(notification.clone());
        }
        Ok(report)
    }

    /// One full cycle for a changed item.
    ///
    /// Never fails: errors are logged and reported with a single
    /// notification, and the next signal retries from persisted state.
    pub async fn handle_change(&self, id: &ItemId) {
        if let Err(e) = self.update_progress(id).await {
            log::error!("Progress update for {} failed: {}", id, e);
            self.notifier.notify(Notification::new(
                NotificationKind::Failure,
                format!("Could not update \"{}\": {}", display_name(id), e),
            ));
        }
    }

    async fn run_cycle(&self, id: &ItemId) -> Result<(ProgressOutcome, Vec<Notification>)> {
        let report = match self.tracker.recompute(id).await? {
            ProgressOutcome::NotTracked => return Ok((ProgressOutcome::NotTracked, Vec::new())),
            ProgressOutcome::Updated(report) => report,
        };

        let mut notifications: Vec<Notification> = report.notification.iter().cloned().collect();
        if let Some(series) = report.series_to_update() {
            let series_report = self.series.aggregate(series).await?;
            // A finished member re-aggregates every cycle; only a change in
            // its own completion is worth a series progress message.
            let wanted = series_report.newly_completed || report.completion_changed();
            if let Some(notification) = series_report.notification.filter(|_| wanted) {
                notifications.push(notification);
            }
        }

        Ok((ProgressOutcome::Updated(report), notifications))
    }

    /// Start the signal loop
    pub fn start(self: &Arc<Self>) -> RunningContext {
        let handler: Arc<dyn SignalHandler> = self.clone();
        let (signals, task) = spawn_signal_loop(handler, self.config.debounce());
        log::info!("Study context started (debounce {}ms)", self.config.debounce_ms);
        RunningContext { signals, task }
    }
}

#[async_trait]
impl SignalHandler for StudyContext {
    async fn handle(&self, id: ItemId) {
        self.handle_change(&id).await;
    }
}

pub struct RunningContext {
    signals: ChangeSignals,
    task: JoinHandle<()>,
}

impl RunningContext {
    pub fn signals(&self) -> ChangeSignals {
        self.signals.clone()
    }

    /// Drain pending work and wait for the loop to stop
    pub async fn shutdown(self) {
        self.signals.shutdown();
        if let Err(e) = self.task.await {
            log::error!("Signal loop ended abnormally: {}", e);
        }
        log::info!("Study context stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::clock::FixedClock;
    use crate::frontmatter::{parse, Value};
    use crate::notifier::RecordingNotifier;
    use crate::series::FileLedger;
    use crate::store::MemoryStore;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
    }

    fn lecture(series: &str, checked: usize, total: usize) -> String {
        let mut text = format!("---\nseries: {}\n---\n", series);
        for i in 0..total {
            let state = if i < checked { 'x' } else { ' ' };
            text.push_str(&format!("- [{}] Part {} #segment\n", state, i + 1));
        }
        text
    }

    fn context(store: &Arc<MemoryStore>, notifier: &Arc<RecordingNotifier>) -> Arc<StudyContext> {
        Arc::new(
            StudyContext::new(Config::default(), store.clone(), notifier.clone(), clock()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_completing_last_item_completes_series() {
        let store = Arc::new(MemoryStore::new());
        store.insert("calc/01.md", lecture("calculus", 5, 5));
        store.insert("calc/02.md", lecture("calculus", 1, 5));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = context(&store, &notifier);

        ctx.handle_change(&ItemId::from("calc/01.md")).await;
        assert_eq!(notifier.count_of(NotificationKind::SeriesProgress), 1);

        store.insert("calc/02.md", lecture("calculus", 5, 5));
        ctx.handle_change(&ItemId::from("calc/02.md")).await;
        assert_eq!(notifier.count_of(NotificationKind::SeriesCompleted), 1);

        // Re-saving a finished item announces nothing new
        ctx.handle_change(&ItemId::from("calc/02.md")).await;
        assert_eq!(notifier.count_of(NotificationKind::SeriesCompleted), 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_notifies_once() {
        let store = Arc::new(MemoryStore::new());
        store.insert("01.md", "---\nseries: [unclosed\n---\n- [x] a #segment\n");
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = context(&store, &notifier);

        ctx.handle_change(&ItemId::from("01.md")).await;

        let seen = notifier.all();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, NotificationKind::Failure);
    }

    #[tokio::test]
    async fn test_already_completed_member_is_announced() {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "calc/01.md",
            "---\nseries: calculus\nstatus: completed\ncompletedSegments: 2\n---\n\
             - [x] a #segment\n- [x] b #segment\n",
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = context(&store, &notifier);

        ctx.handle_change(&ItemId::from("calc/01.md")).await;

        assert_eq!(notifier.count_of(NotificationKind::SeriesCompleted), 1);
        assert_eq!(notifier.all().len(), 1);
    }

    #[tokio::test]
    async fn test_series_failure_after_write_is_retried() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(FileLedger::new(temp_dir.path()).unwrap());
        std::fs::write(ledger.path(), "{not json").unwrap();

        let store = Arc::new(MemoryStore::new());
        store.insert("calc/01.md", lecture("calculus", 2, 2));
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = StudyContext::with_ledger(
            Config::default(),
            store.clone(),
            notifier.clone(),
            clock(),
            ledger.clone(),
        )
        .unwrap();
        let id = ItemId::from("calc/01.md");

        ctx.handle_change(&id).await;

        // The note write succeeded before the ledger failed
        let seen = notifier.all();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, NotificationKind::Failure);
        let fm = parse(&store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("status").and_then(Value::as_str), Some("completed"));

        std::fs::remove_file(ledger.path()).unwrap();
        ctx.handle_change(&id).await;

        assert_eq!(notifier.count_of(NotificationKind::SeriesCompleted), 1);
        assert_eq!(notifier.count_of(NotificationKind::Failure), 1);
    }

    #[tokio::test]
    async fn test_update_progress_reports_without_notifying_on_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert("01.md", lecture("calculus", 1, 2));
        store.reject_writes(true);
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = context(&store, &notifier);

        let result = ctx.update_progress(&ItemId::from("01.md")).await;

        assert!(matches!(result, Err(crate::Error::Storage(_))));
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_series_delivers_notification() {
        let store = Arc::new(MemoryStore::new());
        store.insert("01.md", "---\nseries: calculus\nstatus: completed\n---\n");
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = context(&store, &notifier);

        let report = ctx.aggregate_series("calculus").await.unwrap();

        assert!(report.newly_completed);
        assert_eq!(notifier.count_of(NotificationKind::SeriesCompleted), 1);
    }

    #[tokio::test]
    async fn test_running_context_processes_signals() {
        let store = Arc::new(MemoryStore::new());
        store.insert("01.md", lecture("calculus", 2, 4));
        let notifier = Arc::new(RecordingNotifier::new());
        let running = context(&store, &notifier).start();

        let signals = running.signals();
        signals.signal(ItemId::from("01.md"));
        signals.signal(ItemId::from("01.md"));
        running.shutdown().await;

        let fm = parse(&store.get(&ItemId::from("01.md")).unwrap()).unwrap();
        assert_eq!(fm.get("completedSegments").and_then(Value::as_i64), Some(2));
        assert_eq!(notifier.count_of(NotificationKind::Progress), 1);
    }

    #[test]
    fn test_from_config_requires_vault() {
        let result = StudyContext::from_config_logged(Config::default());
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_uses_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let vault = temp_dir.path().join("vault");
        std::fs::create_dir_all(&vault).unwrap();
        std::fs::write(vault.join("01.md"), lecture("calculus", 1, 2)).unwrap();
        let config = Config {
            vault_path: Some(vault.clone()),
            state_dir: Some(temp_dir.path().join("state")),
            ..Config::default()
        };
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = StudyContext::from_config(config, notifier.clone()).unwrap();

        ctx.handle_change(&ItemId::from("01.md")).await;

        let text = std::fs::read_to_string(vault.join("01.md")).unwrap();
        assert!(text.contains("completedSegments: 1"));
        assert_eq!(notifier.count_of(NotificationKind::Progress), 1);
    }
}
