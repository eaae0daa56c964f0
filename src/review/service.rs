use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::models::{ItemStatus, ReviewItem, Understanding};
use super::operations;
use super::schema::keys;
use crate::clock::Clock;
use crate::frontmatter::{Document, Frontmatter};
use crate::store::{DocumentStore, ItemId, StorageError};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "item", rename_all = "kebab-case")]
pub enum ReviewOutcome {
    Updated(ReviewItem),
    /// The note has no frontmatter block
    NotTracked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueItem {
    pub item: ItemId,
    pub next_review: Option<NaiveDate>,
    pub review_count: u32,
    pub status: Option<ItemStatus>,
}

/// Review operations against stored notes
pub struct ReviewService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn load(&self, id: &ItemId) -> Result<ReviewOutcome> {
        let doc = Document::parse(&self.store.read(id).await?)?;
        if !doc.has_block() {
            return Ok(ReviewOutcome::NotTracked);
        }
        Ok(ReviewOutcome::Updated(ReviewItem::from_frontmatter(
            &doc.frontmatter,
        )))
    }

    /// Load, apply `op`, and persist if anything changed
    pub async fn update<F>(&self, id: &ItemId, op: F) -> Result<ReviewOutcome>
    where
        F: FnOnce(&mut ReviewItem, NaiveDate),
    {
        let text = self.store.read(id).await?;
        let mut doc = Document::parse(&text)?;
        if !doc.has_block() {
            log::debug!("{} has no frontmatter, not tracked", id);
            return Ok(ReviewOutcome::NotTracked);
        }

        let mut item = ReviewItem::from_frontmatter(&doc.frontmatter);
        op(&mut item, self.clock.today());
        item.write_to(&mut doc.frontmatter);

        let rendered = doc.render();
        if rendered != text {
            self.store.write(id, &rendered).await?;
        }
        Ok(ReviewOutcome::Updated(item))
    }

    pub async fn check_repeat(&self, id: &ItemId, repeat_index: u32) -> Result<ReviewOutcome> {
        self.update(id, |item, today| {
            if !operations::check_repeat(item, repeat_index, today) {
                log::debug!("Repeat {} already checked", repeat_index);
            }
        })
        .await
    }

    pub async fn record_timed_review(&self, id: &ItemId, elapsed_secs: u64) -> Result<ReviewOutcome> {
        self.update(id, |item, today| {
            operations::record_timed_review(item, elapsed_secs, today)
        })
        .await
    }

    pub async fn add_feedback(&self, id: &ItemId, content: &str) -> Result<ReviewOutcome> {
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("feedback is empty".to_string()));
        }
        self.update(id, |item, today| operations::add_feedback(item, content, today))
            .await
    }

    pub async fn set_understanding(
        &self,
        id: &ItemId,
        understanding: Understanding,
    ) -> Result<ReviewOutcome> {
        self.update(id, |item, _| operations::set_understanding(item, understanding))
            .await
    }

    pub async fn set_difficulty(&self, id: &ItemId, difficulty: i64) -> Result<ReviewOutcome> {
        if !(0..=5).contains(&difficulty) {
            return Err(Error::InvalidInput(format!(
                "difficulty must be between 0 and 5, got {}",
                difficulty
            )));
        }
        self.update(id, |item, _| operations::set_difficulty(item, difficulty))
            .await
    }

    /// Items under review that are due on `today`, earliest first
    pub async fn due(&self, today: NaiveDate) -> Result<Vec<DueItem>> {
        let mut due = Vec::new();

        for id in self.store.list().await? {
            let text = match self.store.read(&id).await {
                Ok(text) => text,
                Err(StorageError::NotFound(_)) => {
                    log::debug!("{} disappeared before it could be read", id);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let doc = match Document::parse(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("Skipping {}: {}", id, e);
                    continue;
                }
            };
            if !is_under_review(&doc.frontmatter) {
                continue;
            }
            let item = ReviewItem::from_frontmatter(&doc.frontmatter);
            if item.is_due(today) {
                due.push(DueItem {
                    item: id,
                    next_review: item.next_review,
                    review_count: item.review_count,
                    status: item.status,
                });
            }
        }

        due.sort_by(|a, b| {
            a.next_review
                .cmp(&b.next_review)
                .then_with(|| a.item.cmp(&b.item))
        });
        Ok(due)
    }
}

fn is_under_review(fm: &Frontmatter) -> bool {
    [
        keys::REVIEW_COUNT,
        keys::NEXT_REVIEW,
        keys::LAST_REVIEW,
        keys::REPEATS,
    ]
    .iter()
    .any(|key| fm.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::frontmatter::{parse, Value};
    use crate::store::MemoryStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service(store: &Arc<MemoryStore>) -> ReviewService {
        ReviewService::new(store.clone(), Arc::new(FixedClock::at_date(date("2024-01-01"))))
    }

    fn updated(outcome: ReviewOutcome) -> ReviewItem {
        match outcome {
            ReviewOutcome::Updated(item) => item,
            ReviewOutcome::NotTracked => panic!("expected a tracked item"),
        }
    }

    #[tokio::test]
    async fn test_check_repeat_persists() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        store.insert(id.clone(), "---\ntags: [math]\n---\nBody\n");
        let service = service(&store);

        service.check_repeat(&id, 1).await.unwrap();
        let item = updated(service.check_repeat(&id, 1).await.unwrap());

        assert_eq!(item.review_count, 1);
        let text = store.get(&id).unwrap();
        assert!(text.ends_with("---\nBody\n"));
        let fm = parse(&text).unwrap();
        assert_eq!(fm.get("reviewCount").and_then(Value::as_i64), Some(1));
        assert_eq!(fm.get("nextReview").and_then(Value::as_str), Some("2024-01-04"));
        assert_eq!(fm.get("status").and_then(Value::as_str), Some("learning"));
        assert!(fm.contains_key("tags"));
    }

    #[tokio::test]
    async fn test_timed_reviews_accumulate() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        store.insert(id.clone(), "---\nreviewCount: 0\n---\n");
        let service = service(&store);

        service.record_timed_review(&id, 60).await.unwrap();
        service.record_timed_review(&id, 60).await.unwrap();

        let fm = parse(&store.get(&id).unwrap()).unwrap();
        assert_eq!(fm.get("reviewCount").and_then(Value::as_i64), Some(2));
        assert_eq!(fm.get("totalTime").and_then(Value::as_i64), Some(120));
        assert_eq!(fm.get("avgTime").and_then(Value::as_i64), Some(60));
        assert_eq!(fm.get("reviewHistory").and_then(Value::as_records).map(<[_]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_note_without_block_is_not_tracked() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("plain.md");
        store.insert(id.clone(), "Just text\n");

        let outcome = service(&store).check_repeat(&id, 1).await.unwrap();

        assert_eq!(outcome, ReviewOutcome::NotTracked);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_feedback_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        store.insert(id.clone(), "---\nreviewCount: 1\n---\n");

        let result = service(&store).add_feedback(&id, "   ").await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_feedback_is_appended() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        store.insert(id.clone(), "---\nreviewCount: 1\n---\n");

        let item = updated(service(&store).add_feedback(&id, "Mixed up the proofs").await.unwrap());

        assert_eq!(item.feedback_history.len(), 1);
        assert_eq!(item.feedback_history[0].content, "Mixed up the proofs");
    }

    #[tokio::test]
    async fn test_understanding_reschedules() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        store.insert(id.clone(), "---\nreviewCount: 2\nlastReview: 2024-01-01\n---\n");

        let item = updated(
            service(&store)
                .set_understanding(&id, Understanding::Hard)
                .await
                .unwrap(),
        );

        // ladder[2] = 7, hard halves it
        assert_eq!(item.next_review, Some(date("2024-01-04")));
    }

    #[tokio::test]
    async fn test_malformed_note_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let id = ItemId::from("card.md");
        let text = "---\nreviewCount: [1, 2\n---\n";
        store.insert(id.clone(), text);

        let result = service(&store).check_repeat(&id, 1).await;

        assert!(matches!(result, Err(Error::Format(_))));
        assert_eq!(store.get(&id).as_deref(), Some(text));
    }

    #[tokio::test]
    async fn test_due_lists_reviewed_items_in_order() {
        let store = Arc::new(MemoryStore::new());
        store.insert("later.md", "---\nreviewCount: 1\nnextReview: 2024-02-01\n---\n");
        store.insert("b.md", "---\nreviewCount: 1\nnextReview: 2024-01-05\n---\n");
        store.insert("a.md", "---\nreviewCount: 3\nnextReview: 2024-01-02\n---\n");
        store.insert("fresh.md", "---\nreviewCount: 0\n---\n");
        store.insert("note.md", "---\ntitle: Not a card\n---\n");

        let due = service(&store).due(date("2024-01-10")).await.unwrap();
        let ids: Vec<&str> = due.iter().map(|d| d.item.as_str()).collect();

        assert_eq!(ids, vec!["fresh.md", "a.md", "b.md"]);
    }

    /// Lists one extra id that can never be read, like a note deleted
    /// between listing and reading
    struct VanishingStore {
        inner: MemoryStore,
        ghost: ItemId,
        /// Fail reads of the ghost with an I/O-style error instead
        broken: bool,
    }

    #[async_trait::async_trait]
    impl DocumentStore for VanishingStore {
        async fn read(&self, id: &ItemId) -> crate::store::Result<String> {
            if self.broken && *id == self.ghost {
                return Err(StorageError::Task("read interrupted".to_string()));
            }
            self.inner.read(id).await
        }

        async fn write(&self, id: &ItemId, text: &str) -> crate::store::Result<()> {
            self.inner.write(id, text).await
        }

        async fn list(&self) -> crate::store::Result<Vec<ItemId>> {
            let mut ids = self.inner.list().await?;
            ids.push(self.ghost.clone());
            ids.sort();
            Ok(ids)
        }
    }

    #[tokio::test]
    async fn test_due_skips_notes_removed_mid_scan() {
        let inner = MemoryStore::new();
        inner.insert("b.md", "---\nreviewCount: 1\nnextReview: 2024-01-05\n---\n");
        let store = Arc::new(VanishingStore {
            inner,
            ghost: ItemId::from("a.md"),
            broken: false,
        });
        let service = ReviewService::new(store, Arc::new(FixedClock::at_date(date("2024-01-01"))));

        let due = service.due(date("2024-01-10")).await.unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].item.as_str(), "b.md");
    }

    #[tokio::test]
    async fn test_due_propagates_other_read_errors() {
        let store = Arc::new(VanishingStore {
            inner: MemoryStore::new(),
            ghost: ItemId::from("a.md"),
            broken: true,
        });
        let service = ReviewService::new(store, Arc::new(FixedClock::at_date(date("2024-01-01"))));

        let result = service.due(date("2024-01-10")).await;

        assert!(matches!(result, Err(Error::Storage(StorageError::Task(_)))));
    }
}
