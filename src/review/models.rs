//! Data models for reviewed items

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frontmatter::Record;

/// Lifecycle status of an item.
///
/// The first four come from review counts, the last three from segment
/// completion (`NotStarted` is shared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    NotStarted,
    Learning,
    Reviewing,
    Mastered,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::NotStarted => "not-started",
            ItemStatus::Learning => "learning",
            ItemStatus::Reviewing => "reviewing",
            ItemStatus::Mastered => "mastered",
            ItemStatus::InProgress => "in-progress",
            ItemStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "not-started" | "notstarted" => Ok(ItemStatus::NotStarted),
            "learning" => Ok(ItemStatus::Learning),
            "reviewing" => Ok(ItemStatus::Reviewing),
            "mastered" => Ok(ItemStatus::Mastered),
            "in-progress" | "inprogress" => Ok(ItemStatus::InProgress),
            "completed" => Ok(ItemStatus::Completed),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// Self-reported understanding after a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Understanding {
    /// Nothing reported yet
    #[default]
    #[serde(rename = "none")]
    Unrated,
    Hard,
    Ok,
    Good,
    Perfect,
}

impl Understanding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Understanding::Unrated => "none",
            Understanding::Hard => "hard",
            Understanding::Ok => "ok",
            Understanding::Good => "good",
            Understanding::Perfect => "perfect",
        }
    }

    /// Lenient parse: anything unrecognised is `Unrated`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Understanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Understanding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Understanding::Unrated),
            "hard" => Ok(Understanding::Hard),
            "ok" => Ok(Understanding::Ok),
            "good" => Ok(Understanding::Good),
            "perfect" => Ok(Understanding::Perfect),
            _ => Err(format!("unknown understanding: {}", s)),
        }
    }
}

/// A trackable learning unit, decoded from its note's frontmatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub review_count: u32,
    /// Completed repeat indices
    pub repeats: BTreeSet<u32>,
    /// Raw difficulty; values outside 0-5 are kept but treated as neutral
    pub difficulty: i64,
    pub understanding: Understanding,
    pub last_review: Option<NaiveDate>,
    pub next_review: Option<NaiveDate>,
    pub status: Option<ItemStatus>,
    pub total_time_secs: u64,
    pub avg_time_secs: u64,
    pub feedback_history: Vec<Record>,
    pub review_history: Vec<Record>,
    pub completed_segments: u32,
    pub total_segments: u32,
    pub series: Option<String>,
    pub completion_threshold: Option<u32>,
    pub auto_complete_enabled: bool,
    pub study_start_time: Option<String>,
    pub study_end_time: Option<String>,
}

impl Default for ReviewItem {
    fn default() -> Self {
        Self {
            review_count: 0,
            repeats: BTreeSet::new(),
            difficulty: 0,
            understanding: Understanding::Unrated,
            last_review: None,
            next_review: None,
            status: None,
            total_time_secs: 0,
            avg_time_secs: 0,
            feedback_history: Vec::new(),
            review_history: Vec::new(),
            completed_segments: 0,
            total_segments: 0,
            series: None,
            completion_threshold: None,
            auto_complete_enabled: true,
            study_start_time: None,
            study_end_time: None,
        }
    }
}

impl ReviewItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items never reviewed are always due
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review.map_or(true, |next| next <= today)
    }
}
