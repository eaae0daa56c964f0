//! Spaced-repetition review scheduling
//!
//! `algorithm` holds the pure interval and status functions, `operations`
//! applies review events to a `ReviewItem`, and `service` runs them against
//! stored notes.

pub mod algorithm;
mod models;
pub mod operations;
pub mod schema;
mod service;

pub use algorithm::{format_interval, next_review_date};
pub use models::{ItemStatus, ReviewItem, Understanding};
pub use service::{DueItem, ReviewOutcome, ReviewService};
