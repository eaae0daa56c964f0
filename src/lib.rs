//! Review scheduling and study progress tracking over a vault of Markdown
//! notes.
//!
//! Each note carries a small frontmatter block with its review state. The
//! review scheduler decides when a note is due again; the progress tracker
//! turns checked segment markers in the note body into a completion status;
//! the series aggregator rolls those statuses up per series.

pub mod clock;
pub mod config;
pub mod context;
mod error;
pub mod frontmatter;
pub mod notifier;
pub mod progress;
pub mod review;
pub mod series;
pub mod signals;
pub mod store;
pub mod watcher;

pub use config::Config;
pub use context::{RunningContext, StudyContext};
pub use error::{Error, Result};
