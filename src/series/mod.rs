//! Series completion
//!
//! A series is every note whose `series` key names it. Completion of the
//! whole series is announced once per transition; the ledger remembers what
//! was announced.

mod aggregator;
mod ledger;

pub use aggregator::{SeriesAggregator, SeriesMember, SeriesProgress, SeriesReport};
pub use ledger::{Announcement, AnnouncementLedger, FileLedger, LedgerError, MemoryLedger};
