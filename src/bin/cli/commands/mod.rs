pub mod due;
pub mod next_date;
pub mod progress;
pub mod review;
pub mod series;
pub mod watch;

use anyhow::{Context, Result};
use chrono::NaiveDate;

pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}
