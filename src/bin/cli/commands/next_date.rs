use anyhow::Result;

use lectern_lib::review::algorithm::review_interval;
use lectern_lib::review::{format_interval, next_review_date, Understanding};

use super::parse_date_arg;
use crate::OutputFormat;

pub fn run(
    last: &str,
    count: u32,
    difficulty: i64,
    understanding: Understanding,
    format: &OutputFormat,
) -> Result<()> {
    let last = parse_date_arg(last)?;
    let interval = review_interval(count, difficulty, understanding);
    let next = next_review_date(last, count, difficulty, understanding);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "lastReview": last,
                "reviewCount": count,
                "difficulty": difficulty,
                "understanding": understanding,
                "intervalDays": interval,
                "nextReview": next,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{} (in {})", next, format_interval(interval));
        }
    }

    Ok(())
}
