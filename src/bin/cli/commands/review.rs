use anyhow::{bail, Context, Result};

use lectern_lib::review::{format_interval, ReviewItem, ReviewOutcome, Understanding};

use crate::app::App;
use crate::OutputFormat;

/// What a `review` invocation records
pub struct Rating {
    pub seconds: Option<u64>,
    pub understanding: Option<Understanding>,
    pub difficulty: Option<i64>,
}

pub async fn run_repeat(app: &App, note: &str, index: u32, format: &OutputFormat) -> Result<()> {
    let id = app.resolve_note(note)?;
    let outcome = app
        .context
        .reviews()
        .check_repeat(&id, index)
        .await
        .with_context(|| format!("Failed to check repeat {} of {}", index, id))?;
    print_outcome(app, note, &outcome, format)
}

pub async fn run_review(app: &App, note: &str, rating: Rating, format: &OutputFormat) -> Result<()> {
    if rating.seconds.is_none() && rating.understanding.is_none() && rating.difficulty.is_none() {
        bail!("Nothing to record: pass --seconds, --understanding or --difficulty");
    }
    let id = app.resolve_note(note)?;
    let reviews = app.context.reviews();

    let mut outcome = None;
    if let Some(seconds) = rating.seconds {
        outcome = Some(
            reviews
                .record_timed_review(&id, seconds)
                .await
                .with_context(|| format!("Failed to record review of {}", id))?,
        );
    }
    if let Some(difficulty) = rating.difficulty {
        outcome = Some(
            reviews
                .set_difficulty(&id, difficulty)
                .await
                .with_context(|| format!("Failed to set difficulty of {}", id))?,
        );
    }
    if let Some(understanding) = rating.understanding {
        outcome = Some(
            reviews
                .set_understanding(&id, understanding)
                .await
                .with_context(|| format!("Failed to set understanding of {}", id))?,
        );
    }

    match outcome {
        Some(outcome) => print_outcome(app, note, &outcome, format),
        None => Ok(()),
    }
}

pub async fn run_feedback(app: &App, note: &str, text: &str, format: &OutputFormat) -> Result<()> {
    let id = app.resolve_note(note)?;
    let outcome = app
        .context
        .reviews()
        .add_feedback(&id, text)
        .await
        .with_context(|| format!("Failed to add feedback to {}", id))?;
    print_outcome(app, note, &outcome, format)
}

fn print_outcome(app: &App, note: &str, outcome: &ReviewOutcome, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
        OutputFormat::Plain => match outcome {
            ReviewOutcome::NotTracked => {
                println!("{} has no frontmatter block; nothing recorded.", note);
            }
            ReviewOutcome::Updated(item) => print_item(app, note, item),
        },
    }
    Ok(())
}

fn print_item(app: &App, note: &str, item: &ReviewItem) {
    println!("{}", note);
    println!("  Reviews:       {}", item.review_count);
    if let Some(status) = item.status {
        println!("  Status:        {}", status);
    }
    if let Some(last) = item.last_review {
        println!("  Last review:   {}", last);
    }
    if let Some(next) = item.next_review {
        let days = (next - app.context.clock().today()).num_days();
        println!("  Next review:   {} ({})", next, format_interval(days));
    }
    if item.total_time_secs > 0 {
        println!(
            "  Time:          {}s total, {}s average",
            item.total_time_secs, item.avg_time_secs
        );
    }
    if let Some(feedback) = item.feedback_history.last() {
        println!("  Last feedback: {} {}", feedback.date, feedback.content);
    }
}
