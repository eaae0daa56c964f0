use anyhow::{Context, Result};

use lectern_lib::review::format_interval;

use super::parse_date_arg;
use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, date: Option<&str>, format: &OutputFormat) -> Result<()> {
    let today = match date {
        Some(d) => parse_date_arg(d)?,
        None => app.context.clock().today(),
    };
    let due = app
        .context
        .reviews()
        .due(today)
        .await
        .context("Failed to list due notes")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due on {}.", today);
                return Ok(());
            }
            let width = due.iter().map(|d| d.item.as_str().len()).max().unwrap_or(4).max(4);
            println!("{:<width$} Reviews  Overdue", "Note", width = width);
            for item in &due {
                let overdue = match item.next_review {
                    Some(next) => format_interval((today - next).num_days()),
                    None => "new".to_string(),
                };
                println!(
                    "{:<width$} {:>7}  {}",
                    item.item.as_str(),
                    item.review_count,
                    overdue,
                    width = width
                );
            }
            println!("\n{} notes due", due.len());
        }
    }

    Ok(())
}
