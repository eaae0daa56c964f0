use anyhow::{Context, Result};

use lectern_lib::review::ItemStatus;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, name: &str, format: &OutputFormat) -> Result<()> {
    let report = app
        .context
        .aggregate_series(name)
        .await
        .with_context(|| format!("Failed to aggregate series {}", name))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            let progress = &report.progress;
            if progress.total == 0 {
                println!("No notes in series '{}'.", name);
                return Ok(());
            }
            println!(
                "{}: {}/{} completed ({}%)",
                name, progress.completed, progress.total, progress.percent
            );
            for member in &progress.members {
                let mark = if member.status == Some(ItemStatus::Completed) {
                    "\u{2713}"
                } else {
                    " "
                };
                let status = member.status.map(|s| s.as_str()).unwrap_or("-");
                println!("  [{}] {} ({})", mark, member.item, status);
            }
        }
    }

    Ok(())
}
