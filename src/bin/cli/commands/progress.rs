use anyhow::{Context, Result};

use lectern_lib::progress::ProgressOutcome;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, note: &str, format: &OutputFormat) -> Result<()> {
    let id = app.resolve_note(note)?;
    let report = match app
        .context
        .update_progress(&id)
        .await
        .with_context(|| format!("Failed to update progress of {}", id))?
    {
        ProgressOutcome::NotTracked => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "outcome": "not-tracked" })),
                OutputFormat::Plain => println!("{} has no segment markers.", note),
            }
            return Ok(());
        }
        ProgressOutcome::Updated(report) => report,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!(
                "{}: {}/{} segments, {}% (threshold {}%), {}",
                note, report.completed, report.total, report.percent, report.threshold, report.status
            );
            if let Some(series) = &report.series {
                println!("  Series: {}", series);
            }
        }
    }

    Ok(())
}
