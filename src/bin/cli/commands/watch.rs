use anyhow::{Context, Result};

use lectern_lib::watcher::watch_vault;

use crate::app::App;

pub async fn run(app: App) -> Result<()> {
    let running = app.context.start();
    let watcher = watch_vault(&app.vault, running.signals())
        .with_context(|| format!("Failed to watch {}", app.vault.display()))?;

    println!("Watching {} (Ctrl-C to stop)", watcher.root().display());
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    drop(watcher);
    running.shutdown().await;
    Ok(())
}
