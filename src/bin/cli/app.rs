use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use lectern_lib::notifier::{Notification, NotificationKind, Notifier};
use lectern_lib::store::ItemId;
use lectern_lib::{Config, StudyContext};

/// Global command-line options
pub struct Options {
    pub config: Option<PathBuf>,
    pub vault: Option<PathBuf>,
}

/// Shared application state for CLI commands
pub struct App {
    pub context: Arc<StudyContext>,
    pub vault: PathBuf,
}

impl App {
    pub fn new(opts: &Options) -> Result<Self> {
        let mut config = Config::load_or_default(opts.config.as_deref())
            .context("Failed to load config")?;
        if let Some(vault) = &opts.vault {
            config.vault_path = Some(vault.clone());
        }

        let vault = config
            .vault_path
            .clone()
            .context("No vault configured. Pass --vault or set vault_path in the config file")?;
        if !vault.is_dir() {
            anyhow::bail!("Vault '{}' is not a directory", vault.display());
        }

        let context = StudyContext::from_config(config, Arc::new(ConsoleNotifier))
            .context("Failed to set up the study context")?;

        Ok(Self {
            context: Arc::new(context),
            vault,
        })
    }

    /// Accept either a vault-relative id or a path to a note inside the vault
    pub fn resolve_note(&self, note: &str) -> Result<ItemId> {
        let path = Path::new(note);
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.vault)
                .with_context(|| format!("'{}' is outside the vault", note))?
        } else {
            path
        };
        let parts: Vec<&str> = relative
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()
            .with_context(|| format!("'{}' is not valid UTF-8", note))?;
        Ok(ItemId::new(parts.join("/")))
    }
}

/// Prints notifications to stderr so they never mix with `--format json`
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let prefix = match notification.kind {
            NotificationKind::ItemCompleted | NotificationKind::SeriesCompleted => "\u{2713}",
            NotificationKind::NearThreshold => "!",
            NotificationKind::Failure => "\u{2717}",
            NotificationKind::Progress | NotificationKind::SeriesProgress => "\u{00b7}",
        };
        eprintln!("{} {}", prefix, notification);
    }
}
