use thiserror::Error;

use crate::config::ConfigError;
use crate::frontmatter::FormatError;
use crate::series::LedgerError;
use crate::store::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Announcement ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
