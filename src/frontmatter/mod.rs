//! Frontmatter codec
//!
//! Reads and writes the flat metadata block at the head of a note:
//!
//! ```text
//! ---
//! reviewCount: 3
//! repeats: [1, 2, 3]
//! status: reviewing
//! feedbackHistory:
//!   - date: 2024-01-01
//!     content: "Mixed up the two proofs"
//! ---
//! ```
//!
//! This is a narrow format, not YAML: scalars, inline scalar lists, and
//! `{date, content}` record sequences are the only supported shapes.

mod document;
mod parser;
mod value;
mod writer;

use thiserror::Error;

pub use document::Document;
pub use parser::{parse, parse_block};
pub use value::{Frontmatter, Record, Scalar, Value};
pub use writer::serialize;

/// Line that opens and closes the block
pub const DELIMITER: &str = "---";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("frontmatter block is never closed")]
    Unterminated,

    #[error("line {line}: expected `key: value`, found {text:?}")]
    InvalidLine { line: usize, text: String },

    #[error("line {line}: invalid key {key:?}")]
    InvalidKey { line: usize, key: String },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unterminated inline list")]
    UnterminatedList { line: usize },

    #[error("line {line}: nested lists are not supported")]
    NestedList { line: usize },

    #[error("line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },

    #[error("line {line}: unknown record field {field:?}")]
    UnknownRecordField { line: usize, field: String },

    #[error("line {line}: record is missing `{field}`")]
    MissingRecordField { line: usize, field: &'static str },

    #[error("line {line}: duplicate key {key:?}")]
    DuplicateKey { line: usize, key: String },
}

pub type Result<T> = std::result::Result<T, FormatError>;
