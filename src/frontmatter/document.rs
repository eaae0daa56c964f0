//! Splitting a note into its frontmatter block and body

use super::parser::parse_block;
use super::value::Frontmatter;
use super::writer::serialize;
use super::{FormatError, Result, DELIMITER};

/// A note split into metadata and body.
///
/// The body is kept byte-for-byte so re-rendering only touches the block.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
    has_block: bool,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self> {
        let Some(after_open) = strip_delimiter_line(text) else {
            return Ok(Self {
                frontmatter: Frontmatter::new(),
                body: text.to_string(),
                has_block: false,
            });
        };

        let mut offset = 0;
        for line in after_open.split_inclusive('\n') {
            if line.trim_end() == DELIMITER {
                let inner = &after_open[..offset];
                let body = &after_open[offset + line.len()..];
                let frontmatter = parse_block(inner, 2)?;
                return Ok(Self {
                    frontmatter,
                    body: body.to_string(),
                    has_block: true,
                });
            }
            offset += line.len();
        }

        Err(FormatError::Unterminated)
    }

    /// Whether the source text carried a block
    pub fn has_block(&self) -> bool {
        self.has_block
    }

    pub fn render(&self) -> String {
        if !self.has_block && self.frontmatter.is_empty() {
            return self.body.clone();
        }
        let mut out = serialize(&self.frontmatter);
        out.push_str(&self.body);
        out
    }
}

/// Returns the text after an opening `---` line, if there is one
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix(DELIMITER)?;
    let (line_rest, after) = match rest.find('\n') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };
    line_rest.trim().is_empty().then_some(after)
}
