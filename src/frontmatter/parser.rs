//! Tokenizing parser for the frontmatter block

use super::document::Document;
use super::value::{Frontmatter, Record, Scalar, Value};
use super::{FormatError, Result};

/// Parse the block at the head of `text`.
///
/// Text without an opening delimiter has an empty block.
pub fn parse(text: &str) -> Result<Frontmatter> {
    Document::parse(text).map(|doc| doc.frontmatter)
}

/// Parse the lines between the delimiters.
///
/// `first_line` is the 1-based line number of the first inner line, used
/// for error positions.
pub fn parse_block(inner: &str, first_line: usize) -> Result<Frontmatter> {
    let lines: Vec<Line> = inner
        .lines()
        .enumerate()
        .map(|(i, raw)| Line::new(first_line + i, raw))
        .filter(|line| !line.text.is_empty() && !line.text.starts_with('#'))
        .collect();

    let mut fm = Frontmatter::new();
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if line.indent > 0 {
            return Err(FormatError::UnexpectedIndent { line: line.number });
        }
        let (key, rest) = split_key(line.text, line.number)?;
        i += 1;

        let value = if rest.is_empty() {
            let start = i;
            while i < lines.len() && lines[i].indent > 0 {
                i += 1;
            }
            if start == i {
                Value::Null
            } else {
                Value::Records(parse_records(&lines[start..i])?)
            }
        } else {
            parse_inline_value(rest, line.number)?
        };

        if fm.contains_key(key) {
            return Err(FormatError::DuplicateKey {
                line: line.number,
                key: key.to_string(),
            });
        }
        fm.insert(key, value);
    }

    Ok(fm)
}

struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn new(number: usize, raw: &'a str) -> Self {
        let trimmed = raw.trim_start();
        Self {
            number,
            indent: raw.len() - trimmed.len(),
            text: trimmed.trim_end(),
        }
    }
}

fn split_key(text: &str, line: usize) -> Result<(&str, &str)> {
    let Some((key, rest)) = text.split_once(':') else {
        return Err(FormatError::InvalidLine {
            line,
            text: text.to_string(),
        });
    };
    let key = key.trim_end();
    if !is_valid_key(key) {
        return Err(FormatError::InvalidKey {
            line,
            key: key.to_string(),
        });
    }
    Ok((key, rest.trim()))
}

fn is_valid_key(key: &str) -> bool {
    match key.chars().next() {
        None | Some('-' | '#' | '"' | '\'' | '[' | '{') => false,
        Some(_) => !key.chars().any(char::is_whitespace),
    }
}

fn parse_records(lines: &[Line]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut current: Option<PartialRecord> = None;

    for line in lines {
        let text = if line.text == "-" || line.text.starts_with("- ") {
            if let Some(done) = current.take() {
                records.push(done.finish()?);
            }
            current = Some(PartialRecord::new(line.number));
            line.text[1..].trim_start()
        } else {
            line.text
        };

        let Some(record) = current.as_mut() else {
            return Err(FormatError::UnexpectedIndent { line: line.number });
        };
        if text.is_empty() {
            continue;
        }

        let (field, raw) = split_key(text, line.number)?;
        let value = parse_record_field(raw, line.number)?;
        let slot = match field {
            "date" => &mut record.date,
            "content" => &mut record.content,
            other => {
                return Err(FormatError::UnknownRecordField {
                    line: line.number,
                    field: other.to_string(),
                })
            }
        };
        if slot.is_some() {
            return Err(FormatError::DuplicateKey {
                line: line.number,
                key: field.to_string(),
            });
        }
        *slot = Some(value);
    }

    if let Some(done) = current {
        records.push(done.finish()?);
    }
    Ok(records)
}

struct PartialRecord {
    line: usize,
    date: Option<String>,
    content: Option<String>,
}

impl PartialRecord {
    fn new(line: usize) -> Self {
        Self {
            line,
            date: None,
            content: None,
        }
    }

    fn finish(self) -> Result<Record> {
        let date = self.date.ok_or(FormatError::MissingRecordField {
            line: self.line,
            field: "date",
        })?;
        let content = self.content.ok_or(FormatError::MissingRecordField {
            line: self.line,
            field: "content",
        })?;
        Ok(Record { date, content })
    }
}

/// Record fields are always strings; quotes are optional.
fn parse_record_field(raw: &str, line: usize) -> Result<String> {
    let mut cursor = Cursor::new(raw, line);
    match cursor.peek() {
        Some('"' | '\'') => {
            let s = cursor.quoted()?;
            cursor.expect_end()?;
            Ok(s)
        }
        _ => Ok(raw.to_string()),
    }
}

fn parse_inline_value(raw: &str, line: usize) -> Result<Value> {
    let mut cursor = Cursor::new(raw, line);
    match cursor.peek() {
        Some('"' | '\'') => {
            let s = cursor.quoted()?;
            cursor.expect_end()?;
            Ok(Value::Scalar(Scalar::String(s)))
        }
        Some('[') => {
            let items = cursor.list()?;
            cursor.expect_end()?;
            Ok(Value::List(items))
        }
        _ => Ok(Value::Scalar(infer_scalar(raw))),
    }
}

/// Infer the type of an unquoted scalar from its lexical shape
pub(super) fn infer_scalar(raw: &str) -> Scalar {
    match raw {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ => parse_number(raw).unwrap_or_else(|| Scalar::String(raw.to_string())),
    }
}

pub(super) fn parse_number(raw: &str) -> Option<Scalar> {
    let bytes = raw.as_bytes();
    let digits_start = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    if !bytes.get(digits_start).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(Scalar::Integer(n));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Scalar::Float)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, line: usize) -> Self {
        Self { src, pos: 0, line }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.rest().is_empty() {
            Ok(())
        } else {
            Err(FormatError::InvalidLine {
                line: self.line,
                text: self.src.to_string(),
            })
        }
    }

    /// Read a `"..."` or `'...'` string starting at the cursor
    fn quoted(&mut self) -> Result<String> {
        let unterminated = FormatError::UnterminatedString { line: self.line };
        let quote = self.bump().ok_or_else(|| unterminated.clone())?;
        let mut out = String::new();

        loop {
            let c = self.bump().ok_or_else(|| unterminated.clone())?;
            match (quote, c) {
                ('"', '\\') => {
                    let escaped = self.bump().ok_or_else(|| unterminated.clone())?;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                ('\'', '\'') if self.peek() == Some('\'') => {
                    self.bump();
                    out.push('\'');
                }
                (q, c) if q == c => return Ok(out),
                (_, c) => out.push(c),
            }
        }
    }

    /// Read an inline `[a, "b", 3]` list starting at the cursor
    fn list(&mut self) -> Result<Vec<Scalar>> {
        let line = self.line;
        self.bump();
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(items);
        }

        loop {
            self.skip_whitespace();
            let item = match self.peek() {
                None => return Err(FormatError::UnterminatedList { line }),
                Some('[') => return Err(FormatError::NestedList { line }),
                Some('"' | '\'') => Scalar::String(self.quoted()?),
                Some(_) => {
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        match c {
                            ',' | ']' => break,
                            '[' => return Err(FormatError::NestedList { line }),
                            _ => {
                                self.bump();
                            }
                        }
                    }
                    let raw = self.src[start..self.pos].trim();
                    if raw.is_empty() {
                        return Err(FormatError::InvalidLine {
                            line,
                            text: self.src.to_string(),
                        });
                    }
                    infer_scalar(raw)
                }
            };
            items.push(item);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(items),
                None => return Err(FormatError::UnterminatedList { line }),
                Some(_) => {
                    return Err(FormatError::InvalidLine {
                        line,
                        text: self.src.to_string(),
                    })
                }
            }
        }
    }
}
