//! Rendering a mapping back into block text

use std::fmt::Write;

use super::parser::parse_number;
use super::value::{Frontmatter, Record, Scalar, Value};
use super::DELIMITER;

/// Render a mapping as a delimited block, closing delimiter included
pub fn serialize(fm: &Frontmatter) -> String {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');

    for (key, value) in fm.iter() {
        match value {
            Value::Null => {
                let _ = writeln!(out, "{}:", key);
            }
            Value::Scalar(s) => {
                let _ = writeln!(out, "{}: {}", key, render_scalar(s, false));
            }
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|s| render_scalar(s, true)).collect();
                let _ = writeln!(out, "{}: [{}]", key, rendered.join(", "));
            }
            Value::Records(records) if records.is_empty() => {
                let _ = writeln!(out, "{}: []", key);
            }
            Value::Records(records) => {
                let _ = writeln!(out, "{}:", key);
                for Record { date, content } in records {
                    let _ = writeln!(out, "  - date: {}", render_string(date, false));
                    let _ = writeln!(out, "    content: {}", render_string(content, false));
                }
            }
        }
    }

    out.push_str(DELIMITER);
    out.push('\n');
    out
}

fn render_scalar(scalar: &Scalar, in_list: bool) -> String {
    match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(n) => n.to_string(),
        // Debug keeps the fractional part (`1.0`), so the value re-parses as a float
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::String(s) => render_string(s, in_list),
    }
}

fn render_string(s: &str, in_list: bool) -> String {
    if needs_quotes(s, in_list) {
        quote(s)
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str, in_list: bool) -> bool {
    s.is_empty()
        || s.trim() != s
        || s == "true"
        || s == "false"
        || s.starts_with(['"', '\'', '[', '#'])
        || s.contains(['\n', '\r'])
        || (in_list && s.contains([',', ']', '[']))
        || parse_number(s).is_some()
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse;

    fn sample() -> Frontmatter {
        let mut fm = Frontmatter::new();
        fm.insert("reviewCount", 3u32);
        fm.insert("ratio", 1.0);
        fm.insert("autoCompleteEnabled", false);
        fm.insert("status", "reviewing");
        fm.insert("title", "Chapter 3: \"limits\"");
        fm.insert("code", "007");
        fm.insert("flag", "true");
        fm.insert("padded", " spaced ");
        fm.insert("series", Value::Null);
        fm.insert(
            "repeats",
            vec![Scalar::Integer(1), Scalar::Integer(2), Scalar::String("a, b".into())],
        );
        fm.insert("empty", Vec::<Scalar>::new());
        fm.insert(
            "feedbackHistory",
            vec![
                Record::new("2024-01-01", "Confused the \"chain rule\""),
                Record::new("2024-01-02", "42"),
                Record::new("2024-01-03", "line one\nline two"),
            ],
        );
        fm
    }

    #[test]
    fn test_round_trip() {
        let fm = sample();
        let text = serialize(&fm);
        assert_eq!(parse(&text).unwrap(), fm);
    }

    #[test]
    fn test_reserialize_is_stable() {
        let text = "---\nreviewCount: 2\nrepeats: [1, 2]\nlastReview: 2024-01-01\nfeedbackHistory:\n  - date: 2024-01-01\n    content: ok\n---\n";
        let fm = parse(text).unwrap();
        assert_eq!(serialize(&fm), text);
    }

    #[test]
    fn test_layout() {
        let mut fm = Frontmatter::new();
        fm.insert("status", "learning");
        fm.insert("repeats", vec![Scalar::Integer(1)]);
        fm.insert("reviewHistory", vec![Record::new("2024-01-01", "1m 5s")]);

        assert_eq!(
            serialize(&fm),
            "---\nstatus: learning\nrepeats: [1]\nreviewHistory:\n  - date: 2024-01-01\n    content: 1m 5s\n---\n"
        );
    }

    #[test]
    fn test_quoting_rules() {
        assert!(needs_quotes("", false));
        assert!(needs_quotes("12", false));
        assert!(needs_quotes("false", false));
        assert!(needs_quotes("[x]", false));
        assert!(needs_quotes("a,b", true));
        assert!(!needs_quotes("a,b", false));
        assert!(!needs_quotes("2024-01-01", false));
        assert_eq!(quote("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }
}
