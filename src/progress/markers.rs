//! Segment markers in a note body
//!
//! A segment is a Markdown task line carrying the marker text:
//!
//! ```text
//! - [x] Lecture 1, part 1 #segment
//! - [ ] Lecture 1, part 2 #segment
//! ```
//!
//! Both counts come from one pattern; only the checkbox state token differs.

use regex::Regex;
use serde::Serialize;

/// Default marker text
pub const DEFAULT_MARKER: &str = "#segment";

/// Matches any checkbox state, including unchecked
const ANY_STATE: &str = ".";

const COMPLETED_STATE: &str = "[xX]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SegmentCounts {
    pub total: u32,
    pub completed: u32,
}

#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: String,
    any: Regex,
    completed: Regex,
}

impl MarkerScanner {
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            marker: marker.to_string(),
            any: Regex::new(&marker_pattern(ANY_STATE, marker))?,
            completed: Regex::new(&marker_pattern(COMPLETED_STATE, marker))?,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn scan(&self, text: &str) -> SegmentCounts {
        SegmentCounts {
            total: count(&self.any, text),
            completed: count(&self.completed, text),
        }
    }
}

fn marker_pattern(state: &str, marker: &str) -> String {
    format!(r"(?m)^[ \t]*[-*+] \[{}\] .*{}", state, regex::escape(marker))
}

fn count(re: &Regex, text: &str) -> u32 {
    u32::try_from(re.find_iter(text).count()).unwrap_or(u32::MAX)
}
