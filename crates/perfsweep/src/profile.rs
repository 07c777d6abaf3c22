//! Counter profile files.
//!
//! A profiled executable leaves a plain-text profile in its working
//! directory after every trial:
//!
//! ```text
//! // Verbose: 1
//! <counter-count>
//! <key1> <value1>
//! <key2> <value2>
//! ```
//!
//! This module parses that format, writes aggregated summaries back in the
//! same format, and reads/writes the JSON detail report that accompanies an
//! aggregated summary.

use crate::aggregator::{AggregateSummary, DetailReport};
use crate::result::{HarnessError, HarnessResult};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Literal first line of every profile file
pub const VERSION_MARKER: &str = "// Verbose: 1";

/// Profile written by the executable (and by the aggregate phase)
pub const PROFILE_FILE: &str = "current_profile.txt";

/// Detail report written by the aggregate phase
pub const DETAIL_FILE: &str = "current_profile_detailed.json";

/// Counters emitted by a single trial, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    counters: Vec<(String, i64)>,
    declared_count: usize,
}

impl Profile {
    /// Create an empty profile
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a profile from ordered `(key, value)` pairs
    #[must_use]
    pub fn from_counters<K: Into<String>>(counters: impl IntoIterator<Item = (K, i64)>) -> Self {
        let mut profile = Self::new();
        for (key, value) in counters {
            profile.insert(key, value);
        }
        profile.declared_count = profile.len();
        profile
    }

    /// Set a counter. A repeated key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: i64) {
        let key = key.into();
        if let Some(slot) = self.counters.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.counters.push((key, value));
        }
    }

    /// Look up a counter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<i64> {
        self.counters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Counter keys in file order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counters.iter().map(|(k, _)| k.as_str())
    }

    /// Ordered `(key, value)` pairs
    #[must_use]
    pub fn counters(&self) -> &[(String, i64)] {
        &self.counters
    }

    /// Number of distinct counters
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// True when no counters were recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Count declared on the second line of the file (informational)
    #[must_use]
    pub const fn declared_count(&self) -> usize {
        self.declared_count
    }

    /// True when both profiles carry exactly the same key set
    #[must_use]
    pub fn same_keys(&self, other: &Self) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.get(k).is_some())
    }
}

/// Parse a profile file from disk
pub fn parse(path: &Path) -> HarnessResult<Profile> {
    let content = read_text(path)?;
    parse_str(&content, path)
}

/// Read a report file as text; bytes that are not UTF-8 are a format error
pub(crate) fn read_text(path: &Path) -> HarnessResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => HarnessError::format(path, "file is not valid UTF-8"),
        _ => HarnessError::Io(e),
    })
}

/// Parse profile text. `path` is only used for diagnostics.
pub fn parse_str(content: &str, path: &Path) -> HarnessResult<Profile> {
    let mut lines = content.lines();

    match lines.next() {
        Some(first) if first.trim_end() == VERSION_MARKER => {}
        Some(first) => {
            return Err(HarnessError::format(
                path,
                format!("expected `{VERSION_MARKER}` on line 1, found `{first}`"),
            ))
        }
        None => return Err(HarnessError::format(path, "file is empty")),
    }

    let declared_count = match lines.next() {
        Some(line) => line.trim().parse::<usize>().map_err(|_| {
            HarnessError::format(path, format!("line 2 is not a counter count: `{line}`"))
        })?,
        None => return Err(HarnessError::format(path, "missing counter count on line 2")),
    };

    let mut profile = Profile {
        counters: Vec::with_capacity(declared_count),
        declared_count,
    };
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = parse_counter_line(line, idx + 3, path)?;
        profile.insert(key, value);
    }

    Ok(profile)
}

/// Split one `key value` data line
pub(crate) fn parse_counter_line(
    line: &str,
    line_no: usize,
    path: &Path,
) -> HarnessResult<(String, i64)> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => {
            let value = value.parse::<i64>().map_err(|_| {
                HarnessError::format(
                    path,
                    format!("line {line_no}: `{value}` is not a base-10 integer"),
                )
            })?;
            Ok((key.to_string(), value))
        }
        _ => Err(HarnessError::format(
            path,
            format!("line {line_no}: expected `key value`, found `{line}`"),
        )),
    }
}

/// Render counters in profile format
#[must_use]
pub fn render<'a>(counters: impl ExactSizeIterator<Item = (&'a str, i64)>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{VERSION_MARKER}");
    let _ = writeln!(out, "{}", counters.len());
    for (key, value) in counters {
        let _ = writeln!(out, "{key} {value}");
    }
    out
}

/// Write an aggregated summary. Keys keep the first trial's order.
pub fn write_summary(path: &Path, summary: &AggregateSummary) -> HarnessResult<()> {
    let text = render(summary.means().iter().map(|(k, v)| (k.as_str(), *v)));
    fs::write(path, text)?;
    Ok(())
}

/// Write the per-trial detail report as JSON
pub fn write_detail(path: &Path, detail: &DetailReport) -> HarnessResult<()> {
    let json = serde_json::to_string(detail)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a detail report written by [`write_detail`]
pub fn read_detail(path: &Path) -> HarnessResult<DetailReport> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|e| HarnessError::format(path, e.to_string()))
}
