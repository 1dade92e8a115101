//! Identifier list files.
//!
//! One identifier per line is the usual form. A single comma- or
//! whitespace-separated line (the shape of a PDB "current entries" export) is
//! accepted too. `#` starts a comment. Identifiers are trimmed and upper-cased,
//! and repeats are dropped keeping the first occurrence.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,;]+").expect("valid separator regex"));

/// Parse identifiers from the text of a list file.
#[must_use]
pub fn parse_identifiers(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for line in text.lines() {
        let content = line.split('#').next().unwrap_or_default();
        for token in SEPARATORS.split(content) {
            if token.is_empty() {
                continue;
            }
            let id = token.to_ascii_uppercase();
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }
    out
}

/// Read and parse an identifier list file.
///
/// # Errors
/// Returns an error if the file cannot be read as UTF-8.
pub fn read_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_identifiers(&text))
}
