//! Record codec for `resources.txt`.
//!
//! The store is a sequence of blocks separated by lines containing only
//! `---`. Each block holds `key: "value"` lines:
//!
//! ```text
//! ---
//! title: "R for Data Science"
//! type: "Book"
//! link: "https://r4ds.hadley.nz"
//! language: "R"
//! category: "Data Science;Tutorial"
//! description: "A book for R covering Data Science."
//! date: "2023"
//! ---
//! ```
//!
//! Parsing is lenient because the file is edited by hand: lines that do
//! not match the field pattern are skipped, and blocks without a `title`
//! are dropped. Serialization always emits every known field in
//! [`FIELD_ORDER`], followed by any unknown keys the entry carried.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Entry, FIELD_ORDER};

/// Block delimiter line.
pub const DELIMITER: &str = "---";

static FIELD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(\w+):\s+"?(.*?)"?\s*$"#).unwrap());

/// Parse the record store text into entries, in file order.
pub fn parse(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut block: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim() == DELIMITER {
            flush_block(&mut block, &mut entries);
            continue;
        }
        if let Some(caps) = FIELD_LINE.captures(line) {
            block.push((caps[1].to_string(), caps[2].to_string()));
        }
    }
    flush_block(&mut block, &mut entries);

    entries
}

fn flush_block(block: &mut Vec<(String, String)>, entries: &mut Vec<Entry>) {
    if block.is_empty() {
        return;
    }
    let has_title = block.iter().any(|(k, _)| k == "title");
    if has_title {
        let mut entry = Entry::default();
        for (key, value) in block.drain(..) {
            entry.set(&key, value);
        }
        entries.push(entry);
    }
    block.clear();
}

/// Serialize entries back to the record store format.
pub fn serialize(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for entry in entries {
        out.push_str(DELIMITER);
        out.push('\n');
        for key in FIELD_ORDER {
            push_field(&mut out, key, entry.get(key).unwrap_or(""));
        }
        for (key, value) in &entry.extra {
            push_field(&mut out, key, value);
        }
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": \"");
    out.push_str(&sanitize_value(value));
    out.push_str("\"\n");
}

/// Make a value safe for a single `key: "value"` line.
///
/// Double quotes become single quotes and line breaks collapse to one
/// space, so the parser can never mistake part of a value for the
/// closing quote or for the next line.
pub fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push('\''),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}
