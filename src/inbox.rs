//! Note inbox: a plain-text note whose lines are candidate entries.
//!
//! Line format, five fields separated by `" - "`:
//!
//! ```text
//! https://example.com - Resource Title - Book - R - Statistics;Tutorial
//! ```
//!
//! Invalid lines stay in the note so they can be fixed by hand; duplicates
//! and successfully added lines are removed from it.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{write_atomic, Catalog};
use crate::extract::Extractor;
use crate::models::{Entry, ResourceType};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::record::sanitize_value;
use crate::validate::normalize_link;

const SEPARATOR: &str = " - ";

/// Source of candidate lines. The sync reads the note once and writes it
/// back once with the lines that should remain.
pub trait NoteInbox {
    fn read_note(&self) -> Result<String>;
    fn write_note(&self, text: &str) -> Result<()>;
}

/// Inbox backed by a local text file.
pub struct FileInbox {
    path: PathBuf,
}

impl FileInbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NoteInbox for FileInbox {
    fn read_note(&self) -> Result<String> {
        if !self.path.exists() {
            anyhow::bail!("inbox note not found: {}", self.path.display());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read inbox note: {}", self.path.display()))
    }

    fn write_note(&self, text: &str) -> Result<()> {
        write_atomic(&self.path, text)
    }
}

/// A well-formed inbox line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxItem {
    pub url: String,
    pub title: String,
    pub resource_type: ResourceType,
    pub language: String,
    pub category: String,
}

/// Parse one note line. The error is a human-readable reason.
pub fn parse_line(line: &str) -> Result<InboxItem, String> {
    let parts: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
    let [url, title, rtype, language, category] = parts.as_slice() else {
        return Err(format!(
            "expected 5 fields separated by ' - ', got {}",
            parts.len()
        ));
    };

    if !url.to_ascii_lowercase().starts_with("http") {
        return Err(format!("field 1 does not look like a URL: {:?}", url));
    }

    let resource_type: ResourceType = rtype.parse().map_err(|_| {
        format!(
            "unknown type {:?}. Valid values: {}",
            rtype,
            ResourceType::sorted_names().join(", ")
        )
    })?;

    Ok(InboxItem {
        url: url.to_string(),
        title: title.to_string(),
        resource_type,
        language: language.to_string(),
        category: category.to_string(),
    })
}

/// A line kept in the note, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct InboxReport {
    pub lines: usize,
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
    pub invalid: Vec<InvalidLine>,
}

impl InboxReport {
    /// Note text after the sync: only the invalid lines, in order.
    pub fn remaining_note(&self) -> String {
        self.invalid
            .iter()
            .map(|l| l.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrite the note with the lines that still need attention.
    pub fn write_back(&self, inbox: &dyn NoteInbox) -> Result<()> {
        inbox.write_note(&self.remaining_note())
    }

    pub fn render_markdown(&self) -> String {
        let mut out = Vec::new();
        out.push("## Inbox Sync Summary\n".to_string());
        out.push(format!("- **Added:** {}", self.added.len()));
        out.push(format!(
            "- **Duplicates (skipped silently):** {}",
            self.duplicates.len()
        ));
        out.push(format!(
            "- **Invalid lines kept in note:** {}\n",
            self.invalid.len()
        ));

        if !self.added.is_empty() {
            out.push("### Added".to_string());
            out.extend(self.added.iter().map(|u| format!("- {}", u)));
            out.push(String::new());
        }

        if !self.invalid.is_empty() {
            out.push("### Invalid lines (still in note)".to_string());
            out.push("Fix these and they will be picked up on the next run.\n".to_string());
            out.push("| Line | Reason |".to_string());
            out.push("|---|---|".to_string());
            for line in &self.invalid {
                out.push(format!(
                    "| `{}` | {} |",
                    escape_pipes(&line.raw),
                    escape_pipes(&line.reason)
                ));
            }
            out.push(String::new());
        }

        out.join("\n")
    }

    /// Append the Markdown summary to `path`, creating it if needed.
    pub fn append_markdown(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open summary file: {}", path.display()))?;
        file.write_all(self.render_markdown().as_bytes())
            .with_context(|| format!("Failed to write summary file: {}", path.display()))?;
        Ok(())
    }

    pub fn print(&self) {
        println!("inbox");
        println!("  lines: {}", self.lines);
        println!("  added: {}", self.added.len());
        println!("  duplicates: {}", self.duplicates.len());
        println!("  invalid (kept in note): {}", self.invalid.len());
    }
}

fn escape_pipes(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Process every non-blank note line, appending new entries to `catalog`.
///
/// Neither the catalog nor the note is persisted here; the caller saves
/// the catalog first and then calls [`InboxReport::write_back`].
pub async fn run_inbox_sync(
    catalog: &mut Catalog,
    inbox: &dyn NoteInbox,
    extractor: &dyn Extractor,
    delay: Duration,
    progress: &dyn ProgressReporter,
) -> Result<InboxReport> {
    let note = inbox.read_note()?;
    let lines: Vec<&str> = note.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut report = InboxReport {
        lines: lines.len(),
        ..Default::default()
    };
    let mut known: HashSet<String> = catalog.normalized_links();

    let mut fresh = Vec::new();
    for line in &lines {
        let item = match parse_line(line) {
            Ok(item) => item,
            Err(reason) => {
                tracing::info!(line = %line, %reason, "keeping invalid inbox line");
                progress.report(ProgressEvent::Skipped {
                    url: line.to_string(),
                    reason: reason.clone(),
                });
                report.invalid.push(InvalidLine {
                    raw: line.to_string(),
                    reason,
                });
                continue;
            }
        };

        if known.insert(normalize_link(&item.url).to_string()) {
            fresh.push(item);
        } else {
            progress.report(ProgressEvent::Skipped {
                url: item.url.clone(),
                reason: "duplicate".to_string(),
            });
            report.duplicates.push(item.url);
        }
    }

    let total = fresh.len() as u64;
    for (n, item) in fresh.into_iter().enumerate() {
        progress.report(ProgressEvent::Fetching {
            n: n as u64 + 1,
            total,
            url: item.url.clone(),
        });
        let raw = extractor.fetch(&item.url).await;
        let date = raw
            .as_deref()
            .and_then(|r| extractor.extract_metadata(r).date);
        let description = raw.as_deref().and_then(|r| extractor.extract_summary(r));
        tokio::time::sleep(delay).await;

        let mut entry = Entry::new(
            sanitize_value(&item.title),
            item.resource_type,
            item.url.as_str(),
            sanitize_value(&item.language),
            sanitize_value(&item.category),
        );
        entry.description = description
            .map(|d| sanitize_value(d.trim()))
            .unwrap_or_default();
        entry.date = date.unwrap_or_default();

        progress.report(ProgressEvent::Added {
            url: item.url.clone(),
            title: entry.title.clone(),
            resource_type: entry.resource_type.clone(),
        });
        catalog.append(entry);
        report.added.push(item.url);
    }

    Ok(report)
}
