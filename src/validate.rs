//! Structural validation and duplicate detection.
//!
//! Validation never mutates the catalog. Duplicate removal lives on
//! [`Catalog::remove_duplicates`](crate::catalog::Catalog::remove_duplicates)
//! and is only invoked when the caller explicitly asks for it.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{Entry, ResourceType};

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}(-\d{2})?)?$").unwrap());

/// Identity key for a link: surrounding whitespace and trailing slashes removed.
pub fn normalize_link(link: &str) -> &str {
    link.trim().trim_end_matches('/')
}

/// Whether a non-empty date is `YYYY`, `YYYY-MM`, or `YYYY-MM-DD` and
/// names a real month / calendar day.
pub fn is_valid_date(date: &str) -> bool {
    if !DATE_PATTERN.is_match(date) {
        return false;
    }
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [_year] => true,
        [_year, month] => matches!(month.parse::<u32>(), Ok(1..=12)),
        [_year, _month, _day] => NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
        _ => false,
    }
}

/// Entries sharing one normalized link. Indices are 0-based, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub link: String,
    pub indices: Vec<usize>,
}

impl DuplicateGroup {
    /// Index of the entry that survives deduplication.
    pub fn kept(&self) -> usize {
        self.indices[0]
    }
}

/// One problem with one field of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub index: usize,
    pub link: String,
    pub field: &'static str,
    pub message: String,
}

/// Result of validating a catalog.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub total: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    /// Number of entries that deduplication would remove.
    pub fn extra_copies(&self) -> usize {
        self.duplicates.iter().map(|g| g.indices.len() - 1).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.issues.is_empty()
    }

    /// Print the report in the CLI's summary style.
    pub fn print(&self) {
        println!("validate");
        if self.duplicates.is_empty() {
            println!("  duplicate links: 0");
        } else {
            println!(
                "  duplicate links: {} ({} extra copies)",
                self.duplicates.len(),
                self.extra_copies()
            );
            for group in &self.duplicates {
                let positions: Vec<String> =
                    group.indices.iter().map(|i| (i + 1).to_string()).collect();
                println!(
                    "    {}  entries [{}] (keeping #{})",
                    group.link,
                    positions.join(", "),
                    group.kept() + 1
                );
            }
        }
        println!("  field issues: {}", self.issues.len());
        for issue in &self.issues {
            let link = if issue.link.is_empty() {
                format!("<entry #{}>", issue.index + 1)
            } else {
                issue.link.clone()
            };
            println!("    [{:>4}] {}", issue.index + 1, link);
            println!("           {}: {}", issue.field, issue.message);
        }
        println!("  total entries: {}", self.total);
    }
}

/// Group entries by normalized link and return groups with more than one member.
pub fn find_duplicates(entries: &[Entry]) -> Vec<DuplicateGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

    for (idx, entry) in entries.iter().enumerate() {
        let key = normalize_link(&entry.link);
        positions
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(idx);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let indices = positions.remove(key)?;
            (indices.len() > 1).then(|| DuplicateGroup {
                link: key.to_string(),
                indices,
            })
        })
        .collect()
}

/// Per-entry field checks. Checks are independent, so one entry may
/// produce several issues.
pub fn check_fields(entries: &[Entry]) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let mut push = |field: &'static str, message: String| {
            issues.push(FieldIssue {
                index,
                link: entry.link.clone(),
                field,
                message,
            });
        };

        if entry.link.trim().is_empty() {
            push("link", "missing required field: link".to_string());
        }

        let rtype = entry.resource_type.trim();
        if rtype.is_empty() {
            push("type", "type is empty".to_string());
        } else if rtype.parse::<ResourceType>().is_err() {
            push(
                "type",
                format!(
                    "unknown type '{}'; valid: {}",
                    rtype,
                    ResourceType::sorted_names().join(", ")
                ),
            );
        }

        let date = entry.date.trim();
        if !date.is_empty() && !is_valid_date(date) {
            push(
                "date",
                format!(
                    "malformed date '{}' (expected YYYY, YYYY-MM, or YYYY-MM-DD)",
                    date
                ),
            );
        }
    }

    issues
}

/// Run all checks.
pub fn validate(entries: &[Entry]) -> ValidationReport {
    ValidationReport {
        total: entries.len(),
        duplicates: find_duplicates(entries),
        issues: check_fields(entries),
    }
}
