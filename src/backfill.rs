//! Backfill of dates and descriptions for existing entries.
//!
//! Selection decides per entry which requested fields need work; every
//! selected entry is fetched exactly once and both fields are derived
//! from that one page snapshot. While an entry is being processed the
//! orchestrator owns a private working copy and writes it back with
//! [`Catalog::replace`] when done, so nothing observes a half-updated
//! entry.
//!
//! Without `force`, a second run over the same catalog selects nothing
//! that the first run resolved with a value.

use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::extract::Extractor;
use crate::models::Entry;
use crate::placeholder::has_placeholder_description;
use crate::progress::{Field, ProgressEvent, ProgressReporter};
use crate::record::sanitize_value;
use crate::validate::normalize_link;

/// Which fields to backfill.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum BackfillMode {
    Dates,
    Descriptions,
    #[default]
    Both,
}

impl BackfillMode {
    pub fn wants_dates(&self) -> bool {
        matches!(self, BackfillMode::Dates | BackfillMode::Both)
    }

    pub fn wants_descriptions(&self) -> bool {
        matches!(self, BackfillMode::Descriptions | BackfillMode::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackfillMode::Dates => "dates",
            BackfillMode::Descriptions => "descriptions",
            BackfillMode::Both => "both",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BackfillOptions {
    pub mode: BackfillMode,
    /// Re-fetch even fields that already have a value.
    pub force: bool,
    /// Normalized links; when set, only these entries are considered.
    pub url_filter: Option<HashSet<String>>,
    /// Process at most this many entries (the first N in file order).
    pub limit: Option<usize>,
    /// Pause after each fetch.
    pub delay: Duration,
}

impl BackfillOptions {
    /// Build the URL filter from raw user input.
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = urls
            .into_iter()
            .map(|u| normalize_link(u.as_ref()).to_string())
            .collect();
        self.url_filter = (!set.is_empty()).then_some(set);
        self
    }
}

pub fn needs_date(entry: &Entry, force: bool) -> bool {
    force || entry.date.trim().is_empty()
}

pub fn needs_description(entry: &Entry, force: bool) -> bool {
    if force {
        return true;
    }
    entry.description.trim().is_empty() || has_placeholder_description(entry)
}

fn needs_work(entry: &Entry, options: &BackfillOptions) -> bool {
    (options.mode.wants_dates() && needs_date(entry, options.force))
        || (options.mode.wants_descriptions() && needs_description(entry, options.force))
}

/// Indices of entries needing work before the URL filter and limit.
fn candidates(catalog: &Catalog, options: &BackfillOptions) -> Vec<usize> {
    catalog
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| needs_work(e, options))
        .map(|(i, _)| i)
        .collect()
}

/// Final working set: needing work, then the URL filter, then the limit.
pub fn select(catalog: &Catalog, options: &BackfillOptions) -> Vec<usize> {
    let mut selected = candidates(catalog, options);
    if let Some(filter) = &options.url_filter {
        selected.retain(|&i| {
            catalog
                .get(i)
                .is_some_and(|e| filter.contains(normalize_link(&e.link)))
        });
    }
    if let Some(limit) = options.limit {
        selected.truncate(limit);
    }
    selected
}

/// What happened to one backfilled field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOutcome {
    Found(String),
    /// The page was fetched (or failed to fetch) and yielded nothing; the
    /// field was cleared.
    NotFound,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryOutcome {
    pub index: usize,
    pub link: String,
    pub fetched: bool,
    pub date: Option<FieldOutcome>,
    pub description: Option<FieldOutcome>,
}

impl EntryOutcome {
    fn improved(&self) -> bool {
        matches!(self.date, Some(FieldOutcome::Found(_)))
            || matches!(self.description, Some(FieldOutcome::Found(_)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct BackfillReport {
    pub mode: BackfillMode,
    pub total: usize,
    /// Entries needing work before the URL filter and limit.
    pub candidates: usize,
    pub selected: usize,
    /// Entries where at least one requested field got a value.
    pub updated: usize,
    /// Entries where no requested field could be improved.
    pub failed: usize,
    /// Whether any field value in the catalog differs from before the run.
    pub changed: bool,
    pub outcomes: Vec<EntryOutcome>,
}

impl BackfillReport {
    pub fn print(&self, options: &BackfillOptions) {
        println!("backfill ({})", self.mode.as_str());
        println!("  entries total: {}", self.total);
        if options.force {
            println!("  force: re-fetching all");
        } else {
            println!("  already complete: {}", self.total - self.candidates);
        }
        if let Some(filter) = &options.url_filter {
            println!("  url filter: {} url(s)", filter.len());
        }
        if let Some(limit) = options.limit {
            println!("  limit: {}", limit);
        }
        println!("  processed: {}", self.selected);
        println!("  updated: {}", self.updated);
        println!("  could not improve: {}", self.failed);
    }
}

/// Derive a date and/or description for one entry from a single fetch.
async fn process_entry(
    mut working: Entry,
    index: usize,
    extractor: &dyn Extractor,
    options: &BackfillOptions,
    progress: &dyn ProgressReporter,
) -> (Entry, EntryOutcome) {
    let url = working.link.clone();
    let wants_date = options.mode.wants_dates() && needs_date(&working, options.force);
    let wants_desc =
        options.mode.wants_descriptions() && needs_description(&working, options.force);

    let raw = extractor.fetch(&url).await;
    let mut outcome = EntryOutcome {
        index,
        link: url.clone(),
        fetched: raw.is_some(),
        date: None,
        description: None,
    };

    if wants_date {
        let date = raw
            .as_deref()
            .and_then(|r| extractor.extract_metadata(r).date)
            .map(|d| sanitize_value(d.trim()))
            .filter(|d| !d.is_empty());
        working.date = date.clone().unwrap_or_default();
        progress.report(ProgressEvent::FieldResult {
            url: url.clone(),
            field: Field::Date,
            value: date.clone(),
        });
        outcome.date = Some(date.map_or(FieldOutcome::NotFound, FieldOutcome::Found));
    }

    if wants_desc {
        let desc = raw
            .as_deref()
            .and_then(|r| extractor.extract_summary(r))
            .map(|d| sanitize_value(d.trim()))
            .filter(|d| !d.is_empty());
        working.description = desc.clone().unwrap_or_default();
        progress.report(ProgressEvent::FieldResult {
            url: url.clone(),
            field: Field::Description,
            value: desc.clone(),
        });
        outcome.description = Some(desc.map_or(FieldOutcome::NotFound, FieldOutcome::Found));
    }

    (working, outcome)
}

/// Backfill the selected entries in place. Never touches disk.
pub async fn run_backfill(
    catalog: &mut Catalog,
    extractor: &dyn Extractor,
    options: &BackfillOptions,
    progress: &dyn ProgressReporter,
) -> Result<BackfillReport> {
    let selected = select(catalog, options);
    let mut report = BackfillReport {
        mode: options.mode,
        total: catalog.len(),
        candidates: candidates(catalog, options).len(),
        selected: selected.len(),
        ..Default::default()
    };

    let total = selected.len() as u64;
    for (n, index) in selected.into_iter().enumerate() {
        let Some(original) = catalog.get(index).cloned() else {
            continue;
        };
        progress.report(ProgressEvent::Fetching {
            n: n as u64 + 1,
            total,
            url: original.link.clone(),
        });

        let (working, outcome) =
            process_entry(original.clone(), index, extractor, options, progress).await;

        if outcome.improved() {
            report.updated += 1;
        } else {
            report.failed += 1;
            tracing::debug!(url = %outcome.link, fetched = outcome.fetched, "could not improve entry");
        }
        if working != original {
            report.changed = true;
            catalog.replace(index, working)?;
        }
        report.outcomes.push(outcome);

        tokio::time::sleep(options.delay).await;
    }

    Ok(report)
}
