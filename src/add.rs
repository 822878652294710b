//! Adding brand-new URLs to the catalog.
//!
//! Candidates are deduplicated within the batch and against the catalog
//! (by normalized link), then each survivor is fetched once, classified,
//! and appended. Existing entries are never modified.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::classify::{classify, infer_title};
use crate::extract::Extractor;
use crate::models::Entry;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::record::sanitize_value;
use crate::validate::normalize_link;

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Pull URLs out of loosely formatted tokens (trailing punctuation,
/// surrounding whitespace), deduplicated by normalized form.
pub fn extract_urls<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim().trim_matches(['.', ',']);
        if is_http_url(token) && seen.insert(normalize_link(token).to_string()) {
            urls.push(token.to_string());
        }
    }
    urls
}

/// Read candidate URLs from a file: one per line, blank lines and `#`
/// comments ignored. Other non-URL lines are skipped with a warning.
pub fn read_urls_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URLs file: {}", path.display()))?;
    let mut urls = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if is_http_url(line) {
            urls.push(line.to_string());
        } else {
            tracing::warn!(line, "ignoring non-URL line");
        }
    }
    Ok(urls)
}

/// Fetch once and build a complete entry for a URL not yet in the catalog.
pub async fn build_entry(url: &str, extractor: &dyn Extractor, max_title_chars: usize) -> Entry {
    let raw = extractor.fetch(url).await;
    let meta = raw
        .as_deref()
        .map(|r| extractor.extract_metadata(r))
        .unwrap_or_default();
    let summary = raw.as_deref().and_then(|r| extractor.extract_summary(r));
    let class = classify(url);

    let mut entry = Entry::new(
        sanitize_value(&infer_title(url, meta.title.as_deref(), max_title_chars)),
        class.resource_type,
        url,
        class.language,
        class.category,
    );
    entry.description = summary.map(|s| sanitize_value(s.trim())).unwrap_or_default();
    entry.date = meta.date.unwrap_or_default();
    entry
}

#[derive(Clone, Debug, Default)]
pub struct AddReport {
    pub provided: usize,
    pub after_batch_dedup: usize,
    pub skipped_in_batch: Vec<String>,
    pub skipped_existing: Vec<String>,
    pub added: Vec<String>,
}

impl AddReport {
    pub fn print(&self) {
        println!("add");
        println!("  provided: {}", self.provided);
        println!("  after batch dedup: {}", self.after_batch_dedup);
        println!("  already in catalog: {}", self.skipped_existing.len());
        println!("  added: {}", self.added.len());
        println!("  skipped: {}", self.provided - self.added.len());
    }
}

/// Append entries for every new URL in `urls`. Never touches disk.
pub async fn run_add_urls(
    catalog: &mut Catalog,
    urls: &[String],
    extractor: &dyn Extractor,
    delay: Duration,
    max_title_chars: usize,
    progress: &dyn ProgressReporter,
) -> Result<AddReport> {
    let mut report = AddReport {
        provided: urls.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let mut batch = Vec::new();
    for url in urls {
        let url = url.trim();
        if seen.insert(normalize_link(url).to_string()) {
            batch.push(url.to_string());
        } else {
            progress.report(ProgressEvent::Skipped {
                url: url.to_string(),
                reason: "dup in batch".to_string(),
            });
            report.skipped_in_batch.push(url.to_string());
        }
    }
    report.after_batch_dedup = batch.len();

    let known = catalog.normalized_links();
    let mut fresh = Vec::new();
    for url in batch {
        if known.contains(normalize_link(&url)) {
            progress.report(ProgressEvent::Skipped {
                url: url.clone(),
                reason: "already exists".to_string(),
            });
            report.skipped_existing.push(url);
        } else {
            fresh.push(url);
        }
    }

    let total = fresh.len() as u64;
    for (n, url) in fresh.into_iter().enumerate() {
        progress.report(ProgressEvent::Fetching {
            n: n as u64 + 1,
            total,
            url: url.clone(),
        });
        let entry = build_entry(&url, extractor, max_title_chars).await;
        progress.report(ProgressEvent::Added {
            url: url.clone(),
            title: entry.title.clone(),
            resource_type: entry.resource_type.clone(),
        });
        catalog.append(entry);
        report.added.push(url);

        tokio::time::sleep(delay).await;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::stub::StubExtractor;
    use crate::progress::tests::Recorder;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn existing(link: &str) -> Entry {
        Entry {
            title: "Existing".to_string(),
            resource_type: "Website".to_string(),
            link: link.to_string(),
            description: "Old.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_urls() {
        let urls = extract_urls([
            " https://a.com, ",
            "1.",
            "https://a.com/.",
            "ftp://nope",
            "http://b.org",
        ]);
        assert_eq!(urls, vec!["https://a.com", "http://b.org"]);
    }

    #[test]
    fn test_read_urls_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("urls.txt");
        std::fs::write(&path, "# list\n\nhttps://a.com\nnot a url\n  https://b.com  \n").unwrap();
        assert_eq!(
            read_urls_file(&path).unwrap(),
            vec!["https://a.com", "https://b.com"]
        );
    }

    #[tokio::test]
    async fn test_dedup_in_batch_and_against_catalog() {
        let mut catalog = Catalog::new(vec![existing("https://x.com")]);
        let stub = StubExtractor::default();
        let urls: Vec<String> = ["https://x.com", "https://x.com/", "https://y.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = run_add_urls(&mut catalog, &urls, &stub, Duration::ZERO, 120, &NoProgress)
            .await
            .unwrap();

        assert_eq!(report.added, vec!["https://y.com"]);
        assert_eq!(report.skipped_in_batch, vec!["https://x.com/"]);
        assert_eq!(report.skipped_existing, vec!["https://x.com"]);
        assert_eq!(stub.fetch_count(), 1);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap(), &existing("https://x.com"));
        assert_eq!(catalog.get(1).unwrap().link, "https://y.com");
    }

    #[tokio::test]
    async fn test_skips_are_reported() {
        let mut catalog = Catalog::new(vec![existing("https://x.com")]);
        let stub = StubExtractor::default();
        let recorder = Recorder::default();
        let urls = vec!["https://x.com/".to_string(), "https://x.com".to_string()];

        run_add_urls(&mut catalog, &urls, &stub, Duration::ZERO, 120, &recorder)
            .await
            .unwrap();

        let events = recorder.0.lock().unwrap();
        let reasons: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Skipped { reason, .. } => Some(reason.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(reasons, vec!["dup in batch", "already exists"]);
        assert_eq!(stub.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_new_entry_is_classified_and_filled() {
        let page = r#"<html><head><title>Tidy "Data"</title>
<meta name="description" content="Notes on tidy data.">
<meta name="date" content="2023-09-01"></head></html>"#;
        let url = "https://huggingface.co/blog/tidy-data";
        let stub = StubExtractor::default().with_page(url, page);
        let mut catalog = Catalog::default();

        run_add_urls(
            &mut catalog,
            &[url.to_string()],
            &stub,
            Duration::ZERO,
            120,
            &NoProgress,
        )
        .await
        .unwrap();

        let e = catalog.get(0).unwrap();
        assert_eq!(e.title, "Tidy 'Data'");
        assert_eq!(e.resource_type, "Blog");
        assert_eq!(e.language, "Python");
        assert_eq!(e.category, "Machine Learning");
        assert_eq!(e.description, "Notes on tidy data.");
        assert_eq!(e.date, "2023-09-01");
    }

    #[tokio::test]
    async fn test_fetch_failure_still_appends_skeleton() {
        let stub = StubExtractor::default();
        let mut catalog = Catalog::default();
        let url = "https://example.org/posts/hello-world";

        run_add_urls(
            &mut catalog,
            &[url.to_string()],
            &stub,
            Duration::ZERO,
            120,
            &NoProgress,
        )
        .await
        .unwrap();

        let e = catalog.get(0).unwrap();
        assert_eq!(e.title, "example.org — Hello World");
        assert_eq!(e.resource_type, "Blog");
        assert_eq!(e.description, "");
        assert_eq!(e.date, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_follows_failed_fetch() {
        let stub = StubExtractor::default();
        let mut catalog = Catalog::default();
        let urls = vec!["https://a.com".to_string(), "https://b.com".to_string()];

        let start = tokio::time::Instant::now();
        run_add_urls(
            &mut catalog,
            &urls,
            &stub,
            Duration::from_millis(300),
            120,
            &NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(stub.fetch_count(), 2);
        assert!(start.elapsed() >= Duration::from_millis(600));
    }
}

