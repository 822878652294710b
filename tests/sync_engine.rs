//! End-to-end runs of the catalog engine against an in-memory extractor.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use resource_catalog::add::run_add_urls;
use resource_catalog::backfill::{run_backfill, BackfillMode, BackfillOptions};
use resource_catalog::catalog::Catalog;
use resource_catalog::classify::classify;
use resource_catalog::extract::{extract_metadata, extract_summary, Extractor};
use resource_catalog::models::{PageMetadata, ResourceType};
use resource_catalog::placeholder::{fill_placeholders, is_placeholder};
use resource_catalog::progress::NoProgress;
use resource_catalog::validate::validate;

struct FakeWeb {
    pages: HashMap<String, String>,
    log: Mutex<Vec<String>>,
}

impl FakeWeb {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, p)| (u.to_string(), p.to_string()))
                .collect(),
            log: Mutex::new(Vec::new()),
        }
    }

    fn fetched(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for FakeWeb {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.log.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned()
    }

    fn extract_metadata(&self, raw: &str) -> PageMetadata {
        extract_metadata(raw)
    }

    fn extract_summary(&self, raw: &str) -> Option<String> {
        extract_summary(raw, 300)
    }
}

const STORE: &str = r#"---
title: "Pkg Guide"
type: "Book"
link: "https://py-pkgs.org/"
language: "Python"
category: "Packages"
description: ""
date: ""
---
title: "Gone"
type: "Blog"
link: "https://gone.example/post"
language: "Other"
category: "General"
description: "A blog — Gone."
date: ""
---
title: "Complete"
type: "Tool"
link: "https://quarto.org"
language: "Other"
category: "Publishing"
description: "Scientific and technical publishing system."
date: "2022-07"
notes: "keep me"
---
"#;

const PKG_PAGE: &str = r#"<html><head>
<title>Python Packages</title>
<meta name="description" content="Open source book about Python packaging.">
<script type="application/ld+json">{"@type":"Book","datePublished":"2022-01-15"}</script>
</head><body></body></html>"#;

fn options(mode: BackfillMode) -> BackfillOptions {
    BackfillOptions {
        mode,
        delay: Duration::ZERO,
        ..Default::default()
    }
}

#[test]
fn test_store_round_trip_is_stable() {
    let catalog = Catalog::parse(STORE);
    assert_eq!(catalog.len(), 3);
    let once = catalog.serialize();
    let twice = Catalog::parse(&once).serialize();
    assert_eq!(once, twice);
    assert!(once.contains("notes: \"keep me\""));
}

#[tokio::test]
async fn test_backfill_fills_then_settles() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("resources.txt");
    std::fs::write(&path, STORE).unwrap();

    let web = FakeWeb::new(&[("https://py-pkgs.org/", PKG_PAGE)]);
    let mut catalog = Catalog::load(&path).unwrap();
    let report = run_backfill(&mut catalog, &web, &options(BackfillMode::Both), &NoProgress)
        .await
        .unwrap();

    // "Complete" has both fields; the placeholder on "Gone" makes it eligible.
    assert_eq!(report.selected, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failed, 1);
    assert!(report.changed);
    assert_eq!(web.fetched(), vec!["https://py-pkgs.org/", "https://gone.example/post"]);

    let pkg = catalog.get(0).unwrap();
    assert_eq!(pkg.date, "2022-01-15");
    assert_eq!(pkg.description, "Open source book about Python packaging.");
    let gone = catalog.get(1).unwrap();
    assert_eq!(gone.description, "");
    assert_eq!(gone.date, "");

    catalog.save(&path).unwrap();
    let reloaded = Catalog::load(&path).unwrap();
    assert_eq!(reloaded, catalog);
    assert_eq!(reloaded.get(2).unwrap().get("notes"), Some("keep me"));

    // Dates-only second pass: the resolved entry is left alone.
    let web = FakeWeb::new(&[("https://py-pkgs.org/", PKG_PAGE)]);
    let mut again = reloaded.clone();
    let report = run_backfill(&mut again, &web, &options(BackfillMode::Dates), &NoProgress)
        .await
        .unwrap();
    assert!(!web.fetched().contains(&"https://py-pkgs.org/".to_string()));
    assert_eq!(again.get(0), reloaded.get(0));
    assert_eq!(report.updated, 0);
}

#[tokio::test]
async fn test_add_then_validate_clean() {
    let mut catalog = Catalog::parse(STORE);
    let web = FakeWeb::new(&[(
        "https://github.com/rust-lang/rust",
        "<html><head><title>rust-lang/rust</title></head></html>",
    )]);
    let urls: Vec<String> = [
        "https://quarto.org/",
        "https://github.com/rust-lang/rust",
        "https://github.com/rust-lang/rust/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let report = run_add_urls(&mut catalog, &urls, &web, Duration::ZERO, 120, &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.added.len(), 1);
    assert_eq!(web.fetched(), vec!["https://github.com/rust-lang/rust"]);
    let added = catalog.get(3).unwrap();
    assert_eq!(added.title, "rust-lang/rust");
    assert_eq!(added.resource_type, "Repository");

    let report = validate(catalog.entries());
    assert!(report.duplicates.is_empty());
    assert!(report.issues.is_empty());
}

#[test]
fn test_classification_examples() {
    let c = classify("https://huggingface.co/blog/x");
    assert_eq!(c.resource_type, ResourceType::Blog);
    assert_eq!(c.language, "Python");
    assert_eq!(c.category, "Machine Learning");

    let c = classify("https://gist.github.com/abc");
    assert_eq!(c.resource_type, ResourceType::Repository);

    let c = classify("https://unknown.example/");
    assert_eq!(c.resource_type, ResourceType::Website);
    assert_eq!(c.language, "Other");
    assert_eq!(c.category, "General");
}

#[test]
fn test_placeholders_are_replaceable() {
    let mut catalog = Catalog::parse(STORE);
    assert_eq!(fill_placeholders(&mut catalog).unwrap(), 1);
    assert!(is_placeholder(&catalog.get(0).unwrap().description));
    assert!(!is_placeholder(&catalog.get(2).unwrap().description));
}
