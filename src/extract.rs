//! Page fetching and metadata extraction.
//!
//! The engine talks to the web only through the [`Extractor`] trait:
//! fetch a page once, then derive a title, a publication date, and a
//! summary from the same raw HTML. Failures never cross the trait
//! boundary as errors; they are logged and reported as `None` so a batch
//! keeps going.
//!
//! [`HttpExtractor`] is the production implementation (reqwest + scraper).

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::models::PageMetadata;
use crate::validate::is_valid_date;

/// Why a fetch produced no content.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("empty response body for {0}")]
    EmptyBody(String),
}

/// Fetches pages and extracts metadata from them.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download the raw page. `None` on any network or HTTP failure.
    async fn fetch(&self, url: &str) -> Option<String>;

    /// Title and publication date found in the raw page.
    fn extract_metadata(&self, raw: &str) -> PageMetadata;

    /// A short plain-text summary of the raw page.
    fn extract_summary(&self, raw: &str) -> Option<String>;
}

/// Extractor backed by a real HTTP client.
pub struct HttpExtractor {
    client: reqwest::Client,
    max_summary_chars: usize,
}

impl HttpExtractor {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            max_summary_chars: config.max_summary_chars,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ExtractError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ExtractError::EmptyBody(url.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.fetch_page(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                None
            }
        }
    }

    fn extract_metadata(&self, raw: &str) -> PageMetadata {
        extract_metadata(raw)
    }

    fn extract_summary(&self, raw: &str) -> Option<String> {
        extract_summary(raw, self.max_summary_chars)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// HTML helpers
// ═══════════════════════════════════════════════════════════════════════

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?").unwrap());

/// Meta properties/names carrying a publication date, in priority order.
const DATE_META_KEYS: [&str; 7] = [
    "article:published_time",
    "og:published_time",
    "datepublished",
    "date",
    "dc.date",
    "dc.date.issued",
    "citation_publication_date",
];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `content` of the first `<meta>` whose `property`, `name`, or `itemprop`
/// equals `key` (case-insensitive).
fn meta_content(document: &Html, key: &str) -> Option<String> {
    let sel = selector("meta")?;
    document.select(&sel).find_map(|el| {
        let v = el.value();
        let matches = ["property", "name", "itemprop"]
            .iter()
            .filter_map(|attr| v.attr(attr))
            .any(|a| a.eq_ignore_ascii_case(key));
        if !matches {
            return None;
        }
        v.attr("content")
            .map(collapse_whitespace)
            .filter(|c| !c.is_empty())
    })
}

/// Reduce a timestamp-ish string to `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    if let Some(caps) = LEADING_DATE.captures(raw) {
        let mut date = caps[1].to_string();
        if let Some(m) = caps.get(2) {
            date.push('-');
            date.push_str(m.as_str());
            if let Some(d) = caps.get(3) {
                date.push('-');
                date.push_str(d.as_str());
            }
        }
        if is_valid_date(&date) {
            return Some(date);
        }
    }
    chrono::DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn find_json_date(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            for key in ["datePublished", "dateCreated"] {
                if let Some(d) = map.get(key).and_then(|v| v.as_str()) {
                    if let Some(norm) = normalize_date(d) {
                        return Some(norm);
                    }
                }
            }
            map.values().find_map(find_json_date)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_json_date),
        _ => None,
    }
}

fn extract_date(document: &Html) -> Option<String> {
    for key in DATE_META_KEYS {
        if let Some(d) = meta_content(document, key).and_then(|c| normalize_date(&c)) {
            return Some(d);
        }
    }

    if let Some(sel) = selector(r#"script[type="application/ld+json"]"#) {
        for el in document.select(&sel) {
            let text: String = el.text().collect();
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                if let Some(d) = find_json_date(&value) {
                    return Some(d);
                }
            }
        }
    }

    let sel = selector("time[datetime]")?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("datetime"))
        .find_map(normalize_date)
}

fn extract_title(document: &Html) -> Option<String> {
    if let Some(t) = meta_content(document, "og:title") {
        return Some(t);
    }
    let sel = selector("title")?;
    document
        .select(&sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Title and date from raw HTML.
pub fn extract_metadata(raw: &str) -> PageMetadata {
    let document = Html::parse_document(raw);
    PageMetadata {
        title: extract_title(&document),
        date: extract_date(&document),
    }
}

fn first_substantial_paragraph(root: ElementRef<'_>) -> Option<String> {
    let sel = selector("p")?;
    root.select(&sel)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .find(|t| t.chars().count() >= 80)
}

/// Truncate at a word boundary, marking the cut with `...`.
fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let budget = max_chars.saturating_sub(3);
    let cut: String = text.chars().take(budget).collect();
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > budget / 2 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches([',', ';', ':', ' ']))
}

/// Summary from description meta tags, else the first real paragraph of
/// the main content.
pub fn extract_summary(raw: &str, max_chars: usize) -> Option<String> {
    let document = Html::parse_document(raw);

    let from_meta = ["og:description", "description", "twitter:description"]
        .iter()
        .find_map(|k| meta_content(&document, k));

    let text = from_meta.or_else(|| {
        ["article", "main", "body"]
            .iter()
            .filter_map(|css| selector(css))
            .filter_map(|sel| document.select(&sel).next())
            .find_map(first_substantial_paragraph)
    })?;

    Some(truncate_words(&text, max_chars))
}
