//! Per-URL progress reporting.
//!
//! Backfill, add, and inbox runs emit one event per fetched URL so users
//! can follow a long run. Progress goes to **stderr** so the summary on
//! stdout stays parseable for scripts.

use std::io::Write;

/// Which field a backfill outcome refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Date,
    Description,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Description => "desc",
        }
    }
}

/// A single progress event.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// About to fetch URL `n` of `total`.
    Fetching { n: u64, total: u64, url: String },
    /// A backfilled field got a value, or was cleared when nothing was found.
    FieldResult {
        url: String,
        field: Field,
        value: Option<String>,
    },
    /// A URL was skipped without fetching.
    Skipped { url: String, reason: String },
    /// A new entry was built for a URL.
    Added {
        url: String,
        title: String,
        resource_type: String,
    },
}

/// Reports progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress: `[   3/12] date  OK   https://…  → 2021-06-15`.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Fetching { n, total, url } => {
                format!("[{:>4}/{}] FETCH {}\n", n, total, url)
            }
            ProgressEvent::FieldResult { url, field, value } => match value {
                Some(v) => format!(
                    "           {:<4}  OK    {}\n             -> {}\n",
                    field.as_str(),
                    url,
                    preview(v, 80)
                ),
                None => format!("           {:<4}  SKIP  {} (nothing found)\n", field.as_str(), url),
            },
            ProgressEvent::Skipped { url, reason } => format!("  SKIP ({}) {}\n", reason, url),
            ProgressEvent::Added {
                url,
                title,
                resource_type,
            } => format!(
                "           added {} as {} \"{}\"\n",
                url,
                resource_type,
                preview(title, 70)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Fetching { n, total, url } => serde_json::json!({
                "event": "fetching",
                "n": n,
                "total": total,
                "url": url
            }),
            ProgressEvent::FieldResult { url, field, value } => serde_json::json!({
                "event": "field",
                "url": url,
                "field": field.as_str(),
                "found": value.is_some(),
                "value": value
            }),
            ProgressEvent::Skipped { url, reason } => serde_json::json!({
                "event": "skipped",
                "url": url,
                "reason": reason
            }),
            ProgressEvent::Added {
                url,
                title,
                resource_type,
            } => serde_json::json!({
                "event": "added",
                "url": url,
                "title": title,
                "type": resource_type
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// First `max` characters of `s`, with `…` when shortened.
pub fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
