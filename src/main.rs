//! # Resource Catalog CLI (`rescat`)
//!
//! Maintains the `resources.txt` catalog: validation and duplicate
//! removal, date/description backfill, adding new URLs, syncing a note
//! inbox, and filling placeholder descriptions.
//!
//! ## Usage
//!
//! ```bash
//! rescat --config ./config/catalog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rescat validate` | Report duplicates and field problems |
//! | `rescat backfill` | Fetch missing dates and descriptions |
//! | `rescat add <URL>...` | Classify and append new URLs |
//! | `rescat inbox` | Import lines from the note inbox |
//! | `rescat placeholders` | Generate descriptions for empty entries |
//!
//! Every command loads the catalog and prints the validation report
//! first. Commands that modify the catalog accept `--dry-run`.
//!
//! ## Catalog location
//!
//! `--catalog`, then the `RESOURCES_PATH` environment variable, then
//! `[catalog].path` in the config file, then `data/resources.txt`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use resource_catalog::add::{extract_urls, read_urls_file, run_add_urls};
use resource_catalog::backfill::{run_backfill, BackfillMode, BackfillOptions};
use resource_catalog::catalog::Catalog;
use resource_catalog::config::{self, Config, RESOURCES_PATH_ENV};
use resource_catalog::extract::HttpExtractor;
use resource_catalog::inbox::{run_inbox_sync, FileInbox};
use resource_catalog::placeholder::fill_placeholders;
use resource_catalog::progress::{ProgressMode, ProgressReporter};
use resource_catalog::validate::validate;

/// Resource Catalog CLI: keeps a curated `resources.txt` catalog tidy
/// and complete.
#[derive(Parser)]
#[command(
    name = "rescat",
    about = "Validate, backfill, and extend a curated resource catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/catalog.toml`. A missing file means built-in
    /// defaults.
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    /// Catalog file. Overrides `RESOURCES_PATH` and the config file.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Per-URL progress on stderr. Defaults to `human` on a terminal,
    /// `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check for duplicate links and invalid fields.
    Validate {
        /// Remove duplicate entries, keeping the first of each group.
        #[arg(long)]
        fix_duplicates: bool,

        /// Report what would be removed without writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch missing publication dates and descriptions.
    ///
    /// Each selected entry is fetched once; dates and descriptions come
    /// from the same page.
    Backfill {
        #[arg(long, value_enum, default_value = "both")]
        mode: BackfillMode,

        /// Re-fetch fields that already have a value.
        #[arg(long)]
        force: bool,

        /// Only consider entries with these links.
        #[arg(long, num_args = 1..)]
        urls: Vec<String>,

        /// Process at most N entries.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Classify and append URLs that are not in the catalog yet.
    Add {
        /// URLs to add. Trailing `.` and `,` are stripped.
        urls: Vec<String>,

        /// File with one URL per line (`#` comments allowed).
        #[arg(long)]
        urls_file: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Import `url - title - type - language - category` lines from a note.
    ///
    /// Added and duplicate lines are removed from the note; invalid lines
    /// stay so they can be fixed.
    Inbox {
        /// Note file. Defaults to `[inbox].path` from the config.
        #[arg(long)]
        note: Option<PathBuf>,

        /// Append a Markdown summary to this file.
        #[arg(long)]
        summary_file: Option<PathBuf>,

        /// Leave both the catalog and the note untouched.
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate placeholder descriptions for entries that have none.
    Placeholders {
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let env_path = std::env::var(RESOURCES_PATH_ENV).ok();
    let path = config::resolve_catalog_path(cli.catalog.as_deref(), env_path.as_deref(), &cfg);

    let mut catalog = Catalog::load(&path)?;
    println!("catalog: {}", path.display());
    validate(catalog.entries()).print();

    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Validate {
            fix_duplicates,
            dry_run,
        } => {
            if fix_duplicates {
                let removed = catalog.remove_duplicates();
                println!("fix duplicates");
                println!("  removed: {}", removed);
                persist(&catalog, &path, removed > 0, dry_run)?;
            }
        }
        Commands::Backfill {
            mode,
            force,
            urls,
            limit,
            dry_run,
        } => {
            let options = BackfillOptions {
                mode,
                force,
                limit,
                delay: cfg.fetch.delay(),
                ..Default::default()
            }
            .with_urls(&urls);
            let extractor = HttpExtractor::new(&cfg.fetch)?;
            let report = run_backfill(&mut catalog, &extractor, &options, progress.as_ref()).await?;
            report.print(&options);
            persist(&catalog, &path, report.changed, dry_run)?;
        }
        Commands::Add {
            urls,
            urls_file,
            dry_run,
        } => {
            run_add(&mut catalog, &path, &cfg, urls, urls_file, dry_run, progress.as_ref())
                .await?;
        }
        Commands::Inbox {
            note,
            summary_file,
            dry_run,
        } => {
            let note = note
                .or_else(|| cfg.inbox.path.clone())
                .context("No inbox note given: pass --note or set [inbox].path")?;
            let inbox = FileInbox::new(note);
            let extractor = HttpExtractor::new(&cfg.fetch)?;
            let report = run_inbox_sync(
                &mut catalog,
                &inbox,
                &extractor,
                cfg.fetch.delay(),
                progress.as_ref(),
            )
            .await?;
            report.print();
            persist(&catalog, &path, !report.added.is_empty(), dry_run)?;
            if !dry_run {
                report.write_back(&inbox)?;
                println!(
                    "  note updated: {} line(s) remaining",
                    report.invalid.len()
                );
            }
            if let Some(summary) = summary_file {
                report.append_markdown(&summary)?;
            }
        }
        Commands::Placeholders { dry_run } => {
            let filled = fill_placeholders(&mut catalog)?;
            println!("placeholders");
            println!("  filled: {}", filled);
            persist(&catalog, &path, filled > 0, dry_run)?;
        }
    }

    println!("ok");
    Ok(())
}

async fn run_add(
    catalog: &mut Catalog,
    path: &Path,
    cfg: &Config,
    mut tokens: Vec<String>,
    urls_file: Option<PathBuf>,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    if let Some(file) = urls_file {
        tokens.extend(read_urls_file(&file)?);
    }
    let urls = extract_urls(&tokens);
    if urls.is_empty() {
        println!("add");
        println!("  no URLs given");
        return Ok(());
    }

    let extractor = HttpExtractor::new(&cfg.fetch)?;
    let report = run_add_urls(
        catalog,
        &urls,
        &extractor,
        cfg.fetch.delay(),
        cfg.fetch.max_title_chars,
        progress,
    )
    .await?;
    report.print();
    persist(catalog, path, !report.added.is_empty(), dry_run)
}

/// Save the catalog when something changed, unless this is a dry run.
fn persist(catalog: &Catalog, path: &Path, changed: bool, dry_run: bool) -> Result<()> {
    if !changed {
        println!("  no changes to write");
    } else if dry_run {
        println!("  dry run: {} not written", path.display());
    } else {
        catalog.save(path)?;
        println!("  wrote {} ({} entries)", path.display(), catalog.len());
    }
    Ok(())
}
