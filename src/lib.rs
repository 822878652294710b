//! # Resource Catalog
//!
//! Maintenance engine for a curated catalog of learning resources stored
//! as a flat `resources.txt` record file.
//!
//! The catalog is loaded, validated, enriched from the web (publication
//! dates and descriptions), extended with new URLs, and written back
//! atomically. Page fetching and the note inbox sit behind traits so the
//! orchestration runs against stubs in tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ record codec │──▶│   Catalog     │◀──│  validator    │
//! │ parse/serial │   │ load / save  │   │ dups + fields │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │
//!         ┌─────────────────┼──────────────────┐
//!         ▼                 ▼                  ▼
//!   ┌──────────┐      ┌──────────┐       ┌──────────┐
//!   │ backfill │      │   add    │       │  inbox   │
//!   └────┬─────┘      └────┬─────┘       └────┬─────┘
//!        └──────────┬──────┴──────────────────┘
//!                   ▼
//!         ┌──────────────────┐
//!         │ Extractor (HTTP) │
//!         └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rescat validate --fix-duplicates
//! rescat backfill --mode dates --limit 20
//! rescat add https://example.com/post --dry-run
//! rescat inbox --note inbox.txt --summary-file summary.md
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Entry, resource types, classification |
//! | [`record`] | `resources.txt` parser and serializer |
//! | [`catalog`] | In-memory catalog, atomic persistence |
//! | [`validate`] | Duplicate and field checks |
//! | [`classify`] | URL classification and title inference |
//! | [`placeholder`] | Generated descriptions and their detection |
//! | [`extract`] | Page fetching and metadata extraction |
//! | [`backfill`] | Date/description backfill orchestration |
//! | [`add`] | Adding new URLs |
//! | [`inbox`] | Note inbox sync |
//! | [`progress`] | Per-URL progress on stderr |
//! | [`config`] | TOML configuration and path resolution |

pub mod add;
pub mod backfill;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod extract;
pub mod inbox;
pub mod models;
pub mod placeholder;
pub mod progress;
pub mod record;
pub mod validate;
