//! In-memory catalog store.
//!
//! Holds the ordered entries for one run. Persistence is always a
//! whole-file replace: the new content is written to a temporary file in
//! the target's directory and renamed over the original, so a failure
//! mid-write leaves the previous version intact.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::models::Entry;
use crate::record;
use crate::validate::{self, normalize_link};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Entry>,
}

impl Catalog {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn parse(text: &str) -> Self {
        Self::new(record::parse(text))
    }

    /// Read and parse the record store. A missing file is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("resources file not found: {}", path.display());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resources file: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn serialize(&self) -> String {
        record::serialize(&self.entries)
    }

    /// Atomically replace `path` with the serialized catalog.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.serialize())
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// New entries always go at the end.
    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Replace the entry at `index`, keeping its position.
    pub fn replace(&mut self, index: usize, entry: Entry) -> Result<()> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or_else(|| anyhow::anyhow!("entry index {} out of range ({} entries)", index, len))?;
        *slot = entry;
        Ok(())
    }

    /// Normalized links of every entry.
    pub fn normalized_links(&self) -> HashSet<String> {
        self.entries
            .iter()
            .map(|e| normalize_link(&e.link).to_string())
            .collect()
    }

    /// Keep the first entry of every duplicate group and drop the rest.
    /// Survivors keep their relative order. Returns the number removed.
    pub fn remove_duplicates(&mut self) -> usize {
        let drop: HashSet<usize> = validate::find_duplicates(&self.entries)
            .into_iter()
            .flat_map(|g| g.indices.into_iter().skip(1))
            .collect();
        if drop.is_empty() {
            return 0;
        }
        let before = self.entries.len();
        let mut index = 0;
        self.entries.retain(|_| {
            let keep = !drop.contains(&index);
            index += 1;
            keep
        });
        before - self.entries.len()
    }
}

/// Write `content` to `path` through a sibling temporary file.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
