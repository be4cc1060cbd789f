//! Dedup ledger: the set of posting urls already published.
//!
//! Persisted as a sorted, pretty-printed JSON array of strings. A missing
//! file is the cold-start state and loads as empty. Saves go through a
//! temporary file in the same directory and an atomic rename.

use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    urls: BTreeSet<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`, or an empty ledger when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "[LEDGER] No ledger file, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let urls: Vec<String> =
            serde_json::from_str(&content).map_err(|source| LedgerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let ledger: Self = urls.into_iter().collect();
        info!(path = %path.display(), entries = ledger.len(), "[LEDGER] Loaded");
        Ok(ledger)
    }

    /// Overwrite `path` with the full ledger, sorted.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let write_err = |source: std::io::Error| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        };

        let urls: Vec<&str> = self.urls.iter().map(String::as_str).collect();
        let mut json = serde_json::to_string_pretty(&urls).map_err(|e| write_err(e.into()))?;
        json.push('\n');

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!(path = %path.display(), entries = self.len(), "[LEDGER] Saved");
        Ok(())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Record `url`; returns false when it was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}
