//! Last-search cache owned by the presentation side.
//!
//! An entry belongs to one session token. Loading with any other token drops
//! the stored entry and reports a miss. The pipeline itself never reads or
//! writes the cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::BookRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSearch {
    pub token: String,
    pub query: String,
    pub records: Vec<BookRecord>,
    pub stored_at: DateTime<Utc>,
}

impl CachedSearch {
    pub fn new(token: impl Into<String>, query: impl Into<String>, records: Vec<BookRecord>) -> Self {
        Self {
            token: token.into(),
            query: query.into(),
            records,
            stored_at: Utc::now(),
        }
    }
}

pub trait SearchCache {
    /// Replaces whatever was stored. Entries with a blank token or query are
    /// ignored.
    fn store(&mut self, entry: CachedSearch) -> Result<()>;

    /// Returns the stored entry if it belongs to `token`; otherwise drops it.
    fn load(&mut self, token: &str) -> Result<Option<CachedSearch>>;

    fn invalidate(&mut self) -> Result<()>;
}

fn storable(entry: &CachedSearch) -> bool {
    !entry.token.trim().is_empty() && !entry.query.trim().is_empty()
}

#[derive(Debug, Clone, Default)]
pub struct MemorySearchCache {
    entry: Option<CachedSearch>,
}

impl MemorySearchCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchCache for MemorySearchCache {
    fn store(&mut self, entry: CachedSearch) -> Result<()> {
        if storable(&entry) {
            self.entry = Some(entry);
        }
        Ok(())
    }

    fn load(&mut self, token: &str) -> Result<Option<CachedSearch>> {
        match self.entry.take() {
            Some(entry) if entry.token == token => {
                self.entry = Some(entry.clone());
                Ok(Some(entry))
            }
            Some(_) => {
                info!("session token changed, dropping cached search");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn invalidate(&mut self) -> Result<()> {
        self.entry = None;
        Ok(())
    }
}

/// Single JSON file holding the last search.
#[derive(Debug, Clone)]
pub struct FileSearchCache {
    path: PathBuf,
}

impl FileSearchCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entry(&self) -> Result<Option<CachedSearch>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable search cache");
                self.invalidate_file()?;
                Ok(None)
            }
        }
    }

    fn invalidate_file(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SearchCache for FileSearchCache {
    fn store(&mut self, entry: CachedSearch) -> Result<()> {
        if !storable(&entry) {
            debug!("not caching search without token or query");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&mut self, token: &str) -> Result<Option<CachedSearch>> {
        match self.read_entry()? {
            Some(entry) if entry.token == token => {
                info!(query = %entry.query, "restored cached search");
                Ok(Some(entry))
            }
            Some(_) => {
                info!("session token changed, dropping cached search");
                self.invalidate_file()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn invalidate(&mut self) -> Result<()> {
        self.invalidate_file()
    }
}
