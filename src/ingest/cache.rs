// The merged dataset, stored on disk between runs.

use std::path::{Path, PathBuf};

use election_records::dataset_digest;
use serde::{Deserialize, Serialize};

use crate::ingest::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// SHA-256 of the records, checked when the entry is read back.
    pub digest: String,
    pub records: Vec<ElectionRecord>,
}

pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("electoral-map-data")
        .join("dataset.json")
}

pub fn cache_path(settings: &CacheSettings) -> PathBuf {
    settings
        .path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(default_cache_path)
}

fn read_entry(path: &Path) -> IngestResult<CacheEntry> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: p })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu {})
}

/// The cached records, if the cache holds a valid entry for `key`.
pub fn load(path: &Path, key: &str) -> Option<Vec<ElectionRecord>> {
    let entry = match read_entry(path) {
        Ok(entry) => entry,
        Err(e) => {
            debug!("cache::load: {}: {}", path.display(), e);
            return None;
        }
    };
    if entry.key != key {
        info!(
            "cache::load: stale entry (key {:?}, expected {:?})",
            entry.key, key
        );
        return None;
    }
    match dataset_digest(&entry.records) {
        Ok(digest) if digest == entry.digest => {
            info!(
                "cache::load: {} records from {}",
                entry.records.len(),
                path.display()
            );
            Some(entry.records)
        }
        _ => {
            warn!("cache::load: {}: digest mismatch, ignoring", path.display());
            None
        }
    }
}

pub fn store(path: &Path, key: &str, records: &[ElectionRecord]) -> IngestResult<()> {
    let p = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WritingSnafu { path: p.clone() })?;
    }
    let entry = CacheEntry {
        key: key.to_string(),
        digest: dataset_digest(records).context(ParsingJsonSnafu {})?,
        records: records.to_vec(),
    };
    let js = serde_json::to_string(&entry).context(ParsingJsonSnafu {})?;
    fs::write(path, js).context(WritingSnafu { path: p.clone() })?;
    debug!("cache::store: {} records to {}", records.len(), p);
    Ok(())
}
