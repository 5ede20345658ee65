use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{ScanRecord, ScanSummary};

/// What the dashboard reads back instead of re-scanning: one JSON document
/// per domain with the summary and the full result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub domain: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ScanSummary,
    pub results: Vec<ScanRecord>,
}

/// Snapshot cache keyed by domain. Saves persist to `<dir>/<domain>.json`;
/// loads hit the in-memory index first so repeated reads within one process
/// skip the filesystem.
pub struct SnapshotStore {
    dir: PathBuf,
    cache: RwLock<AHashMap<String, Snapshot>>,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(AHashMap::new()),
        }
    }

    pub fn path_for(&self, domain: &str) -> PathBuf {
        // Domains are used as file names; keep only safe characters.
        let safe: String = domain
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    pub fn save(&self, summary: &ScanSummary, records: &[ScanRecord]) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let snapshot = Snapshot {
            domain: summary.domain.clone(),
            generated_at: Utc::now(),
            summary: summary.clone(),
            results: records.to_vec(),
        };

        let path = self.path_for(&snapshot.domain);
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)?;

        self.cache
            .write()
            .insert(snapshot.domain.clone(), snapshot);
        Ok(path)
    }

    pub fn load(&self, domain: &str) -> Option<Snapshot> {
        if let Some(snapshot) = self.cache.read().get(domain) {
            return Some(snapshot.clone());
        }
        let raw = fs::read_to_string(self.path_for(domain)).ok()?;
        let snapshot: Snapshot = serde_json::from_str(&raw).ok()?;
        self.cache
            .write()
            .insert(domain.to_string(), snapshot.clone());
        Some(snapshot)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
