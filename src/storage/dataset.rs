//! Cached reference tables and the refresh policy.
//!
//! Tables live as plain files in one directory next to a `_file_list.json`
//! manifest recording when each file was last fetched. The publisher's
//! `Last_update.csv` marker decides whether anything changed remotely.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;
use crate::fetch::DatasetSource;
use crate::reference::csv::{self as tables, LAST_UPDATE, TABLES};
use crate::reference::ReferenceData;

/// Manifest file name inside the dataset directory.
pub const MANIFEST: &str = "_file_list.json";

/// Fetch time of each cached file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(flatten)]
    files: BTreeMap<String, DateTime<Utc>>,
}

impl Manifest {
    /// Read a manifest; a missing or corrupt file yields an empty one.
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&contents) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt manifest");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn record(&mut self, file: &str, at: DateTime<Utc>) {
        self.files.insert(file.to_string(), at);
    }

    pub fn fetched_at(&self, file: &str) -> Option<DateTime<Utc>> {
        self.files.get(file).copied()
    }

    /// True if the file was never fetched or was fetched longer than `ttl` ago.
    pub fn is_stale(&self, file: &str, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.fetched_at(file) {
            Some(at) => {
                let age = now.signed_duration_since(at);
                age.num_seconds() > ttl.as_secs() as i64
            }
            None => true,
        }
    }
}

/// When to re-fetch.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Maximum age of a cached table once the remote marker changed
    pub ttl: Duration,
    /// Minimum time between remote marker checks
    pub check_interval: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(86_400),
            check_interval: Duration::from_secs(600),
        }
    }
}

/// What one refresh did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// The remote marker was consulted
    pub checked_remote: bool,
    /// The remote marker differs from the cached one
    pub marker_changed: bool,
    pub fetched: Vec<String>,
    /// Files whose fetch failed and whose cached copy was kept
    pub kept_cached: Vec<String>,
}

impl RefreshReport {
    /// True if any table (not only the marker) was replaced.
    pub fn tables_changed(&self) -> bool {
        self.fetched.iter().any(|f| f != LAST_UPDATE)
    }
}

/// Local cache of the reference tables.
pub struct DatasetStore {
    dir: PathBuf,
    policy: RefreshPolicy,
    last_check: Mutex<Option<Instant>>,
}

impl DatasetStore {
    pub fn new(dir: PathBuf, policy: RefreshPolicy) -> Self {
        Self {
            dir,
            policy,
            last_check: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True if every table has a cached copy.
    pub fn has_cache(&self) -> bool {
        TABLES.iter().all(|t| self.dir.join(t).exists())
    }

    /// Build a snapshot from the cached tables.
    pub fn load(&self) -> Result<ReferenceData, StorageError> {
        Ok(tables::load_dir(&self.dir)?)
    }

    /// Bring the cache up to date.
    ///
    /// With no cached marker (first run) or `force`, every file is fetched.
    /// Otherwise the remote marker is checked at most once per check
    /// interval; if it changed, tables older than the TTL are re-fetched.
    /// Tables missing locally are always fetched. A failed fetch keeps the
    /// cached copy; with no cached copy it is an error.
    pub async fn refresh(
        &self,
        source: &dyn DatasetSource,
        force: bool,
    ) -> Result<RefreshReport, StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let manifest_path = self.dir.join(MANIFEST);
        let mut manifest = Manifest::load(&manifest_path);
        let mut report = RefreshReport::default();
        let marker_path = self.dir.join(LAST_UPDATE);

        let first_run = !marker_path.exists();
        let fetch_all = force || first_run;
        if fetch_all {
            info!(force, first_run, source = source.name(), "Fetching full reference dataset");
        } else if !self.due_for_check() {
            debug!("Remote check skipped, checked recently");
            return self.fetch_missing(source, &mut manifest, &manifest_path, report).await;
        }

        self.mark_checked();
        report.checked_remote = true;

        let old_marker = read_marker(&marker_path);
        let marker_result = self
            .fetch_file(source, LAST_UPDATE, &mut manifest, &mut report)
            .await;
        if let Err(e) = marker_result {
            // The marker is advisory; tables can still be fetched without it.
            warn!(error = %e, "Update marker unavailable");
        }
        let new_marker = read_marker(&marker_path);
        report.marker_changed = old_marker != new_marker;

        let now = Utc::now();
        for table in TABLES {
            let missing = !self.dir.join(table).exists();
            let stale = report.marker_changed && manifest.is_stale(table, self.policy.ttl, now);
            if fetch_all || missing || stale {
                let result = self
                    .fetch_file(source, table, &mut manifest, &mut report)
                    .await;
                if let Err(e) = result {
                    manifest.save(&manifest_path)?;
                    return Err(e);
                }
            }
        }
        manifest.save(&manifest_path)?;

        if report.marker_changed && !fetch_all {
            info!(
                old = ?old_marker,
                new = ?new_marker,
                fetched = report.fetched.len(),
                "Reference dataset updated"
            );
        } else {
            debug!(fetched = report.fetched.len(), "Reference dataset checked");
        }
        Ok(report)
    }

    async fn fetch_missing(
        &self,
        source: &dyn DatasetSource,
        manifest: &mut Manifest,
        manifest_path: &Path,
        mut report: RefreshReport,
    ) -> Result<RefreshReport, StorageError> {
        for table in TABLES {
            if !self.dir.join(table).exists() {
                let result = self.fetch_file(source, table, manifest, &mut report).await;
                if let Err(e) = result {
                    manifest.save(manifest_path)?;
                    return Err(e);
                }
            }
        }
        if !report.fetched.is_empty() {
            manifest.save(manifest_path)?;
        }
        Ok(report)
    }

    async fn fetch_file(
        &self,
        source: &dyn DatasetSource,
        file: &str,
        manifest: &mut Manifest,
        report: &mut RefreshReport,
    ) -> Result<(), StorageError> {
        let path = self.dir.join(file);
        match source.fetch(file).await {
            Ok(bytes) => {
                write_atomic(&path, &bytes)?;
                manifest.record(file, Utc::now());
                report.fetched.push(file.to_string());
                info!(file, bytes = bytes.len(), "Updated");
                Ok(())
            }
            Err(e) if path.exists() => {
                warn!(file, error = %e, "Fetch failed, keeping cached copy");
                report.kept_cached.push(file.to_string());
                Ok(())
            }
            Err(e) => Err(StorageError::Unavailable {
                file: file.to_string(),
                source: e,
            }),
        }
    }

    fn due_for_check(&self) -> bool {
        match *self.lock_last_check() {
            Some(at) => at.elapsed() >= self.policy.check_interval,
            None => true,
        }
    }

    fn mark_checked(&self) {
        *self.lock_last_check() = Some(Instant::now());
    }

    fn lock_last_check(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.last_check
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_marker(path: &Path) -> Option<String> {
    std::fs::read(path)
        .ok()
        .and_then(|bytes| tables::parse_last_update(&bytes))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = path.with_extension("part");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
