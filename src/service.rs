//! Report generation boundary.
//!
//! [`generate_report`] is the pure pipeline: reconcile every force, evaluate
//! its rules and organize the result. [`ReportService`] wraps it with the
//! dataset cache, the upload store and the error taxonomy callers see.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::engine::EligibilityEngine;
use crate::fetch::DatasetSource;
use crate::matching::Reconciler;
use crate::models::{ProcessingOptions, ProcessingResult, Roster, RosterForce};
use crate::reference::ReferenceData;
use crate::roster::{self, RosterError};
use crate::storage::{DatasetStore, RefreshReport, StorageError, UploadStore};

/// The three failure kinds a report request can end in.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Invalid roster: {0}")]
    InvalidInput(#[from] RosterError),

    #[error("Reference data unavailable: {0}")]
    DataUnavailable(String),

    /// Details stay in the logs.
    #[error("Internal error while generating the report")]
    Internal(#[source] anyhow::Error),
}

impl ProcessError {
    /// Wrap an unexpected failure, logging its full cause chain.
    pub fn internal(err: anyhow::Error) -> Self {
        error!(error = ?err, "Report generation failed");
        ProcessError::Internal(err)
    }
}

impl From<StorageError> for ProcessError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable { .. } | StorageError::Reference(_) => {
                ProcessError::DataUnavailable(err.to_string())
            }
            other => ProcessError::internal(anyhow::Error::new(other).context("storage failure")),
        }
    }
}

/// Per-force resolution as shown by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForceSummary {
    pub catalogue: String,
    pub faction: Option<String>,
    pub detachment: Option<String>,
    pub army_of_renown: Option<String>,
    pub units: Vec<String>,
}

impl From<&RosterForce> for ForceSummary {
    fn from(force: &RosterForce) -> Self {
        Self {
            catalogue: force.catalogue_name.clone(),
            faction: force.faction.as_ref().map(|f| f.name.clone()),
            detachment: force.detachment.clone(),
            army_of_renown: force.army_of_renown.clone(),
            units: force.units.iter().map(|u| u.name.clone()).collect(),
        }
    }
}

/// Reconcile, evaluate and organize one roster against one snapshot.
pub fn generate_report(
    roster: &Roster,
    reference: &ReferenceData,
    options: &ProcessingOptions,
) -> Result<ProcessingResult, ProcessError> {
    if reference.is_empty() {
        return Err(ProcessError::DataUnavailable(
            "reference dataset is empty".to_string(),
        ));
    }

    let reconciler = Reconciler::new(reference);
    let engine = EligibilityEngine::new(reference, reconciler.detachments(), options);
    let forces: Vec<_> = reconciler
        .resolve_roster(roster)
        .into_iter()
        .map(|force| {
            let applicable = engine.evaluate(&force);
            (force, applicable)
        })
        .collect();

    let result = crate::report::organize(&forces, options);
    check_shape(&result, roster.forces.len()).map_err(ProcessError::internal)?;

    info!(
        roster = %roster.name,
        forces = result.force_count(),
        rules = result.all_rules.len(),
        "Report generated"
    );
    Ok(result)
}

fn check_shape(result: &ProcessingResult, forces: usize) -> anyhow::Result<()> {
    if result.phases.len() != forces || result.units.len() != forces {
        anyhow::bail!(
            "report has {} phase and {} unit groupings for {} forces",
            result.phases.len(),
            result.units.len(),
            forces
        );
    }
    let mut ids: Vec<&str> = result.all_rules.iter().map(|r| r.id.as_str()).collect();
    ids.dedup();
    if ids.len() != result.all_rules.len() {
        anyhow::bail!("rule list contains duplicate ids");
    }
    Ok(())
}

/// Dataset-backed report generation shared by the CLI and the HTTP API.
///
/// Requests read an immutable snapshot; a refresh builds a new snapshot and
/// swaps it in. Refreshes are single-flight.
pub struct ReportService {
    store: DatasetStore,
    source: Arc<dyn DatasetSource>,
    uploads: UploadStore,
    snapshot: RwLock<Arc<ReferenceData>>,
    refresh_lock: Mutex<()>,
}

impl ReportService {
    pub fn new(store: DatasetStore, source: Arc<dyn DatasetSource>, uploads: UploadStore) -> Self {
        Self {
            store,
            source,
            uploads,
            snapshot: RwLock::new(Arc::new(ReferenceData::default())),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The current snapshot; empty until the first load.
    pub async fn snapshot(&self) -> Arc<ReferenceData> {
        self.snapshot.read().await.clone()
    }

    /// Update the cache and swap in a new snapshot if any table changed.
    pub async fn refresh(&self, force: bool) -> Result<RefreshReport, ProcessError> {
        let _guard = self.refresh_lock.lock().await;

        let report = match self.store.refresh(self.source.as_ref(), force).await {
            Ok(report) => report,
            Err(e) if self.store.has_cache() && !force => {
                warn!(error = %e, "Dataset refresh failed, serving cached tables");
                RefreshReport::default()
            }
            Err(e) => return Err(e.into()),
        };

        let loaded = !self.snapshot.read().await.is_empty();
        if report.tables_changed() || !loaded {
            let data = self.store.load()?;
            *self.snapshot.write().await = Arc::new(data);
        }
        Ok(report)
    }

    /// Poll-on-read: refresh if due, then hand out the snapshot.
    pub async fn reference(&self) -> Result<Arc<ReferenceData>, ProcessError> {
        self.refresh(false).await?;
        Ok(self.snapshot().await)
    }

    /// Generate a report for uploaded roster bytes.
    pub async fn report(
        &self,
        bytes: &[u8],
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult, ProcessError> {
        let path = self
            .uploads
            .save(bytes)
            .context("failed to store upload")
            .map_err(ProcessError::internal)?;
        let roster = roster::parse(bytes)?;
        let reference = self.reference().await?;
        let result = generate_report(&roster, &reference, options);

        if let Err(e) = self.uploads.purge_expired() {
            warn!(path = %path.display(), error = %e, "Upload purge failed");
        }
        result
    }

    /// Resolve the forces of uploaded roster bytes without evaluating rules.
    pub async fn inspect(&self, bytes: &[u8]) -> Result<Vec<RosterForce>, ProcessError> {
        let roster = roster::parse(bytes)?;
        let reference = self.reference().await?;
        Ok(Reconciler::new(&reference).resolve_roster(&roster))
    }
}
