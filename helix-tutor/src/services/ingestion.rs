use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::config::FolderLayout;
use crate::domain::{SourceType, Unit};
use crate::error::{HelixTutorError, Result};
use crate::ports::EmbeddingGenerator;

use super::index::{KnowledgeIndex, remove_snapshot};
use super::normalize::Normalizer;

/// Runs each registered normalizer over its subfolder of the source root.
///
/// Units are not inserted here; the caller decides what to do with them.
pub struct IngestionCoordinator {
    normalizers: Vec<Normalizer>,
    layout: FolderLayout,
}

#[derive(Debug, Default)]
pub struct IngestionReport {
    /// Units in normalizer registration order, then file order.
    pub units: Vec<Unit>,
    pub failures: Vec<HelixTutorError>,
    pub per_type: BTreeMap<SourceType, TypeSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TypeSummary {
    pub units: usize,
    pub failed_files: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Index only this run's units; the old snapshot is replaced.
    Rebuild,
    /// Load the snapshot and add units from sources it does not hold yet.
    Append,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CommitOutcome {
    pub indexed: usize,
    /// Units dropped because their source was already indexed.
    pub skipped: usize,
    pub saved: bool,
    /// An old snapshot was deleted because the rebuild found no material.
    pub cleared: bool,
}

impl IngestionCoordinator {
    pub const fn new(normalizers: Vec<Normalizer>, layout: FolderLayout) -> Self {
        Self {
            normalizers,
            layout,
        }
    }

    pub fn source_types(&self) -> Vec<SourceType> {
        self.normalizers.iter().map(Normalizer::source_type).collect()
    }

    pub async fn run(&self, root: &Path) -> IngestionReport {
        let mut report = IngestionReport::default();

        for normalizer in &self.normalizers {
            let source_type = normalizer.source_type();
            let folder = self.layout.folder(root, source_type);
            tracing::info!("Ingesting {} from {}", source_type, folder.display());

            let summary = report.per_type.entry(source_type).or_default();
            match normalizer.process(&folder).await {
                Ok(outcome) => {
                    summary.units += outcome.units.len();
                    summary.failed_files += outcome.failures.len();
                    report.units.extend(outcome.units);
                    report.failures.extend(outcome.failures);
                }
                Err(e) => {
                    tracing::error!("{} ingestion failed: {}", source_type, e);
                    report.failures.push(e);
                }
            }
        }

        tracing::info!(
            "Ingestion finished: {} units, {} failures",
            report.units.len(),
            report.failures.len()
        );
        report
    }
}

impl IngestionReport {
    pub fn into_units(self) -> Vec<Unit> {
        self.units
    }
}

/// Inserts ingested `units` into `index` and, when `save` is set, persists the
/// result to `snapshot`.
///
/// `Rebuild` expects a fresh index. When it ends up empty, the snapshot at
/// `snapshot` is removed so later queries do not answer from deleted material.
pub async fn commit<E: EmbeddingGenerator>(
    index: &mut KnowledgeIndex<E>,
    units: Vec<Unit>,
    mode: IndexMode,
    snapshot: &Path,
    save: bool,
) -> Result<CommitOutcome> {
    let mut outcome = CommitOutcome::default();

    let units = match mode {
        IndexMode::Rebuild => units,
        IndexMode::Append => {
            index.load(snapshot)?;
            let total = units.len();
            let fresh = index.unindexed(units);
            outcome.skipped = total - fresh.len();
            if outcome.skipped > 0 {
                tracing::info!(
                    "Skipping {} units from sources already in the index",
                    outcome.skipped
                );
            }
            fresh
        }
    };

    let before = index.len();
    index.insert(units).await?;
    outcome.indexed = index.len() - before;

    if !save {
        return Ok(outcome);
    }
    if index.is_empty() && mode == IndexMode::Rebuild {
        outcome.cleared = remove_snapshot(snapshot)?;
        if outcome.cleared {
            tracing::warn!(
                "No material found, removed the previous index at {}",
                snapshot.display()
            );
        }
    } else {
        outcome.saved = index.save(snapshot)?;
    }
    Ok(outcome)
}
