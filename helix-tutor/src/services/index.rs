//! In-memory vector index over [`Unit`]s with folder snapshots.
//!
//! The index is append-only. `insert` is the only mutator and embeds the whole
//! batch before touching state, so a failed batch leaves nothing behind.
//! `search` takes `&self` and may run from any task while no insert is in
//! flight; callers serialize writers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ScoredUnit, SearchFilter, SourceType, Unit};
use crate::error::{HelixTutorError, Result};
use crate::ports::EmbeddingGenerator;

const SNAPSHOT_VERSION: u32 = 2;
const MANIFEST_FILE: &str = "manifest.json";
const UNITS_FILE: &str = "units.json";
const VECTORS_FILE: &str = "vectors.bin";

pub struct KnowledgeIndex<E: EmbeddingGenerator> {
    embedder: Arc<E>,
    model_name: String,
    dimension: usize,
    units: Vec<Unit>,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    model: String,
    dimension: usize,
    unit_count: usize,
    saved_at: DateTime<Utc>,
    checksum: String,
}

/// Summary of a snapshot on disk, read without loading the embedding model.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub model: String,
    pub dimension: usize,
    pub unit_count: usize,
    pub saved_at: DateTime<Utc>,
}

impl SnapshotInfo {
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(None);
        }
        let manifest: Manifest = serde_json::from_slice(&std::fs::read(&manifest_path)?)
            .map_err(|e| HelixTutorError::CorruptSnapshot(format!("manifest: {e}")))?;
        Ok(Some(Self {
            model: manifest.model,
            dimension: manifest.dimension,
            unit_count: manifest.unit_count,
            saved_at: manifest.saved_at,
        }))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub model: String,
    pub dimension: usize,
    pub units: usize,
    pub sources: usize,
    pub per_type: BTreeMap<SourceType, usize>,
}

impl<E: EmbeddingGenerator> KnowledgeIndex<E> {
    pub fn new(embedder: Arc<E>) -> Self {
        let model_name = embedder.model_name().to_string();
        let dimension = embedder.dimension();
        Self {
            embedder,
            model_name,
            dimension,
            units: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn stats(&self) -> IndexStats {
        let mut per_type = BTreeMap::new();
        let mut sources = BTreeSet::new();
        for unit in &self.units {
            *per_type.entry(unit.source_type).or_insert(0) += 1;
            sources.insert((unit.source_type, unit.source_name.as_str()));
        }
        IndexStats {
            model: self.model_name.clone(),
            dimension: self.dimension,
            units: self.units.len(),
            sources: sources.len(),
            per_type,
        }
    }

    pub fn contains_source(&self, source_type: SourceType, source_name: &str) -> bool {
        self.units
            .iter()
            .any(|u| u.source_type == source_type && u.source_name == source_name)
    }

    /// Drops the units whose source already has units in the index.
    pub fn unindexed(&self, units: Vec<Unit>) -> Vec<Unit> {
        let known: BTreeSet<(SourceType, &str)> = self
            .units
            .iter()
            .map(|u| (u.source_type, u.source_name.as_str()))
            .collect();
        units
            .into_iter()
            .filter(|u| !known.contains(&(u.source_type, u.source_name.as_str())))
            .collect()
    }

    /// Embeds and appends `units`. Returns `Ok(false)` for an empty batch.
    pub async fn insert(&mut self, units: Vec<Unit>) -> Result<bool> {
        if units.is_empty() {
            return Ok(false);
        }

        if let Some(blank) = units.iter().find(|u| u.content.trim().is_empty()) {
            return Err(HelixTutorError::Indexing(format!(
                "unit {}#{} has no content",
                blank.source_name, blank.sequence_index
            )));
        }

        let texts: Vec<&str> = units.iter().map(|u| u.content.as_str()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| HelixTutorError::Indexing(e.to_string()))?;

        if vectors.len() != units.len() {
            return Err(HelixTutorError::Indexing(format!(
                "embedding provider returned {} vectors for {} units",
                vectors.len(),
                units.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(HelixTutorError::Indexing(format!(
                "expected {}-dimensional embeddings, got {}",
                self.dimension,
                bad.len()
            )));
        }

        tracing::info!("Indexed {} units ({} total)", units.len(), self.len() + units.len());
        self.units.extend(units);
        self.vectors.extend(vectors);
        Ok(true)
    }

    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Unit>> {
        let scored = self.search_scored(query, k, filter).await?;
        Ok(scored.into_iter().map(|s| s.unit).collect())
    }

    /// Top `k` units by cosine similarity. Equal scores keep insertion order.
    pub async fn search_scored(
        &self,
        query: &str,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredUnit>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if k == 0 {
            return Err(HelixTutorError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }

        let candidates: Vec<usize> = (0..self.units.len())
            .filter(|&i| filter.is_none_or(|f| f.matches(&self.units[i])))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| HelixTutorError::Retrieval(e.to_string()))?;

        let mut scored: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|i| (i, cosine_similarity(&query_vector, &self.vectors[i])))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredUnit {
                unit: self.units[i].clone(),
                score,
            })
            .collect())
    }

    /// Writes the snapshot folder. Nothing is written for an empty index.
    pub fn save(&self, path: &Path) -> Result<bool> {
        if self.is_empty() {
            tracing::warn!("Index is empty, skipping snapshot to {}", path.display());
            return Ok(false);
        }

        std::fs::create_dir_all(path)?;

        let vectors = bincode::serialize(&self.vectors)?;
        let units = serde_json::to_vec(&self.units)?;
        let manifest = Manifest {
            version: SNAPSHOT_VERSION,
            model: self.model_name.clone(),
            dimension: self.dimension,
            unit_count: self.units.len(),
            saved_at: Utc::now(),
            checksum: checksum(&vectors, &units),
        };

        write_atomic(path, VECTORS_FILE, &vectors)?;
        write_atomic(path, UNITS_FILE, &units)?;
        write_atomic(path, MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)?;

        tracing::info!("Saved {} units to {}", self.units.len(), path.display());
        Ok(true)
    }

    /// Replaces the in-memory index with the snapshot at `path`.
    ///
    /// Returns `Ok(false)` and leaves the index untouched when no snapshot
    /// exists there.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            tracing::debug!("No snapshot at {}", path.display());
            return Ok(false);
        }

        let manifest: Manifest = serde_json::from_slice(&std::fs::read(&manifest_path)?)
            .map_err(|e| HelixTutorError::CorruptSnapshot(format!("manifest: {e}")))?;
        if manifest.version != SNAPSHOT_VERSION {
            return Err(HelixTutorError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                manifest.version
            )));
        }

        let raw_vectors = std::fs::read(path.join(VECTORS_FILE))?;
        let raw_units = std::fs::read(path.join(UNITS_FILE))?;
        if checksum(&raw_vectors, &raw_units) != manifest.checksum {
            return Err(HelixTutorError::CorruptSnapshot(
                "snapshot checksum mismatch".to_string(),
            ));
        }
        let vectors: Vec<Vec<f32>> = bincode::deserialize(&raw_vectors)
            .map_err(|e| HelixTutorError::CorruptSnapshot(format!("vectors: {e}")))?;
        let units: Vec<Unit> = serde_json::from_slice(&raw_units)
            .map_err(|e| HelixTutorError::CorruptSnapshot(format!("units: {e}")))?;

        if units.len() != manifest.unit_count || vectors.len() != manifest.unit_count {
            return Err(HelixTutorError::CorruptSnapshot(format!(
                "manifest lists {} units, found {} units and {} vectors",
                manifest.unit_count,
                units.len(),
                vectors.len()
            )));
        }
        if vectors.iter().any(|v| v.len() != manifest.dimension) {
            return Err(HelixTutorError::CorruptSnapshot(
                "vector dimension does not match manifest".to_string(),
            ));
        }
        if manifest.dimension != self.dimension {
            return Err(HelixTutorError::Indexing(format!(
                "snapshot uses {}-dimensional vectors but {} produces {}",
                manifest.dimension, self.model_name, self.dimension
            )));
        }
        if manifest.model != self.model_name {
            tracing::warn!(
                "Snapshot was embedded with {} but the current model is {}",
                manifest.model,
                self.model_name
            );
        }

        tracing::info!(
            "Loaded {} units from {} (saved {})",
            units.len(),
            path.display(),
            manifest.saved_at.format("%Y-%m-%d %H:%M")
        );
        self.units = units;
        self.vectors = vectors;
        Ok(true)
    }
}

/// Deletes the snapshot files at `path`, manifest first. Returns whether a
/// snapshot was there.
pub fn remove_snapshot(path: &Path) -> Result<bool> {
    let existed = path.join(MANIFEST_FILE).exists();
    for name in [MANIFEST_FILE, UNITS_FILE, VECTORS_FILE] {
        match std::fs::remove_file(path.join(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    if existed {
        tracing::info!("Removed snapshot at {}", path.display());
    }
    Ok(existed)
}

fn checksum(vectors: &[u8], units: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(vectors);
    hasher.update(units);
    hex::encode(hasher.finalize().as_bytes())
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(dir.join(name)).map_err(|e| e.error)?;
    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// One dimension per known word; unknown words are ignored.
    struct VocabEmbedder;

    const VOCAB: [&str; 4] = ["loops", "variables", "functions", "ownership"];

    #[async_trait]
    impl EmbeddingGenerator for VocabEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(VOCAB
                .iter()
                .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
                .collect())
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimension(&self) -> usize {
            VOCAB.len()
        }

        fn model_name(&self) -> &str {
            "vocab"
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingGenerator for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(HelixTutorError::Embedding("model offline".to_string()))
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(HelixTutorError::Embedding("model offline".to_string()))
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    fn unit(name: &str, content: &str) -> Unit {
        Unit::new(SourceType::Text, name, 1, content)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_insert_empty_batch_is_a_no_op() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        assert!(!index.insert(Vec::new()).await.unwrap());
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_embedding_commits_nothing() {
        let mut index = KnowledgeIndex::new(Arc::new(BrokenEmbedder));
        let result = index.insert(vec![unit("a.txt", "loops")]).await;
        assert!(matches!(result, Err(HelixTutorError::Indexing(_))));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_blank_unit_is_rejected() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        let result = index
            .insert(vec![unit("a.txt", "loops"), unit("b.txt", "   ")])
            .await;
        assert!(matches!(result, Err(HelixTutorError::Indexing(_))));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index
            .insert(vec![
                unit("first.txt", "loops again"),
                unit("other.txt", "ownership"),
                unit("second.txt", "loops once more"),
            ])
            .await
            .unwrap();

        let hits = index.search("loops", 2, None).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|u| u.source_name.as_str()).collect();
        assert_eq!(names, vec!["first.txt", "second.txt"]);
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected_on_a_populated_index() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index.insert(vec![unit("a.txt", "loops")]).await.unwrap();
        assert!(matches!(
            index.search("loops", 0, None).await,
            Err(HelixTutorError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_count_per_type() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index
            .insert(vec![
                Unit::new(SourceType::Text, "a.txt", 1, "loops"),
                Unit::new(SourceType::Text, "a.txt", 2, "functions"),
                Unit::new(SourceType::Video, "b.mp4", 1, "ownership"),
            ])
            .await
            .unwrap();

        let stats = index.stats();
        assert_eq!(stats.units, 3);
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.per_type.get(&SourceType::Text), Some(&2));
    }

    #[test]
    fn test_load_without_snapshot_leaves_index_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        assert!(!index.load(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_tampered_vectors_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index.insert(vec![unit("a.txt", "loops")]).await.unwrap();
        assert!(index.save(dir.path()).unwrap());

        std::fs::write(dir.path().join(VECTORS_FILE), b"garbage").unwrap();

        let info = SnapshotInfo::read(dir.path()).unwrap().unwrap();
        assert_eq!(info.unit_count, 1);
        assert_eq!(info.model, "vocab");

        let mut fresh = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        assert!(matches!(
            fresh.load(dir.path()),
            Err(HelixTutorError::CorruptSnapshot(_))
        ));
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_edited_units_file_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index
            .insert(vec![unit("a.txt", "loops"), unit("b.txt", "ownership")])
            .await
            .unwrap();
        assert!(index.save(dir.path()).unwrap());

        let swapped = vec![unit("a.txt", "functions"), unit("b.txt", "variables")];
        std::fs::write(
            dir.path().join(UNITS_FILE),
            serde_json::to_vec(&swapped).unwrap(),
        )
        .unwrap();

        let mut fresh = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        assert!(matches!(
            fresh.load(dir.path()),
            Err(HelixTutorError::CorruptSnapshot(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index.insert(vec![unit("a.txt", "loops")]).await.unwrap();
        index.save(dir.path()).unwrap();

        assert!(remove_snapshot(dir.path()).unwrap());
        assert!(SnapshotInfo::read(dir.path()).unwrap().is_none());
        assert!(!dir.path().join(VECTORS_FILE).exists());
        assert!(!remove_snapshot(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_unindexed_skips_known_sources() {
        let mut index = KnowledgeIndex::new(Arc::new(VocabEmbedder));
        index.insert(vec![unit("a.txt", "loops")]).await.unwrap();

        let incoming = vec![
            Unit::new(SourceType::Text, "a.txt", 1, "loops"),
            Unit::new(SourceType::Text, "a.txt", 2, "more loops"),
            Unit::new(SourceType::Pdf, "a.txt", 1, "same name, other type"),
            unit("b.txt", "functions"),
        ];
        let fresh = index.unindexed(incoming);

        let keys: Vec<(SourceType, &str)> = fresh
            .iter()
            .map(|u| (u.source_type, u.source_name.as_str()))
            .collect();
        assert_eq!(keys, vec![(SourceType::Pdf, "a.txt"), (SourceType::Text, "b.txt")]);
        assert!(index.contains_source(SourceType::Text, "a.txt"));
        assert!(!index.contains_source(SourceType::Pdf, "a.txt"));
    }
}
