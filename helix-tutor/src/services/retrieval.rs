use crate::config::RetrievalConfig;
use crate::domain::{OutputFormat, SearchFilter, SourceType, Unit};
use crate::ports::EmbeddingGenerator;

use super::index::KnowledgeIndex;

/// Supplies the default `k` and the per-format type policy on top of
/// [`KnowledgeIndex::search`]. Search failures degrade to no results.
pub struct Retriever<'a, E: EmbeddingGenerator> {
    index: &'a KnowledgeIndex<E>,
    default_k: usize,
    audio_excludes: Vec<SourceType>,
}

impl<'a, E: EmbeddingGenerator> Retriever<'a, E> {
    pub fn new(index: &'a KnowledgeIndex<E>, config: &RetrievalConfig) -> Self {
        Self {
            index,
            default_k: config.default_k,
            audio_excludes: config.audio_excludes.clone(),
        }
    }

    pub async fn retrieve(&self, question: &str, format: OutputFormat) -> Vec<Unit> {
        self.retrieve_k(question, self.default_k, format).await
    }

    pub async fn retrieve_k(&self, question: &str, k: usize, format: OutputFormat) -> Vec<Unit> {
        let filter = self.filter_for(format);
        match self.index.search(question, k, filter.as_ref()).await {
            Ok(units) => {
                tracing::debug!("Retrieved {} units for {} answer", units.len(), format);
                units
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, answering without context: {}", e);
                Vec::new()
            }
        }
    }

    fn filter_for(&self, format: OutputFormat) -> Option<SearchFilter> {
        if format != OutputFormat::Audio || self.audio_excludes.is_empty() {
            return None;
        }
        let allowed = SourceType::ALL
            .into_iter()
            .filter(|t| !self.audio_excludes.contains(t));
        Some(SearchFilter::new().with_source_types(allowed))
    }
}
