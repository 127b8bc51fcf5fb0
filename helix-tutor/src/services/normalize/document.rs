use std::path::Path;
use std::sync::Arc;

use crate::domain::{Extra, SourceType, Unit, keys};
use crate::error::{HelixTutorError, Result};
use crate::ports::DocumentExtractor;
use crate::services::chunker::Chunker;

use super::{chunk_units, file_name};

/// PDF documents: text comes from the extractor, then goes through the chunker.
pub struct DocumentNormalizer {
    chunker: Chunker,
    extractor: Arc<dyn DocumentExtractor>,
}

impl DocumentNormalizer {
    pub fn new(chunker: Chunker, extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self { chunker, extractor }
    }

    pub(super) async fn normalize_file(&self, path: &Path) -> Result<Vec<Unit>> {
        let name = file_name(path);
        let document = self
            .extractor
            .extract(path)
            .await
            .map_err(|e| HelixTutorError::normalization(&name, e))?;

        let mut extra = Extra::new();
        extra.insert(keys::PAGE_COUNT.to_string(), document.page_count.into());

        chunk_units(&self.chunker, SourceType::Pdf, &name, &document.text, &extra)
    }
}
