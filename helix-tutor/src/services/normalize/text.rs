use std::path::Path;

use crate::domain::{Extra, SourceType, Unit};
use crate::error::{HelixTutorError, Result};
use crate::services::chunker::Chunker;

use super::{chunk_units, file_name};

/// Plain text and markdown notes, read whole and chunked.
pub struct TextNormalizer {
    chunker: Chunker,
}

impl TextNormalizer {
    pub const fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    pub(super) async fn normalize_file(&self, path: &Path) -> Result<Vec<Unit>> {
        let name = file_name(path);
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HelixTutorError::normalization(&name, e))?;

        chunk_units(&self.chunker, SourceType::Text, &name, &content, &Extra::new())
    }
}
