use std::path::Path;

use async_trait::async_trait;

use crate::error::{HelixTutorError, Result};
use crate::ports::{DocumentExtractor, ExtractedDocument};

pub struct PdfTextExtractor;

#[async_trait]
impl DocumentExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedDocument> {
        let owned = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
            .await
            .map_err(|e| HelixTutorError::tool("pdf-extract", e))?
            .map_err(|e| HelixTutorError::tool("pdf-extract", e))?;

        Ok(ExtractedDocument {
            page_count: pages.len(),
            text: pages
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        })
    }
}
