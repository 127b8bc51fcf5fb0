use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{HelixTutorError, Result};
use crate::ports::EmbeddingGenerator;

/// Local ONNX embeddings through `fastembed`.
pub struct FastEmbedGenerator {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedGenerator {
    /// Loads (and on first use downloads) the model named by `model_id`.
    ///
    /// `model_id` is either a model code such as
    /// `Xenova/paraphrase-multilingual-MiniLM-L12-v2` or a variant name such as
    /// `AllMiniLML6V2`.
    pub async fn load(model_id: &str, show_progress: bool) -> Result<Self> {
        let (model, dimension) = resolve_model(model_id)?;
        let model_name = model_id.to_string();

        tracing::info!("Loading embedding model {} ({} dims)", model_name, dimension);
        let loaded = tokio::task::spawn_blocking(move || {
            let mut options = InitOptions::default();
            options.model_name = model;
            options.show_download_progress = show_progress;
            TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| HelixTutorError::Embedding(e.to_string()))?
        .map_err(|e: anyhow::Error| HelixTutorError::Embedding(format!("{model_name}: {e:#}")))?;

        Ok(Self {
            model: Arc::new(loaded),
            model_name,
            dimension,
        })
    }
}

fn resolve_model(model_id: &str) -> Result<(EmbeddingModel, usize)> {
    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| {
            info.model_code.eq_ignore_ascii_case(model_id)
                || format!("{:?}", info.model).eq_ignore_ascii_case(model_id)
        })
        .map(|info| (info.model, info.dim))
        .ok_or_else(|| {
            HelixTutorError::Config(format!("unsupported embedding model: {model_id}"))
        })
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| HelixTutorError::Embedding("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();

        tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| HelixTutorError::Embedding(e.to_string()))?
            .map_err(|e: anyhow::Error| HelixTutorError::Embedding(format!("{e:#}")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
