use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use helix_tutor::adapters::{
    FastEmbedGenerator, FfmpegSubtitleExtractor, FfprobeMediaProbe, OllamaClient,
    PdfTextExtractor, WhisperCliTranscriber,
};
use helix_tutor::ports::{ImageCaptioner, Transcriber};
use helix_tutor::services::{
    AudioNormalizer, Chunker, DocumentNormalizer, ImageNormalizer, KnowledgeIndex, Normalizer,
    ResponseComposer, TextNormalizer, VideoNormalizer,
};
use helix_tutor::{Config, Result};

pub type Index = KnowledgeIndex<FastEmbedGenerator>;

/// Configuration plus output mode, shared by every command.
pub struct Context {
    pub config: Config,
    pub json: bool,
}

impl Context {
    pub fn new(config_path: Option<&Path>, json: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::from_path(path)?,
            None => Config::load()?,
        };
        Ok(Self { config, json })
    }

    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub async fn embedder(&self) -> Result<Arc<FastEmbedGenerator>> {
        tracing::debug!("Embedding device: {}", self.config.device);
        FastEmbedGenerator::load(&self.config.embedding.model, !self.json)
            .await
            .map(Arc::new)
    }

    /// The saved index, or an empty one when nothing was saved yet.
    pub async fn open_index(&self) -> Result<Index> {
        let mut index = KnowledgeIndex::new(self.embedder().await?);
        if !index.load(&self.config.index_path)? {
            tracing::warn!(
                "No index at {}. Run `helix-tutor ingest` first.",
                self.config.index_path.display()
            );
        }
        Ok(index)
    }

    pub fn generator(&self) -> Result<Arc<OllamaClient>> {
        OllamaClient::new(&self.config.generation).map(Arc::new)
    }

    pub fn composer(&self) -> Result<ResponseComposer<OllamaClient>> {
        Ok(ResponseComposer::new(
            self.generator()?,
            self.config.retrieval.excerpt_chars,
        ))
    }

    /// One normalizer per media type, in ingestion order.
    pub fn normalizers(&self) -> Result<Vec<Normalizer>> {
        let config = &self.config;
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperCliTranscriber::new(
            &config.transcription.command,
            &config.transcription.model,
            &config.device,
        ));
        let captioner = match &config.captioning.model {
            Some(model) => Some(
                Arc::new(OllamaClient::with_model(&config.generation, model)?)
                    as Arc<dyn ImageCaptioner>,
            ),
            None => None,
        };

        Ok(vec![
            Normalizer::Document(DocumentNormalizer::new(chunker, Arc::new(PdfTextExtractor))),
            Normalizer::Text(TextNormalizer::new(chunker)),
            Normalizer::Video(VideoNormalizer::new(
                Arc::new(FfmpegSubtitleExtractor::new(&config.tools.ffmpeg)),
                Arc::clone(&transcriber),
                Arc::new(FfprobeMediaProbe::new(&config.tools.ffprobe)),
            )),
            Normalizer::Audio(AudioNormalizer::new(transcriber)),
            Normalizer::Image(ImageNormalizer::new(captioner)),
        ])
    }
}
