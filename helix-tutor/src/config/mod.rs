use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::SourceType;
use crate::error::{HelixTutorError, Result};

const PROJECT_CONFIG: &str = ".helix/helix-tutor.toml";

/// Process-wide configuration. Built once at startup and passed by reference;
/// a restart rebuilds it rather than mutating it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_root: PathBuf,
    pub index_path: PathBuf,
    pub device: String,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub transcription: TranscriptionConfig,
    pub generation: GenerationConfig,
    pub captioning: CaptioningConfig,
    pub retrieval: RetrievalConfig,
    pub folders: FolderLayout,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("data"),
            index_path: PathBuf::from("data/.index"),
            device: "cpu".to_string(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            transcription: TranscriptionConfig::default(),
            generation: GenerationConfig::default(),
            captioning: CaptioningConfig::default(),
            retrieval: RetrievalConfig::default(),
            folders: FolderLayout::default(),
            tools: ToolsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "Xenova/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Whisper model size: tiny, base, small, medium, large.
    pub model: String,
    pub command: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            command: "whisper".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            temperature: 0.7,
            timeout_secs: 600,
        }
    }
}

/// Vision model used for image captions. `None` falls back to file names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptioningConfig {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub excerpt_chars: usize,
    /// Source types left out of retrieval when answering in audio format.
    pub audio_excludes: Vec<SourceType>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 3,
            excerpt_chars: 1200,
            audio_excludes: vec![SourceType::Image],
        }
    }
}

/// Subfolder of the source root that holds each media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderLayout {
    pub texts: String,
    pub pdfs: String,
    pub audios: String,
    pub videos: String,
    pub images: String,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            texts: "texts".to_string(),
            pdfs: "pdfs".to_string(),
            audios: "audios".to_string(),
            videos: "videos".to_string(),
            images: "images".to_string(),
        }
    }
}

impl FolderLayout {
    pub fn folder_name(&self, source_type: SourceType) -> &str {
        match source_type {
            SourceType::Text => &self.texts,
            SourceType::Pdf => &self.pdfs,
            SourceType::Audio => &self.audios,
            SourceType::Video => &self.videos,
            SourceType::Image => &self.images,
        }
    }

    pub fn folder(&self, root: &Path, source_type: SourceType) -> PathBuf {
        root.join(self.folder_name(source_type))
    }

    /// Creates every per-type folder under `root`, returning the ones that
    /// did not exist yet.
    pub fn provision(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for source_type in SourceType::ALL {
            let folder = self.folder(root, source_type);
            if !folder.is_dir() {
                std::fs::create_dir_all(&folder)?;
                tracing::info!("Created {}", folder.display());
                created.push(folder);
            }
        }
        Ok(created)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = match Self::load_project()? {
            Some(project) => project,
            None => Self::load_global()?.unwrap_or_default(),
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config = Self::read(path)?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn project_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG)
    }

    fn global_path() -> PathBuf {
        let config_dir = directories::ProjectDirs::from("", "", "helix").map_or_else(
            || PathBuf::from("~/.config/helix"),
            |d| d.config_dir().to_path_buf(),
        );
        config_dir.join("helix-tutor.toml")
    }

    fn load_global() -> Result<Option<Self>> {
        let config_path = Self::global_path();
        if config_path.exists() {
            Self::read(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn load_project() -> Result<Option<Self>> {
        let config_path = Self::project_path();
        if config_path.exists() {
            Self::read(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| HelixTutorError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| HelixTutorError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HelixTutorError::Config(e.to_string()))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(root) = std::env::var("HELIX_TUTOR_ROOT") {
            self.source_root = PathBuf::from(root);
        }
        if let Ok(index) = std::env::var("HELIX_TUTOR_INDEX") {
            self.index_path = PathBuf::from(index);
        }
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.generation.base_url = if host.starts_with("http") {
                host
            } else {
                format!("http://{host}")
            };
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_root.as_os_str().is_empty() {
            return Err(HelixTutorError::Config("source_root is required".into()));
        }
        if self.index_path.as_os_str().is_empty() {
            return Err(HelixTutorError::Config("index_path is required".into()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(HelixTutorError::Config("embedding.model is required".into()));
        }
        if self.generation.model.trim().is_empty() {
            return Err(HelixTutorError::Config("generation.model is required".into()));
        }
        if self.transcription.model.trim().is_empty() {
            return Err(HelixTutorError::Config(
                "transcription.model is required".into(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(HelixTutorError::Config(
                "chunking.chunk_size must be positive".into(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(HelixTutorError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.default_k == 0 {
            return Err(HelixTutorError::Config(
                "retrieval.default_k must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.default_k, 3);
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let config = Config::parse(
            r#"
source_root = "materials"

[chunking]
chunk_size = 500
"#,
        )
        .unwrap();
        assert_eq!(config.source_root, PathBuf::from("materials"));
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.generation.model, "llama2");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = 1000;
        assert!(matches!(config.validate(), Err(HelixTutorError::Config(_))));
    }

    #[test]
    fn test_missing_embedding_model_is_fatal() {
        let config = Config::parse("[embedding]\nmodel = \"\"\n").unwrap();
        assert!(matches!(config.validate(), Err(HelixTutorError::Config(_))));
    }

    #[test]
    fn test_serialized_config_parses_back() {
        let text = Config::default().to_toml().unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.folders.videos, "videos");
        assert_eq!(parsed.retrieval.audio_excludes, vec![SourceType::Image]);
    }

    #[test]
    fn test_provision_creates_missing_folders_once() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FolderLayout::default();
        std::fs::create_dir_all(dir.path().join("texts")).unwrap();

        let created = layout.provision(dir.path()).unwrap();
        assert_eq!(created.len(), 4);
        assert!(dir.path().join("videos").is_dir());
        assert!(layout.provision(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_folder_layout() {
        let layout = FolderLayout::default();
        assert_eq!(
            layout.folder(Path::new("data"), SourceType::Image),
            PathBuf::from("data/images")
        );
    }
}
