#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use helix_tutor::error::{HelixTutorError, Result};
use helix_tutor::ports::{
    EmbeddingGenerator, ImageCaptioner, MediaInfo, MediaProbe, SubtitleExtractor, TextGenerator,
    Transcriber, Transcript, TranscriptSegment,
};

pub const DIMENSION: usize = 256;

/// Bag-of-words embedding: every lowercase word is hashed into one bucket.
pub struct HashEmbedder;

impl HashEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let bucket = usize::from(u16::from_le_bytes([bytes[0], bytes[1]])) % DIMENSION;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingGenerator for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hash-bow"
    }
}

pub struct RecordingGenerator {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(HelixTutorError::Generation("model unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Returns the same transcript for every file and counts calls.
pub struct ScriptedTranscriber {
    text: String,
    duration: f64,
    pub calls: AtomicUsize,
}

impl ScriptedTranscriber {
    pub fn new(text: &str, duration: f64) -> Self {
        Self {
            text: text.to_string(),
            duration,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _path: &Path) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Transcript {
            text: self.text.clone(),
            segments: vec![TranscriptSegment {
                start: 0.0,
                end: self.duration,
                text: self.text.clone(),
            }],
            duration_seconds: self.duration,
        })
    }
}

pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        Err(HelixTutorError::tool(
            "whisper",
            format!("cannot decode {}", path.display()),
        ))
    }
}

/// Fails for files whose name contains `fail_on`, transcribes the rest.
pub struct SelectiveTranscriber {
    pub fail_on: &'static str,
}

#[async_trait]
impl Transcriber for SelectiveTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.contains(self.fail_on) {
            return FailingTranscriber.transcribe(path).await;
        }
        ScriptedTranscriber::new(&format!("Recording {name} explains closures."), 12.0)
            .transcribe(path)
            .await
    }
}

pub struct FixedSubtitles(pub Option<String>);

#[async_trait]
impl SubtitleExtractor for FixedSubtitles {
    async fn extract(&self, _path: &Path) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

pub struct FixedProbe(pub MediaInfo);

#[async_trait]
impl MediaProbe for FixedProbe {
    async fn probe(&self, _path: &Path) -> Result<MediaInfo> {
        Ok(self.0)
    }
}

pub struct FailingProbe;

#[async_trait]
impl MediaProbe for FailingProbe {
    async fn probe(&self, _path: &Path) -> Result<MediaInfo> {
        Err(HelixTutorError::tool("ffprobe", "not found on PATH"))
    }
}

pub struct FixedCaptioner(pub String);

#[async_trait]
impl ImageCaptioner for FixedCaptioner {
    async fn caption(&self, _path: &Path) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Lesson-like prose of exactly `chars` characters.
pub fn lesson_text(chars: usize) -> String {
    let sentences = [
        "A loop repeats a block of statements while its condition holds.",
        "Each pass through the body is called an iteration.",
        "A counter variable often tracks how many iterations have run.",
        "Breaking out early skips the remaining iterations.",
    ];
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < chars {
        text.push_str(sentences[i % sentences.len()]);
        text.push(if i % 6 == 5 { '\n' } else { ' ' });
        i += 1;
    }
    text.chars().take(chars).collect()
}
