//! Concrete providers for the capability traits in [`crate::ports`].

mod embedder;
mod ffmpeg;
mod ollama;
mod pdf;
mod process;
mod whisper;

pub use embedder::FastEmbedGenerator;
pub use ffmpeg::{FfmpegSubtitleExtractor, FfprobeMediaProbe};
pub use ollama::OllamaClient;
pub use pdf::PdfTextExtractor;
pub use whisper::WhisperCliTranscriber;
