pub mod embed;
pub mod generate;
pub mod media;

pub use embed::EmbeddingGenerator;
pub use generate::TextGenerator;
pub use media::{
    DocumentExtractor, ExtractedDocument, ImageCaptioner, MediaInfo, MediaProbe,
    SubtitleExtractor, Transcriber, Transcript, TranscriptSegment,
};
