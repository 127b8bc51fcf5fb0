use std::path::Path;
use std::sync::Arc;

use crate::domain::{SourceType, Unit, keys};
use crate::error::{HelixTutorError, Result};
use crate::ports::Transcriber;

use super::file_name;

/// Recorded audio: one unit per file holding the whole transcript.
pub struct AudioNormalizer {
    transcriber: Arc<dyn Transcriber>,
}

impl AudioNormalizer {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    pub(super) async fn normalize_file(&self, path: &Path) -> Result<Unit> {
        let name = file_name(path);
        let transcript = self
            .transcriber
            .transcribe(path)
            .await
            .map_err(|e| HelixTutorError::normalization(&name, e))?;

        let text = transcript.text.trim();
        if text.is_empty() {
            return Err(HelixTutorError::normalization(&name, "empty transcript"));
        }

        Ok(Unit::new(SourceType::Audio, &name, 1, text)
            .with_extra(keys::DURATION_SECONDS, transcript.duration_seconds)
            .with_extra(keys::SEGMENTS, transcript.segments.len()))
    }
}
