use std::path::Path;
use std::sync::Arc;

use crate::domain::{SourceType, Unit, keys};
use crate::error::{HelixTutorError, Result};
use crate::ports::{MediaInfo, MediaProbe, SubtitleExtractor, Transcriber};

use super::file_name;

/// Videos: embedded subtitles when present, otherwise a transcript of the
/// audio track. One unit per file.
pub struct VideoNormalizer {
    subtitles: Arc<dyn SubtitleExtractor>,
    transcriber: Arc<dyn Transcriber>,
    probe: Arc<dyn MediaProbe>,
}

impl VideoNormalizer {
    pub fn new(
        subtitles: Arc<dyn SubtitleExtractor>,
        transcriber: Arc<dyn Transcriber>,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            subtitles,
            transcriber,
            probe,
        }
    }

    pub(super) async fn normalize_file(&self, path: &Path) -> Result<Unit> {
        let name = file_name(path);

        let info = match self.probe.probe(path).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Could not probe {}: {}", name, e);
                MediaInfo::default()
            }
        };

        let subtitles = match self.subtitles.extract(path).await {
            Ok(Some(raw)) => Some(srt_to_text(&raw)).filter(|text| !text.is_empty()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Subtitle extraction failed for {}: {}", name, e);
                None
            }
        };

        let has_subtitles = subtitles.is_some();
        let (content, transcript_duration) = if let Some(text) = subtitles {
            (text, None)
        } else {
            tracing::debug!("No subtitles in {}, transcribing audio", name);
            let transcript = self
                .transcriber
                .transcribe(path)
                .await
                .map_err(|e| HelixTutorError::normalization(&name, e))?;
            (
                transcript.text.trim().to_string(),
                Some(transcript.duration_seconds).filter(|d| *d > 0.0),
            )
        };

        if content.is_empty() {
            return Err(HelixTutorError::normalization(&name, "no speech or subtitles"));
        }

        let resolution = info.resolution().unwrap_or_else(|| "unknown".to_string());
        let mut unit = Unit::new(SourceType::Video, &name, 1, content)
            .with_extra(keys::HAS_SUBTITLES, has_subtitles)
            .with_extra(keys::RESOLUTION, resolution);
        // Absent when unknown.
        if let Some(duration) = info.duration_seconds.or(transcript_duration) {
            unit = unit.with_extra(keys::DURATION_SECONDS, duration);
        }
        Ok(unit)
    }
}

/// Flattens SRT cues into plain text: drops cue numbers, timing lines and
/// inline markup, and skips a cue line identical to the previous one.
pub fn srt_to_text(srt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in srt.lines() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let clean = strip_markup(line);
        if clean.is_empty() || lines.last().is_some_and(|prev| *prev == clean) {
            continue;
        }
        lines.push(clean);
    }
    lines.join(" ")
}

fn strip_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' | '{' => in_tag = true,
            '>' | '}' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_to_text() {
        let srt = "1\n00:00:01,000 --> 00:00:03,000\n<i>Welcome</i> to the course\n\n2\n00:00:03,500 --> 00:00:05,000\nWelcome to the course\nToday: loops\n";
        assert_eq!(srt_to_text(srt), "Welcome to the course Today: loops");
    }

    #[test]
    fn test_srt_without_cues_is_empty() {
        assert_eq!(srt_to_text("1\n00:00:01,000 --> 00:00:02,000\n\n"), "");
    }
}
