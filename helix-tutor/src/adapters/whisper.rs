use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{HelixTutorError, Result};
use crate::ports::{Transcriber, Transcript, TranscriptSegment};

use super::process;

/// Speech to text through the `whisper` command line tool.
///
/// The tool writes `<stem>.json` into a scratch directory, which is parsed
/// and dropped.
pub struct WhisperCliTranscriber {
    command: String,
    model: String,
    device: String,
}

#[derive(Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperCliTranscriber {
    pub fn new(
        command: impl Into<String>,
        model: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
            device: device.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        let scratch = tempfile::tempdir()?;

        tracing::debug!("Transcribing {} with whisper {}", path.display(), self.model);
        let mut command = Command::new(&self.command);
        command
            .arg(path)
            .args(["--model", self.model.as_str(), "--device", self.device.as_str()])
            .args(["--output_format", "json", "--verbose", "False"])
            .arg("--output_dir")
            .arg(scratch.path());
        let output = process::run(&mut command, &self.command).await?;
        if !output.status.success() {
            return Err(process::failure(&self.command, &output));
        }

        let stem = path
            .file_stem()
            .ok_or_else(|| HelixTutorError::tool(&self.command, "input has no file name"))?;
        let mut json_name = stem.to_os_string();
        json_name.push(".json");
        let json_path = scratch.path().join(json_name);
        let raw = tokio::fs::read(&json_path).await.map_err(|e| {
            HelixTutorError::tool(&self.command, format!("{}: {e}", json_path.display()))
        })?;
        let parsed: WhisperOutput =
            serde_json::from_slice(&raw).map_err(|e| HelixTutorError::tool(&self.command, e))?;

        Ok(into_transcript(parsed))
    }
}

fn into_transcript(output: WhisperOutput) -> Transcript {
    let duration_seconds = output.segments.last().map_or(0.0, |s| s.end);
    Transcript {
        text: output.text.trim().to_string(),
        segments: output
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .collect(),
        duration_seconds,
    }
}
