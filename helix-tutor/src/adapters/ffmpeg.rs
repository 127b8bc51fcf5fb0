use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{HelixTutorError, Result};
use crate::ports::{MediaInfo, MediaProbe, SubtitleExtractor};

use super::process;

/// Pulls the first subtitle stream as SRT with `ffmpeg`.
pub struct FfmpegSubtitleExtractor {
    ffmpeg: String,
}

impl FfmpegSubtitleExtractor {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

#[async_trait]
impl SubtitleExtractor for FfmpegSubtitleExtractor {
    async fn extract(&self, path: &Path) -> Result<Option<String>> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-map", "0:s:0", "-c:s", "srt", "-f", "srt", "-"]);
        let output = process::run(&mut command, &self.ffmpeg).await?;

        // ffmpeg exits non-zero when the stream map matches nothing.
        if !output.status.success() {
            tracing::debug!("No subtitle track in {}", path.display());
            return Ok(None);
        }

        let srt = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(Some(srt).filter(|s| !s.trim().is_empty()))
    }
}

/// Reads duration and frame size with `ffprobe`.
pub struct FfprobeMediaProbe {
    ffprobe: String,
}

impl FfprobeMediaProbe {
    pub fn new(ffprobe: impl Into<String>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[async_trait]
impl MediaProbe for FfprobeMediaProbe {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path);
        let output = process::run(&mut command, &self.ffprobe).await?;

        if !output.status.success() {
            return Err(process::failure(&self.ffprobe, &output));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| HelixTutorError::tool(&self.ffprobe, e))?;
        Ok(media_info(&probe))
    }
}

fn media_info(probe: &ProbeOutput) -> MediaInfo {
    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| video.and_then(|s| s.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());

    MediaInfo {
        duration_seconds,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
    }
}
