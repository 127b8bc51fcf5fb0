//! Media normalizers: turn the files of one source folder into [`Unit`]s.
//!
//! Each media type is one variant of [`Normalizer`]. Per-file failures are
//! collected next to the successes instead of aborting the folder.

use std::path::{Path, PathBuf};

use crate::domain::{Extra, SourceType, Unit};
use crate::error::{HelixTutorError, Result};
use crate::services::chunker::Chunker;

mod audio;
mod document;
mod picture;
mod text;
mod video;

pub use audio::AudioNormalizer;
pub use document::DocumentNormalizer;
pub use picture::{ImageNormalizer, caption_tags};
pub use text::TextNormalizer;
pub use video::{VideoNormalizer, srt_to_text};

pub enum Normalizer {
    Text(TextNormalizer),
    Document(DocumentNormalizer),
    Audio(AudioNormalizer),
    Video(VideoNormalizer),
    Image(ImageNormalizer),
}

impl Normalizer {
    pub const fn source_type(&self) -> SourceType {
        match self {
            Self::Text(_) => SourceType::Text,
            Self::Document(_) => SourceType::Pdf,
            Self::Audio(_) => SourceType::Audio,
            Self::Video(_) => SourceType::Video,
            Self::Image(_) => SourceType::Image,
        }
    }

    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Text(_) => &["txt", "md"],
            Self::Document(_) => &["pdf"],
            Self::Audio(_) => &["mp3", "wav", "m4a", "ogg", "flac"],
            Self::Video(_) => &["mp4", "avi", "mov", "mkv", "webm"],
            Self::Image(_) => &["png", "jpg", "jpeg", "gif", "bmp", "webp"],
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.extensions().contains(&ext.as_str())
            })
    }

    /// Normalizes every accepted file in `folder`, in file-name order.
    ///
    /// A missing folder is created (best effort) and yields an empty report.
    /// Only a folder that exists but cannot be listed is an error.
    pub async fn process(&self, folder: &Path) -> Result<NormalizeReport> {
        let source_type = self.source_type();

        if !folder.exists() {
            tracing::warn!("{} folder not found: {}", source_type, folder.display());
            if let Err(e) = std::fs::create_dir_all(folder) {
                tracing::warn!("Could not create {}: {}", folder.display(), e);
            }
            return Ok(NormalizeReport::default());
        }

        let files = list_files(folder, |path| self.accepts(path))?;
        if files.is_empty() {
            tracing::info!("No {} files in {}", source_type, folder.display());
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            let outcome = self.normalize_file(&path).await;
            match &outcome {
                Ok(units) => tracing::info!(
                    "Processed {} ({} unit{})",
                    path.display(),
                    units.len(),
                    if units.len() == 1 { "" } else { "s" }
                ),
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
            outcomes.push((path, outcome));
        }

        Ok(NormalizeReport::from_outcomes(outcomes))
    }

    async fn normalize_file(&self, path: &Path) -> Result<Vec<Unit>> {
        match self {
            Self::Text(n) => n.normalize_file(path).await,
            Self::Document(n) => n.normalize_file(path).await,
            Self::Audio(n) => n.normalize_file(path).await.map(|u| vec![u]),
            Self::Video(n) => n.normalize_file(path).await.map(|u| vec![u]),
            Self::Image(n) => n.normalize_file(path).await.map(|u| vec![u]),
        }
    }
}

/// Units from the files that succeeded, plus the failures for diagnostics.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub units: Vec<Unit>,
    pub failures: Vec<HelixTutorError>,
}

impl NormalizeReport {
    pub fn from_outcomes(outcomes: Vec<(PathBuf, Result<Vec<Unit>>)>) -> Self {
        let mut report = Self::default();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(units) => report.units.extend(units),
                Err(e) => report.failures.push(e),
            }
        }
        report
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

fn list_files(folder: &Path, accept: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .map_err(|e| HelixTutorError::normalization(folder.display().to_string(), e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| !file_name(path).starts_with('.'))
        .filter(|path| accept(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Splits `text` into units numbered 1..N, dropping blank pieces.
pub(crate) fn chunk_units(
    chunker: &Chunker,
    source_type: SourceType,
    source_name: &str,
    text: &str,
    extra: &Extra,
) -> Result<Vec<Unit>> {
    let units: Vec<Unit> = chunker
        .split(text)
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .zip(1_u32..)
        .map(|(piece, index)| {
            let mut unit = Unit::new(source_type, source_name, index, piece);
            unit.extra.clone_from(extra);
            unit
        })
        .collect();

    if units.is_empty() {
        return Err(HelixTutorError::normalization(source_name, "no text content"));
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_units_are_contiguous_and_non_blank() {
        let chunker = Chunker::new(10, 2).unwrap();
        let units = chunk_units(
            &chunker,
            SourceType::Text,
            "notes.txt",
            "first part second part third part",
            &Extra::new(),
        )
        .unwrap();

        let indexes: Vec<u32> = units.iter().map(|u| u.sequence_index).collect();
        let expected: Vec<u32> = (1..=u32::try_from(units.len()).unwrap()).collect();
        assert_eq!(indexes, expected);
        assert!(units.iter().all(|u| !u.content.trim().is_empty()));
    }

    #[test]
    fn test_blank_text_is_a_normalization_error() {
        let chunker = Chunker::new(10, 2).unwrap();
        let result = chunk_units(&chunker, SourceType::Text, "blank.txt", "  \n\n ", &Extra::new());
        assert!(matches!(
            result,
            Err(HelixTutorError::Normalization { .. })
        ));
    }

    #[test]
    fn test_missing_folder_is_created() {
        let root = tempfile::tempdir().unwrap();
        let folder = root.path().join("texts");
        let normalizer = Normalizer::Text(TextNormalizer::new(Chunker::new(10, 2).unwrap()));

        let report = tokio_test::block_on(normalizer.process(&folder)).unwrap();
        assert!(report.units.is_empty());
        assert!(folder.is_dir());
    }

    #[test]
    fn test_accepts_by_extension_case_insensitively() {
        let normalizer = Normalizer::Image(ImageNormalizer::new(None));
        assert!(normalizer.accepts(Path::new("slide.PNG")));
        assert!(!normalizer.accepts(Path::new("notes.txt")));
        assert!(!normalizer.accepts(Path::new("README")));
    }

    #[test]
    fn test_report_keeps_successes_and_failures_apart() {
        let report = NormalizeReport::from_outcomes(vec![
            (
                PathBuf::from("a.txt"),
                Ok(vec![Unit::new(SourceType::Text, "a.txt", 1, "a")]),
            ),
            (
                PathBuf::from("b.txt"),
                Err(HelixTutorError::normalization("b.txt", "unreadable")),
            ),
        ]);
        assert_eq!(report.units.len(), 1);
        assert_eq!(report.failures.len(), 1);
    }
}
