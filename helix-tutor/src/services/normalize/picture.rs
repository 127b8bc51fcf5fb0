use std::path::Path;
use std::sync::Arc;

use crate::domain::{SourceType, Unit, keys};
use crate::error::{HelixTutorError, Result};
use crate::ports::ImageCaptioner;

use super::file_name;

const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("diagram", &["diagram"]),
    ("code", &["code", "program"]),
    ("chart", &["graph", "chart"]),
    ("screenshot", &["screenshot"]),
];

/// Images: a caption stands in for the content, with keyword tags.
pub struct ImageNormalizer {
    captioner: Option<Arc<dyn ImageCaptioner>>,
}

impl ImageNormalizer {
    pub fn new(captioner: Option<Arc<dyn ImageCaptioner>>) -> Self {
        Self { captioner }
    }

    pub(super) async fn normalize_file(&self, path: &Path) -> Result<Unit> {
        let name = file_name(path);

        let owned = path.to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(owned))
            .await
            .map_err(|e| HelixTutorError::normalization(&name, e))?
            .map_err(|e| HelixTutorError::normalization(&name, e))?;

        let caption = self.caption(path, &name).await;
        let format = path
            .extension()
            .map(|e| e.to_string_lossy().to_uppercase())
            .unwrap_or_default();

        Ok(Unit::new(SourceType::Image, &name, 1, caption.clone())
            .with_extra(keys::RESOLUTION, format!("{width}x{height}"))
            .with_extra(keys::FORMAT, format)
            .with_extra(keys::TAGS, caption_tags(&caption)))
    }

    async fn caption(&self, path: &Path, name: &str) -> String {
        let fallback = || format!("Image: {name}");
        let Some(captioner) = &self.captioner else {
            return fallback();
        };
        match captioner.caption(path).await {
            Ok(caption) if !caption.trim().is_empty() => caption.trim().to_string(),
            Ok(_) => fallback(),
            Err(e) => {
                tracing::warn!("Captioning failed for {}: {}", name, e);
                fallback()
            }
        }
    }
}

pub fn caption_tags(caption: &str) -> Vec<String> {
    let caption = caption.to_lowercase();
    TAG_KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| caption.contains(w)))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_tags() {
        assert_eq!(
            caption_tags("A screenshot of program code next to a bar chart"),
            vec!["code", "chart", "screenshot"]
        );
        assert!(caption_tags("a cat on a sofa").is_empty());
    }
}
