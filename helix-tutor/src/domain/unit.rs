use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Type-specific attributes attached to a [`Unit`].
pub type Extra = BTreeMap<String, MetaValue>;

pub mod keys {
    pub const DURATION_SECONDS: &str = "duration_seconds";
    pub const RESOLUTION: &str = "resolution";
    pub const HAS_SUBTITLES: &str = "has_subtitles";
    pub const PAGE_COUNT: &str = "page_count";
    pub const SEGMENTS: &str = "segments";
    pub const TAGS: &str = "tags";
    pub const FORMAT: &str = "format";
}

/// The atomic indexed item: one normalized slice of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub content: String,
    pub source_type: SourceType,
    pub source_name: String,
    /// 1-based ordinal among the units derived from the same source.
    pub sequence_index: u32,
    #[serde(default)]
    pub extra: Extra,
}

impl Unit {
    pub fn new(
        source_type: SourceType,
        source_name: impl Into<String>,
        sequence_index: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source_type,
            source_name: source_name.into(),
            sequence_index,
            extra: Extra::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        match self.extra.get(keys::DURATION_SECONDS) {
            Some(MetaValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self.extra.get(keys::TAGS) {
            Some(MetaValue::List(tags)) => tags,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Pdf,
    Audio,
    Video,
    Image,
}

impl SourceType {
    pub const ALL: [Self; 5] = [Self::Text, Self::Pdf, Self::Audio, Self::Video, Self::Image];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "md" => Ok(Self::Text),
            "pdf" | "document" => Ok(Self::Pdf),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            _ => Err(format!("Unknown source type: {s}")),
        }
    }
}

/// A metadata value. Untagged so snapshots stay readable as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    /// Equality for filtering; a list matches a text value it contains.
    pub fn matches(&self, wanted: &Self) -> bool {
        match (self, wanted) {
            (Self::List(items), Self::Text(t)) => items.iter().any(|i| i == t),
            (Self::Number(a), Self::Number(b)) => (a - b).abs() < f64::EPSILON,
            _ => self == wanted,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for MetaValue {
    #[allow(clippy::cast_precision_loss)] // counts are far below 2^52
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_value_roundtrips_untagged() {
        let unit = Unit::new(SourceType::Video, "intro.mp4", 1, "hello")
            .with_extra(keys::HAS_SUBTITLES, false)
            .with_extra(keys::DURATION_SECONDS, 12.5)
            .with_extra(keys::RESOLUTION, "1280x720")
            .with_extra(keys::TAGS, vec!["code".to_string()]);

        let json = serde_json::to_string(&unit).unwrap();
        assert!(json.contains("\"has_subtitles\":false"));
        assert!(json.contains("\"source_type\":\"video\""));

        let back: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unit);
    }

    #[test]
    fn test_list_matches_contained_text() {
        let tags = MetaValue::List(vec!["diagram".into(), "code".into()]);
        assert!(tags.matches(&MetaValue::from("code")));
        assert!(!tags.matches(&MetaValue::from("chart")));
        assert!(MetaValue::from(true).matches(&MetaValue::Flag(true)));
    }

    #[test]
    fn test_source_type_parse() {
        assert_eq!("Video".parse::<SourceType>().unwrap(), SourceType::Video);
        assert_eq!("document".parse::<SourceType>().unwrap(), SourceType::Pdf);
        assert!("slides".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_accessors() {
        let unit = Unit::new(SourceType::Audio, "a.mp3", 1, "x").with_extra(keys::DURATION_SECONDS, 61.0);
        assert_eq!(unit.duration_seconds(), Some(61.0));
        assert!(unit.tags().is_empty());
    }
}
