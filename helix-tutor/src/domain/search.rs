use serde::{Deserialize, Serialize};

use super::{Extra, MetaValue, SourceType, Unit};

/// Metadata restriction applied during search. Every present criterion must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Any-of set of allowed source types.
    pub source_types: Option<Vec<SourceType>>,
    pub source_name: Option<String>,
    pub extra: Extra,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source_types(mut self, types: impl IntoIterator<Item = SourceType>) -> Self {
        self.source_types = Some(types.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.source_types.is_none() && self.source_name.is_none() && self.extra.is_empty()
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        if let Some(types) = &self.source_types
            && !types.contains(&unit.source_type)
        {
            return false;
        }
        if let Some(name) = &self.source_name
            && &unit.source_name != name
        {
            return false;
        }
        self.extra.iter().all(|(key, wanted)| {
            unit.extra
                .get(key)
                .is_some_and(|value| value.matches(wanted))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredUnit {
    pub unit: Unit,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;

    fn video() -> Unit {
        Unit::new(SourceType::Video, "loops.mp4", 1, "for loops")
            .with_extra(keys::HAS_SUBTITLES, true)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(SearchFilter::new().is_empty());
        assert!(SearchFilter::new().matches(&video()));
    }

    #[test]
    fn test_filter_requires_every_criterion() {
        let filter = SearchFilter::new()
            .with_source_types([SourceType::Video, SourceType::Audio])
            .with_extra(keys::HAS_SUBTITLES, true);
        assert!(filter.matches(&video()));

        let wrong_name = filter.clone().with_source_name("other.mp4");
        assert!(!wrong_name.matches(&video()));

        let missing_key = SearchFilter::new().with_extra(keys::PAGE_COUNT, 3_u32);
        assert!(!missing_key.matches(&video()));
    }
}
