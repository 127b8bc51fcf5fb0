use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One exchange in a conversation. History is owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    fn recorded_format(&self) -> OutputFormat {
        if let Some(format) = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("format"))
            .and_then(|f| f.parse().ok())
        {
            return format;
        }
        if self.content.contains("[VIDEO]") {
            OutputFormat::Video
        } else if self.content.contains("[AUDIO]") {
            OutputFormat::Audio
        } else {
            OutputFormat::Text
        }
    }
}

/// Most frequent format among assistant turns; text wins ties.
pub fn infer_preferred_format(history: &[ConversationTurn]) -> OutputFormat {
    let mut counts = [0_usize; 3];
    for turn in history.iter().filter(|t| t.role == Role::Assistant) {
        let slot = match turn.recorded_format() {
            OutputFormat::Text => 0,
            OutputFormat::Video => 1,
            OutputFormat::Audio => 2,
        };
        counts[slot] += 1;
    }

    let formats = [OutputFormat::Text, OutputFormat::Video, OutputFormat::Audio];
    let mut best = 0;
    for slot in 1..counts.len() {
        if counts[slot] > counts[best] {
            best = slot;
        }
    }
    formats[best]
}
