//! Turns retrieved units into a tutor answer.
//!
//! With no units the answer is a fixed off-topic message and the language
//! model is never called. Generation failures become a fixed apology, so
//! `compose` always returns text.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::domain::{ConversationTurn, Level, OutputFormat, Role, SourceType, Unit};
use crate::ports::TextGenerator;

pub const OFF_TOPIC_TEXT: &str = "This topic is not covered by the current study materials. \
Try rephrasing the question or add material about it to the knowledge base.";
pub const OFF_TOPIC_VIDEO: &str = "No video in the current study materials covers this topic. \
Add a recording about it to the videos folder and ingest again.";
pub const OFF_TOPIC_AUDIO: &str = "No audio in the current study materials covers this topic. \
Add a recording about it to the audios folder and ingest again.";
pub const APOLOGY: &str = "Sorry, something went wrong while preparing your answer. Please try again.";
pub const TRUNCATION_MARKER: &str = "[...truncated]";

/// Turns of history rendered into the prompt by [`ResponseComposer::compose_with_history`].
pub const HISTORY_TURNS: usize = 6;

const PROMPT_TEMPLATE: &str = "You are an adaptive programming tutor.
Answer using only the study material below.

Study material:
{context}

Answer considering:
- Learner level: {level}
- Preferred format: {format}

Your answer must include:
1. A clear explanation
2. A concrete example
3. A recommended resource from the study material

Output layout:
- Explanation: [text]
- Example: [code or concept]
- Resource: [type: name]

Question: {question}";

pub struct ResponseComposer<G: TextGenerator> {
    generator: Arc<G>,
    excerpt_chars: usize,
}

impl<G: TextGenerator> ResponseComposer<G> {
    pub const fn new(generator: Arc<G>, excerpt_chars: usize) -> Self {
        Self {
            generator,
            excerpt_chars,
        }
    }

    pub async fn compose(
        &self,
        question: &str,
        units: &[Unit],
        level: Level,
        format: OutputFormat,
    ) -> String {
        self.compose_with_history(question, units, level, format, &[])
            .await
    }

    /// Like [`compose`](Self::compose), with the last few conversation turns
    /// added ahead of the study material.
    pub async fn compose_with_history(
        &self,
        question: &str,
        units: &[Unit],
        level: Level,
        format: OutputFormat,
        history: &[ConversationTurn],
    ) -> String {
        if units.is_empty() {
            tracing::info!("No material for question, answering off-topic");
            return off_topic_message(format).to_string();
        }

        let mut context = render_history(history);
        context.push_str(&self.render_context(units));
        let prompt = build_prompt(&context, level, format, question);

        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Generation with {} failed: {}", self.generator.model_name(), e);
                return APOLOGY.to_string();
            }
        };

        match format.media_type() {
            Some(media) => {
                let listing = media_listing(units, media);
                if listing.is_empty() {
                    answer
                } else {
                    format!("{listing}\n{answer}")
                }
            }
            None => answer,
        }
    }

    fn render_context(&self, units: &[Unit]) -> String {
        let mut context = String::new();
        for unit in units {
            let _ = writeln!(
                context,
                "[{} | {}]\n{}\n",
                unit.source_name,
                unit.source_type,
                excerpt(&unit.content, self.excerpt_chars)
            );
        }
        context
    }
}

pub const fn off_topic_message(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => OFF_TOPIC_TEXT,
        OutputFormat::Video => OFF_TOPIC_VIDEO,
        OutputFormat::Audio => OFF_TOPIC_AUDIO,
    }
}

fn build_prompt(context: &str, level: Level, format: OutputFormat, question: &str) -> String {
    let fields = [
        ("{context}", context),
        ("{level}", level.as_str()),
        ("{format}", format.as_str()),
        ("{question}", question),
    ];

    // Single pass over the template, so placeholder text inside a value is kept verbatim.
    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = PROMPT_TEMPLATE;
    while let Some(open) = rest.find('{') {
        prompt.push_str(&rest[..open]);
        rest = &rest[open..];
        match fields.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                prompt.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                prompt.push('{');
                rest = &rest[1..];
            }
        }
    }
    prompt.push_str(rest);
    prompt
}

/// At most `max_chars` chars of `content`, with a marker when cut.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_end, _)) => format!("{} {TRUNCATION_MARKER}", &content[..byte_end]),
        None => content.to_string(),
    }
}

fn render_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let start = history.len().saturating_sub(HISTORY_TURNS);
    let mut out = String::from("Conversation so far:\n");
    for turn in &history[start..] {
        let speaker = match turn.role {
            Role::User => "Learner",
            Role::Assistant => "Tutor",
        };
        let _ = writeln!(out, "{speaker}: {}", turn.content);
    }
    out.push('\n');
    out
}

fn media_listing(units: &[Unit], media: SourceType) -> String {
    let mut seen = Vec::new();
    for unit in units.iter().filter(|u| u.source_type == media) {
        if !seen.iter().any(|u: &&Unit| u.source_name == unit.source_name) {
            seen.push(unit);
        }
    }
    if seen.is_empty() {
        return String::new();
    }

    let mut out = format!("Related {} material:\n", media);
    for unit in seen {
        let duration = unit
            .duration_seconds()
            .map_or_else(|| "unknown duration".to_string(), format_duration);
        let _ = writeln!(
            out,
            "- {} ({}) - {}",
            unit.source_name,
            duration,
            placeholder_link(unit)
        );
    }
    out
}

fn placeholder_link(unit: &Unit) -> String {
    format!("media://{}/{}", unit.source_type, unit.source_name.replace(' ', "%20"))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // durations are small and non-negative
fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;
    use crate::error::{HelixTutorError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Explanation: loops repeat.".to_string())
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(HelixTutorError::Generation("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "offline"
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.4), "1:05");
        assert_eq!(format_duration(3600.0), "60:00");
    }

    #[test]
    fn test_excerpt_marks_truncation() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("ação ação", 4), format!("ação {TRUNCATION_MARKER}"));
    }

    #[tokio::test]
    async fn test_off_topic_skips_generation() {
        let recorder = Arc::new(Recorder::default());
        let composer = ResponseComposer::new(Arc::clone(&recorder), 100);
        let answer = composer
            .compose("what is a monad?", &[], Level::Beginner, OutputFormat::Audio)
            .await;
        assert_eq!(answer, OFF_TOPIC_AUDIO);
        assert!(recorder.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_apology() {
        let composer = ResponseComposer::new(Arc::new(Offline), 100);
        let units = vec![Unit::new(SourceType::Text, "loops.md", 1, "loops repeat")];
        let answer = composer
            .compose("loops?", &units, Level::Intermediate, OutputFormat::Text)
            .await;
        assert_eq!(answer, APOLOGY);
    }

    #[tokio::test]
    async fn test_prompt_carries_history_and_bounded_context() {
        let recorder = Arc::new(Recorder::default());
        let composer = ResponseComposer::new(Arc::clone(&recorder), 5);
        let units = vec![Unit::new(SourceType::Text, "loops.md", 1, "loops repeat code")];
        let history: Vec<ConversationTurn> = (0..8)
            .map(|i| ConversationTurn::user(format!("turn {i}")))
            .collect();

        composer
            .compose_with_history("loops?", &units, Level::Advanced, OutputFormat::Text, &history)
            .await;

        let prompts = recorder.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains(&format!("loops {TRUNCATION_MARKER}")));
        assert!(prompt.contains("Learner level: advanced"));
        assert!(!prompt.contains("turn 1\n"));
        assert!(prompt.contains("turn 2\n"));
        assert!(prompt.contains("turn 7\n"));
    }

    #[test]
    fn test_placeholders_in_values_are_not_expanded() {
        let prompt = build_prompt(
            "[loops.md | text]\nloops repeat {question}\n",
            Level::Beginner,
            OutputFormat::Text,
            "what does {context} mean?",
        );
        assert_eq!(prompt.matches("loops repeat").count(), 1);
        assert!(prompt.contains("loops repeat {question}\n"));
        assert!(prompt.ends_with("Question: what does {context} mean?"));
        assert!(prompt.contains("Learner level: beginner"));
    }

    #[tokio::test]
    async fn test_video_listing_dedupes_sources() {
        let composer = ResponseComposer::new(Arc::new(Recorder::default()), 100);
        let units = vec![
            Unit::new(SourceType::Video, "intro.mp4", 1, "loops")
                .with_extra(keys::DURATION_SECONDS, 125.0),
            Unit::new(SourceType::Video, "intro.mp4", 2, "more loops"),
            Unit::new(SourceType::Video, "advanced.mp4", 1, "iterators"),
        ];
        let answer = composer
            .compose("loops?", &units, Level::Beginner, OutputFormat::Video)
            .await;
        assert!(answer.starts_with("Related video material:\n- intro.mp4 (2:05)"));
        assert!(answer.contains("- advanced.mp4 (unknown duration)"));
        assert_eq!(answer.matches("intro.mp4").count(), 2);
    }
}
