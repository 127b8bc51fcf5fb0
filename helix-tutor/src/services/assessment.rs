//! Classifies a learner's free-text answer about a topic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::Level;
use crate::error::{HelixTutorError, Result};
use crate::ports::TextGenerator;

const ASSESSMENT_TEMPLATE: &str = "Analyse this answer about {topic}:
{answer}

Classify:
1. Level (beginner/intermediate/advanced)
2. Main knowledge gaps (list)
3. Topics to reinforce (list)

Reply with JSON only, shaped as
{\"level\": \"...\", \"gaps\": [\"...\"], \"topics\": [\"...\"]}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub level: Level,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

pub struct AnswerAssessor<G: TextGenerator> {
    generator: Arc<G>,
}

impl<G: TextGenerator> AnswerAssessor<G> {
    pub const fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    pub async fn assess(&self, topic: &str, answer: &str) -> Result<Assessment> {
        if answer.trim().is_empty() {
            return Err(HelixTutorError::InvalidArgument(
                "answer must not be empty".to_string(),
            ));
        }
        let prompt = ASSESSMENT_TEMPLATE
            .replace("{topic}", topic)
            .replace("{answer}", answer);
        let reply = self.generator.generate(&prompt).await?;
        parse_assessment(&reply)
    }
}

/// Reads the first JSON object in `reply`; models often wrap it in prose or
/// code fences.
pub fn parse_assessment(reply: &str) -> Result<Assessment> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(HelixTutorError::Generation(
            "assessment reply contains no JSON object".to_string(),
        ));
    };
    if end < start {
        return Err(HelixTutorError::Generation(
            "assessment reply contains no JSON object".to_string(),
        ));
    }

    let raw: RawAssessment = serde_json::from_str(&reply[start..=end])
        .map_err(|e| HelixTutorError::Generation(format!("malformed assessment: {e}")))?;
    let level = raw
        .level
        .parse()
        .map_err(|e: String| HelixTutorError::Generation(e))?;
    Ok(Assessment {
        level,
        gaps: raw.gaps,
        topics: raw.topics,
    })
}

#[derive(Deserialize)]
struct RawAssessment {
    level: String,
    #[serde(default)]
    gaps: Vec<String>,
    #[serde(default)]
    topics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"level\": \"Beginner\", \"gaps\": [\"borrowing\"], \"topics\": [\"references\"]}\n```";
        assert_eq!(
            parse_assessment(reply).unwrap(),
            Assessment {
                level: Level::Beginner,
                gaps: vec!["borrowing".to_string()],
                topics: vec!["references".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let assessment = parse_assessment("{\"level\": \"advanced\"}").unwrap();
        assert_eq!(assessment.level, Level::Advanced);
        assert!(assessment.gaps.is_empty());
    }

    #[test]
    fn test_prose_reply_is_a_generation_error() {
        assert!(matches!(
            parse_assessment("The learner seems fine."),
            Err(HelixTutorError::Generation(_))
        ));
        assert!(matches!(
            parse_assessment("{\"level\": \"guru\"}"),
            Err(HelixTutorError::Generation(_))
        ));
    }
}
