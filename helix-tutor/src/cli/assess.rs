use console::style;

use helix_tutor::Result;
use helix_tutor::services::AnswerAssessor;

use super::context::Context;
use super::output;

pub async fn run(ctx: &Context, topic: &str, answer: &str) -> Result<()> {
    let assessor = AnswerAssessor::new(ctx.generator()?);

    let spinner = ctx.spinner("Assessing");
    let assessment = assessor.assess(topic, answer).await;
    spinner.finish_and_clear();
    let assessment = assessment?;

    if ctx.json {
        return output::print_json(&assessment);
    }

    println!("Topic: {}", style(topic).bold());
    println!("Level: {}", style(assessment.level).cyan());
    if !assessment.gaps.is_empty() {
        println!("Gaps:");
        for gap in &assessment.gaps {
            println!("  - {gap}");
        }
    }
    if !assessment.topics.is_empty() {
        println!("Review next:");
        for topic in &assessment.topics {
            println!("  - {topic}");
        }
    }
    Ok(())
}
