use serde::Serialize;

use helix_tutor::Result;
use helix_tutor::domain::{Level, OutputFormat};
use helix_tutor::services::Retriever;

use super::context::Context;
use super::output;

#[derive(Serialize)]
struct AskResponse<'a> {
    question: &'a str,
    level: Level,
    format: OutputFormat,
    sources: Vec<String>,
    answer: String,
}

pub async fn run(
    ctx: &Context,
    question: &str,
    level: Level,
    format: OutputFormat,
    limit: Option<usize>,
    stream: bool,
) -> Result<()> {
    let index = ctx.open_index().await?;
    let retriever = Retriever::new(&index, &ctx.config.retrieval);
    let units = match limit {
        Some(k) => retriever.retrieve_k(question, k, format).await,
        None => retriever.retrieve(question, format).await,
    };

    let spinner = ctx.spinner("Thinking");
    let answer = ctx.composer()?.compose(question, &units, level, format).await;
    spinner.finish_and_clear();

    if ctx.json {
        let response = AskResponse {
            question,
            level,
            format,
            sources: units
                .iter()
                .map(|u| format!("{}#{}", u.source_name, u.sequence_index))
                .collect(),
            answer,
        };
        return output::print_json(&response);
    }

    if stream {
        output::stream(&answer).await
    } else {
        println!("{answer}");
        Ok(())
    }
}
