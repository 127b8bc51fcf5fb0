use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use helix_tutor::Result;
use helix_tutor::domain::{ConversationTurn, Level, OutputFormat, infer_preferred_format};
use helix_tutor::services::Retriever;

use super::context::Context;
use super::output;

const HELP: &str = "Commands: /format <text|video|audio|auto>, /level <beginner|intermediate|advanced>, /help, exit";

enum Input {
    Quit,
    Help,
    Format(Option<OutputFormat>),
    Level(Level),
    Invalid(String),
    Question(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "exit" | "quit" | "/exit" | "/quit" => return Input::Quit,
        "/help" => return Input::Help,
        _ => {}
    }
    if let Some(arg) = line.strip_prefix("/format") {
        let arg = arg.trim();
        if arg.eq_ignore_ascii_case("auto") {
            return Input::Format(None);
        }
        return arg
            .parse()
            .map_or_else(Input::Invalid, |f| Input::Format(Some(f)));
    }
    if let Some(arg) = line.strip_prefix("/level") {
        return arg.trim().parse().map_or_else(Input::Invalid, Input::Level);
    }
    Input::Question(line.to_string())
}

/// Interactive session. The history lives here, in the caller; the composer
/// only sees the turns passed to it.
pub async fn run(ctx: &Context, mut level: Level, mut fixed_format: Option<OutputFormat>) -> Result<()> {
    let index = ctx.open_index().await?;
    let retriever = Retriever::new(&index, &ctx.config.retrieval);
    let composer = ctx.composer()?;
    let mut history: Vec<ConversationTurn> = Vec::new();

    println!("{}", style("helix-tutor chat").bold());
    println!("{}", style(HELP).dim());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Format(format) => {
                fixed_format = format;
                let shown = format.map_or("auto", OutputFormat::as_str);
                println!("Format: {shown}");
            }
            Input::Level(new_level) => {
                level = new_level;
                println!("Level: {level}");
            }
            Input::Invalid(message) => println!("{}", style(message).yellow()),
            Input::Question(question) => {
                let format = fixed_format.unwrap_or_else(|| infer_preferred_format(&history));
                let units = retriever.retrieve(&question, format).await;
                let answer = composer
                    .compose_with_history(&question, &units, level, format, &history)
                    .await;

                output::stream(&answer).await?;
                println!();

                history.push(ConversationTurn::user(question));
                history.push(ConversationTurn::assistant(answer).with_metadata("format", format.as_str()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_input("quit"), Input::Quit));
        assert!(matches!(parse_input("/format auto"), Input::Format(None)));
        assert!(matches!(
            parse_input("/format video"),
            Input::Format(Some(OutputFormat::Video))
        ));
        assert!(matches!(parse_input("/level advanced"), Input::Level(Level::Advanced)));
        assert!(matches!(parse_input("/level wizard"), Input::Invalid(_)));
        assert!(matches!(parse_input("what is a loop?"), Input::Question(_)));
    }
}
