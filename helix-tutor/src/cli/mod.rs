use std::path::PathBuf;

use clap::{Parser, Subcommand};

use helix_tutor::Result;
use helix_tutor::domain::{Level, OutputFormat, SourceType};

mod ask;
mod assess;
mod chat;
mod context;
mod ingest;
mod init;
mod output;
mod search;
mod status;

use context::Context;

#[derive(Parser)]
#[command(name = "helix-tutor")]
#[command(about = "Adaptive tutor over a local multimedia knowledge base")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the material folders and a project configuration")]
    Init {
        #[arg(long, help = "Overwrite existing configuration")]
        force: bool,
    },

    #[command(about = "Normalize the material folders and build the index")]
    Ingest {
        #[arg(long, help = "Material root (defaults to source_root)")]
        root: Option<PathBuf>,

        #[arg(long, help = "Add to the saved index instead of rebuilding it")]
        append: bool,

        #[arg(long, help = "Do not write the index snapshot")]
        no_save: bool,
    },

    #[command(about = "Search the knowledge base")]
    Search {
        #[arg(help = "Search query")]
        query: String,

        #[arg(
            long,
            default_value = "5",
            value_parser = positive_count(),
            help = "Maximum results to return"
        )]
        limit: usize,

        #[arg(long = "type", help = "Restrict to a source type (repeatable)")]
        types: Vec<SourceType>,
    },

    #[command(about = "Ask the tutor a question")]
    Ask {
        #[arg(help = "Question")]
        question: String,

        #[arg(long, default_value = "intermediate", help = "beginner, intermediate, advanced")]
        level: Level,

        #[arg(long, default_value = "text", help = "text, video, audio")]
        format: OutputFormat,

        #[arg(long, value_parser = positive_count(), help = "Units of context to retrieve")]
        limit: Option<usize>,

        #[arg(long, help = "Print the answer progressively")]
        stream: bool,
    },

    #[command(about = "Interactive tutoring session")]
    Chat {
        #[arg(long, default_value = "intermediate", help = "beginner, intermediate, advanced")]
        level: Level,

        #[arg(long, help = "text, video, audio (inferred from the session when omitted)")]
        format: Option<OutputFormat>,
    },

    #[command(about = "Assess a learner's answer about a topic")]
    Assess {
        #[arg(long, help = "Topic the answer is about")]
        topic: String,

        #[arg(help = "The learner's answer")]
        answer: String,
    },

    #[command(about = "Show configuration and index status")]
    Status,
}

fn positive_count() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::new().range(1..)
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(cli.config.as_deref(), cli.json)?;

    match cli.command {
        Commands::Init { force } => init::run(&ctx, force),
        Commands::Ingest {
            root,
            append,
            no_save,
        } => ingest::run(&ctx, root, append, no_save).await,
        Commands::Search {
            query,
            limit,
            types,
        } => search::run(&ctx, &query, limit, types).await,
        Commands::Ask {
            question,
            level,
            format,
            limit,
            stream,
        } => ask::run(&ctx, &question, level, format, limit, stream).await,
        Commands::Chat { level, format } => chat::run(&ctx, level, format).await,
        Commands::Assess { topic, answer } => assess::run(&ctx, &topic, &answer).await,
        Commands::Status => status::run(&ctx),
    }
}
