use std::collections::BTreeMap;
use std::path::PathBuf;

use console::style;
use serde::Serialize;

use helix_tutor::Result;
use helix_tutor::domain::SourceType;
use helix_tutor::services::{
    IndexMode, IngestionCoordinator, KnowledgeIndex, TypeSummary, commit,
};

use super::context::Context;
use super::output;

#[derive(Serialize)]
struct IngestSummary {
    root: String,
    units: usize,
    indexed: usize,
    skipped: usize,
    saved: bool,
    cleared: bool,
    per_type: BTreeMap<SourceType, TypeSummary>,
    failures: Vec<String>,
}

pub async fn run(ctx: &Context, root: Option<PathBuf>, append: bool, no_save: bool) -> Result<()> {
    let config = &ctx.config;
    let root = root.unwrap_or_else(|| config.source_root.clone());

    let coordinator = IngestionCoordinator::new(ctx.normalizers()?, config.folders.clone());
    let spinner = ctx.spinner(&format!("Reading material in {}", root.display()));
    let report = coordinator.run(&root).await;
    spinner.finish_and_clear();

    let embedder = ctx.embedder().await?;
    let mut index = KnowledgeIndex::new(embedder);
    let mode = if append {
        IndexMode::Append
    } else {
        IndexMode::Rebuild
    };

    let failures: Vec<String> = report.failures.iter().map(ToString::to_string).collect();
    let per_type = report.per_type.clone();
    let units = report.into_units();
    let unit_count = units.len();

    let spinner = ctx.spinner(&format!("Embedding {unit_count} units"));
    let outcome = commit(&mut index, units, mode, &config.index_path, !no_save).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    let summary = IngestSummary {
        root: root.display().to_string(),
        units: unit_count,
        indexed: outcome.indexed,
        skipped: outcome.skipped,
        saved: outcome.saved,
        cleared: outcome.cleared,
        per_type,
        failures,
    };
    if ctx.json {
        return output::print_json(&summary);
    }
    print_summary(&summary, &config.index_path);
    Ok(())
}

fn print_summary(summary: &IngestSummary, index_path: &std::path::Path) {
    println!();
    println!("Ingested {}", style(&summary.root).cyan());
    for (source_type, counts) in &summary.per_type {
        let failed = if counts.failed_files > 0 {
            style(format!(" ({} failed)", counts.failed_files)).yellow().to_string()
        } else {
            String::new()
        };
        println!("  {:<6} {:>5} units{}", source_type.as_str(), counts.units, failed);
    }
    println!();
    println!("Indexed {} units", summary.indexed);
    if summary.skipped > 0 {
        println!("Skipped {} units from sources already indexed", summary.skipped);
    }
    if summary.saved {
        println!("{} Saved index to {}", style("✓").green(), index_path.display());
    }
    if summary.cleared {
        println!(
            "{} No material found, removed the previous index at {}",
            style("!").yellow(),
            index_path.display()
        );
    }
    if !summary.failures.is_empty() {
        println!();
        println!("{}", style("Skipped:").yellow());
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
}
