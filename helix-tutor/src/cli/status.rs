use std::collections::BTreeMap;

use console::style;
use serde::Serialize;

use helix_tutor::Result;
use helix_tutor::domain::SourceType;
use helix_tutor::services::SnapshotInfo;

use super::context::Context;
use super::output;

#[derive(Serialize)]
struct StatusReport {
    source_root: String,
    index_path: String,
    embedding_model: String,
    generation_model: String,
    chunk_size: usize,
    chunk_overlap: usize,
    files: BTreeMap<SourceType, usize>,
    snapshot: Option<SnapshotInfo>,
}

pub fn run(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    let files = SourceType::ALL
        .into_iter()
        .map(|t| {
            let folder = config.folders.folder(&config.source_root, t);
            let count = std::fs::read_dir(&folder).map_or(0, |entries| {
                entries
                    .filter_map(std::result::Result::ok)
                    .filter(|e| e.path().is_file())
                    .count()
            });
            (t, count)
        })
        .collect();

    let report = StatusReport {
        source_root: config.source_root.display().to_string(),
        index_path: config.index_path.display().to_string(),
        embedding_model: config.embedding.model.clone(),
        generation_model: config.generation.model.clone(),
        chunk_size: config.chunking.chunk_size,
        chunk_overlap: config.chunking.chunk_overlap,
        files,
        snapshot: SnapshotInfo::read(&config.index_path)?,
    };

    if ctx.json {
        return output::print_json(&report);
    }

    println!("{}", style("Configuration").bold());
    println!("  Material:   {}", report.source_root);
    println!("  Index:      {}", report.index_path);
    println!("  Embeddings: {}", report.embedding_model);
    println!("  Generation: {}", report.generation_model);
    println!("  Chunks:     {} chars, {} overlap", report.chunk_size, report.chunk_overlap);
    println!();
    println!("{}", style("Material files").bold());
    for (source_type, count) in &report.files {
        println!("  {:<6} {count:>5}", source_type.as_str());
    }
    println!();
    match &report.snapshot {
        Some(snapshot) => {
            println!("{}", style("Index").bold());
            println!("  Units:   {}", snapshot.unit_count);
            println!("  Model:   {} ({} dims)", snapshot.model, snapshot.dimension);
            println!("  Saved:   {}", snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => println!("{}", style("No index yet. Run `helix-tutor ingest`.").yellow()),
    }
    Ok(())
}
