use console::style;
use serde::Serialize;

use helix_tutor::{Config, HelixTutorError, Result};

use super::context::Context;
use super::output;

#[derive(Serialize)]
struct InitSummary {
    config_path: String,
    config_written: bool,
    created_folders: Vec<String>,
}

pub fn run(ctx: &Context, force: bool) -> Result<()> {
    let config_path = Config::project_path();
    let config_written = if config_path.exists() && !force {
        tracing::info!("Keeping existing {}", config_path.display());
        false
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, ctx.config.to_toml()?)?;
        true
    };

    let root = &ctx.config.source_root;
    if root.exists() && !root.is_dir() {
        return Err(HelixTutorError::InvalidArgument(format!(
            "{} exists and is not a directory",
            root.display()
        )));
    }
    let created = ctx.config.folders.provision(root)?;

    let summary = InitSummary {
        config_path: config_path.display().to_string(),
        config_written,
        created_folders: created.iter().map(|p| p.display().to_string()).collect(),
    };
    if ctx.json {
        return output::print_json(&summary);
    }

    if config_written {
        println!("{} Wrote {}", style("✓").green(), summary.config_path);
    } else {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("•").dim(),
            summary.config_path
        );
    }
    for folder in &summary.created_folders {
        println!("{} Created {}", style("✓").green(), folder);
    }
    println!();
    println!(
        "Put study material under {} and run `helix-tutor ingest`.",
        style(root.display()).cyan()
    );
    Ok(())
}
