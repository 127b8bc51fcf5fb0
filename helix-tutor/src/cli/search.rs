use console::style;

use helix_tutor::Result;
use helix_tutor::domain::{SearchFilter, SourceType};

use super::context::Context;
use super::output;

pub async fn run(ctx: &Context, query: &str, limit: usize, types: Vec<SourceType>) -> Result<()> {
    let index = ctx.open_index().await?;
    let filter = (!types.is_empty()).then(|| SearchFilter::new().with_source_types(types));

    let results = index.search_scored(query, limit, filter.as_ref()).await?;

    if ctx.json {
        return output::print_json(&results);
    }

    if results.is_empty() {
        println!("No results found for: \"{query}\"");
        return Ok(());
    }

    println!();
    println!("Query: \"{query}\"");
    println!("Found: {} results", results.len());
    println!();
    for (i, result) in results.iter().enumerate() {
        let unit = &result.unit;
        println!(
            "[{}] {} #{} {}",
            i + 1,
            style(&unit.source_name).bold(),
            unit.sequence_index,
            style(format!("({})", unit.source_type)).dim()
        );
        println!("    Score: {:.3}", result.score);
        println!("    {}", output::preview(&unit.content, 160));
        println!();
    }
    Ok(())
}
