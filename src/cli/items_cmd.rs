//! Item index CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use super::settings::Settings;
use crate::storage::ItemIndex;

#[derive(Subcommand)]
pub enum ItemsCommands {
    /// Search known item ids by name
    Search {
        /// Search terms; every term must prefix-match. Lists all items when empty.
        query: Option<String>,

        /// Maximum number of results (default: config search_limit, then 50)
        #[arg(long, short = 'l')]
        limit: Option<usize>,

        /// Rebuild the index before searching
        #[arg(long)]
        refresh: bool,
    },

    /// Rebuild the index from the dataset
    Rebuild,

    /// Show index status
    Status,
}

pub fn run(cmd: ItemsCommands, output: &Output, settings: &Settings) -> Result<()> {
    match cmd {
        ItemsCommands::Search {
            query,
            limit,
            refresh,
        } => search(
            output,
            settings,
            query.as_deref().unwrap_or(""),
            limit.unwrap_or(settings.search_limit),
            refresh,
        ),
        ItemsCommands::Rebuild => rebuild(output, settings),
        ItemsCommands::Status => status(output, settings),
    }
}

fn open(output: &Output, settings: &Settings) -> Result<ItemIndex> {
    let index = ItemIndex::open(&settings.index_dir, &settings.datapack_path).with_context(|| {
        format!("Failed to open item index in {}", settings.index_dir.display())
    })?;
    output.verbose_ctx("items", &format!("Index at: {}", index.path().display()));
    Ok(index)
}

fn fill(output: &Output, settings: &Settings, index: &mut ItemIndex) -> Result<usize> {
    let dataset = settings.load_dataset(output)?;
    let count = index
        .rebuild(&dataset.items())
        .context("Failed to rebuild item index")?;
    Ok(count)
}

fn search(
    output: &Output,
    settings: &Settings,
    query: &str,
    limit: usize,
    refresh: bool,
) -> Result<()> {
    let mut index = open(output, settings)?;

    if refresh || index.is_empty()? {
        output.verbose_ctx("items", "Index empty or refresh requested; rebuilding");
        fill(output, settings, &mut index)?;
    }

    let results = index.search(query, limit)?;
    output.verbose_ctx("items", &format!("Found {} results for '{}'", results.len(), query));

    if output.is_json() {
        output.data(&results);
    } else if results.is_empty() {
        println!("No items found for '{}'", query);
    } else {
        for item in &results {
            output.row(&[item.id.as_str(), item.name.as_str()]);
        }
    }

    Ok(())
}

fn rebuild(output: &Output, settings: &Settings) -> Result<()> {
    let mut index = open(output, settings)?;

    let start = std::time::Instant::now();
    let count = fill(output, settings, &mut index)?;
    let duration = start.elapsed();

    if output.is_json() {
        output.data(&serde_json::json!({
            "rebuilt": true,
            "duration_ms": duration.as_millis(),
            "items": count,
            "path": index.path().display().to_string(),
        }));
    } else {
        output.success(&format!("Item index rebuilt in {:?} ({} items)", duration, count));
    }

    Ok(())
}

fn status(output: &Output, settings: &Settings) -> Result<()> {
    let index = open(output, settings)?;
    let status = index.status()?;

    if output.is_json() {
        output.data(&status);
    } else {
        println!("Item Index Status");
        println!("{}", "=".repeat(40));
        println!("Path: {}", status.path.display());
        println!("Items: {}", status.items);
        println!(
            "Search: {}",
            if status.full_text { "full-text (FTS5)" } else { "substring (LIKE)" }
        );
        println!(
            "Built: {}",
            status.built_at.as_deref().unwrap_or("never")
        );
        if let Some(source) = &status.source_path {
            println!("Source: {}", source);
        }

        if status.items == 0 {
            println!();
            println!("Run 'craftcost items rebuild' to build the index.");
        }
    }

    Ok(())
}
