//! Dataset inspection commands: recipe, tag, check

use anyhow::{Context, Result};

use super::output::Output;
use super::settings::Settings;
use crate::domain::{ItemId, Recipe, TagId};

fn recipe_json(recipe: &Recipe, primary: bool) -> serde_json::Value {
    serde_json::json!({
        "id": recipe.id,
        "kind": recipe.kind.label(),
        "output": recipe.output,
        "output_count": recipe.output_count,
        "ingredients": recipe
            .ingredients
            .iter()
            .map(|i| serde_json::json!({ "ref": i.what.to_string(), "count": i.count }))
            .collect::<Vec<_>>(),
        "origin": recipe.provenance.origin.label(),
        "source": recipe.provenance.source,
        "primary": primary,
    })
}

/// Lists the recipes that produce an item, preferred first
pub fn recipe(output: &Output, settings: &Settings, item: &str) -> Result<()> {
    let item: ItemId = item
        .parse()
        .with_context(|| format!("Invalid item id: {}", item))?;
    let dataset = settings.load_dataset(output)?;
    let candidates = dataset.recipes().candidates(&item);
    output.verbose_ctx("recipe", &format!("{} candidates for {}", candidates.len(), item));

    if output.is_json() {
        let recipes: Vec<_> = candidates
            .iter()
            .enumerate()
            .map(|(n, r)| recipe_json(r, n == 0))
            .collect();
        output.data(&serde_json::json!({ "item": item, "recipes": recipes }));
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No recipe produces {} (raw material)", item);
        return Ok(());
    }

    println!("Recipes for {}:", item);
    for (n, recipe) in candidates.iter().enumerate() {
        println!();
        println!(
            "{}. {} ({}) -> {} x{}{}",
            n + 1,
            recipe.id,
            recipe.kind.label(),
            recipe.output,
            recipe.output_count,
            if n == 0 { "  [used]" } else { "" }
        );
        println!("   from {}", recipe.provenance);
        for ingredient in &recipe.ingredients {
            println!("   - {} x{}", ingredient.what, ingredient.count);
        }
    }

    Ok(())
}

/// Shows the flattened members of a tag
pub fn tag(output: &Output, settings: &Settings, tag: &str) -> Result<()> {
    let tag_id: TagId = tag
        .trim_start_matches('#')
        .parse()
        .with_context(|| format!("Invalid tag id: {}", tag))?;
    let dataset = settings.load_dataset(output)?;

    let members = dataset
        .tags()
        .members(&tag_id)
        .ok_or_else(|| anyhow::anyhow!("Unknown tag: #{}", tag_id))?;

    if output.is_json() {
        output.data(&serde_json::json!({ "tag": tag_id, "members": members }));
        return Ok(());
    }

    println!("#{} ({} members)", tag_id, members.len());
    for (n, member) in members.iter().enumerate() {
        if n == 0 {
            println!("  {}  (used for recipes)", member);
        } else {
            println!("  {}", member);
        }
    }

    Ok(())
}

/// Reports what loading the dataset skipped or cut
pub fn check(output: &Output, settings: &Settings, strict: bool) -> Result<()> {
    let dataset = settings.load_dataset(output)?;
    let report = dataset.report();
    let problems = report.warnings.len() + report.tag_cycles.len() + report.unknown_tags.len();

    if output.is_json() {
        output.data(report);
    } else {
        println!("Dataset: {}", settings.datapack_path.display());
        println!("{}", "=".repeat(40));
        println!("Documents:        {}", report.documents);
        println!("Recipes:          {}", report.recipes);
        println!("  shadowed:       {}", report.shadowed_recipes);
        println!("Craftable items:  {}", report.craftable_items);
        println!("Tags:             {}", report.tags);

        if !report.warnings.is_empty() {
            println!();
            println!("Skipped records ({}):", report.warnings.len());
            for warning in &report.warnings {
                println!("  {}", warning);
            }
        }
        if !report.tag_cycles.is_empty() {
            println!();
            println!("Tag cycles ({}):", report.tag_cycles.len());
            for cycle in &report.tag_cycles {
                println!("  {}", cycle);
            }
        }
        if !report.unknown_tags.is_empty() {
            println!();
            println!("Unknown tag references ({}):", report.unknown_tags.len());
            for unknown in &report.unknown_tags {
                println!("  #{} (in #{})", unknown.tag, unknown.referenced_by);
            }
        }
        if report.is_clean() {
            println!();
            println!("No problems found.");
        }
    }

    if strict && problems > 0 {
        anyhow::bail!("Dataset has {} problem(s)", problems);
    }

    Ok(())
}
