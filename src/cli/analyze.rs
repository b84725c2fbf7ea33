//! Bill-of-materials command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use super::settings::Settings;
use crate::domain::{analysis_to_diagram, render_text, to_json, ItemId, Quantity};

/// Quantity requested on the command line
#[derive(Debug, Clone)]
pub enum Amount {
    Exact(Quantity),
    /// A cube of blocks, N per side
    Cube(u32),
}

impl Amount {
    pub fn from_args(quantity: Option<Quantity>, cube: Option<u32>) -> Self {
        match (quantity, cube) {
            (_, Some(side)) => Amount::Cube(side),
            (Some(quantity), None) => Amount::Exact(quantity),
            (None, None) => Amount::Exact(Quantity::one()),
        }
    }

    pub fn quantity(&self) -> Quantity {
        match self {
            Amount::Exact(quantity) => quantity.clone(),
            Amount::Cube(side) => {
                let side = Quantity::from(*side);
                &(&side * &side) * &side
            }
        }
    }
}

pub fn run(
    output: &Output,
    settings: &Settings,
    item: &str,
    amount: Amount,
    diagram: bool,
    out_file: Option<&Path>,
) -> Result<()> {
    let target: ItemId = item
        .parse()
        .with_context(|| format!("Invalid item id: {}", item))?;
    let quantity = amount.quantity();
    output.verbose_ctx("analyze", &format!("Target: {} x{}", target, quantity));

    let dataset = settings.load_dataset(output)?;
    if !dataset.recipes().contains(&target) {
        output.note(&format!("no recipe produces {}; treating it as a raw material", target));
    }

    let result = dataset.engine().analyze(&target, &quantity)?;
    output.verbose_ctx(
        "analyze",
        &format!(
            "{} raw materials, {} steps, {} diagnostics",
            result.total_raw_materials.len(),
            result.steps.len(),
            result.diagnostics.len()
        ),
    );

    let json = to_json(&result).context("Failed to serialize bill of materials")?;

    match out_file {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            output.success(&format!("Wrote bill of materials to {}", path.display()));
        }
        None if output.is_json() => println!("{}", json),
        None => print!("{}", render_text(&result)),
    }

    if diagram {
        if out_file.is_none() {
            println!("\n---\n");
        }
        print!("{}", analysis_to_diagram(&result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_side_cubed() {
        assert_eq!(Amount::from_args(None, Some(3)).quantity(), Quantity::from(27u32));
    }

    #[test]
    fn cube_beyond_i64_range_is_exact() {
        let quantity = Amount::from_args(None, Some(3_000_000)).quantity();
        assert_eq!(quantity.to_string(), "27000000000000000000");

        let largest = Amount::from_args(None, Some(u32::MAX)).quantity();
        assert!(largest.is_positive());
        assert_eq!(largest.to_string(), "79228162458924105385300197375");
    }

    #[test]
    fn quantity_defaults_to_one() {
        assert_eq!(Amount::from_args(None, None).quantity(), Quantity::one());
    }

    #[test]
    fn explicit_quantity_is_kept() {
        let half: Quantity = "1/2".parse().unwrap();
        assert_eq!(Amount::from_args(Some(half.clone()), None).quantity(), half);
    }
}
