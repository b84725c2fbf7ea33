//! craftcost - raw-material bills for crafted items
//!
//! Reads recipe and tag definitions from datapack directories and mod
//! archives, then expands a target item's recipe tree into the raw materials
//! and crafting steps needed to make it. Craft ratios stay exact rationals
//! throughout, so `4 sticks` costs exactly half a log.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{AnalysisResult, Engine, ItemId, Quantity, Recipe, RecipeIndex, TagTable};
pub use storage::Dataset;
