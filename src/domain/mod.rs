//! Domain models for craftcost
//!
//! Recipe normalization, tag resolution and cost propagation, without any I/O.

mod document;
mod engine;
mod export;
mod id;
mod index;
mod normalize;
mod quantity;
mod recipe;
mod tag;

pub use document::{DocumentKind, ParseWarning, ParseWarningKind, RawDocument};
pub use engine::{AnalysisError, AnalysisResult, Breakdown, Diagnostic, Engine, Step};
pub use export::{analysis_to_diagram, render_text, to_json, BomPayload, MaterialEntry, StepEntry};
pub use id::{humanize, IdError, ItemId, ItemRef, RecipeId, TagId, DEFAULT_NAMESPACE};
pub use index::RecipeIndex;
pub use normalize::{normalize_recipe, normalize_recipes};
pub use quantity::{Quantity, QuantityError};
pub use recipe::{Ingredient, Origin, Provenance, Recipe, RecipeKind};
pub use tag::{TagBuild, TagCycleError, TagDefinition, TagTable, UnknownTagReference};
