//! Canonical recipe model
//!
//! Every recipe dialect found in game data normalizes into [`Recipe`]:
//! one output item with a positive count, and an ordered list of
//! ingredients that each name an item or a tag.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::id::{ItemId, ItemRef, RecipeId};
use super::quantity::Quantity;

/// Where a document was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Loose files on disk (datapacks, instance folders)
    Disk,
    /// Entries inside a mod archive (`.jar` / `.zip`)
    Archive,
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Origin::Disk => "disk",
            Origin::Archive => "archive",
        }
    }
}

/// Origin plus a stable discovery sequence
///
/// Ordering is the merge precedence: on-disk before archive, then
/// first-discovered first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Provenance {
    pub origin: Origin,
    pub order: u64,
    /// Human-readable location (file path, or `archive!entry`)
    pub source: String,
}

impl Provenance {
    pub fn disk(order: u64, source: impl Into<String>) -> Self {
        Self {
            origin: Origin::Disk,
            order,
            source: source.into(),
        }
    }

    pub fn archive(order: u64, source: impl Into<String>) -> Self {
        Self {
            origin: Origin::Archive,
            order,
            source: source.into(),
        }
    }
}

impl Ord for Provenance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.origin
            .cmp(&other.origin)
            .then(self.order.cmp(&other.order))
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl PartialOrd for Provenance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} ({})", self.origin.label(), self.order, self.source)
    }
}

/// The recipe dialect a record was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    Shaped,
    Shapeless,
    Smelting,
    Blasting,
    Smoking,
    CampfireCooking,
    Stonecutting,
    SmithingTransform,
}

impl RecipeKind {
    /// Maps a `type` field (namespace optional) to a known dialect
    pub fn from_type(type_name: &str) -> Option<Self> {
        let name = type_name
            .strip_prefix("minecraft:")
            .unwrap_or(type_name);

        match name {
            "crafting_shaped" => Some(RecipeKind::Shaped),
            "crafting_shapeless" => Some(RecipeKind::Shapeless),
            "smelting" => Some(RecipeKind::Smelting),
            "blasting" => Some(RecipeKind::Blasting),
            "smoking" => Some(RecipeKind::Smoking),
            "campfire_cooking" => Some(RecipeKind::CampfireCooking),
            "stonecutting" => Some(RecipeKind::Stonecutting),
            "smithing_transform" => Some(RecipeKind::SmithingTransform),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecipeKind::Shaped => "crafting_shaped",
            RecipeKind::Shapeless => "crafting_shapeless",
            RecipeKind::Smelting => "smelting",
            RecipeKind::Blasting => "blasting",
            RecipeKind::Smoking => "smoking",
            RecipeKind::CampfireCooking => "campfire_cooking",
            RecipeKind::Stonecutting => "stonecutting",
            RecipeKind::SmithingTransform => "smithing_transform",
        }
    }
}

/// One ingredient slot: an item or tag, and how many are consumed per craft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub what: ItemRef,
    pub count: Quantity,
}

impl Ingredient {
    pub fn new(what: ItemRef, count: impl Into<Quantity>) -> Self {
        Self {
            what,
            count: count.into(),
        }
    }
}

/// A normalized recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub kind: RecipeKind,
    pub output: ItemId,
    /// Always positive; enforced by the normalizer
    pub output_count: Quantity,
    pub ingredients: Vec<Ingredient>,
    pub provenance: Provenance,
}

impl Recipe {
    /// Adds `count` of `what`, merging with an existing slot for the same reference
    pub fn push_ingredient(ingredients: &mut Vec<Ingredient>, what: ItemRef, count: Quantity) {
        match ingredients.iter_mut().find(|i| i.what == what) {
            Some(existing) => existing.count += &count,
            None => ingredients.push(Ingredient { what, count }),
        }
    }
}
