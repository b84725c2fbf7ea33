//! Recipe index: normalized recipes grouped by the item they produce.

use std::collections::{BTreeMap, HashSet};

use super::id::{ItemId, RecipeId};
use super::recipe::Recipe;

/// Candidate recipes per output item, best candidate first
///
/// Candidates are ordered on-disk before archive, then by discovery order.
/// Resolution always commits to the first candidate; the full list is kept so
/// a ranking strategy can choose differently later without a model change.
#[derive(Debug, Clone, Default)]
pub struct RecipeIndex {
    by_output: BTreeMap<ItemId, Vec<Recipe>>,
    shadowed: Vec<Recipe>,
}

impl RecipeIndex {
    /// Builds the index from normalized recipes
    ///
    /// When several documents define the same recipe id, only the
    /// highest-precedence one is indexed; the others are kept as shadowed.
    pub fn build(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let mut recipes: Vec<Recipe> = recipes.into_iter().collect();
        recipes.sort_by(|a, b| a.provenance.cmp(&b.provenance));

        let mut seen_ids: HashSet<RecipeId> = HashSet::new();
        let mut by_output: BTreeMap<ItemId, Vec<Recipe>> = BTreeMap::new();
        let mut shadowed = Vec::new();

        for recipe in recipes {
            if !seen_ids.insert(recipe.id.clone()) {
                tracing::debug!(
                    recipe = %recipe.id,
                    source = %recipe.provenance.source,
                    "recipe id already defined with higher precedence"
                );
                shadowed.push(recipe);
                continue;
            }
            by_output
                .entry(recipe.output.clone())
                .or_default()
                .push(recipe);
        }

        Self {
            by_output,
            shadowed,
        }
    }

    /// The recipe resolution uses for `item`
    pub fn primary(&self, item: &ItemId) -> Option<&Recipe> {
        self.by_output.get(item).and_then(|candidates| candidates.first())
    }

    /// All candidates for `item`, in preference order
    pub fn candidates(&self, item: &ItemId) -> &[Recipe] {
        self.by_output
            .get(item)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.by_output.contains_key(item)
    }

    /// Number of craftable items
    pub fn len(&self) -> usize {
        self.by_output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_output.is_empty()
    }

    /// Number of indexed recipes across all items
    pub fn recipe_count(&self) -> usize {
        self.by_output.values().map(Vec::len).sum()
    }

    /// Recipes dropped because an equal id had higher precedence
    pub fn shadowed(&self) -> &[Recipe] {
        &self.shadowed
    }

    /// Craftable items in id order
    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.by_output.keys()
    }

    /// Every indexed recipe, grouped by output in id order
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.by_output.values().flatten()
    }
}
