//! Resolution engine
//!
//! Computes the raw-material bill for a target item by expanding recipes
//! depth-first. The traversal runs on an explicit work stack, so deep
//! production chains never touch the native call stack.
//!
//! Each analysis owns two pieces of state:
//! - `active`: items on the current expansion path (cycle guard)
//! - `memo`: the raw breakdown of exactly one unit of every expanded item
//!
//! Costs scale linearly because craft ratios stay exact rationals, so the
//! unit breakdown of an item is computed once and reused at every call site.
//! Step quantities are derived afterwards by pushing the requested quantity
//! down the expansion edges, which aggregates demand from every call site.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::id::{ItemId, ItemRef, RecipeId, TagId};
use super::index::RecipeIndex;
use super::quantity::Quantity;
use super::recipe::Recipe;
use super::tag::TagTable;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(Quantity),
}

/// Raw materials and their counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown(BTreeMap<ItemId, Quantity>);

impl Breakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// One unit of `item` as its own raw material
    pub fn unit(item: &ItemId) -> Self {
        let mut breakdown = Self::new();
        breakdown.add(item, &Quantity::one());
        breakdown
    }

    pub fn add(&mut self, item: &ItemId, count: &Quantity) {
        match self.0.get_mut(item) {
            Some(existing) => *existing += count,
            None => {
                self.0.insert(item.clone(), count.clone());
            }
        }
    }

    /// Adds every entry of `other` multiplied by `factor`
    pub fn add_scaled(&mut self, other: &Breakdown, factor: &Quantity) {
        for (item, count) in &other.0 {
            self.add(item, &(count * factor));
        }
    }

    pub fn scaled(&self, factor: &Quantity) -> Breakdown {
        let mut scaled = Breakdown::new();
        scaled.add_scaled(self, factor);
        scaled
    }

    pub fn get(&self, item: &ItemId) -> Option<&Quantity> {
        self.0.get(item)
    }

    /// Entries in item id order
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &Quantity)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn without_zeros(mut self) -> Self {
        self.0.retain(|_, count| !count.is_zero());
        self
    }
}

impl FromIterator<(ItemId, Quantity)> for Breakdown {
    fn from_iter<I: IntoIterator<Item = (ItemId, Quantity)>>(iter: I) -> Self {
        let mut breakdown = Breakdown::new();
        for (item, count) in iter {
            breakdown.add(&item, &count);
        }
        breakdown
    }
}

/// Something worth knowing about an analysis that did not stop it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The path loops back to its first item; that item was treated as raw
    CycleDetected { path: Vec<ItemId> },
    /// A tag ingredient had no members and was left out of `consumer`'s recipe
    UnresolvedTag { tag: TagId, consumer: ItemId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CycleDetected { path } => {
                let path: Vec<_> = path.iter().map(ToString::to_string).collect();
                write!(f, "cycle detected: {}", path.join(" -> "))
            }
            Diagnostic::UnresolvedTag { tag, consumer } => {
                write!(f, "tag #{} has no members (needed by {})", tag, consumer)
            }
        }
    }
}

/// One crafted intermediate (or the target) and what its crafts consume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub item: ItemId,
    /// Total needed across every place the item is used
    pub quantity_needed: Quantity,
    pub recipe_used: RecipeId,
    pub ingredients_consumed: Vec<(ItemId, Quantity)>,
}

/// Everything one call to [`Engine::analyze`] produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub target: ItemId,
    pub quantity: Quantity,
    pub total_raw_materials: Breakdown,
    /// One per distinct crafted item, each after the steps it consumes
    pub steps: Vec<Step>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Read-only view over a recipe index and tag table
///
/// Holds no mutable state; any number of analyses may run through one engine,
/// including from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    recipes: &'a RecipeIndex,
    tags: &'a TagTable,
}

impl<'a> Engine<'a> {
    pub fn new(recipes: &'a RecipeIndex, tags: &'a TagTable) -> Self {
        Self { recipes, tags }
    }

    /// Bill of materials for `quantity` of `target`
    ///
    /// Items without a recipe (including an unknown target) are raw
    /// materials. Fails only when `quantity` is not positive.
    pub fn analyze(
        &self,
        target: &ItemId,
        quantity: &Quantity,
    ) -> Result<AnalysisResult, AnalysisError> {
        if !quantity.is_positive() {
            return Err(AnalysisError::InvalidQuantity(quantity.clone()));
        }

        let mut traversal = Traversal::new(*self);
        let unit = traversal.expand(target);
        let steps = traversal.steps(target, quantity);

        tracing::debug!(
            target = %target,
            quantity = %quantity,
            steps = steps.len(),
            diagnostics = traversal.diagnostics.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            target: target.clone(),
            quantity: quantity.clone(),
            total_raw_materials: unit.scaled(quantity).without_zeros(),
            steps,
            diagnostics: traversal.diagnostics,
        })
    }

    /// Raw materials for exactly one unit of `item`
    pub fn unit_cost(&self, item: &ItemId) -> Breakdown {
        Traversal::new(*self).expand(item)
    }

    fn resolve(&self, what: &ItemRef) -> Option<ItemId> {
        match what {
            ItemRef::Item(item) => Some(item.clone()),
            ItemRef::Tag(tag) => self.tags.preferred_member(tag).cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    /// The ingredient was crafted; its own expansion carries the cost
    Crafted,
    /// The ingredient is a raw material here (no recipe, or a cycle was cut)
    Raw,
}

/// One ingredient use recorded while expanding an item
#[derive(Debug)]
struct Edge {
    item: ItemId,
    /// Ingredient units consumed per unit of the expanded item
    per_unit: Quantity,
    kind: EdgeKind,
}

/// The finished expansion of one item
#[derive(Debug)]
struct Expansion {
    recipe: RecipeId,
    edges: Vec<Edge>,
}

/// An item being expanded, with a cursor into its recipe's ingredients
struct Frame<'r> {
    item: ItemId,
    recipe: &'r Recipe,
    next: usize,
    unit: Breakdown,
    edges: Vec<Edge>,
}

impl<'r> Frame<'r> {
    fn new(item: ItemId, recipe: &'r Recipe) -> Self {
        Self {
            item,
            recipe,
            next: 0,
            unit: Breakdown::new(),
            edges: Vec::new(),
        }
    }
}

/// State scoped to one top-level analysis
struct Traversal<'a> {
    engine: Engine<'a>,
    memo: HashMap<ItemId, Breakdown>,
    expansions: HashMap<ItemId, Expansion>,
    /// Expanded items in the order their expansion finished
    completed: Vec<ItemId>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Traversal<'a> {
    fn new(engine: Engine<'a>) -> Self {
        Self {
            engine,
            memo: HashMap::new(),
            expansions: HashMap::new(),
            completed: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Unit breakdown of `root`, expanding everything it depends on
    fn expand(&mut self, root: &ItemId) -> Breakdown {
        let engine = self.engine;
        if let Some(known) = self.memo.get(root) {
            return known.clone();
        }
        let Some(recipe) = engine.recipes.primary(root) else {
            return Breakdown::unit(root);
        };

        let mut stack = vec![Frame::new(root.clone(), recipe)];
        let mut active: HashSet<ItemId> = HashSet::from([root.clone()]);

        while let Some(frame) = stack.last_mut() {
            let recipe = frame.recipe;
            let Some(ingredient) = recipe.ingredients.get(frame.next) else {
                self.finish(&mut stack, &mut active);
                continue;
            };
            frame.next += 1;

            let Some(item) = engine.resolve(&ingredient.what) else {
                if let ItemRef::Tag(tag) = &ingredient.what {
                    tracing::warn!(tag = %tag, consumer = %frame.item, "tag has no members");
                    self.diagnostics.push(Diagnostic::UnresolvedTag {
                        tag: tag.clone(),
                        consumer: frame.item.clone(),
                    });
                }
                continue;
            };
            let per_unit = &ingredient.count / &recipe.output_count;
            let top = stack.len() - 1;

            if let Some(known) = self.memo.get(&item) {
                stack[top].unit.add_scaled(known, &per_unit);
                stack[top].edges.push(Edge {
                    item,
                    per_unit,
                    kind: EdgeKind::Crafted,
                });
            } else if active.contains(&item) {
                let mut path: Vec<ItemId> = stack
                    .iter()
                    .map(|f| &f.item)
                    .skip_while(|on_path| **on_path != item)
                    .cloned()
                    .collect();
                path.push(item.clone());
                tracing::warn!(item = %item, depth = path.len(), "recipe cycle cut; treating item as raw");
                self.diagnostics.push(Diagnostic::CycleDetected { path });

                stack[top].unit.add(&item, &per_unit);
                stack[top].edges.push(Edge {
                    item,
                    per_unit,
                    kind: EdgeKind::Raw,
                });
            } else if let Some(child) = engine.recipes.primary(&item) {
                stack[top].edges.push(Edge {
                    item: item.clone(),
                    per_unit,
                    kind: EdgeKind::Crafted,
                });
                active.insert(item.clone());
                stack.push(Frame::new(item, child));
            } else {
                stack[top].unit.add(&item, &per_unit);
                stack[top].edges.push(Edge {
                    item,
                    per_unit,
                    kind: EdgeKind::Raw,
                });
            }
        }

        self.memo.get(root).cloned().unwrap_or_default()
    }

    /// Pops the finished frame, memoizes it and folds it into its parent
    fn finish(&mut self, stack: &mut Vec<Frame<'_>>, active: &mut HashSet<ItemId>) {
        let Some(done) = stack.pop() else { return };
        active.remove(&done.item);

        if let Some(parent) = stack.last_mut() {
            // The parent's last edge is the one that opened this frame
            if let Some(edge) = parent.edges.last() {
                parent.unit.add_scaled(&done.unit, &edge.per_unit);
            }
        }

        self.memo.insert(done.item.clone(), done.unit);
        self.expansions.insert(
            done.item.clone(),
            Expansion {
                recipe: done.recipe.id.clone(),
                edges: done.edges,
            },
        );
        self.completed.push(done.item);
    }

    /// Aggregated steps for `quantity` of `target`, in completion order
    fn steps(&self, target: &ItemId, quantity: &Quantity) -> Vec<Step> {
        let mut demand: HashMap<&ItemId, Quantity> = HashMap::new();
        demand.insert(target, quantity.clone());

        // Reverse completion order visits every consumer before what it consumes
        let mut steps = Vec::with_capacity(self.completed.len());
        for item in self.completed.iter().rev() {
            let Some(needed) = demand.remove(item) else {
                continue;
            };
            let Some(expansion) = self.expansions.get(item) else {
                continue;
            };

            let mut consumed: Vec<(ItemId, Quantity)> = Vec::new();
            for edge in &expansion.edges {
                let amount = &needed * &edge.per_unit;
                match consumed.iter_mut().find(|(id, _)| *id == edge.item) {
                    Some((_, total)) => *total += &amount,
                    None => consumed.push((edge.item.clone(), amount.clone())),
                }
                if edge.kind == EdgeKind::Crafted {
                    *demand.entry(&edge.item).or_default() += &amount;
                }
            }

            steps.push(Step {
                item: item.clone(),
                quantity_needed: needed,
                recipe_used: expansion.recipe.clone(),
                ingredients_consumed: consumed,
            });
        }

        steps.reverse();
        steps
    }
}
