//! Loaded game data: the recipe index and tag table built from one source

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::source::{DatapackSource, DocumentSource, SourceError};
use crate::domain::{
    normalize_recipes, DocumentKind, Engine, ItemId, ItemRef, ParseWarning, RawDocument,
    RecipeIndex, TagCycleError, TagDefinition, TagTable, UnknownTagReference,
};

/// What happened while loading a dataset
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub documents: usize,
    pub recipes: usize,
    pub shadowed_recipes: usize,
    pub craftable_items: usize,
    pub tags: usize,
    pub warnings: Vec<ParseWarning>,
    pub tag_cycles: Vec<TagCycleError>,
    pub unknown_tags: Vec<UnknownTagReference>,
}

impl LoadReport {
    /// True when nothing was skipped or cut
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.tag_cycles.is_empty() && self.unknown_tags.is_empty()
    }
}

/// Immutable recipe index and tag table, shareable across analyses
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    recipes: RecipeIndex,
    tags: TagTable,
    report: LoadReport,
}

impl Dataset {
    /// Loads every document from a datapack or instance directory
    pub fn open(root: &Path) -> Result<Self, SourceError> {
        Self::load(&DatapackSource::new(root))
    }

    pub fn load(source: &impl DocumentSource) -> Result<Self, SourceError> {
        let discovery = source.discover()?;
        let mut dataset = Self::from_documents(&discovery.documents);

        let mut warnings = discovery.warnings;
        warnings.append(&mut dataset.report.warnings);
        dataset.report.warnings = warnings;

        Ok(dataset)
    }

    /// Normalizes recipes, flattens tags and builds the index
    pub fn from_documents(documents: &[RawDocument]) -> Self {
        let (recipe_docs, tag_docs): (Vec<&RawDocument>, Vec<&RawDocument>) = documents
            .iter()
            .partition(|doc| doc.kind == DocumentKind::Recipe);

        let (recipes, mut warnings) = normalize_recipes(recipe_docs.iter().copied());
        let recipe_total = recipes.len();

        let mut definitions = Vec::with_capacity(tag_docs.len());
        for doc in tag_docs {
            match TagDefinition::from_document(doc) {
                Ok(definition) => definitions.push(definition),
                Err(warning) => warnings.push(warning),
            }
        }

        let recipes = RecipeIndex::build(recipes);
        let build = TagTable::build(definitions);

        for cycle in &build.cycles {
            tracing::warn!(tag = %cycle.tag, "{}", cycle);
        }

        let report = LoadReport {
            documents: documents.len(),
            recipes: recipe_total,
            shadowed_recipes: recipes.shadowed().len(),
            craftable_items: recipes.len(),
            tags: build.table.len(),
            warnings,
            tag_cycles: build.cycles,
            unknown_tags: build.unknown_references,
        };

        tracing::debug!(
            documents = report.documents,
            recipes = report.recipes,
            tags = report.tags,
            warnings = report.warnings.len(),
            "dataset loaded"
        );

        Self {
            recipes,
            tags: build.table,
            report,
        }
    }

    pub fn recipes(&self) -> &RecipeIndex {
        &self.recipes
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.recipes, &self.tags)
    }

    /// Every concrete item the data mentions
    ///
    /// Recipe outputs, item ingredients and flattened tag members.
    pub fn items(&self) -> BTreeSet<ItemId> {
        let mut items = BTreeSet::new();
        for recipe in self.recipes.recipes() {
            items.insert(recipe.output.clone());
            for ingredient in &recipe.ingredients {
                if let ItemRef::Item(item) = &ingredient.what {
                    items.insert(item.clone());
                }
            }
        }
        for (_, members) in self.tags.iter() {
            items.extend(members.iter().cloned());
        }
        items
    }
}
