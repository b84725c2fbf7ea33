//! Record normalizer
//!
//! Each supported recipe dialect is one variant of [`RecipeRecord`] with its
//! own normalization function. Anything that cannot be normalized becomes a
//! [`ParseWarning`] and the rest of the dataset keeps loading.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::document::{ParseWarning, ParseWarningKind, RawDocument};
use super::id::{ItemId, ItemRef, RecipeId};
use super::quantity::Quantity;
use super::recipe::{Ingredient, Recipe, RecipeKind};

/// An ingredient as written in the data
///
/// Accepted shapes: `"id"`, `"#tag"`, `{"item": ..}`, `{"tag": ..}`, or an
/// array of alternatives (the first one is used).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIngredient {
    Ref(String),
    Entry {
        item: Option<String>,
        tag: Option<String>,
        count: Option<i64>,
    },
    Alternatives(Vec<RawIngredient>),
}

/// A recipe result: a bare id, or an item stack
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResult {
    Id(String),
    Stack {
        item: Option<String>,
        id: Option<String>,
        count: Option<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct ShapedRecord {
    pattern: Vec<String>,
    key: HashMap<String, RawIngredient>,
    result: Option<RawResult>,
}

#[derive(Debug, Deserialize)]
struct ShapelessRecord {
    ingredients: Vec<RawIngredient>,
    result: Option<RawResult>,
}

#[derive(Debug, Deserialize)]
struct CookingRecord {
    ingredient: RawIngredient,
    result: Option<RawResult>,
}

#[derive(Debug, Deserialize)]
struct StonecuttingRecord {
    ingredient: RawIngredient,
    result: Option<RawResult>,
    /// Pre-1.20.5 stonecutting recipes put the count next to the result id
    count: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SmithingRecord {
    template: Option<RawIngredient>,
    base: RawIngredient,
    addition: RawIngredient,
    result: Option<RawResult>,
}

/// One variant per supported dialect
#[derive(Debug)]
enum RecipeRecord {
    Shaped(ShapedRecord),
    Shapeless(ShapelessRecord),
    Cooking(RecipeKind, CookingRecord),
    Stonecutting(StonecuttingRecord),
    Smithing(SmithingRecord),
}

/// Output and ingredients shared by every dialect
struct Normalized {
    output: ItemId,
    output_count: Quantity,
    ingredients: Vec<Ingredient>,
}

impl RecipeRecord {
    fn decode(kind: RecipeKind, body: &Value) -> Result<Self, serde_json::Error> {
        let body = body.clone();
        Ok(match kind {
            RecipeKind::Shaped => RecipeRecord::Shaped(serde_json::from_value(body)?),
            RecipeKind::Shapeless => RecipeRecord::Shapeless(serde_json::from_value(body)?),
            RecipeKind::Smelting
            | RecipeKind::Blasting
            | RecipeKind::Smoking
            | RecipeKind::CampfireCooking => {
                RecipeRecord::Cooking(kind, serde_json::from_value(body)?)
            }
            RecipeKind::Stonecutting => RecipeRecord::Stonecutting(serde_json::from_value(body)?),
            RecipeKind::SmithingTransform => RecipeRecord::Smithing(serde_json::from_value(body)?),
        })
    }

    fn kind(&self) -> RecipeKind {
        match self {
            RecipeRecord::Shaped(_) => RecipeKind::Shaped,
            RecipeRecord::Shapeless(_) => RecipeKind::Shapeless,
            RecipeRecord::Cooking(kind, _) => *kind,
            RecipeRecord::Stonecutting(_) => RecipeKind::Stonecutting,
            RecipeRecord::Smithing(_) => RecipeKind::SmithingTransform,
        }
    }

    fn normalize(self) -> Result<Normalized, ParseWarningKind> {
        match self {
            RecipeRecord::Shaped(record) => normalize_shaped(record),
            RecipeRecord::Shapeless(record) => normalize_shapeless(record),
            RecipeRecord::Cooking(_, record) => normalize_cooking(record),
            RecipeRecord::Stonecutting(record) => normalize_stonecutting(record),
            RecipeRecord::Smithing(record) => normalize_smithing(record),
        }
    }
}

fn normalize_shaped(record: ShapedRecord) -> Result<Normalized, ParseWarningKind> {
    let (output, output_count) = resolve_result(record.result, None)?;

    let mut ingredients = Vec::new();
    for symbol in record.pattern.iter().flat_map(|row| row.chars()) {
        if symbol == ' ' {
            continue;
        }
        let raw = record.key.get(&symbol.to_string()).ok_or_else(|| {
            ParseWarningKind::Malformed(format!("pattern symbol '{}' has no key", symbol))
        })?;
        let (what, count) = resolve_ingredient(raw)?;
        Recipe::push_ingredient(&mut ingredients, what, count);
    }

    Ok(Normalized {
        output,
        output_count,
        ingredients,
    })
}

fn normalize_shapeless(record: ShapelessRecord) -> Result<Normalized, ParseWarningKind> {
    let (output, output_count) = resolve_result(record.result, None)?;

    let mut ingredients = Vec::new();
    for raw in &record.ingredients {
        let (what, count) = resolve_ingredient(raw)?;
        Recipe::push_ingredient(&mut ingredients, what, count);
    }

    Ok(Normalized {
        output,
        output_count,
        ingredients,
    })
}

fn normalize_cooking(record: CookingRecord) -> Result<Normalized, ParseWarningKind> {
    let (output, output_count) = resolve_result(record.result, None)?;
    let (what, count) = resolve_ingredient(&record.ingredient)?;

    Ok(Normalized {
        output,
        output_count,
        ingredients: vec![Ingredient { what, count }],
    })
}

fn normalize_stonecutting(record: StonecuttingRecord) -> Result<Normalized, ParseWarningKind> {
    let (output, output_count) = resolve_result(record.result, record.count.as_ref())?;
    let (what, count) = resolve_ingredient(&record.ingredient)?;

    Ok(Normalized {
        output,
        output_count,
        ingredients: vec![Ingredient { what, count }],
    })
}

fn normalize_smithing(record: SmithingRecord) -> Result<Normalized, ParseWarningKind> {
    let (output, output_count) = resolve_result(record.result, None)?;

    let mut ingredients = Vec::new();
    let slots = record
        .template
        .iter()
        .chain([&record.base, &record.addition]);
    for raw in slots {
        let (what, count) = resolve_ingredient(raw)?;
        Recipe::push_ingredient(&mut ingredients, what, count);
    }

    Ok(Normalized {
        output,
        output_count,
        ingredients,
    })
}

/// Reads an output count; absent means the dialect default of 1
fn output_count(raw: Option<&Value>) -> Result<Quantity, ParseWarningKind> {
    match raw {
        None => Ok(Quantity::one()),
        Some(value) => match value.as_i64() {
            Some(n) if n > 0 => Ok(Quantity::from(n)),
            Some(n) => Err(ParseWarningKind::InvalidOutputCount(n)),
            None => Err(ParseWarningKind::Malformed(format!(
                "result count is not an integer: {}",
                value
            ))),
        },
    }
}

fn resolve_result(
    result: Option<RawResult>,
    legacy_count: Option<&Value>,
) -> Result<(ItemId, Quantity), ParseWarningKind> {
    let (id, count) = match result {
        None => return Err(ParseWarningKind::MissingResult),
        Some(RawResult::Id(id)) => (id, legacy_count.cloned()),
        Some(RawResult::Stack { item, id, count }) => {
            let id = item.or(id).ok_or(ParseWarningKind::MissingResult)?;
            (id, count.or_else(|| legacy_count.cloned()))
        }
    };

    let output = id
        .parse::<ItemId>()
        .map_err(|e| ParseWarningKind::Malformed(format!("result: {}", e)))?;
    let count = output_count(count.as_ref())?;

    Ok((output, count))
}

fn resolve_ingredient(raw: &RawIngredient) -> Result<(ItemRef, Quantity), ParseWarningKind> {
    match raw {
        RawIngredient::Ref(id) => {
            let what = ItemRef::parse(id)
                .map_err(|e| ParseWarningKind::Malformed(format!("ingredient: {}", e)))?;
            Ok((what, Quantity::one()))
        }
        RawIngredient::Entry { item, tag, count } => {
            let what = match (item, tag) {
                (Some(item), _) => item.parse().map(ItemRef::Item),
                (None, Some(tag)) => tag.parse().map(ItemRef::Tag),
                (None, None) => {
                    return Err(ParseWarningKind::Malformed(
                        "ingredient has neither item nor tag".to_string(),
                    ));
                }
            }
            .map_err(|e| ParseWarningKind::Malformed(format!("ingredient: {}", e)))?;

            let count = match *count {
                None => Quantity::one(),
                Some(n) if n > 0 => Quantity::from(n),
                Some(n) => return Err(ParseWarningKind::InvalidIngredientCount(n)),
            };
            Ok((what, count))
        }
        RawIngredient::Alternatives(options) => match options.first() {
            Some(first) => resolve_ingredient(first),
            None => Err(ParseWarningKind::Malformed(
                "empty ingredient alternatives".to_string(),
            )),
        },
    }
}

/// Normalizes one recipe document
pub fn normalize_recipe(doc: &RawDocument) -> Result<Recipe, ParseWarning> {
    let warn = |kind| ParseWarning::new(doc.provenance.source.clone(), kind);

    let type_name = doc
        .body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| warn(ParseWarningKind::MissingType))?;

    let kind = RecipeKind::from_type(type_name)
        .ok_or_else(|| warn(ParseWarningKind::UnknownType(type_name.to_string())))?;

    let id: RecipeId = doc
        .id
        .parse()
        .map_err(|e| warn(ParseWarningKind::Malformed(format!("recipe id: {}", e))))?;

    let record = RecipeRecord::decode(kind, &doc.body)
        .map_err(|e| warn(ParseWarningKind::Malformed(e.to_string())))?;
    let kind = record.kind();
    let normalized = record.normalize().map_err(warn)?;

    if normalized.ingredients.is_empty() {
        return Err(warn(ParseWarningKind::Malformed(
            "recipe has no ingredients".to_string(),
        )));
    }

    Ok(Recipe {
        id,
        kind,
        output: normalized.output,
        output_count: normalized.output_count,
        ingredients: normalized.ingredients,
        provenance: doc.provenance.clone(),
    })
}

/// Normalizes a batch, splitting successes from warnings
pub fn normalize_recipes<'a>(
    docs: impl IntoIterator<Item = &'a RawDocument>,
) -> (Vec<Recipe>, Vec<ParseWarning>) {
    let mut recipes = Vec::new();
    let mut warnings = Vec::new();

    for doc in docs {
        match normalize_recipe(doc) {
            Ok(recipe) => recipes.push(recipe),
            Err(warning) => {
                tracing::debug!(%warning, "skipping recipe record");
                warnings.push(warning);
            }
        }
    }

    (recipes, warnings)
}
