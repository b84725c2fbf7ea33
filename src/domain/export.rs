//! Bill-of-materials payload and diagram rendering
//!
//! Both renderings are pure functions of an [`AnalysisResult`], so identical
//! analyses always produce byte-identical output.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

use super::engine::{AnalysisResult, Diagnostic, Step};
use super::id::{humanize, ItemId, RecipeId};
use super::quantity::Quantity;

/// An item and how many of it
///
/// `count` is a JSON number; when that number is only an approximation
/// (`1/3`), `count_ratio` carries the exact value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialEntry {
    pub item: ItemId,
    pub count: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_ratio: Option<String>,
}

impl MaterialEntry {
    pub fn new(item: &ItemId, count: &Quantity) -> Self {
        Self {
            item: item.clone(),
            count: count.clone(),
            count_ratio: count.inexact_ratio(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepEntry {
    pub item: ItemId,
    pub quantity: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_ratio: Option<String>,
    pub recipe: RecipeId,
    pub ingredients: Vec<MaterialEntry>,
}

/// Structured bill of materials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomPayload {
    pub target: ItemId,
    pub quantity: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_ratio: Option<String>,
    pub total_raw_materials: Vec<MaterialEntry>,
    pub steps: Vec<StepEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl From<&Step> for StepEntry {
    fn from(step: &Step) -> Self {
        Self {
            item: step.item.clone(),
            quantity: step.quantity_needed.clone(),
            quantity_ratio: step.quantity_needed.inexact_ratio(),
            recipe: step.recipe_used.clone(),
            ingredients: step
                .ingredients_consumed
                .iter()
                .map(|(item, count)| MaterialEntry::new(item, count))
                .collect(),
        }
    }
}

impl From<&AnalysisResult> for BomPayload {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            target: result.target.clone(),
            quantity: result.quantity.clone(),
            quantity_ratio: result.quantity.inexact_ratio(),
            // Breakdown iterates in item id order
            total_raw_materials: result
                .total_raw_materials
                .iter()
                .map(|(item, count)| MaterialEntry::new(item, count))
                .collect(),
            steps: result.steps.iter().map(StepEntry::from).collect(),
            diagnostics: result.diagnostics.clone(),
        }
    }
}

/// Pretty-printed JSON payload
pub fn to_json(result: &AnalysisResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&BomPayload::from(result))
}

/// Flow graph of an analysis: items as nodes, consumption as edges
struct FlowGraph {
    graph: DiGraph<ItemId, Quantity>,
    node_map: HashMap<ItemId, NodeIndex>,
}

impl FlowGraph {
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    fn node(&mut self, item: &ItemId) -> NodeIndex {
        if let Some(idx) = self.node_map.get(item) {
            return *idx;
        }
        let idx = self.graph.add_node(item.clone());
        self.node_map.insert(item.clone(), idx);
        idx
    }

    /// Nodes are added target first, then in the order they are first
    /// referenced walking from the target toward raw materials.
    fn from_analysis(result: &AnalysisResult) -> Self {
        let mut flow = Self::new();
        flow.node(&result.target);

        for step in result.steps.iter().rev() {
            let consumer = flow.node(&step.item);
            for (item, count) in &step.ingredients_consumed {
                let ingredient = flow.node(item);
                flow.graph.add_edge(consumer, ingredient, count.clone());
            }
        }

        flow
    }
}

/// Mermaid flowchart source for an analysis
///
/// Raw materials carry the `raw` class.
pub fn analysis_to_diagram(result: &AnalysisResult) -> String {
    let flow = FlowGraph::from_analysis(result);
    let graph = &flow.graph;
    let mut out = String::from("flowchart TD\n");

    for idx in graph.node_indices() {
        let item = &graph[idx];
        let _ = writeln!(
            out,
            "    n{}[\"{}<br/><small>{}</small>\"]",
            idx.index(),
            humanize(item),
            item
        );
    }

    for edge in graph.edge_references() {
        let _ = writeln!(
            out,
            "    n{} -->|{}| n{}",
            edge.source().index(),
            edge.weight(),
            edge.target().index()
        );
    }

    let raw: Vec<String> = graph
        .node_indices()
        .filter(|idx| result.total_raw_materials.get(&graph[*idx]).is_some())
        .map(|idx| format!("n{}", idx.index()))
        .collect();
    if !raw.is_empty() {
        out.push_str("    classDef raw fill:#f4f1de,stroke:#8d6e63\n");
        let _ = writeln!(out, "    class {} raw", raw.join(","));
    }

    out
}

/// Plain text report: raw materials, then crafting steps
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} x{}", result.target, result.quantity);
    out.push('\n');

    out.push_str("Raw materials:\n");
    if result.total_raw_materials.is_empty() {
        out.push_str("  (none)\n");
    }
    for (item, count) in result.total_raw_materials.iter() {
        let _ = writeln!(out, "  {:>10}  {}", count.to_string(), item);
    }

    if !result.steps.is_empty() {
        out.push_str("\nSteps:\n");
        for (n, step) in result.steps.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} x{}  [{}]",
                n + 1,
                step.item,
                step.quantity_needed,
                step.recipe_used
            );
            for (item, count) in &step.ingredients_consumed {
                let _ = writeln!(out, "       - {} x{}", item, count);
            }
        }
    }

    if !result.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for diagnostic in &result.diagnostics {
            let _ = writeln!(out, "  ! {}", diagnostic);
        }
    }

    out
}
