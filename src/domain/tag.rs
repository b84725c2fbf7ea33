//! Tag resolver
//!
//! Tags are named item groups that may include other tags. The resolver
//! flattens every tag into an ordered list of concrete items.
//!
//! Cycles in the tag reference graph are found with Tarjan's strongly
//! connected components: each tag on a cycle resolves to an empty list and is
//! reported, while tags that merely point at a cyclic tag still resolve.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::document::{ParseWarning, ParseWarningKind, RawDocument};
use super::id::{ItemId, ItemRef, TagId};
use super::recipe::Provenance;

/// A tag as defined by one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDefinition {
    pub id: TagId,
    pub members: Vec<ItemRef>,
    pub provenance: Provenance,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(default)]
    values: Vec<RawTagEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTagEntry {
    Ref(String),
    /// `{"id": "...", "required": false}`
    Entry { id: String },
}

impl TagDefinition {
    /// Reads a tag document (`{"values": [...]}`)
    pub fn from_document(doc: &RawDocument) -> Result<Self, ParseWarning> {
        let warn = |reason: String| {
            ParseWarning::new(
                doc.provenance.source.clone(),
                ParseWarningKind::Malformed(reason),
            )
        };

        let id: TagId = doc
            .id
            .parse()
            .map_err(|e| warn(format!("tag id: {}", e)))?;
        let raw: RawTag =
            serde_json::from_value(doc.body.clone()).map_err(|e| warn(e.to_string()))?;

        let members = raw
            .values
            .iter()
            .map(|entry| {
                let s = match entry {
                    RawTagEntry::Ref(s) => s,
                    RawTagEntry::Entry { id } => id,
                };
                ItemRef::parse(s).map_err(|e| warn(format!("tag value: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            members,
            provenance: doc.provenance.clone(),
        })
    }
}

/// A tag that transitively includes itself
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("tag #{tag} includes itself via {}", format_cycle(.cycle))]
pub struct TagCycleError {
    pub tag: TagId,
    /// The reference path, starting and ending at `tag`
    pub cycle: Vec<TagId>,
}

fn format_cycle(cycle: &[TagId]) -> String {
    cycle
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// A tag member pointing at a tag nobody defined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownTagReference {
    pub tag: TagId,
    pub referenced_by: TagId,
}

/// Flattened tag memberships; immutable once built
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    resolved: BTreeMap<TagId, Vec<ItemId>>,
}

/// Result of building a [`TagTable`]
#[derive(Debug, Clone, Default)]
pub struct TagBuild {
    pub table: TagTable,
    pub cycles: Vec<TagCycleError>,
    pub unknown_references: Vec<UnknownTagReference>,
}

impl TagTable {
    /// Merges and flattens tag definitions
    ///
    /// Definitions of the same tag are concatenated in provenance order
    /// (on-disk first, then first-seen) with duplicate members dropped.
    pub fn build(definitions: impl IntoIterator<Item = TagDefinition>) -> TagBuild {
        let mut definitions: Vec<_> = definitions.into_iter().collect();
        definitions.sort_by(|a, b| a.provenance.cmp(&b.provenance));

        let mut merged: BTreeMap<TagId, Vec<ItemRef>> = BTreeMap::new();
        for definition in definitions {
            let members = merged.entry(definition.id).or_default();
            for member in definition.members {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
        }

        // Reference graph: edge `a -> b` when tag a includes tag b
        let mut graph: DiGraph<TagId, ()> = DiGraph::new();
        let mut node_map: HashMap<TagId, NodeIndex> = HashMap::new();
        for id in merged.keys() {
            node_map.insert(id.clone(), graph.add_node(id.clone()));
        }

        let mut unknown_references = Vec::new();
        for (id, members) in &merged {
            for member in members {
                if let ItemRef::Tag(target) = member {
                    match node_map.get(target) {
                        Some(&to) => {
                            graph.update_edge(node_map[id], to, ());
                        }
                        None => unknown_references.push(UnknownTagReference {
                            tag: target.clone(),
                            referenced_by: id.clone(),
                        }),
                    }
                }
            }
        }

        let mut resolved: BTreeMap<TagId, Vec<ItemId>> = BTreeMap::new();
        let mut cycles = Vec::new();

        // SCCs come out in reverse topological order: referenced tags first
        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || graph.contains_edge(component[0], component[0]);

            if cyclic {
                let in_component: HashSet<&TagId> =
                    component.iter().map(|&n| &graph[n]).collect();
                for &node in &component {
                    let tag = graph[node].clone();
                    let cycle = find_cycle(&tag, &merged, &in_component);
                    tracing::warn!(tag = %tag, "tag cycle detected; resolving to no members");
                    resolved.insert(tag.clone(), Vec::new());
                    cycles.push(TagCycleError { tag, cycle });
                }
                continue;
            }

            let tag = &graph[component[0]];
            let mut items = Vec::new();
            let mut seen = HashSet::new();
            for member in &merged[tag] {
                match member {
                    ItemRef::Item(item) => {
                        if seen.insert(item.clone()) {
                            items.push(item.clone());
                        }
                    }
                    ItemRef::Tag(nested) => {
                        for item in resolved.get(nested).into_iter().flatten() {
                            if seen.insert(item.clone()) {
                                items.push(item.clone());
                            }
                        }
                    }
                }
            }
            resolved.insert(tag.clone(), items);
        }

        cycles.sort_by(|a, b| a.tag.cmp(&b.tag));

        TagBuild {
            table: TagTable { resolved },
            cycles,
            unknown_references,
        }
    }

    /// Flattened members of a tag, in preference order
    pub fn members(&self, tag: &TagId) -> Option<&[ItemId]> {
        self.resolved.get(tag).map(Vec::as_slice)
    }

    /// The item a tag ingredient stands for
    ///
    /// Always the first resolved member. Other preference strategies (cheapest
    /// member, configured favourites) would plug in here.
    pub fn preferred_member(&self, tag: &TagId) -> Option<&ItemId> {
        self.resolved.get(tag).and_then(|members| members.first())
    }

    pub fn contains(&self, tag: &TagId) -> bool {
        self.resolved.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// All tags in id order
    pub fn iter(&self) -> impl Iterator<Item = (&TagId, &[ItemId])> {
        self.resolved.iter().map(|(id, items)| (id, items.as_slice()))
    }
}

/// Shortest reference path from `start` back to itself, staying inside its component
fn find_cycle(
    start: &TagId,
    merged: &BTreeMap<TagId, Vec<ItemRef>>,
    in_component: &HashSet<&TagId>,
) -> Vec<TagId> {
    let mut parent: HashMap<&TagId, &TagId> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for member in merged.get(current).into_iter().flatten() {
            let ItemRef::Tag(next) = member else { continue };
            if !in_component.contains(next) {
                continue;
            }
            if next == start {
                let mut path = vec![start.clone()];
                let mut cursor = current;
                while cursor != start {
                    path.push(cursor.clone());
                    cursor = parent[cursor];
                }
                path.push(start.clone());
                path.reverse();
                return path;
            }
            if !parent.contains_key(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    vec![start.clone(), start.clone()]
}
