//! The deduplicated directed scheme graph.
//!
//! [`SchemeGraph`] aggregates ordered reaction steps into a directed graph
//! whose nodes are distinct species groups and per-arrow condition
//! records. The same group of diagrams frequently appears as the product
//! of one step and the reactant of the next; deduplication by set content
//! collapses both occurrences onto one node id, stitching the steps into a
//! chain.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::{SchemeError, SchemeResult};
use crate::model::{Conditions, ConditionsDict, Diagram, DiagramId, ReactionStep};

/// Species entry of a diagram-group node in the export document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesRecord {
    /// Chemical identifier string, if resolved.
    pub smiles: Option<String>,
    /// Label text lines, if a label was recognized.
    pub label: Option<Vec<String>>,
}

/// Content of a graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// A group of chemical species.
    Species(Vec<SpeciesRecord>),
    /// The condition record of one arrow.
    Conditions(ConditionsDict),
}

/// Identity key of a node. Groups deduplicate by their unordered diagram
/// set; condition records deduplicate by their owning arrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Group(Vec<usize>),
    Conditions(usize),
}

/// The reconstructed reaction scheme as a directed graph.
///
/// Built once from an ordered collection of steps; node ids are stable in
/// insertion order.
#[derive(Debug, Clone)]
pub struct SchemeGraph {
    contents: Vec<NodeContent>,
    adjacency: Vec<Vec<usize>>,
}

impl SchemeGraph {
    /// Builds the graph from reaction steps.
    ///
    /// `diagrams` resolves group members to species records; `conditions`
    /// supplies the per-arrow condition records (regions of the same arrow
    /// merge into one record, regions without an arrow back-reference are
    /// skipped). Edges run reactant-group to conditions to product-group
    /// for every step, in step order.
    pub fn from_steps(
        steps: &[ReactionStep],
        diagrams: &[Diagram],
        conditions: &[Conditions],
    ) -> Self {
        let mut dict_by_arrow: HashMap<usize, ConditionsDict> = HashMap::new();
        for region in conditions {
            match region.arrow() {
                Some(arrow) => {
                    let entry = dict_by_arrow.entry(arrow.0).or_default();
                    *entry = entry.merged(region.dict());
                }
                None => debug!("skipping conditions region without an owning arrow"),
            }
        }

        let mut graph = Self {
            contents: Vec::new(),
            adjacency: Vec::new(),
        };
        let mut index: HashMap<NodeKey, usize> = HashMap::new();

        for step in steps {
            let reactants = graph.intern_group(&mut index, step.reactants(), diagrams);
            let conditions_node = graph.intern_conditions(
                &mut index,
                step.arrow().0,
                dict_by_arrow.get(&step.arrow().0),
            );
            let products = graph.intern_group(&mut index, step.products(), diagrams);
            graph.adjacency[reactants].push(conditions_node);
            graph.adjacency[conditions_node].push(products);
        }

        graph
    }

    fn intern_group(
        &mut self,
        index: &mut HashMap<NodeKey, usize>,
        group: &[DiagramId],
        diagrams: &[Diagram],
    ) -> usize {
        let mut members: Vec<usize> = group.iter().map(|id| id.0).collect();
        members.sort_unstable();
        let key = NodeKey::Group(members);
        if let Some(&id) = index.get(&key) {
            return id;
        }
        let records = group
            .iter()
            .map(|id| {
                let diagram = &diagrams[id.0];
                SpeciesRecord {
                    smiles: diagram.smiles().map(str::to_owned),
                    label: diagram.label().map(|l| l.text().to_vec()),
                }
            })
            .collect();
        self.push_node(index, key, NodeContent::Species(records))
    }

    fn intern_conditions(
        &mut self,
        index: &mut HashMap<NodeKey, usize>,
        arrow: usize,
        dict: Option<&ConditionsDict>,
    ) -> usize {
        let key = NodeKey::Conditions(arrow);
        if let Some(&id) = index.get(&key) {
            return id;
        }
        let content = NodeContent::Conditions(dict.cloned().unwrap_or_default());
        self.push_node(index, key, content)
    }

    fn push_node(
        &mut self,
        index: &mut HashMap<NodeKey, usize>,
        key: NodeKey,
        content: NodeContent,
    ) -> usize {
        let id = self.contents.len();
        self.contents.push(content);
        self.adjacency.push(Vec::new());
        index.insert(key, id);
        id
    }

    /// Number of nodes in the graph.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.contents.len()
    }

    /// Node contents indexed by node id.
    #[inline]
    pub fn contents(&self) -> &[NodeContent] {
        &self.contents
    }

    /// Successor lists indexed by node id.
    #[inline]
    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    /// Nodes with no incoming edge.
    pub fn sources(&self) -> Vec<usize> {
        let mut has_incoming = vec![false; self.contents.len()];
        for successors in &self.adjacency {
            for &node in successors {
                has_incoming[node] = true;
            }
        }
        (0..self.contents.len())
            .filter(|&id| !has_incoming[id])
            .collect()
    }

    /// Nodes with no outgoing edge.
    pub fn sinks(&self) -> Vec<usize> {
        (0..self.contents.len())
            .filter(|&id| self.adjacency[id].is_empty())
            .collect()
    }

    /// Nodes with neither incoming nor outgoing edges. Useful for output
    /// validation.
    pub fn isolated_nodes(&self) -> Vec<usize> {
        let sources = self.sources();
        self.sinks()
            .into_iter()
            .filter(|id| sources.contains(id))
            .collect()
    }

    /// Finds a path between two nodes, if one exists. The traversal keeps
    /// a visited set, so cyclic adjacencies terminate.
    pub fn find_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        if from >= self.contents.len() || to >= self.contents.len() {
            return None;
        }
        let mut visited = vec![false; self.contents.len()];
        let mut path = Vec::new();
        if self.dfs(from, to, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs(&self, node: usize, to: usize, visited: &mut [bool], path: &mut Vec<usize>) -> bool {
        if visited[node] {
            return false;
        }
        visited[node] = true;
        path.push(node);
        if node == to {
            return true;
        }
        for &next in &self.adjacency[node] {
            if self.dfs(next, to, visited, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Serializes the graph to the generic export document
    /// `{node_labels, adjacency}` with keys ordered by node insertion.
    pub fn to_document(&self) -> SchemeResult<serde_json::Value> {
        let mut node_labels = serde_json::Map::new();
        for (id, content) in self.contents.iter().enumerate() {
            let value = match content {
                NodeContent::Species(records) => serde_json::to_value(records)?,
                NodeContent::Conditions(dict) => serde_json::to_value(dict)?,
            };
            node_labels.insert(id.to_string(), value);
        }

        let mut adjacency = serde_json::Map::new();
        for (id, successors) in self.adjacency.iter().enumerate() {
            let ids: Vec<serde_json::Value> = successors
                .iter()
                .map(|s| serde_json::Value::String(s.to_string()))
                .collect();
            adjacency.insert(id.to_string(), serde_json::Value::Array(ids));
        }

        let mut document = serde_json::Map::new();
        document.insert(
            "node_labels".to_owned(),
            serde_json::Value::Object(node_labels),
        );
        document.insert("adjacency".to_owned(), serde_json::Value::Object(adjacency));
        Ok(serde_json::Value::Object(document))
    }

    /// Serializes the export document as pretty-printed JSON.
    pub fn to_json(&self) -> SchemeResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    /// Exports the scheme as a single linear reaction string, species
    /// identifiers joined with `.` inside a node and nodes joined with
    /// `>`.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-operation error unless the graph has exactly
    /// one source and one sink and never branches, and a cycle-detected
    /// error when the walk revisits a node.
    pub fn to_reaction_string(&self) -> SchemeResult<String> {
        let sources = self.sources();
        let sinks = self.sinks();
        if sources.len() != 1 || sinks.len() != 1 {
            return Err(SchemeError::unsupported(format!(
                "linear export requires exactly one source and one sink, found {} and {}",
                sources.len(),
                sinks.len()
            )));
        }

        let mut visited = vec![false; self.contents.len()];
        let mut parts = Vec::new();
        let mut node = sources[0];
        loop {
            if visited[node] {
                return Err(SchemeError::CycleDetected { node });
            }
            visited[node] = true;
            parts.push(self.node_string(node));
            match self.adjacency[node].as_slice() {
                [] => break,
                [next] => node = *next,
                _ => {
                    return Err(SchemeError::unsupported(
                        "linear export is undefined for branching schemes",
                    ));
                }
            }
        }
        Ok(parts.join(">"))
    }

    fn node_string(&self, id: usize) -> String {
        match &self.contents[id] {
            NodeContent::Species(records) => records
                .iter()
                .map(|r| r.smiles.as_deref().unwrap_or("???"))
                .collect::<Vec<_>>()
                .join("."),
            NodeContent::Conditions(dict) => {
                let mut parts: Vec<String> = dict
                    .coreactants
                    .iter()
                    .chain(dict.catalysts.iter())
                    .map(|s| s.species.clone())
                    .collect();
                parts.extend(dict.other_species.iter().cloned());
                parts.join(".")
            }
        }
    }
}
