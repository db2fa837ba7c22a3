//! Flow graph builder for the multi-level flow (Sankey) diagram.
//!
//! Two dimensions give one stage of links, `a → b`, weighted by record
//! counts. Three dimensions give two stages: `a → b` carries the total of
//! everything below the `(a, b)` pair, then `b → c` splits that total back
//! out per `c`. Nodes are the distinct link endpoints in first-emission order.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::rollup::{rollup, KeyFn, Rollup};
use crate::error::{FlowError, FlowResult};
use crate::models::{CategoricalField, Observation};
use crate::selection::SelectionState;

/// Smallest number of dimensions that forms a flow.
pub const MIN_FLOW_DIMENSIONS: usize = 2;
/// Largest number of dimensions the diagram lays out.
pub const MAX_FLOW_DIMENSIONS: usize = 3;

/// Message shown instead of the diagram when the dimension count is wrong.
pub const DIMENSION_COUNT_NOTICE: &str = "Please select 2 or 3 dimensions for the flow diagram.";

/// A named node of the flow diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
}

/// A weighted link between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: usize,
}

/// Node/link structure consumed by the flow diagram renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Index of the node called `name`.
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Name of the node at `index`.
    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.name.as_str())
    }

    /// Sum of all link weights.
    pub fn total_weight(&self) -> usize {
        self.links.iter().map(|l| l.value).sum()
    }

    /// Weight of the links ending at `index`.
    pub fn inflow(&self, index: usize) -> usize {
        self.links.iter().filter(|l| l.target == index).map(|l| l.value).sum()
    }

    /// Weight of the links starting at `index`.
    pub fn outflow(&self, index: usize) -> usize {
        self.links.iter().filter(|l| l.source == index).map(|l| l.value).sum()
    }
}

/// A link before node names are resolved to indices.
struct NamedLink<'a> {
    source: &'a str,
    target: &'a str,
    value: usize,
}

/// Reject dimension lists the diagram cannot lay out.
pub fn validate_dimensions(dimensions: &[CategoricalField]) -> FlowResult<()> {
    let count = dimensions.len();
    if !(MIN_FLOW_DIMENSIONS..=MAX_FLOW_DIMENSIONS).contains(&count) {
        return Err(FlowError::InvalidDimensionCount { count });
    }

    let mut seen = HashSet::new();
    for &dim in dimensions {
        if !seen.insert(dim) {
            return Err(FlowError::DuplicateDimension(dim));
        }
    }
    Ok(())
}

/// Build the flow graph over `records`, which must already be filtered.
///
/// Records with a missing or empty value on any dimension are left out.
/// An empty input gives an empty graph, not an error.
pub fn build_flow_graph<'r, I>(records: I, dimensions: &[CategoricalField]) -> FlowResult<FlowGraph>
where
    I: IntoIterator<Item = &'r Observation>,
{
    validate_dimensions(dimensions)?;

    let records: Vec<&Observation> = records.into_iter().collect();
    let extractors: Vec<_> = dimensions
        .iter()
        .map(|&dim| move |r: &&Observation| r.categorical(dim).map(Cow::into_owned))
        .collect();
    let keys: Vec<KeyFn<'_, &Observation>> = extractors
        .iter()
        .map(|k| k as KeyFn<'_, &Observation>)
        .collect();

    let counts = rollup(&records, &keys, |leaf| leaf.len());

    let links = if dimensions.len() == MIN_FLOW_DIMENSIONS {
        single_stage_links(&counts)
    } else {
        two_stage_links(&counts)
    };

    Ok(index_links(&links))
}

/// Apply the selection's value filters, then build over its flow dimensions.
pub fn build_flow_graph_for(records: &[Observation], selection: &SelectionState) -> FlowResult<FlowGraph> {
    validate_dimensions(&selection.flow_dimensions)?;
    let filtered = selection.categorical_filters.apply(records);
    build_flow_graph(filtered, &selection.flow_dimensions)
}

fn single_stage_links(counts: &Rollup<usize>) -> Vec<NamedLink<'_>> {
    let mut links = Vec::new();
    for (a, by_b) in counts.children().into_iter().flatten() {
        for (b, leaf) in by_b.children().into_iter().flatten() {
            let value = leaf.total();
            if value > 0 {
                links.push(NamedLink { source: a, target: b, value });
            }
        }
    }
    links
}

fn two_stage_links(counts: &Rollup<usize>) -> Vec<NamedLink<'_>> {
    let mut links = Vec::new();
    for (a, by_b) in counts.children().into_iter().flatten() {
        for (b, by_c) in by_b.children().into_iter().flatten() {
            links.push(NamedLink { source: a, target: b, value: by_c.total() });
            for (c, leaf) in by_c.children().into_iter().flatten() {
                links.push(NamedLink { source: b, target: c, value: leaf.total() });
            }
        }
    }
    links
}

fn index_links<'a>(links: &[NamedLink<'a>]) -> FlowGraph {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut nodes = Vec::new();
    let mut node_id = |name: &'a str| -> usize {
        *index.entry(name).or_insert_with(|| {
            nodes.push(FlowNode { name: name.to_string() });
            nodes.len() - 1
        })
    };

    let links = links
        .iter()
        .map(|l| FlowLink {
            source: node_id(l.source),
            target: node_id(l.target),
            value: l.value,
        })
        .collect();

    FlowGraph { nodes, links }
}
