//! Worker output: one `{ "ref", "x", "y" }` entry per node.
//!
//! `ref` is the 0-based position of the node in the submitted graph.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::Graph;

/// Computed coordinates for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "ref")]
    pub node_ref: usize,
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(node_ref: usize, x: f64, y: f64) -> Self {
        Self { node_ref, x, y }
    }
}

/// Decode the worker's output file.
pub fn parse(bytes: &[u8]) -> Result<Vec<Position>, CoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Merge(format!("Unreadable layout output: {e}")))
}

/// Copy computed coordinates onto the graph's nodes.
///
/// Every node must receive a position and every `ref` must be in range.
/// The graph is left untouched unless the whole output validates.
pub fn merge(graph: &mut Graph, positions: &[Position]) -> Result<(), CoreError> {
    let count = graph.nodes.len();
    let mut placed: Vec<Option<(f64, f64)>> = vec![None; count];

    for position in positions {
        let slot = placed.get_mut(position.node_ref).ok_or_else(|| {
            CoreError::Merge(format!(
                "Layout output references node {} but the graph has {count} nodes",
                position.node_ref
            ))
        })?;
        *slot = Some((position.x, position.y));
    }

    if let Some(missing) = placed.iter().position(Option::is_none) {
        return Err(CoreError::Merge(format!(
            "Layout output has no position for node {missing}"
        )));
    }

    for (node, (x, y)) in graph.nodes.iter_mut().zip(placed.into_iter().flatten()) {
        node.x = Some(x);
        node.y = Some(y);
    }
    Ok(())
}
