//! Caller-facing graph model.
//!
//! A node's position in [`Graph::nodes`] is its identity for the whole
//! worker protocol: edges reference nodes by that position, the Pajek writer
//! numbers vertices by it, and the worker's output refers back to it. Any
//! other node or edge fields are carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// A graph submitted for layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Edge>,
    /// Top-level fields other than `nodes` and `links`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single node. `x`/`y` stay absent until a layout has been merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Opaque identity fields supplied by the caller.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An edge between two node positions.
///
/// Self-loops and duplicate edges are accepted as-is; the worker decides
/// what to do with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(deserialize_with = "node_index")]
    pub source: usize,
    #[serde(deserialize_with = "node_index")]
    pub target: usize,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Node {
    /// A node carrying a single `id` attribute.
    pub fn with_id(id: impl Into<Value>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), id.into());
        Self {
            x: None,
            y: None,
            attributes,
        }
    }

    /// Both coordinates, once the node has been laid out.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }
}

impl Edge {
    pub fn new(source: usize, target: usize) -> Self {
        Self {
            source,
            target,
            attributes: Map::new(),
        }
    }
}

impl Graph {
    /// Build a graph from plain nodes and edges.
    pub fn new(nodes: Vec<Node>, links: Vec<Edge>) -> Self {
        Self {
            nodes,
            links,
            extra: Map::new(),
        }
    }

    /// Parse a graph from JSON text and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let graph: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidInput(format!("Graph is not valid: {e}")))?;
        graph.validate()?;
        Ok(graph)
    }

    /// Convert an already-decoded JSON value into a graph and validate it.
    ///
    /// `null` is reported as a missing graph rather than a shape error.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        if value.is_null() {
            return Err(CoreError::InvalidInput("Graph is not defined".to_string()));
        }
        let graph: Self = serde_json::from_value(value)
            .map_err(|e| CoreError::InvalidInput(format!("Graph is not valid: {e}")))?;
        graph.validate()?;
        Ok(graph)
    }

    /// Check that every edge endpoint is a valid node position.
    pub fn validate(&self) -> Result<(), CoreError> {
        let count = self.nodes.len();
        for (i, link) in self.links.iter().enumerate() {
            for (end, index) in [("source", link.source), ("target", link.target)] {
                if index >= count {
                    return Err(CoreError::InvalidInput(format!(
                        "Link {i} {end} {index} is out of range for {count} nodes"
                    )));
                }
            }
        }
        Ok(())
    }

    /// `true` once every node carries both coordinates.
    pub fn is_laid_out(&self) -> bool {
        self.nodes.iter().all(|n| n.position().is_some())
    }
}

/// Accept a node index as a JSON number or a numeric string.
fn node_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawIndex {
        Number(usize),
        Text(String),
    }

    match RawIndex::deserialize(deserializer)? {
        RawIndex::Number(n) => Ok(n),
        RawIndex::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid node index \"{s}\""))),
    }
}
