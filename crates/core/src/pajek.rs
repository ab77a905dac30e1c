//! Pajek `.net` text format, the layout worker's input.
//!
//! ```text
//! *Vertices 3
//! *Edges
//! 1 2
//! 2 3
//! ```
//!
//! Vertices are numbered from [`INDEX_BASE`] (Pajek's own 1-based
//! convention), so node position `i` is written as `i + 1`.

use std::fmt::Write as _;

use crate::error::CoreError;
use crate::graph::Graph;

pub const INDEX_BASE: usize = 1;

/// A network as read back from Pajek text, with 0-based edge endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PajekNetwork {
    pub vertices: usize,
    pub edges: Vec<(usize, usize)>,
}

/// Render the graph's topology as Pajek text.
pub fn render(graph: &Graph) -> String {
    let mut out = String::with_capacity(32 + graph.links.len() * 12);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "*Vertices {}", graph.nodes.len());
    out.push_str("*Edges\n");
    for link in &graph.links {
        let _ = writeln!(
            out,
            "{} {}",
            link.source + INDEX_BASE,
            link.target + INDEX_BASE
        );
    }
    out
}

/// Parse Pajek text written by [`render`] (or any `*Vertices`/`*Edges`
/// network). Vertex label lines and `*Arcs` sections are tolerated; edge
/// weights after the two endpoints are ignored.
pub fn parse(text: &str) -> Result<PajekNetwork, CoreError> {
    let mut vertices = None;
    let mut in_edges = false;
    let mut edges = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if let Some(section) = line.strip_prefix('*') {
            let mut parts = section.split_whitespace();
            let keyword = parts.next().unwrap_or_default().to_ascii_lowercase();
            match keyword.as_str() {
                "vertices" => {
                    let count = parts.next().ok_or_else(|| {
                        CoreError::InvalidInput("*Vertices header has no count".to_string())
                    })?;
                    vertices = Some(count.parse::<usize>().map_err(|_| {
                        CoreError::InvalidInput(format!("Invalid vertex count \"{count}\""))
                    })?);
                    in_edges = false;
                }
                "edges" | "arcs" => in_edges = true,
                _ => in_edges = false,
            }
            continue;
        }

        if !in_edges {
            continue;
        }

        let count = vertices.ok_or_else(|| {
            CoreError::InvalidInput("Edges appear before the *Vertices header".to_string())
        })?;
        let mut ends = line.split_whitespace().map(|token| {
            token
                .parse::<usize>()
                .ok()
                .filter(|v| (INDEX_BASE..count + INDEX_BASE).contains(v))
                .map(|v| v - INDEX_BASE)
        });
        match (ends.next().flatten(), ends.next().flatten()) {
            (Some(source), Some(target)) => edges.push((source, target)),
            _ => {
                return Err(CoreError::InvalidInput(format!(
                    "Invalid edge on line {}: \"{line}\"",
                    lineno + 1
                )))
            }
        }
    }

    let vertices = vertices
        .ok_or_else(|| CoreError::InvalidInput("Missing *Vertices header".to_string()))?;
    Ok(PajekNetwork { vertices, edges })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::graph::{Edge, Node};

    fn triangle() -> Graph {
        Graph::new(
            vec![Node::with_id(0), Node::with_id(1), Node::with_id(2)],
            vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)],
        )
    }

    #[test]
    fn render_shifts_indices_to_one_based() {
        assert_eq!(render(&triangle()), "*Vertices 3\n*Edges\n1 2\n2 3\n3 1\n");
    }

    #[test]
    fn render_graph_without_edges() {
        let graph = Graph::new(vec![Node::default(); 4], vec![]);
        assert_eq!(render(&graph), "*Vertices 4\n*Edges\n");
    }

    #[test]
    fn parse_reads_back_rendered_topology() {
        let network = parse(&render(&triangle())).unwrap();
        assert_eq!(network.vertices, 3);
        assert_eq!(network.edges, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn parse_skips_labels_comments_and_weights() {
        let text = "% generated\n*Vertices 2\n1 \"a\"\n2 \"b\"\n*Arcs\n1 2 0.5\n";
        let network = parse(text).unwrap();
        assert_eq!(network.edges, vec![(0, 1)]);
    }

    #[test]
    fn parse_rejects_zero_index() {
        assert_matches!(
            parse("*Vertices 2\n*Edges\n0 1\n"),
            Err(CoreError::InvalidInput(msg)) if msg.contains("line 3")
        );
    }

    #[test]
    fn parse_requires_vertices_header() {
        assert_matches!(parse("*Edges\n"), Err(CoreError::InvalidInput(_)));
    }
}
