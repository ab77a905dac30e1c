//! Post-startup smoke test.
//!
//! Lays out a small fixed graph through the whole pipeline (Pajek writer,
//! queue, worker, merge) and checks the result is intact.

use lgl_core::{Edge, Graph, LayoutSettings, Node};

use crate::error::LayoutError;
use crate::pool::WorkerPool;

const FIXTURE_NODES: usize = 11;

const FIXTURE_EDGES: [(usize, usize); 15] = [
    (5, 10),
    (5, 3),
    (3, 1),
    (3, 4),
    (3, 2),
    (10, 2),
    (2, 4),
    (1, 4),
    (4, 6),
    (6, 9),
    (6, 7),
    (6, 8),
    (6, 0),
    (7, 0),
    (8, 0),
];

/// The first check the smoke test failed.
#[derive(Debug, thiserror::Error)]
pub enum SelfTestError {
    #[error("Self-test layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Self-test graph came back with {actual} nodes, expected {expected}")]
    NodeCountChanged { expected: usize, actual: usize },

    #[error("Self-test graph came back with {actual} links, expected {expected}")]
    LinkCountChanged { expected: usize, actual: usize },

    #[error("Self-test node {index} has no coordinates")]
    MissingCoordinates { index: usize },
}

/// An 11-node, 15-edge graph of triangles hanging off two hubs.
pub fn fixture_graph() -> Graph {
    let nodes = (0..FIXTURE_NODES).map(|id| Node::with_id(id as u64)).collect();
    let links = FIXTURE_EDGES
        .iter()
        .map(|&(source, target)| Edge::new(source, target))
        .collect();
    Graph::new(nodes, links)
}

pub fn fixture_settings() -> LayoutSettings {
    LayoutSettings {
        save_svg: true,
        ..LayoutSettings::default()
    }
}

/// Run the fixture through `pool` and verify the laid-out graph.
pub async fn run(pool: &WorkerPool) -> Result<(), SelfTestError> {
    let graph = fixture_graph();
    let expected_nodes = graph.nodes.len();
    let expected_links = graph.links.len();

    let laid_out = pool.compute_layout(graph, fixture_settings()).await?;
    check(&laid_out, expected_nodes, expected_links)?;

    tracing::info!(
        nodes = expected_nodes,
        links = expected_links,
        "Layout self-test passed",
    );
    Ok(())
}

fn check(graph: &Graph, expected_nodes: usize, expected_links: usize) -> Result<(), SelfTestError> {
    if graph.nodes.len() != expected_nodes {
        return Err(SelfTestError::NodeCountChanged {
            expected: expected_nodes,
            actual: graph.nodes.len(),
        });
    }
    if graph.links.len() != expected_links {
        return Err(SelfTestError::LinkCountChanged {
            expected: expected_links,
            actual: graph.links.len(),
        });
    }
    match graph.nodes.iter().position(|node| node.position().is_none()) {
        Some(index) => Err(SelfTestError::MissingCoordinates { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn fixture_is_valid() {
        let graph = fixture_graph();
        assert_eq!(graph.nodes.len(), 11);
        assert_eq!(graph.links.len(), 15);
        graph.validate().unwrap();
        assert!(fixture_settings().save_svg);
    }

    #[test]
    fn unplaced_node_fails_the_check() {
        let mut graph = fixture_graph();
        for node in &mut graph.nodes {
            node.x = Some(1.0);
            node.y = Some(2.0);
        }
        graph.nodes[4].y = None;

        assert_matches!(
            check(&graph, 11, 15),
            Err(SelfTestError::MissingCoordinates { index: 4 })
        );
    }

    #[test]
    fn dropped_link_fails_the_check() {
        let mut graph = fixture_graph();
        for node in &mut graph.nodes {
            node.x = Some(0.0);
            node.y = Some(0.0);
        }
        graph.links.pop();

        assert_matches!(
            check(&graph, 11, 15),
            Err(SelfTestError::LinkCountChanged {
                expected: 15,
                actual: 14
            })
        );
    }
}
