//! Node identity must survive the trip through the worker protocol: the
//! positions a worker reports for the vertices it read from the Pajek file
//! land on the same nodes the edges were written from.

use lgl_core::graph::{Edge, Graph, Node};
use lgl_core::pajek;
use lgl_core::positions::{self, Position};

/// Plays the worker: every vertex is placed at `(degree, first neighbour)`
/// so coordinates are derived purely from what the Pajek file said.
fn fake_worker(text: &str) -> Vec<u8> {
    let network = pajek::parse(text).unwrap();
    let mut degree = vec![0usize; network.vertices];
    let mut first = vec![None; network.vertices];
    for &(s, t) in &network.edges {
        degree[s] += 1;
        degree[t] += 1;
        first[s].get_or_insert(t);
        first[t].get_or_insert(s);
    }

    let output: Vec<Position> = (0..network.vertices)
        .rev()
        .map(|v| Position {
            node_ref: v,
            x: degree[v] as f64,
            y: first[v].map_or(-1.0, |n| n as f64),
        })
        .collect();
    serde_json::to_vec(&output).unwrap()
}

#[test]
fn positions_map_back_to_the_nodes_the_edges_came_from() {
    let nodes = (0..5).map(|i| Node::with_id(format!("n{i}"))).collect();
    let links = vec![Edge::new(4, 0), Edge::new(4, 1), Edge::new(4, 2), Edge::new(3, 2)];
    let mut graph = Graph::new(nodes, links);

    let output = fake_worker(&pajek::render(&graph));
    positions::merge(&mut graph, &positions::parse(&output).unwrap()).unwrap();

    // Node 4 is the hub with three edges; its first neighbour is node 0.
    assert_eq!(graph.nodes[4].position(), Some((3.0, 0.0)));
    assert_eq!(graph.nodes[4].attributes["id"], "n4");
    // Node 2 touches the hub and node 3.
    assert_eq!(graph.nodes[2].position(), Some((2.0, 4.0)));
    // Node 3 only touches node 2.
    assert_eq!(graph.nodes[3].position(), Some((1.0, 2.0)));
    assert!(graph.is_laid_out());
    assert_eq!(graph.links.len(), 4);
}
