//! Cycle breaking.
//!
//! A depth-first search from every node in insertion order marks the edges
//! that close a cycle (edges into a node still on the search stack). Those
//! back edges are reversed. Every reversed edge is necessary: putting it back
//! closes the cycle formed with the tree path it skipped, so no proper subset
//! of the reversed set makes the graph acyclic.

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

/// Returns, per edge index, whether the edge must be reversed.
///
/// Self loops are never reversed; callers route them separately.
pub(super) fn back_edges<N, E>(graph: &DiGraph<N, E>) -> Vec<bool> {
    let mut reversed = vec![false; graph.edge_count()];
    let mut visited = vec![false; graph.node_count()];
    let mut on_stack = vec![false; graph.node_count()];

    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        on_stack[start.index()] = true;
        let mut stack = vec![(start, outgoing(graph, start), 0usize)];

        while let Some((node, edges, next)) = stack.last_mut() {
            let Some(&(edge, target)) = edges.get(*next) else {
                on_stack[node.index()] = false;
                stack.pop();
                continue;
            };
            *next += 1;

            if target == *node {
                continue;
            }
            if on_stack[target.index()] {
                reversed[edge.index()] = true;
            } else if !visited[target.index()] {
                visited[target.index()] = true;
                on_stack[target.index()] = true;
                let edges = outgoing(graph, target);
                stack.push((target, edges, 0));
            }
        }
    }
    reversed
}

/// Outgoing edges in insertion order.
fn outgoing<N, E>(graph: &DiGraph<N, E>, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut edges: Vec<(EdgeIndex, NodeIndex)> = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| (edge.id(), edge.target()))
        .collect();
    edges.sort_by_key(|(edge, _)| *edge);
    edges
}

/// Returns a copy of the graph with the marked edges flipped.
pub(super) fn orient<N: Clone, E: Clone>(
    graph: &DiGraph<N, E>,
    reversed: &[bool],
) -> DiGraph<N, E> {
    let mut oriented = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
    for node in graph.node_indices() {
        oriented.add_node(graph[node].clone());
    }
    for edge in graph.edge_references() {
        let (source, target) = if reversed[edge.id().index()] {
            (edge.target(), edge.source())
        } else {
            (edge.source(), edge.target())
        };
        oriented.add_edge(source, target, edge.weight().clone());
    }
    oriented
}

#[cfg(test)]
mod tests {
    use petgraph::algo::is_cyclic_directed;

    use super::*;

    fn graph(nodes: usize, edges: &[(usize, usize)]) -> DiGraph<usize, usize> {
        let mut graph = DiGraph::new();
        let indices: Vec<NodeIndex> = (0..nodes).map(|i| graph.add_node(i)).collect();
        for (i, &(source, target)) in edges.iter().enumerate() {
            graph.add_edge(indices[source], indices[target], i);
        }
        graph
    }

    #[test]
    fn test_acyclic_graph_is_untouched() {
        let g = graph(3, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(back_edges(&g), vec![false, false, false]);
    }

    #[test]
    fn test_single_edge_of_a_cycle_is_reversed() {
        let g = graph(2, &[(0, 1), (1, 0)]);
        let reversed = back_edges(&g);
        assert_eq!(reversed, vec![false, true]);
        assert!(!is_cyclic_directed(&orient(&g, &reversed)));
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let g = graph(1, &[(0, 0)]);
        assert_eq!(back_edges(&g), vec![false]);
    }

    #[test]
    fn test_insertion_order_decides_which_edge_flips() {
        // 0 -> 1 -> 2 -> 0: the search starts at 0, so the closing edge is 2 -> 0.
        let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(back_edges(&g), vec![false, false, true]);
    }
}
