//! Longest-path layering.
//!
//! Sources sit on rank 0 and every other node sits on the largest
//! `rank(source) + length` over its incoming edges. Edges of length 0 allow
//! both ends on the same rank.

use petgraph::{algo::toposort, graph::DiGraph, visit::EdgeRef};

use crate::error::LayoutError;

/// Assigns a rank to every node of an acyclic graph whose edge weights are
/// minimum lengths.
///
/// # Errors
///
/// Returns [`LayoutError::InvariantViolation`] if the graph still has a cycle.
pub(super) fn longest_path<N>(graph: &DiGraph<N, u32>) -> Result<Vec<usize>, LayoutError> {
    let order = toposort(graph, None).map_err(|cycle| {
        LayoutError::invariant(format!(
            "graph still has a cycle through node {} after cycle breaking",
            cycle.node_id().index()
        ))
    })?;

    let mut ranks = vec![0usize; graph.node_count()];
    for node in order {
        for edge in graph.edges(node) {
            let candidate = ranks[node.index()] + *edge.weight() as usize;
            let target = edge.target().index();
            ranks[target] = ranks[target].max(candidate);
        }
    }
    Ok(ranks)
}

/// Checks that every edge points down the ranks by at least its length.
///
/// # Errors
///
/// Returns [`LayoutError::InvariantViolation`] naming the first offending edge.
pub(super) fn check<N>(graph: &DiGraph<N, u32>, ranks: &[usize]) -> Result<(), LayoutError> {
    for edge in graph.edge_references() {
        let source = ranks[edge.source().index()];
        let target = ranks[edge.target().index()];
        if source + (*edge.weight() as usize) > target {
            return Err(LayoutError::invariant(format!(
                "edge {} goes from rank {source} to rank {target} against its length {}",
                edge.id().index(),
                edge.weight()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    use super::*;

    fn graph(nodes: usize, edges: &[(usize, usize, u32)]) -> DiGraph<(), u32> {
        let mut graph = DiGraph::new();
        let indices: Vec<NodeIndex> = (0..nodes).map(|_| graph.add_node(())).collect();
        for &(source, target, length) in edges {
            graph.add_edge(indices[source], indices[target], length);
        }
        graph
    }

    #[test]
    fn test_longest_path_wins() {
        // X -> Y -> Z plus the shortcut X -> Z.
        let g = graph(3, &[(0, 1, 1), (1, 2, 1), (0, 2, 1)]);
        let ranks = longest_path(&g).unwrap();
        assert_eq!(ranks, vec![0, 1, 2]);
        check(&g, &ranks).unwrap();
    }

    #[test]
    fn test_lengths_are_honored() {
        let g = graph(3, &[(0, 1, 3), (0, 2, 0)]);
        let ranks = longest_path(&g).unwrap();
        assert_eq!(ranks, vec![0, 3, 0]);
    }

    #[test]
    fn test_isolated_nodes_are_sources() {
        let g = graph(2, &[]);
        assert_eq!(longest_path(&g).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_cycle_is_an_invariant_violation() {
        let g = graph(2, &[(0, 1, 1), (1, 0, 1)]);
        let err = longest_path(&g).unwrap_err();
        assert!(matches!(err, LayoutError::InvariantViolation(_)));
    }

    #[test]
    fn test_check_rejects_upward_edges() {
        let g = graph(2, &[(0, 1, 1)]);
        assert!(check(&g, &[1, 1]).is_err());
        assert!(check(&g, &[0, 1]).is_ok());
    }
}
