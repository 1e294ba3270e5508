//! Crossing minimization.
//!
//! The initial order comes from a depth-first walk so connected nodes start
//! out close together. Sweeps then alternate downward (keys from the rank
//! above) and upward (keys from the rank below), each followed by adjacent
//! transpositions that strictly reduce crossings. The order with the fewest
//! crossings seen wins. Ties in every sort fall back to the node index, which
//! follows insertion order.

use log::debug;

use super::normalize::LayeredGraph;
use crate::config::OrderingHeuristic;

/// Node indices per rank, left to right.
pub(super) type Layers = Vec<Vec<usize>>;

/// Orders every rank of the layered graph.
pub(super) fn minimize(
    graph: &LayeredGraph,
    passes: usize,
    heuristic: OrderingHeuristic,
) -> Layers {
    let successors = graph.successors();
    let predecessors = graph.predecessors();

    let mut layers = initial(graph, &successors);
    let mut best = layers.clone();
    let mut best_crossings = crossings(&layers, &successors);

    for pass in 0..passes {
        if best_crossings == 0 {
            break;
        }
        let downward = pass % 2 == 0;
        sweep(&mut layers, &predecessors, &successors, downward, heuristic);
        transpose(&mut layers, &predecessors, &successors);

        let current = crossings(&layers, &successors);
        if current < best_crossings {
            best_crossings = current;
            best = layers.clone();
        }
    }

    debug!(ranks = best.len(), crossings = best_crossings; "Ordering complete");
    best
}

/// Depth-first order: start nodes sorted by rank then index, successors in
/// segment order.
fn initial(graph: &LayeredGraph, successors: &[Vec<usize>]) -> Layers {
    let mut layers: Layers = vec![Vec::new(); graph.rank_count];
    let mut visited = vec![false; graph.nodes.len()];

    let mut starts: Vec<usize> = (0..graph.nodes.len()).collect();
    starts.sort_by_key(|&node| (graph.nodes[node].rank, node));

    for start in starts {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            layers[graph.nodes[node].rank].push(node);
            stack.extend(successors[node].iter().rev());
        }
    }
    layers
}

fn positions(layers: &Layers, node_count: usize) -> Vec<usize> {
    let mut positions = vec![0; node_count];
    for layer in layers {
        for (position, &node) in layer.iter().enumerate() {
            positions[node] = position;
        }
    }
    positions
}

/// Total crossings between every pair of adjacent ranks.
pub(super) fn crossings(layers: &Layers, successors: &[Vec<usize>]) -> usize {
    let positions = positions(layers, successors.len());
    layers
        .windows(2)
        .map(|pair| layer_crossings(&pair[0], pair[1].len(), successors, &positions))
        .sum()
}

/// Counts crossings between two ranks with an accumulator tree over the
/// lower rank's positions.
fn layer_crossings(
    north: &[usize],
    south_len: usize,
    successors: &[Vec<usize>],
    positions: &[usize],
) -> usize {
    if south_len == 0 {
        return 0;
    }

    let mut first = 1;
    while first < south_len {
        first <<= 1;
    }
    let mut tree = vec![0usize; 2 * first - 1];
    first -= 1;

    let mut count = 0;
    for &node in north {
        let mut ends: Vec<usize> = successors[node].iter().map(|&s| positions[s]).collect();
        ends.sort_unstable();
        for end in ends {
            let mut index = end + first;
            tree[index] += 1;
            while index > 0 {
                if index % 2 == 1 {
                    count += tree[index + 1];
                }
                index = (index - 1) / 2;
                tree[index] += 1;
            }
        }
    }
    count
}

fn sweep(
    layers: &mut Layers,
    predecessors: &[Vec<usize>],
    successors: &[Vec<usize>],
    downward: bool,
    heuristic: OrderingHeuristic,
) {
    let ranks: Vec<usize> = if downward {
        (1..layers.len()).collect()
    } else {
        (0..layers.len().saturating_sub(1)).rev().collect()
    };

    for rank in ranks {
        let (reference, neighbors) = if downward {
            (rank - 1, predecessors)
        } else {
            (rank + 1, successors)
        };
        let mut fixed = vec![None; neighbors.len()];
        for (position, &node) in layers[reference].iter().enumerate() {
            fixed[node] = Some(position as f32);
        }

        let mut keyed: Vec<(f32, usize)> = layers[rank]
            .iter()
            .enumerate()
            .map(|(position, &node)| {
                let mut adjacent: Vec<f32> =
                    neighbors[node].iter().filter_map(|&n| fixed[n]).collect();
                adjacent.sort_by(f32::total_cmp);
                let key = match heuristic {
                    OrderingHeuristic::Median => weighted_median(&adjacent),
                    OrderingHeuristic::Barycenter => barycenter(&adjacent),
                };
                (key.unwrap_or(position as f32), node)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        layers[rank] = keyed.into_iter().map(|(_, node)| node).collect();
    }
}

/// Weighted median of sorted positions; pulls toward the denser side when
/// the count is even.
fn weighted_median(sorted: &[f32]) -> Option<f32> {
    let len = sorted.len();
    let middle = len / 2;
    match len {
        0 => None,
        _ if len % 2 == 1 => Some(sorted[middle]),
        2 => Some((sorted[0] + sorted[1]) / 2.0),
        _ => {
            let left = sorted[middle - 1] - sorted[0];
            let right = sorted[len - 1] - sorted[middle];
            if left + right == 0.0 {
                Some((sorted[middle - 1] + sorted[middle]) / 2.0)
            } else {
                Some((sorted[middle - 1] * right + sorted[middle] * left) / (left + right))
            }
        }
    }
}

fn barycenter(positions: &[f32]) -> Option<f32> {
    if positions.is_empty() {
        return None;
    }
    Some(positions.iter().sum::<f32>() / positions.len() as f32)
}

/// Crossings among the edges of `left` and `right` when `left` comes first.
fn pair_crossings(left: &[usize], right: &[usize], positions: &[usize]) -> usize {
    let mut count = 0;
    for &l in left {
        for &r in right {
            if positions[l] > positions[r] {
                count += 1;
            }
        }
    }
    count
}

/// Swaps adjacent nodes while doing so strictly reduces crossings.
fn transpose(layers: &mut Layers, predecessors: &[Vec<usize>], successors: &[Vec<usize>]) {
    let mut improved = true;
    while improved {
        improved = false;
        let positions = positions(layers, successors.len());
        for layer in layers.iter_mut() {
            for i in 1..layer.len() {
                let (v, w) = (layer[i - 1], layer[i]);
                let current = pair_crossings(&predecessors[v], &predecessors[w], &positions)
                    + pair_crossings(&successors[v], &successors[w], &positions);
                let swapped = pair_crossings(&predecessors[w], &predecessors[v], &positions)
                    + pair_crossings(&successors[w], &successors[v], &positions);
                if swapped < current {
                    layer.swap(i - 1, i);
                    improved = true;
                }
            }
            if improved {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use astrolabe_core::text::FixedWidthMeasurer;

    use super::*;
    use crate::{
        config::AppConfig,
        context::LayoutContext,
        layout::{
            graph::normalize::{MemberShape, normalize},
            positioning::Extent,
        },
    };

    fn layered(ranks: &[usize], edges: &[(usize, usize)]) -> LayeredGraph {
        let config = AppConfig::default();
        let measurer = FixedWidthMeasurer::default();
        let mut ctx = LayoutContext::new(&config, &measurer);
        let members: Vec<MemberShape> = ranks
            .iter()
            .map(|&rank| MemberShape {
                rank,
                extent: Extent::symmetric(10.0),
                height: 10.0,
            })
            .collect();
        normalize(&mut ctx, &members, edges)
    }

    #[test]
    fn test_accumulator_counts_crossings() {
        // 0 -> 3 and 1 -> 2 cross once when the lower rank is [2, 3].
        let graph = layered(&[0, 0, 1, 1], &[(0, 3), (1, 2)]);
        let successors = graph.successors();
        assert_eq!(crossings(&vec![vec![0, 1], vec![2, 3]], &successors), 1);
        assert_eq!(crossings(&vec![vec![0, 1], vec![3, 2]], &successors), 0);
    }

    #[test]
    fn test_initial_order_follows_depth_first_walk() {
        let graph = layered(&[0, 1, 1, 0, 1], &[(0, 2), (3, 1), (3, 4)]);
        let layers = initial(&graph, &graph.successors());
        assert_eq!(layers, vec![vec![0, 3], vec![2, 1, 4]]);
    }

    #[test]
    fn test_minimize_removes_avoidable_crossing() {
        let graph = layered(&[0, 0, 1, 1], &[(0, 3), (1, 2)]);
        let layers = minimize(&graph, 4, OrderingHeuristic::Median);
        assert_eq!(crossings(&layers, &graph.successors()), 0);
    }

    #[test]
    fn test_weighted_median() {
        assert_eq!(weighted_median(&[]), None);
        assert_eq!(weighted_median(&[3.0]), Some(3.0));
        assert_eq!(weighted_median(&[1.0, 3.0]), Some(2.0));
        assert_eq!(weighted_median(&[0.0, 1.0, 2.0]), Some(1.0));
        // Left spread 1, right spread 5: the key leans toward the left pair.
        let key = weighted_median(&[0.0, 1.0, 2.0, 7.0]).unwrap();
        assert!(key > 1.0 && key < 1.5);
    }

    #[test]
    fn test_both_heuristics_are_deterministic() {
        let graph = layered(
            &[0, 0, 0, 1, 1, 1, 2],
            &[(0, 5), (1, 4), (2, 3), (3, 6), (5, 6), (0, 4)],
        );
        for heuristic in [OrderingHeuristic::Median, OrderingHeuristic::Barycenter] {
            let first = minimize(&graph, 8, heuristic);
            let second = minimize(&graph, 8, heuristic);
            assert_eq!(first, second);
        }
    }
}
