//! Coordinate assignment.
//!
//! Cross-axis positions start left-packed and are then relaxed toward the
//! mean position of each node's neighbors in the adjacent rank, alternating
//! between the rank above and the rank below. Within a rank, nodes are moved
//! in priority order (virtual nodes first, then higher degree); a node placed
//! earlier in the same pass stays put and bounds how far later nodes can
//! move. Lower-priority nodes in between are pushed aside, never past each
//! other, so the order from crossing minimization survives and neighbors
//! never overlap.
//!
//! Main-axis positions stack the ranks: every rank is as tall as its tallest
//! node and separated from the next one by that rank's gap.

use astrolabe_core::geometry::Point;

use super::{normalize::LayeredGraph, order::Layers};
use crate::layout::positioning::{Extent, max_or_zero};

#[derive(Debug, Clone, Default)]
pub(super) struct Placement {
    /// Center of every layered node.
    pub centers: Vec<Point>,
    pub rank_tops: Vec<f32>,
    pub rank_heights: Vec<f32>,
}

/// Places every layered node.
///
/// `gaps[r]` separates rank `r` from rank `r + 1`; missing entries fall back
/// to the last one, or to zero.
pub(super) fn place(
    graph: &LayeredGraph,
    layers: &Layers,
    spacing: f32,
    passes: usize,
    gaps: &[f32],
) -> Placement {
    let mut x = pack(graph, layers, spacing);
    relax(graph, layers, spacing, passes, &mut x);

    let left = graph
        .nodes
        .iter()
        .zip(&x)
        .map(|(node, x)| x - node.extent.before)
        .fold(f32::INFINITY, f32::min);
    if left.is_finite() {
        for x in &mut x {
            *x -= left;
        }
    }

    let rank_heights: Vec<f32> = layers
        .iter()
        .map(|layer| max_or_zero(layer.iter().map(|&node| graph.nodes[node].height)))
        .collect();
    let mut rank_tops = Vec::with_capacity(rank_heights.len());
    let mut cursor = 0.0;
    for (rank, height) in rank_heights.iter().enumerate() {
        rank_tops.push(cursor);
        let gap = gaps.get(rank).or(gaps.last()).copied().unwrap_or(0.0);
        cursor += height + gap;
    }

    let centers = graph
        .nodes
        .iter()
        .zip(&x)
        .map(|(node, &x)| Point::new(x, rank_tops[node.rank] + rank_heights[node.rank] / 2.0))
        .collect();

    Placement {
        centers,
        rank_tops,
        rank_heights,
    }
}

/// Minimum distance between the centers of two adjacent nodes.
fn separation(left: Extent, right: Extent, spacing: f32) -> f32 {
    left.after + spacing + right.before
}

fn pack(graph: &LayeredGraph, layers: &Layers, spacing: f32) -> Vec<f32> {
    let mut x = vec![0.0; graph.nodes.len()];
    for layer in layers {
        let mut previous: Option<usize> = None;
        for &node in layer {
            let extent = graph.nodes[node].extent;
            x[node] = match previous {
                None => extent.before,
                Some(prev) => x[prev] + separation(graph.nodes[prev].extent, extent, spacing),
            };
            previous = Some(node);
        }
    }
    x
}

fn relax(graph: &LayeredGraph, layers: &Layers, spacing: f32, passes: usize, x: &mut [f32]) {
    let successors = graph.successors();
    let predecessors = graph.predecessors();
    let degree: Vec<usize> = (0..graph.nodes.len())
        .map(|node| successors[node].len() + predecessors[node].len())
        .collect();

    for pass in 0..passes {
        let downward = pass % 2 == 0;
        let ranks: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len().saturating_sub(1)).rev().collect()
        };
        let neighbors = if downward { &predecessors } else { &successors };

        for rank in ranks {
            let layer = &layers[rank];
            let extents: Vec<Extent> = layer.iter().map(|&n| graph.nodes[n].extent).collect();
            let mut xs: Vec<f32> = layer.iter().map(|&n| x[n]).collect();

            let mut priority: Vec<usize> = (0..layer.len()).collect();
            priority.sort_by_key(|&i| {
                let node = layer[i];
                (!graph.nodes[node].is_virtual(), usize::MAX - degree[node], i)
            });

            let mut fixed = vec![false; layer.len()];
            for i in priority {
                let adjacent = &neighbors[layer[i]];
                if !adjacent.is_empty() {
                    let desired =
                        adjacent.iter().map(|&n| x[n]).sum::<f32>() / adjacent.len() as f32;
                    shift_to(&mut xs, &extents, spacing, &fixed, i, desired);
                }
                fixed[i] = true;
            }

            for (&node, &position) in layer.iter().zip(&xs) {
                x[node] = position;
            }
        }
    }
}

/// Moves `xs[i]` as close to `desired` as the fixed nodes allow, pushing
/// unfixed nodes on the way.
fn shift_to(
    xs: &mut [f32],
    extents: &[Extent],
    spacing: f32,
    fixed: &[bool],
    i: usize,
    desired: f32,
) {
    let gap = |left: usize| separation(extents[left], extents[left + 1], spacing);

    if desired < xs[i] {
        let mut limit = f32::NEG_INFINITY;
        let mut needed = 0.0;
        for j in (0..i).rev() {
            needed += gap(j);
            if fixed[j] {
                limit = xs[j] + needed;
                break;
            }
        }
        xs[i] = desired.max(limit).min(xs[i]);
        for j in (0..i).rev() {
            let bound = xs[j + 1] - gap(j);
            if xs[j] <= bound {
                break;
            }
            xs[j] = bound;
        }
    } else if desired > xs[i] {
        let mut limit = f32::INFINITY;
        let mut needed = 0.0;
        for j in i + 1..xs.len() {
            needed += gap(j - 1);
            if fixed[j] {
                limit = xs[j] - needed;
                break;
            }
        }
        xs[i] = desired.min(limit).max(xs[i]);
        for j in i + 1..xs.len() {
            let bound = xs[j - 1] + gap(j - 1);
            if xs[j] >= bound {
                break;
            }
            xs[j] = bound;
        }
    }
}

#[cfg(test)]
mod tests {
    use astrolabe_core::text::FixedWidthMeasurer;
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        config::{AppConfig, OrderingHeuristic},
        context::LayoutContext,
        layout::graph::{
            normalize::{MemberShape, normalize},
            order::minimize,
        },
    };

    fn layered(shapes: &[(usize, f32)], edges: &[(usize, usize)]) -> (LayeredGraph, Layers) {
        let config = AppConfig::default();
        let measurer = FixedWidthMeasurer::default();
        let mut ctx = LayoutContext::new(&config, &measurer);
        let members: Vec<MemberShape> = shapes
            .iter()
            .map(|&(rank, width)| MemberShape {
                rank,
                extent: Extent::symmetric(width),
                height: 20.0,
            })
            .collect();
        let graph = normalize(&mut ctx, &members, edges);
        let layers = minimize(&graph, 8, OrderingHeuristic::Median);
        (graph, layers)
    }

    #[test]
    fn test_chain_is_straight() {
        let (graph, layers) = layered(&[(0, 40.0), (1, 80.0), (2, 40.0)], &[(0, 1), (1, 2)]);
        let placement = place(&graph, &layers, 30.0, 4, &[50.0]);

        assert_approx_eq!(f32, placement.centers[0].x(), placement.centers[1].x());
        assert_approx_eq!(f32, placement.centers[1].x(), placement.centers[2].x());
        assert_approx_eq!(f32, placement.centers[1].x(), 40.0);
        assert_eq!(placement.rank_tops, vec![0.0, 70.0, 140.0]);
        assert_approx_eq!(f32, placement.centers[2].y(), 150.0);
    }

    #[test]
    fn test_parent_centers_over_children() {
        let (graph, layers) = layered(
            &[(0, 20.0), (1, 40.0), (1, 40.0)],
            &[(0, 1), (0, 2)],
        );
        let placement = place(&graph, &layers, 30.0, 4, &[50.0]);

        let children = (placement.centers[1].x() + placement.centers[2].x()) / 2.0;
        assert_approx_eq!(f32, placement.centers[0].x(), children);
    }

    #[test]
    fn test_pushes_stop_at_fixed_nodes() {
        let extents = vec![Extent::symmetric(10.0); 3];
        let mut xs = vec![5.0, 25.0, 45.0];
        shift_to(&mut xs, &extents, 10.0, &[true, false, false], 2, -100.0);
        assert_eq!(xs, vec![5.0, 25.0, 45.0]);

        shift_to(&mut xs, &extents, 10.0, &[false, false, false], 0, 30.0);
        assert_eq!(xs, vec![30.0, 50.0, 70.0]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use astrolabe_core::text::FixedWidthMeasurer;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        config::{AppConfig, OrderingHeuristic},
        context::LayoutContext,
        layout::graph::{
            normalize::{MemberShape, normalize},
            order::minimize,
        },
    };

    fn layered(shapes: &[(usize, f32)], edges: &[(usize, usize)]) -> (LayeredGraph, Layers) {
        let config = AppConfig::default();
        let measurer = FixedWidthMeasurer::default();
        let mut ctx = LayoutContext::new(&config, &measurer);
        let members: Vec<MemberShape> = shapes
            .iter()
            .map(|&(rank, width)| MemberShape {
                rank,
                extent: Extent::symmetric(width),
                height: 20.0,
            })
            .collect();
        let graph = normalize(&mut ctx, &members, edges);
        let layers = minimize(&graph, 8, OrderingHeuristic::Median);
        (graph, layers)
    }

    // ===================
    // Strategies
    // ===================

    fn shapes_and_edges() -> impl Strategy<Value = (Vec<(usize, f32)>, Vec<(usize, usize)>)> {
        prop::collection::vec((0usize..4, 5.0f32..120.0), 1..12).prop_flat_map(|shapes| {
            let count = shapes.len();
            (Just(shapes), prop::collection::vec((0..count, 0..count), 0..20))
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_rank_members_never_overlap(
        shapes: Vec<(usize, f32)>,
        edges: Vec<(usize, usize)>,
    ) -> Result<(), TestCaseError> {
        let edges: Vec<(usize, usize)> = edges
            .into_iter()
            .filter(|&(s, t)| shapes[s].0 < shapes[t].0)
            .collect();
        let (graph, layers) = layered(&shapes, &edges);
        let spacing = 30.0;
        let placement = place(&graph, &layers, spacing, 4, &[50.0]);

        for layer in &layers {
            for pair in layer.windows(2) {
                let (left, right) = (pair[0], pair[1]);
                let right_edge = placement.centers[left].x() + graph.nodes[left].extent.after;
                let left_edge = placement.centers[right].x() - graph.nodes[right].extent.before;
                prop_assert!(
                    left_edge - right_edge >= spacing - 1e-3,
                    "nodes {} and {} are {} apart",
                    left,
                    right,
                    left_edge - right_edge
                );
            }
        }
        for (node, center) in graph.nodes.iter().zip(&placement.centers) {
            prop_assert!(center.x() - node.extent.before >= -1e-3);
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn prop_rank_members_never_overlap((shapes, edges) in shapes_and_edges()) {
            check_rank_members_never_overlap(shapes, edges)?;
        }
    }
}
