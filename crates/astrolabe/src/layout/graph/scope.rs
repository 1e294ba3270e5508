//! Layout of one containment scope.
//!
//! Members are split into connected components. Each component runs the
//! layered pipeline (cycle breaking, ranking, normalization, ordering and
//! coordinate assignment) on its own, then components are placed side by
//! side in the order of their earliest member.
//!
//! Everything here works in abstract axes: "cross" is `x` and "main" is `y`.
//! The caller swaps axes for left-to-right diagrams.

use log::{debug, trace};
use petgraph::{
    graph::{DiGraph, NodeIndex},
    unionfind::UnionFind,
    visit::EdgeRef,
};

use astrolabe_core::geometry::{Bounds, Point, Size};

use super::{
    EdgeKind, acyclic,
    normalize::{LayerNodeKind, LayeredGraph, MemberShape, normalize},
    order::{Layers, minimize},
    position::{Placement, place},
    rank,
    structure::{Scope, ScopeEdge},
};
use crate::{
    context::LayoutContext,
    error::LayoutError,
    layout::{Shift, positioning::Extent},
};

/// Layout inputs of a model edge, sizes in abstract axes.
#[derive(Debug, Clone, Copy)]
pub(super) struct EdgeShape {
    pub length: u32,
    pub label: Option<Size>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct PlacedMember {
    pub bounds: Bounds,
    pub rank: usize,
    pub order: usize,
}

/// An edge routed inside its scope.
///
/// `waypoints` run from the original source to the original target and
/// exclude the endpoints, except for self loops whose waypoints are the whole
/// loop.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RoutedEdge {
    pub edge: usize,
    pub kind: EdgeKind,
    pub reversed: bool,
    pub waypoints: Vec<Point>,
    pub label: Option<Bounds>,
}

impl Shift for RoutedEdge {
    fn shift(&mut self, offset: Point) {
        self.waypoints.shift(offset);
        self.label.shift(offset);
    }
}

/// A laid-out scope with its top-left corner at the origin.
#[derive(Debug, Clone, Default)]
pub(super) struct ScopeLayout {
    pub size: Size,
    pub members: Vec<PlacedMember>,
    pub edges: Vec<RoutedEdge>,
}

/// Lays out the members of a scope.
///
/// # Errors
///
/// Returns [`LayoutError::InvariantViolation`] if ranking contradicts the
/// oriented edges.
pub(super) fn layout_scope(
    ctx: &mut LayoutContext<'_>,
    scope: &Scope,
    sizes: &[Size],
    shapes: &[EdgeShape],
) -> Result<ScopeLayout, LayoutError> {
    let component_gap = ctx.config().layout().graph().component_gap();
    let components = components(scope);

    let mut layout = ScopeLayout {
        members: sizes
            .iter()
            .map(|&size| PlacedMember {
                bounds: Bounds::new_from_top_left(Point::default(), size),
                rank: 0,
                order: 0,
            })
            .collect(),
        ..ScopeLayout::default()
    };

    let mut cursor = 0.0;
    let mut height: f32 = 0.0;
    for (members, edges) in &components {
        let mut component = layout_component(ctx, members, edges, sizes, shapes)?;
        let offset = Point::new(cursor - component.bounds.min_x(), -component.bounds.min_y());

        for (&member, mut placed) in members.iter().zip(component.members) {
            placed.bounds.shift(offset);
            layout.members[member] = placed;
        }
        component.edges.shift(offset);
        layout.edges.append(&mut component.edges);

        cursor += component.bounds.width() + component_gap;
        height = height.max(component.bounds.height());
    }
    layout.edges.sort_by_key(|edge| edge.edge);

    let width = if components.is_empty() {
        0.0
    } else {
        cursor - component_gap
    };
    layout.size = Size::new(width, height);

    debug!(
        members = sizes.len(),
        components = components.len(),
        width,
        height;
        "Scope laid out"
    );
    Ok(layout)
}

type Component = (Vec<usize>, Vec<ScopeEdge>);

/// Connected components ordered by their first member.
fn components(scope: &Scope) -> Vec<Component> {
    let count = scope.members.len();
    let mut sets = UnionFind::<usize>::new(count);
    for edge in &scope.edges {
        sets.union(edge.source, edge.target);
    }

    let mut slots: Vec<Option<usize>> = vec![None; count];
    let mut components: Vec<Component> = Vec::new();
    for member in 0..count {
        let root = sets.find(member);
        let slot = *slots[root].get_or_insert_with(|| {
            components.push((Vec::new(), Vec::new()));
            components.len() - 1
        });
        components[slot].0.push(member);
    }
    for edge in &scope.edges {
        if let Some(slot) = slots[sets.find(edge.source)] {
            components[slot].1.push(*edge);
        }
    }
    components
}

struct ComponentLayout {
    bounds: Bounds,
    members: Vec<PlacedMember>,
    edges: Vec<RoutedEdge>,
}

fn layout_component(
    ctx: &mut LayoutContext<'_>,
    members: &[usize],
    edges: &[ScopeEdge],
    sizes: &[Size],
    shapes: &[EdgeShape],
) -> Result<ComponentLayout, LayoutError> {
    let config = ctx.config().layout().graph();
    let label_padding = config.edge_label_padding();

    let mut local = vec![usize::MAX; sizes.len()];
    for (index, &member) in members.iter().enumerate() {
        local[member] = index;
    }

    let mut graph: DiGraph<usize, u32> = DiGraph::with_capacity(members.len(), edges.len());
    let nodes: Vec<NodeIndex> = members.iter().map(|&m| graph.add_node(m)).collect();
    let mut layered_edges: Vec<ScopeEdge> = Vec::new();
    let mut loops: Vec<ScopeEdge> = Vec::new();
    for edge in edges {
        if edge.source == edge.target {
            loops.push(*edge);
        } else {
            graph.add_edge(
                nodes[local[edge.source]],
                nodes[local[edge.target]],
                shapes[edge.edge].length,
            );
            layered_edges.push(*edge);
        }
    }

    let reversed = acyclic::back_edges(&graph);
    let oriented = acyclic::orient(&graph, &reversed);
    let ranks = rank::longest_path(&oriented)?;
    rank::check(&oriented, &ranks)?;
    trace!(ranks:?, reversed:?; "Component ranked");

    // Self loops hang off the right side of their member.
    let mut loop_reach = vec![0.0f32; members.len()];
    for edge in &loops {
        let label = shapes[edge.edge]
            .label
            .map_or(0.0, |size| size.width() + 2.0 * label_padding);
        let reach = &mut loop_reach[local[edge.source]];
        *reach = reach.max(config.self_loop_size() + label);
    }
    let member_shapes: Vec<MemberShape> = members
        .iter()
        .enumerate()
        .map(|(index, &member)| {
            let size = sizes[member];
            MemberShape {
                rank: ranks[index],
                extent: Extent::new(size.width() / 2.0, size.width() / 2.0 + loop_reach[index]),
                height: size.height(),
            }
        })
        .collect();

    let oriented_pairs: Vec<(usize, usize)> = oriented
        .edge_references()
        .map(|edge| (edge.source().index(), edge.target().index()))
        .collect();
    let layered = normalize(ctx, &member_shapes, &oriented_pairs);
    let layers = minimize(&layered, config.ordering_passes(), config.ordering_heuristic());

    let mut gaps = vec![config.rank_gap(); layered.rank_count.saturating_sub(1)];
    for (index, edge) in layered_edges.iter().enumerate() {
        let (Some(label), Some(gap)) = (shapes[edge.edge].label, label_gap(&layered, index)) else {
            continue;
        };
        gaps[gap] = gaps[gap].max(label.height() + 2.0 * label_padding);
    }

    let placement = place(
        &layered,
        &layers,
        config.node_spacing(),
        config.relaxation_passes(),
        &gaps,
    );

    let mut placed: Vec<PlacedMember> = members
        .iter()
        .enumerate()
        .map(|(index, &member)| PlacedMember {
            bounds: Bounds::new_from_center(placement.centers[index], sizes[member]),
            rank: ranks[index],
            order: 0,
        })
        .collect();
    for layer in &layers {
        let real = layer.iter().filter_map(|&node| match layered.nodes[node].kind {
            LayerNodeKind::Member(index) => Some(index),
            LayerNodeKind::Virtual(_) => None,
        });
        for (order, index) in real.enumerate() {
            placed[index].order = order;
        }
    }

    let router = Router {
        layered: &layered,
        layers: &layers,
        placement: &placement,
        members: &placed,
        gaps: &gaps,
        flat_edge_offset: config.flat_edge_offset(),
        self_loop_size: config.self_loop_size(),
        label_padding,
    };
    let mut routed: Vec<RoutedEdge> = layered_edges
        .iter()
        .enumerate()
        .map(|(index, edge)| {
            router.edge(
                index,
                edge.edge,
                local[edge.source],
                local[edge.target],
                reversed[index],
                shapes[edge.edge].label,
            )
        })
        .collect();
    routed.extend(
        loops
            .iter()
            .map(|edge| router.self_loop(edge.edge, local[edge.source], shapes[edge.edge].label)),
    );

    let mut bounds = placed
        .iter()
        .map(|member| member.bounds)
        .reduce(|a, b| a.merge(&b))
        .unwrap_or_default();
    for edge in &routed {
        for point in &edge.waypoints {
            bounds = bounds.merge(&point.to_bounds(Size::default()));
        }
        if let Some(label) = &edge.label {
            bounds = bounds.merge(label);
        }
    }

    Ok(ComponentLayout {
        bounds,
        members: placed,
        edges: routed,
    })
}

/// The gap a labeled edge places its label in: the middle one it crosses.
fn label_gap(layered: &LayeredGraph, edge: usize) -> Option<usize> {
    let chain = &layered.chains[edge];
    let top = layered.nodes[*chain.first()?].rank;
    let bottom = layered.nodes[*chain.last()?].rank;
    let span = bottom.checked_sub(top).filter(|&span| span > 0)?;
    Some(top + (span - 1) / 2)
}

struct Router<'a> {
    layered: &'a LayeredGraph,
    layers: &'a Layers,
    placement: &'a Placement,
    members: &'a [PlacedMember],
    gaps: &'a [f32],
    flat_edge_offset: f32,
    self_loop_size: f32,
    label_padding: f32,
}

impl Router<'_> {
    fn edge(
        &self,
        index: usize,
        edge: usize,
        source: usize,
        target: usize,
        reversed: bool,
        label: Option<Size>,
    ) -> RoutedEdge {
        match label_gap(self.layered, index) {
            Some(gap) => self.ranked(index, edge, reversed, gap, label),
            None => self.flat(edge, source, target, reversed, label),
        }
    }

    /// An edge between different ranks, through its routing points.
    fn ranked(
        &self,
        index: usize,
        edge: usize,
        reversed: bool,
        gap: usize,
        label: Option<Size>,
    ) -> RoutedEdge {
        let chain = &self.layered.chains[index];
        let mut waypoints: Vec<Point> = chain[1..chain.len() - 1]
            .iter()
            .map(|&node| self.placement.centers[node])
            .collect();

        let label = label.and_then(|size| {
            let top = self.layered.nodes[chain[0]].rank;
            let upper = self.placement.centers[*chain.get(gap - top)?];
            let lower = self.placement.centers[*chain.get(gap - top + 1)?];
            let rank_bottom = self.placement.rank_tops[gap] + self.placement.rank_heights[gap];
            let y = rank_bottom + self.gaps[gap] / 2.0;
            let t = if lower.y() == upper.y() {
                0.5
            } else {
                (y - upper.y()) / (lower.y() - upper.y())
            };
            let x = upper.x() + (lower.x() - upper.x()) * t;
            let center = Point::new(x + self.label_padding + size.width() / 2.0, y);
            Some(Bounds::new_from_center(center, size))
        });

        if reversed {
            waypoints.reverse();
        }
        RoutedEdge {
            edge,
            kind: EdgeKind::Normal,
            reversed,
            waypoints,
            label,
        }
    }

    /// An edge between two members of the same rank. Adjacent members are
    /// joined directly; otherwise the edge detours above the rank.
    fn flat(
        &self,
        edge: usize,
        source: usize,
        target: usize,
        reversed: bool,
        label: Option<Size>,
    ) -> RoutedEdge {
        let from = self.members[source];
        let to = self.members[target];
        let rank = from.rank;
        let position = |member: usize| {
            self.layers[rank]
                .iter()
                .position(|&node| self.layered.nodes[node].kind == LayerNodeKind::Member(member))
        };
        let adjacent = match (position(source), position(target)) {
            (Some(a), Some(b)) => a.abs_diff(b) <= 1,
            _ => true,
        };

        let (waypoints, line_y) = if adjacent {
            (Vec::new(), from.bounds.center().y())
        } else {
            let lane = self.placement.rank_tops[rank] - self.flat_edge_offset;
            (
                vec![
                    Point::new(from.bounds.center().x(), lane),
                    Point::new(to.bounds.center().x(), lane),
                ],
                lane,
            )
        };

        let label = label.map(|size| {
            let x = (from.bounds.center().x() + to.bounds.center().x()) / 2.0;
            let center = Point::new(x, line_y - self.label_padding - size.height() / 2.0);
            Bounds::new_from_center(center, size)
        });
        RoutedEdge {
            edge,
            kind: EdgeKind::Flat,
            reversed,
            waypoints,
            label,
        }
    }

    fn self_loop(&self, edge: usize, member: usize, label: Option<Size>) -> RoutedEdge {
        let bounds = self.members[member].bounds;
        let size = self.self_loop_size;
        let half = size.min(bounds.height()) / 2.0;
        let (right, y) = (bounds.max_x(), bounds.center().y());
        let waypoints = vec![
            Point::new(right, y - half),
            Point::new(right + size, y - half),
            Point::new(right + size, y + half),
            Point::new(right, y + half),
        ];
        let label = label.map(|label| {
            let center = Point::new(right + size + self.label_padding + label.width() / 2.0, y);
            Bounds::new_from_center(center, label)
        });
        RoutedEdge {
            edge,
            kind: EdgeKind::SelfLoop,
            reversed: false,
            waypoints,
            label,
        }
    }
}
