//! Proper layering: edges spanning several ranks are split into unit-length
//! segments through virtual nodes, one per intermediate rank.

use log::trace;

use astrolabe_core::identifier::Id;

use crate::{context::LayoutContext, layout::positioning::Extent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LayerNodeKind {
    /// A real member, by its index in the component.
    Member(usize),
    /// A routing point of the component edge with this index.
    Virtual(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct LayerNode {
    pub kind: LayerNodeKind,
    pub rank: usize,
    /// Cross-axis extent around the node's center.
    pub extent: Extent,
    /// Main-axis size.
    pub height: f32,
    /// Identity of a routing point; `None` for members.
    pub id: Option<Id>,
}

impl LayerNode {
    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, LayerNodeKind::Virtual(_))
    }
}

/// A graph whose edges all connect adjacent ranks.
#[derive(Debug, Clone, Default)]
pub(super) struct LayeredGraph {
    /// Members first, in component order, then virtual nodes.
    pub nodes: Vec<LayerNode>,
    /// Segments from rank `r` to rank `r + 1`, in creation order.
    pub segments: Vec<(usize, usize)>,
    /// For every component edge, the layered nodes it passes through from
    /// its oriented source to its oriented target.
    pub chains: Vec<Vec<usize>>,
    pub rank_count: usize,
}

impl LayeredGraph {
    pub fn successors(&self) -> Vec<Vec<usize>> {
        let mut successors = vec![Vec::new(); self.nodes.len()];
        for &(upper, lower) in &self.segments {
            successors[upper].push(lower);
        }
        successors
    }

    pub fn predecessors(&self) -> Vec<Vec<usize>> {
        let mut predecessors = vec![Vec::new(); self.nodes.len()];
        for &(upper, lower) in &self.segments {
            predecessors[lower].push(upper);
        }
        predecessors
    }
}

/// A member prepared for layering.
#[derive(Debug, Clone, Copy)]
pub(super) struct MemberShape {
    pub rank: usize,
    pub extent: Extent,
    pub height: f32,
}

/// Builds the layered graph.
///
/// `edges` are oriented `(source, target)` pairs whose source rank is never
/// below the target rank. Edges between members of the same rank get a
/// two-element chain and no segment.
pub(super) fn normalize(
    ctx: &mut LayoutContext<'_>,
    members: &[MemberShape],
    edges: &[(usize, usize)],
) -> LayeredGraph {
    let virtual_width = ctx.config().layout().graph().virtual_node_width();
    let mut graph = LayeredGraph {
        nodes: members
            .iter()
            .enumerate()
            .map(|(index, shape)| LayerNode {
                kind: LayerNodeKind::Member(index),
                rank: shape.rank,
                extent: shape.extent,
                height: shape.height,
                id: None,
            })
            .collect(),
        rank_count: members.iter().map(|shape| shape.rank + 1).max().unwrap_or(0),
        ..LayeredGraph::default()
    };

    for (edge, &(source, target)) in edges.iter().enumerate() {
        let (from, to) = (members[source].rank, members[target].rank);
        let mut chain = vec![source];
        let mut previous = source;
        for rank in from + 1..to {
            let point = graph.nodes.len();
            let id = ctx.next_synthetic_id();
            trace!(id = id.as_str(), edge, rank; "Routing point");
            graph.nodes.push(LayerNode {
                kind: LayerNodeKind::Virtual(edge),
                rank,
                extent: Extent::symmetric(virtual_width),
                height: 0.0,
                id: Some(id),
            });
            graph.segments.push((previous, point));
            chain.push(point);
            previous = point;
        }
        if to > from {
            graph.segments.push((previous, target));
        }
        chain.push(target);
        graph.chains.push(chain);
    }
    graph
}
