//! Hierarchical graph layout.
//!
//! A layered (Sugiyama-style) engine for box-and-arrow diagrams:
//!
//! 1. **Structure** - deduplicate, resolve references, build the cluster
//!    tree and one containment scope per cluster plus the root
//! 2. **Scopes** - lay out every scope innermost first. A finished cluster
//!    becomes a single box in its parent scope, sized to its content plus
//!    padding and header
//! 3. **Placement** - walk the scopes outermost first and move every scope's
//!    content into its cluster frame
//! 4. **Routing** - clip edge ends to the boxes of their real endpoints
//!
//! Within a scope the pipeline is cycle breaking, longest-path ranking,
//! normalization into unit-length segments, crossing minimization and
//! coordinate assignment, run per connected component.
//!
//! The engine works with ranks growing downward and swaps axes at the end
//! for [`Direction::LeftToRight`].

mod acyclic;
mod normalize;
mod order;
mod position;
mod rank;
mod scope;
mod structure;

use log::{debug, info};
use serde::Serialize;

use astrolabe_core::{
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
    semantic::{DiagramMeta, EdgeStyle, GraphModel},
};

use crate::{
    config::Direction,
    context::{LayoutContext, MeasuredText},
    diagnostic::DiagnosticKind,
    error::LayoutError,
    layout::{DiagramLayout, LabelGeometry, LayoutResult, Shift},
};
use scope::{EdgeShape, PlacedMember, RoutedEdge, ScopeLayout};
use structure::{Member, Structure};

/// How an edge was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Between different ranks, possibly through routing points.
    Normal,
    /// Between two nodes of the same rank.
    Flat,
    /// From a node back to itself.
    SelfLoop,
    /// An endpoint does not exist; the edge is a stub or empty.
    Unresolved,
}

/// Geometry of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeGeometry {
    id: Id,
    bounds: Bounds,
    label: LabelGeometry,
    rank: usize,
    order: usize,
    cluster: Option<Id>,
}

impl NodeGeometry {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> &LabelGeometry {
        &self.label
    }

    /// Layer of the node inside its scope.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Position of the node among the nodes of its rank and scope.
    pub fn order(&self) -> usize {
        self.order
    }

    /// The innermost cluster containing the node.
    pub fn cluster(&self) -> Option<&Id> {
        self.cluster.as_ref()
    }
}

impl Shift for NodeGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
        self.label.shift(offset);
    }
}

/// Geometry of one edge, with points running from source to target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeGeometry {
    index: usize,
    source: Id,
    target: Id,
    style: EdgeStyle,
    kind: EdgeKind,
    points: Vec<Point>,
    reversed: bool,
    label: Option<LabelGeometry>,
}

impl EdgeGeometry {
    /// Index of the edge in the model.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> &Id {
        &self.source
    }

    pub fn target(&self) -> &Id {
        &self.target
    }

    pub fn style(&self) -> EdgeStyle {
        self.style
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// The polyline, first point on the source and last point on the target.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// True when the edge was reversed to break a cycle. Its points still run
    /// from source to target, so it points against the rank direction.
    pub fn reversed(&self) -> bool {
        self.reversed
    }

    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }
}

impl Shift for EdgeGeometry {
    fn shift(&mut self, offset: Point) {
        self.points.shift(offset);
        self.label.shift(offset);
    }
}

/// Geometry of one cluster frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGeometry {
    id: Id,
    bounds: Bounds,
    label: Option<LabelGeometry>,
    parent: Option<Id>,
    depth: usize,
}

impl ClusterGeometry {
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The frame, enclosing every member with padding.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }

    pub fn parent(&self) -> Option<&Id> {
        self.parent.as_ref()
    }

    /// 1 for top-level clusters.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Shift for ClusterGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
        self.label.shift(offset);
    }
}

/// Geometry of a graph diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLayout {
    direction: Direction,
    nodes: Vec<NodeGeometry>,
    edges: Vec<EdgeGeometry>,
    clusters: Vec<ClusterGeometry>,
}

impl GraphLayout {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// One entry per distinct node, in insertion order.
    pub fn nodes(&self) -> &[NodeGeometry] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|node| node.id == *id)
    }

    /// One entry per input edge, in insertion order.
    pub fn edges(&self) -> &[EdgeGeometry] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&EdgeGeometry> {
        self.edges.get(index)
    }

    /// One entry per distinct cluster, in insertion order.
    pub fn clusters(&self) -> &[ClusterGeometry] {
        &self.clusters
    }

    pub fn cluster(&self, id: &str) -> Option<&ClusterGeometry> {
        self.clusters.iter().find(|cluster| cluster.id == *id)
    }

    /// Union of every element's bounds, or `None` for an empty graph.
    fn content_bounds(&self) -> Option<Bounds> {
        let boxes = self
            .nodes
            .iter()
            .map(|node| node.bounds)
            .chain(self.clusters.iter().map(|cluster| cluster.bounds))
            .chain(self.clusters.iter().filter_map(|c| c.label.as_ref().map(|l| l.bounds)))
            .chain(self.edges.iter().filter_map(|e| e.label.as_ref().map(|l| l.bounds)))
            .chain(
                self.edges
                    .iter()
                    .flat_map(|edge| edge.points.iter())
                    .map(|point| point.to_bounds(Size::default())),
            );
        boxes.reduce(|a, b| a.merge(&b))
    }
}

impl Shift for GraphLayout {
    fn shift(&mut self, offset: Point) {
        self.nodes.shift(offset);
        self.edges.shift(offset);
        self.clusters.shift(offset);
    }
}

/// Converts between the engine's abstract axes and the drawing's axes.
trait Orient {
    fn orient(self, direction: Direction) -> Self;
}

impl Orient for Size {
    fn orient(self, direction: Direction) -> Self {
        match direction {
            Direction::TopToBottom => self,
            Direction::LeftToRight => self.swap_axes(),
        }
    }
}

impl Orient for Point {
    fn orient(self, direction: Direction) -> Self {
        match direction {
            Direction::TopToBottom => self,
            Direction::LeftToRight => self.swap_axes(),
        }
    }
}

impl Orient for Bounds {
    fn orient(self, direction: Direction) -> Self {
        match direction {
            Direction::TopToBottom => self,
            Direction::LeftToRight => self.swap_axes(),
        }
    }
}

/// Size of a cluster frame around content of `content` size, and where the
/// content's top-left corner sits inside the frame.
///
/// The header label is reserved at the top of the drawing, which is the
/// abstract cross axis for left-to-right diagrams.
fn cluster_frame(
    content: Size,
    label: Option<Size>,
    padding: f32,
    direction: Direction,
) -> (Size, Point) {
    let label = label.unwrap_or_default().orient(direction);
    let header = |extent: f32| if extent > 0.0 { extent + padding } else { 0.0 };
    match direction {
        Direction::TopToBottom => {
            let header = header(label.height());
            let frame = Size::new(
                content.width().max(label.width()) + 2.0 * padding,
                content.height() + header + 2.0 * padding,
            );
            (frame, Point::new(padding, padding + header))
        }
        Direction::LeftToRight => {
            let header = header(label.width());
            let frame = Size::new(
                content.width() + header + 2.0 * padding,
                content.height().max(label.height()) + 2.0 * padding,
            );
            (frame, Point::new(padding + header, padding))
        }
    }
}

/// Explicit node sizes must be finite and non-negative.
fn is_usable(size: Size) -> bool {
    [size.width(), size.height()]
        .iter()
        .all(|value| value.is_finite() && *value >= 0.0)
}

/// Lays out a graph diagram.
///
/// # Errors
///
/// Returns [`LayoutError::NestingLimitExceeded`] for clusters nested deeper
/// than the configured limit, or [`LayoutError::InvariantViolation`] if the
/// layered pipeline produces inconsistent ranks.
pub(crate) fn layout(
    ctx: &mut LayoutContext<'_>,
    meta: &DiagramMeta,
    model: &GraphModel,
) -> Result<LayoutResult, LayoutError> {
    info!(
        nodes = model.nodes().len(),
        edges = model.edges().len(),
        clusters = model.clusters().len();
        "Laying out graph diagram"
    );

    let structure = structure::build(ctx, model)?;
    let config = ctx.config().layout().graph();
    let direction = config.direction();

    let node_style = ctx.config().style().node_text();
    let edge_style = ctx.config().style().edge_text();
    let node_padding = Insets::uniform(config.node_padding());

    let node_labels: Vec<MeasuredText> = structure
        .nodes
        .iter()
        .map(|node| ctx.measure_wrapped(node.display_text(), node_style, None))
        .collect();
    let mut node_sizes: Vec<Size> = Vec::with_capacity(structure.nodes.len());
    for (node, label) in structure.nodes.iter().zip(&node_labels) {
        let measured = label.size.add_padding(node_padding);
        let size = match node.size() {
            Some(size) if is_usable(size) => size,
            Some(size) => {
                ctx.report(
                    DiagnosticKind::InvalidSize,
                    format!(
                        "node `{}` has unusable size {} x {}; using its label size",
                        node.id(),
                        size.width(),
                        size.height()
                    ),
                    Some(node.id()),
                );
                measured
            }
            None => measured,
        };
        node_sizes.push(size.orient(direction));
    }
    let cluster_labels: Vec<Option<MeasuredText>> = structure
        .clusters
        .iter()
        .map(|cluster| {
            cluster
                .label()
                .map(|text| ctx.measure_wrapped(text, node_style, None))
        })
        .collect();
    let edge_labels: Vec<Option<MeasuredText>> = model
        .edges()
        .iter()
        .map(|edge| {
            edge.label()
                .map(|text| ctx.measure_wrapped(text, edge_style, None))
        })
        .collect();
    let shapes: Vec<EdgeShape> = model
        .edges()
        .iter()
        .zip(&edge_labels)
        .map(|(edge, label)| EdgeShape {
            length: edge.length(),
            label: label.as_ref().map(|label| label.size.orient(direction)),
        })
        .collect();

    // Innermost scopes first, so every cluster's size is known before its
    // parent scope places it.
    let mut cluster_sizes = vec![Size::default(); structure.clusters.len()];
    let mut content_offsets = vec![Point::default(); structure.clusters.len()];
    let mut layouts: Vec<Option<ScopeLayout>> = vec![None; structure.scopes.len()];
    for &index in &structure.post_order {
        let scope = &structure.scopes[index];
        let sizes: Vec<Size> = scope
            .members
            .iter()
            .map(|member| match *member {
                Member::Node(node) => node_sizes[node],
                Member::Cluster(cluster) => cluster_sizes[cluster],
            })
            .collect();
        let layout = scope::layout_scope(ctx, scope, &sizes, &shapes)?;

        if let Some(cluster) = scope.container {
            let label = cluster_labels[cluster].as_ref().map(|label| label.size);
            let (frame, offset) =
                cluster_frame(layout.size, label, config.cluster_padding(), direction);
            cluster_sizes[cluster] = frame;
            content_offsets[cluster] = offset;
        }
        layouts[index] = Some(layout);
    }

    let placed = place_scopes(&structure, layouts, &content_offsets);
    debug!(scopes = structure.scopes.len(); "Scopes placed");

    let nodes: Vec<NodeGeometry> = structure
        .nodes
        .iter()
        .zip(node_labels)
        .zip(&placed.nodes)
        .enumerate()
        .map(|(index, ((node, label), member))| {
            let bounds = member.bounds.orient(direction);
            NodeGeometry {
                id: node.id().clone(),
                bounds,
                label: LabelGeometry::new(
                    Bounds::new_from_center(bounds.center(), label.size),
                    label.lines,
                ),
                rank: member.rank,
                order: member.order,
                cluster: structure.node_cluster[index]
                    .map(|cluster| structure.clusters[cluster].id().clone()),
            }
        })
        .collect();

    let padding = config.cluster_padding();
    let clusters: Vec<ClusterGeometry> = structure
        .clusters
        .iter()
        .zip(cluster_labels)
        .zip(&placed.clusters)
        .enumerate()
        .map(|(index, ((cluster, label), bounds))| {
            let bounds = bounds.orient(direction);
            ClusterGeometry {
                id: cluster.id().clone(),
                bounds,
                label: label.map(|label| {
                    let min = bounds.min_point().add_point(Point::new(padding, padding));
                    LabelGeometry::new(Bounds::new_from_top_left(min, label.size), label.lines)
                }),
                parent: structure.cluster_parent[index]
                    .map(|parent| structure.clusters[parent].id().clone()),
                depth: structure.cluster_depth[index],
            }
        })
        .collect();

    let stub = config.rank_gap() / 2.0;
    let edges = model
        .edges()
        .iter()
        .zip(edge_labels)
        .zip(placed.edges)
        .enumerate()
        .map(|(index, ((edge, label), routed))| {
            let ends = structure.edges[index];
            let (kind, points, reversed, label_bounds) = match (ends.resolved(), routed) {
                (Some((source, target)), Some(routed)) => {
                    let (from, to) = (placed.nodes[source].bounds, placed.nodes[target].bounds);
                    let points = route(&routed, from, to);
                    (routed.kind, points, routed.reversed, routed.label)
                }
                (Some(_), None) => {
                    return Err(LayoutError::invariant(format!(
                        "edge {index} was not routed in any scope"
                    )));
                }
                (None, _) => {
                    let points = stub_points(&placed.nodes, ends.source, ends.target, stub);
                    (EdgeKind::Unresolved, points, false, None)
                }
            };
            Ok(EdgeGeometry {
                index,
                source: edge.source().clone(),
                target: edge.target().clone(),
                style: edge.style(),
                kind,
                points: points.into_iter().map(|p| p.orient(direction)).collect(),
                reversed,
                label: label
                    .zip(label_bounds)
                    .map(|(label, bounds)| LabelGeometry::new(bounds.orient(direction), label.lines)),
            })
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    let mut layout = GraphLayout {
        direction,
        nodes,
        edges,
        clusters,
    };

    let content = layout.content_bounds().unwrap_or_default();
    let (title, caption, bounds) = super::finish(ctx, meta, content, config.diagram_padding(), |offset| {
        layout.shift(offset)
    });

    info!(width = bounds.width(), height = bounds.height(); "Graph layout complete");
    Ok(LayoutResult::new(
        DiagramLayout::Graph(layout),
        title,
        caption,
        bounds,
        Vec::new(),
    ))
}

/// Absolute placement of every node, cluster and routed edge, in abstract
/// axes.
struct Placed {
    nodes: Vec<PlacedMember>,
    clusters: Vec<Bounds>,
    edges: Vec<Option<RoutedEdge>>,
}

/// Walks the scopes from the root inward, moving each scope's content into
/// the frame its cluster received in the parent scope.
fn place_scopes(
    structure: &Structure<'_>,
    mut layouts: Vec<Option<ScopeLayout>>,
    content_offsets: &[Point],
) -> Placed {
    let empty = PlacedMember {
        bounds: Bounds::default(),
        rank: 0,
        order: 0,
    };
    let mut placed = Placed {
        nodes: vec![empty; structure.nodes.len()],
        clusters: vec![Bounds::default(); structure.clusters.len()],
        edges: vec![None; structure.edges.len()],
    };

    let mut pending = vec![(0usize, Point::default())];
    while let Some((index, offset)) = pending.pop() {
        let Some(layout) = layouts[index].take() else {
            continue;
        };
        for (member, mut position) in structure.scopes[index].members.iter().zip(layout.members) {
            position.bounds.shift(offset);
            match *member {
                Member::Node(node) => placed.nodes[node] = position,
                Member::Cluster(cluster) => {
                    placed.clusters[cluster] = position.bounds;
                    let inner = position.bounds.min_point().add_point(content_offsets[cluster]);
                    pending.push((Structure::scope_of_cluster(cluster), inner));
                }
            }
        }
        for mut edge in layout.edges {
            edge.shift(offset);
            let slot = edge.edge;
            placed.edges[slot] = Some(edge);
        }
    }
    placed
}

/// Full polyline of a routed edge between the boxes of its real endpoints.
fn route(routed: &RoutedEdge, source: Bounds, target: Bounds) -> Vec<Point> {
    if routed.kind == EdgeKind::SelfLoop {
        return routed.waypoints.clone();
    }
    let toward_target = routed.waypoints.first().copied().unwrap_or(target.center());
    let toward_source = routed.waypoints.last().copied().unwrap_or(source.center());

    let mut points = Vec::with_capacity(routed.waypoints.len() + 2);
    points.push(source.boundary_point_toward(toward_target));
    points.extend_from_slice(&routed.waypoints);
    points.push(target.boundary_point_toward(toward_source));
    points
}

/// A short stub from the endpoint that exists, or nothing.
fn stub_points(
    nodes: &[PlacedMember],
    source: Option<usize>,
    target: Option<usize>,
    length: f32,
) -> Vec<Point> {
    match (source, target) {
        (Some(source), _) => {
            let bounds = nodes[source].bounds;
            let start = Point::new(bounds.center().x(), bounds.max_y());
            vec![start, start.add_point(Point::new(0.0, length))]
        }
        (None, Some(target)) => {
            let bounds = nodes[target].bounds;
            let end = Point::new(bounds.center().x(), bounds.min_y());
            vec![end.sub_point(Point::new(0.0, length)), end]
        }
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use astrolabe_core::{
        semantic::{Cluster, GraphEdge, GraphNode},
        text::FixedWidthMeasurer,
    };
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::{
        config::{AppConfig, GraphConfig, LayoutConfig},
        diagnostic::DiagnosticKind,
    };

    fn run_with(
        config: &AppConfig,
        model: &GraphModel,
    ) -> (GraphLayout, LayoutResult, Vec<DiagnosticKind>) {
        let measurer = FixedWidthMeasurer::default();
        let mut ctx = LayoutContext::new(config, &measurer);
        let result = layout(&mut ctx, &DiagramMeta::default(), model).expect("graph lays out");
        let kinds = ctx.into_diagnostics().iter().map(|d| d.kind()).collect();
        let graph = result.as_graph().expect("graph layout").clone();
        (graph, result, kinds)
    }

    fn run(model: &GraphModel) -> (GraphLayout, LayoutResult, Vec<DiagnosticKind>) {
        run_with(&AppConfig::default(), model)
    }

    #[test]
    fn test_unusable_sizes_fall_back_to_label() {
        let model = GraphModel::new()
            .with(GraphNode::new("a").with_size(Size::new(-200.0, 30.0)))
            .with(GraphNode::new("b").with_size(Size::new(f32::NAN, 30.0)))
            .with(GraphNode::new("c"))
            .with(GraphNode::new("d").with_size(Size::new(10.0, 20.0)));
        let (graph, result, diagnostics) = run(&model);

        assert_eq!(diagnostics, vec![DiagnosticKind::InvalidSize; 2]);
        let measured = graph.node("c").unwrap().bounds().width();
        for id in ["a", "b"] {
            let bounds = graph.node(id).unwrap().bounds();
            assert_approx_eq!(f32, bounds.width(), measured);
        }
        assert_approx_eq!(f32, graph.node("d").unwrap().bounds().width(), 10.0);

        let nodes = graph.nodes();
        for (i, node) in nodes.iter().enumerate() {
            let bounds = node.bounds();
            assert!(bounds.min_x().is_finite() && bounds.max_x().is_finite());
            assert!(bounds.min_x() <= bounds.max_x());
            assert!(result.bounds().contains_bounds(&bounds));
            for other in &nodes[i + 1..] {
                assert!(!bounds.overlaps(&other.bounds()));
            }
        }
    }

    #[test]
    fn test_chain_runs_top_to_bottom() {
        let model = GraphModel::new()
            .with(GraphNode::new("a"))
            .with(GraphNode::new("b"))
            .with(GraphEdge::new("a", "b"));
        let (graph, result, diagnostics) = run(&model);
        assert!(diagnostics.is_empty());

        let a = graph.node("a").unwrap();
        let b = graph.node("b").unwrap();
        assert_eq!((a.rank(), b.rank()), (0, 1));
        assert!(a.bounds().max_y() < b.bounds().min_y());

        let edge = graph.edge(0).unwrap();
        assert_eq!(edge.kind(), EdgeKind::Normal);
        let points = edge.points();
        assert_approx_eq!(f32, points[0].y(), a.bounds().max_y());
        assert_approx_eq!(f32, points[points.len() - 1].y(), b.bounds().min_y());

        let padding = GraphConfig::default().diagram_padding();
        assert_approx_eq!(f32, a.bounds().min_y(), padding);
        assert!(result.bounds().contains_bounds(&b.bounds()));
    }

    #[test]
    fn test_reversed_edge_points_upward() {
        let model = GraphModel::new()
            .with(GraphNode::new("a"))
            .with(GraphNode::new("b"))
            .with(GraphEdge::new("a", "b"))
            .with(GraphEdge::new("b", "a"));
        let (graph, _, _) = run(&model);

        let back = graph.edge(1).unwrap();
        assert!(back.reversed());
        let points = back.points();
        assert!(points[0].y() > points[points.len() - 1].y());
    }

    #[test]
    fn test_cluster_frames_its_members() {
        let model = GraphModel::new()
            .with(Cluster::new("outer").with_label("Outer"))
            .with(Cluster::new("inner").with_parent("outer"))
            .with(GraphNode::new("a").with_parent("inner"))
            .with(GraphNode::new("b").with_parent("outer"))
            .with(GraphNode::new("c"))
            .with(GraphEdge::new("a", "b"))
            .with(GraphEdge::new("b", "c"));
        let (graph, _, diagnostics) = run(&model);
        assert!(diagnostics.is_empty());

        let outer = graph.cluster("outer").unwrap();
        let inner = graph.cluster("inner").unwrap();
        assert_eq!((outer.depth(), inner.depth()), (1, 2));
        assert_eq!(inner.parent().map(Id::as_str), Some("outer"));

        assert!(outer.bounds().contains_bounds(&inner.bounds()));
        assert!(inner.bounds().contains_bounds(&graph.node("a").unwrap().bounds()));
        assert!(outer.bounds().contains_bounds(&graph.node("b").unwrap().bounds()));
        assert!(!outer.bounds().overlaps(&graph.node("c").unwrap().bounds()));

        let label = outer.label().expect("outer label");
        assert!(outer.bounds().contains_bounds(&label.bounds()));
        assert!(!label.bounds().overlaps(&inner.bounds()));
        assert_eq!(graph.node("a").unwrap().cluster().map(Id::as_str), Some("inner"));
    }

    #[test]
    fn test_left_to_right_swaps_axes() {
        let config = AppConfig::default().with_layout(
            LayoutConfig::default()
                .with_graph(GraphConfig::default().with_direction(Direction::LeftToRight)),
        );
        let model = GraphModel::new()
            .with(GraphNode::new("left").with_size(Size::new(80.0, 20.0)))
            .with(GraphNode::new("right").with_size(Size::new(80.0, 20.0)))
            .with(GraphEdge::new("left", "right"));
        let (graph, _, _) = run_with(&config, &model);

        let left = graph.node("left").unwrap().bounds();
        let right = graph.node("right").unwrap().bounds();
        assert_approx_eq!(f32, left.width(), 80.0);
        assert_approx_eq!(f32, left.height(), 20.0);
        assert!(left.max_x() < right.min_x());
        assert_approx_eq!(f32, left.center().y(), right.center().y());
        assert_eq!(graph.direction(), Direction::LeftToRight);
    }

    #[test]
    fn test_unresolved_edge_is_a_stub() {
        let model = GraphModel::new()
            .with(GraphNode::new("a"))
            .with(GraphEdge::new("a", "missing"))
            .with(GraphEdge::new("ghost", "phantom"));
        let (graph, _, diagnostics) = run(&model);

        assert_eq!(
            diagnostics.iter().filter(|k| **k == DiagnosticKind::NodeNotFound).count(),
            3
        );
        let stub = graph.edge(0).unwrap();
        assert_eq!(stub.kind(), EdgeKind::Unresolved);
        assert_eq!(stub.points().len(), 2);
        assert_approx_eq!(f32, stub.points()[0].y(), graph.node("a").unwrap().bounds().max_y());
        assert!(graph.edge(1).unwrap().points().is_empty());
    }

    #[test]
    fn test_edge_label_sits_between_ranks() {
        let model = GraphModel::new()
            .with(GraphNode::new("a"))
            .with(GraphNode::new("b"))
            .with(GraphEdge::new("a", "b").with_label("calls"));
        let (graph, result, _) = run(&model);

        let label = graph.edge(0).unwrap().label().expect("edge label");
        assert_eq!(label.content(), "calls");
        assert!(label.bounds().min_y() > graph.node("a").unwrap().bounds().max_y());
        assert!(label.bounds().max_y() < graph.node("b").unwrap().bounds().min_y());
        assert!(result.bounds().contains_bounds(&label.bounds()));
    }

    #[test]
    fn test_cluster_frame_reserves_header() {
        let (frame, offset) = cluster_frame(
            Size::new(100.0, 50.0),
            Some(Size::new(40.0, 10.0)),
            5.0,
            Direction::TopToBottom,
        );
        assert_eq!(frame, Size::new(110.0, 75.0));
        assert_eq!(offset, Point::new(5.0, 20.0));

        let (frame, offset) = cluster_frame(
            Size::new(50.0, 100.0),
            Some(Size::new(40.0, 10.0)),
            5.0,
            Direction::LeftToRight,
        );
        assert_eq!(frame, Size::new(75.0, 110.0));
        assert_eq!(offset, Point::new(20.0, 5.0));
    }
}
