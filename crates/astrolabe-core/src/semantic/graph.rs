//! Graph diagram model (class, component, object and similar diagrams).
//!
//! A [`GraphModel`] holds nodes, directed edges and clusters. Clusters form a
//! forest through their `parent` links and nodes join a cluster through their
//! own `parent`. Edges may form cycles; the layout engine breaks them.

use serde::{Deserialize, Serialize};

use crate::{geometry::Size, identifier::Id};

/// A box-shaped vertex of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: Id,
    label: Option<String>,
    parent: Option<Id>,
    size: Option<Size>,
}

impl GraphNode {
    /// Create a node labeled with its identifier.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            label: None,
            parent: None,
            size: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Places the node inside the given cluster.
    pub fn with_parent(mut self, parent: impl Into<Id>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Fixes the node size instead of deriving it from the label.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the display text for this node.
    /// Uses the label if present, otherwise falls back to the identifier.
    pub fn display_text(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn parent(&self) -> Option<&Id> {
        self.parent.as_ref()
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }
}

/// A named group of nodes drawn inside a shared frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    id: Id,
    label: Option<String>,
    parent: Option<Id>,
}

impl Cluster {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            label: None,
            parent: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Nests this cluster inside another one.
    pub fn with_parent(mut self, parent: impl Into<Id>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// The label drawn in the cluster header, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn parent(&self) -> Option<&Id> {
        self.parent.as_ref()
    }
}

/// Line and head style of an edge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStyle {
    /// Solid line with an arrow head at the target.
    #[default]
    Directed,
    /// Dashed line with an arrow head at the target.
    Dependency,
    /// Solid line without heads.
    Undirected,
}

/// A directed connection between two nodes.
///
/// `length` is the minimum number of ranks between source and target. The
/// default of 1 places the target at least one rank below the source; 0
/// requests a flat edge between nodes of the same rank.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    source: Id,
    target: Id,
    label: Option<String>,
    style: EdgeStyle,
    length: u32,
}

impl GraphEdge {
    pub fn new(source: impl Into<Id>, target: impl Into<Id>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            style: EdgeStyle::default(),
            length: 1,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn source(&self) -> &Id {
        &self.source
    }

    pub fn target(&self) -> &Id {
        &self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> EdgeStyle {
        self.style
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns true if the edge starts and ends on the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// One element of a graph model, used when building models incrementally.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphElement {
    Node(GraphNode),
    Edge(GraphEdge),
    Cluster(Cluster),
}

impl From<GraphNode> for GraphElement {
    fn from(node: GraphNode) -> Self {
        Self::Node(node)
    }
}

impl From<GraphEdge> for GraphElement {
    fn from(edge: GraphEdge) -> Self {
        Self::Edge(edge)
    }
}

impl From<Cluster> for GraphElement {
    fn from(cluster: Cluster) -> Self {
        Self::Cluster(cluster)
    }
}

/// Nodes, edges and clusters of a graph diagram.
///
/// Insertion order is significant: it is the tie breaker of every ordering
/// decision the layout makes, so identical insertion order yields identical
/// geometry.
///
/// # Examples
///
/// ```
/// # use astrolabe_core::semantic::{Cluster, GraphEdge, GraphModel, GraphNode};
/// let mut model = GraphModel::new();
/// model.push(Cluster::new("backend"));
/// model.push(GraphNode::new("api").with_parent("backend"));
/// model.push(GraphNode::new("db").with_parent("backend"));
/// model.push(GraphEdge::new("api", "db").with_label("queries"));
///
/// assert_eq!(model.nodes().len(), 2);
/// assert_eq!(model.edges().len(), 1);
/// assert_eq!(model.clusters().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    clusters: Vec<Cluster>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn add_cluster(&mut self, cluster: Cluster) {
        self.clusters.push(cluster);
    }

    /// Appends an element of any kind.
    pub fn push(&mut self, element: impl Into<GraphElement>) {
        match element.into() {
            GraphElement::Node(node) => self.add_node(node),
            GraphElement::Edge(edge) => self.add_edge(edge),
            GraphElement::Cluster(cluster) => self.add_cluster(cluster),
        }
    }

    /// Returns the model with an additional element.
    pub fn with(mut self, element: impl Into<GraphElement>) -> Self {
        self.push(element);
        self
    }

    /// Nodes plus clusters plus edges, where an edge counts once per rank
    /// it spans. Layering inserts a routing point on every rank a stretched
    /// edge crosses.
    pub fn element_count(&self) -> usize {
        let edges = self.edges.iter().fold(0usize, |total, edge| {
            let ranks = usize::try_from(edge.length.max(1)).unwrap_or(usize::MAX);
            total.saturating_add(ranks)
        });
        (self.nodes.len() + self.clusters.len()).saturating_add(edges)
    }
}

impl FromIterator<GraphElement> for GraphModel {
    fn from_iter<T: IntoIterator<Item = GraphElement>>(iter: T) -> Self {
        let mut model = Self::new();
        for element in iter {
            model.push(element);
        }
        model
    }
}
