//! Root diagram types.
//!
//! - [`Diagram`] - Metadata plus exactly one body
//! - [`DiagramMeta`] - Title and caption shared by every diagram kind
//! - [`DiagramBody`] - Selects the layout engine through its variant

use std::fmt;

use crate::semantic::{graph::GraphModel, sequence::SequenceModel};

/// Diagram-level decorations that do not belong to a particular element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramMeta {
    title: Option<String>,
    caption: Option<String>,
}

impl DiagramMeta {
    /// Create metadata with optional title and caption.
    pub fn new(title: Option<String>, caption: Option<String>) -> Self {
        Self { title, caption }
    }

    /// Title drawn centered above the diagram.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Caption drawn centered below the diagram.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

/// The content of a diagram, one variant per layout engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramBody {
    /// Participants and time-ordered events, laid out as a timeline.
    Sequence(SequenceModel),
    /// Nodes, edges and clusters, laid out hierarchically.
    Graph(GraphModel),
}

impl DiagramBody {
    /// Number of elements counted against the configured size limit.
    ///
    /// Timelines count participants plus events, graphs count nodes plus
    /// edges plus clusters.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Sequence(model) => model.element_count(),
            Self::Graph(model) => model.element_count(),
        }
    }

    /// Short name of the diagram kind, used in log output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "sequence",
            Self::Graph(_) => "graph",
        }
    }
}

/// A complete diagram ready for layout.
///
/// # Examples
///
/// ```
/// # use astrolabe_core::semantic::{Diagram, GraphModel, GraphNode};
/// let mut model = GraphModel::new();
/// model.add_node(GraphNode::new("a"));
///
/// let diagram = Diagram::graph(model).with_title("Overview");
/// assert_eq!(diagram.meta().title(), Some("Overview"));
/// assert_eq!(diagram.body().element_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    meta: DiagramMeta,
    body: DiagramBody,
}

impl Diagram {
    /// Create a diagram from metadata and a body.
    pub fn new(meta: DiagramMeta, body: DiagramBody) -> Self {
        Self { meta, body }
    }

    /// Create an undecorated timeline diagram.
    pub fn sequence(model: SequenceModel) -> Self {
        Self::new(DiagramMeta::default(), DiagramBody::Sequence(model))
    }

    /// Create an undecorated graph diagram.
    pub fn graph(model: GraphModel) -> Self {
        Self::new(DiagramMeta::default(), DiagramBody::Graph(model))
    }

    /// Returns the diagram with the given title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    /// Returns the diagram with the given caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.meta.caption = Some(caption.into());
        self
    }

    pub fn meta(&self) -> &DiagramMeta {
        &self.meta
    }

    pub fn body(&self) -> &DiagramBody {
        &self.body
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.meta.title() {
            Some(title) => write!(f, "{} diagram \"{title}\"", self.body.kind_name()),
            None => write!(f, "{} diagram", self.body.kind_name()),
        }
    }
}
