//! Astrolabe - deterministic layout for sequence and graph diagrams.
//!
//! Astrolabe turns an already-parsed [`semantic::Diagram`] into exact
//! geometry: column and row positions for timeline diagrams, ranked node
//! positions and routed edges for graph diagrams. The geometry can be turned
//! into a z-ordered stream of [`draw::DrawCommand`]s for renderer backends.
//!
//! Parsing, rendering, and font rasterization are left to the caller. Text is
//! measured through the [`text::TextMeasurer`] interface.
//!
//! # Example
//!
//! ```
//! use astrolabe::{
//!     LayoutBuilder,
//!     semantic::{Diagram, GraphEdge, GraphModel, GraphNode},
//! };
//!
//! let model = GraphModel::new()
//!     .with(GraphNode::new("parser"))
//!     .with(GraphNode::new("layout"))
//!     .with(GraphEdge::new("parser", "layout"));
//!
//! let builder = LayoutBuilder::default();
//! let result = builder.layout(&Diagram::graph(model))?;
//!
//! let graph = result.as_graph().expect("graph layout");
//! assert_eq!(graph.node("parser").map(|n| n.rank()), Some(0));
//! assert_eq!(graph.node("layout").map(|n| n.rank()), Some(1));
//! assert!(result.diagnostics().is_empty());
//!
//! let commands = builder.draw_commands(&result);
//! assert!(!commands.is_empty());
//! # Ok::<(), astrolabe::error::LayoutError>(())
//! ```

pub mod config;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod layout;

mod context;

pub use astrolabe_core::{draw, geometry, identifier, semantic, text};

use log::{debug, info};

use config::AppConfig;
use context::LayoutContext;
use draw::DrawCommand;
use error::LayoutError;
use layout::LayoutResult;
use semantic::{Diagram, DiagramBody};
use text::{FixedWidthMeasurer, TextMeasurer};

/// Builder for laying out diagrams.
///
/// A builder owns the configuration and the text measurer. It holds no
/// per-diagram state, so one builder can lay out any number of diagrams and
/// can be shared between threads.
///
/// # Examples
///
/// ```rust
/// use astrolabe::{LayoutBuilder, config::AppConfig, text::FixedWidthMeasurer};
///
/// // Default configuration and fixed-width measurement
/// let builder = LayoutBuilder::default();
///
/// // Custom configuration and measurer
/// let builder = LayoutBuilder::new(AppConfig::default())
///     .with_measurer(FixedWidthMeasurer::new(0.5, 1.4));
/// ```
pub struct LayoutBuilder {
    config: AppConfig,
    measurer: Box<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    ///
    /// Text is measured with a [`FixedWidthMeasurer`] until
    /// [`with_measurer`](Self::with_measurer) replaces it.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            measurer: Box::new(FixedWidthMeasurer::default()),
        }
    }

    /// Returns the builder with the given text measurer.
    pub fn with_measurer(mut self, measurer: impl TextMeasurer + Send + Sync + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lay out a diagram.
    ///
    /// The diagram kind selects the engine. Structural problems in the model
    /// (dangling references, unbalanced activations or blocks) do not fail the
    /// call; they are returned on [`LayoutResult::diagnostics`].
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] for an invalid configuration,
    /// [`LayoutError::SizeLimitExceeded`] or
    /// [`LayoutError::NestingLimitExceeded`] for oversized input, and
    /// [`LayoutError::InvariantViolation`] if the engine reaches an
    /// inconsistent state. No geometry is returned in any of these cases.
    pub fn layout(&self, diagram: &Diagram) -> Result<LayoutResult, LayoutError> {
        self.config.validate()?;

        let body = diagram.body();
        let elements = body.element_count();
        let limit = self.config.layout().limits().max_elements();
        info!(diagram_kind = body.kind_name(), elements; "Laying out diagram");
        if elements > limit {
            return Err(LayoutError::SizeLimitExceeded { elements, limit });
        }

        let mut ctx = LayoutContext::new(&self.config, &*self.measurer);
        let result = match body {
            DiagramBody::Sequence(model) => {
                layout::sequence::layout(&mut ctx, diagram.meta(), model)
            }
            DiagramBody::Graph(model) => layout::graph::layout(&mut ctx, diagram.meta(), model),
        }?;

        let diagnostics = ctx.into_diagnostics();
        debug!(diagnostics = diagnostics.len(); "Layout finished");
        Ok(result.with_diagnostics(diagnostics))
    }

    /// Emits the drawing commands of a layout in z-order.
    pub fn draw_commands(&self, result: &LayoutResult) -> Vec<DrawCommand> {
        emit::draw_commands(result, &self.config)
    }
}
