//! Layer-based ordering of drawing commands.
//!
//! This module lets emitters state which z-order layer a primitive belongs to
//! without caring about the order in which primitives are produced.
//!
//! # Overview
//!
//! The layer system consists of:
//! - [`RenderLayer`]: An enum defining available rendering layers in order
//! - [`LayeredOutput`]: A structure for collecting commands by layer
//!
//! # Example
//!
//! ```
//! # use astrolabe_core::draw::{DrawCommand, ElementRole, LayeredOutput, RenderLayer};
//! # use astrolabe_core::geometry::{Bounds, Point, Size};
//! let frame = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
//!
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(
//!     RenderLayer::Note,
//!     DrawCommand::Rectangle { bounds: frame, role: ElementRole::Note },
//! );
//! output.add_to_layer(
//!     RenderLayer::Background,
//!     DrawCommand::Rectangle { bounds: frame, role: ElementRole::Cluster },
//! );
//!
//! // Background comes first regardless of insertion order
//! let commands = output.into_commands();
//! assert_eq!(commands[0].role(), ElementRole::Cluster);
//! ```

use crate::draw::DrawCommand;

/// Defines the rendering layers of the command stream.
///
/// Layers are rendered from bottom to top in the order defined by variant declaration.
/// The `Ord` derive uses declaration order, so the first variant renders first (bottom),
/// and the last variant renders last (top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Background elements (cluster frames) - renders first
    Background,
    /// Vertical lifelines in sequence diagrams
    Lifeline,
    /// Main content shapes: participant boxes and graph nodes
    Content,
    /// Activation boxes (deeper nesting is emitted later within this layer)
    Activation,
    /// Block frames and section separators
    Fragment,
    /// Notes and annotations
    Note,
    /// Arrows, edges, and messages between elements
    Arrow,
    /// Text labels and annotations
    Text,
}

impl RenderLayer {
    /// Returns a human-readable name for this layer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Lifeline => "lifeline",
            Self::Content => "content",
            Self::Activation => "activation",
            Self::Fragment => "fragment",
            Self::Note => "note",
            Self::Arrow => "arrow",
            Self::Text => "text",
        }
    }
}

/// Drawing commands grouped by rendering layer.
///
/// Commands keep their insertion order within a layer; across layers they are
/// emitted bottom to top.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, DrawCommand)>,
}

impl LayeredOutput {
    /// Creates a new empty `LayeredOutput`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single command to the specified layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, command: DrawCommand) {
        self.items.push((layer, command));
    }

    /// Merges all layers from another `LayeredOutput` into this one.
    ///
    /// Commands from the other output are appended after the existing
    /// commands of the same layer.
    pub fn merge(&mut self, other: LayeredOutput) {
        self.items.extend(other.items);
    }

    /// Returns `true` if there are no commands in any layer.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of collected commands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates over the collected commands with their layer, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(RenderLayer, DrawCommand)> {
        self.items.iter()
    }

    /// Consumes the output and returns the commands in z-order.
    ///
    /// The sort is stable, so commands of the same layer keep their insertion
    /// order and the result is deterministic.
    pub fn into_commands(mut self) -> Vec<DrawCommand> {
        self.items.sort_by_key(|(layer, _)| *layer);
        self.items.into_iter().map(|(_, command)| command).collect()
    }
}
