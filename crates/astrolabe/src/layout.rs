//! Layout result types and the shared layout plumbing.
//!
//! A layout call produces a [`LayoutResult`]: the geometry of every input
//! element, the overall drawing bounds, and the structural diagnostics that
//! were recovered from. The result is created fresh on every call and never
//! cached.
//!
//! # Organization
//!
//! - [`sequence`] - Timeline engine and its geometry types
//! - [`graph`] - Hierarchical graph engine and its geometry types
//! - [`positioning`] - Placement helpers shared by both engines

pub mod graph;
pub(crate) mod positioning;
pub mod sequence;

use serde::Serialize;

use astrolabe_core::{
    geometry::{Bounds, Insets, Point, Size},
    semantic::DiagramMeta,
    text::TextStyle,
};

use crate::{context::LayoutContext, diagnostic::Diagnostic};

pub use graph::{ClusterGeometry, EdgeGeometry, EdgeKind, GraphLayout, NodeGeometry};
pub use sequence::{
    ActivationGeometry, BandGeometry, BlockGeometry, ColumnRange, EventGeometry,
    EventGeometryKind, LifelineSegment, MessageGeometry, MessageKind, NoteGeometry,
    ParticipantGeometry, SectionGeometry, SequenceLayout,
};

/// Moves geometry in place by an offset.
///
/// Engines lay out in local coordinates and shift the finished drawing so its
/// top-left corner sits at the configured padding.
pub(crate) trait Shift {
    fn shift(&mut self, offset: Point);
}

impl Shift for Bounds {
    fn shift(&mut self, offset: Point) {
        *self = self.translate(offset);
    }
}

impl Shift for Point {
    fn shift(&mut self, offset: Point) {
        *self = self.add_point(offset);
    }
}

impl<T: Shift> Shift for Option<T> {
    fn shift(&mut self, offset: Point) {
        if let Some(inner) = self {
            inner.shift(offset);
        }
    }
}

impl<T: Shift> Shift for Vec<T> {
    fn shift(&mut self, offset: Point) {
        for item in self {
            item.shift(offset);
        }
    }
}

/// A block of text with its reserved box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGeometry {
    bounds: Bounds,
    lines: Vec<String>,
}

impl LabelGeometry {
    pub(crate) fn new(bounds: Bounds, lines: Vec<String>) -> Self {
        Self { bounds, lines }
    }

    /// The box the text occupies, padding excluded.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The text split into the lines it is drawn with.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The lines joined with `\n`.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

impl Shift for LabelGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
    }
}

/// Engine-specific geometry of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagramLayout {
    Sequence(SequenceLayout),
    Graph(GraphLayout),
}

/// Geometry for every element of a diagram plus the recovered diagnostics.
///
/// Two calls with the same model, configuration, and measurements produce
/// equal results, including their formatted output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    diagram: DiagramLayout,
    title: Option<LabelGeometry>,
    caption: Option<LabelGeometry>,
    bounds: Bounds,
    diagnostics: Vec<Diagnostic>,
}

impl LayoutResult {
    pub(crate) fn new(
        diagram: DiagramLayout,
        title: Option<LabelGeometry>,
        caption: Option<LabelGeometry>,
        bounds: Bounds,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            diagram,
            title,
            caption,
            bounds,
            diagnostics,
        }
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn diagram(&self) -> &DiagramLayout {
        &self.diagram
    }

    /// Returns the timeline geometry, if this is a sequence diagram.
    pub fn as_sequence(&self) -> Option<&SequenceLayout> {
        match &self.diagram {
            DiagramLayout::Sequence(layout) => Some(layout),
            DiagramLayout::Graph(_) => None,
        }
    }

    /// Returns the graph geometry, if this is a graph diagram.
    pub fn as_graph(&self) -> Option<&GraphLayout> {
        match &self.diagram {
            DiagramLayout::Graph(layout) => Some(layout),
            DiagramLayout::Sequence(_) => None,
        }
    }

    pub fn title(&self) -> Option<&LabelGeometry> {
        self.title.as_ref()
    }

    pub fn caption(&self) -> Option<&LabelGeometry> {
        self.caption.as_ref()
    }

    /// The full drawing area, padding included. Its top-left corner is the origin.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn size(&self) -> Size {
        self.bounds.to_size()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Places title and caption around the content and translates everything.
///
/// `content` is the union of all element bounds in local coordinates. The
/// title is centered above it and the caption centered below it, each
/// separated by `padding`. The closure receives the offset that moves the
/// drawing's top-left corner to `(padding, padding)`.
pub(crate) fn finish(
    ctx: &mut LayoutContext<'_>,
    meta: &DiagramMeta,
    content: Bounds,
    padding: f32,
    translate_content: impl FnOnce(Point),
) -> (Option<LabelGeometry>, Option<LabelGeometry>, Bounds) {
    let style = ctx.config().style().title_text().clone();
    let gap = padding.max(1.0);

    let title = meta
        .title()
        .map(|text| place_centered(ctx, text, &style, content.center().x(), |size| {
            content.min_y() - gap - size.height()
        }));
    let caption = meta
        .caption()
        .map(|text| place_centered(ctx, text, &style, content.center().x(), |_| {
            content.max_y() + gap
        }));

    let mut drawing = content;
    for label in title.iter().chain(caption.iter()) {
        drawing = drawing.merge(&label.bounds());
    }

    let offset = Point::new(padding - drawing.min_x(), padding - drawing.min_y());
    translate_content(offset);

    let mut title = title;
    let mut caption = caption;
    title.shift(offset);
    caption.shift(offset);

    let bounds = Bounds::new_from_top_left(
        Point::default(),
        drawing.to_size().add_padding(Insets::uniform(padding)),
    );
    (title, caption, bounds)
}

fn place_centered(
    ctx: &mut LayoutContext<'_>,
    text: &str,
    style: &TextStyle,
    center_x: f32,
    top: impl FnOnce(Size) -> f32,
) -> LabelGeometry {
    let measured = ctx.measure_wrapped(text, style, None);
    let top = top(measured.size);
    let min = Point::new(center_x - measured.size.width() / 2.0, top);
    LabelGeometry::new(Bounds::new_from_top_left(min, measured.size), measured.lines)
}
