//! Sequence timeline layout.
//!
//! The engine places participants in columns and events in rows:
//!
//! 1. **Resolve** - index participants, pick the column order, validate lifetimes
//! 2. **Timeline** - walk the events once with a vertical cursor, tracking
//!    activation stacks and open blocks
//! 3. **Columns** - size every column from what the timeline put on it and
//!    distribute the columns horizontally
//! 4. **Assemble** - combine rows and columns into the final geometry and
//!    move the drawing to its final position
//!
//! Row-bearing events (messages, notes, dividers, delays, block boundaries)
//! receive strictly increasing vertical positions. Activation starts and ends
//! do not occupy rows; they only shape activation boxes.

mod assemble;
mod columns;
mod resolve;
mod timeline;

use log::{debug, info};
use serde::Serialize;

use astrolabe_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    semantic::{ArrowStyle, DiagramMeta, Event, ParticipantKind, SequenceModel},
};

use crate::{
    context::LayoutContext,
    error::LayoutError,
    layout::{DiagramLayout, LabelGeometry, LayoutResult, Shift},
};

/// Horizontal space reserved for one participant.
///
/// Ranges of different participants never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnRange {
    min_x: f32,
    max_x: f32,
}

impl ColumnRange {
    pub(crate) fn new(min_x: f32, max_x: f32) -> Self {
        Self { min_x, max_x }
    }

    pub fn min_x(&self) -> f32 {
        self.min_x
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn overlaps(&self, other: &ColumnRange) -> bool {
        self.min_x < other.max_x && other.min_x < self.max_x
    }
}

impl Shift for ColumnRange {
    fn shift(&mut self, offset: Point) {
        self.min_x += offset.x();
        self.max_x += offset.x();
    }
}

/// A vertical piece of a lifeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LifelineSegment {
    x: f32,
    start_y: f32,
    end_y: f32,
    dotted: bool,
}

impl LifelineSegment {
    pub(crate) fn new(x: f32, start_y: f32, end_y: f32, dotted: bool) -> Self {
        Self {
            x,
            start_y,
            end_y,
            dotted,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn start_y(&self) -> f32 {
        self.start_y
    }

    pub fn end_y(&self) -> f32 {
        self.end_y
    }

    /// Dotted segments cross a delay.
    pub fn dotted(&self) -> bool {
        self.dotted
    }
}

impl Shift for LifelineSegment {
    fn shift(&mut self, offset: Point) {
        self.x += offset.x();
        self.start_y += offset.y();
        self.end_y += offset.y();
    }
}

/// Geometry of one participant: header, lifeline, optional footer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantGeometry {
    id: Id,
    kind: ParticipantKind,
    column: usize,
    center_x: f32,
    range: ColumnRange,
    header: Bounds,
    label: LabelGeometry,
    footer: Option<Bounds>,
    lifeline: Vec<LifelineSegment>,
    destroy_mark: Option<Bounds>,
}

impl ParticipantGeometry {
    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    /// Zero-based column index, left to right.
    pub fn column(&self) -> usize {
        self.column
    }

    /// X coordinate of the lifeline.
    pub fn center_x(&self) -> f32 {
        self.center_x
    }

    /// Horizontal space reserved for this participant.
    pub fn range(&self) -> ColumnRange {
        self.range
    }

    /// The participant box at the top, or at the creation row.
    pub fn header(&self) -> Bounds {
        self.header
    }

    /// The participant label, centered in the header.
    pub fn label(&self) -> &LabelGeometry {
        &self.label
    }

    /// The participant box repeated below the lifeline.
    pub fn footer(&self) -> Option<Bounds> {
        self.footer
    }

    pub fn lifeline(&self) -> &[LifelineSegment] {
        &self.lifeline
    }

    /// The cross drawn where a destroyed participant's lifeline ends.
    pub fn destroy_mark(&self) -> Option<Bounds> {
        self.destroy_mark
    }
}

impl Shift for ParticipantGeometry {
    fn shift(&mut self, offset: Point) {
        self.center_x += offset.x();
        self.range.shift(offset);
        self.header.shift(offset);
        self.label.shift(offset);
        self.footer.shift(offset);
        self.lifeline.shift(offset);
        self.destroy_mark.shift(offset);
    }
}

/// How a message arrow was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A direct segment between two lifelines.
    Normal,
    /// A rectangular detour leaving and re-entering the same lifeline.
    SelfMessage,
    /// A stub leaving the source towards no participant.
    Lost,
    /// A stub standing in for a reference to an unknown participant.
    Unresolved,
}

/// Routed arrow of a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageGeometry {
    kind: MessageKind,
    style: ArrowStyle,
    points: Vec<Point>,
    label: Option<LabelGeometry>,
}

impl MessageGeometry {
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn style(&self) -> ArrowStyle {
        self.style
    }

    /// The arrow path; the head is at the last point.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }
}

impl Shift for MessageGeometry {
    fn shift(&mut self, offset: Point) {
        self.points.shift(offset);
        self.label.shift(offset);
    }
}

/// Box of a note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteGeometry {
    bounds: Bounds,
    label: LabelGeometry,
}

impl NoteGeometry {
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> &LabelGeometry {
        &self.label
    }
}

impl Shift for NoteGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
        self.label.shift(offset);
    }
}

/// A horizontal band across all columns, used by dividers and delays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandGeometry {
    bounds: Bounds,
    label: Option<LabelGeometry>,
}

impl BandGeometry {
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }
}

impl Shift for BandGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
        self.label.shift(offset);
    }
}

/// Geometry kind of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventGeometryKind {
    Message(MessageGeometry),
    /// Index into [`SequenceLayout::activations`], if the participant resolved.
    ActivationStart { activation: Option<usize> },
    /// Index into [`SequenceLayout::activations`], if the participant resolved.
    ActivationEnd { activation: Option<usize> },
    Note(NoteGeometry),
    Divider(BandGeometry),
    Delay(BandGeometry),
    /// Index into [`SequenceLayout::blocks`].
    BlockStart { block: usize },
    /// Index into [`SequenceLayout::blocks`], `None` without an open block.
    BlockSection { block: Option<usize> },
    /// Index into [`SequenceLayout::blocks`], `None` without an open block.
    BlockEnd { block: Option<usize> },
}

impl Shift for EventGeometryKind {
    fn shift(&mut self, offset: Point) {
        match self {
            Self::Message(message) => message.shift(offset),
            Self::Note(note) => note.shift(offset),
            Self::Divider(band) | Self::Delay(band) => band.shift(offset),
            Self::ActivationStart { .. }
            | Self::ActivationEnd { .. }
            | Self::BlockStart { .. }
            | Self::BlockSection { .. }
            | Self::BlockEnd { .. } => {}
        }
    }
}

/// Geometry of one input event.
///
/// `y` is the row position for row-bearing events: the arrow line of a
/// message, the top of a note, delay, or block header, the separator of a
/// section or divider, and the bottom line of a block. Activation events take
/// the start or end of their activation box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventGeometry {
    index: usize,
    y: f32,
    is_row: bool,
    kind: EventGeometryKind,
}

impl EventGeometry {
    /// Index of the event in the model.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Whether the event occupies its own row on the timeline.
    pub fn is_row(&self) -> bool {
        self.is_row
    }

    pub fn kind(&self) -> &EventGeometryKind {
        &self.kind
    }
}

impl Shift for EventGeometry {
    fn shift(&mut self, offset: Point) {
        self.y += offset.y();
        self.kind.shift(offset);
    }
}

/// An activation bar on a lifeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivationGeometry {
    participant: Id,
    depth: usize,
    bounds: Bounds,
    start_event: Option<usize>,
    end_event: Option<usize>,
}

impl ActivationGeometry {
    pub fn participant(&self) -> &Id {
        &self.participant
    }

    /// Nesting depth on the participant's stack; 0 is the outermost bar.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The opening event; `None` for a bar produced by an unmatched end.
    pub fn start_event(&self) -> Option<usize> {
        self.start_event
    }

    /// The closing event; `None` for a bar left open at the end.
    pub fn end_event(&self) -> Option<usize> {
        self.end_event
    }
}

impl Shift for ActivationGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
    }
}

/// An `else` separator within a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionGeometry {
    y: f32,
    label: Option<LabelGeometry>,
}

impl SectionGeometry {
    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }
}

impl Shift for SectionGeometry {
    fn shift(&mut self, offset: Point) {
        self.y += offset.y();
        self.label.shift(offset);
    }
}

/// The frame of a grouping block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockGeometry {
    kind: String,
    depth: usize,
    bounds: Bounds,
    tab: LabelGeometry,
    label: Option<LabelGeometry>,
    sections: Vec<SectionGeometry>,
    start_event: usize,
    end_event: Option<usize>,
}

impl BlockGeometry {
    /// The operator, such as `alt` or `loop`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of enclosing blocks.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The operator tab in the top-left corner.
    pub fn tab(&self) -> &LabelGeometry {
        &self.tab
    }

    /// The guard text next to the tab.
    pub fn label(&self) -> Option<&LabelGeometry> {
        self.label.as_ref()
    }

    pub fn sections(&self) -> &[SectionGeometry] {
        &self.sections
    }

    pub fn start_event(&self) -> usize {
        self.start_event
    }

    /// The closing event; `None` for a block left open at the end.
    pub fn end_event(&self) -> Option<usize> {
        self.end_event
    }
}

impl Shift for BlockGeometry {
    fn shift(&mut self, offset: Point) {
        self.bounds.shift(offset);
        self.tab.shift(offset);
        self.label.shift(offset);
        self.sections.shift(offset);
    }
}

/// Geometry of a sequence diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceLayout {
    participants: Vec<ParticipantGeometry>,
    events: Vec<EventGeometry>,
    activations: Vec<ActivationGeometry>,
    blocks: Vec<BlockGeometry>,
}

impl SequenceLayout {
    /// Participants in column order.
    pub fn participants(&self) -> &[ParticipantGeometry] {
        &self.participants
    }

    pub fn participant(&self, id: &str) -> Option<&ParticipantGeometry> {
        self.participants.iter().find(|p| p.id == *id)
    }

    /// One entry per input event, in event order.
    pub fn events(&self) -> &[EventGeometry] {
        &self.events
    }

    pub fn event(&self, index: usize) -> Option<&EventGeometry> {
        self.events.get(index)
    }

    /// Row-bearing events in event order.
    pub fn rows(&self) -> impl Iterator<Item = &EventGeometry> {
        self.events.iter().filter(|event| event.is_row)
    }

    pub fn activations(&self) -> &[ActivationGeometry] {
        &self.activations
    }

    pub fn blocks(&self) -> &[BlockGeometry] {
        &self.blocks
    }
}

impl Shift for SequenceLayout {
    fn shift(&mut self, offset: Point) {
        self.participants.shift(offset);
        self.events.shift(offset);
        self.activations.shift(offset);
        self.blocks.shift(offset);
    }
}

/// Returns the deepest block nesting in `model`.
fn block_nesting_depth(model: &SequenceModel) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    for event in model.events() {
        match event {
            Event::BlockStart(_) => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Event::BlockEnd => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Lays out a timeline diagram.
///
/// # Errors
///
/// Returns [`LayoutError::NestingLimitExceeded`] when blocks nest deeper than
/// the configured limit. Structural problems are recorded on the context.
pub(crate) fn layout(
    ctx: &mut LayoutContext<'_>,
    meta: &DiagramMeta,
    model: &SequenceModel,
) -> Result<LayoutResult, LayoutError> {
    let limit = ctx.config().layout().limits().max_nesting_depth();
    let depth = block_nesting_depth(model);
    if depth > limit {
        return Err(LayoutError::NestingLimitExceeded { depth, limit });
    }

    info!(
        participants = model.participants().len(),
        events = model.events().len();
        "Laying out sequence diagram"
    );

    let resolved = resolve::resolve(ctx, model);
    debug!(columns = resolved.columns.len(); "Participants resolved");

    let timeline = timeline::build(ctx, model, &resolved)?;
    debug!(
        activations = timeline.activations.len(),
        blocks = timeline.blocks.len();
        "Timeline built"
    );

    let columns = columns::distribute(ctx, &resolved, &timeline);
    let mut layout = assemble::assemble(ctx, &resolved, &timeline, &columns)?;

    let padding = ctx.config().layout().sequence().diagram_padding();
    let content = assemble::content_bounds(&layout);
    let (title, caption, bounds) =
        super::finish(ctx, meta, content, padding, |offset| layout.shift(offset));

    info!(width = bounds.width(), height = bounds.height(); "Sequence layout complete");
    Ok(LayoutResult::new(
        DiagramLayout::Sequence(layout),
        title,
        caption,
        bounds,
        Vec::new(),
    ))
}
