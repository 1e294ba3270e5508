//! Vertical pass over the events.
//!
//! A single cursor walks the events in order. Every row-bearing event is
//! placed below the cursor and pushes it down by its own height, so rows are
//! strictly increasing. Activation stacks and open blocks are tracked along
//! the way; structural problems are reported and recovered from.

use log::{debug, trace};

use astrolabe_core::{
    geometry::Size,
    identifier::Id,
    semantic::{ArrowStyle, Block, Event, Message, Note, NotePlacement, SequenceModel},
};

use super::{MessageKind, resolve::Resolved};
use crate::{
    config::SequenceConfig,
    context::{LayoutContext, MeasuredText},
    diagnostic::DiagnosticKind,
    error::LayoutError,
};

/// A message with its endpoints resolved to columns.
#[derive(Debug, Clone)]
pub(super) struct MessageSlot {
    pub kind: MessageKind,
    pub style: ArrowStyle,
    pub from: Option<usize>,
    pub to: Option<usize>,
    pub label: Option<MeasuredText>,
}

/// Columns a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NoteAnchor {
    LeftOf(usize),
    RightOf(usize),
    /// First and last column covered; equal for a note over one participant.
    Over(usize, usize),
    Across,
}

#[derive(Debug, Clone)]
pub(super) struct NoteSlot {
    pub anchor: NoteAnchor,
    pub label: MeasuredText,
    pub size: Size,
}

/// A divider or delay band.
#[derive(Debug, Clone)]
pub(super) struct BandSlot {
    pub height: f32,
    pub label: Option<MeasuredText>,
}

#[derive(Debug, Clone)]
pub(super) enum SlotKind {
    Message(MessageSlot),
    ActivationStart(Option<usize>),
    ActivationEnd(Option<usize>),
    Note(NoteSlot),
    Divider(BandSlot),
    Delay(BandSlot),
    BlockStart(usize),
    BlockSection(Option<usize>),
    BlockEnd(Option<usize>),
}

/// Vertical placement of one event.
#[derive(Debug, Clone)]
pub(super) struct Slot {
    pub y: f32,
    pub is_row: bool,
    pub kind: SlotKind,
}

#[derive(Debug, Clone)]
pub(super) struct Activation {
    pub column: usize,
    pub depth: usize,
    pub start_y: f32,
    pub end_y: f32,
    pub start_event: Option<usize>,
    pub end_event: Option<usize>,
}

#[derive(Debug, Clone)]
pub(super) struct Section {
    pub y: f32,
    pub label: Option<MeasuredText>,
}

#[derive(Debug, Clone)]
pub(super) struct BlockSpan {
    pub kind: String,
    pub tab: MeasuredText,
    pub label: Option<MeasuredText>,
    pub depth: usize,
    pub parent: Option<usize>,
    pub top: f32,
    pub bottom: f32,
    /// First and last column touched by the block's events, nested blocks included.
    pub columns: Option<(usize, usize)>,
    /// Levels of blocks nested inside this one; 0 for a block without children.
    pub subtree_depth: usize,
    pub sections: Vec<Section>,
    pub start_event: usize,
    pub end_event: Option<usize>,
}

/// Result of the vertical pass.
#[derive(Debug, Clone)]
pub(super) struct Timeline {
    pub slots: Vec<Slot>,
    pub activations: Vec<Activation>,
    pub blocks: Vec<BlockSpan>,
    /// Top and bottom of every delay band.
    pub delays: Vec<(f32, f32)>,
    /// Row at which a created participant appears, per column.
    pub creation_y: Vec<Option<f32>>,
    /// Row at which a destroyed participant ends, per column.
    pub destroy_y: Vec<Option<f32>>,
    pub header_row: f32,
    pub lifeline_bottom: f32,
}

#[derive(Debug, Clone, Copy)]
struct LastRow {
    y: f32,
    message_target: Option<usize>,
}

struct Builder<'r> {
    config: &'r SequenceConfig,
    resolved: &'r Resolved,
    cursor: f32,
    last_row: Option<LastRow>,
    stacks: Vec<Vec<usize>>,
    pending_starts: Vec<usize>,
    open_blocks: Vec<usize>,
    timeline: Timeline,
}

impl<'r> Builder<'r> {
    fn new(config: &'r SequenceConfig, resolved: &'r Resolved, event_count: usize) -> Self {
        let columns = resolved.columns.len();
        let header_row = resolved.header_row_height();
        Self {
            config,
            resolved,
            cursor: header_row,
            last_row: None,
            stacks: vec![Vec::new(); columns],
            pending_starts: Vec::new(),
            open_blocks: Vec::new(),
            timeline: Timeline {
                slots: Vec::with_capacity(event_count),
                activations: Vec::new(),
                blocks: Vec::new(),
                delays: Vec::new(),
                creation_y: vec![None; columns],
                destroy_y: vec![None; columns],
                header_row,
                lifeline_bottom: header_row,
            },
        }
    }

    /// Places a row-bearing event and advances the cursor.
    ///
    /// `above` and `below` are the space the event needs around its row.
    /// Participants created at this row reserve room for their header.
    fn place_row(
        &mut self,
        index: usize,
        mut above: f32,
        mut below: f32,
        message_target: Option<usize>,
    ) -> f32 {
        let created: Vec<usize> = self.resolved.created_by(index).collect();
        for &column in &created {
            let half = self.resolved.columns[column].header.height() / 2.0;
            above = above.max(half);
            below = below.max(half);
        }

        let y = self.cursor + self.config.event_spacing() + above;
        self.cursor = y + below;

        for column in created {
            self.timeline.creation_y[column] = Some(y);
        }
        for column in self.resolved.destroyed_by(index) {
            self.timeline.destroy_y[column] = Some(y);
        }
        for activation in self.pending_starts.drain(..) {
            self.timeline.activations[activation].start_y = y;
        }

        trace!(index, y; "Placed row");
        self.last_row = Some(LastRow { y, message_target });
        y
    }

    fn push_slot(&mut self, y: f32, is_row: bool, kind: SlotKind) {
        self.timeline.slots.push(Slot { y, is_row, kind });
    }

    fn lookup(&self, ctx: &mut LayoutContext<'_>, id: &Id, index: usize) -> Option<usize> {
        let column = self.resolved.column_of(id);
        if column.is_none() {
            ctx.report(
                DiagnosticKind::ParticipantNotFound,
                format!("event {index} refers to unknown participant `{id}`"),
                Some(id),
            );
        }
        column
    }

    /// Extends the innermost open block to cover `column`.
    fn touch(&mut self, column: usize) {
        if let Some(&block) = self.open_blocks.last() {
            let span = &mut self.timeline.blocks[block].columns;
            *span = Some(match *span {
                Some((min, max)) => (min.min(column), max.max(column)),
                None => (column, column),
            });
        }
    }

    fn message(&mut self, ctx: &mut LayoutContext<'_>, index: usize, message: &Message) {
        let from = self.lookup(ctx, message.from(), index);
        let to = message.to().and_then(|to| self.lookup(ctx, to, index));

        let kind = match (from, message.to(), to) {
            (Some(_), Some(_), Some(_)) if message.is_self_message() => MessageKind::SelfMessage,
            (Some(_), Some(_), Some(_)) => MessageKind::Normal,
            (Some(_), None, _) => MessageKind::Lost,
            _ => MessageKind::Unresolved,
        };

        let label = message.label().map(|text| {
            let style = ctx.config().style().message_text().clone();
            ctx.measure_wrapped(text, &style, self.config.max_message_width())
        });

        for column in from.into_iter().chain(to) {
            self.touch(column);
        }

        let padding = self.config.message_label_padding();
        let above = label
            .as_ref()
            .map_or(0.0, |label| label.size.height() + padding);
        let below = match kind {
            MessageKind::SelfMessage => self.config.self_message_height(),
            _ => 0.0,
        };

        let y = self.place_row(index, above, below, to);
        self.push_slot(
            y,
            true,
            SlotKind::Message(MessageSlot {
                kind,
                style: message.style(),
                from,
                to,
                label,
            }),
        );
    }

    fn activation_start(&mut self, ctx: &mut LayoutContext<'_>, index: usize, id: &Id) {
        let Some(column) = self.lookup(ctx, id, index) else {
            self.push_slot(self.cursor, false, SlotKind::ActivationStart(None));
            return;
        };
        self.touch(column);

        let depth = self.stacks[column].len();
        let activation = self.timeline.activations.len();
        let start_y = match self.last_row {
            Some(row) if row.message_target == Some(column) => Some(row.y),
            _ => None,
        };
        self.timeline.activations.push(Activation {
            column,
            depth,
            start_y: start_y.unwrap_or(self.cursor),
            end_y: start_y.unwrap_or(self.cursor),
            start_event: Some(index),
            end_event: None,
        });
        if start_y.is_none() {
            self.pending_starts.push(activation);
        }
        self.stacks[column].push(activation);
        self.push_slot(self.cursor, false, SlotKind::ActivationStart(Some(activation)));
    }

    fn activation_end(&mut self, ctx: &mut LayoutContext<'_>, index: usize, id: &Id) {
        let Some(column) = self.lookup(ctx, id, index) else {
            self.push_slot(self.cursor, false, SlotKind::ActivationEnd(None));
            return;
        };
        self.touch(column);

        let Some(activation) = self.stacks[column].pop() else {
            ctx.report(
                DiagnosticKind::ActivationUnderflow,
                format!("event {index} deactivates `{id}` which has no open activation"),
                Some(id),
            );
            let activation = self.timeline.activations.len();
            self.timeline.activations.push(Activation {
                column,
                depth: 0,
                start_y: self.cursor,
                end_y: self.cursor,
                start_event: None,
                end_event: Some(index),
            });
            self.push_slot(self.cursor, false, SlotKind::ActivationEnd(Some(activation)));
            return;
        };

        if let Some(position) = self.pending_starts.iter().position(|&a| a == activation) {
            self.pending_starts.remove(position);
            self.timeline.activations[activation].start_y = self.cursor;
        }

        let floor = self.last_row.map_or(self.cursor, |row| row.y);
        let end_y = self.close_activation(activation, floor, Some(index));
        self.push_slot(end_y, false, SlotKind::ActivationEnd(Some(activation)));
    }

    /// Ends an activation at `floor`.
    ///
    /// The bar keeps the minimum height and encloses every bar nested in it.
    fn close_activation(&mut self, activation: usize, floor: f32, end_event: Option<usize>) -> f32 {
        let (column, depth) = {
            let entry = &self.timeline.activations[activation];
            (entry.column, entry.depth)
        };
        let nested_end = self.timeline.activations[activation + 1..]
            .iter()
            .filter(|nested| nested.column == column && nested.depth > depth)
            .map(|nested| nested.end_y)
            .fold(floor, f32::max);

        let min_height = self.config.activation_min_height();
        let entry = &mut self.timeline.activations[activation];
        entry.end_y = nested_end.max(entry.start_y + min_height);
        entry.end_event = end_event;
        self.cursor = self.cursor.max(entry.end_y);
        entry.end_y
    }

    fn note(&mut self, ctx: &mut LayoutContext<'_>, index: usize, note: &Note) {
        let anchor = match note.placement() {
            NotePlacement::LeftOf(id) => self.lookup(ctx, id, index).map(NoteAnchor::LeftOf),
            NotePlacement::RightOf(id) => self.lookup(ctx, id, index).map(NoteAnchor::RightOf),
            NotePlacement::Over(first, second) => {
                let first = self.lookup(ctx, first, index);
                let second = match second {
                    Some(second) => self.lookup(ctx, second, index),
                    None => first,
                };
                first
                    .zip(second)
                    .map(|(a, b)| NoteAnchor::Over(a.min(b), a.max(b)))
            }
            NotePlacement::Across => Some(NoteAnchor::Across),
        }
        .unwrap_or(NoteAnchor::Across);

        match anchor {
            NoteAnchor::LeftOf(column) | NoteAnchor::RightOf(column) => self.touch(column),
            NoteAnchor::Over(first, last) => {
                self.touch(first);
                self.touch(last);
            }
            NoteAnchor::Across => {
                if let Some(last) = self.resolved.columns.len().checked_sub(1) {
                    self.touch(0);
                    self.touch(last);
                }
            }
        }

        let style = ctx.config().style().note_text().clone();
        let label = ctx.measure_wrapped(note.text(), &style, None);
        let padding = self.config.note_padding();
        let size = Size::new(
            label.size.width() + 2.0 * padding,
            label.size.height() + 2.0 * padding,
        );

        let y = self.place_row(index, 0.0, size.height(), None);
        self.push_slot(
            y,
            true,
            SlotKind::Note(NoteSlot {
                anchor,
                label,
                size,
            }),
        );
    }

    fn band_label(&self, ctx: &mut LayoutContext<'_>, text: Option<&str>) -> Option<MeasuredText> {
        text.map(|text| {
            let style = ctx.config().style().message_text().clone();
            ctx.measure_wrapped(text, &style, None)
        })
    }

    fn divider(&mut self, ctx: &mut LayoutContext<'_>, index: usize, text: Option<&str>) {
        let label = self.band_label(ctx, text);
        let label_height = label.as_ref().map_or(0.0, |label| {
            label.size.height() + 2.0 * self.config.message_label_padding()
        });
        let height = self.config.divider_height().max(label_height);

        let y = self.place_row(index, height / 2.0, height / 2.0, None);
        self.push_slot(y, true, SlotKind::Divider(BandSlot { height, label }));
    }

    fn delay(&mut self, ctx: &mut LayoutContext<'_>, index: usize, text: Option<&str>) {
        let label = self.band_label(ctx, text);
        let label_height = label.as_ref().map_or(0.0, |label| label.size.height());
        let height = self.config.delay_height().max(label_height);

        let y = self.place_row(index, 0.0, height, None);
        self.timeline.delays.push((y, y + height));
        self.push_slot(y, true, SlotKind::Delay(BandSlot { height, label }));
    }

    fn block_start(&mut self, ctx: &mut LayoutContext<'_>, index: usize, block: &Block) {
        let style = ctx.config().style().message_text().clone();
        let tab = ctx.measure_wrapped(block.kind(), &style.clone().with_bold(true), None);
        let label = block
            .label()
            .map(|text| ctx.measure_wrapped(text, &style, None));

        let label_height = label.as_ref().map_or(0.0, |label| label.size.height());
        let header = self
            .config
            .block_header_height()
            .max(tab.size.height())
            .max(label_height);

        let y = self.place_row(index, 0.0, header, None);
        let id = self.timeline.blocks.len();
        self.timeline.blocks.push(BlockSpan {
            kind: block.kind().to_string(),
            tab,
            label,
            depth: self.open_blocks.len(),
            parent: self.open_blocks.last().copied(),
            top: y,
            bottom: y + header,
            columns: None,
            subtree_depth: 0,
            sections: Vec::new(),
            start_event: index,
            end_event: None,
        });
        self.open_blocks.push(id);
        self.push_slot(y, true, SlotKind::BlockStart(id));
    }

    fn block_section(&mut self, ctx: &mut LayoutContext<'_>, index: usize, text: Option<&str>) {
        let Some(&block) = self.open_blocks.last() else {
            ctx.report(
                DiagnosticKind::UnbalancedBlock,
                format!("event {index} starts a section outside of any block"),
                None,
            );
            self.push_slot(self.cursor, false, SlotKind::BlockSection(None));
            return;
        };

        let label = self.band_label(ctx, text);
        let below = label.as_ref().map_or(0.0, |label| label.size.height());
        let y = self.place_row(index, 0.0, below, None);
        self.timeline.blocks[block].sections.push(Section { y, label });
        self.push_slot(y, true, SlotKind::BlockSection(Some(block)));
    }

    fn block_end(&mut self, ctx: &mut LayoutContext<'_>, index: usize) {
        if self.open_blocks.is_empty() {
            ctx.report(
                DiagnosticKind::UnbalancedBlock,
                format!("event {index} closes a block that was never opened"),
                None,
            );
            self.push_slot(self.cursor, false, SlotKind::BlockEnd(None));
            return;
        }

        let y = self.place_row(index, 0.0, 0.0, None);
        let block = self.close_block(y, Some(index));
        self.push_slot(y, true, SlotKind::BlockEnd(block));
    }

    /// Closes the innermost open block and folds its extent into the parent.
    fn close_block(&mut self, bottom: f32, end_event: Option<usize>) -> Option<usize> {
        let block = self.open_blocks.pop()?;
        let (columns, subtree_depth, parent) = {
            let span = &mut self.timeline.blocks[block];
            span.bottom = bottom;
            span.end_event = end_event;
            (span.columns, span.subtree_depth, span.parent)
        };

        if let Some(parent) = parent {
            let parent = &mut self.timeline.blocks[parent];
            parent.subtree_depth = parent.subtree_depth.max(subtree_depth + 1);
            parent.columns = match (parent.columns, columns) {
                (Some((a, b)), Some((c, d))) => Some((a.min(c), b.max(d))),
                (existing, None) => existing,
                (None, child) => child,
            };
        }
        Some(block)
    }

    /// Closes whatever is still open and fixes the lifeline length.
    fn finish(mut self, ctx: &mut LayoutContext<'_>) -> Timeline {
        for activation in std::mem::take(&mut self.pending_starts) {
            self.timeline.activations[activation].start_y = self.cursor;
        }

        for column in 0..self.stacks.len() {
            while let Some(activation) = self.stacks[column].pop() {
                let id = self.resolved.columns[column].id.clone();
                ctx.report(
                    DiagnosticKind::UnclosedActivation,
                    format!("activation of `{id}` is never closed"),
                    Some(&id),
                );
                self.close_activation(activation, self.cursor, None);
            }
        }

        while !self.open_blocks.is_empty() {
            ctx.report(
                DiagnosticKind::UnbalancedBlock,
                "block is never closed",
                None,
            );
            let bottom = self.cursor + self.config.event_spacing();
            self.cursor = bottom;
            self.close_block(bottom, None);
        }

        self.timeline.lifeline_bottom = self.cursor + self.config.event_spacing();

        for slot in &mut self.timeline.slots {
            match slot.kind {
                SlotKind::ActivationStart(Some(a)) => slot.y = self.timeline.activations[a].start_y,
                SlotKind::ActivationEnd(Some(a)) => slot.y = self.timeline.activations[a].end_y,
                _ => {}
            }
        }
        self.timeline
    }
}

/// Runs the vertical pass.
///
/// # Errors
///
/// Returns [`LayoutError::InvariantViolation`] if the produced rows are not
/// strictly increasing.
pub(super) fn build(
    ctx: &mut LayoutContext<'_>,
    model: &SequenceModel,
    resolved: &Resolved,
) -> Result<Timeline, LayoutError> {
    let config = ctx.config().layout().sequence();
    let mut builder = Builder::new(config, resolved, model.events().len());

    for (index, event) in model.events().iter().enumerate() {
        match event {
            Event::Message(message) => builder.message(ctx, index, message),
            Event::ActivationStart(id) => builder.activation_start(ctx, index, id),
            Event::ActivationEnd(id) => builder.activation_end(ctx, index, id),
            Event::Note(note) => builder.note(ctx, index, note),
            Event::Divider(text) => builder.divider(ctx, index, text.as_deref()),
            Event::Delay(text) => builder.delay(ctx, index, text.as_deref()),
            Event::BlockStart(block) => builder.block_start(ctx, index, block),
            Event::BlockSection(text) => builder.block_section(ctx, index, text.as_deref()),
            Event::BlockEnd => builder.block_end(ctx, index),
        }
    }

    let timeline = builder.finish(ctx);
    check_rows(&timeline)?;
    debug!(
        rows = timeline.slots.iter().filter(|slot| slot.is_row).count(),
        bottom = timeline.lifeline_bottom;
        "Vertical pass complete"
    );
    Ok(timeline)
}

fn check_rows(timeline: &Timeline) -> Result<(), LayoutError> {
    let mut previous: Option<f32> = None;
    for (index, slot) in timeline.slots.iter().enumerate() {
        if !slot.is_row {
            continue;
        }
        if previous.is_some_and(|previous| slot.y <= previous) {
            return Err(LayoutError::invariant(format!(
                "row of event {index} at y={} does not follow the previous row",
                slot.y
            )));
        }
        previous = Some(slot.y);
    }
    Ok(())
}
