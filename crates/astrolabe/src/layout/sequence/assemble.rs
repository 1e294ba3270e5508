//! Final geometry: combines the vertical and horizontal passes.

use log::trace;

use astrolabe_core::geometry::{Bounds, Point, Size};

use super::{
    ActivationGeometry, BandGeometry, BlockGeometry, EventGeometry, EventGeometryKind,
    LifelineSegment, MessageGeometry, MessageKind, NoteGeometry, ParticipantGeometry,
    SectionGeometry, SequenceLayout,
    columns::{self, Columns},
    resolve::Resolved,
    timeline::{BandSlot, BlockSpan, MessageSlot, NoteAnchor, NoteSlot, SlotKind, Timeline},
};
use crate::{
    config::SequenceConfig,
    context::{LayoutContext, MeasuredText},
    error::LayoutError,
    layout::LabelGeometry,
};

/// Side length of the cross marking a destroyed participant.
const DESTROY_MARK_SIZE: f32 = 12.0;

struct Assembler<'r> {
    config: &'r SequenceConfig,
    resolved: &'r Resolved,
    timeline: &'r Timeline,
    columns: &'r Columns,
    reach: Vec<f32>,
    activations: Vec<ActivationGeometry>,
}

fn label_at(top_left: Point, text: &MeasuredText) -> LabelGeometry {
    LabelGeometry::new(Bounds::new_from_top_left(top_left, text.size), text.lines.clone())
}

fn label_centered(center: Point, text: &MeasuredText) -> LabelGeometry {
    LabelGeometry::new(Bounds::new_from_center(center, text.size), text.lines.clone())
}

impl Assembler<'_> {
    fn center(&self, column: usize) -> f32 {
        self.columns.centers[column]
    }

    /// Horizontal span covering every column, or an empty span at the origin.
    fn full_span(&self) -> (f32, f32) {
        match self.columns.centers.len().checked_sub(1) {
            Some(last) => (self.columns.range(0).min_x(), self.columns.range(last).max_x()),
            None => (0.0, 0.0),
        }
    }

    /// X where an arrow meets the lifeline of `column` at `y`.
    ///
    /// The deepest activation bar covering `y` is used; the arrow meets its
    /// right edge when heading right and its left edge otherwise.
    fn attach_x(&self, column: usize, y: f32, heading_right: bool) -> f32 {
        let active = self
            .activations
            .iter()
            .zip(&self.timeline.activations)
            .filter(|(geometry, activation)| {
                activation.column == column
                    && geometry.bounds.min_y() <= y
                    && y <= geometry.bounds.max_y()
            })
            .max_by_key(|(geometry, _)| geometry.depth);

        match active {
            Some((geometry, _)) if heading_right => geometry.bounds.max_x(),
            Some((geometry, _)) => geometry.bounds.min_x(),
            None => self.center(column),
        }
    }

    fn participant(&self, column: usize) -> ParticipantGeometry {
        let resolved = &self.resolved.columns[column];
        let center_x = self.center(column);
        let size = resolved.header;

        let header = match self.timeline.creation_y[column] {
            Some(y) => Bounds::new_from_center(Point::new(center_x, y), size),
            None => Bounds::new_from_top_left(
                Point::new(center_x - size.width() / 2.0, self.timeline.header_row - size.height()),
                size,
            ),
        };
        let label = label_centered(header.center(), &resolved.label);

        let start = header.max_y();
        let destroy_y = self.timeline.destroy_y[column];
        let end = destroy_y.unwrap_or(self.timeline.lifeline_bottom).max(start);
        let lifeline = self.lifeline(center_x, start, end);

        let footer = (self.config.footbox() && destroy_y.is_none()).then(|| {
            Bounds::new_from_top_left(
                Point::new(center_x - size.width() / 2.0, self.timeline.lifeline_bottom),
                size,
            )
        });
        let destroy_mark = destroy_y.map(|y| {
            Bounds::new_from_center(
                Point::new(center_x, end.max(y)),
                Size::new(DESTROY_MARK_SIZE, DESTROY_MARK_SIZE),
            )
        });

        ParticipantGeometry {
            id: resolved.id.clone(),
            kind: resolved.kind,
            column,
            center_x,
            range: self.columns.range(column),
            header,
            label,
            footer,
            lifeline,
            destroy_mark,
        }
    }

    /// Splits a lifeline into solid and dotted pieces around delays.
    fn lifeline(&self, x: f32, start: f32, end: f32) -> Vec<LifelineSegment> {
        let mut segments = Vec::new();
        let mut cursor = start;
        for &(top, bottom) in &self.timeline.delays {
            if bottom <= cursor || top >= end {
                continue;
            }
            let top = top.max(cursor);
            let bottom = bottom.min(end);
            if top > cursor {
                segments.push(LifelineSegment::new(x, cursor, top, false));
            }
            segments.push(LifelineSegment::new(x, top, bottom, true));
            cursor = bottom;
        }
        if end > cursor || segments.is_empty() {
            segments.push(LifelineSegment::new(x, cursor, end, false));
        }
        segments
    }

    fn activation(&self, index: usize) -> ActivationGeometry {
        let activation = &self.timeline.activations[index];
        let width = self.config.activation_width();
        let x = self.center(activation.column) - width / 2.0
            + activation.depth as f32 * self.config.activation_indent();
        ActivationGeometry {
            participant: self.resolved.columns[activation.column].id.clone(),
            depth: activation.depth,
            bounds: Bounds::new_from_top_left(
                Point::new(x, activation.start_y),
                Size::new(width, activation.end_y - activation.start_y),
            ),
            start_event: activation.start_event,
            end_event: activation.end_event,
        }
    }

    fn stub_length(&self, label: Option<&MeasuredText>) -> f32 {
        let label_width = label.map_or(0.0, |label| label.size.width());
        self.config
            .stub_length()
            .max(label_width + 2.0 * self.config.message_label_padding())
    }

    fn message(&self, index: usize, y: f32, slot: &MessageSlot) -> MessageGeometry {
        let padding = self.config.message_label_padding();
        let stub = self.stub_length(slot.label.as_ref());

        let points = match (slot.kind, slot.from, slot.to) {
            (MessageKind::SelfMessage, Some(column), _) => {
                let bottom = y + self.config.self_message_height();
                let start = self.attach_x(column, y, true);
                let end = self.attach_x(column, bottom, true);
                let far = start.max(end) + self.config.self_message_width();
                vec![
                    Point::new(start, y),
                    Point::new(far, y),
                    Point::new(far, bottom),
                    Point::new(end, bottom),
                ]
            }
            (MessageKind::Normal, Some(from), Some(to)) => {
                let heading_right = self.center(to) >= self.center(from);
                let start = self.attach_x(from, y, heading_right);
                let end = if self.resolved.columns[to].created_at == Some(index) {
                    let half = self.resolved.columns[to].header.width() / 2.0;
                    if heading_right {
                        self.center(to) - half
                    } else {
                        self.center(to) + half
                    }
                } else {
                    self.attach_x(to, y, !heading_right)
                };
                vec![Point::new(start, y), Point::new(end, y)]
            }
            (_, Some(from), _) => {
                let start = self.attach_x(from, y, true);
                vec![Point::new(start, y), Point::new(start + stub, y)]
            }
            (_, None, Some(to)) => {
                let end = self.attach_x(to, y, false);
                vec![Point::new(end - stub, y), Point::new(end, y)]
            }
            (_, None, None) => vec![Point::new(0.0, y), Point::new(stub, y)],
        };

        let label = slot.label.as_ref().map(|text| match slot.kind {
            MessageKind::SelfMessage => {
                label_at(Point::new(points[0].x() + padding, y - padding - text.size.height()), text)
            }
            _ => {
                let first = points[0];
                let last = points[points.len() - 1];
                let mid = first.midpoint(last);
                label_at(
                    Point::new(
                        mid.x() - text.size.width() / 2.0,
                        y - padding - text.size.height(),
                    ),
                    text,
                )
            }
        });

        MessageGeometry {
            kind: slot.kind,
            style: slot.style,
            points,
            label,
        }
    }

    fn note(&self, y: f32, slot: &NoteSlot) -> NoteGeometry {
        let gap = self.config.note_gap();
        let width = slot.size.width();
        let min_x = match slot.anchor {
            NoteAnchor::LeftOf(column) => self.center(column) - gap - width,
            NoteAnchor::RightOf(column) => self.center(column) + self.reach[column] + gap,
            NoteAnchor::Over(first, last) => {
                let left = self.center(first) - gap;
                let right = self.center(last) + gap;
                if first != last && right - left >= width {
                    left
                } else {
                    (left + right) / 2.0 - width / 2.0
                }
            }
            NoteAnchor::Across => {
                let (left, right) = self.full_span();
                if right - left >= width {
                    left
                } else {
                    (left + right) / 2.0 - width / 2.0
                }
            }
        };

        let max_x = match slot.anchor {
            NoteAnchor::Over(first, last) if first != last => {
                (self.center(last) + gap).max(min_x + width)
            }
            NoteAnchor::Across => self.full_span().1.max(min_x + width),
            _ => min_x + width,
        };
        let bounds = Bounds::new_from_corners(
            Point::new(min_x, y),
            Point::new(max_x, y + slot.size.height()),
        );
        NoteGeometry {
            bounds,
            label: label_centered(bounds.center(), &slot.label),
        }
    }

    fn band(&self, top: f32, slot: &BandSlot) -> BandGeometry {
        let (mut left, mut right) = self.full_span();
        if let Some(label) = &slot.label {
            let needed = label.size.width() + 2.0 * self.config.message_label_padding();
            if right - left < needed {
                let center = (left + right) / 2.0;
                left = center - needed / 2.0;
                right = center + needed / 2.0;
            }
        }
        let bounds = Bounds::new_from_corners(
            Point::new(left, top),
            Point::new(right, top + slot.height),
        );
        BandGeometry {
            bounds,
            label: slot
                .label
                .as_ref()
                .map(|label| label_centered(bounds.center(), label)),
        }
    }

    fn block_header_height(&self, span: &BlockSpan) -> f32 {
        let label = span.label.as_ref().map_or(0.0, |label| label.size.height());
        self.config
            .block_header_height()
            .max(span.tab.size.height())
            .max(label)
    }

    /// Frames of every block.
    ///
    /// Blocks are visited innermost first so each parent can be widened to
    /// enclose its children by one indent.
    fn blocks(&self) -> Vec<BlockGeometry> {
        let spans = &self.timeline.blocks;
        let padding = self.config.block_padding();
        let indent = self.config.block_indent();
        let mut extents: Vec<(f32, f32)> = vec![(0.0, 0.0); spans.len()];

        for (index, span) in spans.iter().enumerate().rev() {
            let inset = padding + span.subtree_depth as f32 * indent;
            let (mut min_x, mut max_x) = match span.columns {
                Some((first, last)) => (self.center(first) - inset, self.center(last) + inset),
                None => {
                    let (left, right) = self.full_span();
                    (left - inset, right + inset)
                }
            };

            let label_width = span
                .label
                .as_ref()
                .map_or(0.0, |label| label.size.width() + 2.0 * padding);
            let needed = span.tab.size.width() + 2.0 * padding + label_width;
            max_x = max_x.max(min_x + needed);

            for (child, child_span) in spans.iter().enumerate().skip(index + 1) {
                if child_span.parent == Some(index) {
                    min_x = min_x.min(extents[child].0 - indent);
                    max_x = max_x.max(extents[child].1 + indent);
                }
            }
            extents[index] = (min_x, max_x);
        }

        spans
            .iter()
            .zip(extents)
            .map(|(span, (min_x, max_x))| {
                let bounds = Bounds::new_from_corners(
                    Point::new(min_x, span.top),
                    Point::new(max_x, span.bottom),
                );
                let header = self.block_header_height(span);
                let tab = label_at(
                    Point::new(
                        min_x + padding,
                        span.top + (header - span.tab.size.height()) / 2.0,
                    ),
                    &span.tab,
                );
                let label = span.label.as_ref().map(|text| {
                    label_at(
                        Point::new(
                            tab.bounds().max_x() + 2.0 * padding,
                            span.top + (header - text.size.height()) / 2.0,
                        ),
                        text,
                    )
                });
                let sections = span
                    .sections
                    .iter()
                    .map(|section| SectionGeometry {
                        y: section.y,
                        label: section
                            .label
                            .as_ref()
                            .map(|text| label_at(Point::new(min_x + padding, section.y), text)),
                    })
                    .collect();

                BlockGeometry {
                    kind: span.kind.clone(),
                    depth: span.depth,
                    bounds,
                    tab,
                    label,
                    sections,
                    start_event: span.start_event,
                    end_event: span.end_event,
                }
            })
            .collect()
    }

    fn event(&self, index: usize) -> EventGeometry {
        let slot = &self.timeline.slots[index];
        let kind = match &slot.kind {
            SlotKind::Message(message) => {
                EventGeometryKind::Message(self.message(index, slot.y, message))
            }
            SlotKind::ActivationStart(activation) => EventGeometryKind::ActivationStart {
                activation: *activation,
            },
            SlotKind::ActivationEnd(activation) => EventGeometryKind::ActivationEnd {
                activation: *activation,
            },
            SlotKind::Note(note) => EventGeometryKind::Note(self.note(slot.y, note)),
            SlotKind::Divider(band) => {
                EventGeometryKind::Divider(self.band(slot.y - band.height / 2.0, band))
            }
            SlotKind::Delay(band) => EventGeometryKind::Delay(self.band(slot.y, band)),
            SlotKind::BlockStart(block) => EventGeometryKind::BlockStart { block: *block },
            SlotKind::BlockSection(block) => EventGeometryKind::BlockSection { block: *block },
            SlotKind::BlockEnd(block) => EventGeometryKind::BlockEnd { block: *block },
        };
        EventGeometry {
            index,
            y: slot.y,
            is_row: slot.is_row,
            kind,
        }
    }
}

/// Builds the final sequence geometry in local coordinates.
///
/// # Errors
///
/// Returns [`LayoutError::InvariantViolation`] if two column ranges overlap.
pub(super) fn assemble(
    ctx: &LayoutContext<'_>,
    resolved: &Resolved,
    timeline: &Timeline,
    columns: &Columns,
) -> Result<SequenceLayout, LayoutError> {
    let mut assembler = Assembler {
        config: ctx.config().layout().sequence(),
        resolved,
        timeline,
        columns,
        reach: columns::activation_reach(ctx, timeline, resolved.columns.len()),
        activations: Vec::new(),
    };
    assembler.activations = (0..timeline.activations.len())
        .map(|index| assembler.activation(index))
        .collect();

    let participants: Vec<ParticipantGeometry> = (0..resolved.columns.len())
        .map(|column| assembler.participant(column))
        .collect();
    for pair in participants.windows(2) {
        if pair[0].range.overlaps(&pair[1].range) {
            return Err(LayoutError::invariant(format!(
                "columns of `{}` and `{}` overlap",
                pair[0].id, pair[1].id
            )));
        }
    }

    let events = (0..timeline.slots.len())
        .map(|index| assembler.event(index))
        .collect();
    let blocks = assembler.blocks();
    trace!(participants = participants.len(), blocks = blocks.len(); "Assembled sequence geometry");

    Ok(SequenceLayout {
        participants,
        events,
        activations: assembler.activations,
        blocks,
    })
}

/// Union of every element's bounds, labels included.
pub(super) fn content_bounds(layout: &SequenceLayout) -> Bounds {
    let mut boxes: Vec<Bounds> = Vec::new();

    for participant in &layout.participants {
        boxes.push(participant.header);
        boxes.extend(participant.footer);
        boxes.extend(participant.destroy_mark);
        for segment in &participant.lifeline {
            boxes.push(Bounds::new_from_corners(
                Point::new(segment.x, segment.start_y),
                Point::new(segment.x, segment.end_y),
            ));
        }
    }
    boxes.extend(layout.activations.iter().map(|a| a.bounds));
    boxes.extend(layout.blocks.iter().map(|b| b.bounds));

    for event in &layout.events {
        match &event.kind {
            EventGeometryKind::Message(message) => {
                if let (Some(first), Some(rest)) =
                    (message.points.first(), message.points.get(1..))
                {
                    let path = rest
                        .iter()
                        .fold(first.to_bounds(Size::default()), |acc, point| {
                            acc.merge(&point.to_bounds(Size::default()))
                        });
                    boxes.push(path);
                }
                boxes.extend(message.label.as_ref().map(LabelGeometry::bounds));
            }
            EventGeometryKind::Note(note) => boxes.push(note.bounds),
            EventGeometryKind::Divider(band) | EventGeometryKind::Delay(band) => {
                boxes.push(band.bounds);
                boxes.extend(band.label.as_ref().map(LabelGeometry::bounds));
            }
            _ => {}
        }
    }

    boxes
        .into_iter()
        .reduce(|acc, bounds| acc.merge(&bounds))
        .unwrap_or_default()
}
