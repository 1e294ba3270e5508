//! Horizontal pass: column sizing and distribution.
//!
//! Every column reserves an [`Extent`] around its lifeline that covers the
//! header, the stacked activation bars, and whatever is drawn next to the
//! lifeline (self-message loops, stubs, side notes). Labels of messages
//! between two columns add a minimum distance between their lifelines.

use log::debug;

use super::{
    ColumnRange, MessageKind,
    resolve::Resolved,
    timeline::{NoteAnchor, SlotKind, Timeline},
};
use crate::{
    context::LayoutContext,
    layout::positioning::{Extent, MinDistance, distribute_horizontally},
};

/// Lifeline positions and reserved ranges per column.
#[derive(Debug, Clone, Default)]
pub(super) struct Columns {
    pub centers: Vec<f32>,
    pub extents: Vec<Extent>,
}

impl Columns {
    pub fn range(&self, column: usize) -> ColumnRange {
        let center = self.centers[column];
        let extent = self.extents[column];
        ColumnRange::new(center - extent.before, center + extent.after)
    }
}

/// Right edge of the outermost activation bar of every column, relative to
/// the lifeline. Zero for columns without activations.
pub(super) fn activation_reach(
    ctx: &LayoutContext<'_>,
    timeline: &Timeline,
    columns: usize,
) -> Vec<f32> {
    let config = ctx.config().layout().sequence();
    let mut reach = vec![0.0f32; columns];
    for activation in &timeline.activations {
        let right = config.activation_width() / 2.0
            + activation.depth as f32 * config.activation_indent();
        reach[activation.column] = reach[activation.column].max(right);
    }
    reach
}

/// Sizes every column and distributes them left to right.
pub(super) fn distribute(
    ctx: &LayoutContext<'_>,
    resolved: &Resolved,
    timeline: &Timeline,
) -> Columns {
    let config = ctx.config().layout().sequence();
    let count = resolved.columns.len();
    let reach = activation_reach(ctx, timeline, count);
    let padding = config.message_label_padding();

    let mut extents: Vec<Extent> = resolved
        .columns
        .iter()
        .map(|column| Extent::symmetric(column.header.width()))
        .collect();

    for (extent, &right) in extents.iter_mut().zip(&reach) {
        if right > 0.0 {
            extent.cover(Extent::new(config.activation_width() / 2.0, right));
        }
    }

    let mut distances = Vec::new();
    for slot in &timeline.slots {
        match &slot.kind {
            SlotKind::Message(message) => {
                let label_width = message.label.as_ref().map_or(0.0, |l| l.size.width());
                match (message.kind, message.from, message.to) {
                    (MessageKind::SelfMessage, Some(column), _) => {
                        let loop_width = config
                            .self_message_width()
                            .max(padding + label_width);
                        extents[column].cover(Extent::new(0.0, reach[column] + loop_width));
                    }
                    (MessageKind::Normal, Some(from), Some(to)) if label_width > 0.0 => {
                        distances.push(MinDistance {
                            left: from.min(to),
                            right: from.max(to),
                            distance: label_width + 2.0 * padding,
                        });
                    }
                    (_, Some(from), None) => {
                        let stub = config.stub_length().max(label_width + 2.0 * padding);
                        extents[from].cover(Extent::new(0.0, reach[from] + stub));
                    }
                    (_, None, Some(to)) => {
                        let stub = config.stub_length().max(label_width + 2.0 * padding);
                        extents[to].cover(Extent::new(stub, 0.0));
                    }
                    _ => {}
                }
            }
            SlotKind::Note(note) => {
                let width = note.size.width();
                match note.anchor {
                    NoteAnchor::LeftOf(column) => {
                        extents[column].cover(Extent::new(config.note_gap() + width, 0.0));
                    }
                    NoteAnchor::RightOf(column) => {
                        extents[column]
                            .cover(Extent::new(0.0, reach[column] + config.note_gap() + width));
                    }
                    NoteAnchor::Over(first, last) if first == last => {
                        extents[first].cover(Extent::symmetric(width));
                    }
                    NoteAnchor::Over(..) | NoteAnchor::Across => {}
                }
            }
            _ => {}
        }
    }

    let centers = distribute_horizontally(&extents, config.participant_spacing(), &distances);
    debug!(columns = count, constraints = distances.len(); "Columns distributed");
    Columns { centers, extents }
}

#[cfg(test)]
mod tests {
    use astrolabe_core::{
        identifier::Id,
        semantic::{Event, Message, Note, NotePlacement, Participant, SequenceModel},
        text::{FixedWidthMeasurer, TextMeasurer},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        layout::sequence::{resolve, timeline},
    };

    fn run(model: &SequenceModel) -> (Columns, AppConfig) {
        let config = AppConfig::default();
        let measurer = FixedWidthMeasurer::default();
        let mut ctx = LayoutContext::new(&config, &measurer);
        let resolved = resolve::resolve(&mut ctx, model);
        let timeline = timeline::build(&mut ctx, model, &resolved).expect("timeline builds");
        let columns = distribute(&ctx, &resolved, &timeline);
        (columns, config.clone())
    }

    fn pair() -> SequenceModel {
        SequenceModel::new()
            .with_participant(Participant::new("A"))
            .with_participant(Participant::new("B"))
    }

    #[test]
    fn test_ranges_do_not_overlap() {
        let model = pair()
            .with_participant(Participant::new("Some long participant name"))
            .with_event(Event::Message(Message::new("A", "A")))
            .with_event(Event::ActivationStart(Id::new("B")));

        let (columns, _) = run(&model);
        for i in 1..columns.centers.len() {
            assert!(!columns.range(i - 1).overlaps(&columns.range(i)));
            assert!(columns.centers[i - 1] < columns.centers[i]);
        }
    }

    #[test]
    fn test_label_widens_gap() {
        let short = pair().with_event(Event::Message(Message::new("A", "B")));
        let long = pair().with_event(Event::Message(
            Message::new("A", "B").with_label("a considerably longer message label"),
        ));

        let (short_cols, _) = run(&short);
        let (long_cols, config) = run(&long);
        let short_gap = short_cols.centers[1] - short_cols.centers[0];
        let long_gap = long_cols.centers[1] - long_cols.centers[0];
        assert!(long_gap > short_gap);

        let label_width = FixedWidthMeasurer::default()
            .measure(
                "a considerably longer message label",
                config.style().message_text(),
            )
            .width();
        assert!(long_gap >= label_width);
    }

    #[test]
    fn test_self_message_reserves_loop() {
        let model = pair().with_event(Event::Message(Message::new("A", "A")));
        let (columns, config) = run(&model);
        assert!(columns.extents[0].after >= config.layout().sequence().self_message_width());
    }

    #[test]
    fn test_side_notes_reserve_space() {
        let model = pair()
            .with_event(Event::Note(Note::new(NotePlacement::LeftOf(Id::new("A")), "left")))
            .with_event(Event::Note(Note::new(NotePlacement::RightOf(Id::new("B")), "right")));
        let (columns, config) = run(&model);
        let gap = config.layout().sequence().note_gap();
        assert!(columns.extents[0].before > gap);
        assert!(columns.extents[1].after > gap);
    }
}
