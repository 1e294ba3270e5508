//! Participant resolution: column order, label measurement and lifetimes.

use indexmap::{IndexMap, IndexSet};
use log::trace;

use astrolabe_core::{
    geometry::{Insets, Size},
    identifier::Id,
    semantic::{Participant, ParticipantKind, SequenceModel},
};

use crate::{
    context::{LayoutContext, MeasuredText},
    diagnostic::DiagnosticKind,
};

/// A participant bound to its column.
#[derive(Debug, Clone)]
pub(super) struct Column {
    pub id: Id,
    pub kind: ParticipantKind,
    pub label: MeasuredText,
    pub header: Size,
    pub created_at: Option<usize>,
    pub destroyed_at: Option<usize>,
}

/// Participants in column order, with a lookup from identity to column.
#[derive(Debug, Clone, Default)]
pub(super) struct Resolved {
    pub columns: Vec<Column>,
    index: IndexMap<Id, usize>,
}

impl Resolved {
    pub fn column_of(&self, id: &Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Height of the header row shared by every participant present from the start.
    pub fn header_row_height(&self) -> f32 {
        self.columns
            .iter()
            .filter(|column| column.created_at.is_none())
            .map(|column| column.header.height())
            .fold(0.0, f32::max)
    }

    /// Columns whose participant is created by the event at `index`.
    pub fn created_by(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, column)| column.created_at == Some(index))
            .map(|(i, _)| i)
    }

    /// Columns whose participant is destroyed by the event at `index`.
    pub fn destroyed_by(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, column)| column.destroyed_at == Some(index))
            .map(|(i, _)| i)
    }
}

/// Orders participants and measures their headers.
///
/// Declaration order is kept unless at least one participant carries an
/// explicit order. In that case participants are sorted by their order, with
/// unordered participants after the ordered ones and ties broken by
/// declaration. A repeated identity keeps its first declaration.
pub(super) fn resolve(ctx: &mut LayoutContext<'_>, model: &SequenceModel) -> Resolved {
    let mut declared: Vec<(usize, &Participant)> = Vec::with_capacity(model.participants().len());
    let mut seen: IndexSet<&Id> = IndexSet::new();
    for (position, participant) in model.participants().iter().enumerate() {
        if !seen.insert(participant.id()) {
            ctx.report(
                DiagnosticKind::DuplicateId,
                format!("participant `{}` is declared more than once", participant.id()),
                Some(participant.id()),
            );
            continue;
        }
        declared.push((position, participant));
    }

    if declared.iter().any(|(_, p)| p.order().is_some()) {
        declared.sort_by_key(|(position, p)| (p.order().is_none(), p.order(), *position));
    }

    let config = ctx.config().layout().sequence();
    let padding = Insets::uniform(config.participant_padding());
    let style = ctx.config().style().participant_text().clone();
    let event_count = model.events().len();

    let mut resolved = Resolved::default();
    for (column, (_, participant)) in declared.into_iter().enumerate() {
        let label = ctx.measure_wrapped(participant.display_text(), &style, None);
        let header = label.size.add_padding(padding);
        let (created_at, destroyed_at) = validate_lifetime(ctx, participant, event_count);

        trace!(
            participant = participant.id().as_str(),
            column,
            width = header.width();
            "Resolved participant"
        );

        resolved.index.insert(participant.id().clone(), column);
        resolved.columns.push(Column {
            id: participant.id().clone(),
            kind: participant.kind(),
            label,
            header,
            created_at,
            destroyed_at,
        });
    }
    resolved
}

fn validate_lifetime(
    ctx: &mut LayoutContext<'_>,
    participant: &Participant,
    event_count: usize,
) -> (Option<usize>, Option<usize>) {
    let lifetime = participant.lifetime();
    let (created, destroyed) = (lifetime.created_at(), lifetime.destroyed_at());

    let out_of_range = created
        .into_iter()
        .chain(destroyed)
        .any(|index| index >= event_count);
    let inverted = matches!((created, destroyed), (Some(c), Some(d)) if c > d);

    if out_of_range || inverted {
        ctx.report(
            DiagnosticKind::InvalidLifetime,
            format!(
                "lifetime of `{}` ({created:?}..{destroyed:?}) does not fit {event_count} events",
                participant.id()
            ),
            Some(participant.id()),
        );
        return (None, None);
    }
    (created, destroyed)
}
