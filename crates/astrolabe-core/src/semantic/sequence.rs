//! Timeline (sequence diagram) model.
//!
//! A [`SequenceModel`] holds the declared participants and a strictly ordered
//! list of [`Event`]s. Events refer to participants by [`Id`]; resolving those
//! references is the job of the layout engine, which reports dangling ones as
//! diagnostics instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// Visual kind of a participant.
///
/// Layout treats every kind the same way; renderers use the kind to pick the
/// header symbol.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    #[default]
    Participant,
    Actor,
    Boundary,
    Control,
    Entity,
    Database,
    Collections,
    Queue,
}

/// Event indices bounding the existence of a participant.
///
/// `created_at` makes the participant appear at the row of that event instead
/// of at the top of the diagram; `destroyed_at` ends its lifeline at that row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LifetimeSpan {
    created_at: Option<usize>,
    destroyed_at: Option<usize>,
}

impl LifetimeSpan {
    pub fn new(created_at: Option<usize>, destroyed_at: Option<usize>) -> Self {
        Self {
            created_at,
            destroyed_at,
        }
    }

    /// Index of the event that creates the participant.
    pub fn created_at(&self) -> Option<usize> {
        self.created_at
    }

    /// Index of the event that destroys the participant.
    pub fn destroyed_at(&self) -> Option<usize> {
        self.destroyed_at
    }
}

/// A participant owning one lifeline column.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    id: Id,
    label: Option<String>,
    kind: ParticipantKind,
    order: Option<i32>,
    lifetime: LifetimeSpan,
}

impl Participant {
    /// Create a participant whose label is its identifier.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind: ParticipantKind::default(),
            order: None,
            lifetime: LifetimeSpan::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: ParticipantKind) -> Self {
        self.kind = kind;
        self
    }

    /// Explicit column order; lower values are placed further left.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_lifetime(mut self, lifetime: LifetimeSpan) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the display text for this participant.
    /// Uses the label if present, otherwise falls back to the identifier.
    pub fn display_text(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn kind(&self) -> ParticipantKind {
        self.kind
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn lifetime(&self) -> LifetimeSpan {
        self.lifetime
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Line and head style of a message arrow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowStyle {
    /// Solid line with a filled head.
    #[default]
    Synchronous,
    /// Solid line with an open head.
    Asynchronous,
    /// Dashed line with an open head.
    Reply,
}

/// A message between two participants.
///
/// A message without a target is a lost message and is drawn as a short stub
/// leaving the source lifeline. Source and target may be the same participant,
/// which makes it a self-message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    from: Id,
    to: Option<Id>,
    label: Option<String>,
    style: ArrowStyle,
}

impl Message {
    pub fn new(from: impl Into<Id>, to: impl Into<Id>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
            label: None,
            style: ArrowStyle::default(),
        }
    }

    /// Create a message that leaves `from` without reaching any participant.
    pub fn lost(from: impl Into<Id>) -> Self {
        Self {
            from: from.into(),
            to: None,
            label: None,
            style: ArrowStyle::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: ArrowStyle) -> Self {
        self.style = style;
        self
    }

    pub fn from(&self) -> &Id {
        &self.from
    }

    pub fn to(&self) -> Option<&Id> {
        self.to.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn style(&self) -> ArrowStyle {
        self.style
    }

    /// Returns true if the message starts and ends on the same participant.
    pub fn is_self_message(&self) -> bool {
        self.to.as_ref() == Some(&self.from)
    }
}

/// Where a note is attached on the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotePlacement {
    /// Left of a participant's lifeline.
    LeftOf(Id),
    /// Right of a participant's lifeline.
    RightOf(Id),
    /// Centered over one participant, or spanning from the first to the second.
    Over(Id, Option<Id>),
    /// Spanning every participant.
    Across,
}

impl NotePlacement {
    /// Participants the placement refers to.
    pub fn participants(&self) -> impl Iterator<Item = &Id> {
        let (first, second) = match self {
            Self::LeftOf(id) | Self::RightOf(id) => (Some(id), None),
            Self::Over(first, second) => (Some(first), second.as_ref()),
            Self::Across => (None, None),
        };
        first.into_iter().chain(second)
    }
}

/// A text annotation occupying its own row.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    placement: NotePlacement,
    text: String,
}

impl Note {
    pub fn new(placement: NotePlacement, text: impl Into<String>) -> Self {
        Self {
            placement,
            text: text.into(),
        }
    }

    pub fn placement(&self) -> &NotePlacement {
        &self.placement
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Header of a grouping block such as `alt`, `loop`, `opt` or `par`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: String,
    label: Option<String>,
}

impl Block {
    pub fn new(kind: impl Into<String>, label: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            label,
        }
    }

    /// The operator shown in the block's corner tab.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The guard or description shown next to the tab.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// One entry of the timeline.
///
/// Events are strictly ordered; their index in [`SequenceModel::events`] is
/// the identity used by the layout result.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A message between participants.
    Message(Message),
    /// Pushes an activation on the participant's stack.
    ActivationStart(Id),
    /// Pops the participant's innermost activation.
    ActivationEnd(Id),
    /// A note annotation.
    Note(Note),
    /// A horizontal separator across the whole diagram with an optional label.
    Divider(Option<String>),
    /// A gap in time; lifelines are drawn dotted across it.
    Delay(Option<String>),
    /// Opens a grouping block.
    BlockStart(Block),
    /// Starts another section (an `else` branch) of the innermost block.
    BlockSection(Option<String>),
    /// Closes the innermost block.
    BlockEnd,
}

impl Event {
    /// Participants this event refers to.
    pub fn participants(&self) -> Vec<&Id> {
        match self {
            Self::Message(message) => std::iter::once(message.from())
                .chain(message.to())
                .collect(),
            Self::ActivationStart(id) | Self::ActivationEnd(id) => vec![id],
            Self::Note(note) => note.placement().participants().collect(),
            Self::Divider(_)
            | Self::Delay(_)
            | Self::BlockStart(_)
            | Self::BlockSection(_)
            | Self::BlockEnd => Vec::new(),
        }
    }
}

/// Participants and events of a timeline diagram.
///
/// # Examples
///
/// ```
/// # use astrolabe_core::semantic::{Event, Message, Participant, SequenceModel};
/// let mut model = SequenceModel::new();
/// model.add_participant(Participant::new("client"));
/// model.add_participant(Participant::new("server").with_label("API Server"));
/// model.push_event(Event::Message(Message::new("client", "server").with_label("GET /")));
///
/// assert_eq!(model.participants().len(), 2);
/// assert_eq!(model.events().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceModel {
    participants: Vec<Participant>,
    events: Vec<Event>,
}

impl SequenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Participants in declaration order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Events in timeline order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Returns the model with an additional participant.
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.add_participant(participant);
        self
    }

    /// Returns the model with an additional event.
    pub fn with_event(mut self, event: Event) -> Self {
        self.push_event(event);
        self
    }

    /// Participants plus events.
    pub fn element_count(&self) -> usize {
        self.participants.len() + self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_display_text_falls_back_to_id() {
        let plain = Participant::new("db");
        assert_eq!(plain.display_text(), "db");

        let labeled = Participant::new("db").with_label("Database");
        assert_eq!(labeled.display_text(), "Database");
    }

    #[test]
    fn test_participant_builders() {
        let participant = Participant::new("a")
            .with_kind(ParticipantKind::Actor)
            .with_order(3)
            .with_lifetime(LifetimeSpan::new(Some(1), None));
        assert_eq!(participant.kind(), ParticipantKind::Actor);
        assert_eq!(participant.order(), Some(3));
        assert_eq!(participant.lifetime().created_at(), Some(1));
        assert_eq!(participant.lifetime().destroyed_at(), None);
    }

    #[test]
    fn test_message_kinds() {
        assert!(Message::new("a", "a").is_self_message());
        assert!(!Message::new("a", "b").is_self_message());

        let lost = Message::lost("a");
        assert!(lost.to().is_none());
        assert!(!lost.is_self_message());
    }

    #[test]
    fn test_event_participants() {
        let message = Event::Message(Message::new("a", "b"));
        assert_eq!(message.participants(), vec!["a", "b"]);

        let lost = Event::Message(Message::lost("a"));
        assert_eq!(lost.participants(), vec!["a"]);

        let note = Event::Note(Note::new(
            NotePlacement::Over(Id::new("a"), Some(Id::new("c"))),
            "spanning",
        ));
        assert_eq!(note.participants(), vec!["a", "c"]);

        assert!(Event::Note(Note::new(NotePlacement::Across, "x"))
            .participants()
            .is_empty());
        assert!(Event::BlockEnd.participants().is_empty());
    }

    #[test]
    fn test_model_builders() {
        let model = SequenceModel::new()
            .with_participant(Participant::new("a"))
            .with_event(Event::ActivationStart(Id::new("a")))
            .with_event(Event::ActivationEnd(Id::new("a")));
        assert_eq!(model.element_count(), 3);
    }
}
