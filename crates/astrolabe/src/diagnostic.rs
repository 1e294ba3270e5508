//! Non-fatal structural diagnostics.
//!
//! Layout recovers locally from malformed input (dangling references,
//! unbalanced activations or blocks, unusable sizes) with best-effort geometry and records a
//! [`Diagnostic`] for each problem. Diagnostics travel on the
//! [`LayoutResult`](crate::layout::LayoutResult) so the caller still gets a
//! rendered diagram.

use std::fmt;

use serde::Serialize;

use astrolabe_core::identifier::Id;

/// Category of a structural problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// An event refers to a participant that is not declared.
    ParticipantNotFound,
    /// An activation was closed on a participant with no open activation.
    ActivationUnderflow,
    /// An activation was still open at the end of the timeline.
    UnclosedActivation,
    /// A block end or section without an open block, or a block left open.
    UnbalancedBlock,
    /// A participant lifetime outside the event range or inverted.
    InvalidLifetime,
    /// An edge refers to a node that does not exist.
    NodeNotFound,
    /// A node or cluster refers to a parent cluster that does not exist.
    ClusterNotFound,
    /// Cluster parent links form a cycle.
    ClusterCycle,
    /// Two participants, nodes, or clusters share an identifier.
    DuplicateId,
    /// A node carries a negative or non-finite explicit size.
    InvalidSize,
}

impl DiagnosticKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParticipantNotFound => "participant_not_found",
            Self::ActivationUnderflow => "activation_underflow",
            Self::UnclosedActivation => "unclosed_activation",
            Self::UnbalancedBlock => "unbalanced_block",
            Self::InvalidLifetime => "invalid_lifetime",
            Self::NodeNotFound => "node_not_found",
            Self::ClusterNotFound => "cluster_not_found",
            Self::ClusterCycle => "cluster_cycle",
            Self::DuplicateId => "duplicate_id",
            Self::InvalidSize => "invalid_size",
        }
    }
}

/// A recovered structural problem in the diagram model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
    subject: Option<Id>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, subject: Option<Id>) -> Self {
        Self {
            kind,
            message: message.into(),
            subject,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The participant, node, or cluster the problem is about, if any.
    pub fn subject(&self) -> Option<&Id> {
        self.subject.as_ref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.name(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::ParticipantNotFound,
            "participant `ghost` is not declared",
            Some(Id::new("ghost")),
        );
        assert_eq!(
            diagnostic.to_string(),
            "[participant_not_found] participant `ghost` is not declared"
        );
        assert_eq!(diagnostic.subject().map(Id::as_str), Some("ghost"));
    }
}
