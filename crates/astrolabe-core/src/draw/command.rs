//! Drawing primitives.

use serde::Serialize;

use crate::{
    geometry::{Bounds, Point},
    text::TextStyle,
};

/// Describes what a drawing primitive depicts.
///
/// Layout does not decide colors or strokes; renderers map roles to styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    ParticipantHeader,
    ParticipantFooter,
    Lifeline,
    Activation,
    Message,
    Note,
    BlockFrame,
    BlockSeparator,
    Divider,
    Delay,
    DestroyMark,
    Node,
    Cluster,
    Edge,
    Label,
    Title,
    Caption,
}

/// Decoration at the end of a polyline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowHead {
    #[default]
    None,
    Filled,
    Open,
}

/// Horizontal alignment of text relative to its position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

/// One step of a [`DrawCommand::Path`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    Close,
}

/// A device-independent drawing primitive.
///
/// # Examples
///
/// ```
/// # use astrolabe_core::draw::{ArrowHead, DrawCommand, ElementRole};
/// # use astrolabe_core::geometry::Point;
/// let command = DrawCommand::Polyline {
///     points: vec![Point::new(0.0, 10.0), Point::new(50.0, 10.0)],
///     role: ElementRole::Message,
///     arrow: ArrowHead::Filled,
///     dashed: false,
/// };
///
/// assert_eq!(command.role(), ElementRole::Message);
/// assert_eq!(command.bounds().map(|b| b.width()), Some(50.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawCommand {
    /// An axis-aligned rectangle.
    Rectangle { bounds: Bounds, role: ElementRole },
    /// Connected line segments, optionally ending in an arrow head.
    Polyline {
        points: Vec<Point>,
        role: ElementRole,
        arrow: ArrowHead,
        dashed: bool,
    },
    /// A closed or open outline made of straight segments.
    Path {
        segments: Vec<PathSegment>,
        role: ElementRole,
    },
    /// Text whose block is vertically centered on `position`; `\n` separates lines.
    Text {
        position: Point,
        anchor: TextAnchor,
        content: String,
        style: TextStyle,
        role: ElementRole,
    },
}

impl DrawCommand {
    /// Returns what this primitive depicts.
    pub fn role(&self) -> ElementRole {
        match self {
            Self::Rectangle { role, .. }
            | Self::Polyline { role, .. }
            | Self::Path { role, .. }
            | Self::Text { role, .. } => *role,
        }
    }

    /// Returns the bounding box of the primitive's geometry.
    ///
    /// Text has no extent without measurement and returns the point bounds of
    /// its position. Empty polylines and paths return `None`.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Rectangle { bounds, .. } => Some(*bounds),
            Self::Polyline { points, .. } => points_bounds(points.iter().copied()),
            Self::Path { segments, .. } => points_bounds(segments.iter().filter_map(|s| match s {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => Some(*p),
                PathSegment::Close => None,
            })),
            Self::Text { position, .. } => Some(Bounds::new_from_corners(*position, *position)),
        }
    }
}

fn points_bounds(mut points: impl Iterator<Item = Point>) -> Option<Bounds> {
    let first = points.next()?;
    Some(points.fold(Bounds::new_from_corners(first, first), |acc, p| {
        acc.merge(&Bounds::new_from_corners(p, p))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_bounds_ignores_close() {
        let path = DrawCommand::Path {
            segments: vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(10.0, 0.0)),
                PathSegment::LineTo(Point::new(10.0, 5.0)),
                PathSegment::Close,
            ],
            role: ElementRole::DestroyMark,
        };
        let bounds = path.bounds().expect("path has points");
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 5.0);
    }

    #[test]
    fn test_empty_polyline_has_no_bounds() {
        let polyline = DrawCommand::Polyline {
            points: Vec::new(),
            role: ElementRole::Edge,
            arrow: ArrowHead::None,
            dashed: false,
        };
        assert!(polyline.bounds().is_none());
    }

    #[test]
    fn test_text_role() {
        let text = DrawCommand::Text {
            position: Point::new(1.0, 2.0),
            anchor: TextAnchor::Middle,
            content: "hi".to_string(),
            style: TextStyle::default(),
            role: ElementRole::Title,
        };
        assert_eq!(text.role(), ElementRole::Title);
        assert_eq!(text.bounds().map(|b| b.min_point()), Some(Point::new(1.0, 2.0)));
    }
}
