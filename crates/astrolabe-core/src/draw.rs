//! Drawing command vocabulary produced by layout.
//!
//! Both layout engines describe their result as a flat list of
//! device-independent primitives. Renderer backends (SVG, raster, ASCII art)
//! turn these into their own output format without knowing anything about
//! participants, ranks, or clusters.
//!
//! # Overview
//!
//! - [`DrawCommand`] - A single primitive: rectangle, polyline, path, or text
//! - [`ElementRole`] - What a primitive depicts, so backends can style it
//! - [`RenderLayer`] / [`LayeredOutput`] - Z-ordering of the emitted primitives

mod command;
mod layer;

pub use command::{ArrowHead, DrawCommand, ElementRole, PathSegment, TextAnchor};
pub use layer::{LayeredOutput, RenderLayer};
