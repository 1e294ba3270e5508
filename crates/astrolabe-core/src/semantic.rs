//! Semantic diagram model types.
//!
//! This module contains the immutable input handed to the layout engines.
//! A parser builds a [`Diagram`] once per render request; layout only reads
//! it and never keeps references to it after returning.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parser (external)
//! Semantic Model (these types)
//!     ↓ layout
//! Layout Result
//!     ↓ emit
//! Drawing Commands
//!     ↓ renderer (external)
//! SVG / PNG / ASCII art
//! ```
//!
//! # Organization
//!
//! - [`diagram`] - The root [`Diagram`] with its metadata and body
//! - [`sequence`] - Participants and time-ordered events of timeline diagrams
//! - [`graph`] - Nodes, edges and clusters of graph diagrams

pub mod diagram;
pub mod graph;
pub mod sequence;

pub use diagram::*;
pub use graph::*;
pub use sequence::*;
