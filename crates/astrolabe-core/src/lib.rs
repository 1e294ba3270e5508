//! Astrolabe Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Astrolabe layout
//! engines and the renderers that consume their output. It includes:
//!
//! - **Identifiers**: Cheap-to-clone element identities ([`identifier::Id`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Text**: The text measurement interface and implementations ([`text`] module)
//! - **Semantic**: The immutable diagram model handed to layout ([`semantic`] module)
//! - **Draw**: The drawing command vocabulary produced by layout ([`draw`] module)

pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod semantic;
pub mod text;
