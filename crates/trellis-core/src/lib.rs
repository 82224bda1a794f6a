//! Trellis Core Types
//!
//! This crate provides the data model shared by the Trellis layout pipeline:
//!
//! - **Document**: the graph description and its decorated form ([`document`] module)
//! - **Geometry**: points, sizes and bounds ([`geometry`] module)
//! - **Inspection**: identity and geometry checks on layout results ([`inspect`] module)

pub mod document;
pub mod geometry;
pub mod inspect;

mod number;

pub use document::{Edge, GraphDocument, JsonObject, Node};
