//! Layout engine seam.
//!
//! The layout algorithm itself lives outside Trellis. A [`LayoutEngine`]
//! accepts one [`LayoutRequest`] and settles exactly once, with either a
//! decorated document or a [`LayoutError`]. Two adapters are provided:
//!
//! - [`ProcessEngine`] runs an external layout program per request, speaking
//!   either the document's own JSON or the ELK JSON dialect.
//! - [`SugiyamaEngine`] hands the graph to the `rust-sugiyama` crate on the
//!   blocking thread pool.

mod elk;
mod process;
mod sugiyama;

pub use process::ProcessEngine;
pub use sugiyama::SugiyamaEngine;

use std::{future::Future, pin::Pin};

use trellis_core::GraphDocument;

use crate::{error::LayoutError, options::LayoutOptions};

/// The future returned by [`LayoutEngine::layout`].
pub type EngineFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GraphDocument, LayoutError>> + Send + 'a>>;

/// One request to a layout engine.
///
/// The request owns a copy of the document, so an engine is free to decorate
/// it in place or to build a new document from scratch.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    document: GraphDocument,
    options: LayoutOptions,
}

impl LayoutRequest {
    /// Creates a request from a document and the resolved option bag.
    pub fn new(document: GraphDocument, options: LayoutOptions) -> Self {
        Self { document, options }
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Splits the request into its document and options.
    pub fn into_parts(self) -> (GraphDocument, LayoutOptions) {
        (self.document, self.options)
    }
}

/// A component that computes geometry for a graph document.
pub trait LayoutEngine: Send + Sync {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Compute the layout for `request`.
    ///
    /// The returned future must settle exactly once. Dropping it abandons the
    /// request; engines release whatever they hold for it when that happens.
    fn layout(&self, request: LayoutRequest) -> EngineFuture<'_>;
}
