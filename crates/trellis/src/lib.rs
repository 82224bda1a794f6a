//! Trellis - a single-shot graph layout pipeline.
//!
//! A run loads a graph description, hands it to one layout engine, and writes
//! the decorated document back to disk. The layout algorithm itself sits
//! behind the [`engines::LayoutEngine`] seam: an external program, or the
//! bundled adapter over the `rust-sugiyama` crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! use trellis::{LayoutPipeline, config::AppConfig};
//!
//! # async fn example() -> Result<(), trellis::TrellisError> {
//! let pipeline = LayoutPipeline::from_config(&AppConfig::default());
//! let summary = pipeline.run("graph.json", "graph.layout.json").await?;
//! assert_eq!(summary.output().to_str(), Some("graph.layout.json"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engines;
pub mod loader;
pub mod writer;

mod error;
mod invoker;
mod options;
mod pipeline;

pub use trellis_core::{Edge, GraphDocument, JsonObject, Node, geometry, inspect};

pub use error::{ErrorKind, LayoutError, TrellisError};
pub use invoker::LayoutInvoker;
pub use options::LayoutOptions;
pub use pipeline::{LayoutPipeline, LayoutSummary};
pub use writer::FailureReport;
