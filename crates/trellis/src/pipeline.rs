//! Load, lay out, write back.
//!
//! [`LayoutPipeline::run`] drives the three stages in order and hands any
//! failure back unchanged; callers turn it into a report with
//! [`writer::report_failure`]. Nothing is written to the destination unless
//! every stage before the write succeeded.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use log::info;

use trellis_core::GraphDocument;

use crate::{
    config::AppConfig,
    engines::LayoutEngine,
    error::TrellisError,
    invoker::LayoutInvoker,
    loader,
    options::LayoutOptions,
    writer,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSummary {
    output: PathBuf,
    nodes: usize,
    edges: usize,
    elapsed: Duration,
}

impl LayoutSummary {
    /// Path the decorated document was written to.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Number of nodes laid out, nested ones included.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn edges(&self) -> usize {
        self.edges
    }

    /// Wall time from load to write.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl fmt::Display for LayoutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout written to {} ({} nodes, {} edges)",
            self.output.display(),
            self.nodes,
            self.edges
        )
    }
}

/// A configured single-shot layout run.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), trellis::TrellisError> {
/// use trellis::{LayoutPipeline, config::AppConfig};
///
/// let summary = LayoutPipeline::from_config(&AppConfig::default())
///     .run("graph.json", "out.json")
///     .await?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
pub struct LayoutPipeline {
    engine: Arc<dyn LayoutEngine>,
    options: LayoutOptions,
    deadline: Option<Duration>,
    verify: bool,
    pretty: bool,
}

impl fmt::Debug for LayoutPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutPipeline")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .field("deadline", &self.deadline)
            .field("verify", &self.verify)
            .field("pretty", &self.pretty)
            .finish()
    }
}

impl LayoutPipeline {
    /// Creates a pipeline around `engine` with default settings: no
    /// deadline, no verification, pretty output.
    pub fn new(engine: Arc<dyn LayoutEngine>) -> Self {
        Self {
            engine,
            options: LayoutOptions::new(),
            deadline: None,
            verify: false,
            pretty: true,
        }
    }

    /// Builds the configured engine and applies every configuration section.
    pub fn from_config(config: &AppConfig) -> Self {
        let pipeline = config.pipeline();
        Self {
            engine: config.engine().build(),
            options: config.layout().options().clone(),
            deadline: pipeline.timeout(),
            verify: pipeline.verify(),
            pretty: pipeline.pretty(),
        }
    }

    /// Sets the option bag passed to the engine.
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Runs load, layout and write for one input file.
    ///
    /// On failure the destination is left untouched.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<LayoutSummary, TrellisError> {
        let started = Instant::now();
        let doc = loader::load(input)?;
        self.lay_out_and_write(doc, output.as_ref(), started).await
    }

    /// Like [`run`](Self::run), reading the graph from a node table and an
    /// edge table through [`loader::load_flat_files`].
    pub async fn run_flat_files(
        &self,
        nodes_csv: impl AsRef<Path>,
        edges_csv: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<LayoutSummary, TrellisError> {
        let started = Instant::now();
        let doc = loader::load_flat_files(nodes_csv, edges_csv)?;
        self.lay_out_and_write(doc, output.as_ref(), started).await
    }

    async fn lay_out_and_write(
        &self,
        doc: GraphDocument,
        output: &Path,
        started: Instant,
    ) -> Result<LayoutSummary, TrellisError> {
        let result = LayoutInvoker::new(Arc::clone(&self.engine))
            .with_optional_deadline(self.deadline)
            .with_verify(self.verify)
            .invoke(&doc, &self.options)
            .await?;

        writer::write(output, &result, self.pretty)?;

        let summary = LayoutSummary {
            output: output.to_path_buf(),
            nodes: result.node_count(),
            edges: result.edges().len(),
            elapsed: started.elapsed(),
        };
        info!(
            output = output.display().to_string(),
            elapsed_ms = summary.elapsed.as_millis() as u64;
            "Layout run complete"
        );
        Ok(summary)
    }
}
