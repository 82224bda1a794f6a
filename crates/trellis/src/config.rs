//! Configuration types for Trellis layout runs.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the command-line front end.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`EngineConfig`] - Which layout engine answers the request.
//! - [`LayoutConfig`] - The opaque option bag passed to the engine.
//! - [`PipelineConfig`] - Deadline, verification and output formatting.
//!
//! # Example
//!
//! ```
//! # use trellis::config::{AppConfig, EngineConfig};
//! let config = AppConfig::default();
//! assert!(matches!(config.engine(), EngineConfig::Sugiyama(_)));
//! assert!(config.pipeline().timeout().is_none());
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{
    engines::{LayoutEngine, ProcessEngine, SugiyamaEngine},
    options::LayoutOptions,
};

/// Top-level configuration for a layout run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine selection section.
    #[serde(default)]
    engine: EngineConfig,

    /// Pass-through options section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Pipeline behavior section.
    #[serde(default)]
    pipeline: PipelineConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(engine: EngineConfig, layout: LayoutConfig, pipeline: PipelineConfig) -> Self {
        Self {
            engine,
            layout,
            pipeline,
        }
    }

    /// Returns the engine configuration.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the layout option configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the pipeline configuration.
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Returns the pipeline configuration for in-place overrides.
    pub fn pipeline_mut(&mut self) -> &mut PipelineConfig {
        &mut self.pipeline
    }
}

/// Layout engine selection, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineConfig {
    /// In-process layered engine.
    Sugiyama(SugiyamaConfig),
    /// External layout program.
    Process(ProcessConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::Sugiyama(SugiyamaConfig::default())
    }
}

impl EngineConfig {
    /// Builds the configured engine.
    pub fn build(&self) -> Arc<dyn LayoutEngine> {
        match self {
            Self::Sugiyama(config) => Arc::new(SugiyamaEngine::from_config(config)),
            Self::Process(config) => Arc::new(ProcessEngine::from_config(config)),
        }
    }
}

/// Settings for the in-process layered engine.
#[derive(Debug, Clone, Deserialize)]
pub struct SugiyamaConfig {
    /// Width given to nodes without a width hint.
    #[serde(default = "default_node_width")]
    node_width: f64,

    /// Height given to nodes without a height hint.
    #[serde(default = "default_node_height")]
    node_height: f64,
}

impl Default for SugiyamaConfig {
    fn default() -> Self {
        Self {
            node_width: default_node_width(),
            node_height: default_node_height(),
        }
    }
}

impl SugiyamaConfig {
    /// Creates a configuration with the given default node size.
    pub fn new(node_width: f64, node_height: f64) -> Self {
        Self {
            node_width,
            node_height,
        }
    }

    pub fn node_width(&self) -> f64 {
        self.node_width
    }

    pub fn node_height(&self) -> f64 {
        self.node_height
    }
}

fn default_node_width() -> f64 {
    100.0
}

fn default_node_height() -> f64 {
    48.0
}

/// JSON dialect spoken with an external layout program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// The document exactly as loaded, decorated in place.
    #[default]
    Trellis,
    /// ELK JSON: `children`, `sources`/`targets`, and edge `sections`.
    Elk,
}

/// Settings for an external layout program.
///
/// Arguments may contain the `{input}` and `{output}` placeholders; when
/// they do, the request and the result travel through temporary files
/// instead of stdin and stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    /// Program to execute, looked up on `PATH` when not absolute.
    program: String,

    /// Arguments passed to the program.
    #[serde(default)]
    args: Vec<String>,

    /// Working directory for the program.
    #[serde(default)]
    working_dir: Option<PathBuf>,

    /// Document dialect on the wire.
    #[serde(default)]
    wire: WireFormat,
}

impl ProcessConfig {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            wire: WireFormat::default(),
        }
    }

    pub fn with_wire(mut self, wire: WireFormat) -> Self {
        self.wire = wire;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    pub fn wire(&self) -> WireFormat {
        self.wire
    }
}

/// Pass-through options for the engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Options merged below the document's own `layoutOptions`.
    #[serde(default)]
    options: LayoutOptions,
}

impl LayoutConfig {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }
}

/// Pipeline behavior around the single engine request.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for the engine request in seconds; unset waits indefinitely.
    #[serde(default)]
    timeout_secs: Option<f64>,

    /// Check the result for identity and geometry completeness.
    #[serde(default)]
    verify: bool,

    /// Pretty-print the output document.
    #[serde(default = "default_pretty")]
    pretty: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            verify: false,
            pretty: default_pretty(),
        }
    }
}

fn default_pretty() -> bool {
    true
}

impl PipelineConfig {
    /// Returns the engine deadline, if one is configured.
    ///
    /// Non-positive or non-finite values are treated as unset.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
    }

    pub fn set_timeout_secs(&mut self, secs: f64) {
        self.timeout_secs = Some(secs);
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn set_verify(&mut self, verify: bool) {
        self.verify = verify;
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(json: &str) -> AppConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = from_json("{}");

        match config.engine() {
            EngineConfig::Sugiyama(sugiyama) => {
                assert_eq!(sugiyama.node_width(), 100.0);
                assert_eq!(sugiyama.node_height(), 48.0);
            }
            other => panic!("Expected Sugiyama, got {other:?}"),
        }
        assert!(config.layout().options().is_empty());
        assert!(config.pipeline().pretty());
        assert!(!config.pipeline().verify());
    }

    #[test]
    fn test_process_engine_section() {
        let config = from_json(
            r#"{"engine": {"kind": "process", "program": "java", "wire": "elk",
                "args": ["-jar", "elk.jar", "-i", "{input}", "-o", "{output}"]}}"#,
        );

        match config.engine() {
            EngineConfig::Process(process) => {
                assert_eq!(process.program(), "java");
                assert_eq!(process.args().len(), 6);
                assert!(process.working_dir().is_none());
                assert_eq!(process.wire(), WireFormat::Elk);
            }
            other => panic!("Expected Process, got {other:?}"),
        }
        assert_eq!(config.engine().build().name(), "process");
    }

    #[test]
    fn test_process_wire_defaults_to_trellis() {
        let config = from_json(r#"{"engine": {"kind": "process", "program": "layout"}}"#);

        match config.engine() {
            EngineConfig::Process(process) => assert_eq!(process.wire(), WireFormat::Trellis),
            other => panic!("Expected Process, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_filtering() {
        let mut pipeline = PipelineConfig::default();
        assert!(pipeline.timeout().is_none());

        pipeline.set_timeout_secs(0.0);
        assert!(pipeline.timeout().is_none());

        pipeline.set_timeout_secs(1.5);
        assert_eq!(pipeline.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_layout_options_section() {
        let config = from_json(r#"{"layout": {"options": {"elk.direction": "RIGHT"}}}"#);
        assert_eq!(config.layout().options().get_str("direction"), Some("RIGHT"));
    }
}
