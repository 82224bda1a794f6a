//! CLI logic for the Trellis layout tool.
//!
//! This module wires command-line arguments and configuration into a single
//! [`LayoutPipeline`] run on a current-thread tokio runtime.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::path::PathBuf;

use log::info;

use trellis::{LayoutPipeline, LayoutSummary, TrellisError};

/// Run the Trellis CLI application
///
/// Loads the configuration, applies the command-line overrides, then lays
/// out the input file (or the node and edge tables when `--edges` is given)
/// and writes the result to the output path.
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - Configuration loading errors
/// - Input read errors and malformed input
/// - Layout engine failures and timeouts
/// - Output write errors
pub fn run(args: &Args) -> Result<LayoutSummary, TrellisError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(secs) = args.timeout {
        app_config.pipeline_mut().set_timeout_secs(secs);
    }
    if args.verify {
        app_config.pipeline_mut().set_verify(true);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| TrellisError::io(PathBuf::from(&args.input), err))?;

    let pipeline = LayoutPipeline::from_config(&app_config);
    let summary = runtime.block_on(async {
        match &args.edges {
            Some(edges) => {
                pipeline
                    .run_flat_files(&args.input, edges, &args.output)
                    .await
            }
            None => pipeline.run(&args.input, &args.output).await,
        }
    })?;

    info!(output_file = args.output; "Layout exported successfully");

    Ok(summary)
}
