//! External layout programs.
//!
//! The document travels to the program as JSON, either on stdin or through a
//! temporary file when the configured arguments mention `{input}`. The result
//! comes back on stdout, or through a temporary file for `{output}`. With
//! the ELK wire format both directions are translated by the `elk` module.

use std::{path::PathBuf, process::Stdio};

use log::{debug, info, trace};
use tempfile::TempDir;
use tokio::{io::AsyncWriteExt, process::Command};

use trellis_core::GraphDocument;

use crate::{
    config::{ProcessConfig, WireFormat},
    engines::{EngineFuture, LayoutEngine, LayoutRequest, elk},
    error::LayoutError,
};

const ENGINE_NAME: &str = "process";
const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs a layout program once per request.
///
/// The child is killed when the request future is dropped, so an expired
/// deadline does not leave the program running.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    wire: WireFormat,
}

impl ProcessEngine {
    pub fn from_config(config: &ProcessConfig) -> Self {
        Self {
            program: config.program().to_string(),
            args: config.args().to_vec(),
            working_dir: config.working_dir().cloned(),
            wire: config.wire(),
        }
    }

    fn encode(&self, document: &GraphDocument) -> Result<Vec<u8>, LayoutError> {
        let encoded = match self.wire {
            WireFormat::Trellis => serde_json::to_vec(document),
            WireFormat::Elk => elk::to_elk(document).and_then(|elk| serde_json::to_vec(&elk)),
        };
        encoded.map_err(|err| LayoutError::engine(ENGINE_NAME, format!("encoding request: {err}")))
    }

    fn decode(&self, body: &[u8], had_id: bool) -> Result<GraphDocument, LayoutError> {
        match self.wire {
            WireFormat::Trellis => {
                serde_json::from_slice(body).map_err(|err| LayoutError::malformed(ENGINE_NAME, err))
            }
            WireFormat::Elk => serde_json::from_slice::<serde_json::Value>(body)
                .map_err(|err| err.to_string())
                .and_then(|value| elk::from_elk(value, had_id))
                .map_err(|err| LayoutError::malformed(ENGINE_NAME, err)),
        }
    }

    fn uses_placeholder(&self, placeholder: &str) -> bool {
        self.args.iter().any(|arg| arg.contains(placeholder))
    }

    async fn run(&self, request: LayoutRequest) -> Result<GraphDocument, LayoutError> {
        let (mut document, options) = request.into_parts();
        // Keys already on the document take precedence.
        options.fill_missing(document.layout_options_mut());

        let payload = self.encode(&document)?;

        let use_input_file = self.uses_placeholder(INPUT_PLACEHOLDER);
        let use_output_file = self.uses_placeholder(OUTPUT_PLACEHOLDER);

        // Kept alive until the result has been read back.
        let scratch = if use_input_file || use_output_file {
            Some(TempDir::new().map_err(|err| {
                LayoutError::engine(ENGINE_NAME, format!("creating scratch directory: {err}"))
            })?)
        } else {
            None
        };
        let input_path = scratch.as_ref().map(|dir| dir.path().join("input.json"));
        let output_path = scratch.as_ref().map(|dir| dir.path().join("output.json"));

        if let Some(path) = input_path.as_ref().filter(|_| use_input_file) {
            tokio::fs::write(path, &payload).await.map_err(|err| {
                LayoutError::engine(ENGINE_NAME, format!("writing request file: {err}"))
            })?;
        }

        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                let mut arg = arg.clone();
                if let Some(path) = &input_path {
                    arg = arg.replace(INPUT_PLACEHOLDER, &path.to_string_lossy());
                }
                if let Some(path) = &output_path {
                    arg = arg.replace(OUTPUT_PLACEHOLDER, &path.to_string_lossy());
                }
                arg
            })
            .collect();

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(if use_input_file {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        info!(program = self.program.as_str(), wire:? = self.wire; "Starting layout program");
        debug!(args:?; "Layout program arguments");

        let mut child = command.spawn().map_err(|err| {
            LayoutError::engine(
                ENGINE_NAME,
                format!("failed to start `{}`: {err}", self.program),
            )
        })?;

        // Feed stdin while draining stdout so large documents cannot stall on
        // full pipes.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A program that exits without reading is judged by its exit status.
                if let Err(err) = stdin.write_all(&payload).await {
                    debug!(error = err.to_string(); "Layout program closed stdin early");
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|err| {
            LayoutError::engine(ENGINE_NAME, format!("waiting for `{}`: {err}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostic = if stderr.is_empty() {
                format!("`{}` exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(LayoutError::engine(ENGINE_NAME, diagnostic));
        }

        let body = match output_path.filter(|_| use_output_file) {
            Some(path) => tokio::fs::read(&path).await.map_err(|err| {
                LayoutError::malformed(ENGINE_NAME, format!("reading result file: {err}"))
            })?,
            None => output.stdout,
        };
        trace!(bytes = body.len(); "Layout program finished");

        self.decode(&body, document.id().is_some())
    }
}

impl LayoutEngine for ProcessEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn layout(&self, request: LayoutRequest) -> EngineFuture<'_> {
        Box::pin(self.run(request))
    }
}
