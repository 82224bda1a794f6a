//! Error types for Trellis operations.
//!
//! [`TrellisError`] covers the three failure kinds of a layout run (I/O,
//! parse and layout) plus configuration problems raised before a run starts.
//! [`LayoutError`] carries the diagnostic an engine reported.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

/// The main error type for Trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not a well-formed graph description.
    ///
    /// `src` holds the input text when it was valid UTF-8, so reporters can
    /// point at the offending line.
    #[error("Parse error in `{}`: {err}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_json::Error,
        src: Option<String>,
    },

    /// A flat node or edge table could not be turned into a graph.
    #[error("Invalid flat file `{}`: {message}", path.display())]
    FlatFile { path: PathBuf, message: String },

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrellisError {
    /// Create a new `Io` error for the given path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a new `FlatFile` error for the given table.
    pub fn flat_file(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::FlatFile {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(
        path: impl AsRef<Path>,
        err: serde_json::Error,
        src: Option<String>,
    ) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            err,
            src,
        }
    }

    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse { .. } | Self::FlatFile { .. } => ErrorKind::Parse,
            Self::Layout(_) => ErrorKind::Layout,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns the underlying diagnostic without the category prefix.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Io { source, .. } => source.to_string(),
            Self::Parse { err, .. } => err.to_string(),
            Self::FlatFile { message, .. } => message.clone(),
            Self::Layout(err) => err.diagnostic().to_string(),
            Self::Config(message) => message.clone(),
        }
    }
}

/// Failure category reported to the caller of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Parse,
    Layout,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Io => "IOError",
            Self::Parse => "ParseError",
            Self::Layout => "LayoutError",
            Self::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

/// A layout engine could not produce a layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// The engine rejected the graph or faulted internally.
    #[error("engine `{engine}` failed: {diagnostic}")]
    Engine { engine: String, diagnostic: String },

    /// The engine did not settle before the configured deadline.
    #[error("engine `{engine}` did not settle within {after:?}")]
    Timeout { engine: String, after: Duration },

    /// The engine answered with something that is not a graph document.
    #[error("engine `{engine}` returned malformed output: {diagnostic}")]
    Malformed { engine: String, diagnostic: String },

    /// The engine answered, but the result fails verification.
    #[error("engine `{engine}` returned an incomplete layout: {}", issues.join("; "))]
    Incomplete { engine: String, issues: Vec<String> },

    /// The engine task panicked or was torn down before settling.
    #[error("engine `{engine}` aborted: {diagnostic}")]
    Aborted { engine: String, diagnostic: String },
}

impl LayoutError {
    /// Shorthand for [`LayoutError::Engine`].
    pub fn engine(engine: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::Engine {
            engine: engine.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Shorthand for [`LayoutError::Malformed`].
    pub fn malformed(engine: impl Into<String>, diagnostic: impl fmt::Display) -> Self {
        Self::Malformed {
            engine: engine.into(),
            diagnostic: diagnostic.to_string(),
        }
    }

    /// Name of the engine that produced the failure.
    pub fn engine_name(&self) -> &str {
        match self {
            Self::Engine { engine, .. }
            | Self::Timeout { engine, .. }
            | Self::Malformed { engine, .. }
            | Self::Incomplete { engine, .. }
            | Self::Aborted { engine, .. } => engine,
        }
    }

    /// The engine's diagnostic payload.
    pub fn diagnostic(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Engine { diagnostic, .. }
            | Self::Malformed { diagnostic, .. }
            | Self::Aborted { diagnostic, .. } => diagnostic.as_str().into(),
            Self::Timeout { .. } => "timeout".into(),
            Self::Incomplete { issues, .. } => issues.join("; ").into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Io.to_string(), "IOError");
        assert_eq!(ErrorKind::Parse.to_string(), "ParseError");
        assert_eq!(ErrorKind::Layout.to_string(), "LayoutError");
    }

    #[test]
    fn test_layout_error_converts() {
        let err: TrellisError = LayoutError::engine("fake", "bad graph").into();

        assert_eq!(err.kind(), ErrorKind::Layout);
        assert_eq!(err.diagnostic(), "bad graph");
        assert_eq!(
            err.to_string(),
            "Layout error: engine `fake` failed: bad graph"
        );
    }

    #[test]
    fn test_timeout_diagnostic() {
        let err = LayoutError::Timeout {
            engine: "slow".to_string(),
            after: Duration::from_millis(50),
        };

        assert_eq!(err.diagnostic(), "timeout");
        assert_eq!(err.engine_name(), "slow");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = TrellisError::io(
            "missing.json",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );

        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_flat_file_error_is_parse_kind() {
        let err = TrellisError::flat_file("edges.csv", "unknown node `x`");

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.diagnostic(), "unknown node `x`");
        assert!(err.to_string().contains("edges.csv"));
    }
}
