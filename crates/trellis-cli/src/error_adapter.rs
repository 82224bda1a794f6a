//! Error adapter for converting TrellisError to miette diagnostics.
//!
//! This module provides the bridge between the library's error type and
//! miette's rich diagnostic formatting used in the CLI. Parse errors that
//! still carry their input text are rendered with a label pointing at the
//! offending line and column.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use trellis::{LayoutError, TrellisError};

/// Adapter for [`TrellisError`].
///
/// Implements [`MietteDiagnostic`] with a stable code and help text per
/// failure kind.
pub struct ErrorAdapter<'a> {
    /// The wrapped error
    err: &'a TrellisError,
    /// Input text and label position, for parse errors only
    snippet: Option<Snippet>,
}

/// Input text with the position a parse error points at.
struct Snippet {
    source: NamedSource<String>,
    span: SourceSpan,
}

impl<'a> ErrorAdapter<'a> {
    /// Create a new adapter for `err`.
    pub fn new(err: &'a TrellisError) -> Self {
        let snippet = match err {
            TrellisError::Parse {
                path,
                err: json_err,
                src: Some(src),
            } => Some(Snippet {
                source: NamedSource::new(path.display().to_string(), src.clone()),
                span: span_at(src, json_err.line(), json_err.column()),
            }),
            _ => None,
        };
        Self { err, snippet }
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.err, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.err, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.err)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.err {
            TrellisError::Io { .. } => "trellis::io",
            TrellisError::Parse { .. } | TrellisError::FlatFile { .. } => "trellis::parse",
            TrellisError::Layout(_) => "trellis::layout",
            TrellisError::Config(_) => "trellis::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help: Box<dyn fmt::Display + 'a> = match self.err {
            TrellisError::Io { .. } => Box::new("check that the path exists and is accessible"),
            TrellisError::Parse { .. } => {
                Box::new("the input must be a JSON object with `nodes` and `edges` arrays")
            }
            TrellisError::FlatFile { .. } => Box::new(
                "the node table needs an `id` column and the edge table `source_id` and `target_id` columns",
            ),
            TrellisError::Layout(LayoutError::Timeout { .. }) => Box::new(
                "raise `--timeout` or `pipeline.timeout_secs`; the output file was not written",
            ),
            TrellisError::Layout(err) => Box::new(format!(
                "check the `{}` engine; the output file was not written",
                err.engine_name()
            )),
            TrellisError::Config(_) => Box::new(
                "see the [engine], [layout] and [pipeline] sections of the configuration file",
            ),
        };
        Some(help)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.snippet
            .as_ref()
            .map(|snippet| &snippet.source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let snippet = self.snippet.as_ref()?;
        Some(Box::new(std::iter::once(
            LabeledSpan::new_primary_with_span(Some("here".to_string()), snippet.span),
        )))
    }
}

/// Convert a 1-based line and column into a byte span of at most one
/// character, clamped to `src`.
fn span_at(src: &str, line: usize, column: usize) -> SourceSpan {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();

    let mut offset = (line_start + column.saturating_sub(1)).min(src.len());
    while !src.is_char_boundary(offset) {
        offset -= 1;
    }
    let len = src[offset..].chars().next().map_or(0, char::len_utf8);

    SourceSpan::new(offset.into(), len)
}
