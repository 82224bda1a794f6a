//! Durable write-back of layout results and failure reporting.
//!
//! [`write`] serializes the whole document before touching the filesystem,
//! then replaces the destination through a temporary file in the same
//! directory. A failure at any step leaves the destination as it was.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info};
use tempfile::NamedTempFile;

use trellis_core::GraphDocument;

use crate::error::{ErrorKind, TrellisError};

/// Writes `doc` to `path` as JSON, replacing any existing file atomically.
///
/// The output is pretty-printed when `pretty` is set and always ends with a
/// newline.
pub fn write(path: impl AsRef<Path>, doc: &GraphDocument, pretty: bool) -> Result<(), TrellisError> {
    let path = path.as_ref();
    let bytes = serialize(doc, pretty).map_err(|err| TrellisError::io(path, err.into()))?;

    let dir = parent_dir(path);
    let mut file = NamedTempFile::new_in(&dir).map_err(|err| TrellisError::io(&dir, err))?;
    debug!(temp = file.path().display().to_string(); "Staging layout result");

    file.write_all(&bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| TrellisError::io(file.path(), err))?;

    file.persist(path)
        .map_err(|err| TrellisError::io(path, err.error))?;

    info!(path = path.display().to_string(), bytes = bytes.len(); "Layout result written");
    Ok(())
}

/// Serializes `doc` in memory.
pub fn serialize(doc: &GraphDocument, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(doc)?
    } else {
        serde_json::to_vec(doc)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// What the caller is told about a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    kind: ErrorKind,
    message: String,
    diagnostic: String,
}

impl FailureReport {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable summary of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Detail from the failing component, e.g. the engine's own message.
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }
}

/// Describes a failed run for the caller's error channel.
///
/// Nothing is logged or written here; the caller surfaces the report once.
pub fn report_failure(err: &TrellisError) -> FailureReport {
    FailureReport {
        kind: err.kind(),
        message: err.to_string(),
        diagnostic: err.diagnostic(),
    }
}
