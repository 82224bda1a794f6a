//! Graph loading.
//!
//! The loader is a transparent deserializer: it reads the file once and maps
//! the JSON onto [`GraphDocument`] without renaming fields or injecting
//! defaults.
//!
//! [`load_flat_files`] is the one exception. It builds a document from a node
//! table and an edge table in CSV form and derives each node's size hint from
//! its wrapped label.

use std::{
    collections::HashSet,
    fs::{self, File},
    path::Path,
};

use log::{debug, info, trace};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use unicode_width::UnicodeWidthStr;

use trellis_core::{Edge, GraphDocument, JsonObject, Node, geometry::Size};

use crate::error::TrellisError;

/// Labels are wrapped to this many columns.
const LABEL_COLUMNS: usize = 30;
/// Width of one label column, for a 20px font.
const CHAR_WIDTH: f64 = 12.0;
const LINE_HEIGHT: f64 = 28.0;
const LABEL_PADDING: f64 = 20.0;
const MIN_NODE_WIDTH: f64 = 100.0;

const DEFAULT_SHAPE: &str = "rectangle";
const DEFAULT_COLOR: &str = "#ffffcc";

/// Read and parse a graph description from `path`.
///
/// # Errors
///
/// Returns [`TrellisError::Io`] if the file does not exist or cannot be read,
/// and [`TrellisError::Parse`] if the content is not valid UTF-8 JSON
/// describing a graph (a `nodes` and an `edges` sequence).
pub fn load(path: impl AsRef<Path>) -> Result<GraphDocument, TrellisError> {
    let path = path.as_ref();
    info!(path = path.display().to_string(); "Loading graph description");

    let bytes = fs::read(path).map_err(|err| TrellisError::io(path, err))?;
    debug!(path = path.display().to_string(), bytes = bytes.len(); "Read input file");

    parse_bytes(path, &bytes)
}

/// Parse a graph description held in memory.
///
/// `origin` only labels errors; nothing is read from it.
pub fn parse_str(origin: impl AsRef<Path>, source: &str) -> Result<GraphDocument, TrellisError> {
    parse_bytes(origin.as_ref(), source.as_bytes())
}

fn parse_bytes(origin: &Path, bytes: &[u8]) -> Result<GraphDocument, TrellisError> {
    let doc: GraphDocument = serde_json::from_slice(bytes).map_err(|err| {
        let src = String::from_utf8(bytes.to_vec()).ok();
        TrellisError::new_parse_error(origin, err, src)
    })?;

    debug!(
        nodes = doc.node_count(),
        edges = doc.edges().len();
        "Graph description parsed"
    );
    trace!(doc:?; "Parsed document");

    Ok(doc)
}

/// One row of the node table.
#[derive(Debug, Deserialize)]
struct NodeRow {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    shape: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

/// One row of the edge table.
#[derive(Debug, Deserialize)]
struct EdgeRow {
    #[serde(default)]
    id: Option<String>,
    source_id: String,
    target_id: String,
}

/// Build a graph description from a node table and an edge table.
///
/// The node table needs an `id` column and may carry `label`, `category`,
/// `shape` and `color`. The edge table needs `source_id` and `target_id` and
/// may carry `id`; missing edge ids are derived from the endpoints. Labels,
/// shapes and colors are kept as ELK-style `labels` and `layoutOptions`.
///
/// # Errors
///
/// Returns [`TrellisError::Io`] if a table cannot be opened and
/// [`TrellisError::FlatFile`] if a row is malformed or an edge names a node
/// the node table lacks.
pub fn load_flat_files(
    nodes_csv: impl AsRef<Path>,
    edges_csv: impl AsRef<Path>,
) -> Result<GraphDocument, TrellisError> {
    let (nodes_csv, edges_csv) = (nodes_csv.as_ref(), edges_csv.as_ref());
    info!(
        nodes = nodes_csv.display().to_string(),
        edges = edges_csv.display().to_string();
        "Loading flat graph tables"
    );

    let node_rows: Vec<NodeRow> = read_table(nodes_csv)?;
    let ids: HashSet<&str> = node_rows.iter().map(|row| row.id.as_str()).collect();

    let edge_rows: Vec<EdgeRow> = read_table(edges_csv)?;
    let mut edge_ids = HashSet::new();
    let mut edges = Vec::with_capacity(edge_rows.len());
    for (index, row) in edge_rows.into_iter().enumerate() {
        for endpoint in [&row.source_id, &row.target_id] {
            if !ids.contains(endpoint.as_str()) {
                // Line 1 holds the headers.
                return Err(TrellisError::flat_file(
                    edges_csv,
                    format!("line {}: unknown node `{endpoint}`", index + 2),
                ));
            }
        }
        let base = row
            .id
            .unwrap_or_else(|| format!("e-{}-{}", row.source_id, row.target_id));
        let mut id = base.clone();
        let mut repeat = 1;
        while !edge_ids.insert(id.clone()) {
            repeat += 1;
            id = format!("{base}-{repeat}");
        }
        edges.push(Edge::new(id, row.source_id, row.target_id));
    }

    let nodes: Vec<Node> = node_rows.into_iter().map(node_from_row).collect();
    debug!(nodes = nodes.len(), edges = edges.len(); "Flat graph tables read");

    let options = object([
        ("elk.algorithm", Value::from("layered")),
        ("elk.direction", Value::from("DOWN")),
    ]);
    Ok(GraphDocument::new(nodes, edges)
        .with_id("root")
        .with_layout_options(options))
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TrellisError> {
    let file = File::open(path).map_err(|err| TrellisError::io(path, err))?;
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|err| TrellisError::flat_file(path, err))
}

fn node_from_row(row: NodeRow) -> Node {
    let label = row.label.unwrap_or_else(|| row.id.clone());
    let category = row.category.unwrap_or_default();
    let size = label_size(&label);

    let label_options = object([
        ("elk.category", Value::from(category.as_str())),
        ("elk.label.position", Value::from("CENTER")),
    ]);
    let node_options = object([
        (
            "elk.shape",
            Value::from(row.shape.as_deref().unwrap_or(DEFAULT_SHAPE)),
        ),
        (
            "elk.fillColor",
            Value::from(row.color.as_deref().unwrap_or(DEFAULT_COLOR)),
        ),
        ("elk.category", Value::from(category)),
    ]);

    Node::new(row.id)
        .with_size(size.width(), size.height())
        .with_extra(
            "labels",
            json!([{"text": label, "layoutOptions": label_options}]),
        )
        .with_layout_options(node_options)
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> JsonObject {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Size hint for a node showing `label`.
fn label_size(label: &str) -> Size {
    let lines = wrap_label(label, LABEL_COLUMNS);
    let widest = lines.iter().map(|line| line.width()).max().unwrap_or_default();
    Size::new(
        (CHAR_WIDTH * widest as f64 + LABEL_PADDING).max(MIN_NODE_WIDTH),
        LINE_HEIGHT * lines.len() as f64 + LABEL_PADDING,
    )
}

/// Greedy word wrap at `columns` display columns.
///
/// Explicit newlines start a new paragraph, words longer than a line are
/// split, and a label with no words yields one empty line.
fn wrap_label(label: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in label.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if word.width() > columns {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                for ch in word.chars() {
                    if line.width() + ch.to_string().width() > columns {
                        lines.push(std::mem::take(&mut line));
                    }
                    line.push(ch);
                }
            } else if line.is_empty() {
                line.push_str(word);
            } else if line.width() + 1 + word.width() <= columns {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
