//! Graph document model.
//!
//! A [`GraphDocument`] is the in-memory form of a graph description file and
//! of the decorated document a layout engine hands back. The model is a
//! transparent mirror of the JSON: optional fields that were absent stay
//! absent when serialized again, and every key the model does not know about
//! is kept in an `extra` map and written back in input order.
//!
//! Coordinates and sizes are numbers: integral values are written without a
//! fractional part, and an explicit `null` for one of them reads as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    geometry::{Point, Size},
    number,
};

/// Opaque JSON object used for `layoutOptions` and unmodelled keys.
pub type JsonObject = Map<String, Value>;

/// Root of a graph description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(
        rename = "layoutOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    layout_options: Option<JsonObject>,

    nodes: Vec<Node>,

    edges: Vec<Edge>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    width: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    height: Option<f64>,

    #[serde(flatten)]
    extra: JsonObject,
}

impl GraphDocument {
    /// Creates a document from top-level nodes and edges.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            id: None,
            layout_options: None,
            nodes,
            edges,
            width: None,
            height: None,
            extra: JsonObject::new(),
        }
    }

    /// Sets the document identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the document-wide layout options.
    pub fn with_layout_options(mut self, options: JsonObject) -> Self {
        self.layout_options = Some(options);
        self
    }

    /// Returns the document identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the document-wide layout options, if any.
    pub fn layout_options(&self) -> Option<&JsonObject> {
        self.layout_options.as_ref()
    }

    /// Returns a mutable handle to the layout options, creating an empty
    /// object when the document had none.
    pub fn layout_options_mut(&mut self) -> &mut JsonObject {
        self.layout_options.get_or_insert_with(JsonObject::new)
    }

    /// Returns the top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Returns all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Returns the overall drawing size, if an engine assigned one.
    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }

    /// Sets the overall drawing size.
    pub fn set_size(&mut self, size: Size) {
        self.width = Some(size.width());
        self.height = Some(size.height());
    }

    /// Keys on the root object that the model does not interpret.
    pub fn extra(&self) -> &JsonObject {
        &self.extra
    }

    /// Iterates over every node in the document, depth first, parents
    /// before their children.
    pub fn iter_nodes(&self) -> NodeIter<'_> {
        NodeIter {
            stack: self.nodes.iter().rev().collect(),
        }
    }

    /// Total number of nodes, including nested children.
    pub fn node_count(&self) -> usize {
        self.iter_nodes().count()
    }

    /// Finds a node anywhere in the hierarchy by identifier.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.iter_nodes().find(|node| node.id() == id)
    }

    /// Finds an edge by identifier.
    pub fn find_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id() == id)
    }
}

/// A node, optionally containing nested child nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    x: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    y: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    width: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "number::serialize_opt"
    )]
    height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,

    #[serde(
        rename = "layoutOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    layout_options: Option<JsonObject>,

    #[serde(flatten)]
    extra: JsonObject,
}

impl Node {
    /// Creates a bare node with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            width: None,
            height: None,
            children: None,
            layout_options: None,
            extra: JsonObject::new(),
        }
    }

    /// Sets the size hint of the node.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the nested child nodes.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_layout_options(mut self, options: JsonObject) -> Self {
        self.layout_options = Some(options);
        self
    }

    /// Adds a key the model does not interpret, such as `labels`.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the assigned position, present only after layout.
    pub fn position(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = Some(position.x());
        self.y = Some(position.y());
    }

    /// Returns the size: a hint before layout, the assigned dimensions after.
    pub fn size(&self) -> Option<Size> {
        Some(Size::new(self.width?, self.height?))
    }

    pub fn width(&self) -> Option<f64> {
        self.width
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    pub fn set_size(&mut self, size: Size) {
        self.width = Some(size.width());
        self.height = Some(size.height());
    }

    /// Returns the nested children, empty for leaf nodes.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Returns the nested children for in-place decoration.
    pub fn children_mut(&mut self) -> &mut [Node] {
        self.children.as_deref_mut().unwrap_or_default()
    }

    /// Iterates over this node and all of its descendants, depth first.
    pub fn iter_subtree(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// Returns true if the node contains other nodes.
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn layout_options(&self) -> Option<&JsonObject> {
        self.layout_options.as_ref()
    }

    /// Keys on this node that the model does not interpret.
    pub fn extra(&self) -> &JsonObject {
        &self.extra
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: String,

    source: String,

    target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<Point>>,

    #[serde(flatten)]
    extra: JsonObject,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            points: None,
            extra: JsonObject::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the node the edge starts at.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifier of the node the edge ends at.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the routing polyline, present only after layout.
    pub fn points(&self) -> Option<&[Point]> {
        self.points.as_deref()
    }

    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = Some(points);
    }

    /// Keys on this edge that the model does not interpret.
    pub fn extra(&self) -> &JsonObject {
        &self.extra
    }
}

/// Depth-first iterator over the nodes of a [`GraphDocument`].
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
