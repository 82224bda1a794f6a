//! Structural checks on decorated documents.
//!
//! These helpers compare a layout result with the request it answers and
//! find nodes or edges the engine left without geometry. The pipeline only
//! runs them when verification is switched on; tests use them directly.

use std::{collections::BTreeSet, fmt};

use crate::document::GraphDocument;

/// A node or edge lacking the geometry a successful layout assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryGap {
    /// Node has no `x`/`y`.
    NodePosition(String),
    /// Node has no `width`/`height`.
    NodeSize(String),
    /// Edge has no routing points.
    EdgeRoute(String),
}

impl fmt::Display for GeometryGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodePosition(id) => write!(f, "node `{id}` has no position"),
            Self::NodeSize(id) => write!(f, "node `{id}` has no dimensions"),
            Self::EdgeRoute(id) => write!(f, "edge `{id}` has no routing points"),
        }
    }
}

/// A difference in node or edge identity between request and result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeMismatch {
    MissingNode(String),
    UnexpectedNode(String),
    MissingEdge(String),
    UnexpectedEdge(String),
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode(id) => write!(f, "node `{id}` missing from layout result"),
            Self::UnexpectedNode(id) => write!(f, "layout result added node `{id}`"),
            Self::MissingEdge(id) => write!(f, "edge `{id}` missing from layout result"),
            Self::UnexpectedEdge(id) => write!(f, "layout result added edge `{id}`"),
        }
    }
}

/// Returns the identifiers of every node in the document, nested ones included.
pub fn node_ids(doc: &GraphDocument) -> BTreeSet<&str> {
    doc.iter_nodes().map(|node| node.id()).collect()
}

/// Returns the identifiers of every edge in the document.
pub fn edge_ids(doc: &GraphDocument) -> BTreeSet<&str> {
    doc.edges().iter().map(|edge| edge.id()).collect()
}

/// Lists every node without a position or size and every edge without a
/// non-empty route, in document order.
pub fn geometry_gaps(doc: &GraphDocument) -> Vec<GeometryGap> {
    let mut gaps = Vec::new();

    for node in doc.iter_nodes() {
        if node.position().is_none_or(|p| !p.is_finite()) {
            gaps.push(GeometryGap::NodePosition(node.id().to_string()));
        }
        if node.size().is_none() {
            gaps.push(GeometryGap::NodeSize(node.id().to_string()));
        }
    }

    for edge in doc.edges() {
        if edge.points().is_none_or(<[_]>::is_empty) {
            gaps.push(GeometryGap::EdgeRoute(edge.id().to_string()));
        }
    }

    gaps
}

/// Compares node and edge identifiers of a request and its result.
///
/// An empty list means the result has exactly the nodes and edges of the
/// request, nothing added and nothing removed.
pub fn shape_mismatches(request: &GraphDocument, result: &GraphDocument) -> Vec<ShapeMismatch> {
    let mut mismatches = Vec::new();

    let (want_nodes, got_nodes) = (node_ids(request), node_ids(result));
    mismatches.extend(
        want_nodes
            .difference(&got_nodes)
            .map(|id| ShapeMismatch::MissingNode(id.to_string())),
    );
    mismatches.extend(
        got_nodes
            .difference(&want_nodes)
            .map(|id| ShapeMismatch::UnexpectedNode(id.to_string())),
    );

    let (want_edges, got_edges) = (edge_ids(request), edge_ids(result));
    mismatches.extend(
        want_edges
            .difference(&got_edges)
            .map(|id| ShapeMismatch::MissingEdge(id.to_string())),
    );
    mismatches.extend(
        got_edges
            .difference(&want_edges)
            .map(|id| ShapeMismatch::UnexpectedEdge(id.to_string())),
    );

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{Edge, Node},
        geometry::{Point, Size},
    };

    fn request() -> GraphDocument {
        GraphDocument::new(
            vec![
                Node::new("a"),
                Node::new("g").with_children(vec![Node::new("b")]),
            ],
            vec![Edge::new("e1", "a", "b")],
        )
    }

    fn decorate(doc: &mut GraphDocument) {
        fn place(node: &mut Node) {
            node.set_position(Point::new(0.0, 0.0));
            node.set_size(Size::new(10.0, 10.0));
            node.children_mut().iter_mut().for_each(place);
        }
        doc.nodes_mut().iter_mut().for_each(place);
        for edge in doc.edges_mut() {
            edge.set_points(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        }
    }

    #[test]
    fn test_undecorated_document_has_gaps() {
        let gaps = geometry_gaps(&request());

        assert_eq!(gaps.len(), 7);
        assert_eq!(gaps[0], GeometryGap::NodePosition("a".to_string()));
        assert_eq!(gaps[6], GeometryGap::EdgeRoute("e1".to_string()));
    }

    #[test]
    fn test_decorated_document_has_no_gaps() {
        let mut doc = request();
        decorate(&mut doc);
        assert!(geometry_gaps(&doc).is_empty());
    }

    #[test]
    fn test_empty_route_is_a_gap() {
        let mut doc = request();
        decorate(&mut doc);
        doc.edges_mut()[0].set_points(Vec::new());

        assert_eq!(
            geometry_gaps(&doc),
            vec![GeometryGap::EdgeRoute("e1".to_string())]
        );
    }

    #[test]
    fn test_shape_mismatches() {
        let req = request();
        let res = GraphDocument::new(
            vec![Node::new("a"), Node::new("z")],
            vec![Edge::new("e1", "a", "z")],
        );

        let mismatches = shape_mismatches(&req, &res);
        assert!(mismatches.contains(&ShapeMismatch::MissingNode("b".to_string())));
        assert!(mismatches.contains(&ShapeMismatch::MissingNode("g".to_string())));
        assert!(mismatches.contains(&ShapeMismatch::UnexpectedNode("z".to_string())));
        assert_eq!(mismatches.len(), 3);
        assert!(shape_mismatches(&req, &req).is_empty());
    }
}
