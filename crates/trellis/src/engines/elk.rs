//! ELK JSON dialect.
//!
//! ELK reads nodes from `children`, edge endpoints from `sources` and
//! `targets` arrays, and answers with edge geometry in `sections` made of a
//! start point, bend points and an end point. [`to_elk`] rewrites a document
//! into that shape and [`from_elk`] reads the answer back. Everything else
//! passes through untouched.

use serde_json::{Map, Value};

use trellis_core::GraphDocument;

/// Identifier given to a root that has none; ELK requires one.
const ROOT_ID: &str = "root";

/// Rewrites `doc` as an ELK graph.
pub(crate) fn to_elk(doc: &GraphDocument) -> Result<Value, serde_json::Error> {
    let mut root = match serde_json::to_value(doc)? {
        Value::Object(root) => root,
        other => return Ok(other),
    };

    if doc.id().is_none() {
        root.insert("id".to_string(), Value::from(ROOT_ID));
    }
    rename(&mut root, "nodes", "children");

    for edge in edges_mut(&mut root) {
        for (single, many) in [("source", "sources"), ("target", "targets")] {
            if let Some(endpoint) = edge.remove(single) {
                edge.insert(many.to_string(), Value::Array(vec![endpoint]));
            }
        }
    }

    Ok(Value::Object(root))
}

/// Reads an ELK answer back into a document.
///
/// `had_id` tells whether the request carried its own root identifier; if
/// not, the one added by [`to_elk`] is dropped again.
pub(crate) fn from_elk(value: Value, had_id: bool) -> Result<GraphDocument, String> {
    let Value::Object(mut root) = value else {
        return Err("expected a JSON object".to_string());
    };

    if !had_id && root.get("id").and_then(Value::as_str) == Some(ROOT_ID) {
        root.remove("id");
    }
    rename(&mut root, "children", "nodes");

    for edge in edges_mut(&mut root) {
        for (many, single) in [("sources", "source"), ("targets", "target")] {
            if let Some(endpoints) = edge.remove(many) {
                let endpoint = single_endpoint(edge, many, endpoints)?;
                edge.insert(single.to_string(), endpoint);
            }
        }
        if let Some(sections) = edge.remove("sections") {
            let points = section_points(sections);
            if !points.is_empty() {
                edge.insert("points".to_string(), Value::Array(points));
            }
        }
    }

    serde_json::from_value(Value::Object(root)).map_err(|err| err.to_string())
}

fn rename(object: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = object.remove(from) {
        object.insert(to.to_string(), value);
    }
}

fn edges_mut(root: &mut Map<String, Value>) -> impl Iterator<Item = &mut Map<String, Value>> {
    root.get_mut("edges")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

fn single_endpoint(
    edge: &Map<String, Value>,
    key: &str,
    endpoints: Value,
) -> Result<Value, String> {
    match endpoints {
        Value::Array(mut endpoints) if endpoints.len() == 1 => Ok(endpoints.remove(0)),
        other => Err(format!(
            "edge {} has `{key}` {other}; only single endpoints are supported",
            edge.get("id").unwrap_or(&Value::Null)
        )),
    }
}

/// Flattens ELK edge sections into one polyline.
fn section_points(sections: Value) -> Vec<Value> {
    let mut points = Vec::new();
    for section in sections.as_array().into_iter().flatten() {
        points.extend(section.get("startPoint").cloned());
        if let Some(bends) = section.get("bendPoints").and_then(Value::as_array) {
            points.extend(bends.iter().cloned());
        }
        points.extend(section.get("endPoint").cloned());
    }
    points
}
