//! Layered layout through the `rust-sugiyama` crate.
//!
//! The crate computes layer assignment, crossing reduction and horizontal
//! coordinates for a flat edge list. This adapter only translates: each
//! containment scope becomes one edge list, the crate's coordinates become
//! grid cells sized to the largest node in the scope, containers are sized
//! around their laid-out children, and edges get orthogonal routes between
//! node borders.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use log::{debug, trace, warn};
use rust_sugiyama::configure::Config;

use trellis_core::{
    GraphDocument, Node,
    geometry::{Bounds, Insets, Point, Size},
};

use crate::{
    config::SugiyamaConfig,
    engines::{EngineFuture, LayoutEngine, LayoutRequest},
    error::LayoutError,
    options::LayoutOptions,
};

const ENGINE_NAME: &str = "sugiyama";

/// Spacing handed to the crate; its x coordinates are divided by it again.
const VERTEX_SPACING: f64 = 10.0;

/// Two crate coordinates closer than this belong to the same layer.
const LEVEL_EPSILON: f64 = 1e-6;

const DEFAULT_NODE_SPACING: f64 = 40.0;
const DEFAULT_LAYER_SPACING: f64 = 60.0;
const DEFAULT_PADDING: f64 = 12.0;

/// Distance a self-loop extends past its node.
const SELF_LOOP_REACH: f64 = 20.0;

/// In-process layered layout engine.
#[derive(Debug, Clone)]
pub struct SugiyamaEngine {
    /// Size given to nodes without size hints
    default_size: Size,
}

impl Default for SugiyamaEngine {
    fn default() -> Self {
        Self::from_config(&SugiyamaConfig::default())
    }
}

impl SugiyamaEngine {
    /// Create an engine with the default node size from `config`
    pub fn from_config(config: &SugiyamaConfig) -> Self {
        Self {
            default_size: Size::new(config.node_width(), config.node_height()),
        }
    }
}

impl LayoutEngine for SugiyamaEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn layout(&self, request: LayoutRequest) -> EngineFuture<'_> {
        let default_size = self.default_size;
        Box::pin(async move {
            let task = tokio::task::spawn_blocking(move || compute(request, default_size));
            match task.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    let payload = err.into_panic();
                    let message = payload
                        .downcast_ref::<String>()
                        .cloned()
                        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                        .unwrap_or_else(|| "unknown panic".to_string());
                    Err(LayoutError::Aborted {
                        engine: ENGINE_NAME.to_string(),
                        diagnostic: format!("layout task panicked: {message}"),
                    })
                }
                Err(err) => Err(LayoutError::Aborted {
                    engine: ENGINE_NAME.to_string(),
                    diagnostic: err.to_string(),
                }),
            }
        })
    }
}

/// Flow direction of the layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Down,
    Up,
    Right,
    Left,
}

impl Direction {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "DOWN" => Some(Self::Down),
            "UP" => Some(Self::Up),
            "RIGHT" => Some(Self::Right),
            "LEFT" => Some(Self::Left),
            _ => None,
        }
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::Down | Self::Up)
    }

    fn is_reversed(self) -> bool {
        matches!(self, Self::Up | Self::Left)
    }
}

/// Recognized options, resolved once per request
#[derive(Debug, Clone, Copy)]
struct Settings {
    direction: Direction,
    node_spacing: f64,
    layer_spacing: f64,
    padding: Insets,
    default_size: Size,
}

impl Settings {
    fn from_options(options: &LayoutOptions, default_size: Size) -> Result<Self, LayoutError> {
        let direction = match options.get("direction") {
            None => Direction::Down,
            Some(value) => value.as_str().and_then(Direction::parse).ok_or_else(|| {
                LayoutError::engine(ENGINE_NAME, format!("unsupported direction {value}"))
            })?,
        };

        Ok(Self {
            direction,
            node_spacing: non_negative(options, "spacing.nodeNode", DEFAULT_NODE_SPACING),
            layer_spacing: non_negative(
                options,
                "layered.spacing.nodeNodeBetweenLayers",
                DEFAULT_LAYER_SPACING,
            ),
            padding: padding(options),
            default_size,
        })
    }
}

fn non_negative(options: &LayoutOptions, key: &str, default: f64) -> f64 {
    options
        .get_f64(key)
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(default)
}

/// Reads `padding` either as a single number or in the bracketed
/// `[top=..,left=..,bottom=..,right=..]` form.
fn padding(options: &LayoutOptions) -> Insets {
    if let Some(value) = options.get_f64("padding").filter(|v| v.is_finite() && *v >= 0.0) {
        return Insets::uniform(value);
    }

    let Some(text) = options.get_str("padding") else {
        return Insets::uniform(DEFAULT_PADDING);
    };

    let (mut top, mut right, mut bottom, mut left) = (
        DEFAULT_PADDING,
        DEFAULT_PADDING,
        DEFAULT_PADDING,
        DEFAULT_PADDING,
    );
    for part in text.trim().trim_matches(['[', ']']).split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<f64>() else {
            continue;
        };
        match key.trim() {
            "top" => top = value,
            "right" => right = value,
            "bottom" => bottom = value,
            "left" => left = value,
            other => trace!(key = other; "Ignoring unknown padding side"),
        }
    }
    Insets::new(top, right, bottom, left)
}

/// Runs the whole layout synchronously.
fn compute(request: LayoutRequest, default_size: Size) -> Result<GraphDocument, LayoutError> {
    let (mut doc, options) = request.into_parts();
    let settings = Settings::from_options(&options, default_size)?;
    check_references(&doc)?;

    debug!(
        nodes = doc.node_count(),
        edges = doc.edges().len(),
        direction:? = settings.direction;
        "Running layered layout"
    );

    let edges: Vec<(String, String)> = doc
        .edges()
        .iter()
        .map(|edge| (edge.source().to_string(), edge.target().to_string()))
        .collect();

    let size = arrange_scope(doc.nodes_mut(), &edges, &settings);
    doc.set_size(size);

    let bounds = absolute_bounds(doc.nodes());
    for edge in doc.edges_mut() {
        // Endpoints were checked above.
        let (Some(source), Some(target)) = (bounds.get(edge.source()), bounds.get(edge.target()))
        else {
            continue;
        };
        let points = if edge.source() == edge.target() {
            self_loop(*source)
        } else {
            route(*source, *target, settings.direction)
        };
        edge.set_points(points);
    }

    Ok(doc)
}

/// Rejects duplicate node identifiers and edges with unknown endpoints.
fn check_references(doc: &GraphDocument) -> Result<(), LayoutError> {
    let mut ids = HashSet::new();
    for node in doc.iter_nodes() {
        if !ids.insert(node.id()) {
            return Err(LayoutError::engine(
                ENGINE_NAME,
                format!("duplicate node id `{}`", node.id()),
            ));
        }
    }

    for edge in doc.edges() {
        for endpoint in [edge.source(), edge.target()] {
            if !ids.contains(endpoint) {
                return Err(LayoutError::engine(
                    ENGINE_NAME,
                    format!(
                        "edge `{}` references unknown node `{endpoint}`",
                        edge.id()
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Lays out one containment scope and returns its padded size.
///
/// Children are positioned relative to the top-left corner of the scope.
fn arrange_scope(nodes: &mut [Node], edges: &[(String, String)], settings: &Settings) -> Size {
    let sizes: Vec<Size> = nodes
        .iter_mut()
        .map(|node| {
            if node.has_children() {
                let content = arrange_scope(node.children_mut(), edges, settings);
                let explicit = Size::new(
                    node.width().unwrap_or_default(),
                    node.height().unwrap_or_default(),
                );
                content.max(explicit)
            } else {
                size_hint(node, settings.default_size)
            }
        })
        .collect();

    let pairs = scope_pairs(nodes, edges);
    let cells = assign_cells(nodes.len(), &pairs);
    place(nodes, &sizes, &cells, settings)
}

fn size_hint(node: &Node, default: Size) -> Size {
    let usable = |value: Option<f64>| value.filter(|v| v.is_finite() && *v >= 0.0);
    Size::new(
        usable(node.width()).unwrap_or(default.width()),
        usable(node.height()).unwrap_or(default.height()),
    )
}

/// Maps every edge onto the scope members that contain its endpoints.
///
/// Edges internal to one member are laid out inside that member; edges
/// leaving the scope are ignored here.
fn scope_pairs(nodes: &[Node], edges: &[(String, String)]) -> Vec<(u32, u32)> {
    let mut owner: HashMap<&str, u32> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        for member in node.iter_subtree() {
            owner.insert(member.id(), index as u32);
        }
    }

    let pairs: IndexSet<(u32, u32)> = edges
        .iter()
        .filter_map(|(source, target)| {
            let source = *owner.get(source.as_str())?;
            let target = *owner.get(target.as_str())?;
            (source != target).then_some((source, target))
        })
        .collect();

    pairs.into_iter().collect()
}

/// Grid cell of a scope member: layer index and position within the layer
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    layer: usize,
    order: f64,
}

/// Assigns a cell to every member of a scope.
///
/// Connected components come from the crate side by side; members without
/// edges follow them in the first layer.
fn assign_cells(count: usize, pairs: &[(u32, u32)]) -> Vec<Cell> {
    let mut cells: Vec<Option<Cell>> = vec![None; count];
    let mut offset = 0.0;

    if !pairs.is_empty() {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: VERTEX_SPACING,
            ..Default::default()
        };
        // The crate removes cycles itself before layering.
        let layouts = rust_sugiyama::from_edges(pairs, &config);
        trace!(components = layouts.len(); "Crate returned layouts");

        for (coords, _, _) in &layouts {
            let members: Vec<(usize, f64, f64)> = coords
                .iter()
                .filter(|(id, _)| *id < count)
                .map(|&(id, (x, y))| (id, x as f64, y as f64))
                .collect();
            if members.is_empty() {
                continue;
            }

            let component = component_cells(&members, pairs);
            let width = component
                .values()
                .map(|cell| cell.order)
                .fold(0.0, f64::max);
            for (id, cell) in component {
                cells[id] = Some(Cell {
                    layer: cell.layer,
                    order: cell.order + offset,
                });
            }
            offset += width + 1.0;
        }
    }

    let mut cells: Vec<Cell> = cells
        .into_iter()
        .map(|cell| {
            cell.unwrap_or_else(|| {
                let cell = Cell {
                    layer: 0,
                    order: offset,
                };
                offset += 1.0;
                cell
            })
        })
        .collect();

    separate_within_layers(&mut cells);
    cells
}

/// Converts crate coordinates of one component into cells.
///
/// Layers are numbered so that most edges point from a lower to a higher
/// layer, whichever way the crate orients its y axis.
fn component_cells(members: &[(usize, f64, f64)], pairs: &[(u32, u32)]) -> HashMap<usize, Cell> {
    let min_x = members
        .iter()
        .map(|&(_, x, _)| x)
        .fold(f64::INFINITY, f64::min);

    let mut levels: Vec<f64> = members.iter().map(|&(_, _, y)| y).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup_by(|a, b| (*a - *b).abs() < LEVEL_EPSILON);

    let mut cells: HashMap<usize, Cell> = members
        .iter()
        .map(|&(id, x, y)| {
            let layer = levels
                .iter()
                .position(|level| (level - y).abs() < LEVEL_EPSILON)
                .unwrap_or_default();
            let order = (x - min_x) / VERTEX_SPACING;
            (id, Cell { layer, order })
        })
        .collect();

    let (forward, backward) = pairs.iter().fold((0usize, 0usize), |(fwd, bwd), &(s, t)| {
        match (cells.get(&(s as usize)), cells.get(&(t as usize))) {
            (Some(s), Some(t)) if s.layer < t.layer => (fwd + 1, bwd),
            (Some(s), Some(t)) if s.layer > t.layer => (fwd, bwd + 1),
            _ => (fwd, bwd),
        }
    });

    if backward > forward {
        let last = levels.len().saturating_sub(1);
        for cell in cells.values_mut() {
            cell.layer = last - cell.layer;
        }
    }

    cells
}

/// Keeps members of the same layer at least one cell apart.
fn separate_within_layers(cells: &mut [Cell]) {
    let mut by_layer: HashMap<usize, Vec<usize>> = HashMap::new();
    for (index, cell) in cells.iter().enumerate() {
        by_layer.entry(cell.layer).or_default().push(index);
    }

    for members in by_layer.values_mut() {
        members.sort_by(|&a, &b| cells[a].order.total_cmp(&cells[b].order));
        let mut floor = f64::NEG_INFINITY;
        for &index in members.iter() {
            if cells[index].order < floor {
                warn!(order = cells[index].order; "Overlapping cells, shifting member");
                cells[index].order = floor;
            }
            floor = cells[index].order + 1.0;
        }
    }
}

/// Turns cells into positions and sizes; returns the padded scope size.
fn place(nodes: &mut [Node], sizes: &[Size], cells: &[Cell], settings: &Settings) -> Size {
    let cell_size = sizes.iter().fold(Size::default(), |acc, size| acc.max(*size));
    let last_layer = cells.iter().map(|cell| cell.layer).max().unwrap_or_default();

    let mut content: Option<Bounds> = None;
    for ((node, size), cell) in nodes.iter_mut().zip(sizes).zip(cells) {
        let layer = if settings.direction.is_reversed() {
            last_layer - cell.layer
        } else {
            cell.layer
        } as f64;

        let (x, y) = if settings.direction.is_vertical() {
            (
                cell.order * (cell_size.width() + settings.node_spacing),
                layer * (cell_size.height() + settings.layer_spacing),
            )
        } else {
            (
                layer * (cell_size.width() + settings.layer_spacing),
                cell.order * (cell_size.height() + settings.node_spacing),
            )
        };

        // Center the node inside its cell.
        let top_left = Point::new(
            x + (cell_size.width() - size.width()) / 2.0,
            y + (cell_size.height() - size.height()) / 2.0,
        )
        .add_point(settings.padding.origin());

        node.set_position(top_left);
        node.set_size(*size);

        let bounds = Bounds::new_from_top_left(top_left, *size);
        content = Some(content.map_or(bounds, |acc| acc.merge(&bounds)));
    }

    match content {
        Some(bounds) => Size::new(
            bounds.max_x() + settings.padding.right(),
            bounds.max_y() + settings.padding.bottom(),
        ),
        None => Size::default().add_padding(settings.padding),
    }
}

/// Collects the bounds of every node in root coordinates.
fn absolute_bounds(nodes: &[Node]) -> HashMap<String, Bounds> {
    fn walk(nodes: &[Node], offset: Point, out: &mut HashMap<String, Bounds>) {
        for node in nodes {
            let (Some(position), Some(size)) = (node.position(), node.size()) else {
                continue;
            };
            let top_left = position.add_point(offset);
            out.insert(
                node.id().to_string(),
                Bounds::new_from_top_left(top_left, size),
            );
            walk(node.children(), top_left, out);
        }
    }

    let mut out = HashMap::new();
    walk(nodes, Point::default(), &mut out);
    out
}

/// Orthogonal route from the border of `source` to the border of `target`.
fn route(source: Bounds, target: Bounds, direction: Direction) -> Vec<Point> {
    if direction.is_vertical() {
        route_along(source, target, Axis::Vertical)
    } else {
        route_along(source, target, Axis::Horizontal)
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    /// Maps a point into a frame where the flow axis is y.
    fn to_frame(self, p: Point) -> Point {
        match self {
            Axis::Vertical => p,
            Axis::Horizontal => Point::new(p.y(), p.x()),
        }
    }

    fn bounds_to_frame(self, b: Bounds) -> Bounds {
        let top_left = self.to_frame(b.min_point());
        let size = match self {
            Axis::Vertical => b.to_size(),
            Axis::Horizontal => b.to_size().transpose(),
        };
        Bounds::new_from_top_left(top_left, size)
    }
}

fn route_along(source: Bounds, target: Bounds, axis: Axis) -> Vec<Point> {
    // The frame swap is its own inverse.
    let (source, target) = (axis.bounds_to_frame(source), axis.bounds_to_frame(target));
    let (s, t) = (source.center(), target.center());

    let (start, end) = if t.y() > s.y() {
        (s.with_y(source.max_y()), t.with_y(target.min_y()))
    } else if t.y() < s.y() {
        (s.with_y(source.min_y()), t.with_y(target.max_y()))
    } else if t.x() >= s.x() {
        (s.with_x(source.max_x()), t.with_x(target.min_x()))
    } else {
        (s.with_x(source.min_x()), t.with_x(target.max_x()))
    };

    let points = if start.x() == end.x() || start.y() == end.y() {
        vec![start, end]
    } else {
        let mid = start.midpoint(end).y();
        vec![start, start.with_y(mid), end.with_y(mid), end]
    };

    points.into_iter().map(|p| axis.to_frame(p)).collect()
}

/// Loop leaving and re-entering the right side of a node.
fn self_loop(bounds: Bounds) -> Vec<Point> {
    let center = bounds.center();
    let quarter = bounds.height() / 4.0;
    let out = bounds.max_x() + SELF_LOOP_REACH;

    vec![
        Point::new(bounds.max_x(), center.y() - quarter),
        Point::new(out, center.y() - quarter),
        Point::new(out, center.y() + quarter),
        Point::new(bounds.max_x(), center.y() + quarter),
    ]
}
