//! World-space geometry of node chrome and connection curves.
//!
//! Connections are horizontal-tangent cubic beziers: each control point is
//! pushed along x away from its endpoint by `max(|x2 - x1| * 0.5, 50)`, so
//! the curve leaves a source heading right and enters a target heading
//! right regardless of where the two nodes sit relative to each other.

use kurbo::{CubicBez, Point, Rect};
use lumen_core::{CanvasConfig, Connection, ConnectionId, GraphModel, HandleKind, Node, NodeId};
use std::fmt::Write;

// ─── Node chrome ─────────────────────────────────────────────────────────

/// Centre of a node's handle: target on the left edge, source on the
/// right, both at half height.
pub fn handle_position(node: &Node, handle: HandleKind, config: &CanvasConfig) -> Point {
    let bounds = node.bounds(config.fallback_node_size);
    let y = bounds.y0 + bounds.height() / 2.0;
    match handle {
        HandleKind::Target => Point::new(bounds.x0, y),
        HandleKind::Source => Point::new(bounds.x1, y),
    }
}

/// The drag strip along the top of a node.
pub fn header_rect(node: &Node, config: &CanvasConfig) -> Rect {
    let bounds = node.bounds(config.fallback_node_size);
    Rect::new(
        bounds.x0,
        bounds.y0,
        bounds.x1,
        (bounds.y0 + config.header_height).min(bounds.y1),
    )
}

/// The bottom-right square that starts a resize.
pub fn resize_corner_rect(node: &Node, config: &CanvasConfig) -> Rect {
    let bounds = node.bounds(config.fallback_node_size);
    Rect::new(
        bounds.x1 - config.resize_corner,
        bounds.y1 - config.resize_corner,
        bounds.x1,
        bounds.y1,
    )
}

// ─── Connections ─────────────────────────────────────────────────────────

pub fn connection_curve(start: Point, end: Point, config: &CanvasConfig) -> CubicBez {
    let offset = ((end.x - start.x).abs() * config.bezier_factor).max(config.bezier_min_offset);
    CubicBez::new(
        start,
        Point::new(start.x + offset, start.y),
        Point::new(end.x - offset, end.y),
        end,
    )
}

/// Source-handle and target-handle positions of a connection.
pub fn connection_endpoints(
    graph: &GraphModel,
    conn: &Connection,
    config: &CanvasConfig,
) -> Option<(Point, Point)> {
    let from = graph.node(conn.from)?;
    let to = graph.node(conn.to)?;
    Some((
        handle_position(from, HandleKind::Source, config),
        handle_position(to, HandleKind::Target, config),
    ))
}

/// Where the delete badge of a selected connection sits.
pub fn connection_midpoint(start: Point, end: Point) -> Point {
    start.midpoint(end)
}

/// A connection ready to draw: the curve plus its two stroke widths.
///
/// Renderers stroke `hit_width` invisibly (or use it for hit testing only)
/// and `visible_width` on top.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionPath {
    pub id: ConnectionId,
    pub curve: CubicBez,
    pub hit_width: f64,
    pub visible_width: f64,
    pub selected: bool,
}

impl ConnectionPath {
    pub fn midpoint(&self) -> Point {
        connection_midpoint(self.curve.p0, self.curve.p3)
    }
}

pub fn connection_paths(
    graph: &GraphModel,
    selected: Option<ConnectionId>,
    config: &CanvasConfig,
) -> Vec<ConnectionPath> {
    graph
        .connections()
        .filter_map(|conn| {
            let (start, end) = connection_endpoints(graph, conn, config)?;
            let is_selected = selected == Some(conn.id);
            Some(ConnectionPath {
                id: conn.id,
                curve: connection_curve(start, end, config),
                hit_width: config.connection_hit_width,
                visible_width: if is_selected {
                    config.connection_selected_width
                } else {
                    config.connection_width
                },
                selected: is_selected,
            })
        })
        .collect()
}

/// Provisional curve from the handle a link drag started on to the cursor.
pub fn pending_curve(
    graph: &GraphModel,
    start_node: NodeId,
    start_handle: HandleKind,
    cursor: Point,
    config: &CanvasConfig,
) -> Option<CubicBez> {
    let node = graph.node(start_node)?;
    let start = handle_position(node, start_handle, config);
    Some(connection_curve(start, cursor, config))
}

/// SVG path data (`M x y C ...`) for hosts that draw with SVG.
pub fn svg_path(curve: &CubicBez) -> String {
    let mut d = String::with_capacity(64);
    let _ = write!(
        d,
        "M {} {} C {} {}, {} {}, {} {}",
        curve.p0.x, curve.p0.y, curve.p1.x, curve.p1.y, curve.p2.x, curve.p2.y, curve.p3.x, curve.p3.y
    );
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{NodeKind, Size};
    use pretty_assertions::assert_eq;

    #[test]
    fn control_points_use_half_span() {
        let config = CanvasConfig::default();
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(400.0, 100.0), &config);
        assert_eq!(c.p1, Point::new(200.0, 0.0));
        assert_eq!(c.p2, Point::new(200.0, 100.0));
    }

    #[test]
    fn control_offset_has_floor() {
        let config = CanvasConfig::default();
        // Target left of source and vertically far away.
        let c = connection_curve(Point::new(100.0, 0.0), Point::new(80.0, 500.0), &config);
        assert_eq!(c.p1, Point::new(150.0, 0.0));
        assert_eq!(c.p2, Point::new(30.0, 500.0));
        assert_eq!(c.p1.y, c.p0.y);
        assert_eq!(c.p2.y, c.p3.y);
    }

    #[test]
    fn handles_sit_on_side_midpoints() {
        let config = CanvasConfig::default();
        let node = Node::new(NodeId::intern("h"), NodeKind::Processor, Point::new(10.0, 20.0))
            .with_size(Size::new(400.0, 300.0));
        assert_eq!(handle_position(&node, HandleKind::Target, &config), Point::new(10.0, 170.0));
        assert_eq!(handle_position(&node, HandleKind::Source, &config), Point::new(410.0, 170.0));
    }

    #[test]
    fn svg_path_format() {
        let config = CanvasConfig::default();
        let c = connection_curve(Point::new(0.0, 0.0), Point::new(10.0, 0.0), &config);
        assert_eq!(svg_path(&c), "M 0 0 C 50 0, -40 0, 10 0");
    }

    #[test]
    fn selected_path_is_wider() {
        let config = CanvasConfig::default();
        let graph = GraphModel::with_default_pipeline();
        let first = graph.connections().next().unwrap().id;
        let paths = connection_paths(&graph, Some(first), &config);
        assert_eq!(paths.len(), 2);
        let sel = paths.iter().find(|p| p.id == first).unwrap();
        assert!(sel.selected);
        assert_eq!(sel.visible_width, 4.0);
        assert_eq!(sel.hit_width, 20.0);
        assert!(paths.iter().filter(|p| !p.selected).all(|p| p.visible_width == 3.0));
    }
}
