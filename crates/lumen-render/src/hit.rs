//! Hit testing: screen point → what is under the pointer.
//!
//! Nodes are tested front-to-back (last painted first) and always win over
//! connections, which are drawn beneath them. Within a node, handles are
//! tested first since they straddle the node's edge, then the resize
//! corner, then the header, then the body.
//!
//! Connections are hit against their wide invisible stroke, not the thin
//! visible one.

use crate::geometry::{connection_curve, connection_endpoints, handle_position, header_rect, resize_corner_rect};
use kurbo::{ParamCurveNearest, Point};
use lumen_core::{CanvasConfig, ConnectionId, GraphModel, HandleKind, Node, NodeId, Viewport};

/// Curve-distance accuracy in world units.
const NEAREST_ACCURACY: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasHit {
    Handle { node: NodeId, handle: HandleKind },
    ResizeCorner(NodeId),
    Header(NodeId),
    Body(NodeId),
    Connection(ConnectionId),
    Empty,
}

impl CanvasHit {
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            CanvasHit::Handle { node, .. }
            | CanvasHit::ResizeCorner(node)
            | CanvasHit::Header(node)
            | CanvasHit::Body(node) => Some(node),
            CanvasHit::Connection(_) | CanvasHit::Empty => None,
        }
    }
}

/// Find what lies under `screen`.
pub fn hit_test(
    graph: &GraphModel,
    viewport: &Viewport,
    screen: Point,
    config: &CanvasConfig,
) -> CanvasHit {
    let world = viewport.screen_to_world(screen);

    for node in graph.nodes().rev() {
        if let Some(hit) = hit_test_node(node, world, config) {
            return hit;
        }
    }

    match hit_test_connection(graph, world, config) {
        Some(id) => CanvasHit::Connection(id),
        None => CanvasHit::Empty,
    }
}

fn hit_test_node(node: &Node, world: Point, config: &CanvasConfig) -> Option<CanvasHit> {
    // Handles are grabbed within twice their drawn radius.
    let grab = config.handle_radius * 2.0;
    for handle in node.kind.handles() {
        if handle_position(node, handle, config).distance(world) <= grab {
            return Some(CanvasHit::Handle {
                node: node.id,
                handle,
            });
        }
    }

    if !node.bounds(config.fallback_node_size).contains(world) {
        return None;
    }
    if resize_corner_rect(node, config).contains(world) {
        return Some(CanvasHit::ResizeCorner(node.id));
    }
    if header_rect(node, config).contains(world) {
        return Some(CanvasHit::Header(node.id));
    }
    Some(CanvasHit::Body(node.id))
}

/// The connection nearest to `world` among those whose hit stroke covers it.
pub fn hit_test_connection(
    graph: &GraphModel,
    world: Point,
    config: &CanvasConfig,
) -> Option<ConnectionId> {
    let half = config.connection_hit_width / 2.0;
    let mut best: Option<(f64, ConnectionId)> = None;
    for conn in graph.connections() {
        let Some((start, end)) = connection_endpoints(graph, conn, config) else {
            continue;
        };
        let curve = connection_curve(start, end, config);
        let dist = curve.nearest(world, NEAREST_ACCURACY).distance_sq.sqrt();
        if dist <= half && best.is_none_or(|(d, _)| dist < d) {
            best = Some((dist, conn.id));
        }
    }
    best.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{NodeKind, Size, Vec2};

    fn pair() -> (GraphModel, NodeId, NodeId) {
        let mut g = GraphModel::new();
        let a = g.add_node(NodeKind::Input, Point::new(0.0, 0.0));
        let b = g.add_node(NodeKind::Output, Point::new(600.0, 0.0));
        g.resize_node(a, Size::new(300.0, 200.0));
        g.resize_node(b, Size::new(300.0, 200.0));
        (g, a, b)
    }

    #[test]
    fn regions_of_a_node() {
        let config = CanvasConfig::default();
        let (g, a, _) = pair();
        let vp = Viewport::default();
        assert_eq!(hit_test(&g, &vp, Point::new(100.0, 10.0), &config), CanvasHit::Header(a));
        assert_eq!(hit_test(&g, &vp, Point::new(100.0, 120.0), &config), CanvasHit::Body(a));
        assert_eq!(hit_test(&g, &vp, Point::new(295.0, 195.0), &config), CanvasHit::ResizeCorner(a));
        assert_eq!(
            hit_test(&g, &vp, Point::new(303.0, 100.0), &config),
            CanvasHit::Handle { node: a, handle: HandleKind::Source }
        );
        // Inputs have no target handle on their left edge.
        assert_eq!(hit_test(&g, &vp, Point::new(1.0, 100.0), &config), CanvasHit::Body(a));
    }

    #[test]
    fn respects_pan_and_zoom() {
        let config = CanvasConfig::default();
        let (g, _, b) = pair();
        let vp = Viewport {
            pan: Vec2::new(-100.0, 50.0),
            zoom: 0.5,
            ..Viewport::default()
        };
        // Output target handle sits at world (600, 100) → screen (200, 100).
        assert_eq!(
            hit_test(&g, &vp, Point::new(200.0, 100.0), &config),
            CanvasHit::Handle { node: b, handle: HandleKind::Target }
        );
    }

    #[test]
    fn wide_stroke_catches_near_misses() {
        let config = CanvasConfig::default();
        let (mut g, a, b) = pair();
        let id = g.add_connection(a, b).unwrap();
        let vp = Viewport::default();
        // Straight horizontal curve at y = 100 between x = 300 and x = 600.
        assert_eq!(hit_test(&g, &vp, Point::new(450.0, 108.0), &config), CanvasHit::Connection(id));
        assert_eq!(hit_test(&g, &vp, Point::new(450.0, 125.0), &config), CanvasHit::Empty);
    }

    #[test]
    fn topmost_node_wins() {
        let config = CanvasConfig::default();
        let mut g = GraphModel::new();
        let under = g.add_node(NodeKind::Processor, Point::new(0.0, 0.0));
        let over = g.add_node(NodeKind::Processor, Point::new(50.0, 100.0));
        let hit = hit_test(&g, &Viewport::default(), Point::new(120.0, 200.0), &config);
        assert_eq!(hit.node(), Some(over));
        assert_ne!(hit.node(), Some(under));
    }
}
