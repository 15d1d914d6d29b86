//! Canvas → Vello drawing commands.
//!
//! Paints, bottom to top: background dot grid (screen space), connections,
//! the provisional link curve, then node cards. Everything except the grid
//! is painted in world space under the viewport's pan/zoom affine.

use crate::geometry::{connection_paths, handle_position, header_rect, pending_curve};
use kurbo::{Affine, BezPath, Circle, Point, Rect, RoundedRect, Stroke};
use lumen_core::{CanvasConfig, ConnectionId, GraphModel, HandleKind, Node, NodeId, NodeKind, Viewport};
use peniko::{Color, Fill};
use vello::Scene;

const BACKGROUND: Color = Color::from_rgb8(0xF8, 0xFA, 0xFC);
const GRID_DOT: Color = Color::from_rgb8(0xCB, 0xD5, 0xE1);
const CONNECTION: Color = Color::from_rgb8(0x94, 0xA3, 0xB8);
const ACCENT: Color = Color::from_rgb8(0x3B, 0x82, 0xF6);
const CARD: Color = Color::from_rgb8(0xFF, 0xFF, 0xFF);
const CARD_BORDER: Color = Color::from_rgb8(0xE2, 0xE8, 0xF0);
const HEADER: Color = Color::from_rgb8(0xF8, 0xFA, 0xFC);
const GRIP: Color = Color::from_rgb8(0x94, 0xA3, 0xB8);

/// What the painter needs beyond the graph itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasOverlay {
    pub selected_node: Option<NodeId>,
    pub selected_connection: Option<ConnectionId>,
    /// Start node, start handle, and cursor (world) of an in-progress link.
    pub pending_link: Option<(NodeId, HandleKind, Point)>,
}

/// Paint the whole canvas. Call once per frame with a cleared `Scene`.
pub fn paint_canvas(
    scene: &mut Scene,
    graph: &GraphModel,
    viewport: &Viewport,
    overlay: &CanvasOverlay,
    config: &CanvasConfig,
) {
    let screen = Rect::from_origin_size(Point::ZERO, viewport.size);
    scene.fill(Fill::NonZero, Affine::IDENTITY, BACKGROUND, None, &screen);
    paint_grid(scene, viewport, config);

    let world = Affine::translate(viewport.pan) * Affine::scale(viewport.zoom);

    for path in connection_paths(graph, overlay.selected_connection, config) {
        let color = if path.selected { ACCENT } else { CONNECTION };
        scene.stroke(&Stroke::new(path.visible_width), world, color, None, &path.curve);
    }

    if let Some((node, handle, cursor)) = overlay.pending_link
        && let Some(curve) = pending_curve(graph, node, handle, cursor, config)
    {
        let dashed = Stroke::new(config.connection_width).with_dashes(0.0, [5.0, 5.0]);
        scene.stroke(&dashed, world, ACCENT, None, &curve);
    }

    for node in graph.nodes() {
        if overlay.selected_node != Some(node.id) {
            paint_node(scene, node, world, false, config);
        }
    }
    // The selected card is raised above its neighbours.
    if let Some(node) = overlay.selected_node.and_then(|id| graph.node(id)) {
        paint_node(scene, node, world, true, config);
    }
}

fn paint_grid(scene: &mut Scene, viewport: &Viewport, config: &CanvasConfig) {
    let (spacing, offset) = viewport.grid(config);
    if spacing < 4.0 {
        return;
    }
    let start_x = offset.x.rem_euclid(spacing);
    let start_y = offset.y.rem_euclid(spacing);
    let mut y = start_y;
    while y < viewport.size.height {
        let mut x = start_x;
        while x < viewport.size.width {
            scene.fill(Fill::NonZero, Affine::IDENTITY, GRID_DOT, None, &Circle::new((x, y), 1.0));
            x += spacing;
        }
        y += spacing;
    }
}

fn paint_node(scene: &mut Scene, node: &Node, world: Affine, selected: bool, config: &CanvasConfig) {
    let bounds = node.bounds(config.fallback_node_size);
    let card = RoundedRect::from_rect(bounds, 8.0);
    scene.fill(Fill::NonZero, world, CARD, None, &card);

    let header = header_rect(node, config);
    scene.fill(Fill::NonZero, world, HEADER, None, &header);

    let dot = Circle::new((header.x0 + 18.0, header.center().y), 6.0);
    scene.fill(Fill::NonZero, world, kind_color(node.kind), None, &dot);

    let border = if selected { ACCENT } else { CARD_BORDER };
    scene.stroke(&Stroke::new(2.0), world, border, None, &card);

    log::trace!("PAINT node {} {:?} at ({}, {})", node.id, node.title, bounds.x0, bounds.y0);

    paint_resize_grip(scene, bounds, world);

    for handle in node.kind.handles() {
        let center = handle_position(node, handle, config);
        let circle = Circle::new(center, config.handle_radius);
        scene.fill(Fill::NonZero, world, CARD, None, &circle);
        scene.stroke(&Stroke::new(2.0), world, CONNECTION, None, &circle);
    }
}

fn paint_resize_grip(scene: &mut Scene, bounds: Rect, world: Affine) {
    let (x, y) = (bounds.x1 - 4.0, bounds.y1 - 4.0);
    let mut grip = BezPath::new();
    grip.move_to((x - 4.0, y));
    grip.line_to((x, y));
    grip.line_to((x, y - 4.0));
    grip.close_path();
    scene.fill(Fill::NonZero, world, GRIP, None, &grip);
}

fn kind_color(kind: NodeKind) -> Color {
    match kind {
        NodeKind::Input => Color::from_rgb8(0x22, 0xC5, 0x5E),
        NodeKind::Processor => ACCENT,
        NodeKind::Output => Color::from_rgb8(0xA8, 0x55, 0xF7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paints_pipeline_with_overlay() {
        let config = CanvasConfig::default();
        let graph = GraphModel::with_default_pipeline();
        let first = graph.connections().next().map(|c| c.id);
        let overlay = CanvasOverlay {
            selected_node: Some(NodeId::intern("2")),
            selected_connection: first,
            pending_link: Some((NodeId::intern("1"), HandleKind::Source, Point::new(700.0, 40.0))),
        };
        let mut scene = Scene::new();
        paint_canvas(&mut scene, &graph, &Viewport::default(), &overlay, &config);
    }
}
