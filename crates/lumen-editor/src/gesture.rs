//! Node drag and resize gestures.
//!
//! A gesture starts on pointer-down over a node's header or resize corner
//! and ends on release. Moves in between are coalesced through a
//! [`FrameGate`] so the graph sees at most one position or size update per
//! animation frame, always from the newest pointer sample.
//!
//! While a gesture is active the host must route pointer moves and
//! releases to the canvas even when they happen outside it (window-level
//! listeners); [`NodeGestureController::is_active`] tells it when.

use crate::frame::FrameGate;
use lumen_core::{CanvasConfig, GraphModel, Node, NodeId, Point, Size, Vec2, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        node: NodeId,
        /// Pointer minus the node's on-screen top-left at grab time.
        grab_offset: Vec2,
    },
    Resizing {
        node: NodeId,
        initial: Size,
        pointer_at_start: Point,
    },
}

#[derive(Debug, Clone, Default)]
pub struct NodeGestureController {
    state: GestureState,
    gate: FrameGate<Point>,
}

impl NodeGestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// A drag or resize is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    pub fn active_node(&self) -> Option<NodeId> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Dragging { node, .. } | GestureState::Resizing { node, .. } => Some(node),
        }
    }

    /// A sample is waiting for the next frame.
    pub fn frame_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Grab `node` by its header. The offset keeps the node from jumping
    /// under the pointer.
    pub fn begin_drag(&mut self, node: &Node, pointer: Point, viewport: &Viewport) {
        self.gate.cancel();
        let grab_offset = pointer - viewport.world_to_screen(node.position);
        self.state = GestureState::Dragging {
            node: node.id,
            grab_offset,
        };
        log::debug!("drag start {}", node.id);
    }

    /// Grab `node` by its resize corner.
    pub fn begin_resize(&mut self, node: &Node, pointer: Point, config: &CanvasConfig) {
        self.gate.cancel();
        self.state = GestureState::Resizing {
            node: node.id,
            initial: node.effective_size(config.fallback_node_size),
            pointer_at_start: pointer,
        };
        log::debug!("resize start {}", node.id);
    }

    /// Record a pointer sample. Returns `true` when the host should request
    /// an animation frame. Ignored while idle.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        if !self.is_active() {
            return false;
        }
        self.gate.submit(pointer)
    }

    /// Apply the newest sample, if any. Returns `true` if the graph changed.
    pub fn on_frame(&mut self, graph: &mut GraphModel, viewport: &Viewport, config: &CanvasConfig) -> bool {
        match self.gate.take() {
            Some(pointer) => self.apply(pointer, graph, viewport, config),
            None => false,
        }
    }

    /// End the gesture. A sample still waiting for its frame is applied
    /// first so the final pointer position is never lost.
    pub fn release(&mut self, graph: &mut GraphModel, viewport: &Viewport, config: &CanvasConfig) -> bool {
        let changed = self.on_frame(graph, viewport, config);
        if let Some(node) = self.active_node() {
            log::debug!("gesture end {node}");
        }
        self.state = GestureState::Idle;
        changed
    }

    /// Abort without applying the waiting sample.
    pub fn cancel(&mut self) {
        self.gate.cancel();
        self.state = GestureState::Idle;
    }

    fn apply(&self, pointer: Point, graph: &mut GraphModel, viewport: &Viewport, config: &CanvasConfig) -> bool {
        match self.state {
            GestureState::Idle => false,
            GestureState::Dragging { node, grab_offset } => {
                let world = viewport.screen_to_world(pointer - grab_offset);
                graph.move_node(node, world)
            }
            GestureState::Resizing {
                node,
                initial,
                pointer_at_start,
            } => {
                let delta = viewport.screen_delta_to_world(pointer - pointer_at_start);
                let min = config.min_node_size;
                let size = Size::new(
                    (initial.width + delta.x).max(min.width),
                    (initial.height + delta.y).max(min.height),
                );
                graph.resize_node(node, size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::NodeKind;
    use pretty_assertions::assert_eq;

    fn setup() -> (GraphModel, NodeId) {
        let mut g = GraphModel::new();
        let id = g.add_node(NodeKind::Processor, Point::new(100.0, 100.0));
        (g, id)
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport::default();
        let mut ctl = NodeGestureController::new();
        ctl.begin_drag(g.node(id).unwrap(), Point::new(120.0, 110.0), &vp);
        assert!(ctl.pointer_move(Point::new(220.0, 160.0)));
        assert!(ctl.on_frame(&mut g, &vp, &config));
        assert_eq!(g.node(id).unwrap().position, Point::new(200.0, 150.0));
    }

    #[test]
    fn drag_under_zoom_and_pan() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport {
            pan: Vec2::new(50.0, -20.0),
            zoom: 2.0,
            ..Viewport::default()
        };
        let mut ctl = NodeGestureController::new();
        // Node top-left on screen: (250, 180).
        ctl.begin_drag(g.node(id).unwrap(), Point::new(260.0, 190.0), &vp);
        ctl.pointer_move(Point::new(360.0, 190.0));
        ctl.release(&mut g, &vp, &config);
        assert_eq!(g.node(id).unwrap().position, Point::new(150.0, 100.0));
    }

    #[test]
    fn one_update_per_frame_with_latest_sample() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport::default();
        let mut ctl = NodeGestureController::new();
        ctl.begin_drag(g.node(id).unwrap(), Point::new(100.0, 100.0), &vp);
        assert!(ctl.pointer_move(Point::new(110.0, 100.0)));
        assert!(!ctl.pointer_move(Point::new(120.0, 100.0)));
        assert!(!ctl.pointer_move(Point::new(130.0, 100.0)));
        // Nothing applied before the frame.
        assert_eq!(g.node(id).unwrap().position, Point::new(100.0, 100.0));
        assert!(ctl.on_frame(&mut g, &vp, &config));
        assert_eq!(g.node(id).unwrap().position, Point::new(130.0, 100.0));
        assert!(!ctl.on_frame(&mut g, &vp, &config));
    }

    #[test]
    fn release_flushes_pending_sample() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport::default();
        let mut ctl = NodeGestureController::new();
        ctl.begin_drag(g.node(id).unwrap(), Point::new(100.0, 100.0), &vp);
        ctl.pointer_move(Point::new(140.0, 180.0));
        assert!(ctl.release(&mut g, &vp, &config));
        assert_eq!(g.node(id).unwrap().position, Point::new(140.0, 180.0));
        assert!(!ctl.is_active());
        assert!(!ctl.frame_pending());
        // Moves after release are ignored.
        assert!(!ctl.pointer_move(Point::new(0.0, 0.0)));
    }

    #[test]
    fn resize_clamps_to_minimum() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport::default();
        let mut ctl = NodeGestureController::new();
        // Processor default size is 400 x 450.
        ctl.begin_resize(g.node(id).unwrap(), Point::new(500.0, 550.0), &config);
        ctl.pointer_move(Point::new(100.0, 100.0));
        ctl.on_frame(&mut g, &vp, &config);
        assert_eq!(g.node(id).unwrap().size, Some(Size::new(280.0, 200.0)));
    }

    #[test]
    fn resize_scales_by_zoom() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport {
            zoom: 2.0,
            ..Viewport::default()
        };
        let mut ctl = NodeGestureController::new();
        ctl.begin_resize(g.node(id).unwrap(), Point::new(0.0, 0.0), &config);
        ctl.pointer_move(Point::new(100.0, 40.0));
        ctl.release(&mut g, &vp, &config);
        assert_eq!(g.node(id).unwrap().size, Some(Size::new(450.0, 470.0)));
        assert_eq!(g.node(id).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn deleted_node_mid_drag_is_noop() {
        let config = CanvasConfig::default();
        let (mut g, id) = setup();
        let vp = Viewport::default();
        let mut ctl = NodeGestureController::new();
        ctl.begin_drag(g.node(id).unwrap(), Point::new(100.0, 100.0), &vp);
        g.delete_node(id);
        ctl.pointer_move(Point::new(300.0, 300.0));
        assert!(!ctl.release(&mut g, &vp, &config));
        assert_eq!(g.node_count(), 0);
    }
}
