//! The canvas viewport controller.
//!
//! Owns the graph, the pan/zoom state and every interaction state machine,
//! and routes normalized input to them through hit testing. Hosts feed it
//! [`InputEvent`]s, call [`CanvasController::tick`] once per animation
//! frame, and read it back through [`CanvasController::overlay`] and the
//! public fields to paint.

use crate::gesture::{GestureState, NodeGestureController};
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::link::{LinkInteraction, LinkOutcome, QuickAddMenu};
use crate::selection::{Selection, SelectionManager};
use crate::shortcuts::{ShortcutAction, ShortcutMap, ZOOM_STEP};
use crate::transform::{TransformError, TransformFailure, TransformOptions, TransformSlot, TransformTicket};
use lumen_core::{
    CanvasConfig, ConnectionId, GraphModel, ImageRef, NodeId, NodeKind, Point, Size, Vec2, Viewport,
};
use lumen_render::{CanvasHit, CanvasOverlay, hit_test};

/// An in-progress pan of empty canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanGesture {
    pan_at_start: Vec2,
    pointer_at_start: Point,
}

#[derive(Debug, Clone)]
pub struct CanvasController {
    pub graph: GraphModel,
    pub viewport: Viewport,
    pub config: CanvasConfig,
    gestures: NodeGestureController,
    link: LinkInteraction,
    selection: SelectionManager,
    pan: Option<PanGesture>,
    transforms: TransformSlot,
    preview: Option<ImageRef>,
    last_link_outcome: Option<LinkOutcome>,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(GraphModel::with_default_pipeline(), Viewport::default(), CanvasConfig::default())
    }
}

impl CanvasController {
    pub fn new(graph: GraphModel, viewport: Viewport, config: CanvasConfig) -> Self {
        Self {
            graph,
            viewport,
            config,
            gestures: NodeGestureController::new(),
            link: LinkInteraction::Idle,
            selection: SelectionManager::new(),
            pan: None,
            transforms: TransformSlot::new(),
            preview: None,
            last_link_outcome: None,
        }
    }

    // ─── Read side ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn link_state(&self) -> &LinkInteraction {
        &self.link
    }

    pub fn quick_add_menu(&self) -> Option<&QuickAddMenu> {
        self.link.menu()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    /// Outcome of the most recent link release, choice, or dismissal.
    pub fn last_link_outcome(&self) -> Option<LinkOutcome> {
        self.last_link_outcome
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Pointer moves and releases must reach the controller even outside
    /// the canvas surface.
    pub fn captures_pointer(&self) -> bool {
        self.gestures.is_active() || self.pan.is_some() || self.link.pending().is_some()
    }

    /// A coalesced gesture sample is waiting for [`tick`](Self::tick).
    pub fn needs_frame(&self) -> bool {
        self.gestures.frame_pending()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.viewport.zoom_percent()
    }

    pub fn overlay(&self) -> CanvasOverlay {
        CanvasOverlay {
            selected_node: self.selection.selected_node(),
            selected_connection: self.selection.selected_connection(),
            pending_link: self
                .link
                .pending()
                .map(|p| (p.start_node, p.start_handle, p.cursor)),
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Dispatch one event. Returns `true` if anything visible changed or a
    /// frame should be requested.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, button, .. } => self.pointer_down(Point::new(*x, *y), *button),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(Point::new(*x, *y)),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::Wheel { x, y, delta_y } => {
                self.viewport.wheel(Point::new(*x, *y), *delta_y, &self.config)
            }
            InputEvent::Key {
                key,
                modifiers,
                in_text_field,
            } => self.key(key, *modifiers, *in_text_field),
        }
    }

    /// Apply the coalesced gesture sample for this frame.
    pub fn tick(&mut self) -> bool {
        self.gestures.on_frame(&mut self.graph, &self.viewport, &self.config)
    }

    fn pointer_down(&mut self, screen: Point, button: PointerButton) -> bool {
        if self.gestures.is_active() || self.pan.is_some() {
            return false;
        }
        let mut changed = false;
        if self.link.menu().is_some() {
            self.last_link_outcome = Some(self.link.dismiss());
            changed = true;
        }

        let hit = hit_test(&self.graph, &self.viewport, screen, &self.config);
        log::trace!("pointer down {hit:?}");
        if button != PointerButton::Primary {
            if hit == CanvasHit::Empty && self.selection.current() != Selection::None {
                self.selection.clear();
                return true;
            }
            return changed;
        }

        match hit {
            CanvasHit::Handle { node, handle } => {
                let world = self.viewport.screen_to_world(screen);
                self.link.begin(node, handle, world);
            }
            CanvasHit::ResizeCorner(id) => {
                self.selection.select_node(id);
                if let Some(node) = self.graph.node(id) {
                    self.gestures.begin_resize(node, screen, &self.config);
                }
            }
            CanvasHit::Header(id) => {
                self.selection.select_node(id);
                if let Some(node) = self.graph.node(id) {
                    self.gestures.begin_drag(node, screen, &self.viewport);
                }
            }
            CanvasHit::Body(id) => self.selection.select_node(id),
            CanvasHit::Connection(id) => self.selection.select_connection(id),
            CanvasHit::Empty => {
                self.selection.clear();
                self.pan = Some(PanGesture {
                    pan_at_start: self.viewport.pan,
                    pointer_at_start: screen,
                });
            }
        }
        true
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        let mut changed = self.gestures.pointer_move(screen);
        if let Some(pan) = self.pan {
            self.viewport.pan_from(pan.pan_at_start, pan.pointer_at_start, screen);
            changed = true;
        }
        let world = self.viewport.screen_to_world(screen);
        changed |= self.link.pointer_move(world);
        changed
    }

    fn pointer_up(&mut self, screen: Point) -> bool {
        let mut changed = false;
        if self.gestures.is_active() {
            changed |= self.gestures.release(&mut self.graph, &self.viewport, &self.config);
        }
        if self.pan.take().is_some() {
            changed = true;
        }
        if self.link.pending().is_some() {
            let outcome = match hit_test(&self.graph, &self.viewport, screen, &self.config) {
                CanvasHit::Handle { node, handle } => self.link.release_on_handle(node, handle, &mut self.graph),
                _ => self.link.release_on_canvas(screen),
            };
            log::debug!("link release: {outcome:?}");
            self.last_link_outcome = Some(outcome);
            changed = true;
        }
        changed
    }

    fn pointer_leave(&mut self) -> bool {
        let mut changed = false;
        if self.gestures.is_active() {
            self.gestures.release(&mut self.graph, &self.viewport, &self.config);
            changed = true;
        }
        if self.pan.take().is_some() {
            changed = true;
        }
        if self.link.pending().is_some() {
            self.last_link_outcome = Some(self.link.dismiss());
            changed = true;
        }
        changed
    }

    fn key(&mut self, key: &str, modifiers: Modifiers, in_text_field: bool) -> bool {
        if in_text_field {
            return false;
        }
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        log::debug!("shortcut {action:?}");
        match action {
            ShortcutAction::Delete => match self.selection.take() {
                Selection::None => false,
                Selection::Node(id) => self.delete_node(id),
                Selection::Connection(id) => self.delete_connection(id),
            },
            ShortcutAction::Cancel => self.cancel(),
            ShortcutAction::ZoomIn => self.zoom_by(ZOOM_STEP),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / ZOOM_STEP),
            ShortcutAction::ZoomReset => {
                let center = self.viewport.center();
                self.viewport.zoom_at(center, 1.0, &self.config)
            }
        }
    }

    /// Escape: close the preview, then the menu or pending link, then the
    /// selection; one layer per press.
    fn cancel(&mut self) -> bool {
        if self.preview.take().is_some() {
            return true;
        }
        if !self.link.is_idle() {
            self.last_link_outcome = Some(self.link.dismiss());
            return true;
        }
        if self.selection.current() != Selection::None {
            self.selection.clear();
            return true;
        }
        false
    }

    fn zoom_by(&mut self, factor: f64) -> bool {
        let center = self.viewport.center();
        let proposed = self.viewport.zoom * factor;
        self.viewport.zoom_at(center, proposed, &self.config)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Add a node. Without a position it lands under the configured
    /// screen anchor.
    pub fn add_node(&mut self, kind: NodeKind, position: Option<Point>) -> NodeId {
        let position = position.unwrap_or_else(|| self.viewport.spawn_point(&self.config));
        self.graph.add_node(kind, position)
    }

    /// Close button on a node card.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        if !self.graph.delete_node(id) {
            return false;
        }
        if self.gestures.active_node() == Some(id) {
            self.gestures.cancel();
        }
        let stranded = match self.link {
            LinkInteraction::PendingLink(p) => p.start_node == id,
            LinkInteraction::QuickAddMenuOpen(m) => m.source_node == id,
            LinkInteraction::Idle => false,
        };
        if stranded {
            self.link.dismiss();
        }
        self.selection.prune(&self.graph);
        true
    }

    /// Delete badge on a selected connection.
    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let changed = self.graph.delete_connection(id);
        self.selection.prune(&self.graph);
        changed
    }

    pub fn select_node(&mut self, id: NodeId) -> bool {
        if !self.graph.contains_node(id) {
            return false;
        }
        self.selection.select_node(id);
        true
    }

    pub fn select_connection(&mut self, id: ConnectionId) -> bool {
        if self.graph.connection(id).is_none() {
            return false;
        }
        self.selection.select_connection(id);
        true
    }

    pub fn choose_quick_add(&mut self, kind: NodeKind) -> LinkOutcome {
        let outcome = self.link.choose(kind, &mut self.graph, &self.viewport);
        self.last_link_outcome = Some(outcome);
        outcome
    }

    pub fn dismiss_quick_add(&mut self) -> bool {
        if self.link.menu().is_none() {
            return false;
        }
        self.last_link_outcome = Some(self.link.dismiss());
        true
    }

    /// Store an uploaded image as the node's output.
    pub fn attach_image(&mut self, id: NodeId, image: ImageRef) -> bool {
        self.graph.set_image(id, image)
    }

    pub fn resize_surface(&mut self, size: Size) {
        self.viewport.size = size;
    }

    pub fn open_preview(&mut self, image: ImageRef) {
        self.preview = Some(image);
    }

    pub fn close_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    pub fn preview(&self) -> Option<&ImageRef> {
        self.preview.as_ref()
    }

    // ─── Transforms ──────────────────────────────────────────────────────

    pub fn is_busy(&self) -> bool {
        self.transforms.is_busy()
    }

    pub fn begin_transform(
        &mut self,
        node: NodeId,
        options: TransformOptions,
    ) -> Result<TransformTicket, TransformError> {
        self.transforms.begin(&self.graph, node, options).inspect_err(|err| {
            log::warn!("transform on {node} refused: {err}");
        })
    }

    pub fn complete_transform(
        &mut self,
        ticket: TransformTicket,
        result: Result<ImageRef, TransformFailure>,
    ) -> Result<bool, TransformError> {
        self.transforms.complete(&mut self.graph, ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_canvas_pans_and_clears_selection() {
        let mut c = CanvasController::new(GraphModel::new(), Viewport::default(), CanvasConfig::default());
        let id = c.add_node(NodeKind::Input, Some(Point::new(0.0, 0.0)));
        c.select_node(id);
        assert!(c.handle(&InputEvent::pointer_down(600.0, 500.0)));
        assert_eq!(c.selection(), Selection::None);
        assert!(c.captures_pointer());
        c.handle(&InputEvent::pointer_move(650.0, 480.0));
        assert_eq!(c.viewport.pan, Vec2::new(50.0, -20.0));
        c.handle(&InputEvent::pointer_up(650.0, 480.0));
        assert!(!c.captures_pointer());
    }

    #[test]
    fn spawn_point_used_without_position() {
        let mut c = CanvasController::default();
        c.viewport.pan = Vec2::new(100.0, 100.0);
        let id = c.add_node(NodeKind::Output, None);
        assert_eq!(c.graph.node(id).unwrap().position, Point::new(300.0, 200.0));
    }

    #[test]
    fn keys_in_text_field_are_ignored() {
        let mut c = CanvasController::default();
        let conn = c.graph.connections().next().unwrap().id;
        c.select_connection(conn);
        let typing = InputEvent::Key {
            key: "Backspace".to_string(),
            modifiers: Modifiers::NONE,
            in_text_field: true,
        };
        assert!(!c.handle(&typing));
        assert_eq!(c.graph.connection_count(), 2);
    }

    #[test]
    fn keyboard_zoom_around_center() {
        let mut c = CanvasController::default();
        let center = c.viewport.center();
        let before = c.viewport.screen_to_world(center);
        let cmd = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        c.handle(&InputEvent::Key {
            key: "=".to_string(),
            modifiers: cmd,
            in_text_field: false,
        });
        assert_eq!(c.zoom_percent(), 120);
        let after = c.viewport.screen_to_world(center);
        assert!((before - after).hypot() < 1e-9);
        c.handle(&InputEvent::Key {
            key: "0".to_string(),
            modifiers: cmd,
            in_text_field: false,
        });
        assert_eq!(c.viewport.zoom, 1.0);
    }

    #[test]
    fn escape_peels_one_layer() {
        let mut c = CanvasController::default();
        c.select_node(NodeId::intern("1"));
        c.open_preview(ImageRef::new("data:image/png;base64,AA"));
        assert!(c.handle(&InputEvent::key("Escape")));
        assert!(c.preview().is_none());
        assert_eq!(c.selection(), Selection::Node(NodeId::intern("1")));
        assert!(c.handle(&InputEvent::key("Escape")));
        assert_eq!(c.selection(), Selection::None);
        assert!(!c.handle(&InputEvent::key("Escape")));
    }

    #[test]
    fn close_button_clears_dependent_state() {
        let mut c = CanvasController::default();
        let conn = c.graph.incoming(NodeId::intern("2")).unwrap().id;
        c.select_connection(conn);
        assert!(c.delete_node(NodeId::intern("2")));
        assert_eq!(c.selection(), Selection::None);
        assert_eq!(c.graph.connection_count(), 0);
        assert!(!c.delete_node(NodeId::intern("2")));
    }
}
