//! Link creation: pending-link drag, commit/cancel rules, quick-add menu.
//!
//! ```text
//! Idle ──begin──▶ PendingLink ──release on compatible handle──▶ Idle (+connection)
//!                      │      ──release on self / same type───▶ Idle
//!                      └──────release off any handle────────▶ QuickAddMenuOpen
//! QuickAddMenuOpen ──choose(kind)──▶ Idle (+node, +connection)
//!                  ──dismiss───────▶ Idle
//! ```

use lumen_core::{ConnectionId, GraphModel, HandleKind, NodeId, NodeKind, Point, Viewport};
use smallvec::SmallVec;

/// A link being dragged out of a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLink {
    pub start_node: NodeId,
    pub start_handle: HandleKind,
    /// Cursor in world units, for the provisional curve.
    pub cursor: Point,
}

/// The menu offered when a link is dropped on empty canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuickAddMenu {
    pub source_node: NodeId,
    pub source_handle: HandleKind,
    /// Release point in screen pixels.
    pub anchor: Point,
}

impl QuickAddMenu {
    /// Kinds offering the handle opposite to the retained one.
    pub fn choices(&self) -> SmallVec<[NodeKind; 3]> {
        let wanted = self.source_handle.opposite();
        NodeKind::ALL
            .into_iter()
            .filter(|kind| kind.has_handle(wanted))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LinkInteraction {
    #[default]
    Idle,
    PendingLink(PendingLink),
    QuickAddMenuOpen(QuickAddMenu),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SelfLoop,
    SameHandleType,
    /// An endpoint vanished while the link was being dragged.
    MissingNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Committed(ConnectionId),
    Rejected(RejectReason),
    MenuOpened,
    NodeAdded {
        node: NodeId,
        connection: Option<ConnectionId>,
    },
    Dismissed,
    /// The event did not apply to the current state.
    Ignored,
}

impl LinkInteraction {
    pub fn pending(&self) -> Option<&PendingLink> {
        match self {
            LinkInteraction::PendingLink(link) => Some(link),
            _ => None,
        }
    }

    pub fn menu(&self) -> Option<&QuickAddMenu> {
        match self {
            LinkInteraction::QuickAddMenuOpen(menu) => Some(menu),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LinkInteraction::Idle)
    }

    /// Pointer-down on a handle. Replaces an open menu.
    pub fn begin(&mut self, node: NodeId, handle: HandleKind, cursor: Point) {
        log::debug!("link start {node}:{}", handle.as_str());
        *self = LinkInteraction::PendingLink(PendingLink {
            start_node: node,
            start_handle: handle,
            cursor,
        });
    }

    /// Track the cursor. Returns `true` if a pending link moved.
    pub fn pointer_move(&mut self, cursor: Point) -> bool {
        match self {
            LinkInteraction::PendingLink(link) => {
                link.cursor = cursor;
                true
            }
            _ => false,
        }
    }

    /// Pointer-up over a handle.
    pub fn release_on_handle(
        &mut self,
        end_node: NodeId,
        end_handle: HandleKind,
        graph: &mut GraphModel,
    ) -> LinkOutcome {
        let LinkInteraction::PendingLink(link) = *self else {
            return LinkOutcome::Ignored;
        };
        *self = LinkInteraction::Idle;

        if end_node == link.start_node {
            log::debug!("link cancelled: self loop on {end_node}");
            return LinkOutcome::Rejected(RejectReason::SelfLoop);
        }
        if end_handle == link.start_handle {
            log::debug!("link cancelled: {} to {}", end_handle.as_str(), end_handle.as_str());
            return LinkOutcome::Rejected(RejectReason::SameHandleType);
        }

        let (from, to) = match link.start_handle {
            HandleKind::Source => (link.start_node, end_node),
            HandleKind::Target => (end_node, link.start_node),
        };
        match graph.add_connection(from, to) {
            Some(id) => LinkOutcome::Committed(id),
            None => LinkOutcome::Rejected(RejectReason::MissingNode),
        }
    }

    /// Pointer-up anywhere without a handle under it: open the quick-add
    /// menu at `screen`.
    pub fn release_on_canvas(&mut self, screen: Point) -> LinkOutcome {
        let LinkInteraction::PendingLink(link) = *self else {
            return LinkOutcome::Ignored;
        };
        log::debug!("quick-add menu at ({:.0}, {:.0}) for {}", screen.x, screen.y, link.start_node);
        *self = LinkInteraction::QuickAddMenuOpen(QuickAddMenu {
            source_node: link.start_node,
            source_handle: link.start_handle,
            anchor: screen,
        });
        LinkOutcome::MenuOpened
    }

    /// Pick `kind` from the open menu: add the node at the menu anchor and
    /// wire it to the retained handle.
    pub fn choose(&mut self, kind: NodeKind, graph: &mut GraphModel, viewport: &Viewport) -> LinkOutcome {
        let LinkInteraction::QuickAddMenuOpen(menu) = *self else {
            return LinkOutcome::Ignored;
        };
        *self = LinkInteraction::Idle;
        if !graph.contains_node(menu.source_node) {
            return LinkOutcome::Rejected(RejectReason::MissingNode);
        }

        let node = graph.add_node(kind, viewport.screen_to_world(menu.anchor));
        let connection = match menu.source_handle {
            HandleKind::Source => graph.add_connection(menu.source_node, node),
            HandleKind::Target => graph.add_connection(node, menu.source_node),
        };
        LinkOutcome::NodeAdded { node, connection }
    }

    /// Close the menu or abandon a pending link. Never touches the graph.
    pub fn dismiss(&mut self) -> LinkOutcome {
        if self.is_idle() {
            return LinkOutcome::Ignored;
        }
        log::debug!("link interaction dismissed");
        *self = LinkInteraction::Idle;
        LinkOutcome::Dismissed
    }
}
