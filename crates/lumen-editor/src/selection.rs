//! Single selection: one node, one connection, or nothing.

use lumen_core::{ConnectionId, GraphModel, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Connection(ConnectionId),
}

impl Selection {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Selection::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection(self) -> Option<ConnectionId> {
        match self {
            Selection::Connection(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    current: Selection,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.current
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.current.node()
    }

    pub fn selected_connection(&self) -> Option<ConnectionId> {
        self.current.connection()
    }

    /// Select a node, dropping any selected connection.
    pub fn select_node(&mut self, id: NodeId) {
        self.current = Selection::Node(id);
    }

    /// Select a connection, dropping any selected node.
    pub fn select_connection(&mut self, id: ConnectionId) {
        self.current = Selection::Connection(id);
    }

    pub fn clear(&mut self) {
        self.current = Selection::None;
    }

    /// Clear the selection and hand back what it held.
    pub fn take(&mut self) -> Selection {
        std::mem::take(&mut self.current)
    }

    /// Drop a selection whose target no longer exists.
    pub fn prune(&mut self, graph: &GraphModel) {
        let stale = match self.current {
            Selection::None => false,
            Selection::Node(id) => !graph.contains_node(id),
            Selection::Connection(id) => graph.connection(id).is_none(),
        };
        if stale {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_and_connection_are_exclusive() {
        let g = GraphModel::with_default_pipeline();
        let conn = g.connections().next().unwrap().id;
        let mut sel = SelectionManager::new();
        sel.select_node(NodeId::intern("1"));
        sel.select_connection(conn);
        assert_eq!(sel.selected_node(), None);
        assert_eq!(sel.selected_connection(), Some(conn));
        sel.select_node(NodeId::intern("2"));
        assert_eq!(sel.selected_connection(), None);
    }

    #[test]
    fn take_clears() {
        let mut sel = SelectionManager::new();
        sel.select_node(NodeId::intern("2"));
        assert_eq!(sel.take(), Selection::Node(NodeId::intern("2")));
        assert_eq!(sel.current(), Selection::None);
        assert_eq!(sel.take(), Selection::None);
    }

    #[test]
    fn prune_drops_cascaded_connection() {
        let mut g = GraphModel::with_default_pipeline();
        let conn = g.incoming(NodeId::intern("3")).unwrap().id;
        let mut sel = SelectionManager::new();
        sel.select_connection(conn);
        g.delete_node(NodeId::intern("3"));
        sel.prune(&g);
        assert_eq!(sel.current(), Selection::None);
    }
}
