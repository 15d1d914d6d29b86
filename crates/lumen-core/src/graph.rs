//! The node graph and the mutations that keep it consistent.
//!
//! Nodes are graph vertices and connections are directed edges
//! (`from → to`), stored in a `StableDiGraph` so indices survive removals.
//! Invariants upheld by every mutation:
//!
//! - no connection has `from == to`;
//! - every connection references two live nodes (deleting a node removes
//!   its connections in the same call);
//! - at most one connection targets a given node; a new one replaces it.
//!
//! Sources may fan out to any number of targets.
//!
//! All operations are total: unknown ids are ignored and reported through
//! the return value, never as an error.

use crate::id::{ConnectionId, NodeId};
use crate::model::*;
use kurbo::{Point, Size};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    pub graph: StableDiGraph<Node, Connection>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<ConnectionId, EdgeIndex>,
    /// Insertion order, used as paint order (last = topmost).
    order: Vec<NodeId>,
}

impl GraphModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter pipeline: source image → processor → final render.
    pub fn with_default_pipeline() -> Self {
        let mut model = Self::new();
        let input = model.insert_node(
            Node::new(NodeId::intern("1"), NodeKind::Input, Point::new(50.0, 150.0))
                .with_size(Size::new(320.0, 350.0)),
        );
        let processor = model.insert_node(
            Node::new(NodeId::intern("2"), NodeKind::Processor, Point::new(450.0, 150.0))
                .with_size(Size::new(400.0, 500.0)),
        );
        let output = model.insert_node(
            Node::new(NodeId::intern("3"), NodeKind::Output, Point::new(950.0, 150.0))
                .with_size(Size::new(320.0, 350.0))
                .with_title("Final Render"),
        );
        model.insert_connection(ConnectionId::intern("c1"), input, processor);
        model.insert_connection(ConnectionId::intern("c2"), processor, output);
        model
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Add a node of `kind` at `position` with the per-kind defaults.
    /// Returns the freshly generated id.
    pub fn add_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let mut id = NodeId::fresh();
        while self.node_index.contains_key(&id) {
            id = NodeId::fresh();
        }
        self.insert_node(Node::new(id, kind, position))
    }

    /// Insert a fully built node. An existing node with the same id is
    /// left untouched.
    pub fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        if self.node_index.contains_key(&id) {
            log::warn!("insert_node: {id} already exists");
            return id;
        }
        log::debug!("add {} node {id} at ({:.1}, {:.1})", node.kind.as_str(), node.position.x, node.position.y);
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        self.order.push(id);
        id
    }

    /// Replace a node's position. Size, title, and payload are untouched.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Replace a node's size only.
    pub fn resize_node(&mut self, id: NodeId, size: Size) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Remove a node together with every connection touching it.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.node_index.remove(&id) else {
            return false;
        };
        let incident: Vec<ConnectionId> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .chain(self.graph.edges_directed(idx, Direction::Outgoing))
            .map(|e| e.weight().id)
            .collect();
        for conn in &incident {
            self.edge_index.remove(conn);
        }
        // Removing the vertex drops its edges with it.
        self.graph.remove_node(idx);
        self.order.retain(|n| *n != id);
        log::debug!("delete node {id} (+{} connections)", incident.len());
        true
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.title = title.into();
                true
            }
            None => false,
        }
    }

    /// Merge a single payload entry into a node.
    pub fn update_payload(&mut self, id: NodeId, key: &str, value: PayloadValue) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.payload.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Store an image the node produced (upload result or transform output).
    pub fn set_image(&mut self, id: NodeId, image: ImageRef) -> bool {
        self.update_payload(id, OUTPUT_IMAGE, PayloadValue::Image(image))
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Connect `from → to`, replacing whatever currently targets `to`.
    ///
    /// Handle-type compatibility is the caller's concern. Self loops and
    /// unknown endpoints are refused (`None`) so the graph never holds a
    /// dangling or looping connection.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Option<ConnectionId> {
        let mut id = ConnectionId::fresh();
        while self.edge_index.contains_key(&id) {
            id = ConnectionId::fresh();
        }
        self.insert_connection(id, from, to)
    }

    fn insert_connection(&mut self, id: ConnectionId, from: NodeId, to: NodeId) -> Option<ConnectionId> {
        if from == to {
            log::debug!("refuse self connection on {from}");
            return None;
        }
        let (Some(&a), Some(&b)) = (self.node_index.get(&from), self.node_index.get(&to)) else {
            log::debug!("refuse connection {from} -> {to}: unknown endpoint");
            return None;
        };

        let replaced: Vec<EdgeIndex> = self
            .graph
            .edges_directed(b, Direction::Incoming)
            .map(|e| e.id())
            .collect();
        for edge in replaced {
            if let Some(old) = self.graph.remove_edge(edge) {
                self.edge_index.remove(&old.id);
                log::debug!("replace connection {} ({} -> {to})", old.id, old.from);
            }
        }

        let edge = self.graph.add_edge(a, b, Connection { id, from, to });
        self.edge_index.insert(id, edge);
        log::debug!("connect {from} -> {to} as {id}");
        Some(id)
    }

    /// Remove a single connection. Its endpoints are untouched.
    pub fn delete_connection(&mut self, id: ConnectionId) -> bool {
        let Some(edge) = self.edge_index.remove(&id) else {
            return false;
        };
        self.graph.remove_edge(edge);
        log::debug!("delete connection {id}");
        true
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.node_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Nodes in paint order (bottom first).
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.order.iter().filter_map(|id| self.node(*id))
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edge_index
            .get(&id)
            .and_then(|edge| self.graph.edge_weight(*edge))
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.graph.edge_indices().filter_map(|e| self.graph.edge_weight(e))
    }

    pub fn connection_count(&self) -> usize {
        self.edge_index.len()
    }

    /// The single connection feeding `to`, if any.
    pub fn incoming(&self, to: NodeId) -> Option<&Connection> {
        let idx = *self.node_index.get(&to)?;
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.weight())
    }

    pub fn outgoing(&self, from: NodeId) -> Vec<&Connection> {
        match self.node_index.get(&from) {
            Some(idx) => self
                .graph
                .edges_directed(*idx, Direction::Outgoing)
                .map(|e| e.weight())
                .collect(),
            None => Vec::new(),
        }
    }

    /// The image produced by whatever feeds `id`: what a processor edits
    /// and what an output displays.
    pub fn upstream_image(&self, id: NodeId) -> Option<&ImageRef> {
        let conn = self.incoming(id)?;
        self.node(conn.from)?.output_image()
    }
}
