//! Patch graph model: dense node sequence plus connection registry.
//!
//! [`PatchGraph`] holds topology only. It never talks to the engine; the
//! [`GraphEditor`](crate::GraphEditor) wraps it and mirrors every edit. Loading
//! a patch from disk goes straight into a `PatchGraph` because the engine opens
//! the same file on its own.

use std::collections::BTreeSet;

use crate::document::Element;
use crate::error::ValidationError;
use crate::node::{Node, NodeClass, NodeHandle};
use crate::socket::{Connection, ConnectionRegistry, Socket};

/// Canvas header written at the top of generated patches.
pub const CANVAS_HEADER: [&str; 5] = ["0", "50", "450", "300", "10"];

/// Nodes in canvas order and the connections between them.
#[derive(Debug, Clone, Default)]
pub struct PatchGraph {
    nodes: Vec<Node>,
    connections: ConnectionRegistry,
    next_handle: u32,
}

impl PatchGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node access ---

    /// Appends `node`, assigning it a fresh handle. Returns its index.
    pub fn push(&mut self, mut node: Node) -> usize {
        node.handle = NodeHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Node at `index`.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Node at `index`, or a validation error naming the range.
    pub fn expect_node(&self, index: usize) -> Result<&Node, ValidationError> {
        self.nodes.get(index).ok_or(ValidationError::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    /// Current index of the node carrying `handle`.
    pub fn index_of(&self, handle: NodeHandle) -> Option<usize> {
        self.nodes.iter().position(|n| n.handle == handle)
    }

    /// Iterates nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of lower-indexed nodes sharing the display name of `index`.
    ///
    /// This is how many times the engine's text search has to be repeated to
    /// land on this node.
    pub fn occurrence_of(&self, index: usize) -> usize {
        let Some(target) = self.nodes.get(index) else {
            return 0;
        };
        let name = target.display_name();
        self.nodes[..index]
            .iter()
            .filter(|n| n.display_name() == name)
            .count()
    }

    // --- Connection access ---

    /// The connection registry.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Returns true if `from` currently feeds `to`.
    pub fn has_connection(&self, from: Socket, to: Socket) -> bool {
        self.connections.contains(from, to)
    }

    /// Checks that a prospective connection has valid endpoints.
    pub fn check_link(&self, from: Socket, to: Socket) -> Result<(), ValidationError> {
        for socket in [from, to] {
            if socket.node >= self.nodes.len() {
                return Err(ValidationError::MissingNode {
                    socket,
                    len: self.nodes.len(),
                });
            }
        }
        if from.node == to.node {
            return Err(ValidationError::SelfConnection(from.node));
        }
        Ok(())
    }

    /// Stores a connection after validating it. Returns displaced connections.
    pub fn link(&mut self, from: Socket, to: Socket) -> Result<Vec<Connection>, ValidationError> {
        self.check_link(from, to)?;
        Ok(self.connections.insert(Connection::new(from, to)))
    }

    /// Removes a connection. Returns false if it was not stored.
    pub fn unlink(&mut self, from: Socket, to: Socket) -> bool {
        self.connections.remove(&Connection::new(from, to))
    }

    pub(crate) fn connections_mut(&mut self) -> &mut ConnectionRegistry {
        &mut self.connections
    }

    pub(crate) fn take_node(&mut self, index: usize) -> Node {
        self.nodes.remove(index)
    }

    // --- Composition ---

    /// Appends every node and connection of `other`, returning the index the
    /// first appended node landed on. Appended nodes get fresh handles.
    pub fn append(&mut self, other: PatchGraph) -> usize {
        let offset = self.nodes.len();
        let links: Vec<Connection> = other.connections.offset(offset).collect();
        for node in other.nodes {
            self.push(node);
        }
        for link in links {
            self.connections.insert(link);
        }
        offset
    }

    /// Moves every node by `(dx, dy)` on the canvas.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for node in &mut self.nodes {
            node.position.0 += dx;
            node.position.1 += dy;
        }
    }

    // --- Invariants ---

    /// Verifies every structural invariant.
    ///
    /// - every connection endpoint names an existing node
    /// - no node is connected to itself
    /// - node handles are unique
    pub fn validate(&self) -> Result<(), ValidationError> {
        for edge in self.connections.iter() {
            self.check_link(edge.from, edge.to)?;
        }
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if !seen.insert(node.handle) {
                return Err(ValidationError::DuplicateHandle(node.handle));
            }
        }
        Ok(())
    }

    // --- Serialization ---

    /// Renders the graph as patch statements: canvas header, boxes in index
    /// order, then connections.
    pub fn to_elements(&self) -> Vec<Element> {
        let mut elements = Vec::with_capacity(self.nodes.len() + self.connections.len() + 1);
        elements.push(Element::new("#N", "canvas", CANVAS_HEADER.map(String::from).to_vec()));
        for node in &self.nodes {
            // Subpatch contents are not modelled; an empty `pd` object stands in.
            let action = match node.class {
                NodeClass::Subpatch => NodeClass::Object.action(),
                other => other.action(),
            };
            let mut args = vec![node.position.0.to_string(), node.position.1.to_string()];
            args.extend(node.creation_atoms());
            elements.push(Element::new("#X", action, args));
        }
        for edge in self.connections.iter() {
            elements.push(Element::new(
                "#X",
                "connect",
                vec![
                    edge.from.node.to_string(),
                    edge.from.port.to_string(),
                    edge.to.node.to_string(),
                    edge.to.port.to_string(),
                ],
            ));
        }
        elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(kind: &str) -> Node {
        Node::object(kind, Vec::new(), (0, 0))
    }

    #[test]
    fn push_assigns_unique_handles() {
        let mut graph = PatchGraph::new();
        let a = graph.push(obj("adc~"));
        let b = graph.push(obj("dac~"));
        assert_eq!((a, b), (0, 1));
        assert_ne!(graph.node(a).unwrap().handle(), graph.node(b).unwrap().handle());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn occurrence_counts_prior_same_named_nodes() {
        let mut graph = PatchGraph::new();
        for kind in ["adc~", "gain", "dac~", "gain", "tgl", "gain"] {
            graph.push(obj(kind));
        }
        assert_eq!(graph.occurrence_of(1), 0);
        assert_eq!(graph.occurrence_of(3), 1);
        assert_eq!(graph.occurrence_of(5), 2);
        assert_eq!(graph.occurrence_of(4), 0);
        assert_eq!(graph.occurrence_of(99), 0);
    }

    #[test]
    fn link_rejects_missing_nodes_and_self_loops() {
        let mut graph = PatchGraph::new();
        graph.push(obj("a"));
        graph.push(obj("b"));

        assert_eq!(
            graph.link(Socket::new(0, 0), Socket::new(2, 0)),
            Err(ValidationError::MissingNode {
                socket: Socket::new(2, 0),
                len: 2
            })
        );
        assert_eq!(
            graph.link(Socket::new(1, 0), Socket::new(1, 1)),
            Err(ValidationError::SelfConnection(1))
        );
        assert!(graph.link(Socket::new(0, 0), Socket::new(1, 0)).unwrap().is_empty());
    }

    #[test]
    fn append_offsets_connections() {
        let mut left = PatchGraph::new();
        left.push(obj("adc~"));
        left.push(obj("dac~"));
        left.link(Socket::new(0, 0), Socket::new(1, 0)).unwrap();

        let right = left.clone();
        let offset = left.append(right);

        assert_eq!(offset, 2);
        assert_eq!(left.len(), 4);
        assert!(left.has_connection(Socket::new(2, 0), Socket::new(3, 0)));
        assert!(left.validate().is_ok());
    }

    #[test]
    fn to_elements_writes_boxes_then_connections() {
        let mut graph = PatchGraph::new();
        graph.push(Node::object("adc~", vec!["1".into()], (10, 10)));
        graph.push(Node::boxed(NodeClass::Subpatch, vec!["fx".into()], (10, 40)));
        graph.link(Socket::new(0, 0), Socket::new(1, 0)).unwrap();

        let lines: Vec<String> = graph.to_elements().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "#N canvas 0 50 450 300 10;",
                "#X obj 10 10 adc~ 1;",
                "#X obj 10 40 pd fx;",
                "#X connect 0 0 1 0;",
            ]
        );
    }
}
