//! Port addresses and the connection registry.
//!
//! A [`Socket`] names one port on one node by position. Connections are kept in
//! a single ordered edge set; the per-node inlet and outlet maps that a patch
//! editor works with are derived views over that set, so the two directions of
//! a link can never disagree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A port address: `(node index, port position)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Socket {
    /// Dense node index in the graph.
    pub node: usize,
    /// Zero-based inlet or outlet position on that node.
    pub port: usize,
}

impl Socket {
    /// Creates a socket for `port` on `node`.
    #[inline]
    pub const fn new(node: usize, port: usize) -> Self {
        Self { node, port }
    }

    /// Returns the socket as it reads after the node at `removed` is taken out
    /// of the sequence.
    #[inline]
    pub(crate) fn shifted_past(self, removed: usize) -> Self {
        if self.node > removed {
            Self::new(self.node - 1, self.port)
        } else {
            self
        }
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

/// A directed link from an outlet to an inlet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Connection {
    /// Upstream outlet.
    pub from: Socket,
    /// Downstream inlet.
    pub to: Socket,
}

impl Connection {
    /// Creates a connection from `from` to `to`.
    #[inline]
    pub const fn new(from: Socket, to: Socket) -> Self {
        Self { from, to }
    }

    /// Returns true if either end lies on `node`.
    #[inline]
    pub fn touches(&self, node: usize) -> bool {
        self.from.node == node || self.to.node == node
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Single source of truth for every connection in a graph.
///
/// Each outlet feeds at most one inlet and each inlet is fed by at most one
/// outlet. Inserting a connection whose outlet or inlet is already taken
/// evicts the previous occupant and reports it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionRegistry {
    edges: BTreeSet<Connection>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `connection`, returning any connections it displaced.
    pub fn insert(&mut self, connection: Connection) -> Vec<Connection> {
        let displaced: Vec<Connection> = self
            .edges
            .iter()
            .filter(|e| **e != connection && (e.from == connection.from || e.to == connection.to))
            .copied()
            .collect();
        for edge in &displaced {
            self.edges.remove(edge);
        }
        self.edges.insert(connection);
        displaced
    }

    /// Removes `connection`. Returns false if it was not stored.
    pub fn remove(&mut self, connection: &Connection) -> bool {
        self.edges.remove(connection)
    }

    /// Returns true if exactly this link is stored.
    pub fn contains(&self, from: Socket, to: Socket) -> bool {
        self.edges.contains(&Connection::new(from, to))
    }

    /// The outlet currently feeding `inlet`.
    pub fn source_of(&self, inlet: Socket) -> Option<Socket> {
        self.edges.iter().find(|e| e.to == inlet).map(|e| e.from)
    }

    /// The inlet currently fed by `outlet`.
    pub fn destination_of(&self, outlet: Socket) -> Option<Socket> {
        self.edges.iter().find(|e| e.from == outlet).map(|e| e.to)
    }

    /// Inlet view of `node`: inlet port → upstream outlet.
    pub fn inlets(&self, node: usize) -> BTreeMap<usize, Socket> {
        self.edges
            .iter()
            .filter(|e| e.to.node == node)
            .map(|e| (e.to.port, e.from))
            .collect()
    }

    /// Outlet view of `node`: outlet port → downstream inlet.
    pub fn outlets(&self, node: usize) -> BTreeMap<usize, Socket> {
        self.edges
            .iter()
            .filter(|e| e.from.node == node)
            .map(|e| (e.from.port, e.to))
            .collect()
    }

    /// Number of connections with at least one end on `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.edges.iter().filter(|e| e.touches(node)).count()
    }

    /// Removes every connection touching `node`, returning its former inlet
    /// and outlet views.
    pub fn detach(&mut self, node: usize) -> (BTreeMap<usize, Socket>, BTreeMap<usize, Socket>) {
        let inlets = self.inlets(node);
        let outlets = self.outlets(node);
        self.edges.retain(|e| !e.touches(node));
        (inlets, outlets)
    }

    /// Closes the index gap left by removing node `removed`.
    ///
    /// The node must already be detached. Every endpoint past `removed` moves
    /// down by one; nothing else changes.
    pub(crate) fn close_gap(&mut self, removed: usize) {
        debug_assert!(
            self.edges.iter().all(|e| !e.touches(removed)),
            "close_gap on node {removed} which still has connections"
        );
        self.edges = self
            .edges
            .iter()
            .map(|e| Connection::new(e.from.shifted_past(removed), e.to.shifted_past(removed)))
            .collect();
    }

    /// Shifts every endpoint by `offset` nodes. Used when appending one graph
    /// onto another.
    pub(crate) fn offset(&self, offset: usize) -> impl Iterator<Item = Connection> + '_ {
        self.edges.iter().map(move |e| {
            Connection::new(
                Socket::new(e.from.node + offset, e.from.port),
                Socket::new(e.to.node + offset, e.to.port),
            )
        })
    }

    /// Iterates connections in `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.edges.iter()
    }

    /// Number of stored connections.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if no connections are stored.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(a: usize, p: usize, b: usize, q: usize) -> Connection {
        Connection::new(Socket::new(a, p), Socket::new(b, q))
    }

    #[test]
    fn views_mirror_each_other() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(link(0, 0, 1, 0));
        reg.insert(link(1, 1, 2, 3));

        assert_eq!(reg.outlets(1).get(&1), Some(&Socket::new(2, 3)));
        assert_eq!(reg.inlets(2).get(&3), Some(&Socket::new(1, 1)));
        assert_eq!(reg.inlets(1).get(&0), Some(&Socket::new(0, 0)));
        assert_eq!(reg.source_of(Socket::new(1, 0)), Some(Socket::new(0, 0)));
        assert_eq!(reg.destination_of(Socket::new(0, 0)), Some(Socket::new(1, 0)));
        assert_eq!(reg.degree(1), 2);
    }

    #[test]
    fn insert_evicts_occupied_ports() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(link(0, 0, 1, 0));

        // Same outlet, new target.
        let displaced = reg.insert(link(0, 0, 2, 0));
        assert_eq!(displaced, vec![link(0, 0, 1, 0)]);
        assert!(reg.inlets(1).is_empty());

        // Same inlet, new source.
        let displaced = reg.insert(link(3, 0, 2, 0));
        assert_eq!(displaced, vec![link(0, 0, 2, 0)]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn reinserting_same_link_displaces_nothing() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(link(0, 0, 1, 0));
        assert!(reg.insert(link(0, 0, 1, 0)).is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn detach_returns_former_views() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(link(0, 0, 1, 0));
        reg.insert(link(1, 0, 2, 0));
        reg.insert(link(0, 1, 2, 1));

        let (inlets, outlets) = reg.detach(1);
        assert_eq!(inlets.get(&0), Some(&Socket::new(0, 0)));
        assert_eq!(outlets.get(&0), Some(&Socket::new(2, 0)));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(Socket::new(0, 1), Socket::new(2, 1)));
    }

    #[test]
    fn close_gap_renumbers_both_ends() {
        let mut reg = ConnectionRegistry::new();
        reg.insert(link(0, 0, 3, 0));
        reg.insert(link(3, 0, 4, 1));
        reg.insert(link(1, 0, 0, 1));

        reg.close_gap(2);

        assert!(reg.contains(Socket::new(0, 0), Socket::new(2, 0)));
        assert!(reg.contains(Socket::new(2, 0), Socket::new(3, 1)));
        assert!(reg.contains(Socket::new(1, 0), Socket::new(0, 1)));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn shifted_past_leaves_lower_indices() {
        assert_eq!(Socket::new(1, 2).shifted_past(1), Socket::new(1, 2));
        assert_eq!(Socket::new(5, 2).shifted_past(1), Socket::new(4, 2));
    }
}
