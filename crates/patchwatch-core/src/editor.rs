//! Graph editor: local graph mutations mirrored to the live engine.
//!
//! [`GraphEditor`] is the only way the chain router changes topology. Each
//! operation mutates the [`PatchGraph`], checks its invariants, and emits the
//! matching engine command. Commands are fire-and-forget; when one fails the
//! error is returned and the local state keeps every change made before the
//! failed send.
//!
//! # Removal
//!
//! The engine cannot delete a box by index. [`remove_object_at`] instead
//! selects it by name, skipping as many same-named boxes as sit before it,
//! and cuts the selection. The engine drops the box's connections itself and
//! renumbers the boxes after it, so the local side renumbers without sending
//! anything further.
//!
//! [`remove_object_at`]: GraphEditor::remove_object_at

use std::collections::BTreeMap;

use patchwatch_registry::WidgetRegistry;
use tracing::{debug, warn};

use crate::document::Element;
use crate::engine::{CommandSink, LiveEngine};
use crate::error::{DocumentError, GraphError};
use crate::graph::PatchGraph;
use crate::loader::PatchLoader;
use crate::node::Node;
use crate::socket::{Connection, Socket};

/// Vertical spacing between boxes placed without an explicit position.
pub const ROW_SPACING: i32 = 30;

/// A node taken out of the graph, with its former connections.
///
/// `inlets` and `outlets` already use post-removal indices, so they can be
/// passed straight back to [`GraphEditor::connect`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// Index the node occupied before removal.
    pub index: usize,
    /// The node itself.
    pub node: Node,
    /// Former inlet view: inlet port → upstream outlet.
    pub inlets: BTreeMap<usize, Socket>,
    /// Former outlet view: outlet port → downstream inlet.
    pub outlets: BTreeMap<usize, Socket>,
}

impl RemovedNode {
    /// What fed the node's first inlet.
    pub fn source(&self) -> Option<Socket> {
        self.inlets.get(&0).copied()
    }

    /// What the node's first outlet fed.
    pub fn destination(&self) -> Option<Socket> {
        self.outlets.get(&0).copied()
    }
}

/// Applies structural edits to a graph and mirrors them to the engine.
#[derive(Debug)]
pub struct GraphEditor<S: CommandSink> {
    graph: PatchGraph,
    engine: LiveEngine<S>,
}

impl<S: CommandSink> GraphEditor<S> {
    /// Creates an editor over an empty graph.
    pub fn new(engine: LiveEngine<S>) -> Self {
        Self::with_graph(PatchGraph::new(), engine)
    }

    /// Creates an editor over a graph the engine already holds.
    pub fn with_graph(graph: PatchGraph, engine: LiveEngine<S>) -> Self {
        Self { graph, engine }
    }

    /// Builds the graph from patch elements. No commands are emitted: the
    /// engine opens the same file itself.
    pub fn load(
        elements: &[Element],
        registry: &WidgetRegistry,
        engine: LiveEngine<S>,
    ) -> Result<Self, DocumentError> {
        let patch = PatchLoader::new(registry).load(elements)?;
        Ok(Self::with_graph(patch.graph, engine))
    }

    /// The graph.
    pub fn graph(&self) -> &PatchGraph {
        &self.graph
    }

    /// The engine adapter.
    pub fn engine(&self) -> &LiveEngine<S> {
        &self.engine
    }

    /// Mutable access to the engine adapter.
    pub fn engine_mut(&mut self) -> &mut LiveEngine<S> {
        &mut self.engine
    }

    /// Splits the editor into its graph and engine adapter.
    pub fn into_parts(self) -> (PatchGraph, LiveEngine<S>) {
        (self.graph, self.engine)
    }

    /// Returns true if `from` currently feeds `to`.
    pub fn has_connection(&self, from: Socket, to: Socket) -> bool {
        self.graph.has_connection(from, to)
    }

    /// Number of stored connections.
    pub fn edge_count(&self) -> usize {
        self.graph.connections().len()
    }

    /// Connects outlet `from` to inlet `to`.
    ///
    /// A port holds one connection: any link already on `from` or on `to` is
    /// replaced, and a `disconnect` is sent for it first.
    pub fn connect(&mut self, from: Socket, to: Socket) -> Result<(), GraphError> {
        let displaced = self.graph.link(from, to)?;
        self.graph.validate()?;
        for edge in displaced {
            debug!("graph_replace: {edge}");
            self.send_disconnect(edge)?;
        }
        debug!("graph_connect: {from} → {to}");
        self.engine.connect(from.node, from.port, to.node, to.port)?;
        Ok(())
    }

    /// Disconnects `from` from `to`.
    ///
    /// The stored link is cleared only if it exists, but the engine command is
    /// sent either way. Returns whether a stored link was cleared.
    pub fn disconnect(&mut self, from: Socket, to: Socket) -> Result<bool, GraphError> {
        let removed = self.graph.unlink(from, to);
        debug!("graph_disconnect: {from} → {to} (stored: {removed})");
        self.send_disconnect(Connection::new(from, to))?;
        Ok(removed)
    }

    /// Appends an object below the last box. Returns its index.
    pub fn add(&mut self, kind: &str, args: Vec<String>) -> Result<usize, GraphError> {
        let position = self
            .graph
            .nodes()
            .last()
            .map_or((10, 10), |last| (last.position.0, last.position.1 + ROW_SPACING));
        self.add_at(kind, args, position)
    }

    /// Appends an object at `position`. Returns its index.
    pub fn add_at(
        &mut self,
        kind: &str,
        args: Vec<String>,
        position: (i32, i32),
    ) -> Result<usize, GraphError> {
        self.add_node(Node::object(kind, args, position))
    }

    /// Appends any box. Returns its index.
    pub fn add_node(&mut self, node: Node) -> Result<usize, GraphError> {
        let (x, y) = node.position;
        let atoms = node.creation_atoms();
        let index = self.graph.push(node);
        self.graph.validate()?;
        debug!("graph_add: [{}] at {index}", atoms.join(" "));
        self.engine.create_object(x, y, &atoms)?;
        Ok(index)
    }

    /// Removes the node at `index`, returning it with its former
    /// connections renumbered to post-removal indices.
    pub fn remove_object_at(&mut self, index: usize) -> Result<RemovedNode, GraphError> {
        let name = self.graph.expect_node(index)?.display_name().to_string();
        let occurrence = self.graph.occurrence_of(index);

        let (inlets, outlets) = self.graph.connections_mut().detach(index);
        debug!(
            "graph_detach: node {index} ({} in, {} out)",
            inlets.len(),
            outlets.len()
        );

        if let Err(e) = self
            .engine
            .find(&name, occurrence)
            .and_then(|()| self.engine.cut())
        {
            warn!("engine out of sync: node {index} detached locally but not cut: {e}");
            return Err(e.into());
        }

        let inlets = inlets
            .into_iter()
            .map(|(port, socket)| (port, socket.shifted_past(index)))
            .collect();
        let outlets = outlets
            .into_iter()
            .map(|(port, socket)| (port, socket.shifted_past(index)))
            .collect();

        self.graph.connections_mut().close_gap(index);
        let node = self.graph.take_node(index);
        self.graph.validate()?;
        debug!("graph_remove: {node} from {index}");

        Ok(RemovedNode {
            index,
            node,
            inlets,
            outlets,
        })
    }

    fn send_disconnect(&mut self, edge: Connection) -> Result<(), GraphError> {
        self.engine
            .disconnect(edge.from.node, edge.from.port, edge.to.node, edge.to.port)?;
        Ok(())
    }
}
