//! Property-based tests for the patch graph and chain router.
//!
//! Tests connection bookkeeping, renumbering after removal, and independence
//! of channels using proptest for randomized edit sequences.

use proptest::prelude::*;
use patchwatch_core::{
    ChainRouter, GraphEditor, LiveEngine, NodeHandle, Rack, RecordingSink, Socket,
};
use patchwatch_registry::WidgetRegistry;

const NODES: usize = 6;
const PORTS: usize = 2;

fn editor_with(nodes: usize) -> GraphEditor<RecordingSink> {
    let mut editor = GraphEditor::new(LiveEngine::attached(RecordingSink::new(), "p.pd"));
    for i in 0..nodes {
        // Repeated names exercise occurrence counting.
        editor.add(&format!("obj{}", i % 3), Vec::new()).unwrap();
    }
    editor
}

fn socket() -> impl Strategy<Value = Socket> {
    (0..NODES, 0..PORTS).prop_map(|(n, p)| Socket::new(n, p))
}

fn link() -> impl Strategy<Value = (Socket, Socket)> {
    (socket(), socket()).prop_filter("no self connections", |(a, b)| a.node != b.node)
}

fn router(channels: usize) -> ChainRouter<RecordingSink> {
    let rack = Rack::build(&WidgetRegistry::new(), channels).unwrap();
    let engine = LiveEngine::attached(RecordingSink::new(), "rack.pd");
    let mut router = ChainRouter::new(GraphEditor::with_graph(rack.graph, engine));
    for (channel, taps) in rack.taps {
        router.attach(channel, taps).unwrap();
    }
    router
}

/// Node kinds along a channel, taps excluded.
fn chain_kinds(router: &ChainRouter<RecordingSink>, channel: usize) -> Vec<String> {
    let path = router.signal_path(channel);
    path[1..path.len() - 1]
        .iter()
        .map(|&i| router.editor().graph().node(i).unwrap().kind.clone())
        .collect()
}

#[derive(Debug, Clone)]
enum ChainOp {
    Insert(usize),
    Remove(usize),
}

fn chain_op() -> impl Strategy<Value = ChainOp> {
    prop_oneof![
        (0usize..4).prop_map(ChainOp::Insert),
        (0usize..4).prop_map(ChainOp::Remove),
    ]
}

fn apply(router: &mut ChainRouter<RecordingSink>, channel: usize, op: &ChainOp) {
    match op {
        ChainOp::Insert(n) => {
            // Duplicates are rejected and leave the chain unchanged.
            let _ = router.insert(&format!("fx{n}"), channel);
        }
        ChainOp::Remove(n) => {
            router.remove(&format!("fx{n}"), channel).unwrap();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After each connect or disconnect, `has_connection` on that pair
    /// reports what was just done, and the inlet/outlet views agree.
    #[test]
    fn has_connection_tracks_latest_edit(
        ops in prop::collection::vec((link(), any::<bool>()), 1..40),
    ) {
        let mut editor = editor_with(NODES);
        for ((from, to), connect) in ops {
            if connect {
                editor.connect(from, to).unwrap();
            } else {
                editor.disconnect(from, to).unwrap();
            }
            prop_assert_eq!(editor.has_connection(from, to), connect);

            let registry = editor.graph().connections();
            for edge in registry.iter() {
                let outlets = registry.outlets(edge.from.node);
                prop_assert_eq!(outlets.get(&edge.from.port).copied(), Some(edge.to));
                let inlets = registry.inlets(edge.to.node);
                prop_assert_eq!(inlets.get(&edge.to.port).copied(), Some(edge.from));
            }
        }
    }

    /// Removing node `i` drops every link touching it and shifts every later
    /// node and link endpoint down by one.
    #[test]
    fn removal_renumbers_everything_past_the_gap(
        links in prop::collection::vec(link(), 0..20),
        removed in 0..NODES,
    ) {
        let mut editor = editor_with(NODES);
        for (from, to) in &links {
            editor.connect(*from, *to).unwrap();
        }
        let handles: Vec<NodeHandle> = editor.graph().nodes().map(|n| n.handle()).collect();
        let survivors: Vec<(Socket, Socket)> = editor
            .graph()
            .connections()
            .iter()
            .filter(|e| !e.touches(removed))
            .map(|e| (e.from, e.to))
            .collect();

        editor.remove_object_at(removed).unwrap();

        let graph = editor.graph();
        prop_assert_eq!(graph.len(), NODES - 1);
        for (old, handle) in handles.iter().enumerate().filter(|(i, _)| *i != removed) {
            let new = if old > removed { old - 1 } else { old };
            prop_assert_eq!(graph.index_of(*handle), Some(new));
        }
        let shift = |s: Socket| if s.node > removed { Socket::new(s.node - 1, s.port) } else { s };
        prop_assert_eq!(graph.connections().len(), survivors.len());
        for (from, to) in survivors {
            prop_assert!(graph.has_connection(shift(from), shift(to)));
        }
        prop_assert!(graph.validate().is_ok());
    }

    /// Removing a chained effect leaves `prior − touching + 1` edges.
    #[test]
    fn chain_removal_edge_count(count in 1usize..6, pick in 0usize..6) {
        let mut router = router(1);
        for n in 0..count {
            router.insert(&format!("fx{n}"), 0).unwrap();
        }
        let name = format!("fx{}", pick % count);
        let index = router.records(0).iter().find(|r| r.name == name).unwrap().index;
        let before = router.editor().edge_count();
        let touching = router.editor().graph().connections().degree(index);

        router.remove(&name, 0).unwrap().unwrap();
        prop_assert_eq!(router.editor().edge_count(), before - touching + 1);
    }

    /// Edit sequences on two channels give the same chains whether they run
    /// one after the other or interleaved.
    #[test]
    fn disjoint_channels_commute(
        left in prop::collection::vec(chain_op(), 0..12),
        right in prop::collection::vec(chain_op(), 0..12),
    ) {
        let mut sequential = router(2);
        for op in &left {
            apply(&mut sequential, 0, op);
        }
        for op in &right {
            apply(&mut sequential, 1, op);
        }

        let mut interleaved = router(2);
        let longest = left.len().max(right.len());
        for i in 0..longest {
            if let Some(op) = right.get(i) {
                apply(&mut interleaved, 1, op);
            }
            if let Some(op) = left.get(i) {
                apply(&mut interleaved, 0, op);
            }
        }

        for channel in 0..2 {
            prop_assert_eq!(sequential.effects(channel), interleaved.effects(channel));
            prop_assert_eq!(chain_kinds(&sequential, channel), chain_kinds(&interleaved, channel));
        }
        prop_assert!(sequential.validate().is_ok());
        prop_assert!(interleaved.validate().is_ok());
    }
}
