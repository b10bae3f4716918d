//! Per-channel effect chains.
//!
//! Each channel owns a fixed pair of taps: a **source** outlet and a **sink**
//! inlet. Effects are spliced in series between them, newest last:
//!
//! ```text
//! source → reverb → delay → sink
//! ```
//!
//! [`ChainRouter`] keeps one record per inserted effect holding the node's
//! stable handle and its current index. Removing a node shifts every later
//! index down by one, so after each removal every record and tap past the
//! removed index is renumbered, then checked against its handle.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::editor::{GraphEditor, RemovedNode};
use crate::engine::CommandSink;
use crate::error::{ChainError, SessionError, ValidationError};
use crate::node::NodeHandle;
use crate::socket::Socket;

/// Vertical distance between stacked effects.
pub const EFFECT_ROW_SPACING: i32 = 40;

/// Maps an effect name to the object type instantiated for one channel.
pub trait EffectResolver: std::fmt::Debug {
    /// Returns the object type to create for `name` on `channel`.
    fn resolve(&mut self, name: &str, channel: usize) -> Result<String, SessionError>;
}

/// Uses effect names as object types unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainNames;

impl EffectResolver for PlainNames {
    fn resolve(&mut self, name: &str, _channel: usize) -> Result<String, SessionError> {
        Ok(name.to_string())
    }
}

/// The fixed endpoints of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTaps {
    /// Outlet the chain starts from.
    pub source: Socket,
    /// Inlet the chain ends at.
    pub sink: Socket,
}

impl ChannelTaps {
    /// Creates taps from a source outlet and a sink inlet.
    pub const fn new(source: Socket, sink: Socket) -> Self {
        Self { source, sink }
    }

    fn shifted_past(self, removed: usize) -> Self {
        Self::new(self.source.shifted_past(removed), self.sink.shifted_past(removed))
    }
}

/// One inserted effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRecord {
    /// Effect name as requested.
    pub name: String,
    /// Stable handle of the node implementing it.
    pub handle: NodeHandle,
    /// Current index of that node.
    pub index: usize,
}

/// Splices effects into per-channel series chains.
#[derive(Debug)]
pub struct ChainRouter<S: CommandSink> {
    editor: GraphEditor<S>,
    resolver: Box<dyn EffectResolver>,
    taps: BTreeMap<usize, ChannelTaps>,
    chains: BTreeMap<usize, Vec<ChainRecord>>,
}

impl<S: CommandSink> ChainRouter<S> {
    /// Creates a router that instantiates effects by their plain names.
    pub fn new(editor: GraphEditor<S>) -> Self {
        Self::with_resolver(editor, Box::new(PlainNames))
    }

    /// Creates a router that asks `resolver` which object type to create.
    pub fn with_resolver(editor: GraphEditor<S>, resolver: Box<dyn EffectResolver>) -> Self {
        Self {
            editor,
            resolver,
            taps: BTreeMap::new(),
            chains: BTreeMap::new(),
        }
    }

    /// The graph editor.
    pub fn editor(&self) -> &GraphEditor<S> {
        &self.editor
    }

    /// Mutable access to the graph editor.
    pub fn editor_mut(&mut self) -> &mut GraphEditor<S> {
        &mut self.editor
    }

    /// Consumes the router, returning its editor.
    pub fn into_editor(self) -> GraphEditor<S> {
        self.editor
    }

    /// Registers a channel's taps and connects source to sink if nothing
    /// feeds the sink yet.
    pub fn attach(&mut self, channel: usize, taps: ChannelTaps) -> Result<(), ChainError> {
        self.editor.graph().check_link(taps.source, taps.sink)?;
        if self.editor.graph().connections().source_of(taps.sink).is_none() {
            self.editor.connect(taps.source, taps.sink)?;
        }
        self.taps.insert(channel, taps);
        self.chains.entry(channel).or_default();
        debug!("chain_attach: channel {channel} {} → {}", taps.source, taps.sink);
        Ok(())
    }

    /// Channels with taps, ascending.
    pub fn channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.taps.keys().copied()
    }

    /// Taps of `channel`.
    pub fn taps(&self, channel: usize) -> Option<ChannelTaps> {
        self.taps.get(&channel).copied()
    }

    /// Records of `channel` in insertion order.
    pub fn records(&self, channel: usize) -> &[ChainRecord] {
        self.chains.get(&channel).map(Vec::as_slice).unwrap_or_default()
    }

    /// Effect names on `channel` in insertion order.
    pub fn effects(&self, channel: usize) -> Vec<&str> {
        self.records(channel).iter().map(|r| r.name.as_str()).collect()
    }

    /// Node indices along `channel` from source to sink, following each
    /// node's first outlet. Stops early if the path is broken.
    pub fn signal_path(&self, channel: usize) -> Vec<usize> {
        let Some(taps) = self.taps(channel) else {
            return Vec::new();
        };
        let connections = self.editor.graph().connections();
        let mut path = vec![taps.source.node];
        let mut outlet = taps.source;
        while let Some(inlet) = connections.destination_of(outlet) {
            path.push(inlet.node);
            if inlet == taps.sink || path.len() > self.editor.graph().len() {
                break;
            }
            outlet = Socket::new(inlet.node, 0);
        }
        path
    }

    /// Inserts effect `name` at the end of `channel`'s chain. Returns the new
    /// node's index.
    pub fn insert(&mut self, name: &str, channel: usize) -> Result<usize, ChainError> {
        let taps = self.taps(channel).ok_or(ChainError::UnknownChannel(channel))?;
        if self.records(channel).iter().any(|r| r.name == name) {
            return Err(ChainError::DuplicateEffect {
                name: name.to_string(),
                channel,
            });
        }

        let kind = self.resolver.resolve(name, channel)?;
        let position = self.placement(channel, taps);
        let index = self.editor.add_at(&kind, Vec::new(), position)?;
        let effect = Socket::new(index, 0);

        let tap = match self.editor.graph().connections().source_of(taps.sink) {
            Some(feeder) => {
                self.editor.disconnect(feeder, taps.sink)?;
                feeder
            }
            None => taps.source,
        };
        self.editor.connect(tap, effect)?;
        self.editor.connect(effect, taps.sink)?;

        let handle = self.editor.graph().expect_node(index)?.handle();
        self.chains.entry(channel).or_default().push(ChainRecord {
            name: name.to_string(),
            handle,
            index,
        });
        info!("inserted '{name}' on channel {channel} as [{kind}] at {index}");
        Ok(index)
    }

    /// Removes effect `name` from `channel`, bridging its neighbours.
    ///
    /// Returns `Ok(None)` without touching anything if the effect is not on
    /// that channel.
    pub fn remove(&mut self, name: &str, channel: usize) -> Result<Option<RemovedNode>, ChainError> {
        let Some(position) = self
            .records(channel)
            .iter()
            .position(|r| r.name == name)
        else {
            debug!("chain_remove: '{name}' not on channel {channel}");
            return Ok(None);
        };

        let record = self.records(channel)[position].clone();
        self.check_record(channel, &record)?;

        let removed = self.editor.remove_object_at(record.index)?;
        if let Some(chain) = self.chains.get_mut(&channel) {
            chain.remove(position);
        }
        // Records and taps must match the graph before anything else is sent.
        for chain in self.chains.values_mut() {
            for r in chain.iter_mut().filter(|r| r.index >= removed.index) {
                r.index -= 1;
            }
        }
        for taps in self.taps.values_mut() {
            *taps = taps.shifted_past(removed.index);
        }
        self.validate()?;

        if let (Some(source), Some(destination)) = (removed.source(), removed.destination()) {
            self.editor.connect(source, destination)?;
        }

        info!("removed '{name}' from channel {channel} (was at {})", removed.index);
        Ok(Some(removed))
    }

    /// Removes every effect: channels ascending, insertion order within a
    /// channel.
    pub fn stop_all(&mut self) -> Result<Vec<RemovedNode>, ChainError> {
        let plan: Vec<(usize, String)> = self
            .chains
            .iter()
            .flat_map(|(&channel, chain)| chain.iter().map(move |r| (channel, r.name.clone())))
            .collect();

        let mut removed = Vec::with_capacity(plan.len());
        for (channel, name) in plan {
            removed.extend(self.remove(&name, channel)?);
        }
        Ok(removed)
    }

    /// Checks that every record still resolves to its node.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (&channel, chain) in &self.chains {
            for record in chain {
                self.check_record(channel, record)?;
            }
        }
        Ok(())
    }

    fn check_record(&self, channel: usize, record: &ChainRecord) -> Result<(), ValidationError> {
        let graph = self.editor.graph();
        match graph.node(record.index) {
            Some(node) if node.handle() == record.handle => Ok(()),
            found => Err(ValidationError::StaleChainRecord {
                name: record.name.clone(),
                channel,
                index: record.index,
                found: found.map_or_else(|| "nothing".to_string(), ToString::to_string),
            }),
        }
    }

    fn placement(&self, channel: usize, taps: ChannelTaps) -> (i32, i32) {
        let (x, y) = self
            .editor
            .graph()
            .node(taps.source.node)
            .map_or((10, 10), |n| n.position);
        let depth = self.records(channel).len() as i32 + 1;
        (x, y + EFFECT_ROW_SPACING * depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LiveEngine, RecordingSink};
    use crate::error::{EngineError, GraphError};

    fn s(node: usize, port: usize) -> Socket {
        Socket::new(node, port)
    }

    /// Two channels: adc~ 1 (0), dac~ 1 (1), adc~ 2 (2), dac~ 2 (3).
    fn router() -> ChainRouter<RecordingSink> {
        let mut editor = GraphEditor::new(LiveEngine::attached(RecordingSink::new(), "rack.pd"));
        for (kind, ch) in [("adc~", "1"), ("dac~", "1"), ("adc~", "2"), ("dac~", "2")] {
            editor.add(kind, vec![ch.to_string()]).unwrap();
        }
        let mut router = ChainRouter::new(editor);
        router.attach(0, ChannelTaps::new(s(0, 0), s(1, 0))).unwrap();
        router.attach(1, ChannelTaps::new(s(2, 0), s(3, 0))).unwrap();
        router.editor_mut().engine_mut().sink_mut().clear();
        router
    }

    fn sink(router: &ChainRouter<RecordingSink>) -> &RecordingSink {
        router.editor().engine().sink()
    }

    #[test]
    fn attach_connects_source_to_sink() {
        let router = router();
        assert!(router.editor().has_connection(s(0, 0), s(1, 0)));
        assert_eq!(router.signal_path(0), vec![0, 1]);
        assert_eq!(router.channels().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn attach_keeps_existing_feeder() {
        let mut editor = GraphEditor::new(LiveEngine::attached(RecordingSink::new(), "rack.pd"));
        for kind in ["adc~", "hip~", "dac~"] {
            editor.add(kind, vec![]).unwrap();
        }
        editor.connect(s(1, 0), s(2, 0)).unwrap();
        let mut router = ChainRouter::new(editor);
        router.attach(0, ChannelTaps::new(s(0, 0), s(2, 0))).unwrap();
        assert!(!router.editor().has_connection(s(0, 0), s(2, 0)));
    }

    #[test]
    fn insert_splices_before_sink() {
        let mut router = router();
        let reverb = router.insert("reverb", 0).unwrap();
        assert_eq!(reverb, 4);
        assert_eq!(router.signal_path(0), vec![0, 4, 1]);

        let delay = router.insert("delay", 0).unwrap();
        assert_eq!(delay, 5);
        assert_eq!(router.signal_path(0), vec![0, 4, 5, 1]);
        assert_eq!(router.effects(0), vec!["reverb", "delay"]);

        assert_eq!(
            sink(&router).lines(),
            vec![
                "pd-rack.pd obj 10 50 reverb;",
                "pd-rack.pd disconnect 0 0 1 0;",
                "pd-rack.pd connect 0 0 4 0;",
                "pd-rack.pd connect 4 0 1 0;",
                "pd-rack.pd obj 10 90 delay;",
                "pd-rack.pd disconnect 4 0 1 0;",
                "pd-rack.pd connect 4 0 5 0;",
                "pd-rack.pd connect 5 0 1 0;",
            ]
        );
    }

    #[test]
    fn insert_rejects_duplicates_and_unknown_channels() {
        let mut router = router();
        router.insert("reverb", 0).unwrap();
        assert!(matches!(
            router.insert("reverb", 0),
            Err(ChainError::DuplicateEffect { channel: 0, .. })
        ));
        assert!(matches!(router.insert("reverb", 7), Err(ChainError::UnknownChannel(7))));
        // The same effect on another channel is fine.
        assert!(router.insert("reverb", 1).is_ok());
    }

    #[test]
    fn remove_bridges_and_renumbers() {
        let mut router = router();
        router.insert("reverb", 0).unwrap();
        router.insert("delay", 0).unwrap();

        let removed = router.remove("reverb", 0).unwrap().unwrap();
        assert_eq!(removed.index, 4);
        assert_eq!(router.signal_path(0), vec![0, 4, 1]);
        assert_eq!(router.records(0)[0].index, 4);
        assert_eq!(router.effects(0), vec!["delay"]);
        assert!(router.validate().is_ok());
    }

    #[test]
    fn remove_unknown_is_silent() {
        let mut router = router();
        let before = router.editor().edge_count();
        assert!(router.remove("missing", 0).unwrap().is_none());
        assert!(router.remove("missing", 9).unwrap().is_none());
        assert_eq!(router.editor().edge_count(), before);
        assert!(sink(&router).commands().is_empty());
    }

    #[test]
    fn remove_renumbers_other_channels() {
        let mut router = router();
        router.insert("reverb", 0).unwrap(); // 4
        router.insert("chorus", 1).unwrap(); // 5
        router.insert("delay", 0).unwrap(); // 6

        router.remove("reverb", 0).unwrap();
        assert_eq!(router.records(1)[0].index, 4);
        assert_eq!(router.records(0)[0].index, 5);
        assert_eq!(router.signal_path(1), vec![2, 4, 3]);
        assert_eq!(router.signal_path(0), vec![0, 5, 1]);
    }

    #[test]
    fn stop_all_restores_direct_paths() {
        let mut router = router();
        router.insert("reverb", 0).unwrap();
        router.insert("chorus", 1).unwrap();
        router.insert("delay", 0).unwrap();

        let removed = router.stop_all().unwrap();
        let names: Vec<&str> = removed.iter().map(|r| r.node.kind.as_str()).collect();
        assert_eq!(names, vec!["reverb", "delay", "chorus"]);
        assert_eq!(router.editor().graph().len(), 4);
        assert_eq!(router.signal_path(0), vec![0, 1]);
        assert_eq!(router.signal_path(1), vec![2, 3]);
        assert!(router.effects(0).is_empty());
    }

    #[test]
    fn stale_record_is_detected() {
        let mut router = router();
        router.insert("reverb", 0).unwrap();
        // Removing behind the router's back leaves its record dangling.
        router.editor_mut().remove_object_at(4).unwrap();

        let err = router.remove("reverb", 0).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Graph(GraphError::Validation(ValidationError::StaleChainRecord { .. }))
        ));
    }

    #[test]
    fn debug_shows_resolver_and_chains() {
        let mut router = router();
        router.insert("reverb", 1).unwrap();
        let text = format!("{router:?}");
        assert!(text.starts_with("ChainRouter"));
        assert!(text.contains("PlainNames"));
        assert!(text.contains("reverb"));
    }

    #[test]
    fn failed_bridge_keeps_records_in_step() {
        let mut router = router();
        router.insert("reverb", 0).unwrap(); // 4
        router.insert("chorus", 1).unwrap(); // 5
        *router.editor_mut().engine_mut().sink_mut() = RecordingSink::new().fail_on("connect");

        let err = router.remove("reverb", 0).unwrap_err();
        assert!(matches!(
            err,
            ChainError::Graph(GraphError::ExternalSync(EngineError::Rejected(_)))
        ));
        assert!(router.effects(0).is_empty());
        assert_eq!(router.records(1)[0].index, 4);
        assert_eq!(router.taps(1), Some(ChannelTaps::new(s(2, 0), s(3, 0))));
        assert!(router.validate().is_ok());

        *router.editor_mut().engine_mut().sink_mut() = RecordingSink::new();
        assert!(router.remove("chorus", 1).unwrap().is_some());
        assert!(router.stop_all().unwrap().is_empty());
        assert_eq!(router.signal_path(1), vec![2, 3]);
    }

    #[derive(Debug)]
    struct Suffixed;

    impl EffectResolver for Suffixed {
        fn resolve(&mut self, name: &str, channel: usize) -> Result<String, SessionError> {
            Ok(format!("{name}-ch{channel}"))
        }
    }

    #[test]
    fn resolver_names_the_node() {
        let editor = router().into_editor();
        let mut router = ChainRouter::with_resolver(editor, Box::new(Suffixed));
        router.attach(1, ChannelTaps::new(s(2, 0), s(3, 0))).unwrap();
        let index = router.insert("reverb", 1).unwrap();
        assert_eq!(router.editor().graph().node(index).unwrap().kind, "reverb-ch1");
        assert_eq!(router.effects(1), vec!["reverb"]);
    }
}
