//! Builds a [`PatchGraph`] from parsed patch elements.
//!
//! Elements are dispatched through a fixed table of [`ElementFilter`]s; the
//! first filter that matches decides how the statement is interpreted. Only
//! top-level canvas contents become nodes: the engine addresses boxes on the
//! outer canvas, and a subpatch appears there as a single `pd` box.

use std::path::Path;

use patchwatch_registry::WidgetRegistry;
use tracing::{debug, warn};

use crate::document::{Element, ElementFilter, read_document};
use crate::error::DocumentError;
use crate::graph::PatchGraph;
use crate::node::{Node, NodeClass};
use crate::socket::Socket;

/// Object classes whose trailing argument is a hardware channel number.
pub const AUDIO_IO_CLASSES: [&str; 2] = ["adc~", "dac~"];

/// A loaded patch and the indices of its audio I/O objects.
#[derive(Debug, Clone, Default)]
pub struct LoadedPatch {
    /// The node graph.
    pub graph: PatchGraph,
    /// Indices of `adc~`/`dac~` nodes, in canvas order.
    pub audio_io: Vec<usize>,
}

impl LoadedPatch {
    /// Index of the first node of class `kind`.
    pub fn find(&self, kind: &str) -> Option<usize> {
        self.graph.nodes().position(|n| n.kind == kind)
    }
}

type Handler = fn(&PatchLoader<'_>, &mut LoadedPatch, usize, &Element) -> Result<(), DocumentError>;

const HANDLERS: [(ElementFilter, Handler); 9] = [
    (ElementFilter::objects().with_object("adc~"), on_audio_io),
    (ElementFilter::objects().with_object("dac~"), on_audio_io),
    (ElementFilter::action("connect"), on_connect),
    (ElementFilter::objects(), on_object),
    (ElementFilter::action("msg"), on_box),
    (ElementFilter::action("floatatom"), on_box),
    (ElementFilter::action("symbolatom"), on_box),
    (ElementFilter::action("text"), on_box),
    (ElementFilter::action("restore"), on_restore),
];

/// Turns patch elements into a graph.
///
/// With a channel set, every audio I/O object is rewired to that channel;
/// this is how one effect patch is instantiated once per channel.
#[derive(Debug, Clone, Copy)]
pub struct PatchLoader<'a> {
    registry: &'a WidgetRegistry,
    channel: Option<usize>,
}

impl<'a> PatchLoader<'a> {
    /// Creates a loader that keeps audio I/O channels as written.
    pub fn new(registry: &'a WidgetRegistry) -> Self {
        Self {
            registry,
            channel: None,
        }
    }

    /// Rewires audio I/O objects to zero-based `channel`.
    pub fn for_channel(self, channel: usize) -> Self {
        Self {
            channel: Some(channel),
            ..self
        }
    }

    /// Builds a graph from `elements`.
    pub fn load(&self, elements: &[Element]) -> Result<LoadedPatch, DocumentError> {
        let mut patch = LoadedPatch::default();
        for (index, element) in elements.iter().enumerate() {
            if element.depth > 0 {
                continue;
            }
            let handler = HANDLERS.iter().find(|(filter, _)| filter.matches(element));
            if let Some((_, handler)) = handler {
                handler(self, &mut patch, index, element)?;
            }
        }
        debug!(
            "patch_load: {} nodes, {} connections",
            patch.graph.len(),
            patch.graph.connections().len()
        );
        Ok(patch)
    }

    /// Reads and loads a patch file.
    pub fn load_file(&self, path: &Path) -> Result<LoadedPatch, DocumentError> {
        let elements = read_document(path)?;
        self.load(&elements)
    }
}

fn on_audio_io(
    loader: &PatchLoader<'_>,
    patch: &mut LoadedPatch,
    index: usize,
    element: &Element,
) -> Result<(), DocumentError> {
    let mut node = object_node(index, element)?;
    if let Some(channel) = loader.channel {
        substitute_audio_channel(&mut node.args, channel);
    }
    let at = patch.graph.push(node);
    patch.audio_io.push(at);
    Ok(())
}

fn on_object(
    loader: &PatchLoader<'_>,
    patch: &mut LoadedPatch,
    index: usize,
    element: &Element,
) -> Result<(), DocumentError> {
    let mut node = object_node(index, element)?;
    node.widget = loader.registry.decode(&node.kind, &element.args);
    patch.graph.push(node);
    Ok(())
}

fn on_box(
    _loader: &PatchLoader<'_>,
    patch: &mut LoadedPatch,
    index: usize,
    element: &Element,
) -> Result<(), DocumentError> {
    let class = NodeClass::from_action(&element.action).unwrap_or(NodeClass::Comment);
    let position = position_of(index, element)?;
    let node = Node::boxed(class, element.args[2..].to_vec(), position);
    patch.graph.push(node);
    Ok(())
}

fn on_restore(
    _loader: &PatchLoader<'_>,
    patch: &mut LoadedPatch,
    index: usize,
    element: &Element,
) -> Result<(), DocumentError> {
    let position = position_of(index, element)?;
    let args = element.args.iter().skip(3).cloned().collect();
    let mut node = Node::boxed(NodeClass::Subpatch, args, position);
    if let Some(kind) = element.args.get(2) {
        node.kind.clone_from(kind);
    }
    patch.graph.push(node);
    Ok(())
}

fn on_connect(
    _loader: &PatchLoader<'_>,
    patch: &mut LoadedPatch,
    index: usize,
    element: &Element,
) -> Result<(), DocumentError> {
    let malformed = |reason: String| DocumentError::Malformed {
        index,
        statement: element.to_string(),
        reason,
    };
    let numbers: Vec<usize> = element
        .args
        .iter()
        .map(|a| a.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| malformed(format!("non-integer endpoint: {e}")))?;
    let [a, p, b, q] = numbers[..] else {
        return Err(malformed(format!("expected 4 integers, found {}", numbers.len())));
    };

    let displaced = patch
        .graph
        .link(Socket::new(a, p), Socket::new(b, q))
        .map_err(|e| malformed(e.to_string()))?;
    for edge in displaced {
        warn!("patch_load: fan-out not modelled, dropped {edge}");
    }
    Ok(())
}

/// Returns `elements` with every audio I/O object rewired to zero-based
/// `channel`. Used to write per-channel copies of a patch file.
pub fn rewrite_audio_channels(elements: &[Element], channel: usize) -> Vec<Element> {
    elements
        .iter()
        .map(|element| match element.object_class() {
            Some(class) if element.depth == 0 && AUDIO_IO_CLASSES.contains(&class) => {
                let mut element = element.clone();
                let mut tail = element.args.split_off(3);
                substitute_audio_channel(&mut tail, channel);
                element.args.extend(tail);
                element
            }
            _ => element.clone(),
        })
        .collect()
}

/// Replaces the trailing channel argument with `channel + 1`, or appends one
/// if the object has no arguments.
pub fn substitute_audio_channel(args: &mut Vec<String>, channel: usize) {
    let number = (channel + 1).to_string();
    match args.last_mut() {
        Some(last) => *last = number,
        None => args.push(number),
    }
}

fn position_of(index: usize, element: &Element) -> Result<(i32, i32), DocumentError> {
    element.position().ok_or_else(|| DocumentError::Malformed {
        index,
        statement: element.to_string(),
        reason: "missing canvas position".to_string(),
    })
}

fn object_node(index: usize, element: &Element) -> Result<Node, DocumentError> {
    let position = position_of(index, element)?;
    let kind = element.args.get(2).cloned().unwrap_or_default();
    let args = element.args.iter().skip(3).cloned().collect();
    Ok(Node::object(kind, args, position))
}
