//! Patch graph node types.
//!
//! A [`Node`] is one box on a Pd canvas: an object, a message box, an atom
//! box, a comment, or a subpatch. Its position in the graph is its index,
//! which shifts whenever an earlier node is removed; its [`NodeHandle`] does
//! not.

use patchwatch_registry::Widget;
use std::fmt;

/// Stable identifier for a node.
///
/// Handles are assigned sequentially and never reused within a graph
/// instance. They survive removals that shift node indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of canvas box a node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// `#X obj`: an object box whose first atom is its class name.
    Object,
    /// `#X msg`: a message box.
    Message,
    /// `#X floatatom`: a number atom box.
    FloatAtom,
    /// `#X symbolatom`: a symbol atom box.
    SymbolAtom,
    /// `#X text`: a comment.
    Comment,
    /// `#X restore`: the box standing for an embedded subpatch.
    Subpatch,
}

impl NodeClass {
    /// The patch-file action keyword for this class.
    pub const fn action(&self) -> &'static str {
        match self {
            NodeClass::Object => "obj",
            NodeClass::Message => "msg",
            NodeClass::FloatAtom => "floatatom",
            NodeClass::SymbolAtom => "symbolatom",
            NodeClass::Comment => "text",
            NodeClass::Subpatch => "restore",
        }
    }

    /// Maps a patch-file action keyword back to a class.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "obj" => Some(NodeClass::Object),
            "msg" => Some(NodeClass::Message),
            "floatatom" => Some(NodeClass::FloatAtom),
            "symbolatom" => Some(NodeClass::SymbolAtom),
            "text" => Some(NodeClass::Comment),
            "restore" => Some(NodeClass::Subpatch),
            _ => None,
        }
    }
}

/// A node in the patch graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) handle: NodeHandle,
    /// Box kind.
    pub class: NodeClass,
    /// Type name: the class name for objects (`osc~`, `dac~`, `pd`), the
    /// action keyword for other boxes.
    pub kind: String,
    /// Ordered arguments after the type name.
    pub args: Vec<String>,
    /// Canvas placement `(x, y)`.
    pub position: (i32, i32),
    /// Decoded fields when the object is a known GUI widget.
    pub widget: Option<Widget>,
}

impl Node {
    /// Creates an object box node. The handle is assigned when the node is
    /// added to a graph.
    pub fn object(kind: impl Into<String>, args: Vec<String>, position: (i32, i32)) -> Self {
        Self {
            handle: NodeHandle(u32::MAX),
            class: NodeClass::Object,
            kind: kind.into(),
            args,
            position,
            widget: None,
        }
    }

    /// Creates a non-object box (message, atom, comment, subpatch).
    pub fn boxed(class: NodeClass, args: Vec<String>, position: (i32, i32)) -> Self {
        let kind = match class {
            NodeClass::Subpatch => "pd".to_string(),
            other => other.action().to_string(),
        };
        Self {
            handle: NodeHandle(u32::MAX),
            class,
            kind,
            args,
            position,
            widget: None,
        }
    }

    /// The node's stable handle.
    #[inline]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Name the engine's text search would match this node by.
    pub fn display_name(&self) -> &str {
        match self.class {
            NodeClass::Object | NodeClass::Subpatch => &self.kind,
            _ => self.args.first().map_or(self.kind.as_str(), String::as_str),
        }
    }

    /// The atoms that follow the canvas position when the node is written out
    /// or created on the engine.
    pub fn creation_atoms(&self) -> Vec<String> {
        let mut atoms = Vec::with_capacity(self.args.len() + 1);
        if matches!(self.class, NodeClass::Object | NodeClass::Subpatch) && !self.kind.is_empty() {
            atoms.push(self.kind.clone());
        }
        atoms.extend(self.args.iter().cloned());
        atoms
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atoms = self.creation_atoms();
        if self.class == NodeClass::Object {
            write!(f, "[{}]", atoms.join(" "))
        } else {
            write!(f, "{} [{}]", self.class.action(), atoms.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_display_name_is_class() {
        let node = Node::object("osc~", vec!["440".into()], (10, 10));
        assert_eq!(node.display_name(), "osc~");
        assert_eq!(node.creation_atoms(), vec!["osc~", "440"]);
        assert_eq!(node.to_string(), "[osc~ 440]");
    }

    #[test]
    fn message_display_name_is_first_atom() {
        let node = Node::boxed(NodeClass::Message, vec!["bang".into()], (0, 0));
        assert_eq!(node.kind, "msg");
        assert_eq!(node.display_name(), "bang");
        assert_eq!(node.creation_atoms(), vec!["bang"]);
    }

    #[test]
    fn subpatch_creates_as_pd() {
        let node = Node::boxed(NodeClass::Subpatch, vec!["mixer".into()], (0, 0));
        assert_eq!(node.creation_atoms(), vec!["pd", "mixer"]);
    }

    #[test]
    fn action_roundtrip() {
        for class in [
            NodeClass::Object,
            NodeClass::Message,
            NodeClass::FloatAtom,
            NodeClass::SymbolAtom,
            NodeClass::Comment,
            NodeClass::Subpatch,
        ] {
            assert_eq!(NodeClass::from_action(class.action()), Some(class));
        }
        assert_eq!(NodeClass::from_action("connect"), None);
    }
}
