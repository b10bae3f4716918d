//! Patchwatch Core - live patch graph editing for Pure Data
//!
//! This crate models a running Pd patch as an index-addressed node graph and
//! keeps the model and the engine in step while effects are spliced in and out
//! of per-channel signal chains.
//!
//! # Core Abstractions
//!
//! ## Graph Model
//!
//! - [`PatchGraph`] - Dense node sequence plus connection registry
//! - [`ConnectionRegistry`] - Single edge set with derived inlet/outlet views
//! - [`Node`], [`NodeHandle`] - Canvas boxes and their stable identities
//! - [`Socket`], [`Connection`] - Port addresses and links
//!
//! ## Editing
//!
//! - [`GraphEditor`] - Connect, disconnect, add, and remove with engine mirroring
//! - [`ChainRouter`] - Per-channel series chains between fixed taps
//!
//! ## Engine
//!
//! - [`LiveEngine`] - Canvas-level FUDI commands (`obj`, `connect`, `find`, `cut`, ...)
//! - [`CommandSink`] - Outbound seam: [`FudiSink`], [`RecordingSink`], [`NullSink`]
//! - [`EngineProcess`] - Engine process lifetime
//!
//! ## Patch Files
//!
//! - [`document`] - Statement splitting and tokenizing
//! - [`PatchLoader`] - Elements to graph, with audio I/O channel rewiring
//! - [`Rack`] - Generated host patch with one column per channel
//! - [`Session`] - Working directory for generated patches
//!
//! # Example
//!
//! ```rust
//! use patchwatch_core::{
//!     ChainRouter, ChannelTaps, GraphEditor, LiveEngine, RecordingSink, Socket,
//! };
//!
//! let engine = LiveEngine::attached(RecordingSink::new(), "rack.pd");
//! let mut editor = GraphEditor::new(engine);
//! editor.add("adc~", vec!["1".into()]).unwrap();
//! editor.add("dac~", vec!["1".into()]).unwrap();
//!
//! let mut router = ChainRouter::new(editor);
//! router
//!     .attach(0, ChannelTaps::new(Socket::new(0, 0), Socket::new(1, 0)))
//!     .unwrap();
//! router.insert("freeverb~", 0).unwrap();
//! assert_eq!(router.signal_path(0), vec![0, 2, 1]);
//!
//! router.remove("freeverb~", 0).unwrap();
//! assert_eq!(router.signal_path(0), vec![0, 1]);
//! ```

pub mod chain;
pub mod document;
pub mod editor;
pub mod engine;
pub mod error;
pub mod graph;
pub mod loader;
pub mod node;
pub mod rack;
pub mod session;
pub mod socket;

pub use chain::{ChainRecord, ChainRouter, ChannelTaps, EffectResolver, PlainNames};
pub use document::{Element, ElementFilter};
pub use editor::{GraphEditor, RemovedNode};
pub use engine::{
    CommandSink, EngineCommand, EngineProcess, FudiSink, LiveEngine, NullSink, RecordingSink,
};
pub use error::{
    ChainError, DocumentError, EngineError, GraphError, SessionError, ValidationError,
};
pub use graph::PatchGraph;
pub use loader::{LoadedPatch, PatchLoader};
pub use node::{Node, NodeClass, NodeHandle};
pub use rack::Rack;
pub use session::{Session, VariantWriter};
pub use socket::{Connection, ConnectionRegistry, Socket};
