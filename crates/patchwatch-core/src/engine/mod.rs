//! Live engine mirroring.
//!
//! Every structural edit made to a [`PatchGraph`](crate::PatchGraph) through
//! the [`GraphEditor`](crate::GraphEditor) is mirrored to the running engine
//! as FUDI text commands. This module holds the command type, the sinks that
//! carry commands, the canvas-level [`LiveEngine`] adapter, and the engine
//! process handle.

mod command;
mod live;
mod process;
mod sink;

pub use command::{EngineCommand, escape_atom};
pub use live::{LiveEngine, PD_RECEIVER, canvas_receiver};
pub use process::EngineProcess;
pub use sink::{CommandSink, FudiSink, NullSink, RecordingSink};
