//! Error types for graph, engine, document, and chain operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::node::NodeHandle;
use crate::socket::Socket;

/// A structural invariant of the patch graph does not hold.
///
/// Every variant implies a renumbering or bookkeeping defect, so callers are
/// expected to propagate these rather than recover.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A socket points at a node index past the end of the graph.
    #[error("socket {socket} references a missing node (graph has {len} nodes)")]
    MissingNode {
        /// The offending socket.
        socket: Socket,
        /// Number of nodes in the graph at the time of the check.
        len: usize,
    },

    /// An operation addressed a node index past the end of the graph.
    #[error("node index {index} out of range (graph has {len} nodes)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the graph.
        len: usize,
    },

    /// A connection would link a node to itself.
    #[error("node {0} cannot be connected to itself")]
    SelfConnection(usize),

    /// Two nodes carry the same stable handle.
    #[error("node handle {0} appears more than once")]
    DuplicateHandle(NodeHandle),

    /// A chain record's stored index no longer resolves to its node.
    #[error("chain record '{name}' on channel {channel} points at index {index}, which holds {found}")]
    StaleChainRecord {
        /// Effect name of the record.
        name: String,
        /// Channel the record belongs to.
        channel: usize,
        /// Stored index.
        index: usize,
        /// Description of what the index actually resolves to.
        found: String,
    },
}

/// A command could not be delivered to the live engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Writing to the outbound channel failed.
    #[error("failed to deliver '{command}': {source}")]
    Delivery {
        /// The command line that was being sent.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A canvas command was issued before any patch was opened.
    #[error("no canvas is open; cannot send '{0}'")]
    NoCanvas(String),

    /// The outbound sink refused the command.
    #[error("engine rejected '{0}'")]
    Rejected(String),

    /// Connecting to the engine's listening port failed.
    #[error("failed to connect to engine at {addr}: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Launching the engine process failed.
    #[error("failed to launch engine '{path}': {source}")]
    Spawn {
        /// Binary that could not be started.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors from graph editor operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A structural invariant was violated.
    #[error("graph validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The mirrored engine command could not be delivered. Internal and
    /// external state may have diverged.
    #[error("external sync failed: {0}")]
    ExternalSync(#[from] EngineError),
}

/// Errors from reading or writing patch documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read a patch file.
    #[error("failed to read patch '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a patch file.
    #[error("failed to write patch '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A statement could not be interpreted.
    #[error("malformed statement {index} ('{statement}'): {reason}")]
    Malformed {
        /// Zero-based statement number in the document.
        index: usize,
        /// The statement text.
        statement: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl DocumentError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::WriteFile {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the session working directory.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The working directory could not be created or removed.
    #[error("session working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    /// The patch library could not be listed.
    #[error("failed to list patches in '{path}': {source}")]
    ListDir {
        /// Library directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a generated patch failed.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A generated patch could not be wired.
    #[error("generated patch is malformed: {0}")]
    Generated(#[from] ValidationError),
}

/// Errors from chain router operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The underlying graph edit failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The effect is already part of this channel's chain.
    #[error("effect '{name}' is already inserted on channel {channel}")]
    DuplicateEffect {
        /// Effect name.
        name: String,
        /// Channel it was inserted on.
        channel: usize,
    },

    /// No taps were attached for the channel.
    #[error("channel {0} is not attached")]
    UnknownChannel(usize),

    /// Preparing the effect's per-channel variant failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ValidationError> for ChainError {
    fn from(err: ValidationError) -> Self {
        ChainError::Graph(GraphError::Validation(err))
    }
}

impl From<EngineError> for ChainError {
    fn from(err: EngineError) -> Self {
        ChainError::Graph(GraphError::ExternalSync(err))
    }
}
