//! Canvas-level adapter over a [`CommandSink`].

use std::path::Path;

use tracing::debug;

use crate::engine::{CommandSink, EngineCommand, escape_atom};
use crate::error::EngineError;

/// Receiver of the engine's global message handler.
pub const PD_RECEIVER: &str = "pd";

/// Issues canvas edits for one open patch.
///
/// The engine addresses a patch's canvas as `pd-<file name>`. Boxes on it are
/// addressed by connection index for `connect`/`disconnect`, but can only be
/// deleted by selecting them through a text search (`find`, repeated with
/// `findagain`) and then `cut`. The search is assumed to visit same-named
/// boxes in creation order.
#[derive(Debug)]
pub struct LiveEngine<S: CommandSink> {
    sink: S,
    canvas: Option<String>,
}

impl<S: CommandSink> LiveEngine<S> {
    /// Creates an adapter with no canvas open.
    pub fn new(sink: S) -> Self {
        Self { sink, canvas: None }
    }

    /// Creates an adapter targeting a canvas the engine already has open.
    pub fn attached(sink: S, file_name: &str) -> Self {
        Self {
            sink,
            canvas: Some(canvas_receiver(file_name)),
        }
    }

    /// The canvas receiver commands are sent to, if a patch is open.
    pub fn canvas(&self) -> Option<&str> {
        self.canvas.as_deref()
    }

    /// The underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the underlying sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the adapter, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Opens `path` in the engine and targets its canvas from now on.
    pub fn open(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path
            .parent()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        self.deliver(
            EngineCommand::new(PD_RECEIVER, "open")
                .arg(escape_atom(&file))
                .arg(escape_atom(&dir)),
        )?;
        self.canvas = Some(canvas_receiver(&file));
        Ok(())
    }

    /// Creates an object box at `(x, y)` from its creation atoms.
    pub fn create_object(&mut self, x: i32, y: i32, atoms: &[String]) -> Result<(), EngineError> {
        let cmd = self.canvas_command("obj")?.arg(x).arg(y).args(atoms);
        self.deliver(cmd)
    }

    /// Connects outlet `p1` of box `n1` to inlet `p2` of box `n2`.
    pub fn connect(&mut self, n1: usize, p1: usize, n2: usize, p2: usize) -> Result<(), EngineError> {
        let cmd = self.canvas_command("connect")?.args([n1, p1, n2, p2]);
        self.deliver(cmd)
    }

    /// Removes the connection from outlet `p1` of box `n1` to inlet `p2` of
    /// box `n2`.
    pub fn disconnect(
        &mut self,
        n1: usize,
        p1: usize,
        n2: usize,
        p2: usize,
    ) -> Result<(), EngineError> {
        let cmd = self.canvas_command("disconnect")?.args([n1, p1, n2, p2]);
        self.deliver(cmd)
    }

    /// Selects the box named `name` that has `occurrence` same-named boxes
    /// before it: one `find`, then `occurrence` × `findagain`.
    pub fn find(&mut self, name: &str, occurrence: usize) -> Result<(), EngineError> {
        let cmd = self.canvas_command("find")?.arg(name);
        self.deliver(cmd)?;
        for _ in 0..occurrence {
            let cmd = self.canvas_command("findagain")?;
            self.deliver(cmd)?;
        }
        Ok(())
    }

    /// Deletes the current selection.
    pub fn cut(&mut self) -> Result<(), EngineError> {
        let cmd = self.canvas_command("cut")?;
        self.deliver(cmd)
    }

    /// Closes the open patch. Later canvas commands fail until another
    /// patch is opened.
    pub fn close(&mut self) -> Result<(), EngineError> {
        let cmd = self.canvas_command("menuclose")?;
        self.deliver(cmd)?;
        self.canvas = None;
        Ok(())
    }

    fn canvas_command(&self, selector: &str) -> Result<EngineCommand, EngineError> {
        match &self.canvas {
            Some(canvas) => Ok(EngineCommand::new(canvas.as_str(), selector)),
            None => Err(EngineError::NoCanvas(selector.to_string())),
        }
    }

    fn deliver(&mut self, command: EngineCommand) -> Result<(), EngineError> {
        debug!("engine_send: {command}");
        self.sink.send(&command)
    }
}

/// The engine's receiver name for the canvas of `file_name`.
pub fn canvas_receiver(file_name: &str) -> String {
    format!("pd-{file_name}")
}
