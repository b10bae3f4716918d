//! Outbound command sinks.
//!
//! [`CommandSink`] is the seam between the graph model and the running
//! engine. Production code writes FUDI lines to the engine's `netreceive`
//! socket through [`FudiSink`]; tests use [`RecordingSink`] to assert on the
//! exact command sequence without a running engine.

use std::io::Write;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use crate::engine::EngineCommand;
use crate::error::EngineError;

/// Delivers commands to the engine. Fire-and-forget: nothing is read back.
pub trait CommandSink {
    /// Writes one command.
    fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        (**self).send(command)
    }
}

// ─── FUDI stream ────────────────────────────────────────────────────

/// Writes each command as one `;`-terminated line.
#[derive(Debug)]
pub struct FudiSink<W: Write> {
    writer: W,
}

impl<W: Write> FudiSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl FudiSink<TcpStream> {
    /// Connects to the engine's `netreceive` port.
    pub fn connect(host: &str, port: u16) -> Result<Self, EngineError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr).map_err(|source| EngineError::Connect {
            addr: addr.clone(),
            source,
        })?;
        stream.set_nodelay(true).map_err(|source| EngineError::Connect { addr, source })?;
        Ok(Self::new(stream))
    }

    /// Retries [`connect`](Self::connect) until it succeeds or `timeout`
    /// elapses. The engine opens its port some time after the process starts.
    pub fn connect_within(host: &str, port: u16, timeout: Duration) -> Result<Self, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::connect(host, port) {
                Ok(sink) => return Ok(sink),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(e) => {
                    tracing::debug!("engine_connect: retrying after {e}");
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}

impl<W: Write> CommandSink for FudiSink<W> {
    fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        let line = command.to_string();
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|source| EngineError::Delivery {
                command: line,
                source,
            })
    }
}

// ─── Recording ──────────────────────────────────────────────────────

/// Records every command for assertions. All sends succeed unless a failure
/// has been armed with [`fail_on`](Self::fail_on).
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    commands: Vec<EngineCommand>,
    fail_on: Option<String>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later command with `selector` fail with
    /// [`EngineError::Rejected`]. Failed commands are not recorded.
    pub fn fail_on(mut self, selector: &str) -> Self {
        self.fail_on = Some(selector.to_string());
        self
    }

    /// Return all recorded commands.
    pub fn commands(&self) -> &[EngineCommand] {
        &self.commands
    }

    /// Recorded commands rendered as FUDI lines.
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }

    /// Count commands with `selector`.
    pub fn count(&self, selector: &str) -> usize {
        self.commands.iter().filter(|c| c.selector == selector).count()
    }

    /// Clear recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        if self.fail_on.as_deref() == Some(command.selector.as_str()) {
            return Err(EngineError::Rejected(command.to_string()));
        }
        self.commands.push(command.clone());
        Ok(())
    }
}

// ─── Null ───────────────────────────────────────────────────────────

/// Discards every command. Used when no engine is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn send(&mut self, _command: &EngineCommand) -> Result<(), EngineError> {
        Ok(())
    }
}
