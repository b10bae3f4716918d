//! Engine process lifetime.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::EngineError;

/// A running engine process started with a router patch.
///
/// The process is killed when the handle is dropped.
#[derive(Debug)]
pub struct EngineProcess {
    binary: PathBuf,
    child: Option<Child>,
}

impl EngineProcess {
    /// Command-line arguments for launching the engine on `router`.
    pub fn arguments(router: &Path, gui: bool) -> Vec<String> {
        let mut args = vec!["-stderr".to_string()];
        if !gui {
            args.push("-nogui".to_string());
        }
        args.push("-open".to_string());
        args.push(router.to_string_lossy().into_owned());
        args
    }

    /// Starts `binary` with the router patch open.
    pub fn spawn(binary: &Path, router: &Path, gui: bool) -> Result<Self, EngineError> {
        let args = Self::arguments(router, gui);
        debug!("engine_spawn: {} {}", binary.display(), args.join(" "));
        let child = Command::new(binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: binary.to_path_buf(),
                source,
            })?;
        info!("started engine '{}' (pid {})", binary.display(), child.id());
        Ok(Self {
            binary: binary.to_path_buf(),
            child: Some(child),
        })
    }

    /// Binary the process was started from.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Returns true while the process has not exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_)) | Err(_)) | None => false,
        }
    }

    /// Stops the process and waits for it to exit.
    pub fn shutdown(mut self) -> Result<(), EngineError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let spawn_error = |source| EngineError::Spawn {
            path: self.binary.clone(),
            source,
        };
        if child.try_wait().map_err(spawn_error)?.is_none() {
            child.kill().map_err(spawn_error)?;
        }
        let status = child.wait().map_err(spawn_error)?;
        debug!("engine_exit: {status}");
        Ok(())
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("failed to stop engine: {e}");
        }
    }
}
