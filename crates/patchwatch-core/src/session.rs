//! Per-session working directory.
//!
//! A [`Session`] owns a temporary directory holding every patch generated
//! while patchwatch runs: the router the engine is started with, the rack
//! effects are spliced into, and one copy of each effect per channel with its
//! audio I/O rewired. The directory is removed when the session is closed or
//! dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::chain::EffectResolver;
use crate::document::{Element, read_document, write_document};
use crate::engine::{PD_RECEIVER, canvas_receiver};
use crate::error::{SessionError, ValidationError};
use crate::graph::PatchGraph;
use crate::loader::rewrite_audio_channels;
use crate::node::{Node, NodeClass};
use crate::socket::Socket;

/// File name of the generated router patch.
pub const ROUTER_FILE: &str = "router.pd";

/// File name of the generated rack patch.
pub const RACK_FILE: &str = "rack.pd";

/// Patch file extension.
pub const PATCH_EXTENSION: &str = "pd";

/// Owns the working directory and knows the effect library.
#[derive(Debug)]
pub struct Session {
    library: PathBuf,
    workdir: TempDir,
}

impl Session {
    /// Creates a session over the effect library at `library`.
    pub fn new(library: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let workdir = tempfile::Builder::new()
            .prefix("patchwatch-")
            .tempdir()
            .map_err(SessionError::WorkDir)?;
        debug!("session_open: {}", workdir.path().display());
        Ok(Self {
            library: library.into(),
            workdir,
        })
    }

    /// Effect library directory.
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Working directory for generated patches.
    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Patch names in the library, sorted, without extension.
    pub fn available_patches(&self) -> Result<Vec<String>, SessionError> {
        list_patches(&self.library)
    }

    /// Writes the router patch forwarding `pd` and each of `files`' canvas
    /// receivers from the engine's `netreceive` port.
    pub fn write_router(&self, port: u16, files: &[&str]) -> Result<PathBuf, SessionError> {
        let path = self.workdir().join(ROUTER_FILE);
        write_document(&path, &router_elements(port, files)?)?;
        Ok(path)
    }

    /// Writes `graph` as the rack patch.
    pub fn write_rack(&self, graph: &PatchGraph) -> Result<PathBuf, SessionError> {
        let path = self.workdir().join(RACK_FILE);
        write_document(&path, &graph.to_elements())?;
        Ok(path)
    }

    /// A resolver writing per-channel effect copies into this session.
    pub fn variants(&self) -> VariantWriter {
        VariantWriter {
            library: self.library.clone(),
            workdir: self.workdir().to_path_buf(),
        }
    }

    /// Removes the working directory.
    pub fn close(self) -> Result<(), SessionError> {
        debug!("session_close: {}", self.workdir.path().display());
        self.workdir.close().map_err(SessionError::WorkDir)
    }
}

/// Writes `<name>-ch<channel>.pd` next to the rack for effects found in the
/// library and resolves to that abstraction's name. Names not in the library
/// resolve to themselves, so built-in objects can be inserted directly.
#[derive(Debug, Clone)]
pub struct VariantWriter {
    library: PathBuf,
    workdir: PathBuf,
}

impl VariantWriter {
    /// Object name of `name`'s copy for `channel`.
    pub fn variant_name(name: &str, channel: usize) -> String {
        format!("{name}-ch{channel}")
    }
}

impl EffectResolver for VariantWriter {
    fn resolve(&mut self, name: &str, channel: usize) -> Result<String, SessionError> {
        let source = self.library.join(name).with_extension(PATCH_EXTENSION);
        if !source.is_file() {
            return Ok(name.to_string());
        }
        let variant = Self::variant_name(name, channel);
        let target = self.workdir.join(&variant).with_extension(PATCH_EXTENSION);
        if !target.exists() {
            let elements = read_document(&source)?;
            write_document(&target, &rewrite_audio_channels(&elements, channel))?;
            debug!("session_variant: {} → {}", source.display(), target.display());
        }
        Ok(variant)
    }
}

/// Lists `*.pd` files in `dir` by stem, sorted.
pub fn list_patches(dir: &Path) -> Result<Vec<String>, SessionError> {
    let list_err = |source| SessionError::ListDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if path.extension().is_none_or(|e| e != PATCH_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem() {
            names.push(stem.to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Builds the router patch.
///
/// ```text
/// [netreceive port] → [route pd pd-a.pd ...] → [s pd] [s pd-a.pd] ...
/// [loadbang] → [; pd dsp 1(
/// ```
pub fn router_patch(port: u16, files: &[&str]) -> Result<PatchGraph, ValidationError> {
    let receivers: Vec<String> = std::iter::once(PD_RECEIVER.to_string())
        .chain(files.iter().map(|f| canvas_receiver(f)))
        .collect();

    let mut graph = PatchGraph::new();
    let netreceive = graph.push(Node::object("netreceive", vec![port.to_string()], (12, 10)));
    let route = graph.push(Node::object("route", receivers.clone(), (12, 40)));
    let sends: Vec<usize> = receivers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let y = 100 + 30 * i as i32;
            graph.push(Node::object("s", vec![name.clone()], (12, y)))
        })
        .collect();
    let loadbang = graph.push(Node::object("loadbang", Vec::new(), (300, 10)));
    let dsp_on = ["\\;", "pd", "dsp", "1"].map(String::from).to_vec();
    let dsp = graph.push(Node::boxed(NodeClass::Message, dsp_on, (300, 40)));

    let mut links = vec![
        (Socket::new(netreceive, 0), Socket::new(route, 0)),
        (Socket::new(loadbang, 0), Socket::new(dsp, 0)),
    ];
    links.extend(
        sends
            .iter()
            .enumerate()
            .map(|(outlet, &send)| (Socket::new(route, outlet), Socket::new(send, 0))),
    );
    for (from, to) in links {
        graph.link(from, to)?;
    }
    Ok(graph)
}

/// Renders `router_patch` as elements.
pub fn router_elements(port: u16, files: &[&str]) -> Result<Vec<Element>, ValidationError> {
    Ok(router_patch(port, files)?.to_elements())
}
