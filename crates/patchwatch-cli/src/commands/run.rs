//! Interactive routing session.
//!
//! Starts (or connects to) the engine with a generated router patch, opens a
//! rack with one column per channel, then reads shell lines from stdin until
//! `quit`, end of input, or Ctrl+C.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use clap::Args;
use patchwatch_config::PatchwatchConfig;
use patchwatch_core::session::{RACK_FILE, list_patches};
use patchwatch_core::{
    ChainRouter, CommandSink, EngineProcess, FudiSink, GraphEditor, LiveEngine, PatchLoader,
    Rack, Session,
};
use patchwatch_registry::WidgetRegistry;
use tracing::{info, warn};

use super::common::{load_config, patch_dir};
use crate::shell::{HELP, PatchRef, ShellCommand, parse_line};

const PROMPT: &str = "patchwatch> ";

#[derive(Args)]
pub struct RunArgs {
    /// Patch library directory
    #[arg(short = 'd', long, value_name = "DIR")]
    patch_dir: Option<PathBuf>,

    /// Engine host
    #[arg(long)]
    host: Option<String>,

    /// Engine netreceive port
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of channels in the rack
    #[arg(short, long)]
    channels: Option<usize>,

    /// Pd binary
    #[arg(long, value_name = "PATH")]
    pd: Option<PathBuf>,

    /// Start Pd with its GUI
    #[arg(long)]
    gui: bool,

    /// Connect to an already running Pd instead of starting one
    #[arg(long)]
    no_spawn: bool,

    /// Seconds to wait for the engine to accept connections
    #[arg(long, default_value_t = 5.0)]
    connect_timeout: f64,
}

impl RunArgs {
    /// Flags take precedence over the configuration file.
    fn apply(&self, mut config: PatchwatchConfig) -> PatchwatchConfig {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(pd) = &self.pd {
            config.pd_bin.clone_from(pd);
        }
        config.gui |= self.gui;
        if self.no_spawn {
            config.spawn_engine = false;
        }
        config
    }
}

pub fn run(args: RunArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let config = args.apply(load_config(config)?);
    config.validate()?;
    let library = patch_dir(&config, args.patch_dir.clone())?;
    let timeout = Duration::from_secs_f64(args.connect_timeout.max(0.0).min(3600.0));

    let session = Session::new(&library)?;
    let router_path = session.write_router(config.port, &[RACK_FILE])?;
    let registry = WidgetRegistry::new();
    let rack = Rack::build(&registry, config.channels)?;
    let rack_path = session.write_rack(&rack.graph)?;

    let process = if config.spawn_engine {
        Some(EngineProcess::spawn(&config.pd_bin, &router_path, config.gui)?)
    } else {
        None
    };

    let sink = FudiSink::connect_within(&config.host, config.port, timeout)?;
    info!("connected to engine at {}:{}", config.host, config.port);
    let mut engine = LiveEngine::new(sink);
    engine.open(&rack_path)?;

    let mut router = ChainRouter::with_resolver(
        GraphEditor::with_graph(rack.graph, engine),
        Box::new(session.variants()),
    );
    for (channel, taps) in rack.taps {
        router.attach(channel, taps)?;
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut out = std::io::stdout();
    println!(
        "Routing {} channel(s) through {}",
        config.channels,
        rack_path.display()
    );
    if let Err(e) = execute(&mut router, &library, &registry, ShellCommand::List, &mut out) {
        warn!("{e:#}");
    }
    let result = shell_loop(&mut router, &library, &registry, &running, &mut out);
    finish(result, router, process, session)
}

/// Tears down whatever the loop ended with, then hands its result back.
fn finish<S: CommandSink>(
    result: anyhow::Result<()>,
    router: ChainRouter<S>,
    process: Option<EngineProcess>,
    session: Session,
) -> anyhow::Result<()> {
    shutdown(router, process, session);
    println!("OK. Bye!");
    result
}

fn shell_loop<S: CommandSink>(
    router: &mut ChainRouter<S>,
    library: &Path,
    registry: &WidgetRegistry,
    running: &AtomicBool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let lines = spawn_line_reader();
    write!(out, "{PROMPT}")?;
    out.flush()?;

    while running.load(Ordering::SeqCst) {
        let line = match lines.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        match parse_line(&line) {
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = execute(router, library, registry, command, out) {
                    writeln!(out, "error: {e:#}")?;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "{e}")?,
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}

/// Forwards stdin lines so the loop can also watch the Ctrl+C flag.
fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Runs one shell command against the router.
pub fn execute<S: CommandSink>(
    router: &mut ChainRouter<S>,
    library: &Path,
    registry: &WidgetRegistry,
    command: ShellCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::List => {
            let patches = list_patches(library)?;
            writeln!(out, "Available patches:")?;
            for (i, name) in patches.iter().enumerate() {
                writeln!(out, "{:<3} {}", i + 1, name)?;
            }
        }
        ShellCommand::Insert { target, channel } => {
            let name = resolve(&target, library)?;
            let index = router.insert(&name, channel)?;
            writeln!(out, "Inserted {name} on channel {channel} (object {index}).")?;
        }
        ShellCommand::Remove { target, channel } => {
            let name = resolve(&target, library)?;
            match router.remove(&name, channel)? {
                Some(_) => writeln!(out, "Removed {name} from channel {channel}.")?,
                None => writeln!(out, "{name} is not on channel {channel}.")?,
            }
        }
        ShellCommand::Show(None) => {
            let graph = router.editor().graph();
            for channel in router.channels() {
                let path: Vec<&str> = router
                    .signal_path(channel)
                    .into_iter()
                    .filter_map(|i| graph.node(i).map(|n| n.display_name()))
                    .collect();
                writeln!(out, "ch{channel}: {}", path.join(" -> "))?;
            }
        }
        ShellCommand::Show(Some(target)) => {
            let name = resolve(&target, library)?;
            let file = library.join(&name).with_extension("pd");
            let patch = PatchLoader::new(registry).load_file(&file)?;
            let widgets: Vec<_> = patch
                .graph
                .nodes()
                .enumerate()
                .filter_map(|(i, n)| n.widget.as_ref().map(|w| (i, w)))
                .collect();
            if widgets.is_empty() {
                writeln!(out, "No GUI elements in {name}.")?;
            } else {
                writeln!(out, "Patch GUI elements:")?;
                for (i, widget) in widgets {
                    writeln!(out, "{i:<3} {widget}")?;
                }
            }
        }
        ShellCommand::Stop => {
            let removed = router.stop_all()?;
            writeln!(out, "Stopped {} patch(es).", removed.len())?;
        }
        ShellCommand::Help => writeln!(out, "{HELP}")?,
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn resolve(target: &PatchRef, library: &Path) -> anyhow::Result<String> {
    let available = match target {
        PatchRef::Number(_) => list_patches(library)?,
        PatchRef::Name(_) => Vec::new(),
    };
    Ok(target.resolve(&available)?.to_string())
}

/// Tears everything down in reverse order, logging failures.
fn shutdown<S: CommandSink>(
    mut router: ChainRouter<S>,
    process: Option<EngineProcess>,
    session: Session,
) {
    if let Err(e) = router.stop_all() {
        warn!("failed to clear chains: {e}");
    }
    let (_, mut engine) = router.into_editor().into_parts();
    if let Err(e) = engine.close() {
        warn!("failed to close rack: {e}");
    }
    drop(engine);
    if let Some(process) = process
        && let Err(e) = process.shutdown()
    {
        warn!("failed to stop engine: {e}");
    }
    if let Err(e) = session.close() {
        warn!("failed to remove working directory: {e}");
    }
}
