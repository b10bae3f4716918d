//! Patch file inspection.

use std::path::PathBuf;

use clap::Args;
use patchwatch_core::PatchLoader;
use patchwatch_core::document::{read_document, render_document};
use patchwatch_core::loader::rewrite_audio_channels;
use patchwatch_registry::WidgetRegistry;

#[derive(Args)]
pub struct InspectArgs {
    /// Patch file to inspect
    #[arg(value_name = "PATCH")]
    patch: PathBuf,

    /// Show the patch as instantiated on this channel (0-based)
    #[arg(short, long)]
    channel: Option<usize>,

    /// Print the patch text instead of the summary
    #[arg(long)]
    raw: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let mut elements = read_document(&args.patch)?;
    if let Some(channel) = args.channel {
        elements = rewrite_audio_channels(&elements, channel);
    }
    if args.raw {
        print!("{}", render_document(&elements));
        return Ok(());
    }

    let registry = WidgetRegistry::new();
    let patch = PatchLoader::new(&registry).load(&elements)?;
    let graph = &patch.graph;

    let title = format!("Patch: {}", args.patch.display());
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!();

    println!("Objects ({}):", graph.len());
    for (i, node) in graph.nodes().enumerate() {
        let (x, y) = node.position;
        println!("  {i:<3} {:<40} ({x}, {y})", node.to_string());
    }
    println!();

    println!("Connections ({}):", graph.connections().len());
    for edge in graph.connections().iter() {
        println!("  {edge}");
    }
    println!();

    let widgets: Vec<_> = graph
        .nodes()
        .enumerate()
        .filter_map(|(i, node)| node.widget.as_ref().map(|w| (i, w)))
        .collect();
    println!("GUI elements ({}):", widgets.len());
    for (i, widget) in widgets {
        println!("  {i:<3} {widget}");
    }
    println!();

    let io: Vec<String> = patch.audio_io.iter().map(ToString::to_string).collect();
    println!("Audio I/O: {}", if io.is_empty() { "(none)".to_string() } else { io.join(", ") });
    Ok(())
}
