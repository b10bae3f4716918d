//! Patch library listing.

use std::path::{Path, PathBuf};

use clap::Args;
use patchwatch_core::session::list_patches;

use super::common::{load_config, patch_dir};

#[derive(Args)]
pub struct PatchesArgs {
    /// Library directory (overrides `patch_dir` from the config)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

pub fn run(args: PatchesArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let dir = patch_dir(&config, args.dir)?;
    let patches = list_patches(&dir)?;

    println!("Available patches in {}:", dir.display());
    if patches.is_empty() {
        println!("  (none)");
    }
    for (i, name) in patches.iter().enumerate() {
        println!("{:<3} {}", i + 1, name);
    }
    Ok(())
}
