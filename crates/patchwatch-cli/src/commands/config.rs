//! Configuration file management.

use std::path::Path;

use clap::Args;
use patchwatch_config::{PatchwatchConfig, config_file};

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the default configuration file
    #[arg(long)]
    init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    force: bool,
}

pub fn run(args: ConfigArgs, path: Option<&Path>) -> anyhow::Result<()> {
    let target = path.map_or_else(config_file, Path::to_path_buf);

    if args.init {
        if target.exists() && !args.force {
            anyhow::bail!(
                "Config '{}' already exists. Use --force to overwrite.",
                target.display()
            );
        }
        PatchwatchConfig::default().save(&target)?;
        println!("Wrote {}", target.display());
        return Ok(());
    }

    let config = load_config(path)?;
    println!("# {}", target.display());
    print!("{}", config.to_toml()?);
    if let Err(e) = config.validate() {
        println!("# warning: {e}");
    }
    Ok(())
}
