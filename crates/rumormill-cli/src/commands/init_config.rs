use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use rumormill_core::RumormillConfig;

#[derive(Args)]
pub struct InitConfigArgs {
    /// Where to write the file
    #[arg(default_value = "rumormill.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }

    let content = RumormillConfig::default()
        .to_toml()
        .context("Failed to render default configuration")?;
    std::fs::write(&args.path, content)
        .with_context(|| format!("Failed to write {}", args.path.display()))?;

    println!("Wrote {}", args.path.display());
    Ok(())
}
