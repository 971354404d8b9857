//! `flowsmith init` - write a default project config.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::domain::models::Config;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

pub async fn execute(args: InitArgs, json: bool) -> Result<()> {
    let dir = Path::new(".flowsmith");
    let path = dir.join("config.yaml");

    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    std::fs::create_dir_all(dir).context("failed to create .flowsmith directory")?;
    let yaml = serde_yaml::to_string(&Config::default())
        .context("failed to serialize default config")?;
    std::fs::write(&path, yaml).context("failed to write config file")?;

    if json {
        println!("{}", serde_json::json!({"created": path.display().to_string()}));
    } else {
        println!("Created {}", path.display());
    }
    Ok(())
}
