use crate::cli::CliContext;
use crate::constants;
use crate::core::config;
use crate::util::fs as server_fs;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file with defaults
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let paths = &ctx.paths;
    server_fs::ensure_dir(&paths.state_dir, constants::STATE_DIR_MODE)?;

    if paths.config_toml.exists() && !args.force {
        println!("config already present at {}", paths.config_toml.display());
    } else {
        let defaults = crate::models::config::ConfigFile::default();
        config::save(&paths.config_toml, &defaults)?;
        println!("wrote {}", paths.config_toml.display());
    }

    for file in [constants::MGMT_USERS_FILE, constants::APPLICATION_USERS_FILE] {
        let found = paths.discover(file)?;
        if found.is_empty() {
            println!("{}: none found under {}", file, paths.home.display());
        }
        for path in found {
            println!("{}: {}", file, path.display());
        }
    }

    Ok(())
}
