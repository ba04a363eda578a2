use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = realm_users::cli::Cli::parse();
    cli.run()
}
