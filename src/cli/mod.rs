//! CLI routing and command dispatch.

use crate::core::audit_log::{self, AuditContext};
use crate::core::handlers::Mode;
use crate::core::paths::ServerPaths;
use crate::models::config::ConfigFile;
use crate::models::state::StateValues;
use crate::util::journald::{self, Priority};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod audit;
pub mod check;
pub mod console;
pub mod init;
pub mod list;
pub mod user;
pub mod wizard;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: ServerPaths,
    pub non_interactive: bool,
    pub config: ConfigFile,
}

impl CliContext {
    /// Record a provisioning run, and optionally forward it to journald.
    pub fn audit(&self, mode: Mode, values: &StateValues, success: bool, error: Option<String>) {
        let files = values
            .user_files
            .iter()
            .chain(values.group_files.iter())
            .map(|f| f.display().to_string())
            .collect();
        let ctx = AuditContext {
            action: mode.action().to_string(),
            user: values.user_name.clone(),
            realm: values.realm.clone(),
            files,
        };
        // audit failures are visible but never undo a completed write
        let line = match audit_log::log(&self.paths, ctx, success, error) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("warning: audit log failed: {:#}", e);
                return;
            }
        };

        if self.config.policy.journald_audit {
            let priority = if success {
                Priority::Info
            } else {
                Priority::Warning
            };
            journald::forward(&line, priority);
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "realm-users", version, about = "Add and update users in property-file security realms")]
pub struct Cli {
    /// Server installation root (contains standalone/ and domain/)
    #[arg(long, global = true, value_name = "PATH", env = "REALM_USERS_HOME")]
    pub home: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "REALM_USERS_NON_INTERACTIVE")]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = ServerPaths::resolve(self.home)?;

        // Best-effort: a broken config falls back to defaults with a warning.
        let config = match crate::core::config::load(&paths.config_toml) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("warning: cannot read {}: {:#}", paths.config_toml.display(), e);
                ConfigFile::default()
            }
        };

        let ctx = CliContext {
            paths,
            non_interactive: self.non_interactive,
            config,
        };

        match self.command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::Add(args) => user::run(&ctx, Mode::Add, args),
            Commands::Update(args) => user::run(&ctx, Mode::Update, args),
            Commands::List(args) => list::run(&ctx, args),
            Commands::Check(args) => check::run(&ctx, args),
            Commands::Audit { command } => audit::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the state directory and a default config file
    Init(init::InitArgs),
    /// Add a user (or overwrite an existing one) in the realm's property files
    Add(user::UserArgs),
    /// Change the password and groups of an existing user
    Update(user::UserArgs),
    /// List users in the realm's property files
    List(list::ListArgs),
    /// Check a password against the stored digests
    Check(check::CheckArgs),
    /// View or verify the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
}
