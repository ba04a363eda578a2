use crate::cli::console::{self, TerminalConsole};
use crate::cli::wizard::{Outcome, Wizard};
use crate::cli::CliContext;
use crate::core::digest::RealmDigest;
use crate::core::file_lock::FileLock;
use crate::core::handlers::Mode;
use crate::core::paths::RealmKind;
use crate::models::state::StateValues;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Which property files to work on.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Use the application realm files instead of the management realm files
    #[arg(long, short = 'a')]
    pub application: bool,

    /// User properties file (repeatable; replaces discovery)
    #[arg(long, value_name = "PATH")]
    pub user_file: Vec<PathBuf>,

    /// Group properties file (repeatable; replaces discovery)
    #[arg(long, value_name = "PATH")]
    pub group_file: Vec<PathBuf>,
}

/// Resolved target files for a command.
#[derive(Debug)]
pub struct Targets {
    pub kind: RealmKind,
    pub user_files: Vec<PathBuf>,
    pub group_files: Vec<PathBuf>,
}

impl TargetArgs {
    pub fn resolve(&self, ctx: &CliContext) -> Result<Targets> {
        let kind = RealmKind::from_flag(self.application);
        let user_files = if self.user_file.is_empty() {
            ctx.paths.discover(kind.users_file())?
        } else {
            self.user_file.clone()
        };
        if user_files.is_empty() {
            bail!(
                "no {} found under {}/*/configuration (use --home or --user-file)",
                kind.users_file(),
                ctx.paths.home.display()
            );
        }
        let group_files = if self.group_file.is_empty() && self.user_file.is_empty() {
            ctx.paths.discover(kind.groups_file())?
        } else {
            self.group_file.clone()
        };
        Ok(Targets {
            kind,
            user_files,
            group_files,
        })
    }
}

#[derive(Args, Debug)]
pub struct UserArgs {
    /// User name
    #[arg(long, short = 'u', value_name = "NAME")]
    pub user: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,

    /// Realm name (default: from config for the chosen realm files)
    #[arg(long, short = 'r')]
    pub realm: Option<String>,

    /// Comma-separated groups for the user
    #[arg(long, short = 'g', value_name = "GROUPS")]
    pub groups: Option<String>,

    /// Suppress progress output and confirmation prompts
    #[arg(long, short = 's')]
    pub silent: bool,

    #[command(flatten)]
    pub targets: TargetArgs,
}

pub fn run(ctx: &CliContext, mode: Mode, args: UserArgs) -> Result<()> {
    if ctx.non_interactive && !args.password_stdin {
        bail!("--non-interactive requires --password-stdin");
    }

    let targets = args.targets.resolve(ctx)?;
    let realm = args
        .realm
        .clone()
        .unwrap_or_else(|| targets.kind.default_realm(&ctx.config.realms));
    let password = if args.password_stdin {
        console::read_password_stdin()?
    } else {
        Zeroizing::new(String::new())
    };

    let values = StateValues {
        user_name: args.user.unwrap_or_default().trim().to_string(),
        realm,
        password,
        groups: args.groups,
        silent: args.silent,
        user_files: targets.user_files,
        group_files: targets.group_files,
    };

    let _lock = FileLock::exclusive_or_wait(&ctx.paths.lock, || {
        eprintln!("waiting for another realm-users run to finish...");
    })?;

    let digest = RealmDigest::new(ctx.config.digest.algorithm.clone());
    let mut console = TerminalConsole;
    let outcome = Wizard::new(
        &mut console,
        &digest,
        &ctx.config.policy,
        mode,
        !ctx.non_interactive,
        values,
    )
    .run();

    match outcome {
        Outcome::Completed { mode, values } => {
            ctx.audit(mode, &values, true, None);
            Ok(())
        }
        Outcome::Failed { mode, error } => {
            // Nothing was collected if the user name never validated.
            if !error.state_values.user_name.is_empty() {
                ctx.audit(mode, &error.state_values, false, Some(error.message.clone()));
            }
            bail!("{}", error.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::ServerPaths;
    use crate::models::config::ConfigFile;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(home: &std::path::Path) -> CliContext {
        CliContext {
            paths: ServerPaths::from_home(home.to_path_buf()),
            non_interactive: true,
            config: ConfigFile::default(),
        }
    }

    fn targets(application: bool) -> TargetArgs {
        TargetArgs {
            application,
            user_file: Vec::new(),
            group_file: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_discovers_users_and_groups() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("standalone/configuration");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("mgmt-users.properties"), "").unwrap();
        fs::write(config_dir.join("mgmt-groups.properties"), "").unwrap();

        let resolved = targets(false).resolve(&ctx(dir.path())).unwrap();
        assert_eq!(resolved.kind, RealmKind::Management);
        assert_eq!(resolved.user_files, vec![config_dir.join("mgmt-users.properties")]);
        assert_eq!(resolved.group_files, vec![config_dir.join("mgmt-groups.properties")]);
    }

    #[test]
    fn test_resolve_without_files_fails() {
        let dir = TempDir::new().unwrap();
        let err = targets(true).resolve(&ctx(dir.path())).unwrap_err();
        assert!(err.to_string().contains("no application-users.properties found"));
    }

    #[test]
    fn test_explicit_user_file_skips_group_discovery() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("standalone/configuration");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("mgmt-groups.properties"), "").unwrap();

        let args = TargetArgs {
            application: false,
            user_file: vec![dir.path().join("custom-users.properties")],
            group_file: Vec::new(),
        };
        let resolved = args.resolve(&ctx(dir.path())).unwrap();
        assert_eq!(resolved.user_files.len(), 1);
        assert!(resolved.group_files.is_empty());
    }
}
