use crate::cli::console;
use crate::cli::user::TargetArgs;
use crate::cli::CliContext;
use crate::core::digest::RealmDigest;
use crate::core::properties::PropertiesFile;
use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::Password;
use std::path::Path;
use zeroize::Zeroizing;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// User name
    #[arg(long, short = 'u', value_name = "NAME")]
    pub user: String,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Match,
    Mismatch,
    Missing,
}

pub fn run(ctx: &CliContext, args: CheckArgs) -> Result<()> {
    if ctx.non_interactive && !args.password_stdin {
        bail!("--non-interactive requires --password-stdin for check");
    }
    let targets = args.targets.resolve(ctx)?;
    let password = read_password(args.password_stdin, &args.user)?;
    let default_realm = targets.kind.default_realm(&ctx.config.realms);
    let digest = RealmDigest::new(ctx.config.digest.algorithm.clone());

    let mut failures = 0usize;
    for file in &targets.user_files {
        let verdict = check_file(&digest, file, &args.user, &password, &default_realm)?;
        let label = match verdict {
            Verdict::Match => "OK",
            Verdict::Mismatch => "FAIL",
            Verdict::Missing => "MISSING",
        };
        if verdict != Verdict::Match {
            failures += 1;
        }
        println!("  [{}] {}", label, file.display());
    }

    if failures > 0 {
        bail!(
            "password for '{}' does not match in {} of {} file(s)",
            args.user,
            failures,
            targets.user_files.len()
        );
    }
    Ok(())
}

fn check_file(
    digest: &RealmDigest,
    file: &Path,
    user: &str,
    password: &str,
    default_realm: &str,
) -> Result<Verdict> {
    let props = PropertiesFile::load(file)?;
    let Some(stored) = props.get(user) else {
        return Ok(Verdict::Missing);
    };
    let realm = props.realm().unwrap_or(default_realm);
    let matches = digest.matches(user, realm, password, stored)?;
    Ok(if matches {
        Verdict::Match
    } else {
        Verdict::Mismatch
    })
}

fn read_password(from_stdin: bool, user: &str) -> Result<Zeroizing<String>> {
    if from_stdin {
        return console::read_password_stdin();
    }
    Ok(Zeroizing::new(
        Password::new()
            .with_prompt(format!("Password for {}", user))
            .interact()
            .context("read password from prompt")?,
    ))
}
