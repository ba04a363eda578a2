use crate::cli::CliContext;
use crate::core::audit_log::{self, AuditEntry};
use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recent add/update runs
    Log(AuditLogArgs),
    /// Check that no audit entry was altered or removed
    Verify,
}

#[derive(Args, Debug, Default)]
pub struct AuditLogArgs {
    /// Maximum number of entries to display (after filtering)
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Only runs that provisioned this user
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Only runs against this realm
    #[arg(long, value_name = "NAME")]
    pub realm: Option<String>,

    /// Only runs that ended with an error state
    #[arg(long)]
    pub failed: bool,
}

pub fn run(ctx: &CliContext, cmd: AuditCommand) -> Result<()> {
    match cmd {
        AuditCommand::Log(args) => run_log(ctx, args),
        AuditCommand::Verify => run_verify(ctx),
    }
}

fn is_failure(entry: &AuditEntry) -> bool {
    entry.result.as_ref().is_some_and(|r| !r.success)
}

/// The newest `args.limit` entries matching the filters, oldest first.
fn filter_entries<'a>(entries: &'a [AuditEntry], args: &AuditLogArgs) -> Vec<&'a AuditEntry> {
    let matching: Vec<&AuditEntry> = entries
        .iter()
        .filter(|e| args.user.as_deref().map_or(true, |u| e.user == u))
        .filter(|e| args.realm.as_deref().map_or(true, |r| e.realm == r))
        .filter(|e| !args.failed || is_failure(e))
        .collect();
    let skip = matching.len().saturating_sub(args.limit);
    matching.into_iter().skip(skip).collect()
}

/// Target files one per line, relative to `home` when inside it.
fn files_cell(home: &Path, files: &[String]) -> String {
    if files.is_empty() {
        return "-".to_string();
    }
    files
        .iter()
        .map(|f| match Path::new(f).strip_prefix(home) {
            Ok(rel) => rel.display().to_string(),
            Err(_) => f.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn result_cell(entry: &AuditEntry) -> Cell {
    match &entry.result {
        Some(r) if r.success => Cell::new("OK").fg(Color::Green),
        Some(r) => Cell::new(format!("FAIL: {}", r.error.as_deref().unwrap_or("?"))).fg(Color::Red),
        None => Cell::new("-"),
    }
}

fn realm_label(realm: &str) -> &str {
    if realm.is_empty() {
        "(none)"
    } else {
        realm
    }
}

fn run_log(ctx: &CliContext, args: AuditLogArgs) -> Result<()> {
    let all = audit_log::read_log(&ctx.paths, None)?;
    let entries = filter_entries(&all, &args);

    if entries.is_empty() {
        println!("No matching audit entries.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Timestamp").add_attribute(Attribute::Bold),
        Cell::new("Action").add_attribute(Attribute::Bold),
        Cell::new("User").add_attribute(Attribute::Bold),
        Cell::new("Realm").add_attribute(Attribute::Bold),
        Cell::new("Actor").add_attribute(Attribute::Bold),
        Cell::new("Files").add_attribute(Attribute::Bold),
        Cell::new("Result").add_attribute(Attribute::Bold),
    ]);

    for entry in &entries {
        let local: DateTime<Local> = entry.timestamp.into();
        table.add_row(vec![
            Cell::new(local.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.action),
            Cell::new(&entry.user),
            Cell::new(realm_label(&entry.realm)),
            Cell::new(&entry.actor),
            Cell::new(files_cell(&ctx.paths.home, &entry.files)),
            result_cell(entry),
        ]);
    }

    println!("{}", table);
    let failed = entries.iter().filter(|e| is_failure(e)).count();
    println!("\n{} entries shown, {} failed.", entries.len(), failed);
    Ok(())
}

fn run_verify(ctx: &CliContext) -> Result<()> {
    let (total, errors) = audit_log::verify_chain(&ctx.paths)?;

    if total == 0 {
        println!("No audit entries to verify.");
        return Ok(());
    }

    for err in &errors {
        println!("  [FAIL] {}", err);
    }

    if !errors.is_empty() {
        bail!(
            "audit trail of {} entries has {} broken links; provisioning history may have been edited",
            total,
            errors.len()
        );
    }
    println!("Audit trail: {} provisioning entries verified.", total);
    Ok(())
}
