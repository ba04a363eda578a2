use crate::cli::user::TargetArgs;
use crate::cli::CliContext;
use crate::core::properties::PropertiesFile;
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct ListItem {
    user: String,
    realm: Option<String>,
    groups: Vec<String>,
    file: String,
}

pub fn run(ctx: &CliContext, args: ListArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }
    let targets = args.targets.resolve(ctx)?;
    let items = collect(&targets.user_files, &targets.group_files)?;

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&items).context("serialize list")?;
        println!("{}", json);
        return Ok(());
    }

    if items.is_empty() {
        println!("No users found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("User").add_attribute(Attribute::Bold),
        Cell::new("Realm").add_attribute(Attribute::Bold),
        Cell::new("Groups").add_attribute(Attribute::Bold),
        Cell::new("File").add_attribute(Attribute::Bold),
    ]);
    for item in items {
        let groups = if item.groups.is_empty() {
            "-".to_string()
        } else {
            item.groups.join(",")
        };
        table.add_row(vec![
            item.user,
            item.realm.unwrap_or_else(|| "-".to_string()),
            groups,
            item.file,
        ]);
    }

    println!("{}", table);
    Ok(())
}

/// One row per user per user file; groups merged across all group files.
fn collect(user_files: &[PathBuf], group_files: &[PathBuf]) -> Result<Vec<ListItem>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in group_files {
        let props = PropertiesFile::load(file)?;
        for (user, value) in props.entries() {
            let slot = groups.entry(user.to_string()).or_default();
            for group in value.split(',').map(str::trim).filter(|g| !g.is_empty()) {
                if !slot.iter().any(|g| g == group) {
                    slot.push(group.to_string());
                }
            }
        }
    }

    let mut items = Vec::new();
    for file in user_files {
        let props = PropertiesFile::load(file)?;
        for (user, _) in props.entries() {
            items.push(ListItem {
                user: user.to_string(),
                realm: props.realm().map(str::to_string),
                groups: groups.get(user).cloned().unwrap_or_default(),
                file: file.display().to_string(),
            });
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_merges_groups() {
        let dir = TempDir::new().unwrap();
        let users = dir.path().join("mgmt-users.properties");
        let groups_a = dir.path().join("a-groups.properties");
        let groups_b = dir.path().join("b-groups.properties");
        fs::write(
            &users,
            "#$REALM_NAME=ManagementRealm$ marker\nadmin=aa\nmonitor=bb\n",
        )
        .unwrap();
        fs::write(&groups_a, "admin=SuperUser,Operator\n").unwrap();
        fs::write(&groups_b, "admin=Operator, Auditor\n").unwrap();

        let items = collect(&[users.clone()], &[groups_a, groups_b]).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].user, "admin");
        assert_eq!(items[0].realm.as_deref(), Some("ManagementRealm"));
        assert_eq!(items[0].groups, vec!["SuperUser", "Operator", "Auditor"]);
        assert!(items[1].groups.is_empty());
        assert_eq!(items[1].file, users.display().to_string());
    }

    #[test]
    fn test_collect_never_exposes_digests() {
        let dir = TempDir::new().unwrap();
        let users = dir.path().join("mgmt-users.properties");
        fs::write(&users, "admin=c12071f8e70ddd1fc3675c956f14cbff\n").unwrap();
        let items = collect(&[users], &[]).unwrap();
        let json = serde_json::to_string(&items).unwrap();
        assert!(!json.contains("c12071f8e70ddd1fc3675c956f14cbff"));
    }
}
