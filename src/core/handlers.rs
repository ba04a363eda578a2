//! The two property-file handlers: adding a new user and updating one.
//!
//! Both write through [`PropertiesFile`]; they differ in wording and in
//! whether a user missing from a user file is inserted or rejected.

use crate::core::properties::{KeyPolicy, PropertiesFile};
use crate::core::update::PropertiesHandler;
use crate::models::state::Entry;
use anyhow::Result;
use std::path::Path;

/// Which handler a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Update,
}

impl Mode {
    /// Audit action name.
    pub fn action(self) -> &'static str {
        match self {
            Mode::Add => "add-user",
            Mode::Update => "update-user",
        }
    }

    pub fn handler(self, user_name: &str, groups: Option<&str>) -> Box<dyn PropertiesHandler> {
        match self {
            Mode::Add => Box::new(AddUser::new(user_name, groups)),
            Mode::Update => Box::new(UpdateUser::new(user_name, groups)),
        }
    }
}

fn write_user(entry: &Entry, file: &Path, realm: &str, policy: KeyPolicy) -> Result<()> {
    let mut props = match policy {
        KeyPolicy::Insert => PropertiesFile::load_or_empty(file)?,
        KeyPolicy::RequireExisting => PropertiesFile::load(file)?,
    };
    props.set_realm(realm)?;
    props.upsert(&entry.key, &entry.value, policy)?;
    props.save()
}

fn write_groups(entry: &Entry, file: &Path, create: bool) -> Result<()> {
    let mut props = if create {
        PropertiesFile::load_or_empty(file)?
    } else {
        PropertiesFile::load(file)?
    };
    // A user may gain groups on update, so group rows are always upserted.
    props.upsert(&entry.key, &entry.value, KeyPolicy::Insert)?;
    props.save()
}

fn groups_label(groups: Option<&str>) -> String {
    groups.unwrap_or_default().to_string()
}

/// Creates users; an existing entry is overwritten.
#[derive(Debug, Clone)]
pub struct AddUser {
    user_name: String,
    groups: String,
}

impl AddUser {
    pub fn new(user_name: &str, groups: Option<&str>) -> Self {
        Self {
            user_name: user_name.to_string(),
            groups: groups_label(groups),
        }
    }
}

impl PropertiesHandler for AddUser {
    fn persist_user(&self, entry: &Entry, file: &Path, realm: &str) -> Result<()> {
        write_user(entry, file, realm, KeyPolicy::Insert)
    }

    fn persist_groups(&self, entry: &Entry, file: &Path) -> Result<()> {
        write_groups(entry, file, true)
    }

    fn console_user_message(&self, path: &str) -> String {
        format!("Added user '{}' to file '{}'", self.user_name, path)
    }

    fn console_groups_message(&self, path: &str) -> String {
        format!(
            "Added user '{}' with groups {} to file '{}'",
            self.user_name, self.groups, path
        )
    }

    fn error_message(&self, path: &str, cause: &anyhow::Error) -> String {
        format!("Unable to add user to {} due to error {:#}", path, cause)
    }
}

/// Changes existing users; a user missing from a user file is an error.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    user_name: String,
    groups: String,
}

impl UpdateUser {
    pub fn new(user_name: &str, groups: Option<&str>) -> Self {
        Self {
            user_name: user_name.to_string(),
            groups: groups_label(groups),
        }
    }
}

impl PropertiesHandler for UpdateUser {
    fn persist_user(&self, entry: &Entry, file: &Path, realm: &str) -> Result<()> {
        write_user(entry, file, realm, KeyPolicy::RequireExisting)
    }

    fn persist_groups(&self, entry: &Entry, file: &Path) -> Result<()> {
        write_groups(entry, file, false)
    }

    fn console_user_message(&self, path: &str) -> String {
        format!("Updated user '{}' to file '{}'", self.user_name, path)
    }

    fn console_groups_message(&self, path: &str) -> String {
        format!(
            "Updated user '{}' with groups {} to file '{}'",
            self.user_name, self.groups, path
        )
    }

    fn error_message(&self, path: &str, cause: &anyhow::Error) -> String {
        format!("Unable to update user to {} due to error {:#}", path, cause)
    }
}
