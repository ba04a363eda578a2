//! Values collected by the wizard and the states it moves between.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Everything gathered for one provisioning run.
///
/// Built up by the driver, then frozen behind an `Arc` before the update
/// transition reads it.
#[derive(Clone, Default)]
pub struct StateValues {
    pub user_name: String,
    /// Empty means "no realm".
    pub realm: String,
    pub password: Zeroizing<String>,
    /// Comma-separated group names.
    pub groups: Option<String>,
    pub silent: bool,
    pub user_files: Vec<PathBuf>,
    pub group_files: Vec<PathBuf>,
}

impl StateValues {
    /// Whether any group files were configured for this run.
    pub fn group_properties_found(&self) -> bool {
        !self.group_files.is_empty()
    }

    /// The group value to persist, if there is one worth writing.
    pub fn groups_to_persist(&self) -> Option<&str> {
        match self.groups.as_deref() {
            Some(groups) if !groups.trim().is_empty() => Some(groups),
            _ => None,
        }
    }
}

impl fmt::Debug for StateValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValues")
            .field("user_name", &self.user_name)
            .field("realm", &self.realm)
            .field("password", &"<redacted>")
            .field("groups", &self.groups)
            .field("silent", &self.silent)
            .field("user_files", &self.user_files)
            .field("group_files", &self.group_files)
            .finish()
    }
}

/// A single `key=value` row destined for a property file.
#[derive(Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// Values may be digests; keep them out of debug output.
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Prompt the driver should return to after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    PromptUser,
    PromptPassword,
    PromptGroups,
}

/// Failure outcome of a transition.
#[derive(Debug, Clone)]
pub struct ErrorState {
    pub message: String,
    /// `None` means the error is terminal.
    pub next_state: Option<NextState>,
    pub state_values: Arc<StateValues>,
}

impl ErrorState {
    pub fn new(
        message: impl Into<String>,
        next_state: Option<NextState>,
        state_values: &Arc<StateValues>,
    ) -> Self {
        Self {
            message: message.into(),
            next_state,
            state_values: Arc::clone(state_values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_properties_found_follows_group_files() {
        let mut values = StateValues::default();
        assert!(!values.group_properties_found());
        values.group_files.push(PathBuf::from("/tmp/mgmt-groups.properties"));
        assert!(values.group_properties_found());
    }

    #[test]
    fn test_groups_to_persist_skips_blank() {
        let mut values = StateValues::default();
        assert_eq!(values.groups_to_persist(), None);
        values.groups = Some("  ".into());
        assert_eq!(values.groups_to_persist(), None);
        values.groups = Some("SuperUser,Operator".into());
        assert_eq!(values.groups_to_persist(), Some("SuperUser,Operator"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let values = StateValues {
            user_name: "admin".into(),
            password: Zeroizing::new("Secret123".into()),
            ..Default::default()
        };
        let rendered = format!("{:?}", values);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("Secret123"));
    }

    #[test]
    fn test_entry_debug_redacts_value() {
        let entry = Entry::new("admin", "0123abcd");
        let rendered = format!("{:?}", entry);
        assert!(!rendered.contains("0123abcd"));
    }
}
