//! The update transition: digest once, then persist to every target file.
//!
//! Files are written one at a time. The first failure stops the run and is
//! returned as an [`ErrorState`]; files already written keep their contents.

use crate::core::digest::DigestComputer;
use crate::models::state::{Entry, ErrorState, StateValues};
use crate::util::path;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Line terminator emitted after each progress message.
pub const NEW_LINE: &str = "\n";

/// Write-only progress output.
pub trait Reporter {
    fn printf(&mut self, message: &str);
}

/// Persistence and wording for one flavour of update (add vs. update).
pub trait PropertiesHandler {
    /// Store `entry` (user name, digest) in a user file bound to `realm`.
    fn persist_user(&self, entry: &Entry, file: &Path, realm: &str) -> Result<()>;

    /// Store `entry` (user name, groups) in a group file.
    fn persist_groups(&self, entry: &Entry, file: &Path) -> Result<()>;

    fn console_user_message(&self, path: &str) -> String;

    fn console_groups_message(&self, path: &str) -> String;

    fn error_message(&self, path: &str, cause: &anyhow::Error) -> String;
}

pub struct UpdateTransition<'a> {
    handler: &'a dyn PropertiesHandler,
    digest: &'a dyn DigestComputer,
}

impl<'a> UpdateTransition<'a> {
    pub fn new(handler: &'a dyn PropertiesHandler, digest: &'a dyn DigestComputer) -> Self {
        Self { handler, digest }
    }

    /// Run the transition. `None` means every file was written.
    pub fn update(
        &self,
        reporter: &mut dyn Reporter,
        state: &Arc<StateValues>,
    ) -> Option<ErrorState> {
        let hash = match self
            .digest
            .digest(&state.user_name, &state.realm, &state.password)
        {
            Ok(hash) => hash,
            Err(e) => return Some(ErrorState::new(e.to_string(), None, state)),
        };
        let entry = Entry::new(state.user_name.clone(), hash);

        for current in &state.user_files {
            if let Err(e) = self.handler.persist_user(&entry, current, &state.realm) {
                return Some(self.failure(current, &e, state));
            }
            if !state.silent {
                let message = self
                    .handler
                    .console_user_message(&path::canonical_display(current));
                reporter.printf(&message);
                reporter.printf(NEW_LINE);
            }
        }

        let groups = match state.groups_to_persist() {
            Some(groups) if state.group_properties_found() => groups,
            _ => return None,
        };
        let entry = Entry::new(state.user_name.clone(), groups);

        for current in &state.group_files {
            if let Err(e) = self.handler.persist_groups(&entry, current) {
                return Some(self.failure(current, &e, state));
            }
            if !state.silent {
                let message = self
                    .handler
                    .console_groups_message(&path::canonical_display(current));
                reporter.printf(&message);
                reporter.printf(NEW_LINE);
            }
        }

        None
    }

    fn failure(&self, file: &Path, cause: &anyhow::Error, state: &Arc<StateValues>) -> ErrorState {
        let absolute = path::absolute(file);
        let message = self
            .handler
            .error_message(&absolute.display().to_string(), cause);
        ErrorState::new(message, None, state)
    }
}
