//! Interactive driver that collects values and runs the update transition.
//!
//! Validation lives here, not in the transition: by the time `Update` runs
//! the user name, password and groups have all been checked.

use crate::cli::console::Console;
use crate::constants;
use crate::core::digest::DigestComputer;
use crate::core::handlers::Mode;
use crate::core::properties::PropertiesFile;
use crate::core::update::{UpdateTransition, NEW_LINE};
use crate::models::config::PolicySection;
use crate::models::state::{ErrorState, NextState, StateValues};
use anyhow::{bail, Result};
use std::collections::HashSet;
use std::sync::Arc;
use zeroize::Zeroizing;

#[derive(Debug)]
pub enum State {
    PromptUser,
    PromptPassword,
    PromptGroups,
    Confirm,
    Update,
    Error(ErrorState),
    Done(Arc<StateValues>),
}

impl From<NextState> for State {
    fn from(next: NextState) -> Self {
        match next {
            NextState::PromptUser => State::PromptUser,
            NextState::PromptPassword => State::PromptPassword,
            NextState::PromptGroups => State::PromptGroups,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    /// All files written. `mode` may differ from the requested one when an
    /// add was turned into an update of an existing user.
    Completed { mode: Mode, values: Arc<StateValues> },
    Failed { mode: Mode, error: ErrorState },
}

pub struct Wizard<'a, C: Console> {
    console: &'a mut C,
    digest: &'a dyn DigestComputer,
    policy: &'a PolicySection,
    mode: Mode,
    interactive: bool,
    values: StateValues,
}

impl<'a, C: Console> Wizard<'a, C> {
    pub fn new(
        console: &'a mut C,
        digest: &'a dyn DigestComputer,
        policy: &'a PolicySection,
        mode: Mode,
        interactive: bool,
        values: StateValues,
    ) -> Self {
        Self {
            console,
            digest,
            policy,
            mode,
            interactive,
            values,
        }
    }

    pub fn run(mut self) -> Outcome {
        let mut state = State::PromptUser;
        loop {
            state = match state {
                State::PromptUser => self.prompt_user(),
                State::PromptPassword => self.prompt_password(),
                State::PromptGroups => self.prompt_groups(),
                State::Confirm => self.confirm(),
                State::Update => self.update(),
                State::Error(error) => match error.next_state {
                    Some(next) if self.interactive => {
                        self.console.printf(&error.message);
                        self.console.printf(NEW_LINE);
                        next.into()
                    }
                    _ => {
                        return Outcome::Failed {
                            mode: self.mode,
                            error,
                        }
                    }
                },
                State::Done(values) => {
                    return Outcome::Completed {
                        mode: self.mode,
                        values,
                    }
                }
            };
        }
    }

    fn error(&self, message: impl Into<String>, next: Option<NextState>) -> State {
        let next = if self.interactive { next } else { None };
        State::Error(ErrorState::new(message, next, &Arc::new(self.values.clone())))
    }

    fn prompt_user(&mut self) -> State {
        if self.values.user_name.is_empty() {
            if !self.interactive {
                return self.error("a user name is required (--user)", None);
            }
            match self.console.read_line("Username") {
                Ok(name) => self.values.user_name = name.trim().to_string(),
                Err(e) => return self.error(format!("{:#}", e), None),
            }
        }

        if let Err(e) = validate_user_name(&self.values.user_name) {
            self.values.user_name.clear();
            return self.error(e.to_string(), Some(NextState::PromptUser));
        }

        let (present, total) = match user_presence(&self.values) {
            Ok(counts) => counts,
            Err(e) => return self.error(format!("{:#}", e), None),
        };

        match self.mode {
            Mode::Add if present > 0 => {
                let message = format!(
                    "User '{}' already exists in {} of {} file(s)",
                    self.values.user_name, present, total
                );
                if !self.interactive {
                    return self.error(format!("{}; use `update` instead", message), None);
                }
                let prompt = format!("{}. Update the existing user?", message);
                match self.console.confirm(&prompt) {
                    Ok(true) => self.mode = Mode::Update,
                    Ok(false) => {
                        self.values.user_name.clear();
                        return self.error("Choose a different user name.", Some(NextState::PromptUser));
                    }
                    Err(e) => return self.error(format!("{:#}", e), None),
                }
            }
            Mode::Update if present < total => {
                let message = format!(
                    "User '{}' is missing from {} of {} file(s)",
                    self.values.user_name,
                    total - present,
                    total
                );
                self.values.user_name.clear();
                return self.error(message, Some(NextState::PromptUser));
            }
            _ => {}
        }

        State::PromptPassword
    }

    fn prompt_password(&mut self) -> State {
        if self.values.password.is_empty() {
            if !self.interactive {
                return self.error("a password is required (--password-stdin)", None);
            }
            let first = match self.console.read_password("Password") {
                Ok(p) => p,
                Err(e) => return self.error(format!("{:#}", e), None),
            };
            if let Err(e) = validate_password(&self.values.user_name, &first, self.policy) {
                return self.error(e.to_string(), Some(NextState::PromptPassword));
            }
            let second = match self.console.read_password("Re-enter Password") {
                Ok(p) => p,
                Err(e) => return self.error(format!("{:#}", e), None),
            };
            if *first != *second {
                return self.error("The passwords do not match.", Some(NextState::PromptPassword));
            }
            self.values.password = first;
            return State::PromptGroups;
        }

        if let Err(e) = validate_password(&self.values.user_name, &self.values.password, self.policy) {
            self.values.password = Zeroizing::new(String::new());
            return self.error(e.to_string(), Some(NextState::PromptPassword));
        }
        State::PromptGroups
    }

    fn prompt_groups(&mut self) -> State {
        if self.values.groups.is_none()
            && self.interactive
            && !self.values.silent
            && self.values.group_properties_found()
        {
            let prompt = "What groups do you want this user to belong to? (comma-separated, blank for none)";
            match self.console.read_line(prompt) {
                Ok(line) => self.values.groups = Some(line),
                Err(e) => return self.error(format!("{:#}", e), None),
            }
        }
        self.values.groups = self.values.groups.as_deref().and_then(normalize_groups);
        State::Confirm
    }

    fn confirm(&mut self) -> State {
        if !self.interactive || self.values.silent {
            return State::Update;
        }
        let verb = match self.mode {
            Mode::Add => "add",
            Mode::Update => "update",
        };
        let prompt = format!(
            "About to {} user '{}' for realm '{}'. Is this correct?",
            verb, self.values.user_name, self.values.realm
        );
        match self.console.confirm(&prompt) {
            Ok(true) => State::Update,
            Ok(false) => {
                self.values.user_name.clear();
                self.values.password = Zeroizing::new(String::new());
                self.values.groups = None;
                self.error("Starting over.", Some(NextState::PromptUser))
            }
            Err(e) => self.error(format!("{:#}", e), None),
        }
    }

    fn update(&mut self) -> State {
        let values = Arc::new(self.values.clone());
        let handler = self.mode.handler(&values.user_name, values.groups.as_deref());
        let transition = UpdateTransition::new(handler.as_ref(), self.digest);
        match transition.update(&mut *self.console, &values) {
            Some(error) => State::Error(error),
            None => State::Done(values),
        }
    }
}

/// Count user files that already contain the user, out of all user files.
fn user_presence(values: &StateValues) -> Result<(usize, usize)> {
    let mut present = 0;
    for file in &values.user_files {
        let props = PropertiesFile::load_or_empty(file)?;
        if props.contains_key(&values.user_name) {
            present += 1;
        }
    }
    Ok((present, values.user_files.len()))
}

pub fn validate_user_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("user name cannot be empty");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "._@/=,-".contains(*c)))
    {
        bail!(
            "invalid user name '{}': character '{}' not allowed (use [A-Za-z0-9._@/=,-])",
            name,
            c
        );
    }
    Ok(())
}

pub fn validate_password(user_name: &str, password: &str, policy: &PolicySection) -> Result<()> {
    if password.is_empty() {
        bail!("password cannot be empty");
    }
    if password.len() > constants::MAX_PASSWORD_SIZE {
        bail!(
            "password exceeds maximum size ({} bytes)",
            constants::MAX_PASSWORD_SIZE
        );
    }
    if password.chars().count() < policy.min_password_length {
        bail!(
            "password must be at least {} characters",
            policy.min_password_length
        );
    }
    if !policy.allow_password_equals_user && password == user_name {
        bail!("password must not be the same as the user name");
    }
    Ok(())
}

/// Trim, drop empties and duplicates. `None` when nothing is left.
pub fn normalize_groups(raw: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let groups: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .filter(|g| seen.insert(*g))
        .collect();
    if groups.is_empty() {
        None
    } else {
        Some(groups.join(","))
    }
}
