//! Terminal console for the wizard.

use crate::constants;
use crate::core::update::Reporter;
use anyhow::{bail, Context, Result};
use dialoguer::{Confirm, Input, Password};
use std::io::{Read, Write};
use zeroize::Zeroizing;

/// Prompting on top of plain progress output.
pub trait Console: Reporter {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>>;
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// stdout for output, dialoguer for prompts.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl Reporter for TerminalConsole {
    fn printf(&mut self, message: &str) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(message.as_bytes());
        let _ = stdout.flush();
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("read input from prompt")
    }

    fn read_password(&mut self, prompt: &str) -> Result<Zeroizing<String>> {
        let password = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .context("read password from prompt")?;
        Ok(Zeroizing::new(password))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("read confirmation from prompt")
    }
}

/// Read a password piped on stdin; one trailing newline is dropped.
pub fn read_password_stdin() -> Result<Zeroizing<String>> {
    read_password_from(std::io::stdin().lock())
}

pub fn read_password_from(reader: impl Read) -> Result<Zeroizing<String>> {
    let limit = constants::MAX_PASSWORD_SIZE as u64;
    let mut buf = Zeroizing::new(String::new());
    reader
        .take(limit + 1)
        .read_to_string(&mut buf)
        .context("read password from stdin")?;
    if buf.len() > constants::MAX_PASSWORD_SIZE {
        bail!(
            "password exceeds maximum size (max {} bytes)",
            constants::MAX_PASSWORD_SIZE
        );
    }
    let trimmed = buf
        .strip_suffix("\r\n")
        .or_else(|| buf.strip_suffix('\n'))
        .unwrap_or(&buf);
    Ok(Zeroizing::new(trimmed.to_string()))
}
