//! Optional journald forwarding via systemd-cat.
//!
//! Best-effort: failure to forward never fails a command.

use crate::constants;
use std::io::Write;
use std::process::{Command, Stdio};

/// Syslog priority passed to `systemd-cat -p`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Info,
    Warning,
}

impl Priority {
    fn as_arg(self) -> &'static str {
        match self {
            Priority::Info => "info",
            Priority::Warning => "warning",
        }
    }
}

pub fn systemd_cat_available() -> bool {
    Command::new("systemd-cat")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Forward one audit line to journald under the tool's tag.
pub fn forward(line: &str, priority: Priority) {
    if !systemd_cat_available() {
        return;
    }

    let mut child = match Command::new("systemd-cat")
        .arg("-t")
        .arg(constants::JOURNALD_TAG)
        .arg("-p")
        .arg(priority.as_arg())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(c) => c,
        Err(_) => return,
    };

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(line.as_bytes());
        let _ = stdin.write_all(b"\n");
    }

    let _ = child.wait();
}
