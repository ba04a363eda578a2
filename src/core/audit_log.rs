//! Append-only, hash-chained audit trail for user provisioning.
//!
//! Entries hold metadata only: never passwords or digests.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::ServerPaths;
use crate::util::fs as server_fs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub user: String,
    #[serde(default)]
    pub realm: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

fn detect_actor() -> String {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if !user.is_empty() {
            return format!("{}(sudo)", user);
        }
    }
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

/// What a single provisioning run touched.
pub struct AuditContext {
    pub action: String,
    pub user: String,
    pub realm: String,
    pub files: Vec<String>,
}

/// Append an entry with auto-detected actor. Returns the written JSON line.
pub fn log(
    paths: &ServerPaths,
    ctx: AuditContext,
    success: bool,
    error: Option<String>,
) -> Result<String> {
    log_as(paths, ctx, &detect_actor(), success, error)
}

pub fn log_as(
    paths: &ServerPaths,
    ctx: AuditContext,
    actor: &str,
    success: bool,
    error: Option<String>,
) -> Result<String> {
    server_fs::ensure_dir(&paths.state_dir, constants::STATE_DIR_MODE)?;
    let _lock = FileLock::exclusive(&paths.audit_lock)?;
    let prev_hash = last_line_hash(&paths.audit_log).unwrap_or(None);

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action: ctx.action,
        actor: actor.to_string(),
        user: ctx.user,
        realm: ctx.realm,
        files: ctx.files,
        result: Some(AuditResult { success, error }),
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(compute_entry_hash(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    append_line(&paths.audit_log, &line)?;
    Ok(line)
}

/// Canonical hash of an entry, excluding `entry_hash` itself.
fn compute_entry_hash(entry: &AuditEntry) -> Result<String> {
    let mut value = serde_json::to_value(entry).context("serialize for hash")?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("entry_hash");
    }
    let canonical = canonicalize_value(&value);
    let canonical_str = serde_json::to_string(&canonical).context("serialize canonical json")?;
    let hash = Sha256::digest(canonical_str.as_bytes());
    Ok(format!("{:064x}", hash))
}

/// Recursively sort object keys.
fn canonicalize_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_value(&map[k]));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(canonicalize_value).collect())
        }
        other => other.clone(),
    }
}

fn append_line(audit_path: &std::path::Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)
        .with_context(|| format!("open audit log {}", audit_path.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::AUDIT_LOG_MODE);
        fs::set_permissions(audit_path, perm).context("set audit log permissions")?;
    }

    Ok(())
}

fn last_line_hash(path: &std::path::Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(None);
    }

    const CHUNK: u64 = 8192;
    let mut offset = len;
    let mut buf = Vec::new();

    while offset > 0 {
        let read_size = std::cmp::min(CHUNK, offset);
        offset -= read_size;
        file.seek(SeekFrom::Start(offset))
            .with_context(|| format!("seek {}", path.display()))?;
        let mut tmp = vec![0u8; read_size as usize];
        file.read_exact(&mut tmp)
            .with_context(|| format!("read {}", path.display()))?;
        buf.splice(0..0, tmp);

        // Need at least one complete trailing line before deciding.
        let complete = buf
            .iter()
            .rev()
            .skip_while(|b| b.is_ascii_whitespace())
            .any(|b| *b == b'\n');
        if complete || offset == 0 {
            for line in buf.split(|b| *b == b'\n').rev() {
                if line.iter().all(|b| b.is_ascii_whitespace()) {
                    continue;
                }
                if let Ok(entry) = serde_json::from_slice::<AuditEntry>(line) {
                    if let Some(hash) = entry.entry_hash {
                        return Ok(Some(hash));
                    }
                }
                let hash = Sha256::digest(line);
                return Ok(Some(format!("{:064x}", hash)));
            }
            return Ok(None);
        }
    }

    Ok(None)
}

/// Read audit entries, keeping the last `limit` if given.
pub fn read_log(paths: &ServerPaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    let audit_path = &paths.audit_log;
    if !audit_path.exists() {
        return Ok(Vec::new());
    }

    let file = fs::File::open(audit_path)
        .with_context(|| format!("open audit log {}", audit_path.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in reader.lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => {
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        eprintln!("warning: {} malformed audit entries skipped", malformed);
    }

    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }

    Ok(entries)
}

/// Verify the integrity of the audit chain. Returns (total, errors).
pub fn verify_chain(paths: &ServerPaths) -> Result<(usize, Vec<String>)> {
    let entries = read_log(paths, None)?;
    let mut errors = Vec::new();
    let mut prev_entry_hash: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && entry.prev_hash != prev_entry_hash {
            errors.push(format!(
                "entry {}: prev_hash mismatch (expected {:?}, got {:?})",
                i + 1,
                prev_entry_hash,
                entry.prev_hash
            ));
        }

        match (&entry.entry_hash, compute_entry_hash(entry)) {
            (Some(stored), Ok(computed)) if &computed != stored => {
                errors.push(format!("entry {}: entry_hash mismatch (tampered?)", i + 1));
            }
            (None, _) => {
                errors.push(format!("entry {}: missing entry_hash", i + 1));
            }
            (_, Err(e)) => {
                errors.push(format!("entry {}: cannot compute hash: {}", i + 1, e));
            }
            _ => {}
        }

        prev_entry_hash = entry.entry_hash.clone();
    }

    Ok((entries.len(), errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_paths() -> (TempDir, ServerPaths) {
        let dir = TempDir::new().unwrap();
        let paths = ServerPaths::from_home(dir.path().to_path_buf());
        (dir, paths)
    }

    fn ctx(action: &str) -> AuditContext {
        AuditContext {
            action: action.to_string(),
            user: "admin".to_string(),
            realm: "ManagementRealm".to_string(),
            files: vec!["/srv/standalone/configuration/mgmt-users.properties".to_string()],
        }
    }

    #[test]
    fn test_log_and_read_roundtrip() {
        let (_dir, paths) = test_paths();
        log_as(&paths, ctx("add-user"), "tester", true, None).unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "add-user");
        assert_eq!(entries[0].user, "admin");
        assert_eq!(entries[0].actor, "tester");
        assert!(entries[0].result.as_ref().unwrap().success);
        assert!(entries[0].entry_hash.is_some());
        assert!(entries[0].prev_hash.is_none());
    }

    #[test]
    fn test_read_log_with_limit() {
        let (_dir, paths) = test_paths();
        for i in 0..5 {
            log_as(&paths, ctx(&format!("action_{}", i)), "tester", true, None).unwrap();
        }
        let entries = read_log(&paths, Some(2)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, "action_4");
    }

    #[test]
    fn test_read_log_nonexistent() {
        let (_dir, paths) = test_paths();
        assert!(read_log(&paths, None).unwrap().is_empty());
    }

    #[test]
    fn test_canonical_json_deterministic() {
        let json1 = serde_json::json!({"b": 1, "a": 2});
        let json2 = serde_json::json!({"a": 2, "b": 1});
        let s1 = serde_json::to_string(&canonicalize_value(&json1)).unwrap();
        let s2 = serde_json::to_string(&canonicalize_value(&json2)).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_verify_chain_ok() {
        let (_dir, paths) = test_paths();
        log_as(&paths, ctx("add-user"), "tester", true, None).unwrap();
        log_as(&paths, ctx("update-user"), "tester", false, Some("disk full".into())).unwrap();
        log_as(&paths, ctx("update-user"), "tester", true, None).unwrap();
        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 3);
        assert!(errors.is_empty(), "errors: {:?}", errors);
    }

    #[test]
    fn test_verify_chain_detects_tamper() {
        let (_dir, paths) = test_paths();
        log_as(&paths, ctx("add-user"), "tester", true, None).unwrap();
        log_as(&paths, ctx("update-user"), "tester", true, None).unwrap();

        let content = fs::read_to_string(&paths.audit_log).unwrap();
        fs::write(&paths.audit_log, content.replace("update-user", "TAMPERED")).unwrap();

        let (total, errors) = verify_chain(&paths).unwrap();
        assert_eq!(total, 2);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_entries_link_to_previous() {
        let (_dir, paths) = test_paths();
        log_as(&paths, ctx("add-user"), "tester", true, None).unwrap();
        log_as(&paths, ctx("update-user"), "tester", true, None).unwrap();
        let entries = read_log(&paths, None).unwrap();
        assert_eq!(entries[1].prev_hash, entries[0].entry_hash);
    }
}
