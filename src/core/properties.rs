//! Reading and writing `.properties` user and group files.
//!
//! Comments, blank lines and entry order are preserved. Writes go through a
//! temp file in the same directory and are renamed into place.

use crate::constants;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// What to do when the key being written is not in the file yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Append a new entry.
    Insert,
    /// Fail; only existing entries may change.
    RequireExisting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Blank line or comment, kept verbatim.
    Raw(String),
    Realm(String),
    Entry { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl PropertiesFile {
    /// Load an existing file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("properties file not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("read properties file {}", path.display()))?;
        Ok(Self::parse(path, &content))
    }

    /// Load a file, or start an empty one if it does not exist yet.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        Ok(Self {
            path: path.to_path_buf(),
            lines: Vec::new(),
        })
    }

    pub fn parse(path: &Path, content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();
        Self {
            path: path.to_path_buf(),
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Realm named by the marker comment, if present.
    pub fn realm(&self) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Realm(realm) => Some(realm.as_str()),
            _ => None,
        })
    }

    /// Bind the file to `realm`, inserting the marker if it is missing.
    /// A file already bound to another realm is rejected, including when
    /// `realm` is empty. An empty realm adds no marker.
    pub fn set_realm(&mut self, realm: &str) -> Result<()> {
        if let Some(existing) = self.realm() {
            if existing != realm {
                bail!(
                    "realm mismatch: {} belongs to realm '{}', not '{}'",
                    self.path.display(),
                    existing,
                    realm
                );
            }
            return Ok(());
        }
        if realm.is_empty() {
            return Ok(());
        }
        let index = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Entry { .. }))
            .unwrap_or(self.lines.len());
        self.lines.insert(index, Line::Realm(realm.to_string()));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, value } => Some((key.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// Set `key` to `value`, replacing the existing entry in place.
    pub fn upsert(&mut self, key: &str, value: &str, policy: KeyPolicy) -> Result<()> {
        let position = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Entry { key: k, .. } if k == key));
        let entry = Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        };
        match (position, policy) {
            (Some(index), _) => {
                self.lines[index] = entry;
            }
            (None, KeyPolicy::Insert) => {
                self.lines.push(entry);
            }
            (None, KeyPolicy::RequireExisting) => {
                bail!("user '{}' not found in {}", key, self.path.display());
            }
        }
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Raw(raw) => out.push_str(raw),
                Line::Realm(realm) => {
                    out.push_str(constants::REALM_MARKER_PREFIX);
                    out.push_str(realm);
                    out.push_str(constants::REALM_MARKER_SUFFIX);
                }
                Line::Entry { key, value } => {
                    out.push_str(&escape(key, true));
                    out.push('=');
                    out.push_str(&escape(value, false));
                }
            }
            out.push('\n');
        }
        out
    }

    /// Atomically replace the file on disk with the rendered contents.
    pub fn save(&self) -> Result<()> {
        let path = &self.path;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;

        let permissions = match fs::metadata(path) {
            Ok(meta) => meta.permissions(),
            Err(_) => new_file_permissions(parent)?,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".properties-")
            .tempfile_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(self.render().as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        tmp.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        tmp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("set permissions on {}", path.display()))?;

        tmp.persist(path)
            .map_err(|err| anyhow::anyhow!("persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

#[cfg(unix)]
fn new_file_permissions(_parent: &Path) -> Result<fs::Permissions> {
    Ok(fs::Permissions::from_mode(constants::PROPERTIES_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions(parent: &Path) -> Result<fs::Permissions> {
    let meta = fs::metadata(parent).with_context(|| format!("stat {}", parent.display()))?;
    let mut perm = meta.permissions();
    perm.set_readonly(false);
    Ok(perm)
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix(constants::REALM_MARKER_PREFIX) {
        if let Some(end) = rest.find('$') {
            return Line::Realm(rest[..end].to_string());
        }
    }
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return Line::Raw(raw.to_string());
    }
    let (key, value) = split_entry(raw.trim_start());
    Line::Entry { key, value }
}

/// Split a `key=value` line the way `java.util.Properties` does: the key
/// ends at the first unescaped `=`, `:` or whitespace, and backslash escapes
/// are resolved in both halves.
fn split_entry(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(unescape_char(next));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=') | Some(':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                value.push(unescape_char(next));
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn unescape_char(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\x0c',
        other => other,
    }
}

/// Backslash-escape text for a properties file. Keys also escape the
/// separators, comment markers and every space; values only a leading one.
fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# Users for the management realm
#
#$REALM_NAME=ManagementRealm$ This line is used by the add-user utility to identify the realm name already used in this file.
#disabled=0123
admin=c12071f8e70ddd1fc3675c956f14cbff
monitor : 99aa
";

    fn sample() -> PropertiesFile {
        PropertiesFile::parse(Path::new("/srv/mgmt-users.properties"), SAMPLE)
    }

    #[test]
    fn test_parse_entries_and_realm() {
        let props = sample();
        assert_eq!(props.realm(), Some("ManagementRealm"));
        let entries: Vec<_> = props.entries().collect();
        assert_eq!(
            entries,
            vec![
                ("admin", "c12071f8e70ddd1fc3675c956f14cbff"),
                ("monitor", "99aa"),
            ]
        );
        assert!(!props.contains_key("disabled"));
    }

    #[test]
    fn test_render_preserves_comments() {
        let rendered = sample().render();
        assert!(rendered.starts_with("# Users for the management realm\n#\n#$REALM_NAME=ManagementRealm$"));
        assert!(rendered.contains("#disabled=0123\n"));
        assert!(rendered.contains("monitor=99aa\n"));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut props = sample();
        props.upsert("admin", "ffff", KeyPolicy::RequireExisting).unwrap();
        let entries: Vec<_> = props.entries().collect();
        assert_eq!(entries[0], ("admin", "ffff"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_upsert_insert_appends() {
        let mut props = sample();
        props.upsert("operator", "abcd", KeyPolicy::Insert).unwrap();
        assert_eq!(props.entries().last(), Some(("operator", "abcd")));
    }

    #[test]
    fn test_upsert_require_existing_rejects_missing() {
        let mut props = sample();
        let err = props
            .upsert("operator", "abcd", KeyPolicy::RequireExisting)
            .unwrap_err();
        assert!(err.to_string().contains("user 'operator' not found"));
    }

    #[test]
    fn test_set_realm_inserts_marker_before_entries() {
        let mut props =
            PropertiesFile::parse(Path::new("/srv/u.properties"), "# header\nadmin=aa\n");
        props.set_realm("ManagementRealm").unwrap();
        let rendered = props.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "# header");
        assert!(lines[1].starts_with("#$REALM_NAME=ManagementRealm$"));
        assert_eq!(lines[2], "admin=aa");
    }

    #[test]
    fn test_set_realm_mismatch_fails() {
        let mut props = sample();
        let err = props.set_realm("ApplicationRealm").unwrap_err();
        assert!(err.to_string().contains("realm mismatch"));
        assert!(props.set_realm("ManagementRealm").is_ok());
    }

    #[test]
    fn test_key_with_separators_roundtrips() {
        let mut props = PropertiesFile::parse(Path::new("/srv/u.properties"), "");
        props.upsert("ops=admin", "abcd", KeyPolicy::Insert).unwrap();
        props.upsert("a:b c", "x y", KeyPolicy::Insert).unwrap();
        let rendered = props.render();
        assert_eq!(rendered, "ops\\=admin=abcd\na\\:b\\ c=x y\n");

        let reparsed = PropertiesFile::parse(Path::new("/srv/u.properties"), &rendered);
        let entries: Vec<_> = reparsed.entries().collect();
        assert_eq!(entries, vec![("ops=admin", "abcd"), ("a:b c", "x y")]);
    }

    #[test]
    fn test_parse_escapes_and_whitespace_separator() {
        let props = PropertiesFile::parse(
            Path::new("/srv/u.properties"),
            "back\\\\slash=v\\\\1\nspaced   value here\n\\#hash=1\n",
        );
        let entries: Vec<_> = props.entries().collect();
        assert_eq!(
            entries,
            vec![("back\\slash", "v\\1"), ("spaced", "value here"), ("#hash", "1")]
        );
    }

    #[test]
    fn test_escaped_comment_marker_key_roundtrips() {
        let mut props = PropertiesFile::parse(Path::new("/srv/u.properties"), "");
        props.upsert("#root", "aa", KeyPolicy::Insert).unwrap();
        let reparsed = PropertiesFile::parse(Path::new("/srv/u.properties"), &props.render());
        assert_eq!(reparsed.get("#root"), Some("aa"));
    }

    #[test]
    fn test_set_empty_realm_against_marker_fails() {
        let mut props = sample();
        let err = props.set_realm("").unwrap_err();
        assert!(err.to_string().contains("realm mismatch"));

        let mut unbound = PropertiesFile::parse(Path::new("/srv/u.properties"), "admin=aa\n");
        unbound.set_realm("").unwrap();
        assert_eq!(unbound.realm(), None);
        assert_eq!(unbound.render(), "admin=aa\n");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mgmt-users.properties");
        fs::write(&path, SAMPLE).unwrap();

        let mut props = PropertiesFile::load(&path).unwrap();
        props.upsert("operator", "abcd", KeyPolicy::Insert).unwrap();
        props.save().unwrap();

        let reloaded = PropertiesFile::load(&path).unwrap();
        assert_eq!(reloaded.get("operator"), Some("abcd"));
        assert_eq!(reloaded.realm(), Some("ManagementRealm"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_new_file_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("application-users.properties");
        let mut props = PropertiesFile::load_or_empty(&path).unwrap();
        props.upsert("app", "abcd", KeyPolicy::Insert).unwrap();
        props.save().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, constants::PROPERTIES_FILE_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_preserves_existing_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mgmt-users.properties");
        fs::write(&path, "admin=aa\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut props = PropertiesFile::load(&path).unwrap();
        props.upsert("admin", "bb", KeyPolicy::RequireExisting).unwrap();
        props.save().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = PropertiesFile::load(&dir.path().join("nope.properties")).unwrap_err();
        assert!(err.to_string().contains("properties file not found"));
    }
}
