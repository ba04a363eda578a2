//! Installation path resolution and property-file discovery.

use crate::constants;
use crate::models::config::RealmsSection;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ServerPaths {
    pub home: PathBuf,
    pub state_dir: PathBuf,
    pub config_toml: PathBuf,
    pub lock: PathBuf,
    pub audit_log: PathBuf,
    pub audit_lock: PathBuf,
}

impl ServerPaths {
    /// Resolve the installation root from CLI arg, env var, or auto-detection.
    pub fn resolve(home_arg: Option<PathBuf>) -> Result<Self> {
        if let Some(home) = home_arg {
            return Ok(Self::from_home(home));
        }
        if let Ok(home) = env::var(constants::HOME_ENV) {
            if !home.is_empty() {
                return Ok(Self::from_home(PathBuf::from(home)));
            }
        }
        if let Some(found) = find_server_home()? {
            return Ok(Self::from_home(found));
        }
        Ok(Self::from_home(PathBuf::from(constants::DEFAULT_SERVER_HOME)))
    }

    pub fn from_home(home: PathBuf) -> Self {
        let state_dir = home.join(constants::STATE_DIR);
        let config_toml = state_dir.join("config.toml");
        let lock = state_dir.join("realm-users.lock");
        let audit_log = state_dir.join("audit.log");
        let audit_lock = state_dir.join("audit.lock");
        Self {
            home,
            state_dir,
            config_toml,
            lock,
            audit_log,
            audit_lock,
        }
    }

    /// Existing files named `file_name` under `<home>/*/configuration/`, sorted.
    pub fn discover(&self, file_name: &str) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*/configuration/{}",
            glob::Pattern::escape(&self.home.display().to_string()),
            glob::Pattern::escape(file_name)
        );
        let mut found = Vec::new();
        for entry in glob::glob(&pattern).with_context(|| format!("invalid glob {}", pattern))? {
            let path = entry.with_context(|| format!("scan {}", self.home.display()))?;
            if path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }
}

/// Which family of property files a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmKind {
    Management,
    Application,
}

impl RealmKind {
    pub fn from_flag(application: bool) -> Self {
        if application {
            RealmKind::Application
        } else {
            RealmKind::Management
        }
    }

    pub fn users_file(self) -> &'static str {
        match self {
            RealmKind::Management => constants::MGMT_USERS_FILE,
            RealmKind::Application => constants::APPLICATION_USERS_FILE,
        }
    }

    pub fn groups_file(self) -> &'static str {
        match self {
            RealmKind::Management => constants::MGMT_GROUPS_FILE,
            RealmKind::Application => constants::APPLICATION_ROLES_FILE,
        }
    }

    pub fn default_realm(self, realms: &RealmsSection) -> String {
        match self {
            RealmKind::Management => realms.management.clone(),
            RealmKind::Application => realms.application.clone(),
        }
    }
}

fn find_server_home() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir().context("resolve current directory")?;
    for ancestor in cwd.ancestors() {
        if looks_like_home(ancestor) {
            return Ok(Some(ancestor.to_path_buf()));
        }
    }
    Ok(None)
}

fn looks_like_home(path: &Path) -> bool {
    constants::SERVER_MODES
        .iter()
        .any(|mode| path.join(mode).join("configuration").is_dir())
}

impl std::fmt::Display for ServerPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server@{}", self.home.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_home() {
        let paths = ServerPaths::from_home(PathBuf::from("/test"));
        assert_eq!(paths.home, PathBuf::from("/test"));
        assert_eq!(paths.state_dir, PathBuf::from("/test/.realm-users"));
        assert_eq!(paths.config_toml, PathBuf::from("/test/.realm-users/config.toml"));
        assert_eq!(paths.lock, PathBuf::from("/test/.realm-users/realm-users.lock"));
        assert_eq!(paths.audit_log, PathBuf::from("/test/.realm-users/audit.log"));
        assert_eq!(paths.audit_lock, PathBuf::from("/test/.realm-users/audit.lock"));
    }

    #[test]
    fn test_resolve_prefers_argument() {
        let paths = ServerPaths::resolve(Some(PathBuf::from("/explicit"))).unwrap();
        assert_eq!(paths.home, PathBuf::from("/explicit"));
    }

    #[test]
    fn test_discover_finds_existing_files_only() {
        let dir = TempDir::new().unwrap();
        for mode in ["standalone", "domain"] {
            fs::create_dir_all(dir.path().join(mode).join("configuration")).unwrap();
        }
        fs::write(
            dir.path().join("standalone/configuration/mgmt-users.properties"),
            "",
        )
        .unwrap();
        fs::write(dir.path().join("domain/configuration/mgmt-users.properties"), "").unwrap();

        let paths = ServerPaths::from_home(dir.path().to_path_buf());
        let found = paths.discover(constants::MGMT_USERS_FILE).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("domain/configuration/mgmt-users.properties"),
                dir.path().join("standalone/configuration/mgmt-users.properties"),
            ]
        );
        assert!(paths.discover(constants::MGMT_GROUPS_FILE).unwrap().is_empty());
    }

    #[test]
    fn test_realm_kind_files() {
        let realms = RealmsSection::default();
        let mgmt = RealmKind::from_flag(false);
        assert_eq!(mgmt.users_file(), "mgmt-users.properties");
        assert_eq!(mgmt.groups_file(), "mgmt-groups.properties");
        assert_eq!(mgmt.default_realm(&realms), "ManagementRealm");
        let app = RealmKind::from_flag(true);
        assert_eq!(app.users_file(), "application-users.properties");
        assert_eq!(app.groups_file(), "application-roles.properties");
        assert_eq!(app.default_realm(&realms), "ApplicationRealm");
    }

    #[test]
    fn test_looks_like_home() {
        let dir = TempDir::new().unwrap();
        assert!(!looks_like_home(dir.path()));
        fs::create_dir_all(dir.path().join("standalone/configuration")).unwrap();
        assert!(looks_like_home(dir.path()));
    }
}
