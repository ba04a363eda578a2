//! Centralized constants for file names, realms, permissions, and limits.

/// Default installation root when nothing else resolves.
pub const DEFAULT_SERVER_HOME: &str = "/opt/server";

/// Environment variable naming the installation root.
pub const HOME_ENV: &str = "REALM_USERS_HOME";

/// Per-installation state directory (config, audit log, locks).
pub const STATE_DIR: &str = ".realm-users";

/// Server modes whose `configuration/` directory holds property files.
pub const SERVER_MODES: &[&str] = &["standalone", "domain"];

/// Management realm user file.
pub const MGMT_USERS_FILE: &str = "mgmt-users.properties";

/// Management realm group file.
pub const MGMT_GROUPS_FILE: &str = "mgmt-groups.properties";

/// Application realm user file.
pub const APPLICATION_USERS_FILE: &str = "application-users.properties";

/// Application realm role/group file.
pub const APPLICATION_ROLES_FILE: &str = "application-roles.properties";

/// Default realm for management users.
pub const DEFAULT_MANAGEMENT_REALM: &str = "ManagementRealm";

/// Default realm for application users.
pub const DEFAULT_APPLICATION_REALM: &str = "ApplicationRealm";

/// Realm bound into the digest when the realm is empty.
pub const EMPTY_REALM_PLACEHOLDER: &str = "";

/// Default digest algorithm (hex MD5 of `user:realm:password`).
pub const DEFAULT_DIGEST_ALGORITHM: &str = "MD5";

/// Prefix of the realm marker comment in user property files.
pub const REALM_MARKER_PREFIX: &str = "#$REALM_NAME=";

/// Trailer written after the realm name in the marker comment.
pub const REALM_MARKER_SUFFIX: &str =
    "$ This line is used by the add-user utility to identify the realm name already used in this file.";

/// Permission mode for newly created property files.
pub const PROPERTIES_FILE_MODE: u32 = 0o600;

/// Permission mode for the state directory.
pub const STATE_DIR_MODE: u32 = 0o700;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o640;

/// Default minimum password length.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password size in bytes (64 KiB).
pub const MAX_PASSWORD_SIZE: usize = 65_536;

/// Tag used when forwarding audit lines to journald.
pub const JOURNALD_TAG: &str = "realm-users";
