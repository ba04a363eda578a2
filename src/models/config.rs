//! Installation configuration file model.

use crate::constants;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub digest: DigestSection,
    #[serde(default)]
    pub realms: RealmsSection,
    #[serde(default)]
    pub policy: PolicySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSection {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for DigestSection {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmsSection {
    #[serde(default = "default_management_realm")]
    pub management: String,
    #[serde(default = "default_application_realm")]
    pub application: String,
}

impl Default for RealmsSection {
    fn default() -> Self {
        Self {
            management: default_management_realm(),
            application: default_application_realm(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySection {
    /// Minimum accepted password length.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Accept a password identical to the user name.
    #[serde(default)]
    pub allow_password_equals_user: bool,

    /// Forward audit entries to journald.
    #[serde(default)]
    pub journald_audit: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            allow_password_equals_user: false,
            journald_audit: false,
        }
    }
}

fn default_algorithm() -> String {
    constants::DEFAULT_DIGEST_ALGORITHM.to_string()
}

fn default_management_realm() -> String {
    constants::DEFAULT_MANAGEMENT_REALM.to_string()
}

fn default_application_realm() -> String {
    constants::DEFAULT_APPLICATION_REALM.to_string()
}

fn default_min_password_length() -> usize {
    constants::DEFAULT_MIN_PASSWORD_LENGTH
}
