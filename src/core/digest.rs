//! Realm-scoped password digests.
//!
//! The stored value is the hex digest of `user:realm:password`, so the same
//! password yields different stored values per user and per realm.

use crate::constants;
use md5::Md5;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("{0} digest algorithm not available")]
    Unavailable(String),
}

/// Computes the value stored in a user property file.
pub trait DigestComputer {
    fn digest(&self, user_name: &str, realm: &str, password: &str) -> Result<String, DigestError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MD5" => Some(Self::Md5),
            "SHA-256" | "SHA256" => Some(Self::Sha256),
            "SHA-512" | "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

/// Digest computer selected by algorithm name.
///
/// The name is resolved on every call; an unknown name surfaces as
/// [`DigestError::Unavailable`] at the point of use.
#[derive(Debug, Clone)]
pub struct RealmDigest {
    algorithm: String,
}

impl RealmDigest {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
        }
    }

    /// Compare a password against a stored digest.
    pub fn matches(
        &self,
        user_name: &str,
        realm: &str,
        password: &str,
        stored: &str,
    ) -> Result<bool, DigestError> {
        let computed = self.digest(user_name, realm, password)?;
        Ok(computed.eq_ignore_ascii_case(stored.trim()))
    }
}

impl Default for RealmDigest {
    fn default() -> Self {
        Self::new(constants::DEFAULT_DIGEST_ALGORITHM)
    }
}

impl DigestComputer for RealmDigest {
    fn digest(&self, user_name: &str, realm: &str, password: &str) -> Result<String, DigestError> {
        let algorithm = Algorithm::from_name(&self.algorithm)
            .ok_or_else(|| DigestError::Unavailable(self.algorithm.clone()))?;
        let realm = if realm.is_empty() {
            constants::EMPTY_REALM_PLACEHOLDER
        } else {
            realm
        };
        let input = Zeroizing::new(format!("{}:{}:{}", user_name, realm, password));
        let hex = match algorithm {
            Algorithm::Md5 => format!("{:x}", Md5::digest(input.as_bytes())),
            Algorithm::Sha256 => format!("{:x}", Sha256::digest(input.as_bytes())),
            Algorithm::Sha512 => format!("{:x}", Sha512::digest(input.as_bytes())),
        };
        Ok(hex)
    }
}
