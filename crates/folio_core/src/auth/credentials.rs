//! Credential verification against the user directory.
//!
//! # Responsibility
//! - Compare a presented password with stored argon2 PHC or legacy bcrypt
//!   hashes.
//! - Produce argon2 PHC hashes for user provisioning.
//!
//! # Invariants
//! - `verify` never returns an error: any backend failure denies access.
//! - Hash comparison goes through the `argon2` or `bcrypt` verifier, never
//!   string equality.
//! - Under `CredentialPolicy::AnyUser` every stored hash is checked, even
//!   after a match.

use crate::repo::user_repo::UserDirectory;
use crate::storage::StorageError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SALT_LEN: usize = 16;
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Which stored users a password is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPolicy {
    /// Accept the password if it matches any provisioned user's hash,
    /// regardless of the presented username. Legacy behavior.
    #[default]
    AnyUser,
    /// Accept the password only for the record with the presented username.
    MatchUsername,
}

#[derive(Debug)]
pub enum CredentialError {
    /// User directory could not be read or parsed.
    Directory(StorageError),
    /// Password hashing failed.
    Hash(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(err) => write!(f, "user directory unavailable: {err}"),
            Self::Hash(details) => write!(f, "password hashing failed: {details}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            Self::Hash(_) => None,
        }
    }
}

impl From<StorageError> for CredentialError {
    fn from(value: StorageError) -> Self {
        Self::Directory(value)
    }
}

/// Checks username/password pairs against a `UserDirectory`.
pub struct CredentialVerifier<D: UserDirectory> {
    directory: D,
    policy: CredentialPolicy,
}

impl<D: UserDirectory> CredentialVerifier<D> {
    pub fn new(directory: D, policy: CredentialPolicy) -> Self {
        Self { directory, policy }
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Returns whether the credentials are valid, failing closed.
    ///
    /// Directory read/parse failures are logged and reported as `false`.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.check(username, password) {
            Ok(valid) => valid,
            Err(err) => {
                warn!(
                    "event=credential_verify module=auth status=error error_code=auth_backend_unavailable error={}",
                    err
                );
                false
            }
        }
    }

    /// Checks the credentials and surfaces directory failures.
    ///
    /// # Errors
    /// - `CredentialError::Directory` when the user directory cannot be loaded.
    pub fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let users = self.directory.load_users()?;
        let valid = match self.policy {
            CredentialPolicy::AnyUser => users.iter().fold(false, |matched, user| {
                verify_password(&user.password_hash, password) | matched
            }),
            CredentialPolicy::MatchUsername => users
                .iter()
                .find(|user| user.username == username)
                .map(|user| verify_password(&user.password_hash, password))
                .unwrap_or(false),
        };
        debug!(
            "event=credential_verify module=auth status={} policy={:?} users={}",
            if valid { "ok" } else { "denied" },
            self.policy,
            users.len()
        );
        Ok(valid)
    }
}

/// Hashes `password` into an argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt_bytes).map_err(|err| CredentialError::Hash(err.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| CredentialError::Hash(err.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialError::Hash(err.to_string()))?
        .to_string();
    Ok(phc)
}

/// Unparsable stored hashes never match.
fn verify_password(hash: &str, password: &str) -> bool {
    if is_bcrypt_hash(hash) {
        return bcrypt::verify(password, hash).unwrap_or(false);
    }
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn is_bcrypt_hash(hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|prefix| hash.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::{hash_password, is_bcrypt_hash, verify_password};

    const LEGACY_BCRYPT: &str = "$2y$10$.vGA1O9wmRjrwAVXD98HNOgsNpDczlqm3Jq7KnEd1rVAGv3Fykk1a";

    #[test]
    fn legacy_bcrypt_hash_verifies() {
        assert!(is_bcrypt_hash(LEGACY_BCRYPT));
        assert!(verify_password(LEGACY_BCRYPT, "rasmuslerdorf"));
        assert!(!verify_password(LEGACY_BCRYPT, "rasmus"));
    }

    #[test]
    fn truncated_bcrypt_hash_never_matches() {
        assert!(!verify_password("$2b$10$short", "rasmuslerdorf"));
    }

    #[test]
    fn hash_roundtrip_verifies() {
        let hash = hash_password("secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "secret"));
        assert!(!verify_password(&hash, "Secret"));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("not-a-phc-string", ""));
        assert!(!verify_password("", ""));
    }
}
