//! Provisioned user record.

use serde::{Deserialize, Serialize};

/// One entry of the user directory.
///
/// `password` holds a hash string, never a plain password: argon2 PHC for
/// newly provisioned users, bcrypt for records carried over from older users
/// files. The field keeps its historical name so those files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}
