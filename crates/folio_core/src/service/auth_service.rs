//! Login/logout use-case service.
//!
//! # Responsibility
//! - Turn verified credentials into a fresh session token.
//! - End sessions on explicit logout.
//!
//! # Invariants
//! - A session is created only after credentials verified successfully.
//! - Backend failures deny the login; they are never treated as success.

use crate::auth::clock::Clock;
use crate::auth::credentials::CredentialVerifier;
use crate::auth::session::{SessionManager, SessionToken};
use crate::repo::user_repo::UserDirectory;
use crate::service::error::AccessError;
use log::{error, warn};

pub struct AuthService<'a, D: UserDirectory, C: Clock> {
    verifier: &'a CredentialVerifier<D>,
    sessions: &'a SessionManager<C>,
}

impl<'a, D: UserDirectory, C: Clock> AuthService<'a, D, C> {
    pub fn new(verifier: &'a CredentialVerifier<D>, sessions: &'a SessionManager<C>) -> Self {
        Self { verifier, sessions }
    }

    /// Verifies credentials and starts a new session.
    ///
    /// # Errors
    /// - `AccessError::Unauthorized` for wrong credentials.
    /// - `AccessError::AuthBackendUnavailable` when the user directory
    ///   cannot be read; the login is denied.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken, AccessError> {
        match self.verifier.check(username, password) {
            Ok(true) => Ok(self.sessions.login()),
            Ok(false) => {
                warn!("event=login module=service status=denied error_code=unauthorized");
                Err(AccessError::Unauthorized)
            }
            Err(err) => {
                let err = AccessError::from(err);
                error!(
                    "event=login module=service status=error error_code={} error={}",
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Ends the session behind `token`, if any. Always succeeds.
    pub fn logout(&self, token: Option<&str>) {
        if let Some(token) = token {
            self.sessions.logout(token);
        }
    }
}
