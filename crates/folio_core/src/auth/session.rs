//! Session lifecycle with sliding inactivity expiry.
//!
//! # Responsibility
//! - Issue session tokens on successful login.
//! - Answer "is this token authenticated" for every mutating request.
//! - Expire sessions after a window of inactivity.
//!
//! # Invariants
//! - A session is valid only while `now - last_active_at < timeout`.
//! - Once expired, a token never authenticates again; only a fresh login
//!   (new token) does.
//! - The table only holds live sessions and expired tombstones younger than
//!   `EXPIRED_RETENTION_TIMEOUTS` timeouts; logins sweep older entries at most
//!   once per timeout.
//! - Check-and-refresh runs under one write lock, so concurrent refreshes
//!   of the same token cannot interleave.

use super::clock::{Clock, SystemClock};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// 30 minutes of inactivity.
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 1800;

const TOKEN_LOG_PREFIX_CHARS: usize = 8;

/// Idle time, in timeouts, after which a login sweep drops an entry.
const EXPIRED_RETENTION_TIMEOUTS: i64 = 2;

/// Opaque client-held session identifier.
pub type SessionToken = String;

/// Authorization-relevant state of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Unknown token, logged out, or expired long enough ago to be swept.
    Anonymous,
    /// Logged in and within the inactivity window.
    Authenticated,
    /// Logged in but idle for at least the timeout.
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    authenticated: bool,
    expired: bool,
    last_active_at: i64,
}

impl SessionEntry {
    fn status(&self, now: i64, timeout_secs: i64) -> SessionStatus {
        if self.expired {
            SessionStatus::Expired
        } else if !self.authenticated {
            SessionStatus::Anonymous
        } else if now.saturating_sub(self.last_active_at) >= timeout_secs {
            SessionStatus::Expired
        } else {
            SessionStatus::Authenticated
        }
    }
}

/// Owns all server-side session state.
pub struct SessionManager<C: Clock = SystemClock> {
    clock: C,
    timeout_secs: i64,
    sessions: RwLock<HashMap<SessionToken, SessionEntry>>,
    next_sweep_at: AtomicI64,
}

impl Default for SessionManager<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock, DEFAULT_SESSION_TIMEOUT_SECS)
    }
}

impl<C: Clock> SessionManager<C> {
    /// Creates a manager with the given clock and inactivity timeout.
    ///
    /// Non-positive timeouts fall back to `DEFAULT_SESSION_TIMEOUT_SECS`.
    pub fn new(clock: C, timeout_secs: i64) -> Self {
        let timeout_secs = if timeout_secs > 0 {
            timeout_secs
        } else {
            DEFAULT_SESSION_TIMEOUT_SECS
        };
        let next_sweep_at = clock.now_unix_secs().saturating_add(timeout_secs);
        Self {
            clock,
            timeout_secs,
            sessions: RwLock::new(HashMap::new()),
            next_sweep_at: AtomicI64::new(next_sweep_at),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unsigned_abs())
    }

    /// Starts an authenticated session and returns its fresh token.
    ///
    /// Call only after credentials were verified. Also sweeps stale entries
    /// when the last sweep is at least one timeout old.
    pub fn login(&self) -> SessionToken {
        let token = Uuid::new_v4().simple().to_string();
        let now = self.clock.now_unix_secs();
        let mut sessions = self.sessions.write();
        if now >= self.next_sweep_at.load(Ordering::Relaxed) {
            self.sweep_stale(&mut sessions, now);
        }
        sessions.insert(
            token.clone(),
            SessionEntry {
                authenticated: true,
                expired: false,
                last_active_at: now,
            },
        );
        info!(
            "event=session_login module=auth status=ok token={}",
            token_prefix(&token)
        );
        token
    }

    /// Returns the current status without refreshing activity.
    pub fn status(&self, token: &str) -> SessionStatus {
        let now = self.clock.now_unix_secs();
        self.sessions
            .read()
            .get(token)
            .map(|entry| entry.status(now, self.timeout_secs))
            .unwrap_or(SessionStatus::Anonymous)
    }

    /// Side-effect-free validity check.
    pub fn is_valid(&self, token: &str) -> bool {
        self.status(token) == SessionStatus::Authenticated
    }

    /// Refreshes `last_active_at` of a valid session.
    ///
    /// Returns `false` without refreshing when the session is not valid; a
    /// session found past its window is marked expired.
    pub fn touch(&self, token: &str) -> bool {
        let now = self.clock.now_unix_secs();
        let mut sessions = self.sessions.write();
        let Some(entry) = sessions.get_mut(token) else {
            return false;
        };

        match entry.status(now, self.timeout_secs) {
            SessionStatus::Authenticated => {
                entry.last_active_at = now;
                true
            }
            SessionStatus::Expired => {
                if !entry.expired {
                    entry.authenticated = false;
                    entry.expired = true;
                    info!(
                        "event=session_expired module=auth status=ok token={} idle_secs={}",
                        token_prefix(token),
                        now.saturating_sub(entry.last_active_at)
                    );
                }
                false
            }
            SessionStatus::Anonymous => false,
        }
    }

    /// Authorization oracle used by every mutating operation.
    ///
    /// Note: a successful check also refreshes the session's activity
    /// timestamp (sliding expiry), so merely asking extends the session.
    /// Use `is_valid` for a read-only check.
    pub fn is_authenticated(&self, token: &str) -> bool {
        let authenticated = self.touch(token);
        debug!(
            "event=session_check module=auth status={} token={}",
            if authenticated { "ok" } else { "denied" },
            token_prefix(token)
        );
        authenticated
    }

    /// Ends an authenticated session. Always succeeds.
    ///
    /// The entry is dropped, so the token reads as `Anonymous`. Expired
    /// tokens keep their tombstone and stay `Expired`.
    pub fn logout(&self, token: &str) {
        let now = self.clock.now_unix_secs();
        let mut sessions = self.sessions.write();
        let expired = sessions
            .get(token)
            .map(|entry| entry.status(now, self.timeout_secs) == SessionStatus::Expired)
            .unwrap_or(false);
        if !expired {
            sessions.remove(token);
        }
        info!(
            "event=session_logout module=auth status=ok token={}",
            token_prefix(token)
        );
    }

    /// Drops every entry that is no longer authenticated.
    ///
    /// Returns the number of removed entries.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_unix_secs();
        let timeout_secs = self.timeout_secs;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.status(now, timeout_secs) == SessionStatus::Authenticated);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(
                "event=session_purge module=auth status=ok removed={} remaining={}",
                removed,
                sessions.len()
            );
        }
        removed
    }

    /// Number of entries held, including expired tombstones.
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Number of sessions currently within their inactivity window.
    pub fn active_sessions(&self) -> usize {
        let now = self.clock.now_unix_secs();
        self.sessions
            .read()
            .values()
            .filter(|entry| entry.status(now, self.timeout_secs) == SessionStatus::Authenticated)
            .count()
    }
}

impl<C: Clock> SessionManager<C> {
    fn sweep_stale(&self, sessions: &mut HashMap<SessionToken, SessionEntry>, now: i64) {
        let horizon = self.timeout_secs.saturating_mul(EXPIRED_RETENTION_TIMEOUTS);
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_sub(entry.last_active_at) < horizon);
        self.next_sweep_at
            .store(now.saturating_add(self.timeout_secs), Ordering::Relaxed);
        debug!(
            "event=session_sweep module=auth status=ok removed={} remaining={}",
            before - sessions.len(),
            sessions.len()
        );
    }
}

fn token_prefix(token: &str) -> &str {
    token
        .char_indices()
        .nth(TOKEN_LOG_PREFIX_CHARS)
        .map(|(index, _)| &token[..index])
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::{token_prefix, SessionManager, SessionStatus, DEFAULT_SESSION_TIMEOUT_SECS};
    use crate::auth::clock::ManualClock;
    use std::sync::Arc;

    fn manager() -> (Arc<ManualClock>, SessionManager<Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let sessions = SessionManager::new(Arc::clone(&clock), DEFAULT_SESSION_TIMEOUT_SECS);
        (clock, sessions)
    }

    #[test]
    fn status_does_not_refresh_activity() {
        let (clock, sessions) = manager();
        let token = sessions.login();

        clock.advance(DEFAULT_SESSION_TIMEOUT_SECS - 1);
        assert_eq!(sessions.status(&token), SessionStatus::Authenticated);
        clock.advance(1);
        assert_eq!(sessions.status(&token), SessionStatus::Expired);
    }

    #[test]
    fn expired_token_does_not_come_back_after_logout() {
        let (clock, sessions) = manager();
        let token = sessions.login();

        clock.advance(DEFAULT_SESSION_TIMEOUT_SECS);
        assert!(!sessions.is_authenticated(&token));
        sessions.logout(&token);
        assert_eq!(sessions.status(&token), SessionStatus::Expired);
    }

    #[test]
    fn expired_tombstone_is_kept_within_retention() {
        let (clock, sessions) = manager();
        let token = sessions.login();

        clock.advance(DEFAULT_SESSION_TIMEOUT_SECS * 2 - 1);
        sessions.login();
        assert_eq!(sessions.status(&token), SessionStatus::Expired);

        clock.advance(DEFAULT_SESSION_TIMEOUT_SECS);
        sessions.login();
        assert_eq!(sessions.status(&token), SessionStatus::Anonymous);
        assert_eq!(sessions.tracked_sessions(), 2);
    }

    #[test]
    fn non_positive_timeout_uses_default() {
        let sessions = SessionManager::new(ManualClock::new(0), 0);
        assert_eq!(sessions.timeout().as_secs(), 1800);
    }

    #[test]
    fn token_prefix_is_short() {
        assert_eq!(token_prefix("0123456789abcdef"), "01234567");
        assert_eq!(token_prefix("abc"), "abc");
    }
}
