//! Authentication: credential checks and session lifecycle.
//!
//! # Responsibility
//! - Verify username/password pairs against provisioned argon2 hashes.
//! - Track per-token sessions with sliding inactivity expiry.
//!
//! # Invariants
//! - Credential checks fail closed.
//! - Session state is owned by an explicitly constructed `SessionManager`;
//!   there is no process-wide session registry.

pub mod clock;
pub mod credentials;
pub mod session;
