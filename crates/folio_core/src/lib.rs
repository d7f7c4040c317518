//! Core domain logic for Folio.
//! This crate is the single source of truth for article and session invariants.

pub mod app;
pub mod auth;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use app::{Folio, FolioError};
pub use auth::clock::{Clock, ManualClock, SystemClock};
pub use auth::credentials::{hash_password, CredentialError, CredentialPolicy, CredentialVerifier};
pub use auth::session::{SessionManager, SessionStatus, SessionToken, DEFAULT_SESSION_TIMEOUT_SECS};
pub use config::{ConfigError, FolioConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::article::{Article, ArticleDraft, ArticleId, ArticlePayloadError};
pub use model::user::User;
pub use repo::article_repo::{
    ArticleRepository, FileArticleRepository, PageRequest, RepoError, RepoResult,
};
pub use repo::user_repo::{JsonUserDirectory, UserDirectory};
pub use service::article_service::ArticleService;
pub use service::auth_service::AuthService;
pub use service::error::AccessError;
pub use service::mutation_gateway::MutationGateway;
pub use storage::{SnapshotFile, SnapshotLock, StorageError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
