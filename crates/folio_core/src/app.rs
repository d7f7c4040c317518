//! Service root owning all shared state.
//!
//! # Responsibility
//! - Build the article store, credential verifier and session manager from
//!   one `FolioConfig`.
//! - Hand out request services that borrow that state.
//!
//! # Invariants
//! - Exactly one article store and one session manager per `Folio`; request
//!   services never own state of their own.

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::credentials::CredentialVerifier;
use crate::auth::session::SessionManager;
use crate::config::{ConfigError, FolioConfig};
use crate::repo::article_repo::{FileArticleRepository, RepoError};
use crate::repo::user_repo::JsonUserDirectory;
use crate::service::article_service::ArticleService;
use crate::service::auth_service::AuthService;
use crate::service::mutation_gateway::MutationGateway;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum FolioError {
    Config(ConfigError),
    Store(RepoError),
}

impl Display for FolioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "failed to open article store: {err}"),
        }
    }
}

impl Error for FolioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for FolioError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for FolioError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Content backend root; share it by reference (or `Arc`) across requests.
pub struct Folio<C: Clock = SystemClock> {
    config: FolioConfig,
    articles: FileArticleRepository,
    verifier: CredentialVerifier<JsonUserDirectory>,
    sessions: SessionManager<C>,
}

impl Folio<SystemClock> {
    pub fn open(config: FolioConfig) -> Result<Self, FolioError> {
        Self::open_with_clock(config, SystemClock)
    }
}

impl<C: Clock> Folio<C> {
    /// Opens the article store and wires services around `clock`.
    ///
    /// A missing users file is not an error here; logins then fail closed.
    pub fn open_with_clock(config: FolioConfig, clock: C) -> Result<Self, FolioError> {
        config.validate()?;
        let articles = FileArticleRepository::open(&config.data_file)?;

        if !config.users_file.is_file() {
            warn!(
                "event=folio_open module=app status=degraded error_code=users_file_missing path={}",
                config.users_file.display()
            );
        }
        let verifier = CredentialVerifier::new(
            JsonUserDirectory::new(&config.users_file),
            config.credential_policy,
        );
        let sessions = SessionManager::new(clock, config.session_timeout_secs);

        info!(
            "event=folio_open module=app status=ok policy={:?} session_timeout_secs={}",
            config.credential_policy, config.session_timeout_secs
        );
        Ok(Self {
            config,
            articles,
            verifier,
            sessions,
        })
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    pub fn article_store(&self) -> &FileArticleRepository {
        &self.articles
    }

    pub fn sessions(&self) -> &SessionManager<C> {
        &self.sessions
    }

    /// `GET /articles`, `GET /article/{id}`.
    pub fn articles(&self) -> ArticleService<'_, FileArticleRepository> {
        ArticleService::new(&self.articles)
    }

    /// `POST /login`, `POST /logout`.
    pub fn auth(&self) -> AuthService<'_, JsonUserDirectory, C> {
        AuthService::new(&self.verifier, &self.sessions)
    }

    /// `POST /admin/add`, `PUT /admin/edit/{id}`, `DELETE /admin/delete/{id}`.
    pub fn gateway(&self) -> MutationGateway<'_, FileArticleRepository, C> {
        MutationGateway::new(&self.sessions, &self.articles)
    }
}
