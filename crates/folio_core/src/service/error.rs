//! Request-level error taxonomy shared by all services.

use crate::auth::credentials::CredentialError;
use crate::model::article::{ArticleId, ArticlePayloadError};
use crate::repo::article_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of a rejected or failed request.
///
/// The routing layer maps variants to status codes with `http_status` and
/// shows clients only `public_message`; `Display` carries internal detail
/// for logs.
#[derive(Debug)]
pub enum AccessError {
    /// No session, logged out, expired, or invalid credentials.
    Unauthorized,
    /// Target article does not exist.
    NotFound(ArticleId),
    /// Mutation payload could not be parsed into an article.
    InvalidInput(ArticlePayloadError),
    /// Article store could not be read or written.
    StoreUnavailable(RepoError),
    /// User directory could not be read or parsed.
    AuthBackendUnavailable(CredentialError),
}

impl AccessError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::StoreUnavailable(_) | Self::AuthBackendUnavailable(_) => 500,
        }
    }

    /// Client-facing text that never includes internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::NotFound(_) => "Article not found",
            Self::InvalidInput(_) => "Invalid data",
            Self::StoreUnavailable(_) | Self::AuthBackendUnavailable(_) => {
                "Internal server error"
            }
        }
    }

    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::AuthBackendUnavailable(_) => "auth_backend_unavailable",
        }
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::StoreUnavailable(err) => write!(f, "article store unavailable: {err}"),
            Self::AuthBackendUnavailable(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::AuthBackendUnavailable(err) => Some(err),
            Self::Unauthorized | Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<ArticlePayloadError> for AccessError {
    fn from(value: ArticlePayloadError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<CredentialError> for AccessError {
    fn from(value: CredentialError) -> Self {
        Self::AuthBackendUnavailable(value)
    }
}
