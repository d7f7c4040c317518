//! Authorization gate in front of article mutations.
//!
//! # Responsibility
//! - Check the caller's session before any store access.
//! - Reject malformed payloads before any store access.
//! - Delegate insert/update/delete to the repository and return its result.
//!
//! # Invariants
//! - Order is always: session check -> payload parse -> store mutation.
//! - `Unauthorized` and `InvalidInput` leave the store untouched.
//! - Store failures are logged and surfaced, never swallowed.

use crate::auth::clock::Clock;
use crate::auth::session::SessionManager;
use crate::model::article::{Article, ArticleDraft, ArticleId};
use crate::repo::article_repo::ArticleRepository;
use crate::service::error::AccessError;
use log::{error, info, warn};

pub struct MutationGateway<'a, R: ArticleRepository, C: Clock> {
    sessions: &'a SessionManager<C>,
    repo: &'a R,
}

impl<'a, R: ArticleRepository, C: Clock> MutationGateway<'a, R, C> {
    pub fn new(sessions: &'a SessionManager<C>, repo: &'a R) -> Self {
        Self { sessions, repo }
    }

    pub fn insert(&self, token: Option<&str>, draft: ArticleDraft) -> Result<Article, AccessError> {
        self.authorize(token, "insert")?;
        self.finish("insert", self.repo.insert_article(draft).map_err(AccessError::from))
    }

    /// Parses a raw JSON body and inserts it.
    pub fn insert_json(&self, token: Option<&str>, body: &[u8]) -> Result<Article, AccessError> {
        self.authorize(token, "insert")?;
        let draft = parse_payload(body, "insert")?;
        self.finish("insert", self.repo.insert_article(draft).map_err(AccessError::from))
    }

    /// Replaces every field of article `id` except the id itself.
    pub fn update(
        &self,
        token: Option<&str>,
        id: ArticleId,
        draft: ArticleDraft,
    ) -> Result<Article, AccessError> {
        self.authorize(token, "update")?;
        self.finish("update", self.repo.update_article(id, draft).map_err(AccessError::from))
    }

    /// Parses a raw JSON body and applies it to article `id`.
    pub fn update_json(
        &self,
        token: Option<&str>,
        id: ArticleId,
        body: &[u8],
    ) -> Result<Article, AccessError> {
        self.authorize(token, "update")?;
        let draft = parse_payload(body, "update")?;
        self.finish("update", self.repo.update_article(id, draft).map_err(AccessError::from))
    }

    pub fn delete(&self, token: Option<&str>, id: ArticleId) -> Result<(), AccessError> {
        self.authorize(token, "delete")?;
        self.finish("delete", self.repo.delete_article(id).map_err(AccessError::from))
    }

    fn authorize(&self, token: Option<&str>, operation: &'static str) -> Result<(), AccessError> {
        match token {
            Some(token) if self.sessions.is_authenticated(token) => Ok(()),
            _ => {
                warn!(
                    "event=article_mutation module=gateway op={} status=denied error_code=unauthorized has_token={}",
                    operation,
                    token.is_some()
                );
                Err(AccessError::Unauthorized)
            }
        }
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        outcome: Result<T, AccessError>,
    ) -> Result<T, AccessError> {
        match &outcome {
            Ok(_) => info!(
                "event=article_mutation module=gateway op={} status=ok",
                operation
            ),
            Err(err @ AccessError::NotFound(_)) => warn!(
                "event=article_mutation module=gateway op={} status=error error_code={}",
                operation,
                err.code()
            ),
            Err(err) => error!(
                "event=article_mutation module=gateway op={} status=error error_code={} error={}",
                operation,
                err.code(),
                err
            ),
        }
        outcome
    }
}

fn parse_payload(body: &[u8], operation: &'static str) -> Result<ArticleDraft, AccessError> {
    ArticleDraft::from_json(body).map_err(|err| {
        warn!(
            "event=article_mutation module=gateway op={} status=error error_code=invalid_input",
            operation
        );
        AccessError::from(err)
    })
}
