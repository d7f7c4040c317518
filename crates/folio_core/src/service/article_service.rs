//! Article read use-case service.
//!
//! # Responsibility
//! - Serve list, paginated list and single-article reads.
//! - Normalize raw pagination inputs before hitting the repository.
//!
//! # Invariants
//! - Reads never take the store's write lock.
//! - A missing article is `AccessError::NotFound`, never a server error.

use crate::model::article::{Article, ArticleId};
use crate::repo::article_repo::{ArticleRepository, PageRequest};
use crate::service::error::AccessError;
use log::error;

/// Read-side facade over an article repository.
pub struct ArticleService<'a, R: ArticleRepository> {
    repo: &'a R,
}

impl<'a, R: ArticleRepository> ArticleService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Returns the full collection in stored order.
    pub fn list(&self) -> Result<Vec<Article>, AccessError> {
        self.repo.list_articles().map_err(|err| log_failure("list", err.into()))
    }

    /// Returns one page of articles.
    pub fn paginate(&self, request: PageRequest) -> Result<Vec<Article>, AccessError> {
        self.repo
            .paginate_articles(request)
            .map_err(|err| log_failure("paginate", err.into()))
    }

    /// Returns one page from raw `page`/`limit` query values.
    ///
    /// Missing, non-numeric, zero or negative values take the defaults.
    pub fn paginate_query(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Vec<Article>, AccessError> {
        self.paginate(PageRequest::from_query(page, limit))
    }

    pub fn get(&self, id: ArticleId) -> Result<Article, AccessError> {
        self.repo
            .get_article(id)
            .map_err(|err| log_failure("get", err.into()))?
            .ok_or(AccessError::NotFound(id))
    }
}

fn log_failure(operation: &'static str, err: AccessError) -> AccessError {
    error!(
        "event=article_read module=service op={} status=error error_code={} error={}",
        operation,
        err.code(),
        err
    );
    err
}
