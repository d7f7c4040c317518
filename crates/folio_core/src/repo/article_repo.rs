//! Article repository contracts and JSON snapshot implementation.
//!
//! # Responsibility
//! - Provide list/get/paginate/insert/update/delete over the article
//!   collection.
//! - Serialize every mutation as one load -> mutate -> persist unit.
//!
//! # Invariants
//! - Ids are assigned as `max existing id + 1` and never reused.
//! - Read paths reject persisted collections with duplicate ids instead of
//!   masking them.
//! - A failed mutation never persists a partial collection.

use crate::model::article::{Article, ArticleDraft, ArticleId};
use crate::storage::{SnapshotFile, StorageError};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 5;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for article persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Storage(StorageError),
    NotFound(ArticleId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Normalized pagination request.
///
/// Zero or negative inputs fall back to the defaults; nothing is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: normalize_positive(page, DEFAULT_PAGE),
            limit: normalize_positive(limit, DEFAULT_PAGE_LIMIT),
        }
    }

    /// Builds a request from raw query-string values.
    ///
    /// Missing or non-numeric values behave like zero and take the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |value: Option<&str>| {
            value
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .unwrap_or(0)
        };
        Self::new(parse(page), parse(limit))
    }

    /// Zero-based offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Returns the slice of `items` covered by this page.
    ///
    /// Out-of-range pages yield an empty slice; the last page is truncated.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let len = items.len() as u64;
        let start = self.offset().min(len) as usize;
        let end = (self.offset() + u64::from(self.limit)).min(len) as usize;
        &items[start..end]
    }
}

fn normalize_positive(value: i64, default: u32) -> u32 {
    if value < 1 {
        default
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

/// Repository interface for article CRUD operations.
///
/// Implementations must be shareable across request threads.
pub trait ArticleRepository: Send + Sync {
    /// Returns the full persisted collection in stored order.
    fn list_articles(&self) -> RepoResult<Vec<Article>>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Appends a new article with a freshly assigned id.
    fn insert_article(&self, draft: ArticleDraft) -> RepoResult<Article>;
    /// Replaces every field except `id`.
    fn update_article(&self, id: ArticleId, draft: ArticleDraft) -> RepoResult<Article>;
    /// Removes one article, preserving the order of the rest.
    fn delete_article(&self, id: ArticleId) -> RepoResult<()>;

    fn paginate_articles(&self, request: PageRequest) -> RepoResult<Vec<Article>> {
        let articles = self.list_articles()?;
        Ok(request.slice(&articles).to_vec())
    }
}

/// Article repository backed by one JSON snapshot file.
///
/// Reads take no lock: the snapshot is replaced by atomic rename, so a read
/// always sees a complete collection. Mutations hold `write_lock` for the
/// whole load -> mutate -> persist cycle. The lock is shared by every
/// repository opened on the same file in this process.
pub struct FileArticleRepository {
    file: SnapshotFile,
    write_lock: Arc<Mutex<()>>,
}

impl FileArticleRepository {
    /// Opens the collection at `path`, creating an empty one when absent.
    ///
    /// # Errors
    /// - Storage errors when the file cannot be created or read.
    /// - `RepoError::InvalidData` when the existing collection is inconsistent.
    pub fn open(path: impl Into<PathBuf>) -> RepoResult<Self> {
        let file = SnapshotFile::new(path);
        let created = file.ensure_initialized(&Vec::<Article>::new())?;
        let write_lock = file.write_lock();
        let repo = Self { file, write_lock };
        let count = repo.load_snapshot()?.len();
        info!(
            "event=article_store_open module=repo status=ok created={} articles={}",
            created, count
        );
        Ok(repo)
    }

    /// Loads the last successfully persisted collection.
    pub fn load_snapshot(&self) -> RepoResult<Vec<Article>> {
        let articles: Vec<Article> = self.file.load()?;
        validate_collection(&articles)?;
        Ok(articles)
    }

    /// Replaces the whole persisted collection.
    ///
    /// Serialized with the mutation path; rejects collections with duplicate
    /// ids.
    pub fn save_snapshot(&self, articles: &[Article]) -> RepoResult<()> {
        validate_collection(articles)?;
        let _guard = self.write_lock.lock();
        self.file.save(articles)?;
        Ok(())
    }

    fn mutate<T>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut Vec<Article>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let _guard = self.write_lock.lock();
        let mut articles = self.load_snapshot()?;
        let outcome = match apply(&mut articles) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(
                    "event=article_mutation module=repo op={} status=rejected error={}",
                    operation, err
                );
                return Err(err);
            }
        };
        self.file.save(&articles)?;
        debug!(
            "event=article_mutation module=repo op={} status=ok articles={}",
            operation,
            articles.len()
        );
        Ok(outcome)
    }
}

impl ArticleRepository for FileArticleRepository {
    fn list_articles(&self) -> RepoResult<Vec<Article>> {
        self.load_snapshot()
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        Ok(self
            .load_snapshot()?
            .into_iter()
            .find(|article| article.id == id))
    }

    fn insert_article(&self, draft: ArticleDraft) -> RepoResult<Article> {
        self.mutate("insert", |articles| {
            let id = next_article_id(articles)?;
            let article = Article::from_draft(id, draft);
            articles.push(article.clone());
            Ok(article)
        })
    }

    fn update_article(&self, id: ArticleId, draft: ArticleDraft) -> RepoResult<Article> {
        self.mutate("update", |articles| {
            let article = articles
                .iter_mut()
                .find(|article| article.id == id)
                .ok_or(RepoError::NotFound(id))?;
            article.apply(draft);
            Ok(article.clone())
        })
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        self.mutate("delete", |articles| {
            let index = articles
                .iter()
                .position(|article| article.id == id)
                .ok_or(RepoError::NotFound(id))?;
            articles.remove(index);
            Ok(())
        })
    }
}

/// Returns `max(existing ids) + 1`, or `1` for an empty collection.
pub fn next_article_id(articles: &[Article]) -> RepoResult<ArticleId> {
    let max = articles.iter().map(|article| article.id).max().unwrap_or(0);
    max.max(0)
        .checked_add(1)
        .ok_or_else(|| RepoError::InvalidData("article id space exhausted".to_string()))
}

fn validate_collection(articles: &[Article]) -> RepoResult<()> {
    let mut seen = HashSet::with_capacity(articles.len());
    for article in articles {
        if !seen.insert(article.id) {
            warn!(
                "event=article_store_validate module=repo status=error error_code=duplicate_id id={}",
                article.id
            );
            return Err(RepoError::InvalidData(format!(
                "duplicate article id `{}`",
                article.id
            )));
        }
    }
    Ok(())
}
