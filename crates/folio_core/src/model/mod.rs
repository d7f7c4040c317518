//! Domain model for articles and provisioned users.
//!
//! # Responsibility
//! - Define the canonical records shared by storage, auth and services.
//! - Own payload parsing so malformed input never reaches the store.
//!
//! # Invariants
//! - Every article is identified by a store-assigned `ArticleId`.
//! - User records are read-only from the core's point of view.

pub mod article;
pub mod user;
