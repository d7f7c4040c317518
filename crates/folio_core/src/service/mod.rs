//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate auth and repository calls into request-level APIs.
//! - Keep the routing layer decoupled from storage and session details.

pub mod article_service;
pub mod auth_service;
pub mod error;
pub mod mutation_gateway;
