//! Core data models for the SEO metadata service.
//!
//! These entities represent stored metadata records and registered per-model
//! defaults. They map cleanly to database tables via `sqlx::FromRow` and
//! serialize naturally as JSON via `serde`. Domain-object contracts live in
//! `domain` and are implemented by the embedding host.

pub mod domain;
pub mod record;
pub mod registered;

use serde::Serialize;

/// The resolved (title, description) pair handed back to callers.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
}
