//! Repository traits describing the backing relational store.
//!
//! The cache loader is the only component that calls these ports; cache hits
//! never touch them, so load on the system of record is proportional to the
//! miss rate.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CartLine, ItemRecord};
use crate::domain::types::SortOrder;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Paged listing request. `search` is a free-text substring matched against
/// title and description; blank means no filter.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub page: u32,
    pub size: u32,
    pub search: String,
    pub sort: SortOrder,
}

/// Read access to the authoritative `items` table.
#[async_trait]
pub trait ItemsRepo: Send + Sync {
    async fn item_by_id(&self, id: i64) -> Result<Option<ItemRecord>, RepoError>;

    /// One page of items in the query's sort order, ties broken by id
    /// ascending. The store owns the ordering; the cache only replays it.
    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<ItemRecord>, RepoError>;

    async fn count_items(&self) -> Result<u64, RepoError>;
}

/// Read/write access to per-user cart rows, keyed by `(item_id, user_id)`.
#[async_trait]
pub trait CartRepo: Send + Sync {
    async fn cart_line(&self, item_id: i64, user_id: i64) -> Result<Option<CartLine>, RepoError>;

    /// Insert the row or overwrite its quantity.
    async fn upsert_cart_line(&self, line: CartLine) -> Result<(), RepoError>;

    /// Remove the row; absent rows are not an error.
    async fn delete_cart_line(&self, item_id: i64, user_id: i64) -> Result<(), RepoError>;
}
