//! Repository Layer - Core Traits
//!
//! Defines the abstract interface to the remote record store.
//! Implementations can use the Airtable REST API, in-memory, etc.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::query::ListQuery;
use crate::domain::{DomainResult, RemoteRecord, TodoId};

/// Remote record collection
///
/// All operations are async; failures come back as `DomainError::Transport`
/// when the store could not be reached or refused the request.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Fetch all records matching `query`, in the store's order
    async fn list(&self, query: &ListQuery) -> DomainResult<Vec<RemoteRecord>>;

    /// Create a record and return it with its assigned id
    async fn create(&self, fields: &Map<String, Value>) -> DomainResult<RemoteRecord>;

    /// Patch the given fields of an existing record
    async fn update(&self, id: &TodoId, fields: &Map<String, Value>) -> DomainResult<RemoteRecord>;
}
