//! The remote store seam.

use crate::response::CosmosResponse;
use async_trait::async_trait;
use serde_json::Value;

/// One page of a SQL query.
pub type QueryPage = Vec<Value>;

/// Document operations a container exposes. Implementations report failures
/// through the response, never by panicking.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Create a document; fails with a conflict if the id already exists in
    /// its partition.
    async fn insert(&self, document: Value) -> CosmosResponse<Value>;

    /// Create or replace a document.
    async fn upsert(&self, document: Value) -> CosmosResponse<Value>;

    async fn read(&self, id: &str, partition_key: &str) -> CosmosResponse<Value>;

    /// Run a query, resuming after `continuation` when given. The next token,
    /// if any, is on the response.
    async fn query(&self, query: &str, continuation: Option<&str>) -> CosmosResponse<QueryPage>;
}
