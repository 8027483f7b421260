//! # cosmap Store
//!
//! Client layer between the mapping engine and a document/graph container:
//!
//! - [`DocumentStore`] - the container operations the client depends on
//! - [`InMemoryStore`] - process-local container
//! - [`CosmosClient`] - typed single and bulk entry points
//! - [`bulk_apply`] - bounded-concurrency execution with progress callbacks

pub mod response;
pub mod store;
pub mod memory;
pub mod bulk;
pub mod client;

pub use response::{all_successful, total_execution_time, total_request_charge, CosmosResponse, ErrorInfo};
pub use store::{DocumentStore, QueryPage};
pub use memory::{InMemoryStore, InMemoryStoreConfig};
pub use bulk::{bulk_apply, BulkOptions, ProgressCallback};
pub use client::CosmosClient;
