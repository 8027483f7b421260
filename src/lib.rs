//! # cosmap
//!
//! Maps typed entities onto the wire shapes of a document/graph container
//! and back, with a bulk write path that reports progress as it goes.
//!
//! ## Quick Start
//!
//! ### As a Loader
//!
//! ```bash
//! cosmap --input movies.json --mode vertex --concurrency 8
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use cosmap::prelude::*;
//! use cosmap::movie::Movie;
//!
//! # async fn run() -> cosmap::Result<()> {
//! let client = CosmosClient::new(InMemoryStore::default());
//!
//! let avatar = Movie { tmdb_id: 19995, title: "Avatar".into(), ..Default::default() };
//! let response = client.upsert_vertex(&avatar).await?;
//! assert!(response.is_successful);
//!
//! let read = client.read_vertex::<Movie>("19995", "Avatar").await;
//! assert_eq!(read.result, Some(avatar));
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `cosmap-core` - entity descriptors, document projection, vertex/edge encoding, graphson decoding
//! - `cosmap-store` - response model, store trait, in-memory store, bulk orchestration, client

pub mod movie;

// Re-export core types
pub use cosmap_core::{
    DocValue, Document, EdgeDocument, Entity, EntitySerializer, Error, FieldDef, FieldKind,
    FieldSelectors, GraphItemBase, GraphsonShape, ProjectOptions, Result, SerializerConfig,
    VertexDocument, VertexProperty,
};

// Re-export store
pub use cosmap_store::{
    all_successful, bulk_apply, total_execution_time, total_request_charge, BulkOptions,
    CosmosClient, CosmosResponse, DocumentStore, ErrorInfo, InMemoryStore, InMemoryStoreConfig,
    ProgressCallback,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BulkOptions, CosmosClient, CosmosResponse, DocValue, DocumentStore, Entity,
        EntitySerializer, Error, FieldDef, FieldKind, GraphItemBase, InMemoryStore, Result,
        SerializerConfig,
    };
}
