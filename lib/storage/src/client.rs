use crate::bulk::{bulk_apply, BulkOptions, ProgressCallback};
use crate::response::CosmosResponse;
use crate::store::DocumentStore;
use cosmap_core::{Entity, EntitySerializer, Error, GraphItemBase, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Upsert,
}

type Encoder<T> = fn(&EntitySerializer, &T) -> Result<Value>;

fn encode_document<T: Entity>(serializer: &EntitySerializer, entity: &T) -> Result<Value> {
    Ok(serializer.to_document(entity)?.to_json())
}

fn encode_vertex<T: Entity>(serializer: &EntitySerializer, entity: &T) -> Result<Value> {
    Ok(serializer.to_vertex(entity)?.to_json())
}

/// Typed entry points over a [`DocumentStore`].
///
/// Single-item calls return `Err` when the entity cannot be mapped; store
/// failures come back as unsuccessful responses. Bulk calls never fail per
/// item: mapping errors become failed responses too.
pub struct CosmosClient<S: DocumentStore> {
    store: Arc<S>,
    serializer: EntitySerializer,
}

impl<S: DocumentStore> Clone for CosmosClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            serializer: self.serializer.clone(),
        }
    }
}

impl<S: DocumentStore> CosmosClient<S> {
    pub fn new(store: S) -> Self {
        Self::with_serializer(store, EntitySerializer::default())
    }

    pub fn with_serializer(store: S, serializer: EntitySerializer) -> Self {
        Self {
            store: Arc::new(store),
            serializer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn serializer(&self) -> &EntitySerializer {
        &self.serializer
    }

    async fn write(&self, document: Value, mode: WriteMode) -> CosmosResponse<Value> {
        match mode {
            WriteMode::Insert => self.store.insert(document).await,
            WriteMode::Upsert => self.store.upsert(document).await,
        }
    }

    async fn write_many<T>(
        &self,
        entities: Vec<T>,
        mode: WriteMode,
        encode: Encoder<T>,
        options: &BulkOptions,
        on_progress: Option<ProgressCallback<Value>>,
    ) -> Result<Vec<CosmosResponse<Value>>>
    where
        T: Entity + Send,
    {
        debug!("{:?} of {} {} entities", mode, entities.len(), T::type_name());

        let store = self.store.clone();
        let serializer = self.serializer.clone();
        bulk_apply(
            entities,
            move |entity: T| {
                let store = store.clone();
                let encoded = encode(&serializer, &entity);
                async move {
                    match (encoded, mode) {
                        (Ok(document), WriteMode::Insert) => store.insert(document).await,
                        (Ok(document), WriteMode::Upsert) => store.upsert(document).await,
                        (Err(e), _) => CosmosResponse::from_error(&e),
                    }
                }
            },
            options,
            on_progress,
        )
        .await
    }

    pub async fn insert_document<T: Entity>(&self, entity: &T) -> Result<CosmosResponse<Value>> {
        let document = encode_document(&self.serializer, entity)?;
        Ok(self.write(document, WriteMode::Insert).await)
    }

    pub async fn upsert_document<T: Entity>(&self, entity: &T) -> Result<CosmosResponse<Value>> {
        let document = encode_document(&self.serializer, entity)?;
        Ok(self.write(document, WriteMode::Upsert).await)
    }

    pub async fn insert_documents<T: Entity + Send>(
        &self,
        entities: Vec<T>,
        options: &BulkOptions,
        on_progress: Option<ProgressCallback<Value>>,
    ) -> Result<Vec<CosmosResponse<Value>>> {
        self.write_many(entities, WriteMode::Insert, encode_document::<T>, options, on_progress)
            .await
    }

    pub async fn upsert_documents<T: Entity + Send>(
        &self,
        entities: Vec<T>,
        options: &BulkOptions,
        on_progress: Option<ProgressCallback<Value>>,
    ) -> Result<Vec<CosmosResponse<Value>>> {
        self.write_many(entities, WriteMode::Upsert, encode_document::<T>, options, on_progress)
            .await
    }

    /// Read a plain document and deserialize it into `T`.
    pub async fn read_document<T: DeserializeOwned>(&self, id: &str, partition_key: &str) -> CosmosResponse<T> {
        self.store
            .read(id, partition_key)
            .await
            .try_map(|document| serde_json::from_value(document).map_err(Error::from))
    }

    /// One page of query results. Pass the previous response's continuation
    /// token to fetch the next page.
    pub async fn execute_sql<T: DeserializeOwned>(
        &self,
        query: &str,
        continuation: Option<&str>,
    ) -> CosmosResponse<Vec<T>> {
        self.store.query(query, continuation).await.try_map(|page| {
            page.into_iter()
                .map(|document| serde_json::from_value(document).map_err(Error::from))
                .collect()
        })
    }

    /// Every page of a query. Stops at the first failed page and returns it.
    pub async fn execute_sql_all<T: DeserializeOwned>(&self, query: &str) -> CosmosResponse<Vec<T>> {
        let mut items = Vec::new();
        let mut request_charge = 0.0;
        let mut execution_time = std::time::Duration::ZERO;
        let mut continuation: Option<String> = None;

        loop {
            let page = self.execute_sql::<T>(query, continuation.as_deref()).await;
            request_charge += page.request_charge;
            execution_time += page.execution_time;

            if !page.is_successful {
                return page
                    .with_request_charge(request_charge)
                    .with_execution_time(execution_time);
            }

            continuation = page.continuation_token;
            items.extend(page.result.unwrap_or_default());
            if continuation.is_none() {
                break;
            }
        }

        CosmosResponse::success(items)
            .with_request_charge(request_charge)
            .with_execution_time(execution_time)
    }

    pub async fn insert_vertex<T: Entity>(&self, entity: &T) -> Result<CosmosResponse<Value>> {
        let vertex = encode_vertex(&self.serializer, entity)?;
        Ok(self.write(vertex, WriteMode::Insert).await)
    }

    pub async fn upsert_vertex<T: Entity>(&self, entity: &T) -> Result<CosmosResponse<Value>> {
        let vertex = encode_vertex(&self.serializer, entity)?;
        Ok(self.write(vertex, WriteMode::Upsert).await)
    }

    pub async fn upsert_vertices<T: Entity + Send>(
        &self,
        entities: Vec<T>,
        options: &BulkOptions,
        on_progress: Option<ProgressCallback<Value>>,
    ) -> Result<Vec<CosmosResponse<Value>>> {
        self.write_many(entities, WriteMode::Upsert, encode_vertex::<T>, options, on_progress)
            .await
    }

    /// Read a vertex and decode it into `T`.
    pub async fn read_vertex<T: Entity + Default>(&self, id: &str, partition_key: &str) -> CosmosResponse<T> {
        let serializer = &self.serializer;
        self.store.read(id, partition_key).await.try_map(|vertex| {
            serializer
                .decode::<T>(&vertex)?
                .ok_or_else(|| Error::InvalidDocument(format!("vertex '{id}' has no content")))
        })
    }

    pub async fn insert_edge<T: Entity>(
        &self,
        entity: &T,
        source: &GraphItemBase,
        target: &GraphItemBase,
        single: bool,
    ) -> Result<CosmosResponse<Value>> {
        let edge = self.serializer.to_edge(entity, source, target, single)?;
        Ok(self.write(edge.to_json(), WriteMode::Insert).await)
    }

    /// With `single`, repeated upserts between the same endpoints replace one
    /// edge instead of adding another.
    pub async fn upsert_edge<T: Entity>(
        &self,
        entity: &T,
        source: &GraphItemBase,
        target: &GraphItemBase,
        single: bool,
    ) -> Result<CosmosResponse<Value>> {
        let edge = self.serializer.to_edge(entity, source, target, single)?;
        Ok(self.write(edge.to_json(), WriteMode::Upsert).await)
    }
}
