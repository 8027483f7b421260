use crate::response::{CosmosResponse, ErrorInfo};
use crate::store::{DocumentStore, QueryPage};
use async_trait::async_trait;
use cosmap_core::{Error, Result, SerializerConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Settings for [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStoreConfig {
    /// Documents returned per query page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Charge reported on every response.
    #[serde(default = "default_request_charge")]
    pub request_charge: f64,
    /// Keys the id and partition key are read from.
    #[serde(default)]
    pub keys: SerializerConfig,
}

fn default_page_size() -> usize {
    100
}

fn default_request_charge() -> f64 {
    1.0
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_charge: default_request_charge(),
            keys: SerializerConfig::default(),
        }
    }
}

impl InMemoryStoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfig("page_size must be greater than zero".into()));
        }
        if !self.request_charge.is_finite() || self.request_charge < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "request_charge must be a non-negative number, got {}",
                self.request_charge
            )));
        }
        Ok(())
    }
}

type DocumentKey = (String, String);

/// Container held in process memory, keyed by (partition key, id).
///
/// Queries only understand `SELECT * FROM c`; pages follow key order.
#[derive(Clone)]
pub struct InMemoryStore {
    documents: Arc<RwLock<BTreeMap<DocumentKey, Value>>>,
    config: InMemoryStoreConfig,
}

impl InMemoryStore {
    pub fn new(config: InMemoryStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            config,
        })
    }

    pub fn config(&self) -> &InMemoryStoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Snapshot of every stored document in key order.
    pub fn documents(&self) -> Vec<Value> {
        self.documents.read().values().cloned().collect()
    }

    fn key_of(&self, document: &Value) -> std::result::Result<DocumentKey, ErrorInfo> {
        let object = document
            .as_object()
            .ok_or_else(|| ErrorInfo::new(ErrorInfo::BAD_REQUEST, "document must be a JSON object"))?;

        let id = object
            .get(&self.config.keys.id_key)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ErrorInfo::new(
                    ErrorInfo::BAD_REQUEST,
                    format!("document has no '{}'", self.config.keys.id_key),
                )
            })?;

        let partition_key = match object.get(&self.config.keys.partition_key_key) {
            Some(Value::String(pk)) => pk.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok((partition_key, id.to_string()))
    }

    fn finish<T>(&self, response: CosmosResponse<T>, started: Instant) -> CosmosResponse<T> {
        response
            .with_request_charge(self.config.request_charge)
            .with_execution_time(started.elapsed())
    }

    fn write(&self, document: Value, replace: bool) -> CosmosResponse<Value> {
        let key = match self.key_of(&document) {
            Ok(key) => key,
            Err(info) => return CosmosResponse::failure(info),
        };

        let mut documents = self.documents.write();
        if !replace && documents.contains_key(&key) {
            return CosmosResponse::failure(ErrorInfo::new(
                ErrorInfo::CONFLICT,
                format!("document '{}' already exists in partition '{}'", key.1, key.0),
            ));
        }
        documents.insert(key, document.clone());
        CosmosResponse::success(document)
    }

    fn page(&self, query: &str, continuation: Option<&str>) -> CosmosResponse<QueryPage> {
        if !is_select_all(query) {
            return CosmosResponse::failure(ErrorInfo::new(
                ErrorInfo::BAD_REQUEST,
                format!("unsupported query: {query}"),
            ));
        }

        let offset = match continuation {
            None => 0,
            Some(token) => match token.parse::<usize>() {
                Ok(offset) => offset,
                Err(_) => {
                    return CosmosResponse::failure(ErrorInfo::new(
                        ErrorInfo::BAD_REQUEST,
                        format!("invalid continuation token '{token}'"),
                    ))
                }
            },
        };

        let documents = self.documents.read();
        let page: QueryPage = documents
            .values()
            .skip(offset)
            .take(self.config.page_size)
            .cloned()
            .collect();
        let next = offset + page.len();
        let token = (next < documents.len()).then(|| next.to_string());

        CosmosResponse::success(page).with_continuation_token(token)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            config: InMemoryStoreConfig::default(),
        }
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("documents", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

fn is_select_all(query: &str) -> bool {
    let words: Vec<&str> = query.split_whitespace().collect();
    matches!(words.as_slice(), [select, "*", from, _alias]
        if select.eq_ignore_ascii_case("select") && from.eq_ignore_ascii_case("from"))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, document: Value) -> CosmosResponse<Value> {
        let started = Instant::now();
        self.finish(self.write(document, false), started)
    }

    async fn upsert(&self, document: Value) -> CosmosResponse<Value> {
        let started = Instant::now();
        self.finish(self.write(document, true), started)
    }

    async fn read(&self, id: &str, partition_key: &str) -> CosmosResponse<Value> {
        let started = Instant::now();
        let found = self
            .documents
            .read()
            .get(&(partition_key.to_string(), id.to_string()))
            .cloned();

        let response = match found {
            Some(document) => CosmosResponse::success(document),
            None => CosmosResponse::failure(ErrorInfo::new(
                ErrorInfo::NOT_FOUND,
                format!("document '{id}' not found in partition '{partition_key}'"),
            )),
        };
        self.finish(response, started)
    }

    async fn query(&self, query: &str, continuation: Option<&str>) -> CosmosResponse<QueryPage> {
        let started = Instant::now();
        self.finish(self.page(query, continuation), started)
    }
}
