pub mod error;
pub mod types;

pub use error::{Result, SearchError};
pub use types::{DocumentHit, FieldMap, IndexField, IndexerRunResult, IndexerStatus};

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use types::{IndexDefinition, SearchResponse};

/// Query client for one search index.
///
/// Results are cached per (search phrase, top) as an optimization; the
/// eventual-consistency poller invalidates the cache before every attempt,
/// since its whole purpose is to observe an index-state change.
pub struct SearchClient {
    endpoint: String,
    api_key: String,
    index: String,
    api_version: String,
    http: reqwest::Client,
    cache: RwLock<HashMap<String, Vec<DocumentHit>>>,
}

impl SearchClient {
    pub fn new(endpoint: &str, api_key: &str, index: &str, api_version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            index: index.to_string(),
            api_version: api_version.to_string(),
            http: default_http_client(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Run one search body against the index and decode the `value` array
    /// through the field-alias map. Empty result sets are a valid success.
    pub async fn search(&self, phrase: &str, top: u32) -> Result<Vec<DocumentHit>> {
        let cache_key = format!("{phrase}\u{1}{top}");
        if let Some(hits) = self
            .cache
            .read()
            .expect("search cache lock poisoned")
            .get(&cache_key)
        {
            debug!(phrase, top, "Search cache hit");
            return Ok(hits.clone());
        }

        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index, self.api_version
        );
        let body = json!({ "search": phrase, "top": top });

        debug!(phrase, top, "Search index query");

        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse = resp.json().await?;
        let hits: Vec<DocumentHit> = parsed
            .value
            .iter()
            .filter_map(DocumentHit::from_value)
            .collect();

        self.cache
            .write()
            .expect("search cache lock poisoned")
            .insert(cache_key, hits.clone());
        Ok(hits)
    }

    /// Keyword search: plain query first, quoted-phrase fallback when the
    /// plain form matches nothing.
    pub async fn search_keyword(&self, query: &str, top: u32) -> Result<Vec<DocumentHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.search(query, top).await?;
        if !hits.is_empty() {
            return Ok(hits);
        }
        self.search(&quoted(query), top).await
    }

    /// Exact-phrase search for a stored blob name candidate.
    pub async fn search_stored_name(&self, name: &str, top: u32) -> Result<Vec<DocumentHit>> {
        self.search(&quoted(name), top).await
    }

    /// Drop all cached query results so the next search observes the live
    /// index state.
    pub fn invalidate_cache(&self) {
        self.cache
            .write()
            .expect("search cache lock poisoned")
            .clear();
    }

    /// Fetch the index definition for field-map detection. Callers treat
    /// failure as non-fatal (an empty field list).
    pub async fn index_fields(&self) -> Result<Vec<IndexField>> {
        let url = format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, self.index, self.api_version
        );
        let resp = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let definition: IndexDefinition = resp.json().await?;
        Ok(definition.fields)
    }
}

/// Administrative client for the indexer feeding the search index:
/// status inspection plus run and reset triggers for the consistency poller.
pub struct IndexerAdmin {
    endpoint: String,
    api_key: String,
    indexer: String,
    api_version: String,
    http: reqwest::Client,
}

impl IndexerAdmin {
    pub fn new(endpoint: &str, api_key: &str, indexer: &str, api_version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            indexer: indexer.to_string(),
            api_version: api_version.to_string(),
            http: default_http_client(),
        }
    }

    pub async fn status(&self) -> Result<IndexerStatus> {
        let url = format!(
            "{}/indexers/{}/status?api-version={}",
            self.endpoint, self.indexer, self.api_version
        );
        let resp = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Trigger an indexer run. A 409 means a run is already in progress,
    /// which serves the same purpose; logged and treated as success.
    pub async fn run(&self) -> Result<()> {
        let status = self.post_action("run").await?;
        match status {
            202 | 204 => {
                info!(indexer = %self.indexer, "Indexer run triggered");
                Ok(())
            }
            409 => {
                warn!(indexer = %self.indexer, "Indexer already running (409)");
                Ok(())
            }
            other => Err(SearchError::Api {
                status: other,
                message: "unexpected indexer run response".to_string(),
            }),
        }
    }

    /// Reset the indexer's change tracking so the next run re-reads the
    /// whole data source.
    pub async fn reset(&self) -> Result<()> {
        let status = self.post_action("reset").await?;
        match status {
            202 | 204 => {
                info!(indexer = %self.indexer, "Indexer reset");
                Ok(())
            }
            other => Err(SearchError::Api {
                status: other,
                message: "unexpected indexer reset response".to_string(),
            }),
        }
    }

    async fn post_action(&self, action: &str) -> Result<u16> {
        let url = format!(
            "{}/indexers/{}/{}?api-version={}",
            self.endpoint, self.indexer, action, self.api_version
        );
        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }
}

fn quoted(phrase: &str) -> String {
    format!("\"{phrase}\"")
}

fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .expect("Failed to build HTTP client")
}
