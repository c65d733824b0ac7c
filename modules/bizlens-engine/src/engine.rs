//! The `InsightEngine` façade: one method per dashboard action.
//!
//! Every operation maps client-level failures into the closed error
//! taxonomy at its boundary; nothing here aborts the process. Contract
//! violations from the completion service are deliberately not errors: the
//! raw payload stays in the session and the typed accessors render empty.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use aoai_client::{CompletionClient, CompletionError, DEFAULT_TEMPERATURE};
use azblob_client::{BlobClient, BlobError};
use azsearch_client::{
    DocumentHit, FieldMap, IndexerAdmin, IndexerStatus, SearchClient, SearchError,
};
use bizlens_common::{
    AnalysisRequest, CombinedInsightResult, Config, DocumentChunk, InsightError, NewsItem,
    PestSwotResult, ProposalCategory,
};
use news_client::{Freshness, MatchMode, NaverClient, NewsApiClient, NewsArticle, NewsError};

use crate::contract;
use crate::insight;
use crate::poller::{self, DocumentIndex, PollOutcome};
use crate::prompt;
use crate::session::SessionState;

const ANALYSIS_MAX_TOKENS: u32 = 800;
const SUMMARY_MAX_TOKENS: u32 = 1100;
const POLL_TOP: u32 = 10;
const PREVIEW_CHAR_LIMIT: usize = 600;

/// Outcome of a document summarization: the generated summary, or a
/// truncated preview of the raw chunk content when the completion service
/// is unconfigured or fails. Partial success is explicit, not silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSummary {
    Generated(String),
    RawPreview(String),
}

pub struct InsightEngine {
    config: Config,
    news_api: Option<NewsApiClient>,
    naver: Option<NaverClient>,
    search: Option<SearchClient>,
    indexer: Option<IndexerAdmin>,
    blob: Option<BlobClient>,
    completion: Option<CompletionClient>,
    session: SessionState,
}

impl InsightEngine {
    /// Build clients for every surface the configuration covers. Missing
    /// settings leave the corresponding client out; the operations that need
    /// it fail lazily with the precise configuration error.
    pub fn new(config: Config) -> Self {
        let news_api = config
            .newsapi()
            .ok()
            .map(|s| NewsApiClient::new(&s.api_key));
        let naver = config
            .naver()
            .ok()
            .map(|s| NaverClient::new(&s.client_id, &s.client_secret));
        let search = config
            .search()
            .ok()
            .map(|s| SearchClient::new(&s.endpoint, &s.api_key, &s.index, &s.api_version));
        let indexer = config
            .indexer()
            .ok()
            .map(|s| IndexerAdmin::new(&s.endpoint, &s.api_key, &s.indexer, &s.api_version));
        let blob = config.blob().ok().and_then(|s| {
            match BlobClient::from_connection_string(&s.connection_string, &s.container) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "Blob storage unavailable");
                    None
                }
            }
        });
        let completion = config.completion().ok().map(|s| {
            CompletionClient::new(&s.endpoint, &s.api_key, &s.deployment, &s.api_version)
        });

        Self {
            config,
            news_api,
            naver,
            search,
            indexer,
            blob,
            completion,
            session: SessionState::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(Config::from_env())
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // --- News ---

    /// Search news evidence. Provider B is preferred when its credential
    /// pair is configured, provider A otherwise. A fresh evidence set
    /// invalidates any previous analyses.
    pub async fn search_news(
        &mut self,
        query: &str,
        count: u32,
        freshness: Freshness,
        match_mode: MatchMode,
    ) -> Result<&[NewsItem], InsightError> {
        self.session.clear_analyses();

        let articles = if let Some(naver) = &self.naver {
            naver.fetch(query, count).await.map_err(news_error)?
        } else if let Some(news_api) = &self.news_api {
            news_api
                .fetch(query, count, freshness, match_mode)
                .await
                .map_err(news_error)?
        } else {
            return Err(InsightError::Config(
                "no news provider configured: set NAVER_CLIENT_ID/NAVER_CLIENT_SECRET or NEWSAPI_KEY"
                    .to_string(),
            ));
        };

        info!(results = articles.len(), "News search complete");
        self.session.news_results = articles.into_iter().map(news_item_from).collect();
        Ok(&self.session.news_results)
    }

    /// Run the news-only PEST/SWOT analysis over the loaded evidence.
    pub async fn generate_pest_swot(
        &mut self,
        request: &AnalysisRequest,
    ) -> Result<PestSwotResult, InsightError> {
        if self.session.news_results.is_empty() {
            return Err(InsightError::Config(
                "no news evidence loaded; run search_news first".to_string(),
            ));
        }
        let messages = prompt::news_analysis_messages(request, &self.session.news_results);
        let completion = self.completion_client()?;
        let raw = completion
            .complete(
                &messages.system,
                &messages.user,
                ANALYSIS_MAX_TOKENS,
                DEFAULT_TEMPERATURE,
            )
            .await
            .map_err(completion_error)?;
        self.session.pest_swot = Some(Value::String(raw));
        Ok(self.pest_swot())
    }

    /// The stored news-analysis payload, parsed through the contract
    /// recovery steps. Idempotent over already-parsed values; malformed
    /// payloads render as the empty default, never an error.
    pub fn pest_swot(&self) -> PestSwotResult {
        parse_stored(self.session.pest_swot.as_ref(), "pest_swot")
    }

    // --- Documents ---

    /// Upload a document and block until the index reflects it (quick poll
    /// path). `NotYetIndexed` is a valid outcome the caller may retry.
    pub async fn upload_document(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<PollOutcome, InsightError> {
        let blob = self.blob.as_ref().ok_or_else(|| {
            InsightError::Config("blob storage is not configured (AZURE_STORAGE_CONN)".to_string())
        })?;
        // the poller right after the upload needs the index, so surface a
        // missing search configuration before any byte goes out
        self.config.search()?;
        let stored_name = blob.upload(file_name, bytes).await.map_err(blob_error)?;
        self.session.last_blob_name = stored_name.clone();

        let search = self.search_client()?;
        let live = LiveIndex {
            search,
            admin: self.indexer.as_ref(),
        };
        let outcome = poller::wait_for_document(&live, &stored_name, POLL_TOP).await;
        self.store_poll_hits(&outcome);
        Ok(outcome)
    }

    /// Forced recovery for a stuck upload: reset the indexer, re-run it,
    /// and poll on the doubled budget.
    pub async fn force_reindex(&mut self) -> Result<PollOutcome, InsightError> {
        if self.session.last_blob_name.is_empty() {
            return Err(InsightError::Config(
                "no uploaded document to re-index; upload a document first".to_string(),
            ));
        }
        self.config.indexer()?;
        let stored_name = self.session.last_blob_name.clone();

        let search = self.search_client()?;
        let live = LiveIndex {
            search,
            admin: self.indexer.as_ref(),
        };
        let outcome = poller::force_reindex_and_wait(&live, &stored_name, POLL_TOP).await;
        self.store_poll_hits(&outcome);
        Ok(outcome)
    }

    /// Keyword search over the document index.
    pub async fn search_documents(
        &mut self,
        query: &str,
        top: u32,
    ) -> Result<&[DocumentChunk], InsightError> {
        let search = self.search_client()?;
        let hits = search
            .search_keyword(query, top)
            .await
            .map_err(search_error)?;
        info!(query, results = hits.len(), "Keyword document search complete");
        self.session.doc_hits = hits.iter().map(chunk_from_hit).collect();
        Ok(&self.session.doc_hits)
    }

    /// Summarize the loaded document chunks. A missing or failing
    /// completion service degrades to a truncated raw-content preview
    /// instead of showing nothing.
    pub async fn summarize_documents(&mut self) -> Result<DocumentSummary, InsightError> {
        if self.session.doc_hits.is_empty() {
            return Err(InsightError::Config(
                "no document chunks loaded; upload or search documents first".to_string(),
            ));
        }
        let messages =
            prompt::document_summary_messages(&self.session.doc_hits, prompt::DOC_CHAR_BUDGET);

        let Some(completion) = &self.completion else {
            return Ok(DocumentSummary::RawPreview(preview(&self.session.doc_hits)));
        };
        match completion
            .complete(
                &messages.system,
                &messages.user,
                SUMMARY_MAX_TOKENS,
                DEFAULT_TEMPERATURE,
            )
            .await
        {
            Ok(text) => Ok(DocumentSummary::Generated(text.trim().to_string())),
            Err(e) => {
                warn!(error = %e, "Summarization failed, falling back to raw preview");
                Ok(DocumentSummary::RawPreview(preview(&self.session.doc_hits)))
            }
        }
    }

    // --- Combined insight ---

    /// Merge the loaded news and document evidence into the combined
    /// insight. Requires both evidence sets.
    pub async fn combined_insight(
        &mut self,
        request: &AnalysisRequest,
    ) -> Result<CombinedInsightResult, InsightError> {
        if self.session.news_results.is_empty() {
            return Err(InsightError::Config(
                "no news evidence loaded; run search_news first".to_string(),
            ));
        }
        if self.session.doc_hits.is_empty() {
            return Err(InsightError::Config(
                "no document chunks loaded; upload or search documents first".to_string(),
            ));
        }
        let messages = prompt::combined_insight_messages(
            &self.session.news_results,
            &self.session.doc_hits,
            request,
        );
        let completion = self.completion_client()?;
        let raw = completion
            .complete(
                &messages.system,
                &messages.user,
                ANALYSIS_MAX_TOKENS,
                DEFAULT_TEMPERATURE,
            )
            .await
            .map_err(completion_error)?;
        self.session.combined = Some(Value::String(raw));
        Ok(self.combined())
    }

    /// The stored combined-insight payload, typed. Same degradation rules
    /// as `pest_swot`.
    pub fn combined(&self) -> CombinedInsightResult {
        parse_stored(self.session.combined.as_ref(), "combined")
    }

    /// The stored combined-insight payload as a raw value, for the views
    /// that scan alternative keys models like to invent.
    pub fn combined_value(&self) -> Value {
        self.session
            .combined
            .as_ref()
            .map(contract::coerce_value)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
    }

    // --- Post-processed views ---

    pub fn strategy_one_liner(&self) -> Option<String> {
        let cleaned = insight::clean_one_liner(&self.pest_swot().one_liner);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    pub fn internal_summary(&self) -> Vec<String> {
        insight::take_clean(&self.combined().internal_summary, insight::QUADRANT_LIMIT)
    }

    pub fn external_summaries(&self) -> Vec<String> {
        insight::external_summaries(&self.combined_value())
    }

    pub fn strengths_weaknesses(&self) -> (Vec<String>, Vec<String>) {
        insight::merged_strengths_weaknesses(&self.combined_value())
    }

    pub fn priority_proposal(&self) -> Option<(ProposalCategory, Vec<String>)> {
        insight::choose_priority_proposal(&self.combined().proposals)
    }

    pub fn execution_kpis(&self) -> Vec<String> {
        insight::take_clean(
            &self.combined().proposals.execution_kpis,
            insight::QUADRANT_LIMIT,
        )
    }

    // --- Maintenance ---

    pub async fn indexer_status(&self) -> Result<IndexerStatus, InsightError> {
        self.config.indexer()?;
        let admin = self.indexer.as_ref().ok_or_else(|| {
            InsightError::Config("indexer administration unavailable".to_string())
        })?;
        admin.status().await.map_err(search_error)
    }

    /// Inspect the index schema and detect its field layout. Best-effort:
    /// failures log and return an empty map.
    pub async fn detect_field_map(&self) -> FieldMap {
        let Some(search) = &self.search else {
            return FieldMap::default();
        };
        match search.index_fields().await {
            Ok(fields) => FieldMap::detect(&fields),
            Err(e) => {
                warn!(error = %e, "Index schema fetch failed");
                FieldMap::default()
            }
        }
    }

    /// Clear the session and every result cache as one operation.
    pub fn reset(&mut self) {
        self.session.reset();
        if let Some(completion) = &self.completion {
            completion.invalidate_cache();
        }
        if let Some(search) = &self.search {
            search.invalidate_cache();
        }
        info!("Session state and caches cleared");
    }

    fn completion_client(&self) -> Result<&CompletionClient, InsightError> {
        self.config.completion()?;
        self.completion.as_ref().ok_or_else(|| {
            InsightError::Config("completion client unavailable".to_string())
        })
    }

    fn search_client(&self) -> Result<&SearchClient, InsightError> {
        self.config.search()?;
        self.search
            .as_ref()
            .ok_or_else(|| InsightError::Config("search index client unavailable".to_string()))
    }

    fn store_poll_hits(&mut self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Indexed(hits) => {
                self.session.doc_hits = hits.iter().map(chunk_from_hit).collect();
            }
            PollOutcome::NotYetIndexed => self.session.doc_hits.clear(),
        }
    }
}

/// Live `DocumentIndex` over the search and indexer clients. The indexer is
/// optional: without one, run/reset triggers are silent no-ops and the
/// poller simply waits out its budget.
struct LiveIndex<'a> {
    search: &'a SearchClient,
    admin: Option<&'a IndexerAdmin>,
}

#[async_trait]
impl DocumentIndex for LiveIndex<'_> {
    async fn search_stored_name(
        &self,
        name: &str,
        top: u32,
    ) -> Result<Vec<DocumentHit>, InsightError> {
        self.search
            .search_stored_name(name, top)
            .await
            .map_err(search_error)
    }

    async fn run_indexer(&self) -> Result<(), InsightError> {
        match self.admin {
            Some(admin) => admin.run().await.map_err(search_error),
            None => {
                debug!("No indexer configured, skipping run trigger");
                Ok(())
            }
        }
    }

    async fn reset_indexer(&self) -> Result<(), InsightError> {
        match self.admin {
            Some(admin) => admin.reset().await.map_err(search_error),
            None => Ok(()),
        }
    }

    fn invalidate_cache(&self) {
        self.search.invalidate_cache();
    }
}

fn parse_stored<T: Default + DeserializeOwned>(stored: Option<&Value>, label: &str) -> T {
    let Some(raw) = stored else {
        return T::default();
    };
    let value = contract::coerce_value(raw);
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(payload = label, error = %e, "Stored payload violates the contract, rendering empty");
            T::default()
        }
    }
}

fn preview(chunks: &[DocumentChunk]) -> String {
    let merged: String = chunks.iter().map(|c| c.content.as_str()).collect();
    let truncated: String = merged.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if merged.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{truncated}…")
    } else {
        truncated
    }
}

fn chunk_from_hit(hit: &DocumentHit) -> DocumentChunk {
    DocumentChunk {
        title: hit.title.clone(),
        content: hit.content.clone(),
        source: hit.source.clone(),
    }
}

fn news_item_from(article: NewsArticle) -> NewsItem {
    NewsItem {
        title: article.title,
        snippet: article.snippet,
        url: article.url,
        published_at: article.published_at,
        provider: article.provider,
    }
}

fn news_error(err: NewsError) -> InsightError {
    match err {
        NewsError::Api { status, message } => InsightError::retrieval("news", Some(status), message),
        NewsError::EmptyQuery => InsightError::Config("news search query is empty".to_string()),
        other => InsightError::retrieval("news", None, other.to_string()),
    }
}

fn search_error(err: SearchError) -> InsightError {
    match err {
        SearchError::Api { status, message } => {
            InsightError::retrieval("search", Some(status), message)
        }
        other => InsightError::retrieval("search", None, other.to_string()),
    }
}

fn blob_error(err: BlobError) -> InsightError {
    match err {
        BlobError::Api { status, message } => InsightError::retrieval("blob", Some(status), message),
        BlobError::ConnectionString(message) => InsightError::Config(message),
        other => InsightError::retrieval("blob", None, other.to_string()),
    }
}

fn completion_error(err: CompletionError) -> InsightError {
    match err {
        CompletionError::Api { status, message } => {
            InsightError::retrieval("completion", Some(status), message)
        }
        CompletionError::Empty => {
            InsightError::Contract("completion response contained no choices".to_string())
        }
        other => InsightError::retrieval("completion", None, other.to_string()),
    }
}
