pub mod error;
pub mod types;

pub use error::{NewsError, Result};
pub use types::{Freshness, MatchMode, NewsArticle};

use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;
use tracing::info;

use types::{NaverResponse, NewsApiResponse};

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const NAVER_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";

/// Provider A: generic article search with date-window and field filters.
pub struct NewsApiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: default_http_client(),
            base_url: NEWSAPI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Fetch Korean-language articles matching `query` within the freshness
    /// window, newest first, truncated to `count`.
    pub async fn fetch(
        &self,
        query: &str,
        count: u32,
        freshness: Freshness,
        match_mode: MatchMode,
    ) -> Result<Vec<NewsArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsError::EmptyQuery);
        }
        let query = match match_mode {
            MatchMode::Any => query.to_string(),
            MatchMode::All => conjunctive_query(query),
        };

        let from_date = (Utc::now() - Duration::days(freshness.lookback_days()))
            .format("%Y-%m-%d")
            .to_string();
        let page_size = count.to_string();

        info!(query = %query, from = %from_date, count, "NewsAPI article search");

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query.as_str()),
                ("from", from_date.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("language", "ko"),
                ("apiKey", self.api_key.as_str()),
                ("searchIn", "title,description,content"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NewsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: NewsApiResponse = resp.json().await?;
        let mut articles: Vec<NewsArticle> = body
            .articles
            .into_iter()
            .map(|a| a.into_article())
            .collect();
        articles.truncate(count as usize);
        Ok(articles)
    }
}

/// Provider B: regional news search with header credentials. Date-sorted;
/// the provider decorates matches with `<b>` markup which is stripped here.
pub struct NaverClient {
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    base_url: String,
}

impl NaverClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            http: default_http_client(),
            base_url: NAVER_NEWS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub async fn fetch(&self, query: &str, count: u32) -> Result<Vec<NewsArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NewsError::EmptyQuery);
        }

        info!(query = %query, count, "Naver news search");

        let display = count.to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[("query", query), ("display", display.as_str()), ("sort", "date")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NewsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: NaverResponse = resp.json().await?;
        let mut articles: Vec<NewsArticle> =
            body.items.into_iter().map(|i| i.into_article()).collect();
        articles.truncate(count as usize);
        Ok(articles)
    }
}

/// Rewrite a whitespace-delimited query into a conjunctive search string.
fn conjunctive_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" AND ")
}

fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(StdDuration::from_secs(20))
        .build()
        .expect("Failed to build HTTP client")
}
