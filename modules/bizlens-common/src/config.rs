use std::env;

use crate::error::InsightError;

/// Application configuration loaded from environment variables.
///
/// Every external surface is optional on its own and required in
/// combination: nothing fails at load time, and each feature checks the
/// values it needs through the settings accessors below before any network
/// call is made.
#[derive(Debug, Clone, Default)]
pub struct Config {
    // News providers
    pub newsapi_key: Option<String>,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,

    // Chat completion
    pub aoai_endpoint: Option<String>,
    pub aoai_key: Option<String>,
    pub aoai_api_version: String,
    pub aoai_deployment: Option<String>,

    // Blob storage
    pub storage_conn: Option<String>,
    pub blob_container: String,

    // Search index
    pub search_endpoint: Option<String>,
    pub search_key: Option<String>,
    pub search_index: Option<String>,
    pub search_indexer: Option<String>,
    pub search_api_version: String,
}

impl Config {
    /// Load configuration from environment variables. Missing values stay
    /// `None`; endpoints are trimmed of trailing slashes.
    pub fn from_env() -> Self {
        Self {
            newsapi_key: optional_env("NEWSAPI_KEY"),
            naver_client_id: optional_env("NAVER_CLIENT_ID"),
            naver_client_secret: optional_env("NAVER_CLIENT_SECRET"),
            aoai_endpoint: optional_env("AZURE_OPENAI_ENDPOINT").map(strip_trailing_slash),
            aoai_key: optional_env("AZURE_OPENAI_API_KEY"),
            aoai_api_version: env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| "2024-08-01-preview".to_string()),
            aoai_deployment: optional_env("AZURE_OPENAI_DEPLOYMENT"),
            storage_conn: optional_env("AZURE_STORAGE_CONN"),
            blob_container: env::var("AZURE_BLOB_CONTAINER").unwrap_or_else(|_| "docs".to_string()),
            search_endpoint: optional_env("AZURE_SEARCH_ENDPOINT").map(strip_trailing_slash),
            search_key: optional_env("AZURE_SEARCH_KEY"),
            search_index: optional_env("AZURE_SEARCH_INDEX"),
            search_indexer: optional_env("AZURE_SEARCH_INDEXER"),
            search_api_version: env::var("AZURE_SEARCH_API_VERSION")
                .unwrap_or_else(|_| "2023-11-01".to_string()),
        }
    }

    pub fn newsapi(&self) -> Result<NewsApiSettings, InsightError> {
        Ok(NewsApiSettings {
            api_key: require(&self.newsapi_key, "NEWSAPI_KEY")?,
        })
    }

    pub fn naver(&self) -> Result<NaverSettings, InsightError> {
        Ok(NaverSettings {
            client_id: require(&self.naver_client_id, "NAVER_CLIENT_ID")?,
            client_secret: require(&self.naver_client_secret, "NAVER_CLIENT_SECRET")?,
        })
    }

    pub fn has_naver(&self) -> bool {
        self.naver_client_id.is_some() && self.naver_client_secret.is_some()
    }

    pub fn has_newsapi(&self) -> bool {
        self.newsapi_key.is_some()
    }

    pub fn completion(&self) -> Result<CompletionSettings, InsightError> {
        Ok(CompletionSettings {
            endpoint: require(&self.aoai_endpoint, "AZURE_OPENAI_ENDPOINT")?,
            api_key: require(&self.aoai_key, "AZURE_OPENAI_API_KEY")?,
            api_version: self.aoai_api_version.clone(),
            deployment: require(&self.aoai_deployment, "AZURE_OPENAI_DEPLOYMENT")?,
        })
    }

    pub fn has_completion(&self) -> bool {
        self.aoai_endpoint.is_some() && self.aoai_key.is_some() && self.aoai_deployment.is_some()
    }

    pub fn search(&self) -> Result<SearchSettings, InsightError> {
        Ok(SearchSettings {
            endpoint: require(&self.search_endpoint, "AZURE_SEARCH_ENDPOINT")?,
            api_key: require(&self.search_key, "AZURE_SEARCH_KEY")?,
            index: require(&self.search_index, "AZURE_SEARCH_INDEX")?,
            api_version: self.search_api_version.clone(),
        })
    }

    pub fn indexer(&self) -> Result<IndexerSettings, InsightError> {
        Ok(IndexerSettings {
            endpoint: require(&self.search_endpoint, "AZURE_SEARCH_ENDPOINT")?,
            api_key: require(&self.search_key, "AZURE_SEARCH_KEY")?,
            indexer: require(&self.search_indexer, "AZURE_SEARCH_INDEXER")?,
            api_version: self.search_api_version.clone(),
        })
    }

    pub fn blob(&self) -> Result<BlobSettings, InsightError> {
        Ok(BlobSettings {
            connection_string: require(&self.storage_conn, "AZURE_STORAGE_CONN")?,
            container: self.blob_container.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewsApiSettings {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct NaverSettings {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub endpoint: String,
    pub api_key: String,
    pub index: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub endpoint: String,
    pub api_key: String,
    pub indexer: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct BlobSettings {
    pub connection_string: String,
    pub container: String,
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn strip_trailing_slash(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

fn require(value: &Option<String>, var: &str) -> Result<String, InsightError> {
    value
        .clone()
        .ok_or_else(|| InsightError::Config(format!("{var} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_completion_settings_is_config_error() {
        let config = Config::default();
        let err = config.completion().unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
        assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT"));
    }

    #[test]
    fn completion_settings_resolve_when_present() {
        let config = Config {
            aoai_endpoint: Some("https://example.openai.azure.com".into()),
            aoai_key: Some("key".into()),
            aoai_api_version: "2024-08-01-preview".into(),
            aoai_deployment: Some("gpt-4o".into()),
            ..Config::default()
        };
        let settings = config.completion().unwrap();
        assert_eq!(settings.deployment, "gpt-4o");
        assert_eq!(settings.api_version, "2024-08-01-preview");
    }

    #[test]
    fn naver_requires_both_credentials() {
        let config = Config {
            naver_client_id: Some("id".into()),
            ..Config::default()
        };
        assert!(!config.has_naver());
        assert!(config.naver().is_err());
    }
}
