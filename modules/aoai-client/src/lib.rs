pub mod error;
pub mod types;

pub use error::{CompletionError, Result};
pub use types::{ChatMessage, ChatRequest, ChatResponse};

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use tracing::debug;

/// Deterministic default for reproducible structured output.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Client for one chat-completion deployment.
///
/// Responses are cached by the exact message content: identical prompts are
/// expected to yield stable-enough output for the dashboard, and repeated
/// renders must not re-bill the deployment. Cache lifetime is the process;
/// `invalidate_cache` is the explicit reset point.
pub struct CompletionClient {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    http: reqwest::Client,
    cache: RwLock<HashMap<String, String>>,
}

impl CompletionClient {
    pub fn new(endpoint: &str, api_key: &str, deployment: &str, api_version: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
            api_version: api_version.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Run one system+user chat completion and return the raw text of the
    /// first choice.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let cache_key = format!("{system}\u{1}{user}\u{1}{max_tokens}\u{1}{temperature}");
        if let Some(text) = self
            .cache
            .read()
            .expect("completion cache lock poisoned")
            .get(&cache_key)
        {
            debug!(deployment = %self.deployment, "Completion cache hit");
            return Ok(text.clone());
        }

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );
        let request = ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            max_tokens,
        };

        debug!(deployment = %self.deployment, max_tokens, temperature, "Chat completion request");

        let resp = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let text = parsed.text().ok_or(CompletionError::Empty)?;

        self.cache
            .write()
            .expect("completion cache lock poisoned")
            .insert(cache_key, text.clone());
        Ok(text)
    }

    pub fn invalidate_cache(&self) {
        self.cache
            .write()
            .expect("completion cache lock poisoned")
            .clear();
    }
}
