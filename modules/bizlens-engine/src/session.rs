//! Per-session working state.
//!
//! Originally ambient UI state; modelled here as an explicit object owned by
//! the engine. Analysis payloads are stored exactly as the completion
//! service returned them (a JSON string value) and parsed on read, so a
//! malformed response never blocks the session from being inspected.

use serde_json::Value;

use bizlens_common::{DocumentChunk, NewsItem};

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// News evidence from the most recent search.
    pub news_results: Vec<NewsItem>,
    /// Document chunks from the most recent upload-poll or keyword search.
    pub doc_hits: Vec<DocumentChunk>,
    /// Stored blob name of the most recent upload; the poller's target.
    pub last_blob_name: String,
    /// Raw news-analysis payload.
    pub pest_swot: Option<Value>,
    /// Raw combined-insight payload.
    pub combined: Option<Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop analysis payloads while keeping retrieved evidence. Used when a
    /// new news search supersedes previous analyses.
    pub fn clear_analyses(&mut self) {
        self.pest_swot = None;
        self.combined = None;
    }

    /// Clear everything as one atomic operation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reset_clears_all_keys_at_once() {
        let mut session = SessionState {
            news_results: vec![NewsItem {
                title: "t".into(),
                snippet: String::new(),
                url: String::new(),
                published_at: String::new(),
                provider: String::new(),
            }],
            doc_hits: Vec::new(),
            last_blob_name: "abc_doc.pdf".into(),
            pest_swot: Some(json!({})),
            combined: Some(json!({})),
        };
        session.reset();
        assert!(session.news_results.is_empty());
        assert!(session.last_blob_name.is_empty());
        assert!(session.pest_swot.is_none());
        assert!(session.combined.is_none());
    }

    #[test]
    fn clearing_analyses_keeps_evidence() {
        let mut session = SessionState::new();
        session.last_blob_name = "abc_doc.pdf".into();
        session.pest_swot = Some(json!({}));
        session.clear_analyses();
        assert!(session.pest_swot.is_none());
        assert_eq!(session.last_blob_name, "abc_doc.pdf");
    }
}
