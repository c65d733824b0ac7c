use thiserror::Error;

/// The closed error taxonomy every user-facing operation reports through.
///
/// Client crates keep their own transport-level error enums; the engine maps
/// them into these four kinds at the operation boundary. Indexing lag is an
/// expected transient state, carried separately from retrieval failures so
/// callers can render "not yet available, try again" instead of an error.
#[derive(Debug, Error)]
pub enum InsightError {
    /// A required credential or endpoint is unset. Detected before any
    /// network call; not retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx or transport failure from an external provider.
    #[error("Retrieval error from {provider}{suffix}: {message}", suffix = status_suffix(.status))]
    Retrieval {
        provider: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The completion response did not yield the expected JSON shape.
    /// Downstream rendering falls back to a placeholder; the raw text stays
    /// available for inspection.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// The uploaded document is not visible in the search index yet.
    #[error("Not yet indexed: {0}")]
    IndexingLag(String),
}

impl InsightError {
    pub fn retrieval(
        provider: &'static str,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        InsightError::Retrieval {
            provider,
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_display_includes_status_when_present() {
        let err = InsightError::retrieval("search", Some(403), "forbidden");
        assert_eq!(
            err.to_string(),
            "Retrieval error from search (status 403): forbidden"
        );

        let err = InsightError::retrieval("news", None, "timed out");
        assert_eq!(err.to_string(), "Retrieval error from news: timed out");
    }
}
