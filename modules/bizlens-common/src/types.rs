use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Evidence items ---

/// One news article as returned by a source connector.
/// Identity is positional: `[N3]` in a prompt means the third item of the
/// list that was rendered into that prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewsItem {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Raw provider date string (formats differ between providers).
    pub published_at: String,
    pub provider: String,
}

/// One retrieved fragment of an uploaded document.
/// `content` may be an empty string, never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentChunk {
    pub title: String,
    pub content: String,
    pub source: String,
}

// --- Analysis context ---

/// The user-selected context under which any prompt is built.
/// An empty `company` signals "no specific company" mode, which switches the
/// news prompt into first-person framing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub company: String,
    pub technologies: Vec<String>,
    pub domains: Vec<String>,
}

impl AnalysisRequest {
    /// Compose the suggested news query: company + technologies + domains,
    /// space-joined, empty parts dropped.
    pub fn suggested_query(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.company.is_empty() {
            parts.push(&self.company);
        }
        parts.extend(self.technologies.iter().map(String::as_str));
        parts.extend(self.domains.iter().map(String::as_str));
        parts.join(" ")
    }
}

// --- LLM contract shapes ---
//
// These mirror the JSON schemas declared in the prompts. Every field defaults
// so that a partially-conforming model response still deserializes; the
// contract parser handles the noisy-text layer above this.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PestQuadrants {
    #[serde(default, rename = "P")]
    pub political: Vec<Value>,
    #[serde(default, rename = "E")]
    pub economic: Vec<Value>,
    #[serde(default, rename = "S")]
    pub social: Vec<Value>,
    #[serde(default, rename = "T")]
    pub technological: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwotQuadrants {
    #[serde(default, rename = "S")]
    pub strengths: Vec<Value>,
    #[serde(default, rename = "W")]
    pub weaknesses: Vec<Value>,
    #[serde(default, rename = "O")]
    pub opportunities: Vec<Value>,
    #[serde(default, rename = "T")]
    pub threats: Vec<Value>,
}

/// The news-only analysis contract: PEST and SWOT quadrants plus a one-line
/// response strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PestSwotResult {
    #[serde(default, rename = "PEST")]
    pub pest: PestQuadrants,
    #[serde(default, rename = "SWOT")]
    pub swot: SwotQuadrants,
    #[serde(default)]
    pub one_liner: String,
}

/// Proposal lists inside the combined-insight contract. Entries are kept as
/// raw values: models sometimes return objects instead of plain strings, and
/// the post-processor owns the coercion rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Proposals {
    #[serde(default)]
    pub benchmarking: Vec<Value>,
    #[serde(default)]
    pub cooperation: Vec<Value>,
    #[serde(default)]
    pub differentiation: Vec<Value>,
    #[serde(default)]
    pub execution_kpis: Vec<Value>,
}

/// The combined news + internal-document insight contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CombinedInsightResult {
    #[serde(default)]
    pub internal_summary: Vec<Value>,
    #[serde(default)]
    pub strengths: Vec<Value>,
    #[serde(default)]
    pub weaknesses: Vec<Value>,
    #[serde(default)]
    pub external_insights: Vec<Value>,
    #[serde(default)]
    pub proposals: Proposals,
}

/// The three competing proposal categories. Tie-break priority when scores
/// are equal: differentiation > cooperation > benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalCategory {
    Benchmarking,
    Cooperation,
    Differentiation,
}

impl ProposalCategory {
    pub fn key(&self) -> &'static str {
        match self {
            ProposalCategory::Benchmarking => "benchmarking",
            ProposalCategory::Cooperation => "cooperation",
            ProposalCategory::Differentiation => "differentiation",
        }
    }

    /// Korean display label.
    pub fn label(&self) -> &'static str {
        match self {
            ProposalCategory::Benchmarking => "벤치마킹",
            ProposalCategory::Cooperation => "협력안",
            ProposalCategory::Differentiation => "차별화",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_query_drops_empty_company() {
        let req = AnalysisRequest {
            company: String::new(),
            technologies: vec!["AI".into(), "RAG".into()],
            domains: vec!["금융".into()],
        };
        assert_eq!(req.suggested_query(), "AI RAG 금융");
    }

    #[test]
    fn suggested_query_leads_with_company() {
        let req = AnalysisRequest {
            company: "삼성SDS".into(),
            technologies: vec!["AI".into()],
            domains: vec![],
        };
        assert_eq!(req.suggested_query(), "삼성SDS AI");
    }

    #[test]
    fn pest_swot_tolerates_missing_keys() {
        let parsed: PestSwotResult =
            serde_json::from_str(r#"{"PEST": {"P": ["문장."]}}"#).unwrap();
        assert_eq!(parsed.pest.political.len(), 1);
        assert!(parsed.swot.strengths.is_empty());
        assert!(parsed.one_liner.is_empty());
    }

    #[test]
    fn combined_tolerates_object_entries() {
        let parsed: CombinedInsightResult = serde_json::from_str(
            r#"{"strengths": [{"text": "강점."}], "proposals": {"cooperation": ["협력."]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.strengths.len(), 1);
        assert_eq!(parsed.proposals.cooperation.len(), 1);
        assert!(parsed.proposals.benchmarking.is_empty());
    }
}
