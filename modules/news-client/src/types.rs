use serde::Deserialize;

/// A news article normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsArticle {
    pub title: String,
    pub snippet: String,
    pub url: String,
    pub published_at: String,
    pub provider: String,
}

/// Lookback window for provider A's from-date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Day,
    Week,
    Month,
}

impl Freshness {
    pub fn lookback_days(&self) -> i64 {
        match self {
            Freshness::Day => 1,
            Freshness::Week => 7,
            Freshness::Month => 30,
        }
    }
}

/// How multi-term queries are combined. `All` rewrites a whitespace-split
/// query into a conjunctive `a AND b AND c` string; only provider A honors
/// the distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Any,
    All,
}

// --- NewsAPI wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiResponse {
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewsApiSource {
    pub name: Option<String>,
}

impl NewsApiArticle {
    pub(crate) fn into_article(self) -> NewsArticle {
        let snippet = self
            .description
            .filter(|d| !d.is_empty())
            .or(self.content)
            .unwrap_or_default();
        NewsArticle {
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "(제목 없음)".to_string()),
            snippet,
            url: self.url.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
            provider: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "NewsAPI".to_string()),
        }
    }
}

// --- Naver wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct NaverResponse {
    #[serde(default)]
    pub items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NaverItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
}

impl NaverItem {
    pub(crate) fn into_article(self) -> NewsArticle {
        let title = strip_bold_markup(self.title.as_deref().unwrap_or_default());
        NewsArticle {
            title: if title.is_empty() {
                "(제목 없음)".to_string()
            } else {
                title
            },
            snippet: strip_bold_markup(self.description.as_deref().unwrap_or_default()),
            url: self.link.unwrap_or_default(),
            published_at: self.pub_date.unwrap_or_default(),
            provider: "Naver News".to_string(),
        }
    }
}

/// Naver embeds `<b>` highlight markup in title/description text.
pub(crate) fn strip_bold_markup(text: &str) -> String {
    text.replace("<b>", "").replace("</b>", "")
}
