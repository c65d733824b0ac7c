use serde::Deserialize;
use serde_json::Value;

/// One hit from the search index, with heterogeneous provider fields
/// resolved through ordered alias lists. Index schemas differ in what they
/// call the content and storage-name fields; the first alias present wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHit {
    pub title: String,
    pub content: String,
    pub source: String,
    /// The storage-name field the poller matches candidates against. Falls
    /// back to the title when the index carries no storage name.
    pub storage_name: String,
}

const CONTENT_FIELDS: &[&str] = &[
    "merged_content",
    "content",
    "text",
    "page_content",
    "chunk",
    "document",
    "body",
];
const TITLE_FIELDS: &[&str] = &[
    "title",
    "metadata_storage_name",
    "file_name",
    "name",
    "filename",
    "doc_title",
];
const STORAGE_NAME_FIELDS: &[&str] = &[
    "metadata_storage_name",
    "file_name",
    "filename",
    "blob_name",
    "name",
];
const SOURCE_FIELDS: &[&str] = &[
    "url",
    "metadata_storage_path",
    "storage_path",
    "path",
    "source_url",
    "link",
    "source",
];

fn first_string(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| value.get(*f))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}

impl DocumentHit {
    /// Decode one raw `value` entry. Non-object entries are skipped by the
    /// caller; an object with no recognizable fields still yields a hit with
    /// placeholder title and empty content.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let title = first_string(value, TITLE_FIELDS).unwrap_or_else(|| "(제목 없음)".to_string());
        let storage_name =
            first_string(value, STORAGE_NAME_FIELDS).unwrap_or_else(|| title.clone());
        Some(Self {
            content: first_string(value, CONTENT_FIELDS).unwrap_or_default(),
            source: first_string(value, SOURCE_FIELDS).unwrap_or_default(),
            title,
            storage_name,
        })
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub value: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexDefinition {
    #[serde(default)]
    pub fields: Vec<IndexField>,
}

/// One field of the index definition, used for field-map detection.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexField {
    pub name: String,
    #[serde(default)]
    pub filterable: bool,
}

/// Detected mapping from logical attributes to this index's field names.
/// Detection is best-effort; a missing attribute stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    pub content: Option<String>,
    pub title: Option<String>,
    pub storage_name: Option<String>,
    pub source: Option<String>,
    pub storage_name_filterable: bool,
}

impl FieldMap {
    pub fn detect(fields: &[IndexField]) -> Self {
        let pick = |aliases: &[&str]| {
            aliases
                .iter()
                .find(|a| fields.iter().any(|f| f.name == **a))
                .map(|a| a.to_string())
        };
        let storage_name = pick(STORAGE_NAME_FIELDS);
        let storage_name_filterable = storage_name
            .as_deref()
            .map(|name| {
                fields
                    .iter()
                    .any(|f| f.name == name && f.filterable)
            })
            .unwrap_or(false);
        Self {
            content: pick(CONTENT_FIELDS),
            title: pick(TITLE_FIELDS),
            source: pick(SOURCE_FIELDS),
            storage_name,
            storage_name_filterable,
        }
    }
}

/// Indexer execution status, decoded loosely: only the fields the dashboard
/// surfaces are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexerStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "lastResult")]
    pub last_result: Option<IndexerRunResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexerRunResult {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_resolves_merged_content_before_content() {
        let raw = json!({
            "merged_content": "병합 본문",
            "content": "본문",
            "title": "제안서.pdf",
            "metadata_storage_name": "abc_제안서.pdf",
            "metadata_storage_path": "https://blob/docs/abc_제안서.pdf"
        });
        let hit = DocumentHit::from_value(&raw).unwrap();
        assert_eq!(hit.content, "병합 본문");
        assert_eq!(hit.title, "제안서.pdf");
        assert_eq!(hit.storage_name, "abc_제안서.pdf");
        assert_eq!(hit.source, "https://blob/docs/abc_제안서.pdf");
    }

    #[test]
    fn hit_without_storage_name_falls_back_to_title() {
        let raw = json!({"title": "문서", "text": "조각"});
        let hit = DocumentHit::from_value(&raw).unwrap();
        assert_eq!(hit.storage_name, "문서");
        assert_eq!(hit.content, "조각");
    }

    #[test]
    fn non_object_entries_are_skipped() {
        assert!(DocumentHit::from_value(&json!("stray string")).is_none());
        assert!(DocumentHit::from_value(&json!(42)).is_none());
    }

    #[test]
    fn empty_object_gets_placeholder_title() {
        let hit = DocumentHit::from_value(&json!({})).unwrap();
        assert_eq!(hit.title, "(제목 없음)");
        assert_eq!(hit.content, "");
    }

    #[test]
    fn field_map_detection_prefers_first_alias() {
        let fields = vec![
            IndexField {
                name: "content".into(),
                filterable: false,
            },
            IndexField {
                name: "metadata_storage_name".into(),
                filterable: true,
            },
            IndexField {
                name: "title".into(),
                filterable: false,
            },
        ];
        let map = FieldMap::detect(&fields);
        assert_eq!(map.content.as_deref(), Some("content"));
        assert_eq!(map.storage_name.as_deref(), Some("metadata_storage_name"));
        assert!(map.storage_name_filterable);
        assert_eq!(map.source, None);
    }
}
