//! Response contract parser.
//!
//! The completion service is instructed to emit a single JSON object and
//! nothing else, but in practice models wrap output in code fences or leave
//! trailing commas and stray prose around it. A malformed response is an
//! expected condition: every recovery step below is best-effort and the
//! caller renders a placeholder when none of them parses.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static WHOLE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)^```(?:json)?\s*(.*?)\s*```$").unwrap());
static JSON_FENCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)```json\s*(.*?)```").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Drop commas that appear directly before a closing brace or bracket.
pub fn repair_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Extract the JSON payload from a noisy completion response.
///
/// Recovery order, first success wins:
/// 1. unwrap the whole text when it is a single fenced block,
/// 2. the substring from the first `{` to the last `}` with comma repair,
/// 3. each ```json fence anywhere in the text with comma repair,
/// 4. the whole text with comma repair.
pub fn extract_json_str(text: &str) -> Option<String> {
    let mut s = text.trim().to_string();
    if let Some(caps) = WHOLE_FENCE.captures(&s) {
        s = caps.get(1)?.as_str().trim().to_string();
    }

    if let (Some(start), Some(end)) = (s.find('{'), s.rfind('}')) {
        if start < end {
            let candidate = repair_trailing_commas(s[start..=end].trim());
            if serde_json::from_str::<Value>(&candidate).is_ok() {
                return Some(candidate);
            }
        }
    }

    for caps in JSON_FENCES.captures_iter(&s) {
        if let Some(block) = caps.get(1) {
            let candidate = repair_trailing_commas(block.as_str().trim());
            if serde_json::from_str::<Value>(&candidate).is_ok() {
                return Some(candidate);
            }
        }
    }

    let candidate = repair_trailing_commas(&s);
    serde_json::from_str::<Value>(&candidate)
        .ok()
        .map(|_| candidate)
}

/// Parse a noisy response into a JSON value, `None` when nothing parses.
pub fn parse_loose(text: &str) -> Option<Value> {
    let candidate = extract_json_str(text)?;
    serde_json::from_str(&candidate).ok()
}

/// Coerce a stored session value into a structured one.
///
/// Idempotent: objects and arrays pass through unchanged; strings go through
/// the loose parser; anything else (or an unparsable string) becomes the
/// empty object so rendering never breaks.
pub fn coerce_value(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => value.clone(),
        Value::String(s) => parse_loose(s)
            .filter(|v| v.is_object() || v.is_array())
            .unwrap_or_else(empty_object),
        _ => empty_object(),
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_single_fenced_block() {
        let text = "```json\n{\"PEST\": {\"P\": [\"문장.\"]}}\n```";
        let parsed = parse_loose(text).unwrap();
        assert_eq!(parsed["PEST"]["P"][0], "문장.");
    }

    #[test]
    fn unwraps_untagged_fence() {
        let text = "```\n{\"ok\": true}\n```";
        assert_eq!(parse_loose(text).unwrap()["ok"], json!(true));
    }

    #[test]
    fn recovers_object_with_trailing_comma_in_fence() {
        let text = "```json\n{\"SWOT\": {\"S\": [\"강점.\"],}}\n```";
        let parsed = parse_loose(text).unwrap();
        assert_eq!(parsed["SWOT"]["S"][0], "강점.");
    }

    #[test]
    fn takes_brace_substring_despite_surrounding_prose() {
        let text = "다음은 분석 결과입니다:\n{\"one_liner\": \"전략.\"}\n검토 부탁드립니다.";
        let parsed = parse_loose(text).unwrap();
        assert_eq!(parsed["one_liner"], "전략.");
    }

    #[test]
    fn scans_later_fences_when_first_braces_fail() {
        let text = "설명 { 이건 JSON 아님 }\n```json\n{\"ok\": 1}\n```";
        let parsed = parse_loose(text).unwrap();
        assert_eq!(parsed["ok"], json!(1));
    }

    #[test]
    fn prose_without_braces_yields_none() {
        assert!(parse_loose("분석 결과를 생성하지 못했습니다.").is_none());
        assert!(extract_json_str("").is_none());
    }

    #[test]
    fn repair_leaves_valid_json_alone() {
        let text = r#"{"a": [1, 2], "b": {"c": 3}}"#;
        assert_eq!(repair_trailing_commas(text), text);
    }

    #[test]
    fn parser_round_trip_is_identity() {
        let original = json!({
            "PEST": {"P": ["문장."], "E": [], "S": ["사회."], "T": []},
            "one_liner": "전략 (출처:[1])"
        });
        let reparsed = parse_loose(&original.to_string()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn coerce_passes_parsed_values_through() {
        let parsed = json!({"strengths": ["강점."]});
        assert_eq!(coerce_value(&parsed), parsed);
        // twice through the parser changes nothing
        assert_eq!(coerce_value(&coerce_value(&parsed)), parsed);
    }

    #[test]
    fn coerce_parses_raw_strings_and_defaults_garbage() {
        let raw = Value::String("```json\n{\"ok\": true}\n```".to_string());
        assert_eq!(coerce_value(&raw)["ok"], json!(true));

        let garbage = Value::String("JSON이 아닙니다".to_string());
        assert_eq!(coerce_value(&garbage), json!({}));
        assert_eq!(coerce_value(&Value::Null), json!({}));
    }
}
