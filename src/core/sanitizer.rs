use crate::domain::model::Candidate;
use crate::utils::error::{IdentifyError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json\s*").expect("valid fence regex"));

#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    title: Option<String>,
    #[serde(
        rename = "setCode",
        alias = "set_code",
        default,
        deserialize_with = "lenient_set_code"
    )]
    set_code: Option<String>,
}

/// 非字串的 setCode (數字、布林、物件) 視為未提供
fn lenient_set_code<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(code) => Ok(Some(code)),
        serde_json::Value::Null => Ok(None),
        other => {
            tracing::warn!("⚠️ Ignoring non-string setCode: {}", other);
            Ok(None)
        }
    }
}

/// 移除 ```json / ``` 標記與前後空白
pub fn strip_code_fences(content: &str) -> String {
    JSON_FENCE.replace_all(content, "").replace("```", "").trim().to_string()
}

/// 將語言模型的原始輸出解析成候選卡片清單
pub fn parse_candidates(content: Option<&str>) -> Result<Vec<Candidate>> {
    let content = match content {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(IdentifyError::EmptyStructuringResponse),
    };

    let cleaned = strip_code_fences(content);
    tracing::debug!("Cleaned structuring content: {}", cleaned);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| IdentifyError::StructuringParse {
            message: e.to_string(),
        })?;

    // 單一物件視為只有一張卡
    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        other => {
            return Err(IdentifyError::StructuringParse {
                message: format!("expected a JSON array of cards, got {}", other),
            })
        }
    };

    let mut candidates = Vec::with_capacity(items.len());
    for item in items {
        let raw: RawCandidate =
            serde_json::from_value(item).map_err(|e| IdentifyError::StructuringParse {
                message: e.to_string(),
            })?;

        let title = match raw.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                tracing::warn!("⚠️ Skipping candidate without a title (setCode: {:?})", raw.set_code);
                continue;
            }
        };

        let set_code = raw
            .set_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        candidates.push(Candidate { title, set_code });
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_and_plain_fences_identically() {
        let body = r#"[{"title": "Opt", "setCode": "XLN"}]"#;
        let json_fenced = format!("```json\n{}\n```", body);
        let plain_fenced = format!("```\n{}\n```", body);
        let upper_fenced = format!("  ```JSON   {}```  \n", body);

        assert_eq!(strip_code_fences(&json_fenced), body);
        assert_eq!(strip_code_fences(&plain_fenced), body);
        assert_eq!(strip_code_fences(&upper_fenced), body);
        assert_eq!(strip_code_fences(&format!("\n\t{}  ", body)), body);
    }

    #[test]
    fn test_parse_fenced_candidates() {
        let content = "```json\n[{\"title\": \"Lightning Bolt\", \"setCode\": \"LEA\"}, {\"title\": \"Opt\", \"setCode\": null}]\n```";
        let candidates = parse_candidates(Some(content)).unwrap();

        assert_eq!(
            candidates,
            vec![
                Candidate::new("Lightning Bolt", Some("LEA")),
                Candidate::new("Opt", None),
            ]
        );
    }

    #[test]
    fn test_missing_and_blank_set_codes_are_absent() {
        let content = r#"[{"title": "Opt"}, {"title": "Shock", "setCode": "  "}]"#;
        let candidates = parse_candidates(Some(content)).unwrap();

        assert!(candidates.iter().all(|c| c.set_code.is_none()));
    }

    #[test]
    fn test_non_string_set_code_is_absent() {
        let content = r#"[{"title":"Opt","setCode":123},{"title":"Shock","setCode":"M19"},{"title":"Duress","setCode":{"code":"XLN"}}]"#;
        let candidates = parse_candidates(Some(content)).unwrap();

        assert_eq!(
            candidates,
            vec![
                Candidate::new("Opt", None),
                Candidate::new("Shock", Some("M19")),
                Candidate::new("Duress", None),
            ]
        );
    }

    #[test]
    fn test_single_object_is_one_candidate() {
        let candidates = parse_candidates(Some(r#"{"title": "Counterspell", "setCode": "MH2"}"#)).unwrap();
        assert_eq!(candidates, vec![Candidate::new("Counterspell", Some("MH2"))]);
    }

    #[test]
    fn test_untitled_entries_are_dropped() {
        let content = r#"[{"title": "", "setCode": "NEO"}, {"setCode": "NEO"}, {"title": "Opt"}]"#;
        let candidates = parse_candidates(Some(content)).unwrap();
        assert_eq!(candidates, vec![Candidate::new("Opt", None)]);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_candidates(Some("```json\n[{\"title\": \"Opt\",\n```")).unwrap_err();
        assert!(matches!(err, IdentifyError::StructuringParse { .. }));

        let err = parse_candidates(Some("Sorry, I could not find any cards.")).unwrap_err();
        assert!(matches!(err, IdentifyError::StructuringParse { .. }));
    }

    #[test]
    fn test_wrong_shapes_are_parse_errors() {
        let err = parse_candidates(Some("42")).unwrap_err();
        assert!(matches!(err, IdentifyError::StructuringParse { .. }));

        let err = parse_candidates(Some(r#"[{"title": 7}]"#)).unwrap_err();
        assert!(matches!(err, IdentifyError::StructuringParse { .. }));
    }

    #[test]
    fn test_empty_content() {
        assert!(matches!(
            parse_candidates(None).unwrap_err(),
            IdentifyError::EmptyStructuringResponse
        ));
        assert!(matches!(
            parse_candidates(Some("")).unwrap_err(),
            IdentifyError::EmptyStructuringResponse
        ));
    }

    #[test]
    fn test_empty_array_is_not_an_error() {
        assert!(parse_candidates(Some("```json\n[]\n```")).unwrap().is_empty());
    }
}
