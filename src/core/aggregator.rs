use crate::domain::model::{AggregateResponse, LookupResult};
use std::collections::HashMap;

/// 合併每張候選卡片的結果；同名卡片以最後一筆為準
pub fn aggregate<I>(entries: I) -> AggregateResponse
where
    I: IntoIterator<Item = (String, LookupResult)>,
{
    let mut cards = HashMap::new();

    for (title, result) in entries {
        if cards.insert(title.clone(), result).is_some() {
            tracing::warn!("⚠️ Duplicate card title '{}', keeping the last result", title);
        }
    }

    AggregateResponse { cards }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CardFailure;
    use serde_json::json;

    #[test]
    fn test_one_entry_per_title() {
        let response = aggregate(vec![
            ("Opt".to_string(), LookupResult::Found(json!({"name": "Opt"}))),
            (
                "Foo Bar".to_string(),
                LookupResult::Failed(CardFailure::not_found("Foo Bar", "HTTP 404")),
            ),
        ]);

        assert_eq!(response.len(), 2);
        assert!(response.get("Opt").unwrap().is_found());
        assert_eq!(
            response.get("Foo Bar").unwrap().failure().unwrap().error,
            "Card not found: Foo Bar"
        );
    }

    #[test]
    fn test_duplicate_titles_last_write_wins() {
        let response = aggregate(vec![
            ("Island".to_string(), LookupResult::Found(json!({"set": "lea"}))),
            ("Island".to_string(), LookupResult::Found(json!({"set": "neo"}))),
        ]);

        assert_eq!(response.len(), 1);
        assert_eq!(
            response.get("Island"),
            Some(&LookupResult::Found(json!({"set": "neo"})))
        );
    }

    #[test]
    fn test_no_entries() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
