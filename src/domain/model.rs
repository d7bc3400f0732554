use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 從 OCR 文字中辨識出的一張卡片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    #[serde(rename = "setCode", default, skip_serializing_if = "Option::is_none")]
    pub set_code: Option<String>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, set_code: Option<&str>) -> Self {
        Self {
            title: title.into(),
            set_code: set_code.map(str::to_string),
        }
    }
}

/// 送往卡片資料庫的查詢，`set` 只會是白名單內的代碼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub fuzzy: String,
    pub set: Option<String>,
}

impl LookupQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("fuzzy", self.fuzzy.as_str())];
        if let Some(set) = &self.set {
            pairs.push(("set", set.as_str()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CardFailure {
    pub fn not_found(title: &str, details: impl Into<String>) -> Self {
        Self {
            error: format!("Card not found: {}", title),
            details: Some(details.into()),
        }
    }
}

/// 單一候選卡片的查詢結果；成功時原樣保留外部服務的 JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LookupResult {
    Found(serde_json::Value),
    Failed(CardFailure),
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found(_))
    }

    pub fn failure(&self) -> Option<&CardFailure> {
        match self {
            LookupResult::Failed(failure) => Some(failure),
            LookupResult::Found(_) => None,
        }
    }
}

/// 以卡名為鍵的彙總結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResponse {
    pub cards: HashMap<String, LookupResult>,
}

impl AggregateResponse {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&LookupResult> {
        self.cards.get(title)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResponse {
    pub cards: AggregateResponse,
}
