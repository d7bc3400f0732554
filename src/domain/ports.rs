use crate::domain::model::LookupQuery;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 影像文字辨識；`Ok(None)` 表示影像中沒有文字
#[async_trait]
pub trait OcrGateway: Send + Sync {
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>>;
}

/// 語言模型結構化；回傳第一個 choice 的原始文字
#[async_trait]
pub trait StructuringGateway: Send + Sync {
    async fn structure(&self, raw_text: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait CardLookup: Send + Sync {
    async fn lookup(&self, query: &LookupQuery) -> Result<serde_json::Value>;
}
