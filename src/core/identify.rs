use crate::core::sanitizer::parse_candidates;
use crate::core::worker_pool::ResolutionPool;
use crate::domain::model::AggregateResponse;
use crate::domain::ports::{OcrGateway, StructuringGateway};
use crate::utils::error::{IdentifyError, Result};
use std::sync::Arc;
use std::time::Instant;

/// OCR → 結構化 → 解析 → 查詢池，整條流程的協調者
pub struct IdentifyService {
    ocr: Arc<dyn OcrGateway>,
    structuring: Arc<dyn StructuringGateway>,
    pool: ResolutionPool,
}

impl IdentifyService {
    pub fn new(
        ocr: Arc<dyn OcrGateway>,
        structuring: Arc<dyn StructuringGateway>,
        pool: ResolutionPool,
    ) -> Self {
        Self {
            ocr,
            structuring,
            pool,
        }
    }

    pub async fn identify(&self, image: &[u8]) -> Result<AggregateResponse> {
        let started = Instant::now();
        tracing::info!("🚀 Identifying cards in a {} byte image", image.len());

        // 1. OCR
        let raw_text = match self.ocr.detect_text(image).await? {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(IdentifyError::NoTextDetected),
        };
        tracing::debug!(
            "OCR detected {} characters in {:?}",
            raw_text.len(),
            started.elapsed()
        );

        // 2. 結構化
        let content = self.structuring.structure(&raw_text).await?;

        // 3. 清理並解析
        let candidates = parse_candidates(content.as_deref())?;
        tracing::info!(
            "📋 Structuring produced {} candidates after {:?}",
            candidates.len(),
            started.elapsed()
        );

        // 4. 並發查詢並彙總
        let cards = self.pool.resolve_all(candidates).await;
        tracing::info!("✅ Identification finished in {:?}", started.elapsed());

        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::worker_pool::PoolSettings;
    use crate::domain::model::LookupQuery;
    use crate::domain::ports::CardLookup;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedOcr(Option<&'static str>);

    #[async_trait::async_trait]
    impl OcrGateway for FixedOcr {
        async fn detect_text(&self, _image: &[u8]) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct FixedStructuring(Option<&'static str>);

    #[async_trait::async_trait]
    impl StructuringGateway for FixedStructuring {
        async fn structure(&self, _raw_text: &str) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CardLookup for CountingLookup {
        async fn lookup(&self, query: &LookupQuery) -> Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"name": query.fuzzy}))
        }
    }

    fn service(
        ocr: Option<&'static str>,
        structuring: Option<&'static str>,
        lookup: Arc<CountingLookup>,
    ) -> IdentifyService {
        IdentifyService::new(
            Arc::new(FixedOcr(ocr)),
            Arc::new(FixedStructuring(structuring)),
            ResolutionPool::new(lookup, PoolSettings::default()),
        )
    }

    #[tokio::test]
    async fn test_no_text_short_circuits() {
        let lookup = Arc::new(CountingLookup::default());
        let err = service(None, Some("[]"), lookup.clone())
            .identify(b"img")
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifyError::NoTextDetected));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_structuring_never_reaches_pool() {
        let lookup = Arc::new(CountingLookup::default());
        let err = service(Some("LIGHTNING BOLT"), Some("```json\n[{oops}]\n```"), lookup.clone())
            .identify(b"img")
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifyError::StructuringParse { .. }));
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_structuring_response() {
        let lookup = Arc::new(CountingLookup::default());
        let err = service(Some("LIGHTNING BOLT"), None, lookup)
            .identify(b"img")
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifyError::EmptyStructuringResponse));
    }

    #[tokio::test]
    async fn test_candidates_are_resolved() {
        let lookup = Arc::new(CountingLookup::default());
        let cards = service(
            Some("Lightning Bolt\nOpt"),
            Some(r#"[{"title":"Lightning Bolt","setCode":"LEA"},{"title":"Opt","setCode":null}]"#),
            lookup.clone(),
        )
        .identify(b"img")
        .await
        .unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }
}
