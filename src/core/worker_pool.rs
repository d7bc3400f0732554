use crate::core::aggregator::aggregate;
use crate::core::set_codes::trusted_set_code;
use crate::domain::model::{AggregateResponse, Candidate, CardFailure, LookupQuery, LookupResult};
use crate::domain::ports::CardLookup;
use crate::utils::error::IdentifyError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// 查詢池設定；預設不限制並發數也不設逾時
#[derive(Debug, Clone, Default)]
pub struct PoolSettings {
    pub max_concurrent: Option<usize>,
    pub timeout: Option<Duration>,
}

/// Resolves every candidate in its own tokio task.
///
/// A failing or panicking lookup only affects its own slot: the task's error
/// or `JoinError` is turned into a `Card not found` record for that title.
pub struct ResolutionPool {
    lookup: Arc<dyn CardLookup>,
    limiter: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
}

impl ResolutionPool {
    pub fn new(lookup: Arc<dyn CardLookup>, settings: PoolSettings) -> Self {
        // 上限為跨請求共用
        let limiter = settings
            .max_concurrent
            .map(|permits| Arc::new(Semaphore::new(permits.max(1))));

        Self {
            lookup,
            limiter,
            timeout: settings.timeout,
        }
    }

    pub async fn resolve_all(&self, candidates: Vec<Candidate>) -> AggregateResponse {
        let total = candidates.len();
        tracing::info!("🔎 Resolving {} card candidates", total);

        let mut tasks = Vec::with_capacity(total);
        for candidate in candidates {
            let lookup = Arc::clone(&self.lookup);
            let limiter = self.limiter.clone();
            let timeout = self.timeout;
            let title = candidate.title.clone();

            let task = tokio::spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            return LookupResult::Failed(CardFailure::not_found(
                                &candidate.title,
                                e.to_string(),
                            ))
                        }
                    },
                    None => None,
                };

                resolve_one(lookup.as_ref(), &candidate, timeout).await
            });

            tasks.push((title, task));
        }

        let mut entries = Vec::with_capacity(total);
        for (title, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("❌ Lookup task for '{}' panicked: {}", title, e);
                    LookupResult::Failed(CardFailure::not_found(
                        &title,
                        format!("lookup task failed: {}", e),
                    ))
                }
            };
            entries.push((title, result));
        }

        let response = aggregate(entries);
        let found = response.cards.values().filter(|r| r.is_found()).count();
        tracing::info!(
            "✅ Resolved {} candidates ({} found, {} failed)",
            total,
            found,
            response.len() - found
        );
        response
    }
}

/// 標題空白正規化，白名單內的 set code 才會成為過濾條件
pub fn build_query(candidate: &Candidate) -> LookupQuery {
    let fuzzy = candidate.title.split_whitespace().collect::<Vec<_>>().join(" ");
    let set = trusted_set_code(candidate.set_code.as_deref()).map(str::to_string);

    if set.is_none() {
        if let Some(code) = &candidate.set_code {
            tracing::debug!("Ignoring untrusted set code '{}' for '{}'", code, candidate.title);
        }
    }

    LookupQuery { fuzzy, set }
}

async fn resolve_one(
    lookup: &dyn CardLookup,
    candidate: &Candidate,
    timeout: Option<Duration>,
) -> LookupResult {
    let query = build_query(candidate);
    tracing::debug!("Looking up '{}' (set: {:?})", query.fuzzy, query.set);

    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lookup.lookup(&query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(IdentifyError::LookupTimeout { elapsed: limit }),
        },
        None => lookup.lookup(&query).await,
    };

    match outcome {
        Ok(card) => LookupResult::Found(card),
        Err(e) => {
            tracing::warn!("⚠️ Lookup for '{}' failed: {}", candidate.title, e);
            LookupResult::Failed(CardFailure::not_found(&candidate.title, e.to_string()))
        }
    }
}
