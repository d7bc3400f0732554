use crate::config::LookupConfig;
use crate::domain::model::LookupQuery;
use crate::domain::ports::CardLookup;
use crate::utils::error::{IdentifyError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;

/// Scryfall `/cards/named` client.
#[derive(Clone)]
pub struct ScryfallClient {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct ScryfallError {
    details: Option<String>,
}

impl ScryfallClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        // Scryfall 要求 User-Agent 與 Accept 標頭
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self::new(client, &config.endpoint))
    }
}

#[async_trait]
impl CardLookup for ScryfallClient {
    async fn lookup(&self, query: &LookupQuery) -> Result<serde_json::Value> {
        let url = format!("{}/cards/named", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&query.to_pairs())
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Scryfall response for '{}': {}", query.fuzzy, status);
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ScryfallError>(&body)
                .ok()
                .and_then(|error| error.details)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected response")
                        .to_string()
                });
            return Err(IdentifyError::CardLookup {
                status: Some(status.as_u16()),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| IdentifyError::CardLookup {
            status: Some(status.as_u16()),
            message: format!("unparseable card payload: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn query(fuzzy: &str, set: Option<&str>) -> LookupQuery {
        LookupQuery {
            fuzzy: fuzzy.to_string(),
            set: set.map(str::to_string),
        }
    }

    fn client_for(server: &MockServer) -> ScryfallClient {
        let config = LookupConfig {
            endpoint: server.base_url(),
            ..LookupConfig::default()
        };
        ScryfallClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_with_set_filter() {
        let server = MockServer::start();
        let card = json!({"object": "card", "name": "Lightning Bolt", "set": "lea"});
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/cards/named")
                .query_param("fuzzy", "Lightning Bolt")
                .query_param("set", "LEA")
                .header_exists("user-agent")
                .header("accept", "application/json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(card.clone());
        });

        let result = client_for(&server)
            .lookup(&query("Lightning Bolt", Some("LEA")))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(result, card);
    }

    #[tokio::test]
    async fn test_not_found_uses_scryfall_details() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cards/named").query_param("fuzzy", "Foo Bar");
            then.status(404).json_body(json!({
                "object": "error",
                "code": "not_found",
                "status": 404,
                "details": "No cards found matching \u{201c}Foo Bar\u{201d}"
            }));
        });

        let err = client_for(&server)
            .lookup(&query("Foo Bar", None))
            .await
            .unwrap_err();

        match err {
            IdentifyError::CardLookup { status, message } => {
                assert_eq!(status, Some(404));
                assert!(message.starts_with("No cards found matching"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_lookup_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cards/named");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = client_for(&server)
            .lookup(&query("Opt", None))
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifyError::CardLookup { message, .. } if message.contains("unparseable")));
    }

    #[tokio::test]
    async fn test_server_error_without_details() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cards/named");
            then.status(503);
        });

        let err = client_for(&server)
            .lookup(&query("Opt", None))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Card lookup failed (HTTP 503): Service Unavailable");
    }
}
