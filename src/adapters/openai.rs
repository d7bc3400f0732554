use crate::config::StructuringConfig;
use crate::domain::ports::StructuringGateway;
use crate::utils::error::{IdentifyError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an assistant that identifies Magic: The Gathering set codes from text. \
Only return recognized set codes that exist in Magic: The Gathering. \
If you see something that is not a valid MTG set code, do not guess. \
You may also return the card title if present.";

/// 使用者訊息，內嵌 OCR 原文與期望的 JSON 格式
pub fn user_prompt(raw_text: &str) -> String {
    format!(
        r#"The following text was extracted from an image of Magic: The Gathering cards.
Identify the card titles and their set codes. Set codes are usually printed at the bottom left of the card.
Do not infer or invent data: only return titles and set codes that appear in the text and exist in Magic: The Gathering.
Return the data in this JSON format:

[
  {{"title": "Card Name", "setCode": "SET"}}
]

If no valid set code is found for a card, set "setCode" to null.

Here is the text:
{}"#,
        raw_text
    )
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: "gpt-4".to_string(),
            max_tokens: 200,
            temperature: 0.7,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        self.model = model.into();
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn from_config(config: &StructuringConfig) -> Result<Self> {
        let api_key = validate_required_field("structuring.api_key", &config.api_key)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self::new(builder.build()?, &config.endpoint, api_key).with_model(
            &config.model,
            config.max_tokens,
            config.temperature,
        ))
    }
}

#[async_trait]
impl StructuringGateway for OpenAiClient {
    async fn structure(&self, raw_text: &str) -> Result<Option<String>> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(raw_text),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        tracing::debug!("Calling chat completions ({}) at {}", self.model, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentifyError::StructuringGateway {
                message: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(content)
    }
}
