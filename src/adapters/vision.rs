use crate::config::OcrConfig;
use crate::domain::ports::OcrGateway;
use crate::utils::error::{IdentifyError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google Cloud Vision `images:annotate` client (TEXT_DETECTION).
pub struct VisionClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    r#type: &'a str,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "textAnnotations", default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<VisionStatus>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct VisionStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl VisionClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let api_key = validate_required_field("ocr.api_key", &config.api_key)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self::new(builder.build()?, &config.endpoint, api_key))
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl OcrGateway for VisionClient {
    async fn detect_text(&self, image: &[u8]) -> Result<Option<String>> {
        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    r#type: "TEXT_DETECTION",
                }],
            }],
        };

        tracing::debug!("Sending {} byte image to Vision API", image.len());
        let response = self
            .client
            .post(self.annotate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Vision API response status: {}", status);
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentifyError::OcrGateway {
                message: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }

        let parsed: AnnotateResponse = response.json().await?;
        let first = match parsed.responses.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        };

        if let Some(error) = first.error {
            return Err(IdentifyError::OcrGateway {
                message: format!("Vision error {}: {}", error.code, error.message),
            });
        }

        // 第一個 annotation 是整張圖的全文
        Ok(first
            .text_annotations
            .into_iter()
            .next()
            .map(|annotation| annotation.description))
    }
}
