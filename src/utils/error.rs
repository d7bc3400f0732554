use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Invalid upload: {message}")]
    InvalidUpload { message: String },

    #[error("Upload too large: {message}")]
    UploadTooLarge { message: String },

    #[error("No text detected in the image")]
    NoTextDetected,

    #[error("OCR gateway error: {message}")]
    OcrGateway { message: String },

    #[error("Structuring gateway error: {message}")]
    StructuringGateway { message: String },

    #[error("Structuring gateway returned no content")]
    EmptyStructuringResponse,

    #[error("Structuring response is not valid JSON: {message}")]
    StructuringParse { message: String },

    #[error("Card lookup failed{}: {}", http_status_suffix(.status), .message)]
    CardLookup { status: Option<u16>, message: String },

    #[error("Card lookup timed out after {elapsed:?}")]
    LookupTimeout { elapsed: std::time::Duration },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 客戶端輸入錯誤
    Input,
    /// 上游服務沒有可用內容
    UpstreamEmpty,
    /// 上游服務回應格式錯誤
    MalformedUpstream,
    /// 外部服務呼叫失敗
    External,
    Configuration,
    Internal,
}

impl IdentifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IdentifyError::NoFileUploaded
            | IdentifyError::InvalidUpload { .. }
            | IdentifyError::UploadTooLarge { .. } => ErrorCategory::Input,
            IdentifyError::NoTextDetected | IdentifyError::EmptyStructuringResponse => {
                ErrorCategory::UpstreamEmpty
            }
            IdentifyError::StructuringParse { .. } => ErrorCategory::MalformedUpstream,
            IdentifyError::ApiError(_)
            | IdentifyError::OcrGateway { .. }
            | IdentifyError::StructuringGateway { .. }
            | IdentifyError::CardLookup { .. }
            | IdentifyError::LookupTimeout { .. } => ErrorCategory::External,
            IdentifyError::ConfigError { .. }
            | IdentifyError::MissingConfigError { .. }
            | IdentifyError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            IdentifyError::IoError(_) => ErrorCategory::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentifyError::NoFileUploaded | IdentifyError::InvalidUpload { .. } => {
                StatusCode::BAD_REQUEST
            }
            IdentifyError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IdentifyError::NoTextDetected => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 回傳給 HTTP 客戶端的訊息，內部錯誤不外洩細節
    pub fn client_message(&self) -> String {
        match self {
            IdentifyError::NoFileUploaded => "No file uploaded.".to_string(),
            IdentifyError::InvalidUpload { message } => format!("Invalid upload: {}", message),
            IdentifyError::UploadTooLarge { .. } => {
                "Uploaded file exceeds the size limit.".to_string()
            }
            IdentifyError::NoTextDetected => "No text detected in the image.".to_string(),
            IdentifyError::EmptyStructuringResponse => {
                "No content received from the structuring model.".to_string()
            }
            IdentifyError::StructuringParse { .. } => {
                "Invalid JSON from the structuring model.".to_string()
            }
            _ => "Internal server error.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Upload a JPEG or PNG image in the 'cardImage' form field",
            ErrorCategory::UpstreamEmpty => "Try a sharper photo with the card titles visible",
            ErrorCategory::MalformedUpstream => "Retry the request; the model output was unusable",
            ErrorCategory::External => "Check network access and the upstream API keys",
            ErrorCategory::Configuration => {
                "Check the configuration file and environment variables (OPENAI_API_KEY, GOOGLE_VISION_API_KEY)"
            }
            ErrorCategory::Internal => "Check the server logs for details",
        }
    }
}

impl IntoResponse for IdentifyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?})",
                self,
                self.category()
            );
        } else {
            tracing::warn!("⚠️ Request rejected: {}", self);
        }

        let body = serde_json::json!({ "error": self.client_message() });
        (status, Json(body)).into_response()
    }
}

fn http_status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, IdentifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(IdentifyError::NoFileUploaded.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(IdentifyError::NoTextDetected.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            IdentifyError::UploadTooLarge {
                message: "length limit exceeded".to_string()
            }
            .status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            IdentifyError::EmptyStructuringResponse.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            IdentifyError::StructuringParse {
                message: "eof".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = IdentifyError::OcrGateway {
            message: "quota exceeded for key abc".to_string(),
        };
        assert_eq!(err.client_message(), "Internal server error.");
        assert_eq!(err.category(), ErrorCategory::External);
    }

    #[test]
    fn test_card_lookup_display_includes_status() {
        let err = IdentifyError::CardLookup {
            status: Some(404),
            message: "No cards found".to_string(),
        };
        assert_eq!(err.to_string(), "Card lookup failed (HTTP 404): No cards found");

        let err = IdentifyError::CardLookup {
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Card lookup failed: connection reset");
    }
}
