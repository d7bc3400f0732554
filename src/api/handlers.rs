use crate::api::AppState;
use crate::domain::model::IdentifyResponse;
use crate::utils::error::{IdentifyError, Result};
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// 上傳圖片的表單欄位名稱
pub const CARD_IMAGE_FIELD: &str = "cardImage";

/// POST /identify-cards
pub async fn identify_cards(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<IdentifyResponse>> {
    // 非 multipart 請求視同沒有上傳檔案
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Multipart rejected: {}", rejection);
        IdentifyError::NoFileUploaded
    })?;

    let image = read_card_image(&mut multipart).await?;
    let cards = state.service.identify(&image).await?;

    Ok(Json(IdentifyResponse { cards }))
}

async fn read_card_image(multipart: &mut Multipart) -> Result<Bytes> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some(CARD_IMAGE_FIELD) {
            continue;
        }

        if let Some(content_type) = field.content_type() {
            if !content_type.starts_with("image/") {
                tracing::warn!("⚠️ Unexpected upload content type: {}", content_type);
            }
        }

        let data = field.bytes().await.map_err(invalid_upload)?;
        if data.is_empty() {
            return Err(IdentifyError::NoFileUploaded);
        }
        return Ok(data);
    }

    Err(IdentifyError::NoFileUploaded)
}

fn invalid_upload(err: MultipartError) -> IdentifyError {
    // 超過 DefaultBodyLimit 的串流錯誤會帶 413
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return IdentifyError::UploadTooLarge {
            message: err.body_text(),
        };
    }
    IdentifyError::InvalidUpload {
        message: err.body_text(),
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at,
    }))
}
