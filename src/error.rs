// region:    --- Imports
use crate::auction::model::AuctionStatus;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

// endregion: --- Imports

// region:    --- Store Error
/// 저장소 오류
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),

    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(String),

    #[error("이미 존재하는 경매 id: {0}")]
    DuplicateId(String),

    #[error("허용되지 않는 상태 전이: {id} {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: AuctionStatus,
        to: AuctionStatus,
    },

    #[error("잘못된 경매 데이터: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

// endregion: --- Store Error

// region:    --- Auction Error
/// 서비스 경계에서 노출되는 오류
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AuctionError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AuctionError::BadRequest(_) => "bad_request",
            AuctionError::NotFound(_) => "not_found",
            AuctionError::Internal(_) => "internal_server_error",
        }
    }
}

/// 저장소 오류는 NotFound 를 제외하고 모두 내부 오류로 변환
impl From<StoreError> for AuctionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => {
                AuctionError::NotFound(format!("Auction not found with this id = {}", id))
            }
            other => {
                error!("{:<12} --> 저장소 오류: {}", "Repository", other);
                AuctionError::Internal("Error trying to access auctions".to_string())
            }
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "message": self.to_string(),
            "err": self.kind(),
            "code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

// endregion: --- Auction Error
