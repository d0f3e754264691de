// region:    --- Imports
use crate::auction::model::{AuctionStatus, CreateAuctionInput};
use crate::error::AuctionError;
use crate::repository::AuctionRepository;
use crate::store::AuctionFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router
/// 라우터 설정
pub fn routes(repository: Arc<AuctionRepository>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auction", get(handle_find_auctions).post(handle_create_auction))
        .route("/auction/:id", get(handle_find_auction_by_id))
        .layer(cors)
        .with_state(repository)
}

// endregion: --- Router

// region:    --- Command Handlers
/// 경매 생성 요청 처리
pub async fn handle_create_auction(
    State(repository): State<Arc<AuctionRepository>>,
    Json(input): Json<CreateAuctionInput>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 생성 요청: {:?}", "Command", input);
    let auction = repository.create_auction(input).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers
/// 경매 목록 조회 파라미터
/// 빈 문자열은 필터 없음으로 취급
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindAuctionsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub product_name: Option<String>,
}

impl TryFrom<FindAuctionsQuery> for AuctionFilter {
    type Error = AuctionError;

    fn try_from(query: FindAuctionsQuery) -> Result<Self, Self::Error> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let code: u8 = raw
                    .parse()
                    .map_err(|_| AuctionError::BadRequest(format!("invalid status: {}", raw)))?;
                Some(AuctionStatus::try_from(code).map_err(AuctionError::BadRequest)?)
            }
        };

        Ok(AuctionFilter {
            status,
            category: query.category,
            product_name: query.product_name,
        })
    }
}

/// 경매 목록 조회
pub async fn handle_find_auctions(
    State(repository): State<Arc<AuctionRepository>>,
    Query(query): Query<FindAuctionsQuery>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 목록 조회: {:?}", "HandlerQuery", query);
    let filter = AuctionFilter::try_from(query)?;
    let auctions = repository.find_auctions(&filter).await?;
    Ok(Json(auctions))
}

/// 경매 조회
pub async fn handle_find_auction_by_id(
    State(repository): State<Arc<AuctionRepository>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", id);
    let auction = repository.find_auction_by_id(&id).await?;
    Ok(Json(auction))
}

// endregion: --- Query Handlers

// endregion: --- Tests
