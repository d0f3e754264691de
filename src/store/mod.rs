// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::error::StoreError;
use async_trait::async_trait;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
mod queries;

pub use memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Modules

// region:    --- Filter
/// 경매 조회 필터
/// 비어 있는 필드는 해당 필드의 모든 값과 일치한다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    pub product_name: Option<String>,
}

impl AuctionFilter {
    /// ACTIVE 경매 전체
    pub fn active() -> Self {
        Self {
            status: Some(AuctionStatus::Active),
            ..Self::default()
        }
    }

    pub fn with_status(status: AuctionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref().filter(|p| !p.is_empty())
    }

    pub fn matches(&self, auction: &Auction) -> bool {
        self.status.map_or(true, |s| auction.status == s)
            && self.category().map_or(true, |c| auction.category == c)
            && self.product_name().map_or(true, |p| auction.product_name == p)
    }
}

// endregion: --- Filter

// region:    --- Auction Store Trait
/// 경매 저장소 트레이트
/// update_status 는 단일 레코드 단위로 원자적이어야 한다.
/// 반환값은 이번 호출로 실제 상태가 바뀌었는지 여부이며,
/// 같은 상태로의 갱신은 Ok(false) 로 끝난다.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError>;

    async fn find_by_filter(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Auction, StoreError>;

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, StoreError>;
}

// endregion: --- Auction Store Trait
