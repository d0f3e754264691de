// region:    --- Imports
use super::{AuctionFilter, AuctionStore};
use crate::auction::model::{Auction, AuctionStatus};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- In-Memory Store
/// 메모리 경매 저장소
#[derive(Default)]
pub struct InMemoryAuctionStore {
    auctions: RwLock<HashMap<String, Auction>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.auctions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.auctions.read().await.is_empty()
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError> {
        let mut auctions = self.auctions.write().await;
        if auctions.contains_key(&auction.id) {
            return Err(StoreError::DuplicateId(auction.id.clone()));
        }
        auctions.insert(auction.id.clone(), auction.clone());
        Ok(())
    }

    async fn find_by_filter(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let auctions = self.auctions.read().await;
        let mut found: Vec<Auction> = auctions
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, StoreError> {
        self.auctions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, StoreError> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !auction.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: auction.status,
                to: status,
            });
        }
        if auction.status == status {
            return Ok(false);
        }
        auction.status = status;
        Ok(true)
    }
}

// endregion: --- In-Memory Store

// endregion: --- Tests
