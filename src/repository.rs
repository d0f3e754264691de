/// 경매 저장소 + 만료 감시 묶음
/// 생성과 동시에 해당 저장소의 만료 감시를 시작한다.
// region:    --- Imports
use crate::auction::events::EventPublisher;
use crate::auction::model::{Auction, CreateAuctionInput};
use crate::clock::Clock;
use crate::config::AuctionConfig;
use crate::error::AuctionError;
use crate::monitor::{ExpirationMonitor, MonitorHandle};
use crate::store::{AuctionFilter, AuctionStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Auction Repository
pub struct AuctionRepository {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl AuctionRepository {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, config: AuctionConfig) -> Self {
        Self::with_publisher(store, clock, config, None)
    }

    pub fn with_publisher(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        config: AuctionConfig,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        let mut monitor = ExpirationMonitor::new(Arc::clone(&store), Arc::clone(&clock), config);
        if let Some(publisher) = publisher {
            monitor = monitor.with_publisher(publisher);
        }

        Self {
            store,
            clock,
            monitor: Mutex::new(Some(monitor.spawn())),
        }
    }

    /// 경매 생성
    pub async fn create_auction(&self, input: CreateAuctionInput) -> Result<Auction, AuctionError> {
        let auction = Auction::create(input, self.clock.now())?;
        if let Err(e) = self.store.insert(&auction).await {
            error!("{:<12} --> 경매 저장 실패: {}", "Repository", e);
            return Err(AuctionError::Internal(
                "Error trying to insert auction".to_string(),
            ));
        }
        info!("{:<12} --> 경매 생성 id: {}", "Repository", auction.id);
        Ok(auction)
    }

    /// 경매 목록 조회
    pub async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AuctionError> {
        Ok(self.store.find_by_filter(filter).await?)
    }

    /// 경매 조회
    pub async fn find_auction_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// 만료 감시 종료
    /// 두 번째 호출부터는 아무 것도 하지 않는다.
    pub async fn shutdown(&self) {
        let handle = self.monitor.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }
}

// endregion: --- Auction Repository
