/// 경매 만료 감시
/// 주기적으로 ACTIVE 경매를 조회해 기간이 지난 경매를 COMPLETED 로 변경한다.
/// 여러 인스턴스가 같은 저장소를 감시해도 별도 잠금은 없다.
/// 상태 변경은 저장소에서 한 번만 일어나며, 실제로 바꾼 감시기만 완료로 집계하고 이벤트를 발행한다.
// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use crate::auction::model::{Auction, AuctionStatus};
use crate::clock::Clock;
use crate::config::AuctionConfig;
use crate::error::StoreError;
use crate::store::{AuctionFilter, AuctionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Tick Report
/// tick 한 번의 처리 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub active: usize,
    pub expired: usize,
    pub completed: usize,
    /// 다른 감시기가 먼저 COMPLETED 로 바꾼 경매
    pub skipped: usize,
    pub failed: usize,
}

// endregion: --- Tick Report

// region:    --- Expiration Monitor
/// 경매 만료 감시기
pub struct ExpirationMonitor {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    publisher: Option<Arc<dyn EventPublisher>>,
    auction_interval: Duration,
    tick_interval: Duration,
    update_permits: Arc<Semaphore>,
}

impl ExpirationMonitor {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, config: AuctionConfig) -> Self {
        Self {
            store,
            clock,
            publisher: None,
            auction_interval: config.auction_interval,
            tick_interval: config.tick_interval,
            update_permits: Arc::new(Semaphore::new(config.max_concurrent_updates.max(1))),
        }
    }

    /// 경매 종료 이벤트 발행기 설정
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// 감시 루프를 별도 태스크로 시작
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(
            "{:<12} --> 만료 감시 시작: 경매 기간 {:?}, 주기 {:?}",
            "Monitor", self.auction_interval, self.tick_interval
        );
        let task = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        MonitorHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// 감시 루프
    /// 종료 신호 전까지 오류가 나도 멈추지 않는다.
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 핸들이 종료 없이 drop 되면 프로세스 종료까지 계속 실행
        let mut listening = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed(), if listening => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            info!("{:<12} --> 만료 감시 종료", "Monitor");
                            return;
                        }
                        Ok(()) => {}
                        Err(_) => listening = false,
                    }
                    continue;
                }
            }

            self.run_tick().await;
        }
    }

    /// tick 1회 처리
    /// 1. ACTIVE 경매 조회
    /// 2. 만료 경매 필터링
    /// 3. 만료 경매 COMPLETED 로 변경
    pub async fn run_tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let active_auctions = match self.find_active_auctions().await {
            Ok(auctions) => auctions,
            Err(e) => {
                error!("{:<12} --> ACTIVE 경매 조회 실패: {}", "Monitor", e);
                return report;
            }
        };
        report.active = active_auctions.len();
        if active_auctions.is_empty() {
            return report;
        }

        let expired_auctions = self.filter_expired_auctions(active_auctions, self.clock.now());
        report.expired = expired_auctions.len();
        if expired_auctions.is_empty() {
            return report;
        }

        self.update_auctions_to_status_completed(expired_auctions, &mut report)
            .await;
        report
    }

    async fn find_active_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        self.store.find_by_filter(&AuctionFilter::active()).await
    }

    /// now 기준으로 기간이 지난 경매만 남긴다.
    pub fn filter_expired_auctions(
        &self,
        auctions: Vec<Auction>,
        now: DateTime<Utc>,
    ) -> Vec<Auction> {
        auctions
            .into_iter()
            .filter(|auction| auction.is_expired(self.auction_interval, now))
            .collect()
    }

    /// 만료 경매 상태 변경
    /// 경매별로 독립 실행하며 하나가 실패해도 나머지는 계속 진행한다.
    /// 동시 업데이트 수는 max_concurrent_updates 로 제한한다.
    /// 실패한 경매는 다음 tick 에 다시 조회되어 재시도된다.
    async fn update_auctions_to_status_completed(
        &self,
        auctions: Vec<Auction>,
        report: &mut TickReport,
    ) {
        info!(
            "{:<12} --> 만료된 경매 {}건 상태 업데이트",
            "Monitor",
            auctions.len()
        );

        let mut updates = JoinSet::new();
        for auction in auctions {
            let permit = match Arc::clone(&self.update_permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    report.failed += 1;
                    error!("{:<12} --> 업데이트 슬롯 획득 실패: {}", "Monitor", e);
                    continue;
                }
            };
            let store = Arc::clone(&self.store);
            let clock = Arc::clone(&self.clock);
            let publisher = self.publisher.clone();
            updates.spawn(async move {
                let result = complete_auction(store.as_ref(), &auction.id).await;
                drop(permit);
                // 실제로 상태를 바꾼 감시기만 이벤트 발행
                if let (Ok(true), Some(publisher)) = (&result, publisher) {
                    publish_completed(publisher.as_ref(), &auction.id, clock.now()).await;
                }
                (auction.id, result)
            });
        }

        while let Some(joined) = updates.join_next().await {
            match joined {
                Ok((_, Ok(true))) => report.completed += 1,
                Ok((id, Ok(false))) => {
                    report.skipped += 1;
                    debug!("{:<12} --> 이미 COMPLETED 인 경매 id: {}", "Monitor", id);
                }
                Ok((id, Err(e))) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 경매 상태 COMPLETED 변경 실패 id: {}: {}",
                        "Monitor", id, e
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!("{:<12} --> 상태 변경 태스크 실패: {:?}", "Monitor", e);
                }
            }
        }

        debug!(
            "{:<12} --> 상태 업데이트 결과: 성공 {}, 중복 {}, 실패 {}",
            "Monitor", report.completed, report.skipped, report.failed
        );
    }
}

async fn complete_auction(store: &dyn AuctionStore, id: &str) -> Result<bool, StoreError> {
    store.update_status(id, AuctionStatus::Completed).await
}

async fn publish_completed(publisher: &dyn EventPublisher, id: &str, completed_at: DateTime<Utc>) {
    let event = AuctionEvent::AuctionCompleted {
        auction_id: id.to_string(),
        completed_at,
    };
    if let Err(e) = publisher.publish(&event).await {
        warn!(
            "{:<12} --> 경매 종료 이벤트 발행 실패 id: {}: {}",
            "Monitor", id, e
        );
    }
}

// endregion: --- Expiration Monitor

// region:    --- Monitor Handle
/// 실행 중인 감시 태스크 핸들
/// shutdown 없이 drop 하면 태스크는 계속 실행된다.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// 감시 종료
    /// 진행 중인 tick 의 업데이트가 끝난 뒤 반환된다.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("{:<12} --> 만료 감시 태스크 비정상 종료: {:?}", "Monitor", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// endregion: --- Monitor Handle

// endregion: --- Tests
