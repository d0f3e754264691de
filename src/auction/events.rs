use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 경매 종료 이벤트
    AuctionCompleted {
        auction_id: String,
        completed_at: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// 메시지 키 (경매 id)
    pub fn key(&self) -> &str {
        match self {
            AuctionEvent::AuctionCompleted { auction_id, .. } => auction_id,
        }
    }
}

/// 이벤트 발행 트레이트
/// 발행은 best-effort 이며 실패해도 상태 전이는 되돌리지 않는다.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String>;
}
