// region:    --- Imports
use super::queries;
use super::{AuctionFilter, AuctionStore};
use crate::auction::model::{Auction, AuctionStatus, ProductCondition};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Auction Row
/// auctions 테이블 행
#[derive(sqlx::FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = StoreError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let condition = ProductCondition::parse(&row.condition).ok_or_else(|| {
            StoreError::Corrupt(format!("{} condition={}", row.id, row.condition))
        })?;
        let status = AuctionStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("{} status={}", row.id, row.status)))?;

        Ok(Auction {
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            description: row.description,
            condition,
            status,
            created_at: row.created_at,
        })
    }
}

/// 해석할 수 없는 행은 로그만 남기고 건너뛴다.
/// 손상된 행 하나가 목록 조회 전체를 막지 않도록 한다.
fn decode_rows(rows: Vec<AuctionRow>) -> Vec<Auction> {
    rows.into_iter()
        .filter_map(|row| match Auction::try_from(row) {
            Ok(auction) => Some(auction),
            Err(e) => {
                error!("{:<12} --> 손상된 경매 행 건너뜀: {}", "Store", e);
                None
            }
        })
        .collect()
}

// endregion: --- Auction Row

// region:    --- Postgres Store
/// Postgres 경매 저장소
#[derive(Clone)]
pub struct PostgresAuctionStore {
    pool: Arc<PgPool>,
}

impl PostgresAuctionStore {
    /// 커넥션 풀 생성
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(Arc::new(pool)))
    }

    pub fn from_pool(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 스키마 초기화
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> auctions 스키마 준비 완료", "Store");
        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_AUCTION)
            .bind(&auction.id)
            .bind(&auction.product_name)
            .bind(&auction.category)
            .bind(&auction.description)
            .bind(auction.condition.as_str())
            .bind(auction.status.as_str())
            .bind(auction.created_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateId(auction.id.clone())
                }
                other => StoreError::from(other),
            })?;
        Ok(())
    }

    async fn find_by_filter(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::FIND_AUCTIONS)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.category())
            .bind(filter.product_name())
            .fetch_all(&*self.pool)
            .await?;

        Ok(decode_rows(rows))
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, StoreError> {
        sqlx::query_as::<_, AuctionRow>(queries::FIND_AUCTION_BY_ID)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
            .and_then(Auction::try_from)
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.transaction(move |tx| Box::pin(update_status_locked(&mut **tx, id, status)))
            .await
    }
}

/// 행 잠금 후 상태 전이 검증 및 변경
/// 같은 상태로의 갱신은 쓰기 없이 false 반환
async fn update_status_locked(
    conn: &mut PgConnection,
    id: String,
    status: AuctionStatus,
) -> Result<bool, StoreError> {
    let current: Option<String> = sqlx::query_scalar(queries::SELECT_STATUS_FOR_UPDATE)
        .bind(&id)
        .fetch_optional(&mut *conn)
        .await?;
    let current = current.ok_or_else(|| StoreError::NotFound(id.clone()))?;
    let current = AuctionStatus::parse(&current)
        .ok_or_else(|| StoreError::Corrupt(format!("{} status={}", id, current)))?;

    if !current.can_transition_to(status) {
        return Err(StoreError::InvalidTransition {
            id,
            from: current,
            to: status,
        });
    }
    if current == status {
        return Ok(false);
    }

    sqlx::query(queries::UPDATE_STATUS)
        .bind(status.as_str())
        .bind(&id)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

// endregion: --- Postgres Store

// endregion: --- Tests
