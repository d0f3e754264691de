// region:    --- Imports
use crate::error::AuctionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Enums
/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ProductCondition {
    New = 1,
    Used = 2,
    Refurbished = 3,
}

impl ProductCondition {
    /// DB 저장용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::New => "NEW",
            ProductCondition::Used => "USED",
            ProductCondition::Refurbished => "REFURBISHED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(ProductCondition::New),
            "USED" => Some(ProductCondition::Used),
            "REFURBISHED" => Some(ProductCondition::Refurbished),
            _ => None,
        }
    }
}

impl From<ProductCondition> for u8 {
    fn from(condition: ProductCondition) -> Self {
        condition as u8
    }
}

impl TryFrom<u8> for ProductCondition {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ProductCondition::New),
            2 => Ok(ProductCondition::Used),
            3 => Ok(ProductCondition::Refurbished),
            _ => Err(format!("알 수 없는 상품 상태 코드: {}", code)),
        }
    }
}

/// 경매 상태
/// ACTIVE -> COMPLETED 단방향 전이만 허용
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AuctionStatus {
    Active = 0,
    Completed = 1,
}

impl AuctionStatus {
    /// DB 저장용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(AuctionStatus::Active),
            "COMPLETED" => Some(AuctionStatus::Completed),
            _ => None,
        }
    }

    /// 상태 전이 가능 여부
    /// 같은 상태로의 갱신은 허용(멱등), COMPLETED -> ACTIVE 는 불가
    pub fn can_transition_to(&self, next: AuctionStatus) -> bool {
        !matches!(
            (self, next),
            (AuctionStatus::Completed, AuctionStatus::Active)
        )
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AuctionStatus> for u8 {
    fn from(status: AuctionStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for AuctionStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AuctionStatus::Active),
            1 => Ok(AuctionStatus::Completed),
            _ => Err(format!("알 수 없는 경매 상태 코드: {}", code)),
        }
    }
}

// endregion: --- Enums

// region:    --- Auction Model
/// 경매 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

/// 경매 생성 입력
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionInput {
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
}

impl Auction {
    /// 경매 생성
    /// 새 id 를 발급하고 ACTIVE 상태로 시작한다.
    pub fn create(input: CreateAuctionInput, now: DateTime<Utc>) -> Result<Self, AuctionError> {
        let auction = Auction {
            id: Uuid::new_v4().to_string(),
            product_name: input.product_name,
            category: input.category,
            description: input.description,
            condition: input.condition,
            status: AuctionStatus::Active,
            created_at: now,
        };
        auction.validate()?;
        Ok(auction)
    }

    /// 입력값 검증
    pub fn validate(&self) -> Result<(), AuctionError> {
        let description_len = self.description.chars().count();
        if self.product_name.chars().count() <= 1
            || self.category.chars().count() <= 2
            || description_len <= 10
            || description_len > 200
        {
            return Err(AuctionError::BadRequest(
                "invalid auction object".to_string(),
            ));
        }
        Ok(())
    }

    /// 경매 종료 시각 (생성 시각 + 경매 기간)
    pub fn deadline(&self, auction_interval: Duration) -> DateTime<Utc> {
        match chrono::Duration::from_std(auction_interval) {
            Ok(interval) => self
                .created_at
                .checked_add_signed(interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Err(_) => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// 만료 여부: ACTIVE 이면서 now 가 종료 시각을 지난 경우
    pub fn is_expired(&self, auction_interval: Duration, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && now > self.deadline(auction_interval)
    }
}

// endregion: --- Auction Model

// endregion: --- Tests
