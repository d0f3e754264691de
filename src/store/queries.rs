/// 경매 저장
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, product_name, category, description, condition, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// 필터 조회 (NULL 파라미터는 전체 일치)
pub const FIND_AUCTIONS: &str = r#"
    SELECT id, product_name, category, description, condition, status, created_at
    FROM auctions
    WHERE ($1::TEXT IS NULL OR status = $1)
      AND ($2::TEXT IS NULL OR category = $2)
      AND ($3::TEXT IS NULL OR product_name = $3)
    ORDER BY created_at, id
"#;

/// 경매 조회
pub const FIND_AUCTION_BY_ID: &str = "SELECT id, product_name, category, description, condition, status, created_at FROM auctions WHERE id = $1";

/// 상태 조회 (행 잠금)
pub const SELECT_STATUS_FOR_UPDATE: &str = "SELECT status FROM auctions WHERE id = $1 FOR UPDATE";

/// 상태 변경
pub const UPDATE_STATUS: &str = "UPDATE auctions SET status = $1 WHERE id = $2";
