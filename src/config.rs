/// 환경 변수 기반 설정
/// 모든 값은 시작 시 한 번만 읽는다.
// region:    --- Imports
use std::time::Duration;
use tracing::debug;

// endregion: --- Imports

// region:    --- Defaults
/// 경매 기본 기간 (5분)
pub const DEFAULT_AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// 만료 감시 주기 (1초)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_KAFKA_TOPIC: &str = "auction-events";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
/// tick 당 동시 상태 업데이트 수
pub const DEFAULT_MAX_CONCURRENT_UPDATES: usize = 4;

// endregion: --- Defaults

// region:    --- Auction Config
/// 만료 감시 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionConfig {
    pub auction_interval: Duration,
    pub tick_interval: Duration,
    pub max_concurrent_updates: usize,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            auction_interval: DEFAULT_AUCTION_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_concurrent_updates: DEFAULT_MAX_CONCURRENT_UPDATES,
        }
    }
}

impl AuctionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            auction_interval: auction_interval_from(lookup("AUCTION_INTERVAL").as_deref()),
            tick_interval: tick_interval_from(lookup("AUCTION_TICK_INTERVAL").as_deref()),
            max_concurrent_updates: lookup("AUCTION_UPDATE_CONCURRENCY")
                .and_then(|v| v.trim().parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_UPDATES),
        }
    }

    pub fn with_auction_interval(mut self, interval: Duration) -> Self {
        self.auction_interval = interval;
        self
    }

    pub fn with_max_concurrent_updates(mut self, limit: usize) -> Self {
        self.max_concurrent_updates = limit.max(1);
        self
    }
}

/// 경매 기간 해석: 없거나 잘못된 값이면 기본값(5분)으로 대체
pub fn auction_interval_from(raw: Option<&str>) -> Duration {
    match raw.and_then(parse_duration) {
        Some(interval) => interval,
        None => {
            debug!(
                "{:<12} --> AUCTION_INTERVAL 해석 실패({:?}), 기본값 사용",
                "Config", raw
            );
            DEFAULT_AUCTION_INTERVAL
        }
    }
}

/// 감시 주기 해석: 0 은 타이머로 쓸 수 없으므로 기본값으로 대체
pub fn tick_interval_from(raw: Option<&str>) -> Duration {
    raw.and_then(parse_duration)
        .filter(|tick| !tick.is_zero())
        .unwrap_or(DEFAULT_TICK_INTERVAL)
}

// endregion: --- Auction Config

// region:    --- Server Config
/// 바이너리 실행 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub kafka_brokers: Option<String>,
    pub kafka_topic: String,
    pub listen_addr: String,
    pub auction: AuctionConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let database_max_connections = non_empty("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS);

        // 요청 처리용 커넥션을 남기도록 풀 크기보다 작게 제한
        let mut auction = AuctionConfig::from_lookup(&lookup);
        let pool_limit = (database_max_connections as usize).saturating_sub(1).max(1);
        auction.max_concurrent_updates = auction.max_concurrent_updates.min(pool_limit);

        Self {
            database_url: non_empty("DATABASE_URL"),
            database_max_connections,
            kafka_brokers: non_empty("KAFKA_BROKERS"),
            kafka_topic: non_empty("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            listen_addr: non_empty("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            auction,
        }
    }
}

// endregion: --- Server Config

// region:    --- Duration Parsing
/// "300ms", "1.5h", "2h45m" 형식의 기간 문자열 해석
/// Go 의 ParseDuration 과 달리 음수 기간("-5s")은 의도적으로 거부한다.
/// 음수 경매 기간은 모든 경매를 즉시 만료시키므로 기본값으로 대체되게 한다.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let mut rest = raw.trim();
    if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() || rest.starts_with('-') {
        return None;
    }

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        // 정수부
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        // 소수부
        let (frac_part, after_frac) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        // 단위
        let unit_len = after_frac
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_frac.len());
        let (unit, next) = after_frac.split_at(unit_len);
        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return None,
        };

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total_nanos = total_nanos.checked_add(whole.checked_mul(unit_nanos)?)?;

        if !frac_part.is_empty() {
            // 단위 정밀도를 넘는 자릿수는 버린다
            let digits = frac_part.len().min(18) as u32;
            let frac: u128 = frac_part[..digits as usize].parse().ok()?;
            total_nanos = total_nanos.checked_add(frac * unit_nanos / 10u128.pow(digits))?;
        }

        rest = next;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

// endregion: --- Duration Parsing

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_go_style_durations() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration(".5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("10us"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
    }

    #[test]
    fn rejects_malformed_durations() {
        for raw in ["", "notaduration", "5", "5x", "s", "-5s", "1.s.", "."] {
            assert_eq!(parse_duration(raw), None, "{raw}");
        }
    }

    #[test]
    fn malformed_interval_falls_back_to_five_minutes() {
        assert_eq!(auction_interval_from(Some("notaduration")), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(auction_interval_from(None), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(auction_interval_from(Some("3s")), Duration::from_secs(3));
    }

    #[test]
    fn zero_tick_falls_back_to_one_second() {
        assert_eq!(tick_interval_from(Some("0s")), DEFAULT_TICK_INTERVAL);
        assert_eq!(tick_interval_from(Some("200ms")), Duration::from_millis(200));
    }

    #[test]
    fn server_config_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/auctions"),
            ("AUCTION_INTERVAL", "20s"),
            ("KAFKA_BROKERS", " "),
        ]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/auctions"));
        assert_eq!(config.kafka_brokers, None);
        assert_eq!(config.kafka_topic, DEFAULT_KAFKA_TOPIC);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.database_max_connections, DEFAULT_DATABASE_MAX_CONNECTIONS);
        assert_eq!(config.auction.auction_interval, Duration::from_secs(20));
        assert_eq!(config.auction.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(config.auction.max_concurrent_updates, DEFAULT_MAX_CONCURRENT_UPDATES);
    }

    #[test]
    fn update_concurrency_stays_below_pool_size() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("AUCTION_UPDATE_CONCURRENCY", "16"),
        ]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.database_max_connections, 3);
        assert_eq!(config.auction.max_concurrent_updates, 2);

        let env: HashMap<&str, &str> = HashMap::from([("DATABASE_MAX_CONNECTIONS", "1")]);
        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.auction.max_concurrent_updates, 1);
    }

    #[test]
    fn negative_interval_is_rejected() {
        assert_eq!(parse_duration("-5s"), None);
        assert_eq!(auction_interval_from(Some("-5s")), DEFAULT_AUCTION_INTERVAL);
    }
}
// endregion: --- Tests
