// region:    --- Imports
use auction_expiry::auction::events::EventPublisher;
use auction_expiry::clock::SystemClock;
use auction_expiry::config::ServerConfig;
use auction_expiry::handlers;
use auction_expiry::message_broker::KafkaProducer;
use auction_expiry::repository::AuctionRepository;
use auction_expiry::store::PostgresAuctionStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = ServerConfig::from_env();

    // 데이터베이스 연결 및 스키마 초기화
    let database_url = config
        .database_url
        .clone()
        .ok_or("DATABASE_URL must be set")?;
    let store =
        PostgresAuctionStore::connect(&database_url, config.database_max_connections).await?;
    if let Err(e) = store.initialize_schema().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 설정이 있을 때만 경매 종료 이벤트 발행
    let publisher: Option<Arc<dyn EventPublisher>> = match &config.kafka_brokers {
        Some(brokers) => {
            let producer = KafkaProducer::new(brokers, &config.kafka_topic)?;
            if let Err(e) = producer.create_topic(5, 1).await {
                warn!("{:<12} --> 토픽 생성 실패, 기존 토픽 사용: {}", "Main", e);
            }
            info!("{:<12} --> Kafka 발행 활성화: {}", "Main", producer.topic());
            Some(Arc::new(producer) as Arc<dyn EventPublisher>)
        }
        None => {
            info!("{:<12} --> KAFKA_BROKERS 미설정, 이벤트 발행 비활성화", "Main");
            None
        }
    };

    // 저장소 생성과 함께 만료 감시 시작
    let repository = Arc::new(AuctionRepository::with_publisher(
        Arc::new(store),
        Arc::new(SystemClock),
        config.auction,
        publisher,
    ));

    // 리스너 생성
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행 (Ctrl+C 시 종료)
    let app = handlers::routes(Arc::clone(&repository));
    if let Err(err) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    repository.shutdown().await;
    info!("{:<12} --> 종료 완료", "Main");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("{:<12} --> 종료 신호 대기 실패: {}", "Main", e);
    }
    info!("{:<12} --> 종료 신호 수신", "Main");
}
// endregion: --- Main
