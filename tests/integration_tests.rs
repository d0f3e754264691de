use async_trait::async_trait;
use auction_expiry::auction::model::{
    Auction, AuctionStatus, CreateAuctionInput, ProductCondition,
};
use auction_expiry::clock::{Clock, SystemClock, TokioClock};
use auction_expiry::config::{AuctionConfig, DEFAULT_AUCTION_INTERVAL};
use auction_expiry::error::StoreError;
use auction_expiry::handlers;
use auction_expiry::monitor::ExpirationMonitor;
use auction_expiry::repository::AuctionRepository;
use auction_expiry::store::{AuctionFilter, AuctionStore, InMemoryAuctionStore};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::info;

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

fn input() -> CreateAuctionInput {
    CreateAuctionInput {
        product_name: "Produto".to_string(),
        category: "Categoria".to_string(),
        description: "Descrição do produto".to_string(),
        condition: ProductCondition::New,
    }
}

fn config(secs: u64) -> AuctionConfig {
    AuctionConfig::default().with_auction_interval(Duration::from_secs(secs))
}

/// 메모리 저장소 + 저장소 생성 (만료 감시 시작)
fn setup(config: AuctionConfig) -> (Arc<InMemoryAuctionStore>, Arc<AuctionRepository>) {
    init_tracing();
    let store = Arc::new(InMemoryAuctionStore::new());
    let repository = Arc::new(AuctionRepository::new(
        store.clone(),
        Arc::new(TokioClock::new()),
        config,
    ));
    (store, repository)
}

async fn find_by_status(repository: &AuctionRepository, status: AuctionStatus) -> Vec<Auction> {
    repository
        .find_auctions(&AuctionFilter::with_status(status))
        .await
        .unwrap()
}

// region:    --- Scenarios

/// 기간 3초: 1초 시점에는 ACTIVE 유지
#[tokio::test(start_paused = true)]
async fn test_auction_stays_active_before_expiration() {
    let (_, repository) = setup(config(3));
    let auction = repository.create_auction(input()).await.unwrap();

    sleep(Duration::from_secs(1)).await;

    assert!(find_by_status(&repository, AuctionStatus::Completed)
        .await
        .is_empty());
    let active = find_by_status(&repository, AuctionStatus::Active).await;
    assert_eq!(active, vec![auction]);
}

/// 기간 1초: 5초 시점에는 COMPLETED
#[tokio::test(start_paused = true)]
async fn test_auction_completes_after_expiration() {
    let (_, repository) = setup(config(1));
    let auction = repository.create_auction(input()).await.unwrap();

    sleep(Duration::from_secs(5)).await;

    let completed = find_by_status(&repository, AuctionStatus::Completed).await;
    assert_eq!(completed.len(), 1);
    let found = &completed[0];
    assert_eq!(found.id, auction.id);
    assert_eq!(found.product_name, auction.product_name);
    assert_eq!(found.category, auction.category);
    assert_eq!(found.description, auction.description);
    assert_eq!(found.condition, ProductCondition::New);
    assert_eq!(found.status, AuctionStatus::Completed);
    assert_eq!(found.created_at, auction.created_at);
}

/// 기간 5초: 동시 생성 1000건, 1초 뒤 전부 ACTIVE, 6초 뒤 전부 COMPLETED
#[tokio::test(start_paused = true)]
async fn test_concurrent_creations_expire_together() {
    let (_, repository) = setup(config(5));

    let mut handles = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let repository = Arc::clone(&repository);
        handles.push(tokio::spawn(async move {
            repository.create_auction(input()).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    sleep(Duration::from_secs(1)).await;
    assert_eq!(find_by_status(&repository, AuctionStatus::Active).await.len(), 1000);
    assert!(find_by_status(&repository, AuctionStatus::Completed)
        .await
        .is_empty());

    sleep(Duration::from_millis(5500)).await;
    let completed = find_by_status(&repository, AuctionStatus::Completed).await;
    info!("COMPLETED 경매 수: {}", completed.len());
    assert_eq!(completed.len(), 1000);
    assert!(find_by_status(&repository, AuctionStatus::Active)
        .await
        .is_empty());
}

/// 잘못된 기간 문자열은 기본값(5분)으로 대체
#[tokio::test(start_paused = true)]
async fn test_malformed_interval_uses_default() {
    let config = AuctionConfig::from_lookup(|key| {
        (key == "AUCTION_INTERVAL").then(|| "notaduration".to_string())
    });
    assert_eq!(config.auction_interval, DEFAULT_AUCTION_INTERVAL);

    let (_, repository) = setup(config);
    let auction = repository.create_auction(input()).await.unwrap();

    sleep(Duration::from_secs(10)).await;

    let found = repository.find_auction_by_id(&auction.id).await.unwrap();
    assert_eq!(found.status, AuctionStatus::Active);
}

// endregion: --- Scenarios

// region:    --- Properties

/// 기간 전에는 ACTIVE, 기간 + 1 tick 이후에는 COMPLETED, 이후 되돌아가지 않음
#[tokio::test(start_paused = true)]
async fn test_bounded_latency_and_monotonic_status() {
    let (store, repository) = setup(config(3));
    let auction = repository.create_auction(input()).await.unwrap();

    sleep(Duration::from_millis(2900)).await;
    assert_eq!(
        repository.find_auction_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Active
    );

    sleep(Duration::from_millis(1600)).await;
    assert_eq!(
        repository.find_auction_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Completed
    );

    // 되돌리기 시도는 거부되고 이후 tick 에서도 COMPLETED 유지
    assert!(matches!(
        store.update_status(&auction.id, AuctionStatus::Active).await,
        Err(StoreError::InvalidTransition { .. })
    ));
    sleep(Duration::from_secs(10)).await;
    assert_eq!(
        repository.find_auction_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Completed
    );
}

/// 완료된 경매에 대한 중복 업데이트는 관측 가능한 변화가 없다
#[tokio::test(start_paused = true)]
async fn test_repeated_completion_is_idempotent() {
    let (store, repository) = setup(config(1));
    let auction = repository.create_auction(input()).await.unwrap();
    sleep(Duration::from_secs(3)).await;

    let before = repository.find_auction_by_id(&auction.id).await.unwrap();
    store
        .update_status(&auction.id, AuctionStatus::Completed)
        .await
        .unwrap();
    store
        .update_status(&auction.id, AuctionStatus::Completed)
        .await
        .unwrap();
    let after = repository.find_auction_by_id(&auction.id).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(store.len().await, 1);
}

/// 같은 저장소를 감시하는 여러 인스턴스도 결과는 동일
#[tokio::test(start_paused = true)]
async fn test_multiple_monitors_converge() {
    let (store, first) = setup(config(2));
    let second = AuctionRepository::new(store.clone(), Arc::new(TokioClock::new()), config(2));

    for _ in 0..10 {
        first.create_auction(input()).await.unwrap();
        second.create_auction(input()).await.unwrap();
    }

    sleep(Duration::from_secs(4)).await;

    assert_eq!(store.len().await, 20);
    assert_eq!(find_by_status(&first, AuctionStatus::Completed).await.len(), 20);
    assert!(find_by_status(&second, AuctionStatus::Active).await.is_empty());

    first.shutdown().await;
    second.shutdown().await;
}

/// shutdown 이후에는 상태가 바뀌지 않는다
#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_transitions() {
    let (_, repository) = setup(config(1));
    repository.shutdown().await;
    // 두 번째 호출은 무시
    repository.shutdown().await;

    let auction = repository.create_auction(input()).await.unwrap();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(
        repository.find_auction_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Active
    );
}

// endregion: --- Properties

// region:    --- Failure Handling

/// 지정한 경매의 업데이트 또는 조회를 실패시키는 저장소
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryAuctionStore,
    failing_id: Mutex<Option<String>>,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    fn fail_updates_for(&self, id: Option<&str>) {
        *self.failing_id.lock().unwrap() = id.map(str::to_string);
    }
}

#[async_trait]
impl AuctionStore for FlakyStore {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError> {
        self.inner.insert(auction).await
    }

    async fn find_by_filter(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.find_by_filter(filter).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<bool, StoreError> {
        let failing = self.failing_id.lock().unwrap().as_deref() == Some(id);
        if failing {
            return Err(StoreError::Unavailable("write timeout".to_string()));
        }
        self.inner.update_status(id, status).await
    }
}

/// 한 경매의 업데이트 실패가 다른 경매에 영향을 주지 않고, 다음 tick 에 재시도된다
#[tokio::test(start_paused = true)]
async fn test_update_failure_is_isolated_and_retried() {
    init_tracing();
    let store = Arc::new(FlakyStore::default());
    let clock = Arc::new(TokioClock::new());
    let a = Auction::create(input(), clock.now()).unwrap();
    let b = Auction::create(input(), clock.now()).unwrap();
    store.insert(&a).await.unwrap();
    store.insert(&b).await.unwrap();
    store.fail_updates_for(Some(a.id.as_str()));

    let monitor = ExpirationMonitor::new(store.clone(), clock.clone(), config(1));
    tokio::time::advance(Duration::from_secs(2)).await;

    let report = monitor.run_tick().await;
    assert_eq!(report.expired, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(store.find_by_id(&a.id).await.unwrap().status, AuctionStatus::Active);
    assert_eq!(store.find_by_id(&b.id).await.unwrap().status, AuctionStatus::Completed);

    // 다음 tick 에서 실패했던 경매만 다시 처리
    store.fail_updates_for(None);
    let report = monitor.run_tick().await;
    assert_eq!(report.active, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(store.find_by_id(&a.id).await.unwrap().status, AuctionStatus::Completed);
}

/// 조회 실패가 계속되어도 감시 루프는 멈추지 않는다
#[tokio::test(start_paused = true)]
async fn test_read_failures_do_not_stop_monitor() {
    init_tracing();
    let store = Arc::new(FlakyStore::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    let repository = AuctionRepository::new(store.clone(), Arc::new(TokioClock::new()), config(1));
    let auction = repository.create_auction(input()).await.unwrap();

    sleep(Duration::from_secs(5)).await;
    assert_eq!(store.find_by_id(&auction.id).await.unwrap().status, AuctionStatus::Active);

    store.fail_reads.store(false, Ordering::SeqCst);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        store.find_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Completed
    );
}

// endregion: --- Failure Handling

// region:    --- HTTP

/// 테스트 서버 시작
async fn spawn_server() -> (String, Arc<AuctionRepository>) {
    init_tracing();
    let repository = Arc::new(AuctionRepository::new(
        Arc::new(InMemoryAuctionStore::new()),
        Arc::new(SystemClock),
        AuctionConfig::default(),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = handlers::routes(Arc::clone(&repository));
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    (format!("http://{}", addr), repository)
}

/// 경매 생성 및 조회
#[tokio::test]
async fn test_http_create_and_find_auction() {
    let (base_url, repository) = spawn_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/auction", base_url))
        .json(&json!({
            "productName": "Notebook",
            "category": "Eletrônicos",
            "description": "Notebook usado em bom estado",
            "condition": 2
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["status"], 0);
    assert_eq!(created["condition"], 2);
    let id = created["id"].as_str().unwrap().to_string();

    // id 조회
    let response = client
        .get(format!("{}/auction/{}", base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found: Value = response.json().await.unwrap();
    assert_eq!(found["productName"], "Notebook");

    // 필터 조회
    let response = client
        .get(format!(
            "{}/auction?status=0&category=Eletr%C3%B4nicos&productName=",
            base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list: Vec<Value> = response.json().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());

    let response = client
        .get(format!("{}/auction?status=1", base_url))
        .send()
        .await
        .unwrap();
    let list: Vec<Value> = response.json().await.unwrap();
    assert!(list.is_empty());

    repository.shutdown().await;
}

/// 잘못된 요청과 없는 경매
#[tokio::test]
async fn test_http_errors() {
    let (base_url, repository) = spawn_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/auction", base_url))
        .json(&json!({
            "productName": "N",
            "category": "Eletrônicos",
            "description": "curta",
            "condition": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["err"], "bad_request");

    let response = client
        .get(format!("{}/auction/missing-id", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["err"], "not_found");
    assert_eq!(body["code"], 404);

    let response = client
        .get(format!("{}/auction?status=7", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    repository.shutdown().await;
}

// endregion: --- HTTP
