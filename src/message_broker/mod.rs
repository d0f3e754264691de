// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication, TopicResult};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Kafka Producer
/// 경매 이벤트 Kafka 발행기
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    brokers: String,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, String> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| format!("Producer creation error: {:?}", e))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            brokers: brokers.to_string(),
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 메시지 전송
    pub async fn send_message(&self, key: &str, value: &str) -> Result<(), String> {
        debug!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", self.topic, key
        );
        let record = FutureRecord::to(&self.topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Producer", self.topic);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let new_topic = NewTopic::new(
            &self.topic,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        match admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
        {
            Ok(results) => check_topic_results(&results),
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Producer", e);
                Err(format!("토픽 생성 실패: {:?}", e))
            }
        }
    }
}

/// 토픽별 생성 결과 확인
/// 이미 존재하는 토픽은 성공으로 본다.
fn check_topic_results(results: &[TopicResult]) -> Result<(), String> {
    for result in results {
        match result {
            Ok(topic) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Producer", topic),
            Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!("{:<12} --> Kafka 토픽 이미 존재: {}", "Producer", topic)
            }
            Err((topic, code)) => {
                error!(
                    "{:<12} --> Kafka 토픽 생성 실패: {}: {:?}",
                    "Producer", topic, code
                );
                return Err(format!("토픽 생성 실패: {}: {:?}", topic, code));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl EventPublisher for KafkaProducer {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        self.send_message(event.key(), &payload).await
    }
}

// endregion: --- Kafka Producer

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_topic_counts_as_created() {
        let results: Vec<TopicResult> = vec![
            Ok("auction-events".to_string()),
            Err((
                "auction-events".to_string(),
                RDKafkaErrorCode::TopicAlreadyExists,
            )),
        ];
        assert!(check_topic_results(&results).is_ok());
    }

    #[test]
    fn per_topic_error_is_reported() {
        let results: Vec<TopicResult> = vec![Err((
            "auction-events".to_string(),
            RDKafkaErrorCode::InvalidReplicationFactor,
        ))];
        let err = check_topic_results(&results).unwrap_err();
        assert!(err.contains("auction-events"));
    }
}
// endregion: --- Tests
