//! Redis Streams job transport.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::PipelineJob;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter stream name
    pub dlq_stream_name: String,
    /// Max delivery attempts before DLQ
    pub max_retries: u32,
    /// Delivery visibility timeout
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "ccast:jobs".to_string(),
            consumer_group: "ccast:workers".to_string(),
            dlq_stream_name: "ccast:dlq".to_string(),
            max_retries: 3,
            visibility_timeout: Duration::from_secs(600),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("CCAST_QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("CCAST_QUEUE_GROUP").unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("CCAST_QUEUE_DLQ").unwrap_or(defaults.dlq_stream_name),
            max_retries: std::env::var("CCAST_QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            visibility_timeout: Duration::from_secs(
                std::env::var("CCAST_QUEUE_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.visibility_timeout.as_secs()),
            ),
        }
    }
}

/// Job queue client over Redis Streams.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Create the consumer group if it does not exist yet.
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("created consumer group {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("consumer group {} already exists", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a job, rejecting duplicates of an in-flight idempotency key.
    pub async fn enqueue(&self, job: PipelineJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(&job)?;
        let idempotency_key = job.idempotency_key();

        let dedup_key = self.dedup_key(&idempotency_key);
        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            warn!("duplicate job rejected: {}", idempotency_key);
            return Err(QueueError::enqueue_failed("duplicate job"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&idempotency_key)
            .query_async(&mut conn)
            .await?;

        // dedup entries outlive the expected processing window, not the job
        conn.set_ex::<_, _, ()>(&dedup_key, "1", 3600).await?;

        info!(
            job_id = %job.job_id(),
            kind = job.kind(),
            message_id = %message_id,
            "enqueued job"
        );

        Ok(message_id)
    }

    /// Acknowledge and drop a delivered message.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("acknowledged message {}", message_id);
        Ok(())
    }

    /// Remove a job's dedup key so the same unit can be enqueued again.
    pub async fn clear_dedup(&self, job: &PipelineJob) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(self.dedup_key(&job.idempotency_key()))
            .await?;
        Ok(())
    }

    /// Move a failed delivery to the dead-letter stream and ack it.
    pub async fn dlq(&self, message_id: &str, job: &PipelineJob, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;

        warn!(job_id = %job.job_id(), "moved job to DLQ: {}", error);
        Ok(())
    }

    /// Read new deliveries for this consumer.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, PipelineJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let reply: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                if let Some(parsed) = self.parse_entry(&entry.id, entry.map.get("job")).await {
                    jobs.push(parsed);
                }
            }
        }

        Ok(jobs)
    }

    /// Claim deliveries a crashed consumer left pending for too long.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, PipelineJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let pending: redis::streams::StreamPendingReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .query_async(&mut conn)
            .await?;

        if pending.count() == 0 {
            return Ok(Vec::new());
        }

        let reply: redis::streams::StreamClaimReply = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();
        for entry in reply.ids {
            if let Some(parsed) = self.parse_entry(&entry.id, entry.map.get("job")).await {
                info!("claimed pending job (message {})", parsed.0);
                jobs.push(parsed);
            }
        }

        Ok(jobs)
    }

    /// Retry counter for a delivery, 0 when unseen.
    pub async fn get_retry_count(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: Option<u32> = conn.get(self.retry_key(message_id)).await?;
        Ok(count.unwrap_or(0))
    }

    /// Bump and return the retry counter for a delivery.
    pub async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.retry_key(message_id);
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, 86400).await?;
        Ok(count)
    }

    /// Jobs waiting in the stream.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.xlen(&self.config.stream_name).await?)
    }

    /// Jobs parked in the dead-letter stream.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.xlen(&self.config.dlq_stream_name).await?)
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    fn dedup_key(&self, idempotency_key: &str) -> String {
        format!("ccast:dedup:{idempotency_key}")
    }

    fn retry_key(&self, message_id: &str) -> String {
        format!("ccast:retry:{message_id}")
    }

    /// Decode one stream entry; malformed payloads are acked away so they
    /// cannot wedge the consumer group.
    async fn parse_entry(
        &self,
        message_id: &str,
        payload: Option<&redis::Value>,
    ) -> Option<(String, PipelineJob)> {
        let Some(redis::Value::BulkString(bytes)) = payload else {
            warn!("stream entry {} has no job payload", message_id);
            self.ack(message_id).await.ok();
            return None;
        };

        match serde_json::from_slice::<PipelineJob>(bytes) {
            Ok(job) => Some((message_id.to_string(), job)),
            Err(e) => {
                warn!("failed to parse job payload in {}: {}", message_id, e);
                self.ack(message_id).await.ok();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.stream_name, "ccast:jobs");
        assert_eq!(config.consumer_group, "ccast:workers");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.visibility_timeout, Duration::from_secs(600));
    }
}
