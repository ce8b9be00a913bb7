use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use super::{KafkaClient, KafkaClientResult};
use crate::kafka_types::{OffsetFetchResponse, PartitionId, PartitionWatermarks, TopicPartition};

/// [`KafkaClient`] serving canned data from memory, for tests.
///
/// Each request can be made to fail, to verify how failures are propagated.
#[derive(Debug, Default)]
pub struct InMemoryKafkaClient {
    offsets: HashMap<String, OffsetFetchResponse>,
    watermarks: HashMap<String, PartitionWatermarks>,

    /// Topics whose watermarks are omitted from `fetch_high_watermarks`.
    drop_watermarks_of: HashSet<String>,

    fail_offsets: bool,
    fail_partitions_of: HashSet<String>,
    fail_watermarks: bool,
    fail_groups: bool,

    /// Applied to the offsets and groups requests, before responding.
    response_delay: Option<Duration>,

    pub(crate) watermark_fetches: AtomicUsize,
}

impl InMemoryKafkaClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, group: &str, topic: &str, partition: PartitionId, offset: i64) -> Self {
        self.offsets
            .entry(group.to_string())
            .or_default()
            .add_block(TopicPartition::new(topic.to_string(), partition), offset);
        self
    }

    pub fn with_watermark(mut self, topic: &str, partition: PartitionId, watermark: i64) -> Self {
        self.watermarks.entry(topic.to_string()).or_default().insert(partition, watermark);
        self
    }

    pub fn dropping_watermarks_of(mut self, topic: &str) -> Self {
        self.drop_watermarks_of.insert(topic.to_string());
        self
    }

    pub fn failing_offsets(mut self) -> Self {
        self.fail_offsets = true;
        self
    }

    pub fn failing_partitions_of(mut self, topic: &str) -> Self {
        self.fail_partitions_of.insert(topic.to_string());
        self
    }

    pub fn failing_watermarks(mut self) -> Self {
        self.fail_watermarks = true;
        self
    }

    pub fn failing_groups(mut self) -> Self {
        self.fail_groups = true;
        self
    }

    pub fn delaying_responses(mut self, delay: Duration) -> Self {
        self.response_delay = Some(delay);
        self
    }

    async fn delay(&self) {
        if let Some(d) = self.response_delay {
            sleep(d).await;
        }
    }
}

#[async_trait]
impl KafkaClient for InMemoryKafkaClient {
    async fn list_consumer_group_offsets_bulk(
        &self,
        groups: &HashSet<String>,
    ) -> KafkaClientResult<HashMap<String, OffsetFetchResponse>> {
        self.delay().await;

        if self.fail_offsets {
            return Err("broker unreachable".into());
        }

        Ok(groups
            .iter()
            .filter_map(|g| self.offsets.get(g).map(|ofr| (g.clone(), ofr.clone())))
            .collect())
    }

    async fn list_partitions(&self, topic: &str) -> KafkaClientResult<Vec<PartitionId>> {
        if self.fail_partitions_of.contains(topic) {
            return Err(format!("unknown topic '{topic}'").into());
        }

        let mut partitions = self
            .watermarks
            .get(topic)
            .map(|w| w.keys().copied().collect::<Vec<PartitionId>>())
            .ok_or_else(|| format!("unknown topic '{topic}'"))?;
        partitions.sort();
        Ok(partitions)
    }

    async fn fetch_high_watermarks(
        &self,
        topic_partitions: &HashMap<String, Vec<PartitionId>>,
    ) -> KafkaClientResult<HashMap<String, PartitionWatermarks>> {
        self.watermark_fetches.fetch_add(1, Ordering::SeqCst);

        if self.fail_watermarks {
            return Err("leader not available".into());
        }

        let mut res = HashMap::with_capacity(topic_partitions.len());
        for (t, partitions) in topic_partitions {
            if self.drop_watermarks_of.contains(t) {
                continue;
            }

            let known = self.watermarks.get(t).cloned().unwrap_or_default();
            res.insert(
                t.clone(),
                partitions.iter().filter_map(|p| known.get(p).map(|w| (*p, *w))).collect(),
            );
        }
        Ok(res)
    }

    async fn list_groups(&self) -> KafkaClientResult<Vec<String>> {
        self.delay().await;

        if self.fail_groups {
            return Err("coordinator not available".into());
        }

        let mut groups = self.offsets.keys().cloned().collect::<Vec<String>>();
        groups.sort();
        Ok(groups)
    }
}
