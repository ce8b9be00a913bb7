use serde::{Deserialize, Serialize};

use crate::kafka_types::PartitionId;

/// Lag of a single Consumer Group, for a single Partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionLag {
    pub partition_id: PartitionId,

    /// Messages produced to the Partition, but not consumed by the Group yet. Never negative.
    pub lag: i64,
}

/// Lag of a single Consumer Group, for a single Topic and each of its Partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicLag {
    pub topic: String,

    /// Sum of the lag of all Partitions: Partitions without a committed offset are not considered.
    pub summed_lag: i64,

    /// Partitions of the Topic, as known by their high watermarks.
    pub partition_count: usize,

    /// Partitions for which the Group has committed an offset.
    pub partitions_with_offset: usize,

    /// Lag of each Partition with a committed offset. No ordering is guaranteed.
    pub partition_lags: Vec<PartitionLag>,
}

/// Lag of a single Consumer Group, for all the Topics it has committed offsets for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerGroupLag {
    pub group_id: String,
    pub topic_lags: Vec<TopicLag>,
}

impl ConsumerGroupLag {
    /// Returns the [`TopicLag`] of `topic`, or `None` if the Group has no committed offsets for it.
    pub fn get_topic_lag(&self, topic: &str) -> Option<&TopicLag> {
        self.topic_lags.iter().find(|tl| tl.topic == topic)
    }
}
