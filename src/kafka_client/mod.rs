// Inner modules
mod rdkafka_client;

#[cfg(test)]
pub(crate) mod in_memory;

use std::collections::{HashMap, HashSet};
use std::error::Error;

use async_trait::async_trait;

use crate::kafka_types::{OffsetFetchResponse, PartitionId, PartitionWatermarks};

// Exports
pub use rdkafka_client::RdKafkaClient;

/// Opaque error returned by a [`KafkaClient`]: transport, protocol or anything in between.
pub type KafkaClientError = Box<dyn Error + Send + Sync>;

pub type KafkaClientResult<T> = Result<T, KafkaClientError>;

/// The requests to the Kafka cluster needed to compute Consumer Group Lag.
///
/// No retry is expected from the callers: if an implementation wants to retry, it has to do so internally.
#[async_trait]
pub trait KafkaClient: Send + Sync {
    /// Fetches the committed offsets of each of the given Consumer `groups`.
    ///
    /// The result contains an entry for each group that the cluster reported on.
    async fn list_consumer_group_offsets_bulk(
        &self,
        groups: &HashSet<String>,
    ) -> KafkaClientResult<HashMap<String, OffsetFetchResponse>>;

    /// Lists the identifiers of the Partitions of `topic`.
    ///
    /// Fails if the topic is unknown to the cluster.
    async fn list_partitions(&self, topic: &str) -> KafkaClientResult<Vec<PartitionId>>;

    /// Fetches the high watermarks of all the given Partitions, indexed by Topic.
    async fn fetch_high_watermarks(
        &self,
        topic_partitions: &HashMap<String, Vec<PartitionId>>,
    ) -> KafkaClientResult<HashMap<String, PartitionWatermarks>>;

    /// Lists the names of all the Consumer Groups known to the cluster.
    async fn list_groups(&self) -> KafkaClientResult<Vec<String>>;
}
