use std::collections::{BTreeSet, HashMap};

use crate::errors::{LagError, LagResult};
use crate::kafka_client::KafkaClient;
use crate::kafka_types::{PartitionId, PartitionWatermarks};

/// High watermarks of a set of Topics: `topic -> partition -> watermark`.
///
/// The Partitions of a Topic in the index are the authoritative Partition universe
/// of that Topic, shared across all Consumer Groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatermarkIndex {
    by_topic: HashMap<String, PartitionWatermarks>,
}

impl WatermarkIndex {
    /// Collects the high watermarks of all Partitions of the given `topics`.
    ///
    /// First it lists the Partitions of every Topic, then it fetches the watermarks for all of them,
    /// via a single request to the [`KafkaClient`].
    /// Any failure aborts the whole collection: an incomplete index can't distinguish
    /// between "zero lag" and "unknown".
    ///
    /// # Arguments
    ///
    /// * `client` - [`KafkaClient`] used to list Partitions and fetch watermarks
    /// * `topics` - Topics to collect high watermarks for
    pub async fn collect<C: KafkaClient + ?Sized>(
        client: &C,
        topics: &BTreeSet<String>,
    ) -> LagResult<Self> {
        if topics.is_empty() {
            trace!("No topics to collect watermarks for");
            return Ok(Self::default());
        }

        let mut topic_partitions: HashMap<String, Vec<PartitionId>> =
            HashMap::with_capacity(topics.len());
        for t in topics {
            let partitions = client.list_partitions(t).await.map_err(|e| {
                error!("Failed to fetch partition list of Topic '{}': {}", t, e);
                LagError::PartitionList {
                    topic: t.clone(),
                    source: e,
                }
            })?;
            topic_partitions.insert(t.clone(), partitions);
        }

        let by_topic = client.fetch_high_watermarks(&topic_partitions).await.map_err(|e| {
            error!("Failed to fetch high watermarks of {} topics: {}", topic_partitions.len(), e);
            LagError::WatermarkFetch(e)
        })?;

        debug!("Collected high watermarks of {} topics", by_topic.len());
        Ok(Self {
            by_topic,
        })
    }

    /// High watermarks of the Partitions of `topic`, if known.
    pub fn get_topic(&self, topic: &str) -> Option<&PartitionWatermarks> {
        self.by_topic.get(topic)
    }

    /// Count of Topics in the index.
    pub fn topics_count(&self) -> usize {
        self.by_topic.len()
    }
}

impl FromIterator<(String, PartitionWatermarks)> for WatermarkIndex {
    fn from_iter<I: IntoIterator<Item = (String, PartitionWatermarks)>>(iter: I) -> Self {
        Self {
            by_topic: iter.into_iter().collect(),
        }
    }
}
