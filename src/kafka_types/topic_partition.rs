use super::PartitionId;

/// Represents a single Topic-Partition pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub(crate) fn new(topic: String, partition: PartitionId) -> Self {
        Self {
            topic,
            partition,
        }
    }
}
