use std::collections::HashMap;

use super::{PartitionId, TopicPartition};

/// A single Partition entry of an [`OffsetFetchResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct OffsetFetchBlock {
    /// Offset committed by the Consumer Group.
    ///
    /// Can be [`super::NO_OFFSET`], if the Kafka client reports Partitions the Group never committed to.
    pub offset: i64,
}

/// Offsets committed by a single Consumer Group, as returned by the Kafka client.
///
/// Blocks are indexed by Topic, then by Partition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffsetFetchResponse {
    pub blocks: HashMap<String, HashMap<PartitionId, OffsetFetchBlock>>,
}

impl OffsetFetchResponse {
    /// Adds (or replaces) the committed `offset` of a [`TopicPartition`].
    pub fn add_block(&mut self, tp: TopicPartition, offset: i64) {
        self.blocks.entry(tp.topic).or_default().insert(
            tp.partition,
            OffsetFetchBlock {
                offset,
            },
        );
    }
}

impl FromIterator<(TopicPartition, i64)> for OffsetFetchResponse {
    fn from_iter<I: IntoIterator<Item = (TopicPartition, i64)>>(iter: I) -> Self {
        let mut res = Self::default();
        for (tp, offset) in iter {
            res.add_block(tp, offset);
        }
        res
    }
}
