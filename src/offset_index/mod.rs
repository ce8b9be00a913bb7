use std::collections::{BTreeSet, HashMap};

use crate::kafka_types::{OffsetFetchResponse, PartitionOffsets};

/// Committed offsets of a single Consumer Group, indexed by Topic.
pub type TopicOffsets = HashMap<String, PartitionOffsets>;

/// Committed offsets of a set of Consumer Groups: `group -> topic -> partition -> offset`.
///
/// Built once per lag computation, from the raw result of a bulk offset fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffsetIndex {
    by_group: HashMap<String, TopicOffsets>,
}

impl OffsetIndex {
    /// Normalizes the raw, per-group [`OffsetFetchResponse`]s into an [`OffsetIndex`].
    ///
    /// Offsets are passed through as they are, including [`crate::kafka_types::NO_OFFSET`]:
    /// it's up to the consumer of the index to decide how to treat them.
    pub fn normalize(raw: HashMap<String, OffsetFetchResponse>) -> Self {
        let by_group = raw
            .into_iter()
            .map(|(group, ofr)| {
                let topic_offsets = ofr
                    .blocks
                    .into_iter()
                    .map(|(topic, blocks)| {
                        let offsets = blocks
                            .into_iter()
                            .map(|(partition, block)| (partition, block.offset))
                            .collect::<PartitionOffsets>();
                        (topic, offsets)
                    })
                    .collect::<TopicOffsets>();
                (group, topic_offsets)
            })
            .collect();

        Self {
            by_group,
        }
    }

    /// Committed offsets of `group`, if any.
    pub fn get_group(&self, group: &str) -> Option<&TopicOffsets> {
        self.by_group.get(group)
    }

    /// Set of all the Topics for which at least one Group has committed offsets.
    pub fn topics(&self) -> BTreeSet<String> {
        self.by_group.values().flat_map(|to| to.keys().cloned()).collect()
    }

    /// Count of Groups for which there are committed offsets.
    pub fn groups_count(&self) -> usize {
        self.by_group.len()
    }
}
