// Inner modules
mod offset_fetch;
mod partition;
mod topic_partition;

// Exports
pub use offset_fetch::{OffsetFetchBlock, OffsetFetchResponse};
pub use partition::{PartitionId, PartitionOffsets, PartitionWatermarks, NO_OFFSET};
pub use topic_partition::TopicPartition;
