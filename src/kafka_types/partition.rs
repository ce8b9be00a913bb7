use std::collections::HashMap;

/// Identifier of a Partition, within a Topic.
pub type PartitionId = i32;

/// Committed offset, by Partition, of a single (Consumer Group, Topic) pair.
pub type PartitionOffsets = HashMap<PartitionId, i64>;

/// High watermark (i.e. next offset to be produced), by Partition, of a single Topic.
pub type PartitionWatermarks = HashMap<PartitionId, i64>;

/// Offset value Kafka uses to signal that a Consumer Group has not committed any offset.
pub const NO_OFFSET: i64 = -1;
