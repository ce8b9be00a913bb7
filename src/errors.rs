use thiserror::Error;

use crate::kafka_client::KafkaClientError;

/// Possible errors when computing the Lag of a set of Consumer Groups.
///
/// Each of these is fatal for the whole request: there is no partial, per-group success.
#[derive(Error, Debug)]
pub enum LagError {
    /// Fetching the committed offsets of the Consumer Groups failed.
    #[error("Failed to list consumer group offsets in bulk: {0}")]
    BulkOffsetFetch(#[source] KafkaClientError),

    /// Listing the Partitions of a Topic consumed by one of the Consumer Groups failed.
    #[error("Failed to fetch partition list of Topic '{topic}': {source}")]
    PartitionList {
        topic: String,
        #[source]
        source: KafkaClientError,
    },

    /// Fetching the high watermarks of the consumed Topic Partitions failed.
    #[error("Failed to fetch partition high watermarks: {0}")]
    WatermarkFetch(#[source] KafkaClientError),

    /// A Consumer Group committed offsets for a Topic that has no known high watermarks.
    ///
    /// This should never happen: the watermarks are always collected for every Topic
    /// that appears in the committed offsets.
    #[error("No partition watermarks available for Topic '{topic}' consumed by Group '{group}'")]
    MissingWatermark {
        group: String,
        topic: String,
    },

    /// Listing the Consumer Groups known to the cluster failed.
    #[error("Failed to list consumer groups: {0}")]
    GroupList(#[source] KafkaClientError),

    /// Computation was interrupted before completion.
    #[error("Cancelled before consumer group lags were computed")]
    Cancelled,
}

impl LagError {
    /// Short, stable name of the error kind: used as label value for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LagError::BulkOffsetFetch(_) => "bulk_offset_fetch",
            LagError::PartitionList {
                ..
            } => "partition_list",
            LagError::WatermarkFetch(_) => "watermark_fetch",
            LagError::MissingWatermark {
                ..
            } => "missing_watermark",
            LagError::GroupList(_) => "group_list",
            LagError::Cancelled => "cancelled",
        }
    }
}

pub type LagResult<T> = Result<T, LagError>;
