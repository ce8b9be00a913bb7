/// Kafka internal topic that keeps track of Consumer's committed Offsets.
/// It is never reported on, as it's not consumed by "regular" Consumer Groups.
pub(crate) const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";

/// Cluster identifier used when `cluster.id` is not set on the Brokers, and no override is given.
pub(crate) const DEFAULT_CLUSTER_ID: &str = "__none__";

pub(crate) const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
pub(crate) const DEFAULT_HTTP_PORT: &str = "6564";

/// Seconds to wait for any single request to the Kafka cluster.
pub(crate) const DEFAULT_FETCH_TIMEOUT_SECS: &str = "10";
