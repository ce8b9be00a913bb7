use const_format::formatcp;

use crate::lag_report::PartitionLag;

use super::super::{LABEL_CLUSTER_ID, LABEL_GROUP, LABEL_PARTITION, LABEL_TOPIC, NAMESPACE};
use super::{escape_label_value, HEADER_HELP, HEADER_TYPE, TYPE_GAUGE};

const NAME: &str = formatcp!("{NAMESPACE}_kafka_consumer_partition_lag_offset");
const HELP: &str =
    formatcp!("{HEADER_HELP} {NAME} The difference (lag) between the high watermark and the committed offset, of the consumer group for the topic partition.");
const TYPE: &str = formatcp!("{HEADER_TYPE} {NAME} {TYPE_GAUGE}");

pub(crate) fn append_headers(res: &mut Vec<String>) {
    res.push(HELP.into());
    res.push(TYPE.into());
}

pub(crate) fn append_metric(
    cluster_id: &str,
    group: &str,
    topic: &str,
    partition_lag: &PartitionLag,
    res: &mut Vec<String>,
) {
    let PartitionLag {
        partition_id: partition,
        lag,
    } = partition_lag;
    let cluster_id = escape_label_value(cluster_id);
    let group = escape_label_value(group);
    let topic = escape_label_value(topic);

    res.push(format!(
        "{NAME}\
        {{\
            {LABEL_CLUSTER_ID}=\"{cluster_id}\",\
            {LABEL_GROUP}=\"{group}\",\
            {LABEL_TOPIC}=\"{topic}\",\
            {LABEL_PARTITION}=\"{partition}\"\
        }} \
        {lag}"
    ));
}
