use const_format::formatcp;

use crate::lag_report::TopicLag;

use super::super::{LABEL_CLUSTER_ID, LABEL_GROUP, LABEL_TOPIC, NAMESPACE};
use super::{escape_label_value, HEADER_HELP, HEADER_TYPE, TYPE_GAUGE};

const NAME: &str = formatcp!("{NAMESPACE}_kafka_consumer_topic_partition_count");
const HELP: &str =
    formatcp!("{HEADER_HELP} {NAME} Partitions of the topic, for which a high watermark was known when the lag of the consumer group was computed.");
const TYPE: &str = formatcp!("{HEADER_TYPE} {NAME} {TYPE_GAUGE}");

pub(crate) fn append_headers(res: &mut Vec<String>) {
    res.push(HELP.into());
    res.push(TYPE.into());
}

pub(crate) fn append_metric(cluster_id: &str, group: &str, topic_lag: &TopicLag, res: &mut Vec<String>) {
    let cluster_id = escape_label_value(cluster_id);
    let group = escape_label_value(group);
    let topic = escape_label_value(&topic_lag.topic);
    let partition_count = topic_lag.partition_count;

    res.push(format!(
        "{NAME}\
        {{\
            {LABEL_CLUSTER_ID}=\"{cluster_id}\",\
            {LABEL_GROUP}=\"{group}\",\
            {LABEL_TOPIC}=\"{topic}\"\
        }} \
        {partition_count}"
    ));
}
