pub mod consumer_partition_lag_offset;
pub mod consumer_topic_lag_offset;
pub mod consumer_topic_partition_count;
pub mod consumer_topic_partitions_with_offset;

use std::borrow::Cow;
use std::collections::HashMap;

use crate::lag_report::{ConsumerGroupLag, PartitionLag, TopicLag};

pub(self) const TYPE_GAUGE: &str = "gauge";

pub(self) const HEADER_HELP: &str = "# HELP";
pub(self) const HEADER_TYPE: &str = "# TYPE";

type IterTopicLagFn = fn(cluster_id: &str, group: &str, topic_lag: &TopicLag, res: &mut Vec<String>);

type IterPartitionLagFn = fn(
    cluster_id: &str,
    group: &str,
    topic: &str,
    partition_lag: &PartitionLag,
    res: &mut Vec<String>,
);

/// Escapes a label value for the text exposition format: `\`, `"` and newline are the only special characters.
pub(self) fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '\n']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Sorted view of the lags, so that the output is stable across scrapes.
fn sorted_groups(lags: &HashMap<String, ConsumerGroupLag>) -> Vec<&ConsumerGroupLag> {
    let mut groups = lags.values().collect::<Vec<&ConsumerGroupLag>>();
    groups.sort_by(|a, b| a.group_id.cmp(&b.group_id));
    groups
}

/// Helper to iterate over the [`TopicLag`]s of a lag report, to apply a given [`IterTopicLagFn`].
pub fn iter_topic_lags(
    lags: &HashMap<String, ConsumerGroupLag>,
    metrics_vec: &mut Vec<String>,
    cluster_id: &str,
    itlf: IterTopicLagFn,
) {
    for cgl in sorted_groups(lags) {
        for tl in cgl.topic_lags.iter() {
            itlf(cluster_id, &cgl.group_id, tl, metrics_vec);
        }
    }
}

/// Helper to iterate over the [`PartitionLag`]s of a lag report, to apply a given [`IterPartitionLagFn`].
pub fn iter_partition_lags(
    lags: &HashMap<String, ConsumerGroupLag>,
    metrics_vec: &mut Vec<String>,
    cluster_id: &str,
    iplf: IterPartitionLagFn,
) {
    for cgl in sorted_groups(lags) {
        for tl in cgl.topic_lags.iter() {
            let mut pls = tl.partition_lags.iter().collect::<Vec<&PartitionLag>>();
            pls.sort_by_key(|pl| pl.partition_id);
            for pl in pls {
                iplf(cluster_id, &cgl.group_id, &tl.topic, pl, metrics_vec);
            }
        }
    }
}

/// Renders the given lag report as Prometheus text exposition format.
pub fn render(lags: &HashMap<String, ConsumerGroupLag>, cluster_id: &str) -> Vec<String> {
    let tl_count: usize = lags.values().map(|cgl| cgl.topic_lags.len()).sum();
    let pl_count: usize = lags
        .values()
        .flat_map(|cgl| cgl.topic_lags.iter())
        .map(|tl| tl.partition_lags.len())
        .sum();
    let metric_types_count: usize = 4;
    let mut body: Vec<String> =
        Vec::with_capacity(tl_count * 2 + pl_count + metric_types_count * 2);

    // ------------------------------------------------------- METRIC: consumer_partition_lag_offset
    consumer_partition_lag_offset::append_headers(&mut body);
    iter_partition_lags(lags, &mut body, cluster_id, consumer_partition_lag_offset::append_metric);

    // ----------------------------------------------------------- METRIC: consumer_topic_lag_offset
    consumer_topic_lag_offset::append_headers(&mut body);
    iter_topic_lags(lags, &mut body, cluster_id, consumer_topic_lag_offset::append_metric);

    // ----------------------------------------------- METRIC: consumer_topic_partitions_with_offset
    consumer_topic_partitions_with_offset::append_headers(&mut body);
    iter_topic_lags(
        lags,
        &mut body,
        cluster_id,
        consumer_topic_partitions_with_offset::append_metric,
    );

    // --------------------------------------------------- METRIC: consumer_topic_partition_count
    consumer_topic_partition_count::append_headers(&mut body);
    iter_topic_lags(lags, &mut body, cluster_id, consumer_topic_partition_count::append_metric);

    body
}
