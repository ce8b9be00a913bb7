use std::collections::HashMap;

use crate::errors::{LagError, LagResult};
use crate::kafka_types::{PartitionOffsets, PartitionWatermarks};
use crate::lag_report::{ConsumerGroupLag, PartitionLag, TopicLag};
use crate::offset_index::OffsetIndex;
use crate::watermark_index::WatermarkIndex;

/// Joins committed offsets and high watermarks into a [`ConsumerGroupLag`] for each of the given `groups`.
///
/// Every requested group gets an entry, even if it has no committed offsets at all.
/// Fails if a group has committed offsets for a Topic that is missing from the `watermarks`:
/// the whole computation is aborted, as no partial result is acceptable.
///
/// # Arguments
///
/// * `groups` - Consumer Groups to compute the lag of
/// * `offsets` - Committed offsets of the Consumer Groups
/// * `watermarks` - High watermarks of (at least) all the Topics in `offsets`
pub fn compute_lags<S: AsRef<str>>(
    groups: &[S],
    offsets: &OffsetIndex,
    watermarks: &WatermarkIndex,
) -> LagResult<HashMap<String, ConsumerGroupLag>> {
    let mut res = HashMap::with_capacity(groups.len());

    for group in groups.iter().map(AsRef::as_ref) {
        if res.contains_key(group) {
            continue;
        }

        let mut topic_lags = Vec::new();
        for (topic, partition_offsets) in offsets.get_group(group).into_iter().flatten() {
            let partition_watermarks = watermarks.get_topic(topic).ok_or_else(|| {
                error!("No partition watermarks for Topic '{}' of Group '{}'", topic, group);
                LagError::MissingWatermark {
                    group: group.to_string(),
                    topic: topic.clone(),
                }
            })?;

            match compute_topic_lag(topic, partition_offsets, partition_watermarks) {
                Some(tl) => topic_lags.push(tl),
                None => trace!(
                    "Group '{}' has no usable committed offset for Topic '{}': omitted",
                    group,
                    topic
                ),
            }
        }

        res.insert(
            group.to_string(),
            ConsumerGroupLag {
                group_id: group.to_string(),
                topic_lags,
            },
        );
    }

    Ok(res)
}

/// Lag of a single Topic, or `None` if none of its Partitions has a committed offset.
///
/// Iterates the Partitions of the `watermarks`, not the ones of the `offsets`:
/// Partitions the group never committed to are reflected in `partition_count`
/// being greater than `partitions_with_offset`.
fn compute_topic_lag(
    topic: &str,
    offsets: &PartitionOffsets,
    watermarks: &PartitionWatermarks,
) -> Option<TopicLag> {
    let mut tl = TopicLag {
        topic: topic.to_string(),
        summed_lag: 0,
        partition_count: watermarks.len(),
        partitions_with_offset: 0,
        partition_lags: Vec::with_capacity(offsets.len()),
    };

    for (&partition_id, &watermark) in watermarks {
        let offset = match offsets.get(&partition_id) {
            // Negative offset means "no offset committed"
            Some(&o) if o >= 0 => o,
            _ => continue,
        };

        let lag = partition_lag(watermark, offset);
        tl.partitions_with_offset += 1;
        tl.summed_lag += lag;
        tl.partition_lags.push(PartitionLag {
            partition_id,
            lag,
        });
    }

    if tl.partitions_with_offset == 0 {
        None
    } else {
        Some(tl)
    }
}

/// Watermark and offset are not read atomically: if the watermark was read before the offset
/// was committed, lag would be negative. That is clamped to `0`.
fn partition_lag(watermark: i64, offset: i64) -> i64 {
    (watermark - offset).max(0)
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{compute_lags, partition_lag};
    use crate::errors::LagError;
    use crate::kafka_types::{OffsetFetchResponse, PartitionWatermarks, TopicPartition, NO_OFFSET};
    use crate::lag_report::{ConsumerGroupLag, PartitionLag, TopicLag};
    use crate::offset_index::OffsetIndex;
    use crate::watermark_index::WatermarkIndex;

    fn offsets(entries: &[(&str, &str, i32, i64)]) -> OffsetIndex {
        let mut raw: HashMap<String, OffsetFetchResponse> = HashMap::new();
        for (g, t, p, o) in entries {
            raw.entry(g.to_string()).or_default().add_block(TopicPartition::new(t.to_string(), *p), *o);
        }
        OffsetIndex::normalize(raw)
    }

    fn watermarks(entries: &[(&str, i32, i64)]) -> WatermarkIndex {
        let mut by_topic: HashMap<String, PartitionWatermarks> = HashMap::new();
        for (t, p, w) in entries {
            by_topic.entry(t.to_string()).or_default().insert(*p, *w);
        }
        by_topic.into_iter().collect()
    }

    fn sorted(mut tl: TopicLag) -> TopicLag {
        tl.partition_lags.sort_by_key(|pl| pl.partition_id);
        tl
    }

    fn assert_invariants(cgl: &ConsumerGroupLag) {
        for tl in &cgl.topic_lags {
            assert!(tl.partitions_with_offset <= tl.partition_count);
            assert_eq!(tl.partitions_with_offset, tl.partition_lags.len());
            assert_eq!(tl.summed_lag, tl.partition_lags.iter().map(|pl| pl.lag).sum::<i64>());
            assert!(tl.partition_lags.iter().all(|pl| pl.lag >= 0));
        }
    }

    #[test]
    fn should_clamp_negative_lag() {
        assert_eq!(partition_lag(120, 100), 20);
        assert_eq!(partition_lag(100, 100), 0);
        assert_eq!(partition_lag(100, 105), 0);
    }

    #[test]
    fn should_skip_partitions_without_offset() {
        let o = offsets(&[("g1", "topicA", 0, 100), ("g1", "topicA", 1, 50)]);
        let w = watermarks(&[("topicA", 0, 120), ("topicA", 1, 50), ("topicA", 2, 30)]);

        let res = compute_lags(&["g1"], &o, &w).unwrap();

        let g1 = &res["g1"];
        assert_invariants(g1);
        assert_eq!(g1.group_id, "g1");
        assert_eq!(g1.topic_lags.len(), 1);
        assert_eq!(
            sorted(g1.get_topic_lag("topicA").unwrap().clone()),
            TopicLag {
                topic: "topicA".to_string(),
                summed_lag: 20,
                partition_count: 3,
                partitions_with_offset: 2,
                partition_lags: vec![
                    PartitionLag {
                        partition_id: 0,
                        lag: 20
                    },
                    PartitionLag {
                        partition_id: 1,
                        lag: 0
                    },
                ],
            }
        );
    }

    #[test]
    fn should_report_group_without_offsets() {
        let o = offsets(&[("g1", "topicA", 0, 100)]);
        let w = watermarks(&[("topicA", 0, 120)]);

        let res = compute_lags(&["g1", "g2"], &o, &w).unwrap();

        assert_eq!(res.len(), 2);
        assert_eq!(
            res["g2"],
            ConsumerGroupLag {
                group_id: "g2".to_string(),
                topic_lags: vec![],
            }
        );
    }

    #[test]
    fn should_clamp_stale_watermark() {
        let o = offsets(&[("g1", "topicA", 0, 105)]);
        let w = watermarks(&[("topicA", 0, 100)]);

        let res = compute_lags(&["g1"], &o, &w).unwrap();

        let tl = res["g1"].get_topic_lag("topicA").unwrap();
        assert_eq!(tl.summed_lag, 0);
        assert_eq!(
            tl.partition_lags,
            vec![PartitionLag {
                partition_id: 0,
                lag: 0
            }]
        );
    }

    #[test]
    fn should_have_zero_lag_when_fully_consumed() {
        let o = offsets(&[
            ("g1", "topicA", 0, 10),
            ("g1", "topicA", 1, 20),
            ("g1", "topicA", 2, 30),
        ]);
        let w = watermarks(&[("topicA", 0, 10), ("topicA", 1, 20), ("topicA", 2, 30)]);

        let res = compute_lags(&["g1"], &o, &w).unwrap();

        let tl = res["g1"].get_topic_lag("topicA").unwrap();
        assert_invariants(&res["g1"]);
        assert_eq!(tl.summed_lag, 0);
        assert_eq!(tl.partitions_with_offset, 3);
        assert_eq!(tl.partition_count, 3);
    }

    #[test]
    fn should_omit_topics_without_usable_offsets() {
        // topicB only has "no offset" markers, topicC only offsets for partitions without watermarks
        let o = offsets(&[
            ("g1", "topicA", 0, 1),
            ("g1", "topicB", 0, NO_OFFSET),
            ("g1", "topicB", 1, NO_OFFSET),
            ("g1", "topicC", 7, 5),
        ]);
        let w = watermarks(&[
            ("topicA", 0, 2),
            ("topicB", 0, 10),
            ("topicB", 1, 10),
            ("topicC", 0, 3),
        ]);

        let res = compute_lags(&["g1"], &o, &w).unwrap();

        let g1 = &res["g1"];
        assert_eq!(g1.topic_lags.len(), 1);
        assert_eq!(g1.get_topic_lag("topicA").unwrap().summed_lag, 1);
        assert!(g1.get_topic_lag("topicB").is_none());
        assert!(g1.get_topic_lag("topicC").is_none());
    }

    #[test]
    fn should_ignore_no_offset_partitions_among_committed_ones() {
        let o = offsets(&[("g1", "topicA", 0, NO_OFFSET), ("g1", "topicA", 1, 8)]);
        let w = watermarks(&[("topicA", 0, 10), ("topicA", 1, 10)]);

        let res = compute_lags(&["g1"], &o, &w).unwrap();

        let tl = res["g1"].get_topic_lag("topicA").unwrap();
        assert_eq!(tl.partition_count, 2);
        assert_eq!(tl.partitions_with_offset, 1);
        assert_eq!(tl.summed_lag, 2);
    }

    #[test]
    fn should_share_watermarks_across_groups() {
        let o = offsets(&[
            ("g1", "topicA", 0, 10),
            ("g1", "topicA", 1, 10),
            ("g2", "topicA", 0, 90),
            ("g2", "topicB", 0, 3),
        ]);
        let w = watermarks(&[("topicA", 0, 100), ("topicA", 1, 50), ("topicB", 0, 3)]);

        let res = compute_lags(&["g1", "g2"], &o, &w).unwrap();

        assert_invariants(&res["g1"]);
        assert_invariants(&res["g2"]);
        assert_eq!(res["g1"].get_topic_lag("topicA").unwrap().summed_lag, 130);
        assert_eq!(res["g2"].get_topic_lag("topicA").unwrap().summed_lag, 10);
        assert_eq!(res["g2"].get_topic_lag("topicA").unwrap().partitions_with_offset, 1);
        assert_eq!(res["g2"].get_topic_lag("topicB").unwrap().summed_lag, 0);
        assert!(res["g1"].get_topic_lag("topicB").is_none());
    }

    #[test]
    fn should_collapse_duplicate_groups() {
        let o = offsets(&[("g1", "topicA", 0, 1)]);
        let w = watermarks(&[("topicA", 0, 2)]);

        let res = compute_lags(&["g1", "g1"], &o, &w).unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(res["g1"].topic_lags.len(), 1);
    }

    #[test]
    fn should_fail_on_missing_watermarks() {
        let o = offsets(&[("g1", "topicA", 0, 1), ("g2", "topicB", 0, 1)]);
        let w = watermarks(&[("topicA", 0, 2)]);

        match compute_lags(&["g1", "g2"], &o, &w) {
            Err(LagError::MissingWatermark {
                group,
                topic,
            }) => {
                assert_eq!(group, "g2");
                assert_eq!(topic, "topicB");
            },
            other => panic!("Unexpected result: {other:?}"),
        }
    }
}
