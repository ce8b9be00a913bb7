use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Histogram,
    IntCounterVec, Registry,
};
use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::errors::{LagError, LagResult};
use crate::kafka_client::KafkaClient;
use crate::lag_aggregator::compute_lags;
use crate::lag_report::ConsumerGroupLag;
use crate::offset_index::OffsetIndex;
use crate::prometheus_metrics::LABEL_ERROR;
use crate::watermark_index::WatermarkIndex;

const MET_COMPUTE_NAME: &str = "consumer_group_lags_compute_time_seconds";
const MET_COMPUTE_HELP: &str =
    "Time (s) taken to fetch offsets and watermarks, and compute lag of requested consumer groups";
const MET_ERRORS_NAME: &str = "consumer_group_lags_errors_total";
const MET_ERRORS_HELP: &str = "Failed consumer group lags computations, by kind of error";

/// Computes the Lag of Consumer Groups, on demand, fetching the necessary data via a [`KafkaClient`].
///
/// Every computation is a self-contained snapshot: nothing is kept between calls.
pub struct ConsumerGroupLagService<C: KafkaClient> {
    client: C,
    group_filter: Option<Regex>,

    // Prometheus Metrics
    metric_compute: Histogram,
    metric_errors: IntCounterVec,
}

pub fn init<C: KafkaClient>(
    client: C,
    group_filter: Option<Regex>,
    metrics: Arc<Registry>,
) -> ConsumerGroupLagService<C> {
    let cgl_svc = ConsumerGroupLagService::new(client, group_filter, metrics);

    debug!("Initialized");
    cgl_svc
}

impl<C: KafkaClient> ConsumerGroupLagService<C> {
    /// Creates a new [`ConsumerGroupLagService`].
    ///
    /// # Arguments
    ///
    /// * `client` - [`KafkaClient`] to fetch committed offsets, partitions and watermarks with
    /// * `group_filter` - When discovering Consumer Groups, only the ones matching this are kept
    /// * `metrics` - [`Registry`] where to register internal metrics
    pub fn new(client: C, group_filter: Option<Regex>, metrics: Arc<Registry>) -> Self {
        Self {
            client,
            group_filter,
            metric_compute: register_histogram_with_registry!(
                MET_COMPUTE_NAME,
                MET_COMPUTE_HELP,
                metrics
            )
            .unwrap_or_else(|e| panic!("Failed to create metric '{MET_COMPUTE_NAME}': {e}")),
            metric_errors: register_int_counter_vec_with_registry!(
                MET_ERRORS_NAME,
                MET_ERRORS_HELP,
                &[LABEL_ERROR],
                metrics
            )
            .unwrap_or_else(|e| panic!("Failed to create metric '{MET_ERRORS_NAME}': {e}")),
        }
    }

    /// Computes the [`ConsumerGroupLag`] of each of the given `groups`, indexed by group.
    ///
    /// Either all groups are reported, or an error is returned: there is no partial result.
    /// If `shutdown_token` is cancelled before the computation is complete, it fails with [`LagError::Cancelled`].
    ///
    /// # Arguments
    ///
    /// * `groups` - Consumer Groups to compute the lag of
    /// * `shutdown_token` - A [`CancellationToken`] that, when cancelled, interrupts the computation
    pub async fn get_consumer_group_lags(
        &self,
        groups: &[String],
        shutdown_token: &CancellationToken,
    ) -> LagResult<HashMap<String, ConsumerGroupLag>> {
        let timer = self.metric_compute.start_timer();

        let res = tokio::select! {
            biased;

            _ = shutdown_token.cancelled() => {
                warn!("Received shutdown signal before consumer group lags were computed");
                Err(LagError::Cancelled)
            },
            res = self.compute(groups) => res,
        };

        match &res {
            Ok(lags) => {
                timer.observe_duration();
                debug!("Computed lag of {} consumer groups", lags.len());
            },
            Err(e) => {
                timer.stop_and_discard();
                self.metric_errors.with_label_values(&[e.kind()]).inc();
                error!("Failed to compute consumer group lags: {e}");
            },
        }

        res
    }

    async fn compute(&self, groups: &[String]) -> LagResult<HashMap<String, ConsumerGroupLag>> {
        // 1. Fetch the committed offsets of all the groups at once
        let group_set = groups.iter().cloned().collect::<HashSet<String>>();
        let raw_offsets = self
            .client
            .list_consumer_group_offsets_bulk(&group_set)
            .await
            .map_err(LagError::BulkOffsetFetch)?;
        let offsets = OffsetIndex::normalize(raw_offsets);
        trace!("Fetched committed offsets of {} groups", offsets.groups_count());

        // 2. Fetch the watermarks of all the partitions of the topics the groups have committed offsets for
        let watermarks = WatermarkIndex::collect(&self.client, &offsets.topics()).await?;
        trace!("Collected watermarks of {} topics", watermarks.topics_count());

        // 3. Join offsets and watermarks
        compute_lags(groups, &offsets, &watermarks)
    }

    /// Lists the Consumer Groups known to the cluster, keeping only the ones that match the group filter, if any.
    pub async fn list_groups(&self) -> LagResult<Vec<String>> {
        let mut groups = self.client.list_groups().await.map_err(|e| {
            let err = LagError::GroupList(e);
            self.metric_errors.with_label_values(&[err.kind()]).inc();
            error!("{err}");
            err
        })?;

        if let Some(filter) = &self.group_filter {
            groups.retain(|g| filter.is_match(g));
        }
        groups.sort();

        trace!("Listed {} consumer groups", groups.len());
        Ok(groups)
    }

    /// Returns the given `groups`, or all the ones known to the cluster (see [`Self::list_groups`]) if empty.
    ///
    /// If `shutdown_token` is cancelled while groups are being listed, it fails with [`LagError::Cancelled`].
    pub async fn resolve_groups(
        &self,
        groups: &[String],
        shutdown_token: &CancellationToken,
    ) -> LagResult<Vec<String>> {
        if !groups.is_empty() {
            return Ok(groups.to_vec());
        }

        tokio::select! {
            biased;

            _ = shutdown_token.cancelled() => {
                warn!("Received shutdown signal before consumer groups were listed");
                self.metric_errors.with_label_values(&[LagError::Cancelled.kind()]).inc();
                Err(LagError::Cancelled)
            },
            res = self.list_groups() => res,
        }
    }
}
