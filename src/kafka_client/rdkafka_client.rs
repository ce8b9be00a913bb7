use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rdkafka::{
    admin::AdminClient,
    client::DefaultClientContext,
    consumer::{BaseConsumer, Consumer},
    ClientConfig, Offset, TopicPartitionList,
};
use tokio::{task, time::Duration};

use super::{KafkaClient, KafkaClientResult};
use crate::constants::CONSUMER_OFFSETS_TOPIC;
use crate::kafka_types::{OffsetFetchResponse, PartitionId, PartitionWatermarks, TopicPartition};

/// [`KafkaClient`] backed by `librdkafka`.
///
/// All the requests are blocking, and get executed via [`task::spawn_blocking`]:
/// each is bound by the `fetch_timeout` given at creation.
pub struct RdKafkaClient {
    client_config: ClientConfig,
    admin_client: Arc<AdminClient<DefaultClientContext>>,
    fetch_timeout: Duration,
}

impl RdKafkaClient {
    /// Creates a new [`RdKafkaClient`].
    ///
    /// # Arguments
    ///
    /// * `client_config` - Kafka client configuration, used for the Admin Client and for the per-group Consumers
    /// * `fetch_timeout` - How long to wait for every request to the cluster
    pub fn new(client_config: ClientConfig, fetch_timeout: Duration) -> KafkaClientResult<Self> {
        let admin_client: AdminClient<DefaultClientContext> = client_config.create()?;

        Ok(Self {
            client_config,
            admin_client: Arc::new(admin_client),
            fetch_timeout,
        })
    }

    /// Identifier of the Kafka cluster, defined as `cluster.id` in Brokers' configuration.
    ///
    /// This is a blocking call.
    pub fn fetch_cluster_id(&self) -> Option<String> {
        self.admin_client.inner().fetch_cluster_id(self.fetch_timeout)
    }
}

/// All the [`TopicPartition`]s currently in the cluster, minus the ones of the internal [`CONSUMER_OFFSETS_TOPIC`].
fn fetch_all_topic_partitions(
    admin_client: &AdminClient<DefaultClientContext>,
    timeout: Duration,
) -> KafkaClientResult<Vec<TopicPartition>> {
    let metadata = admin_client.inner().fetch_metadata(None, timeout)?;

    Ok(metadata
        .topics()
        .iter()
        .filter(|mt| is_tracked_topic(mt.name()))
        .flat_map(|mt| {
            mt.partitions().iter().map(move |mp| TopicPartition::new(mt.name().to_owned(), mp.id()))
        })
        .collect())
}

/// Whether committed offsets of consumer groups should be looked up for the given topic.
fn is_tracked_topic(topic: &str) -> bool {
    topic != CONSUMER_OFFSETS_TOPIC
}

/// Keeps only the partitions for which the group has actually committed an offset.
fn committed_to_offset_fetch_response(committed: &TopicPartitionList) -> OffsetFetchResponse {
    committed
        .elements()
        .iter()
        .filter_map(|elem| match elem.offset() {
            Offset::Offset(o) => {
                Some((TopicPartition::new(elem.topic().to_owned(), elem.partition()), o))
            },
            _ => None,
        })
        .collect()
}

#[async_trait]
impl KafkaClient for RdKafkaClient {
    async fn list_consumer_group_offsets_bulk(
        &self,
        groups: &HashSet<String>,
    ) -> KafkaClientResult<HashMap<String, OffsetFetchResponse>> {
        let admin_client = self.admin_client.clone();
        let client_config = self.client_config.clone();
        let timeout = self.fetch_timeout;
        let groups = groups.clone();

        task::spawn_blocking(move || -> KafkaClientResult<HashMap<String, OffsetFetchResponse>> {
            let mut tpl = TopicPartitionList::new();
            for tp in fetch_all_topic_partitions(&admin_client, timeout)? {
                tpl.add_partition(&tp.topic, tp.partition);
            }
            trace!("Fetching committed offsets of {} groups, for {} partitions", groups.len(), tpl.count());

            let mut res = HashMap::with_capacity(groups.len());
            for g in groups {
                // Committed offsets can only be requested by a Consumer that is part of the Group:
                // auto commit is disabled, so this Consumer will never alter them.
                let mut group_config = client_config.clone();
                group_config.set("group.id", &g).set("enable.auto.commit", "false");
                let consumer: BaseConsumer = group_config.create()?;

                let committed = consumer.committed_offsets(tpl.clone(), timeout)?;
                let ofr = committed_to_offset_fetch_response(&committed);
                debug!("Group '{}' has committed offsets for {} topics", g, ofr.blocks.len());

                res.insert(g, ofr);
            }

            Ok(res)
        })
        .await?
    }

    async fn list_partitions(&self, topic: &str) -> KafkaClientResult<Vec<PartitionId>> {
        let admin_client = self.admin_client.clone();
        let timeout = self.fetch_timeout;
        let topic = topic.to_owned();

        task::spawn_blocking(move || -> KafkaClientResult<Vec<PartitionId>> {
            let metadata = admin_client.inner().fetch_metadata(Some(topic.as_str()), timeout)?;

            let mt = metadata
                .topics()
                .iter()
                .find(|mt| mt.name() == topic)
                .ok_or_else(|| format!("Topic '{topic}' not found in cluster metadata"))?;

            if let Some(e) = mt.error() {
                return Err(format!("Topic '{topic}' metadata reports error: {e:?}").into());
            }

            Ok(mt.partitions().iter().map(|mp| mp.id()).collect())
        })
        .await?
    }

    async fn fetch_high_watermarks(
        &self,
        topic_partitions: &HashMap<String, Vec<PartitionId>>,
    ) -> KafkaClientResult<HashMap<String, PartitionWatermarks>> {
        let admin_client = self.admin_client.clone();
        let timeout = self.fetch_timeout;
        let topic_partitions = topic_partitions.clone();

        task::spawn_blocking(move || -> KafkaClientResult<HashMap<String, PartitionWatermarks>> {
            let mut res = HashMap::with_capacity(topic_partitions.len());

            for (t, partitions) in topic_partitions {
                let mut watermarks = PartitionWatermarks::with_capacity(partitions.len());
                for p in partitions {
                    let (_, high) = admin_client.inner().fetch_watermarks(&t, p, timeout)?;
                    watermarks.insert(p, high);
                }

                trace!("Fetched high watermarks of {} partitions of Topic '{}'", watermarks.len(), t);
                res.insert(t, watermarks);
            }

            Ok(res)
        })
        .await?
    }

    async fn list_groups(&self) -> KafkaClientResult<Vec<String>> {
        let admin_client = self.admin_client.clone();
        let timeout = self.fetch_timeout;

        task::spawn_blocking(move || -> KafkaClientResult<Vec<String>> {
            let gl = admin_client.inner().fetch_group_list(None, timeout)?;

            Ok(gl.groups().iter().map(|g| g.name().to_owned()).collect())
        })
        .await?
    }
}
