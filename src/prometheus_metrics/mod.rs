pub mod bespoke;

use std::collections::HashMap;

use prometheus::Registry;

pub const NAMESPACE: &str = "klag";

pub const LABEL_CLUSTER_ID: &str = "cluster_id";
pub const LABEL_GROUP: &str = "group";
pub const LABEL_TOPIC: &str = "topic";
pub const LABEL_PARTITION: &str = "partition";
pub const LABEL_ERROR: &str = "error";

/// Creates the [`Registry`] for the internal metrics of the service.
///
/// All metrics are namespaced with [`NAMESPACE`], and labelled with the given `cluster_id`.
pub fn init(cluster_id: String) -> Registry {
    let prom_def_labels = HashMap::from([(LABEL_CLUSTER_ID.to_string(), cluster_id)]);

    info!("Prometheus Metrics default labels:\n{:#?}", prom_def_labels);

    Registry::new_custom(Some(NAMESPACE.to_string()), Some(prom_def_labels))
        .expect("Unable to create a Prometheus Metrics Registry")
}
