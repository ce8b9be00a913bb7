use std::collections::HashMap;
use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Registry, TextEncoder};
use serde::Deserialize;
use tokio::{net::TcpListener, time::Duration};
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

use crate::errors::LagError;
use crate::kafka_client::RdKafkaClient;
use crate::lag_report::{ConsumerGroupLag, TopicLag};
use crate::lag_service::ConsumerGroupLagService;
use crate::prometheus_metrics::bespoke;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct HttpServiceState {
    cluster_id: String,
    cgl_svc: Arc<ConsumerGroupLagService<RdKafkaClient>>,
    default_groups: Arc<Vec<String>>,
    shutdown_token: CancellationToken,
    metrics: Arc<Registry>,
}

impl HttpServiceState {
    /// Computes the lag of the `requested` groups or, if none, of the default ones.
    async fn get_consumer_group_lags(
        &self,
        requested: &[String],
    ) -> Result<HashMap<String, ConsumerGroupLag>, LagError> {
        let groups = if requested.is_empty() {
            self.cgl_svc.resolve_groups(&self.default_groups, &self.shutdown_token).await?
        } else {
            requested.to_vec()
        };

        self.cgl_svc.get_consumer_group_lags(&groups, &self.shutdown_token).await
    }
}

#[derive(Debug, Default, Deserialize)]
struct LagParams {
    /// Comma separated list of Consumer Groups.
    groups: Option<String>,
}

impl LagParams {
    fn groups(&self) -> Vec<String> {
        self.groups
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(String::from)
            .collect()
    }
}

pub async fn init(
    listen_on: SocketAddr,
    cluster_id: String,
    cgl_svc: Arc<ConsumerGroupLagService<RdKafkaClient>>,
    default_groups: Vec<String>,
    shutdown_token: CancellationToken,
    metrics: Arc<Registry>,
) {
    // Assemble the HTTP Service State object, that will be passed to the routes
    let state = HttpServiceState {
        cluster_id,
        cgl_svc,
        default_groups: Arc::new(default_groups),
        shutdown_token: shutdown_token.clone(),
        metrics,
    };

    // Setup Router
    let app = Router::new()
        .route("/", get(root))
        .route("/lag", get(consumer_group_lags))
        .route("/lag/:group/:topic", get(topic_lag))
        .route("/metrics", get(prometheus_metrics))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state);

    let listener = match TcpListener::bind(listen_on).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to listen on '{}': {}", listen_on, e);
            shutdown_token.cancel();
            return;
        },
    };

    // Setup Server, with Graceful Shutdown
    info!("Begin listening on '{}'...", listen_on);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await
    {
        error!("HTTP server terminated with error: {e}");
    }
}

async fn root() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

fn lag_error_response(e: LagError) -> (StatusCode, String) {
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
}

async fn consumer_group_lags(
    State(state): State<HttpServiceState>,
    Query(params): Query<LagParams>,
) -> Result<Json<HashMap<String, ConsumerGroupLag>>, (StatusCode, String)> {
    state.get_consumer_group_lags(&params.groups()).await.map(Json).map_err(lag_error_response)
}

async fn topic_lag(
    State(state): State<HttpServiceState>,
    Path((group, topic)): Path<(String, String)>,
) -> Result<Json<TopicLag>, (StatusCode, String)> {
    let mut lags = state
        .get_consumer_group_lags(&[group.clone()])
        .await
        .map_err(lag_error_response)?;

    lags.remove(&group)
        .and_then(|cgl| cgl.get_topic_lag(&topic).cloned())
        .map(Json)
        .ok_or_else(|| {
            (StatusCode::NOT_FOUND, format!("Group '{group}' has no committed offsets for Topic '{topic}'"))
        })
}

async fn prometheus_metrics(State(state): State<HttpServiceState>) -> impl IntoResponse {
    let mut status = StatusCode::OK;
    let mut headers = HeaderMap::new();

    // As defined by Prometheus: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#basic-info
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"));

    // Bespoke metrics are only omitted if the lag could not be computed: internal metrics will tell why
    let body = match state.get_consumer_group_lags(&[]).await {
        Ok(lags) => bespoke::render(&lags, &state.cluster_id),
        Err(e) => {
            warn!("Unable to generate consumer group lag metrics: {e}");
            Vec::new()
        },
    };

    // Turn the bespoke metrics created so far, into a String
    let mut body = body.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }

    // Append to the bespoke metrics, classic Prometheus Metrics
    let metrics_family = state.metrics.gather();
    if let Err(e) = TextEncoder.encode_utf8(&metrics_family, &mut body) {
        status = StatusCode::INTERNAL_SERVER_ERROR;
        body = format!("Failed to encode metrics: {e}");
    }

    (status, headers, body)
}
