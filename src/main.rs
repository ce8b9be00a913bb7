#[macro_use]
extern crate log;

mod cli;
mod constants;
mod errors;
mod http;
mod kafka_client;
mod kafka_types;
mod lag_aggregator;
mod lag_report;
mod lag_service;
mod logging;
mod offset_index;
mod prometheus_metrics;
mod watermark_index;

use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cli::Cli;
use constants::DEFAULT_CLUSTER_ID;
use kafka_client::RdKafkaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = parse_cli_and_init_logging();

    let shutdown_token = build_shutdown_token();

    let client = match RdKafkaClient::new(cli.build_client_config(), cli.fetch_timeout()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Kafka client: {e}");
            std::process::exit(exit_code::CONFIG_ERROR);
        },
    };

    // Procure the Cluster ID once: it labels all the metrics
    let cluster_id = match &cli.cluster_id {
        Some(cid) => cid.clone(),
        None => client.fetch_cluster_id().unwrap_or_else(|| DEFAULT_CLUSTER_ID.to_string()),
    };
    let metrics = Arc::new(prometheus_metrics::init(cluster_id.clone()));

    let cgl_svc = Arc::new(lag_service::init(client, cli.group_regex.clone(), metrics.clone()));

    if cli.once {
        let groups = match cgl_svc.resolve_groups(&cli.groups, &shutdown_token).await {
            Ok(g) => g,
            Err(_) => std::process::exit(exit_code::SERVICE_UNAVAILABLE),
        };

        match cgl_svc.get_consumer_group_lags(&groups, &shutdown_token).await {
            Ok(lags) => println!("{}", serde_json::to_string_pretty(&lags)?),
            Err(_) => std::process::exit(exit_code::SERVICE_UNAVAILABLE),
        }

        return Ok(());
    }

    http::init(cli.listen_on(), cluster_id, cgl_svc, cli.groups.clone(), shutdown_token, metrics)
        .await;

    Ok(())
}

fn parse_cli_and_init_logging() -> Cli {
    // Parse command line input and initialize logging
    let cli = Cli::parse_and_validate();
    logging::init(cli.verbosity_level());

    trace!("Created:\n{:#?}", cli);

    cli
}

fn build_shutdown_token() -> CancellationToken {
    let shutdown_token = CancellationToken::new();

    // Setup shutdown signal handler:
    // when it's time to shutdown, cancels the token, so that all clones of it are notified.
    //
    // NOTE: This handler will be listening on its own dedicated thread.
    let shutdown_token_clone = shutdown_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Shutting down...");
        shutdown_token_clone.cancel();
    }) {
        error!("Failed to register signal handler: {e}");
    }

    // Return a token so we can notify other parts of the system.
    shutdown_token
}
