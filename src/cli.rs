use std::net::{IpAddr, SocketAddr};

use clap::{ArgGroup, Parser};
use rdkafka::ClientConfig;
use regex::Regex;
use tokio::time::Duration;

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT};

/// Command Line Interface, defined via the declarative,
/// `derive` based functionality of the `clap` crate.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("logging_flags")
        .required(false)
        .multiple(false)
        .args(["verbose", "quiet"]),
))]
pub struct Cli {
    // ------------------------------------------------------------------ Admin Client configuration
    /// Initial Kafka Brokers to connect to (format: 'HOST:PORT,...').
    ///
    /// Equivalent to '--kafka-conf=bootstrap.servers:host:port,...'.
    #[arg(short, long = "brokers", value_name = "BOOTSTRAP_BROKERS")]
    pub bootstrap_brokers: String,

    /// Client identifier used by the internal Kafka Clients.
    ///
    /// Equivalent to '--kafka-conf=client.id:my-client-id'.
    #[arg(long = "client-id", value_name = "CLIENT_ID", default_value = env!("CARGO_PKG_NAME"))]
    pub client_id: String,

    /// Additional configuration used by the internal Kafka Clients (format: 'CONF_KEY:CONF_VAL').
    ///
    /// To set multiple configurations keys, use this argument multiple times.
    /// See: https://github.com/edenhill/librdkafka/blob/master/CONFIGURATION.md.
    #[arg(
        long = "kafka-conf",
        value_name = "CONF_KEY:CONF_VAL",
        value_parser = kv_clap_value_parser,
        verbatim_doc_comment
    )]
    pub kafka_config: Vec<KVPair>,

    /// Override identifier of the monitored Kafka Cluster.
    ///
    /// If set, it replaces the value `cluster.id` from the Brokers' configuration.
    /// This can be useful when `cluster.id` is not actually set.
    #[arg(long = "cluster-id", value_name = "CLUSTER_ID")]
    pub cluster_id: Option<String>,

    /// How long to wait (in seconds) for every request to the Kafka cluster.
    #[arg(long = "fetch-timeout", value_name = "SECONDS", default_value = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    // ---------------------------------------------------------------------------- Consumer Groups
    /// Consumer Group to compute the lag of.
    ///
    /// To compute the lag of multiple groups, use this argument multiple times.
    /// If not set, all the groups known to the cluster are used (see '--group-regex').
    #[arg(short, long = "group", value_name = "GROUP", verbatim_doc_comment)]
    pub groups: Vec<String>,

    /// Regular expression that discovered Consumer Groups have to match.
    ///
    /// Only applies when no '--group' is given.
    #[arg(long = "group-regex", value_name = "REGEX", value_parser = regex_clap_value_parser)]
    pub group_regex: Option<Regex>,

    /// Compute the lag once, print it as JSON to stdout, then exit.
    ///
    /// If not set, the lag is served via HTTP, computed on every request.
    #[arg(long, verbatim_doc_comment)]
    pub once: bool,

    // --------------------------------------------------------------------------------------- HTTP
    /// Host address to listen on for HTTP requests.
    ///
    /// Supports both IPv4 and IPv6 addresses.
    #[arg(long, default_value = DEFAULT_HTTP_HOST, verbatim_doc_comment)]
    pub host: IpAddr,

    /// Port to listen on for HTTP requests.
    #[arg(long, default_value = DEFAULT_HTTP_PORT, verbatim_doc_comment)]
    pub port: u16,

    // ------------------------------------------------------------------------------------ Logging
    /// Verbose logging.
    ///
    /// * none    = 'WARN'
    /// * '-v'    = 'INFO'
    /// * '-vv'   = 'DEBUG'
    /// * '-vvv'  = 'TRACE'
    ///
    /// Alternatively, set environment variable 'KLAG_LOG=(ERROR|WARN|INFO|DEBUG|TRACE|OFF)'.
    #[arg(short, long, action = clap::ArgAction::Count, verbatim_doc_comment)]
    pub verbose: u8,

    /// Quiet logging.
    ///
    /// * none    = 'WARN'
    /// * '-q'    = 'ERROR'
    /// * '-qq'   = 'OFF'
    ///
    /// Alternatively, set environment variable 'KLAG_LOG=(ERROR|WARN|INFO|DEBUG|TRACE|OFF)'.
    #[arg(short, long, action = clap::ArgAction::Count, verbatim_doc_comment)]
    pub quiet: u8,
}

impl Cli {
    pub fn parse_and_validate() -> Self {
        Self::parse()
    }

    pub fn verbosity_level(&self) -> i8 {
        self.verbose as i8 - self.quiet as i8
    }

    pub fn listen_on(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn build_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.bootstrap_brokers.clone())
            .set("client.id", self.client_id.clone());
        for cfg in &self.kafka_config {
            config.set(cfg.0.clone(), cfg.1.clone());
        }

        trace!("Created:\n{:#?}", config);
        config
    }
}

/// A simple (key,value) pair of `String`s, useful to be parsed from arguments via [`kv_clap_value_parser`].
pub type KVPair = (String, String);

/// To be used as [`clap::value_parser`] function to create [`KVPair`] values.
fn kv_clap_value_parser(kv: &str) -> Result<KVPair, String> {
    let (k, v) = match kv.split_once(':') {
        None => {
            return Err("Should have 'K:V' format".to_string());
        },
        Some((k, v)) => (k, v),
    };

    Ok((k.to_string(), v.to_string()))
}

fn regex_clap_value_parser(re: &str) -> Result<Regex, String> {
    Regex::new(re).map_err(|e| format!("Invalid regular expression {re}: {e}"))
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::{kv_clap_value_parser, regex_clap_value_parser, Cli};

    #[test]
    fn should_parse_kv() {
        assert_eq!(
            kv_clap_value_parser("security.protocol:SASL_SSL"),
            Ok(("security.protocol".to_string(), "SASL_SSL".to_string()))
        );
        assert_eq!(
            kv_clap_value_parser("bootstrap.servers:host:9092"),
            Ok(("bootstrap.servers".to_string(), "host:9092".to_string()))
        );
        assert!(kv_clap_value_parser("no-separator").is_err());
    }

    #[test]
    fn should_parse_regex() {
        assert!(regex_clap_value_parser("^billing-.*$").unwrap().is_match("billing-a"));
        assert!(regex_clap_value_parser("(unclosed").is_err());
    }

    #[test]
    fn should_parse_args() {
        let cli = Cli::try_parse_from([
            "klag",
            "-b",
            "localhost:9092",
            "-g",
            "g1",
            "--group",
            "g2",
            "--kafka-conf",
            "fetch.wait.max.ms:100",
            "--fetch-timeout",
            "3",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.groups, vec!["g1", "g2"]);
        assert_eq!(cli.fetch_timeout().as_secs(), 3);
        assert_eq!(cli.verbosity_level(), 2);
        assert!(!cli.once);

        let config = cli.build_client_config();
        assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(config.get("client.id"), Some(env!("CARGO_PKG_NAME")));
        assert_eq!(config.get("fetch.wait.max.ms"), Some("100"));
    }

    #[test]
    fn should_reject_verbose_and_quiet_together() {
        assert!(Cli::try_parse_from(["klag", "-b", "localhost:9092", "-v", "-q"]).is_err());
    }
}
