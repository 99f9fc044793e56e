//! CLI argument parsing using clap
//!
//! Every option can also be supplied through the environment variable named in its
//! `env` attribute; a `.env` file is loaded before parsing.

use super::{DEFAULT_PROXY_HOST, DEFAULT_PROXY_PORT, ProxyConfig};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;

/// Scatter-gather federated computation
#[derive(Parser, Debug)]
#[command(name = "federated-cluster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the task queue server
    Serve(ServeArgs),
    /// Run a data node that executes partial jobs for one organization
    Node(NodeArgs),
    /// Compute the federated average of a column across organizations
    Average(AverageArgs),
    /// Run the network reachability probe locally and print the report
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address the queue server listens on
    #[arg(long, env = "FEDERATION_BIND", default_value = "127.0.0.1:7600")]
    pub bind: SocketAddr,

    /// Comma-separated organization ids taking part in the collaboration (e.g. "2,3,4")
    #[arg(long, env = "FEDERATION_ORGANIZATIONS")]
    pub organizations: String,

    /// Comma-separated session ids tasks may be bound to
    #[arg(long, env = "FEDERATION_SESSIONS", default_value = "")]
    pub sessions: String,
}

#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Base URL of the queue server
    #[arg(long, env = "FEDERATION_QUEUE_URL", default_value = "http://127.0.0.1:7600")]
    pub queue_url: String,

    /// Organization this node executes runs for
    #[arg(long, env = "FEDERATION_ORGANIZATION")]
    pub organization: u64,

    /// Databases as `label=uri` (a bare uri is labelled `default`)
    #[arg(long = "database", env = "FEDERATION_DATABASES", value_delimiter = ',')]
    pub databases: Vec<String>,

    /// Number of concurrent workers
    #[arg(long, env = "FEDERATION_WORKERS", default_value = "2")]
    pub workers: usize,

    #[command(flatten)]
    pub proxy: ProxyArgs,
}

#[derive(Args, Debug)]
pub struct AverageArgs {
    /// Base URL of the queue server
    #[arg(long, env = "FEDERATION_QUEUE_URL", default_value = "http://127.0.0.1:7600")]
    pub queue_url: String,

    /// Column to average
    #[arg(long)]
    pub column: String,

    /// Comma-separated target organizations (default: every organization)
    #[arg(long)]
    pub organizations: Option<String>,

    /// Session the task is bound to
    #[arg(long)]
    pub session: Option<String>,

    /// Database label on the nodes
    #[arg(long)]
    pub database: Option<String>,

    /// Give up waiting after this many seconds (default: wait indefinitely)
    #[arg(long)]
    pub max_wait_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub proxy: ProxyArgs,

    /// Seconds to sleep before reporting
    #[arg(long, default_value = "0")]
    pub sleep_secs: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ProxyArgs {
    /// Reverse proxy host, with or without URL scheme
    #[arg(long, env = "PROXY_HOST", default_value = DEFAULT_PROXY_HOST)]
    pub proxy_host: String,

    /// Reverse proxy port
    #[arg(long, env = "PROXY_PORT", default_value_t = DEFAULT_PROXY_PORT)]
    pub proxy_port: u16,
}

impl From<ProxyArgs> for ProxyConfig {
    fn from(args: ProxyArgs) -> Self {
        ProxyConfig::new(args.proxy_host, args.proxy_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_command() {
        let cli = Cli::try_parse_from([
            "federated-cluster",
            "node",
            "--organization",
            "3",
            "--database",
            "a=one.csv,b=two.csv",
            "--proxy-host",
            "http://proxyserver",
        ])
        .unwrap();

        match cli.command {
            Command::Node(args) => {
                assert_eq!(args.organization, 3);
                assert_eq!(args.databases, vec!["a=one.csv", "b=two.csv"]);
                let proxy: ProxyConfig = args.proxy.into();
                assert_eq!(proxy.hostname(), "proxyserver");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_average_requires_column() {
        assert!(Cli::try_parse_from(["federated-cluster", "average"]).is_err());
    }
}
