use crate::config::ProxyConfig;

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of the proxy connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyStatus {
    Reachable,
    DnsUnresolved,
    ConnectionRefused,
    Timeout,
    OtherError,
}

impl ProxyStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProxyStatus::Reachable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub name: String,
    pub address: IpAddr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub interfaces: Vec<InterfaceAddress>,
    /// `host:port` of the proxy, scheme removed.
    pub proxy: String,
    pub proxy_addresses: Vec<IpAddr>,
    pub proxy_reachable: bool,
    pub proxy_status: ProxyStatus,
    pub proxy_detail: String,
    pub external_dns_reachable: bool,
    pub http_connection_test_passed: bool,
    pub slept_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub proxy: ProxyConfig,
    pub connect_timeout: Duration,
    /// `host:port` used for the UDP egress check.
    pub udp_target: String,
    pub http_target: String,
    pub http_timeout: Duration,
    pub sleep: Duration,
}

impl ProbeSettings {
    pub fn new(proxy: ProxyConfig) -> Self {
        Self {
            proxy,
            connect_timeout: Duration::from_secs(5),
            udp_target: "8.8.8.8:53".to_string(),
            http_target: "http://www.google.com".to_string(),
            http_timeout: Duration::from_secs(5),
            sleep: Duration::ZERO,
        }
    }

    pub fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }
}
