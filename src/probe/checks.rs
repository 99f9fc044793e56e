//! Individual probe steps. None of them returns an error: each degrades to a value.

use super::timeout::{self, ScopedTimeout};
use super::types::{InterfaceAddress, ProxyStatus};

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;

pub fn local_interfaces() -> Vec<InterfaceAddress> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .map(|interface| InterfaceAddress {
                address: interface.ip(),
                name: interface.name,
            })
            .collect(),
        Err(e) => {
            tracing::debug!("Could not enumerate interfaces: {}", e);
            Vec::new()
        }
    }
}

/// Resolves `host:port`, bounded by `limit`. An empty answer counts as a failure.
pub async fn resolve_host(host: &str, port: u16, limit: Duration) -> Result<Vec<SocketAddr>, String> {
    if host.is_empty() {
        return Err("empty hostname".to_string());
    }
    match tokio::time::timeout(limit, tokio::net::lookup_host((host, port))).await {
        Ok(Ok(addresses)) => {
            let addresses: Vec<SocketAddr> = addresses.collect();
            if addresses.is_empty() {
                Err(format!("'{}' resolved to no addresses", host))
            } else {
                Ok(addresses)
            }
        }
        Ok(Err(e)) => Err(format!("cannot resolve '{}': {}", host, e)),
        Err(_) => Err(format!("resolving '{}' timed out", host)),
    }
}

/// Tries each resolved address in turn under a scoped default timeout.
pub async fn check_proxy_connection(addresses: &[SocketAddr], limit: Duration) -> (ProxyStatus, String) {
    let _scope = ScopedTimeout::acquire(limit).await;

    let mut outcome = (ProxyStatus::OtherError, "no address to connect to".to_string());
    for address in addresses {
        match timeout::connect(*address).await {
            Ok(_) => return (ProxyStatus::Reachable, format!("connected to {}", address)),
            Err(e) => {
                tracing::debug!(%address, "Proxy connect failed: {}", e);
                outcome = (classify(&e), e.to_string());
            }
        }
    }
    outcome
}

pub fn classify(error: &io::Error) -> ProxyStatus {
    match error.kind() {
        io::ErrorKind::ConnectionRefused => ProxyStatus::ConnectionRefused,
        io::ErrorKind::TimedOut => ProxyStatus::Timeout,
        _ => ProxyStatus::OtherError,
    }
}

/// A UDP `connect` only needs a route to the target, no packet is sent.
pub async fn check_udp_egress(target: &str, limit: Duration) -> bool {
    let address = match tokio::time::timeout(limit, tokio::net::lookup_host(target)).await {
        Ok(Ok(mut addresses)) => match addresses.next() {
            Some(address) => address,
            None => return false,
        },
        _ => return false,
    };

    let bind: SocketAddr = if address.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    match UdpSocket::bind(bind).await {
        Ok(socket) => match socket.connect(address).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%address, "UDP connect failed: {}", e);
                false
            }
        },
        Err(e) => {
            tracing::debug!("UDP bind failed: {}", e);
            false
        }
    }
}

/// Any HTTP response counts as reachable, whatever its status.
pub async fn check_http(url: &str, limit: Duration) -> bool {
    let client = match reqwest::Client::builder().timeout(limit).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::debug!("HTTP client setup failed: {}", e);
            return false;
        }
    };

    match client.head(url).send().await {
        Ok(response) => {
            tracing::debug!(url, status = %response.status(), "HTTP check answered");
            true
        }
        Err(e) => {
            tracing::debug!(url, "HTTP check failed: {}", e);
            false
        }
    }
}
