//! Network Reachability Probe
//!
//! Diagnoses node-to-coordinator connectivity from the node's point of view.
//!
//! ## Steps
//! 1. Enumerate local interface addresses (informational).
//! 2. Resolve the reverse-proxy hostname, URL scheme stripped.
//! 3. Connect to the proxy under a scoped default timeout (`timeout::ScopedTimeout`), and
//!    classify the outcome as one `ProxyStatus`.
//! 4. UDP connect-check towards a well-known external address.
//! 5. HTTP request to a well-known external host, bounded.
//! 6. Sleep for the requested duration.
//!
//! Every step is isolated: a failure degrades to `false` or a status code in the report and
//! never stops the remaining steps. The report always carries every field.

pub mod checks;
pub mod timeout;
pub mod types;

pub use types::{InterfaceAddress, ProbeReport, ProbeSettings, ProxyStatus};

/// Runs all steps and returns the combined report.
pub async fn run_probe(settings: &ProbeSettings) -> ProbeReport {
    let interfaces = checks::local_interfaces();
    tracing::debug!(count = interfaces.len(), "Enumerated interfaces");

    let hostname = settings.proxy.hostname();
    let (proxy_addresses, proxy_status, proxy_detail) =
        match checks::resolve_host(hostname, settings.proxy.port, settings.connect_timeout).await {
            Ok(addresses) => {
                tracing::debug!(host = hostname, resolved = ?addresses, "Resolved proxy");
                let (status, detail) =
                    checks::check_proxy_connection(&addresses, settings.connect_timeout).await;
                let ips = addresses.iter().map(|address| address.ip()).collect();
                (ips, status, detail)
            }
            Err(reason) => {
                tracing::debug!(host = hostname, "Proxy hostname did not resolve: {}", reason);
                (Vec::new(), ProxyStatus::DnsUnresolved, reason)
            }
        };
    tracing::debug!(status = ?proxy_status, "Proxy check finished");

    let external_dns_reachable = checks::check_udp_egress(&settings.udp_target, settings.connect_timeout).await;
    tracing::debug!(external_dns_reachable, "UDP egress check finished");

    let http_connection_test_passed = checks::check_http(&settings.http_target, settings.http_timeout).await;
    tracing::debug!(http_connection_test_passed, "HTTP check finished");

    if !settings.sleep.is_zero() {
        tokio::time::sleep(settings.sleep).await;
    }

    let report = ProbeReport {
        interfaces,
        proxy: settings.proxy.display_address(),
        proxy_addresses,
        proxy_reachable: proxy_status.is_reachable(),
        proxy_status,
        proxy_detail,
        external_dns_reachable,
        http_connection_test_passed,
        slept_seconds: settings.sleep.as_secs_f64(),
    };

    tracing::info!(
        proxy = %report.proxy,
        proxy_reachable = report.proxy_reachable,
        external_dns_reachable = report.external_dns_reachable,
        http_connection_test_passed = report.http_connection_test_passed,
        "Reachability probe finished"
    );
    report
}
