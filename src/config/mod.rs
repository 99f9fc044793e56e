//! Configuration
//!
//! Command line and environment configuration for the three roles a process can take:
//! queue server, data node, and orchestrator. `cli` holds the clap definitions; this
//! module holds the parsed values the library consumes.

pub mod cli;

use crate::collaboration::types::{OrganizationId, SessionId};
use crate::error::FederationError;
use std::collections::BTreeMap;

pub const DEFAULT_PROXY_HOST: &str = "localhost";
pub const DEFAULT_PROXY_PORT: u16 = 7654;

/// Where the node reaches the coordinator's reverse proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Host as configured; may carry a URL scheme such as `http://`.
    pub host: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROXY_HOST.to_string(),
            port: DEFAULT_PROXY_PORT,
        }
    }
}

impl ProxyConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The host with any URL scheme prefix and trailing path removed, ready for DNS.
    pub fn hostname(&self) -> &str {
        strip_scheme(&self.host)
    }

    /// `host:port` as reported in probe results.
    pub fn display_address(&self) -> String {
        format!("{}:{}", self.hostname(), self.port)
    }
}

/// Removes a leading `scheme://` and anything after the first `/`.
pub fn strip_scheme(host: &str) -> &str {
    let host = host.trim();
    let without_scheme = match host.find("://") {
        Some(index) => &host[index + 3..],
        None => host,
    };
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
}

/// The databases a node can extract: label -> source locator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseCatalog {
    databases: BTreeMap<String, String>,
}

impl DatabaseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, uri: impl Into<String>) -> Self {
        self.databases.insert(label.into(), uri.into());
        self
    }

    /// Parses `label=uri` entries. A bare `uri` is registered under the label `default`.
    pub fn parse(entries: &[String]) -> Result<Self, String> {
        let mut catalog = Self::new();
        for entry in entries {
            let (label, uri) = match entry.split_once('=') {
                Some((label, uri)) => (label.trim(), uri.trim()),
                None => ("default", entry.trim()),
            };
            if label.is_empty() || uri.is_empty() {
                return Err(format!("invalid database entry '{}'", entry));
            }
            catalog.databases.insert(label.to_string(), uri.to_string());
        }
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.databases.keys().map(String::as_str).collect()
    }

    /// Picks the locator for `label`, or the only database when no label is given.
    pub fn resolve(&self, label: Option<&str>) -> Result<&str, FederationError> {
        match label {
            Some(label) => self
                .databases
                .get(label)
                .map(String::as_str)
                .ok_or_else(|| FederationError::Dataset(format!("no database labelled '{}'", label))),
            None => match self.databases.len() {
                1 => Ok(self.databases.values().next().map(String::as_str).unwrap_or_default()),
                0 => Err(FederationError::Dataset("node has no databases configured".to_string())),
                _ => Err(FederationError::Dataset(format!(
                    "task names no database and node has several: {}",
                    self.labels().join(", ")
                ))),
            },
        }
    }
}

/// Parses a comma separated organization list such as `2,3,4`.
pub fn parse_organizations(list: &str) -> Result<Vec<OrganizationId>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<OrganizationId>()
                .map_err(|e| format!("invalid organization id '{}': {}", part, e))
        })
        .collect()
}

/// Parses a comma separated session list.
pub fn parse_sessions(list: &str) -> Vec<SessionId> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| SessionId(part.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("http://proxyserver"), "proxyserver");
        assert_eq!(strip_scheme("https://proxy.example.org/api/"), "proxy.example.org");
        assert_eq!(strip_scheme("proxyserver"), "proxyserver");
        assert_eq!(strip_scheme("  10.0.0.1 "), "10.0.0.1");
    }

    #[test]
    fn test_proxy_display_address() {
        let proxy = ProxyConfig::new("http://proxyserver", 7654);

        assert_eq!(proxy.hostname(), "proxyserver");
        assert_eq!(proxy.display_address(), "proxyserver:7654");
    }

    #[test]
    fn test_catalog_resolution() {
        let single = DatabaseCatalog::parse(&["data/a.csv".to_string()]).unwrap();
        assert_eq!(single.resolve(None).unwrap(), "data/a.csv");
        assert_eq!(single.resolve(Some("default")).unwrap(), "data/a.csv");

        let multi =
            DatabaseCatalog::parse(&["a=data/a.csv".to_string(), "b=data/b.csv".to_string()])
                .unwrap();
        assert_eq!(multi.resolve(Some("b")).unwrap(), "data/b.csv");
        assert!(multi.resolve(None).is_err());
        assert!(multi.resolve(Some("c")).is_err());

        assert!(DatabaseCatalog::new().resolve(None).is_err());
        assert!(DatabaseCatalog::parse(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(
            parse_organizations("2, 3,4").unwrap(),
            vec![OrganizationId(2), OrganizationId(3), OrganizationId(4)]
        );
        assert!(parse_organizations("2,x").is_err());
        assert_eq!(parse_sessions("s1,,s2").len(), 2);
    }
}
