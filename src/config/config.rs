use anyhow::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

const fn _default_proxy_port() -> u16 { 8080 }
const fn _default_metrics_port() -> u16 { 8081 }
const fn _default_upstream_timeout_secs() -> u64 { 30 }
const fn _default_https_only() -> bool { false }

fn _default_listen_address() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn _default_user_agent() -> String {
    "Balloon-Radar-Proxy".to_string()
}

fn _default_allowed_hosts() -> Vec<String> {
    [
        "a.windbornesystems.com",
        // a.windbornesystems.com redirects here.
        "www.windbornesystems.com",
        "www.gdacs.org",
        "climateapi.scottpinkelman.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct ProxyConfig {
    #[serde(default = "_default_listen_address")]
    pub(crate) listen_address: IpAddr,
    #[serde(default = "_default_proxy_port")]
    pub(crate) proxy_port: u16,
    #[serde(default = "_default_metrics_port")]
    pub(crate) metrics_port: u16,
    #[serde(default = "_default_allowed_hosts")]
    pub(crate) allowed_hosts: Vec<String>,
    #[serde(default = "_default_user_agent")]
    pub(crate) default_user_agent: String,
    #[serde(default = "_default_upstream_timeout_secs")]
    pub(crate) upstream_timeout_secs: u64,
    #[serde(default = "_default_https_only")]
    pub(crate) https_only: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_address: _default_listen_address(),
            proxy_port: _default_proxy_port(),
            metrics_port: _default_metrics_port(),
            allowed_hosts: _default_allowed_hosts(),
            default_user_agent: _default_user_agent(),
            upstream_timeout_secs: _default_upstream_timeout_secs(),
            https_only: _default_https_only(),
        }
    }
}

impl ProxyConfig {
    pub(crate) fn from_file(path: &str) -> Result<Self> {
        Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub(crate) fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.allowed_hosts.is_empty(), "allowed_hosts must not be empty.");
        for host in &self.allowed_hosts {
            if !is_bare_hostname(host) {
                return Err(Error::msg(format!(
                    "Allowed host \"{host}\" must be a bare hostname without scheme, port or path."
                )));
            }
        }
        anyhow::ensure!(
            self.upstream_timeout_secs > 0,
            "upstream_timeout_secs must be greater than zero."
        );
        anyhow::ensure!(
            self.proxy_port != self.metrics_port,
            "proxy_port and metrics_port must differ (both are {}).",
            self.proxy_port
        );
        anyhow::ensure!(
            reqwest::header::HeaderValue::from_str(&self.default_user_agent).is_ok(),
            "default_user_agent is not a valid header value."
        );
        Ok(())
    }
}

fn is_bare_hostname(host: &str) -> bool {
    !host.is_empty()
        && !host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '?' | '#' | '@'))
}
