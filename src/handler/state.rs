use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::HeaderValue;

use super::allowlist::Allowlist;
use crate::config::ProxyConfig;

#[derive(Clone)]
pub(crate) struct ProxyState {
    pub(crate) allowlist: Arc<Allowlist>,
    pub(crate) default_user_agent: HeaderValue,
    pub(crate) upstream_timeout: Duration,
    pub(crate) http_client: reqwest::Client,
}

impl ProxyState {
    pub(crate) fn from_config(config: &ProxyConfig) -> Result<Self> {
        Ok(ProxyState {
            allowlist: Arc::new(Allowlist::new(&config.allowed_hosts)),
            default_user_agent: HeaderValue::from_str(&config.default_user_agent)?,
            upstream_timeout: config.upstream_timeout(),
            http_client: http_client(config)?,
        })
    }
}

fn http_client(config: &ProxyConfig) -> Result<reqwest::Client> {
    let http_client = reqwest::Client::builder()
        .https_only(config.https_only)
        // Redirects are followed by hand so every hop is re-checked against the allowlist.
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(config.upstream_timeout())
        .build()?;
    Ok(http_client)
}
