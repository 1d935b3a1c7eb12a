use std::collections::HashSet;
use url::Url;

use super::errors::ForwardError;

/// Hostnames the forwarder may contact. Built once at startup and shared
/// read-only between requests.
#[derive(Clone, Debug)]
pub(crate) struct Allowlist {
    hosts: HashSet<String>,
}

impl Allowlist {
    pub(crate) fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|host| host.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub(crate) fn permits_host(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    /// Ports and schemes are not part of the match.
    pub(crate) fn check(&self, url: &Url) -> Result<(), ForwardError> {
        let host = url.host_str().unwrap_or_default();
        match self.permits_host(host) {
            true => Ok(()),
            false => Err(ForwardError::HostNotAllowed(host.to_string())),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hosts.len()
    }
}
