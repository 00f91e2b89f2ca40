//! Static host table resolver.

use super::{
    feature::{Feature, FeatureState},
    resolve::{precheck, qualify, DnsClient, IpOption, Name, Resolving},
};
use crate::{
    base::neterror::NetError,
    config::{Address, StringList},
};
use futures::{future, FutureExt};
use std::{collections::HashMap, fmt, io, net::IpAddr, sync::Arc};

/// DNS client answering from a fixed host table.
///
/// Names in the table are authoritative: if an entry exists but none of its
/// addresses match the requested families, the lookup fails with
/// [`NetError::NoQualifyingAddress`] instead of asking the fallback. Names
/// missing from the table go to the fallback client, if one is set.
///
/// Useful for:
/// - Testing without real DNS
/// - Forcing specific IPs for certain domains
/// - The `hosts` section of a DNS configuration
///
/// # Example
///
/// ```rust,ignore
/// use proxyconf::dns::{GaiResolver, StaticResolver};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let mut hosts = HashMap::new();
/// hosts.insert("api.local".to_string(), vec!["127.0.0.1".parse().unwrap()]);
///
/// let resolver = StaticResolver::new(hosts).with_fallback(Arc::new(GaiResolver::new()));
/// ```
pub struct StaticResolver {
    hosts: Arc<HashMap<String, Vec<IpAddr>>>,
    fallback: Option<Arc<dyn DnsClient>>,
    state: FeatureState,
}

impl StaticResolver {
    /// Creates a resolver from a table of host names to addresses.
    ///
    /// Host names are matched case-insensitively, ignoring a trailing dot.
    pub fn new(hosts: HashMap<String, Vec<IpAddr>>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|(host, addrs)| (Name::new(host).normalized(), addrs))
            .collect();
        Self {
            hosts: Arc::new(hosts),
            fallback: None,
            state: FeatureState::new(),
        }
    }

    /// Creates a resolver from a decoded `hosts` configuration section.
    ///
    /// Each value lists addresses for the host. Entries that are not IP
    /// literals are skipped with a warning, and a host left with no
    /// addresses is not added, so lookups for it reach the fallback.
    pub fn from_hosts_config(hosts: &HashMap<String, StringList>) -> Self {
        let table = hosts
            .iter()
            .filter_map(|(host, entries)| {
                let addrs: Vec<IpAddr> = entries
                    .iter()
                    .filter_map(|entry| {
                        let ip = Address::parse(entry).ip();
                        if ip.is_none() {
                            tracing::warn!(
                                host = %host,
                                entry = %entry,
                                "ignoring non-IP host entry"
                            );
                        }
                        ip
                    })
                    .collect();
                if addrs.is_empty() {
                    tracing::warn!(host = %host, "no IP entries for host, using fallback");
                    return None;
                }
                Some((host.clone(), addrs))
            })
            .collect();
        Self::new(table)
    }

    /// Set the client used for names missing from the table.
    pub fn with_fallback(mut self, fallback: Arc<dyn DnsClient>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Returns the number of configured hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Answers from the table. `Ok(None)` means the name is not in it.
    fn answer(&self, name: &Name, option: IpOption) -> Result<Option<Vec<IpAddr>>, NetError> {
        self.state.ensure_open()?;
        if let Some(ip) = precheck(name, option)? {
            return qualify(name, option, [ip]).map(Some);
        }
        match self.hosts.get(&name.normalized()) {
            Some(addrs) => qualify(name, option, addrs.iter().copied()).map(Some),
            None => Ok(None),
        }
    }
}

impl Feature for StaticResolver {
    fn type_name(&self) -> &'static str {
        "StaticResolver"
    }

    fn start(&self) -> Result<(), NetError> {
        self.state.start(self.type_name())
    }

    fn close(&self) -> Result<(), NetError> {
        self.state.close(self.type_name())
    }
}

impl DnsClient for StaticResolver {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving {
        match (self.answer(&name, option), &self.fallback) {
            (Ok(Some(addrs)), _) => future::ready(Ok(addrs)).boxed(),
            (Err(e), _) => future::ready(Err(e)).boxed(),
            // Fall back to inner client
            (Ok(None), Some(fallback)) => fallback.lookup_ip(name, option),
            (Ok(None), None) => {
                let err = NetError::dns_failed(
                    name.as_str(),
                    io::Error::new(io::ErrorKind::NotFound, "no such host in static table"),
                );
                future::ready(Err(err)).boxed()
            }
        }
    }
}

impl fmt::Debug for StaticResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticResolver")
            .field("host_count", &self.hosts.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}
