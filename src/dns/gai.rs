//! System DNS resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native DNS resolution via
//! `getaddrinfo`, executed in a thread pool to avoid blocking the async runtime.
//!
//! # When to Use
//!
//! - When you need to respect system DNS configuration (/etc/resolv.conf, /etc/hosts)
//! - When DoH/DoT is not required
//! - As a fallback when hickory-dns is not available

use super::{
    feature::{Feature, FeatureState},
    resolve::{
        lookup_with_timeout, precheck, qualify, DnsClient, IpOption, Name, Resolving,
        DEFAULT_LOOKUP_TIMEOUT,
    },
};
use crate::base::{context::IoResultExt, neterror::NetError};
use std::{net::ToSocketAddrs, sync::Arc, time::Duration};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// `fake_enable` is ignored; answers are always real. Clones share the
/// lifecycle state.
///
/// # Performance
///
/// Each resolution spawns a blocking task. For high-throughput scenarios,
/// consider using `HickoryResolver` which is fully async. A timed out
/// lookup stops waiting, but the blocking `getaddrinfo` call runs to
/// completion on its thread.
#[derive(Clone, Debug)]
pub struct GaiResolver {
    timeout: Duration,
    state: Arc<FeatureState>,
}

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
            state: Arc::new(FeatureState::new()),
        }
    }

    /// Set the per-lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for GaiResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for GaiResolver {
    fn type_name(&self) -> &'static str {
        "GaiResolver"
    }

    fn start(&self) -> Result<(), NetError> {
        self.state.start(self.type_name())
    }

    fn close(&self) -> Result<(), NetError> {
        self.state.close(self.type_name())
    }
}

impl DnsClient for GaiResolver {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving {
        let state = self.state.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            state.ensure_open()?;
            if let Some(ip) = precheck(&name, option)? {
                return qualify(&name, option, [ip]);
            }

            let host = name.as_str().to_string();
            let lookup = async {
                let result = tokio::task::spawn_blocking(move || {
                    tracing::debug!(host = %host, "resolving via getaddrinfo");
                    (host.as_str(), 0u16)
                        .to_socket_addrs()
                        .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<_>>())
                })
                .await;

                // Handle task join error (cancellation, panic)
                result
                    .map_err(|e| {
                        tracing::error!(error = %e, "DNS resolution task failed");
                        NetError::dns_failed(name.as_str(), std::io::Error::other(e.to_string()))
                    })?
                    .dns_context(name.as_str())
            };

            let addrs = lookup_with_timeout(&name, timeout, lookup).await?;
            let addrs = addrs.into_iter().filter(|ip| !ip.is_unspecified());
            let addrs = qualify(&name, option, addrs)?;
            tracing::debug!(domain = %name, count = addrs.len(), "DNS resolution complete");
            Ok(addrs)
        })
    }
}
