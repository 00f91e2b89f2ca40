//! Async DNS resolver using hickory-dns.
//!
//! This resolver provides fully async DNS resolution with support for:
//! - DNS-over-HTTPS (DoH)
//! - DNS-over-TLS (DoT)
//! - System DNS configuration auto-detection
//! - Dual-stack (IPv4 + IPv6) lookup, filtered per call by [`IpOption`]
//!
//! # Performance
//!
//! Unlike `GaiResolver`, this resolver is fully async and doesn't require
//! spawning blocking tasks. It maintains connection pools to DNS servers
//! for better performance under load.

use super::{
    feature::{Feature, FeatureState},
    resolve::{
        lookup_with_timeout, precheck, qualify, DnsClient, IpOption, Name, Resolving,
        DEFAULT_LOOKUP_TIMEOUT,
    },
};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};

/// Async DNS resolver backed by hickory-dns.
///
/// The underlying resolver is lazily initialized on first use and shared
/// across all instances via a static `LazyLock`. It automatically configures
/// itself based on the system's DNS settings and always asks for both
/// families; answers are filtered afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use proxyconf::dns::{DnsClient, HickoryResolver, IpOption, Name};
///
/// let resolver = HickoryResolver::new();
/// let addrs = resolver.lookup_ip(Name::new("example.com"), IpOption::IPV4_ONLY).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: &'static LazyLock<TokioResolver>,
    timeout: Duration,
    state: Arc<FeatureState>,
}

impl HickoryResolver {
    /// Creates a new `HickoryResolver`.
    ///
    /// The underlying resolver is lazily initialized on first DNS query.
    /// It will attempt to read system DNS configuration; if that fails,
    /// it falls back to sensible defaults.
    pub fn new() -> Self {
        static RESOLVER: LazyLock<TokioResolver> = LazyLock::new(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };

            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

            builder.build()
        });

        Self {
            resolver: &RESOLVER,
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

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for HickoryResolver {
    fn type_name(&self) -> &'static str {
        "HickoryResolver"
    }

    fn start(&self) -> Result<(), NetError> {
        self.state.start(self.type_name())
    }

    fn close(&self) -> Result<(), NetError> {
        self.state.close(self.type_name())
    }
}

impl DnsClient for HickoryResolver {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            resolver.state.ensure_open()?;
            if let Some(ip) = precheck(&name, option)? {
                return qualify(&name, option, [ip]);
            }

            let domain = name.as_str();
            tracing::debug!(domain = %domain, ?option, "resolving via hickory-dns");

            let lookup = async {
                let lookup = resolver.resolver.lookup_ip(domain).await.map_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                    NetError::dns_failed(
                        domain,
                        std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
                    )
                })?;
                Ok(lookup.iter().collect::<Vec<_>>())
            };

            let addrs = lookup_with_timeout(&name, resolver.timeout, lookup).await?;
            let addrs = qualify(&name, option, addrs)?;
            tracing::debug!(
                domain = %domain,
                count = addrs.len(),
                "hickory-dns resolution complete"
            );
            Ok(addrs)
        })
    }
}
