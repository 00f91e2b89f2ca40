//! Fake DNS: synthetic addresses for domain-based routing.
//!
//! When a lookup sets [`IpOption::fake_enable`], [`FakeDns`] answers with an
//! address allocated from a reserved pool instead of resolving the name. The
//! mapping is stable, so connections to that address can later be traced
//! back to the original domain with [`FakeDns::lookup_domain`].
//!
//! Lookups without `fake_enable`, and lookups for a family that has no pool,
//! go to the inner client.

use super::{
    feature::{Feature, FeatureState},
    resolve::{precheck, qualify, DnsClient, IpOption, Name, Resolving},
};
use crate::base::neterror::NetError;
use dashmap::{mapref::entry::Entry, DashMap};
use futures::{future, FutureExt};
use ipnetwork::{IpNetwork, NetworkSize};
use std::{
    fmt,
    net::{IpAddr, Ipv6Addr},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Default IPv4 pool (benchmarking range, RFC 2544).
pub const DEFAULT_IPV4_POOL: &str = "198.18.0.0/15";
/// Default IPv6 pool (unique local range).
pub const DEFAULT_IPV6_POOL: &str = "fc00::/18";
/// Default number of addresses handed out per pool.
pub const DEFAULT_POOL_SIZE: u64 = 65535;

/// Fake DNS configuration.
#[derive(Debug, Clone)]
pub struct FakeDnsConfig {
    /// IPv4 pool in CIDR form, or `None` to disable IPv4 fake answers
    pub ipv4_pool: Option<String>,
    /// IPv6 pool in CIDR form, or `None` to disable IPv6 fake answers
    pub ipv6_pool: Option<String>,
    /// Maximum number of domains mapped per pool
    pub pool_size: u64,
}

impl Default for FakeDnsConfig {
    fn default() -> Self {
        Self {
            ipv4_pool: Some(DEFAULT_IPV4_POOL.to_string()),
            ipv6_pool: Some(DEFAULT_IPV6_POOL.to_string()),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl FakeDnsConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the IPv4 pool.
    pub fn ipv4_pool(mut self, cidr: impl Into<String>) -> Self {
        self.ipv4_pool = Some(cidr.into());
        self
    }

    /// Set the IPv6 pool.
    pub fn ipv6_pool(mut self, cidr: impl Into<String>) -> Self {
        self.ipv6_pool = Some(cidr.into());
        self
    }

    /// Disable fake answers for IPv4.
    pub fn without_ipv4(mut self) -> Self {
        self.ipv4_pool = None;
        self
    }

    /// Disable fake answers for IPv6.
    pub fn without_ipv6(mut self) -> Self {
        self.ipv6_pool = None;
        self
    }

    /// Set the per-pool size limit.
    pub fn pool_size(mut self, size: u64) -> Self {
        self.pool_size = size;
        self
    }
}

/// A CIDR block handing out one address per domain.
///
/// The network address itself is never handed out.
struct FakeIpPool {
    network: IpNetwork,
    limit: u64,
    next: AtomicU64,
    by_domain: DashMap<String, IpAddr>,
    by_ip: DashMap<IpAddr, String>,
}

impl FakeIpPool {
    fn parse(cidr: &str, pool_size: u64) -> Result<Self, NetError> {
        let network: IpNetwork = cidr.parse().map_err(|e| {
            tracing::debug!(cidr, error = %e, "rejected fake IP pool");
            NetError::invalid_ip_pool(cidr)
        })?;

        // Prefix zero is refused, and a bare address parses as a host route
        // with nothing left to allocate.
        let usable = if network.prefix() == 0 {
            0
        } else {
            match network.size() {
                NetworkSize::V4(size) => u64::from(size),
                NetworkSize::V6(size) => u64::try_from(size).unwrap_or(u64::MAX),
            }
            .saturating_sub(1)
        };
        if usable == 0 {
            return Err(NetError::invalid_ip_pool(cidr));
        }

        Ok(Self {
            network,
            limit: pool_size.min(usable),
            next: AtomicU64::new(0),
            by_domain: DashMap::new(),
            by_ip: DashMap::new(),
        })
    }

    fn contains(&self, ip: &IpAddr) -> bool {
        self.network.contains(*ip)
    }

    /// Address `n` of the block, counting the network address as zero.
    fn nth(&self, n: u64) -> Option<IpAddr> {
        match self.network {
            IpNetwork::V4(net) => u32::try_from(n)
                .ok()
                .and_then(|n| net.nth(n))
                .map(IpAddr::V4),
            IpNetwork::V6(net) => u128::from(net.network())
                .checked_add(u128::from(n))
                .map(|bits| IpAddr::V6(Ipv6Addr::from(bits))),
        }
    }

    /// Returns the address mapped to `domain`, allocating one if needed.
    fn allocate(&self, domain: &str) -> Result<IpAddr, NetError> {
        match self.by_domain.entry(domain.to_string()) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let index = self.next.fetch_add(1, Ordering::Relaxed);
                let ip = if index < self.limit { self.nth(index + 1) } else { None };
                let Some(ip) = ip else {
                    tracing::warn!(pool = %self, domain, "fake IP pool exhausted");
                    return Err(NetError::FakePoolExhausted);
                };
                self.by_ip.insert(ip, domain.to_string());
                entry.insert(ip);
                tracing::debug!(domain, ip = %ip, "allocated fake address");
                Ok(ip)
            }
        }
    }

    fn domain_of(&self, ip: &IpAddr) -> Option<String> {
        self.by_ip.get(ip).map(|domain| domain.clone())
    }

    fn len(&self) -> usize {
        self.by_domain.len()
    }
}

impl fmt::Display for FakeIpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network.network(), self.network.prefix())
    }
}

/// DNS client decorator answering with fake addresses on request.
pub struct FakeDns {
    ipv4: Option<FakeIpPool>,
    ipv6: Option<FakeIpPool>,
    inner: Option<Arc<dyn DnsClient>>,
    state: FeatureState,
}

impl FakeDns {
    pub fn new(config: FakeDnsConfig) -> Result<Self, NetError> {
        let ipv4 = config
            .ipv4_pool
            .as_deref()
            .map(|cidr| FakeIpPool::parse(cidr, config.pool_size))
            .transpose()?;
        let ipv6 = config
            .ipv6_pool
            .as_deref()
            .map(|cidr| FakeIpPool::parse(cidr, config.pool_size))
            .transpose()?;

        if ipv4.as_ref().is_some_and(|p| !p.network.is_ipv4())
            || ipv6.as_ref().is_some_and(|p| !p.network.is_ipv6())
        {
            return Err(NetError::invalid_ip_pool("pool family does not match"));
        }

        Ok(Self {
            ipv4,
            ipv6,
            inner: None,
            state: FeatureState::new(),
        })
    }

    /// Set the client used for real lookups.
    pub fn with_inner(mut self, inner: Arc<dyn DnsClient>) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Returns true if `ip` falls inside one of the fake pools.
    pub fn is_fake(&self, ip: &IpAddr) -> bool {
        self.pools().any(|pool| pool.contains(ip))
    }

    /// Returns the domain a fake address was handed out for.
    pub fn lookup_domain(&self, ip: &IpAddr) -> Option<String> {
        self.pools().find_map(|pool| pool.domain_of(ip))
    }

    /// Returns the number of domains holding a fake address.
    pub fn mapped_count(&self) -> usize {
        self.pools().map(FakeIpPool::len).max().unwrap_or(0)
    }

    fn pools(&self) -> impl Iterator<Item = &FakeIpPool> {
        self.ipv4.iter().chain(self.ipv6.iter())
    }

    /// Allocates fake answers for every enabled family that has a pool.
    ///
    /// Fails only when every pool asked for is exhausted. An empty list
    /// means no requested family has a pool.
    fn fake_answer(&self, name: &Name, option: IpOption) -> Result<Vec<IpAddr>, NetError> {
        let domain = name.normalized();
        let requested = [
            (option.ipv4_enable, &self.ipv4),
            (option.ipv6_enable, &self.ipv6),
        ];

        let mut addrs = Vec::with_capacity(2);
        let mut failure = None;
        for (enabled, pool) in requested {
            let Some(pool) = pool.as_ref().filter(|_| enabled) else {
                continue;
            };
            match pool.allocate(&domain) {
                Ok(ip) => addrs.push(ip),
                Err(e) => failure = Some(e),
            }
        }

        match failure {
            Some(e) if addrs.is_empty() => Err(e),
            _ => Ok(addrs),
        }
    }

    fn delegate(&self, name: Name, option: IpOption) -> Resolving {
        match &self.inner {
            Some(inner) => inner.lookup_ip(name, option),
            None => future::ready(Err(NetError::no_qualifying_address(name.as_str()))).boxed(),
        }
    }
}

impl Feature for FakeDns {
    fn type_name(&self) -> &'static str {
        "FakeDns"
    }

    fn start(&self) -> Result<(), NetError> {
        self.state.start(self.type_name())
    }

    fn close(&self) -> Result<(), NetError> {
        self.state.close(self.type_name())
    }
}

impl DnsClient for FakeDns {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving {
        if let Err(e) = self.state.ensure_open() {
            return future::ready(Err(e)).boxed();
        }
        if !option.fake_enable {
            return self.delegate(name, option);
        }

        let answer = match precheck(&name, option) {
            Ok(Some(ip)) => qualify(&name, option, [ip]),
            Ok(None) => self.fake_answer(&name, option),
            Err(e) => Err(e),
        };

        match answer {
            Ok(addrs) if addrs.is_empty() => self.delegate(name, option),
            result => future::ready(result).boxed(),
        }
    }
}

impl fmt::Debug for FakeDns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeDns")
            .field("ipv4", &self.ipv4.as_ref().map(ToString::to_string))
            .field("ipv6", &self.ipv6.as_ref().map(ToString::to_string))
            .field("has_inner", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_pool_parse_masks_network() {
        let pool = FakeIpPool::parse("198.18.3.4/15", 10).unwrap();
        assert_eq!(pool.network.network(), IpAddr::V4(Ipv4Addr::new(198, 18, 0, 0)));
        assert_eq!(pool.to_string(), "198.18.0.0/15");
        assert!(pool.contains(&IpAddr::V4(Ipv4Addr::new(198, 19, 255, 255))));
        assert!(!pool.contains(&IpAddr::V4(Ipv4Addr::new(198, 20, 0, 0))));
    }

    #[test]
    fn test_pool_parse_rejects_garbage() {
        let rejected = [
            "198.18.0.0",
            "198.18.0.0/33",
            "198.18.0.0/32",
            "0.0.0.0/0",
            "::/0",
            "nope/8",
            "fc00::/x",
        ];
        for cidr in rejected {
            assert!(
                matches!(FakeIpPool::parse(cidr, 10), Err(NetError::InvalidIpPool { .. })),
                "{cidr} should be rejected"
            );
        }
    }

    #[test]
    fn test_pool_allocation_is_stable_and_sequential() {
        let pool = FakeIpPool::parse("10.0.0.0/24", 100).unwrap();
        let a = pool.allocate("a.com").unwrap();
        let b = pool.allocate("b.com").unwrap();
        assert_eq!(a, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(b, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(pool.allocate("a.com").unwrap(), a);
        assert_eq!(pool.domain_of(&b).as_deref(), Some("b.com"));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_pool_exhaustion() {
        let pool = FakeIpPool::parse("10.0.0.0/30", 100).unwrap();
        // /30 leaves three addresses after the network address
        for domain in ["a.com", "b.com", "c.com"] {
            pool.allocate(domain).unwrap();
        }
        assert!(matches!(pool.allocate("d.com"), Err(NetError::FakePoolExhausted)));
        // Existing mappings keep working
        assert!(pool.allocate("a.com").is_ok());
    }

    #[test]
    fn test_ipv6_pool_offsets() {
        let pool = FakeIpPool::parse("fc00::/18", 10).unwrap();
        assert_eq!(pool.to_string(), "fc00::/18");
        assert_eq!(pool.allocate("a.com").unwrap(), "fc00::1".parse::<IpAddr>().unwrap());
        assert_eq!(pool.allocate("b.com").unwrap(), "fc00::2".parse::<IpAddr>().unwrap());
        assert!(pool.contains(&"fc00:3fff::1".parse().unwrap()));
        assert!(!pool.contains(&"fc00:4000::1".parse().unwrap()));
        assert!(!pool.contains(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    }

    #[test]
    fn test_config_family_mismatch() {
        let config = FakeDnsConfig::new().ipv4_pool("fc00::/18");
        assert!(FakeDns::new(config).is_err());
    }

    #[tokio::test]
    async fn test_fake_answers_follow_family_filter() {
        let fake = FakeDns::new(FakeDnsConfig::default()).unwrap();

        let v4 = fake
            .lookup_ip(Name::new("example.com"), IpOption::IPV4_ONLY.with_fake(true))
            .await
            .unwrap();
        assert_eq!(v4.len(), 1);
        assert!(v4[0].is_ipv4() && fake.is_fake(&v4[0]));

        let both = fake
            .lookup_ip(Name::new("Example.COM"), IpOption::DUAL_STACK.with_fake(true))
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
        assert_eq!(both[0], v4[0]);
        assert!(both[1].is_ipv6());
        assert_eq!(fake.lookup_domain(&both[1]).as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_without_fake_and_without_inner() {
        let fake = FakeDns::new(FakeDnsConfig::default()).unwrap();
        let err = fake
            .lookup_ip(Name::new("example.com"), IpOption::DUAL_STACK)
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoQualifyingAddress { .. }));
    }

    #[tokio::test]
    async fn test_missing_pool_family_falls_through() {
        let fake = FakeDns::new(FakeDnsConfig::new().without_ipv6()).unwrap();
        let err = fake
            .lookup_ip(Name::new("example.com"), IpOption::IPV6_ONLY.with_fake(true))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoQualifyingAddress { .. }));
        assert_eq!(fake.mapped_count(), 0);
    }

    #[tokio::test]
    async fn test_one_exhausted_family_keeps_the_other() {
        let config = FakeDnsConfig::new().ipv4_pool("10.200.0.0/31").pool_size(100);
        let fake = FakeDns::new(config).unwrap();
        let option = IpOption::DUAL_STACK.with_fake(true);

        let first = fake.lookup_ip(Name::new("one.test"), option).await.unwrap();
        assert_eq!(first.len(), 2);

        // The IPv4 block has a single usable address, so only IPv6 answers.
        let second = fake.lookup_ip(Name::new("two.test"), option).await.unwrap();
        assert_eq!(second, vec!["fc00::2".parse::<IpAddr>().unwrap()]);

        let err = fake
            .lookup_ip(Name::new("three.test"), IpOption::IPV4_ONLY.with_fake(true))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::FakePoolExhausted));
    }
}
