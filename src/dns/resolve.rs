//! Core DNS lookup types and traits.
//!
//! This module defines the `DnsClient` trait and supporting types that form
//! the contract every resolver in the proxy must satisfy.

use super::feature::Feature;
use crate::base::{domain, neterror::NetError};
use std::{
    fmt,
    future::Future,
    net::IpAddr,
    pin::Pin,
    sync::Arc,
    time::Duration,
};

/// Default bound on a single lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A domain name to resolve into IP addresses.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to resolvers.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    /// Returns the address if the name is an IP literal.
    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }

    /// Checks host name syntax.
    pub fn validate(&self) -> Result<(), NetError> {
        domain::validate_domain(&self.host)
            .map_err(|reason| NetError::resolution(&*self.host, reason))
    }

    /// Lower-cased form without the trailing root dot, for table keys.
    pub fn normalized(&self) -> String {
        self.host.strip_suffix('.').unwrap_or(&self.host).to_lowercase()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Which answers a lookup accepts.
///
/// With both families disabled nothing qualifies and every lookup fails
/// with [`NetError::NoQualifyingAddress`] without resolving. This is also
/// the `Default` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IpOption {
    pub ipv4_enable: bool,
    pub ipv6_enable: bool,
    /// Synthetic addresses from a fake pool may replace real answers.
    pub fake_enable: bool,
}

impl IpOption {
    pub const IPV4_ONLY: Self = Self::new(true, false, false);
    pub const IPV6_ONLY: Self = Self::new(false, true, false);
    pub const DUAL_STACK: Self = Self::new(true, true, false);

    pub const fn new(ipv4_enable: bool, ipv6_enable: bool, fake_enable: bool) -> Self {
        Self {
            ipv4_enable,
            ipv6_enable,
            fake_enable,
        }
    }

    pub const fn with_fake(mut self, fake_enable: bool) -> Self {
        self.fake_enable = fake_enable;
        self
    }

    /// Returns true if at least one address family is enabled.
    pub const fn accepts_any_family(&self) -> bool {
        self.ipv4_enable || self.ipv6_enable
    }

    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(_) => self.ipv4_enable,
            IpAddr::V6(_) => self.ipv6_enable,
        }
    }
}

/// Alias for the `Future` type returned by a DNS client.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, NetError>> + Send>>;

/// Domain-name resolution capability.
///
/// Implementations must be safe to call from many tasks at once through
/// `&self`, must bound every lookup in time, and must honor the contract
/// below for the returned future.
///
/// - A malformed name fails with [`NetError::ResolutionError`].
/// - On success the list is non-empty and holds only families enabled in
///   `option`.
/// - If nothing qualifies, the lookup fails with
///   [`NetError::NoQualifyingAddress`] rather than returning an empty list.
///
/// Dropping the returned future cancels the lookup.
pub trait DnsClient: Feature {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving;
}

/// Blanket implementation for Arc-wrapped clients.
impl<R: DnsClient + ?Sized> DnsClient for Arc<R> {
    fn lookup_ip(&self, name: Name, option: IpOption) -> Resolving {
        (**self).lookup_ip(name, option)
    }
}

/// Shared argument checks run before any resolution work.
///
/// Returns the address when `name` is an IP literal, which needs no lookup.
pub fn precheck(name: &Name, option: IpOption) -> Result<Option<IpAddr>, NetError> {
    let literal = name.ip_literal();
    if literal.is_none() {
        name.validate()?;
    }
    if !option.accepts_any_family() {
        return Err(NetError::no_qualifying_address(name.as_str()));
    }
    Ok(literal)
}

/// Applies the family filter to raw answers, dropping duplicates and
/// keeping order.
pub fn qualify(
    name: &Name,
    option: IpOption,
    addrs: impl IntoIterator<Item = IpAddr>,
) -> Result<Vec<IpAddr>, NetError> {
    let mut qualified: Vec<IpAddr> = Vec::new();
    for ip in addrs {
        if option.accepts(&ip) && !qualified.contains(&ip) {
            qualified.push(ip);
        }
    }

    if qualified.is_empty() {
        tracing::debug!(domain = %name, ?option, "no answer matches the requested families");
        return Err(NetError::no_qualifying_address(name.as_str()));
    }
    Ok(qualified)
}

/// Runs `lookup`, failing with [`NetError::ResolutionTimedOut`] after
/// `timeout`.
pub async fn lookup_with_timeout<F>(
    name: &Name,
    timeout: Duration,
    lookup: F,
) -> Result<Vec<IpAddr>, NetError>
where
    F: Future<Output = Result<Vec<IpAddr>, NetError>>,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(domain = %name, ?timeout, "DNS lookup timed out");
            Err(NetError::timed_out(name.as_str(), timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const V4: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
    const V6: IpAddr = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));

    #[test]
    fn test_name_from_str() {
        let name = Name::from("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");
    }

    #[test]
    fn test_name_normalized() {
        assert_eq!(Name::new("WWW.Example.COM.").normalized(), "www.example.com");
    }

    #[test]
    fn test_name_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Name::new("example.com"));
        set.insert(Name::new("example.com")); // Duplicate

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_ip_option_accepts() {
        assert!(IpOption::IPV4_ONLY.accepts(&V4));
        assert!(!IpOption::IPV4_ONLY.accepts(&V6));
        assert!(IpOption::IPV6_ONLY.accepts(&V6));
        assert!(IpOption::DUAL_STACK.accepts(&V4) && IpOption::DUAL_STACK.accepts(&V6));
        assert!(!IpOption::default().accepts_any_family());
        assert!(IpOption::IPV4_ONLY.with_fake(true).fake_enable);
    }

    #[test]
    fn test_precheck_rejects_malformed_domain() {
        let err = precheck(&Name::new("bad domain"), IpOption::DUAL_STACK).unwrap_err();
        assert!(matches!(err, NetError::ResolutionError { .. }));

        let err = precheck(&Name::new(""), IpOption::DUAL_STACK).unwrap_err();
        assert!(matches!(err, NetError::ResolutionError { .. }));
    }

    #[test]
    fn test_precheck_all_flags_false_resolves_nothing() {
        let err = precheck(&Name::new("example.com"), IpOption::default()).unwrap_err();
        assert!(matches!(err, NetError::NoQualifyingAddress { .. }));

        let fake_only = IpOption::new(false, false, true);
        assert!(precheck(&Name::new("example.com"), fake_only).is_err());
    }

    #[test]
    fn test_precheck_ip_literal() {
        assert_eq!(
            precheck(&Name::new("::1"), IpOption::DUAL_STACK).unwrap(),
            Some(IpAddr::V6(Ipv6Addr::LOCALHOST))
        );
        assert_eq!(precheck(&Name::new("example.com"), IpOption::DUAL_STACK).unwrap(), None);
    }

    #[test]
    fn test_qualify_filters_and_dedups() {
        let name = Name::new("example.com");
        let addrs = qualify(&name, IpOption::IPV4_ONLY, [V6, V4, V4]).unwrap();
        assert_eq!(addrs, vec![V4]);

        let err = qualify(&name, IpOption::IPV4_ONLY, [V6]).unwrap_err();
        assert!(matches!(err, NetError::NoQualifyingAddress { domain } if domain == "example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_with_timeout_expires() {
        let name = Name::new("slow.example");
        let result = lookup_with_timeout(&name, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![V4])
        })
        .await;

        assert!(matches!(result, Err(NetError::ResolutionTimedOut { .. })));
    }
}
