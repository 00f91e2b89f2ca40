//! Network addresses.
//!
//! An address field holds an IP literal or a domain name. A value written as
//! `env:NAME` is replaced by the contents of environment variable `NAME`
//! before parsing.

use super::{expand_env, list::value_bytes};
use crate::base::{domain, neterror::NetError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

/// A decoded address.
///
/// Text that is neither an IP literal nor a host name decodes to
/// [`Address::Unspecified`] instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Address {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Domain(String),
    #[default]
    Unspecified,
}

impl Address {
    /// Parses an address string. Never fails.
    ///
    /// Brackets around an IPv6 literal and surrounding whitespace are
    /// removed. IPv4-mapped IPv6 literals collapse to their IPv4 form.
    pub fn parse(raw: &str) -> Self {
        let unbracketed = raw
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(raw);
        let text = unbracketed.trim();

        if text.is_empty() {
            return Address::Unspecified;
        }

        if let Ok(ip) = text.parse::<IpAddr>() {
            return Address::from(ip);
        }

        match domain::validate_domain(text) {
            Ok(()) => Address::Domain(text.to_string()),
            Err(reason) => {
                tracing::debug!(
                    address = %raw,
                    reason = %reason,
                    "not an address, using unspecified"
                );
                Address::Unspecified
            }
        }
    }

    /// Decodes a raw JSON fragment, which must be a JSON string (or `null`).
    pub fn from_json_slice(data: &[u8]) -> Result<Self, NetError> {
        let raw = serde_json::from_slice::<Option<String>>(data)
            .map_err(|e| NetError::invalid_address(String::from_utf8_lossy(data), e))?
            .unwrap_or_default();

        Ok(Address::parse(&expand_env(&raw)))
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Address::Unspecified)
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Address::Domain(_))
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Address::Ipv4(ip) => Some(IpAddr::V4(*ip)),
            Address::Ipv6(ip) => Some(IpAddr::V6(*ip)),
            _ => None,
        }
    }

    pub fn domain(&self) -> Option<&str> {
        match self {
            Address::Domain(domain) => Some(domain),
            _ => None,
        }
    }

    /// Converts to the representation carried on the wire.
    ///
    /// [`Address::Unspecified`] becomes the IPv4 any-address.
    pub fn build(&self) -> IpOrDomain {
        match self {
            Address::Ipv4(ip) => IpOrDomain::Ip(IpAddr::V4(*ip)),
            Address::Ipv6(ip) => IpOrDomain::Ip(IpAddr::V6(*ip)),
            Address::Domain(domain) => IpOrDomain::Domain(domain.clone()),
            Address::Unspecified => IpOrDomain::Ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
        }
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Address::Ipv4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Address::Ipv4(v4),
                None => Address::Ipv6(v6),
            },
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.build(), f)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Address::from_json_slice(&value_bytes(&value)).map_err(serde::de::Error::custom)
    }
}

/// An IP literal or a domain name, as consumed by outbound handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IpOrDomain {
    Ip(IpAddr),
    Domain(String),
}

impl fmt::Display for IpOrDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpOrDomain::Ip(ip) => write!(f, "{ip}"),
            IpOrDomain::Domain(domain) => write!(f, "{domain}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_literals() {
        assert_eq!(
            Address::parse("1.2.3.4"),
            Address::Ipv4(Ipv4Addr::new(1, 2, 3, 4))
        );
        assert_eq!(Address::parse("::1"), Address::Ipv6(Ipv6Addr::LOCALHOST));
        assert_eq!(Address::parse("[::1]"), Address::Ipv6(Ipv6Addr::LOCALHOST));
        assert_eq!(
            Address::parse(" 10.0.0.1 "),
            Address::Ipv4(Ipv4Addr::new(10, 0, 0, 1))
        );
    }

    #[test]
    fn test_parse_ipv4_mapped_collapses() {
        assert_eq!(
            Address::parse("::ffff:192.168.1.1"),
            Address::Ipv4(Ipv4Addr::new(192, 168, 1, 1))
        );
    }

    #[test]
    fn test_parse_domain() {
        let addr = Address::parse("example.com");
        assert!(addr.is_domain());
        assert_eq!(addr.domain(), Some("example.com"));
        assert_eq!(addr.ip(), None);
    }

    #[test]
    fn test_parse_falls_back_to_unspecified() {
        assert!(Address::parse("").is_unspecified());
        assert!(Address::parse("   ").is_unspecified());
        assert!(Address::parse("not an address").is_unspecified());
        assert!(Address::parse("fe80::1%eth0").is_unspecified());
    }

    #[test]
    fn test_non_string_json_is_an_error() {
        for raw in [&b"1234"[..], &b"[\"1.1.1.1\"]"[..], &b"{}"[..], &b"nope"[..]] {
            let err = Address::from_json_slice(raw).unwrap_err();
            assert!(
                matches!(err, NetError::InvalidAddressFormat { .. }),
                "unexpected error for {:?}: {err:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn test_null_is_unspecified() {
        assert!(Address::from_json_slice(b"null").unwrap().is_unspecified());
    }

    #[test]
    fn test_build() {
        assert_eq!(
            Address::parse("8.8.8.8").build(),
            IpOrDomain::Ip(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)))
        );
        assert_eq!(
            Address::parse("dns.google").build(),
            IpOrDomain::Domain("dns.google".into())
        );
        assert_eq!(
            Address::Unspecified.build(),
            IpOrDomain::Ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        );
        assert_eq!(Address::Unspecified.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_ip_or_domain_serializes_tagged() {
        let ip = serde_json::to_string(&Address::parse("1.1.1.1").build()).unwrap();
        assert_eq!(ip, r#"{"ip":"1.1.1.1"}"#);

        let domain = serde_json::to_string(&Address::parse("a.com").build()).unwrap();
        assert_eq!(domain, r#"{"domain":"a.com"}"#);
    }
}
