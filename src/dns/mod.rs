//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution with support for:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver (DoH/DoT capable)
//! - Static host tables with an optional fallback client
//! - Fake DNS, answering from reserved address pools
//!
//! # Architecture
//!
//! Every resolver is a [`Feature`] with a start/close lifecycle and implements
//! [`DnsClient`], so resolvers can be stacked: a [`FakeDns`] in front of a
//! [`StaticResolver`] in front of a [`HickoryResolver`]. Each lookup carries an
//! [`IpOption`] naming the address families the caller accepts.
//!
//! # Example
//!
//! ```rust,ignore
//! use proxyconf::dns::{DnsClient, HickoryResolver, IpOption, Name};
//!
//! let resolver = HickoryResolver::new();
//! let addrs = resolver.lookup_ip(Name::new("example.com"), IpOption::DUAL_STACK).await?;
//! for addr in addrs {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod fakedns;
mod feature;
mod gai;
mod hickory;
mod hosts;
mod resolve;

pub use fakedns::{
    FakeDns, FakeDnsConfig, DEFAULT_IPV4_POOL, DEFAULT_IPV6_POOL, DEFAULT_POOL_SIZE,
};
pub use feature::{Feature, FeatureState};
pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use hosts::StaticResolver;
pub use resolve::{
    lookup_with_timeout, precheck, qualify, DnsClient, IpOption, Name, Resolving,
    DEFAULT_LOOKUP_TIMEOUT,
};
