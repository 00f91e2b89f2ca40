//! # proxyconf
//!
//! Configuration building blocks and DNS lookup plumbing for proxy cores.
//!
//! ## Features
//!
//! - **Lenient Config Decoding**: lists given as JSON arrays or comma strings,
//!   addresses as IP literals or domains, `env:` indirection
//! - **Network Lists**: `"tcp,udp"` style transport selections defaulting to TCP
//! - **Ports**: single ports, ranges and mixed lists
//! - **DNS Clients**: one contract for system, hickory-dns, static and fake
//!   resolvers with per-lookup address family selection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use proxyconf::config::{Address, NetworkList, StringList};
//! use proxyconf::dns::{DnsClient, GaiResolver, IpOption, Name};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Inbound {
//!     listen: Address,
//!     network: NetworkList,
//!     domains: StringList,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let inbound: Inbound = proxyconf::config::from_slice(
//!         br#"{"listen": "env:LISTEN_ADDR", "network": "tcp,udp", "domains": "a.com,b.com"}"#,
//!     )
//!     .unwrap();
//!
//!     let resolver = GaiResolver::new();
//!     let addrs = resolver
//!         .lookup_ip(Name::new("example.com"), IpOption::IPV4_ONLY)
//!         .await
//!         .unwrap();
//!     println!("{} -> {:?}", inbound.listen, addrs);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and host name checks
//! - [`config`] - Configuration value decoders
//! - [`dns`] - DNS client contract and resolvers

pub mod base;
pub mod config;
pub mod dns;
