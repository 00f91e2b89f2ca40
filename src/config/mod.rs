//! Configuration value decoders.
//!
//! Turns loosely-typed JSON fragments into canonical runtime values:
//! - [`StringList`]: `["a","b"]` or `"a,b"`
//! - [`Address`]: `"1.2.3.4"`, `"example.com"` or `"env:NAME"`
//! - [`Network`]: `"tcp"`, `"UDP"`, anything else is unknown
//! - [`NetworkList`]: `["tcp","udp"]` or `"tcp,udp"`, unset means `[tcp]`
//! - [`PortRange`] / [`PortList`]: `443`, `"1000-2000"`, `"80,443"`
//!
//! Decoding is strict about the JSON shape and lenient about content: a
//! number where a list is expected is an error, an unknown protocol token or
//! an unparseable address is not.
//!
//! Every type implements `serde::Deserialize` and can be embedded in a
//! larger configuration struct. The implementations buffer the field as a
//! `serde_json::Value`, so they require a self-describing format.
//!
//! # Example
//!
//! ```rust,ignore
//! use proxyconf::config::{self, Address, Network, NetworkList};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Inbound {
//!     listen: Address,
//!     network: NetworkList,
//! }
//!
//! let inbound: Inbound = config::from_slice(br#"{"listen": "env:LISTEN"}"#)?;
//! assert_eq!(inbound.network.build(), vec![Network::Tcp]);
//! ```

mod address;
mod list;
mod network;
mod port;

pub use address::{Address, IpOrDomain};
pub use list::StringList;
pub use network::{Network, NetworkList};
pub use port::{Port, PortList, PortRange};

use crate::base::{context::IoResultExt, neterror::NetError};
use serde::de::DeserializeOwned;
use std::{borrow::Cow, path::Path};

/// Prefix marking a value that must be read from the environment.
pub const ENV_PREFIX: &str = "env:";

/// Replaces `env:NAME` with the value of environment variable `NAME`.
///
/// A variable that is unset (or not valid unicode) expands to the empty
/// string. The environment is only read.
pub(crate) fn expand_env(raw: &str) -> Cow<'_, str> {
    let Some(name) = raw.strip_prefix(ENV_PREFIX) else {
        return Cow::Borrowed(raw);
    };

    match std::env::var(name) {
        Ok(value) => {
            tracing::debug!(variable = name, "expanded environment reference");
            Cow::Owned(value)
        }
        Err(e) => {
            tracing::warn!(
                variable = name,
                error = %e,
                "environment reference is unset, using empty value"
            );
            Cow::Borrowed("")
        }
    }
}

/// Deserializes a configuration document from JSON bytes.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, NetError> {
    serde_json::from_slice(data).map_err(|e| {
        tracing::debug!(error = %e, "configuration rejected");
        NetError::invalid_config(e)
    })
}

/// Reads and deserializes a configuration document from a JSON file.
pub fn from_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, NetError> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let data = std::fs::read(path).config_context(&shown)?;
    let config = from_slice(&data)?;
    tracing::debug!(path = %shown, bytes = data.len(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_passthrough() {
        assert_eq!(expand_env("1.2.3.4"), "1.2.3.4");
        assert_eq!(expand_env("environment"), "environment");
        assert!(matches!(expand_env("a.com"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_expand_env_reads_variable() {
        std::env::set_var("PROXYCONF_TEST_EXPAND_SET", "192.0.2.1");
        assert_eq!(expand_env("env:PROXYCONF_TEST_EXPAND_SET"), "192.0.2.1");
    }

    #[test]
    fn test_expand_env_missing_variable_is_empty() {
        std::env::remove_var("PROXYCONF_TEST_EXPAND_MISSING");
        assert_eq!(expand_env("env:PROXYCONF_TEST_EXPAND_MISSING"), "");
    }

    #[test]
    fn test_from_slice_wraps_errors() {
        let err = from_slice::<StringList>(b"{").unwrap_err();
        assert!(matches!(err, NetError::InvalidConfig { .. }));
    }
}
