//! Network protocol tokens and lists of them.

use super::list::{decode_list, value_bytes};
use crate::base::neterror::NetError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Transport network of a listener or outbound.
///
/// Token matching is case-insensitive and total: anything that is not
/// `tcp`, `udp` or `unix` is [`Network::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Network {
    #[default]
    Unknown,
    Tcp,
    Udp,
    Unix,
}

impl Network {
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("tcp") {
            Network::Tcp
        } else if token.eq_ignore_ascii_case("udp") {
            Network::Udp
        } else if token.eq_ignore_ascii_case("unix") {
            Network::Unix
        } else {
            Network::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Unknown => "unknown",
            Network::Tcp => "tcp",
            Network::Udp => "udp",
            Network::Unix => "unix",
        }
    }

    /// Already canonical after decoding.
    #[inline]
    pub fn build(self) -> Network {
        self
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Network {
    fn from(token: &str) -> Self {
        Network::from_token(token)
    }
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(Network::from_token(&token))
    }
}

/// A list of networks. A list that was never set builds to `[tcp]`.
///
/// The unset state is kept apart from an explicitly empty list: a missing
/// field or `null` is unset, `[]` is empty and builds to no networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkList {
    networks: Option<Vec<Network>>,
}

impl NetworkList {
    pub fn new(networks: Vec<Network>) -> Self {
        Self {
            networks: Some(networks),
        }
    }

    /// Decodes a raw JSON fragment.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, NetError> {
        let networks = decode_list(data, Network::from_token)?;
        Ok(Self { networks })
    }

    pub fn is_unset(&self) -> bool {
        self.networks.is_none()
    }

    /// Returns the decoded members without applying the default.
    pub fn as_slice(&self) -> &[Network] {
        self.networks.as_deref().unwrap_or(&[])
    }

    /// Returns the canonical runtime value.
    pub fn build(&self) -> Vec<Network> {
        match &self.networks {
            None => vec![Network::Tcp],
            Some(networks) => networks.iter().map(|n| n.build()).collect(),
        }
    }

    /// Returns true if the built list contains `network`.
    pub fn contains(&self, network: Network) -> bool {
        match &self.networks {
            None => network == Network::Tcp,
            Some(networks) => networks.contains(&network),
        }
    }
}

impl From<Vec<Network>> for NetworkList {
    fn from(networks: Vec<Network>) -> Self {
        NetworkList::new(networks)
    }
}

impl<'de> Deserialize<'de> for NetworkList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        NetworkList::from_json_slice(&value_bytes(&value)).map_err(serde::de::Error::custom)
    }
}
