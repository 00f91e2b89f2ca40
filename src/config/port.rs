//! Ports, port ranges and port lists.
//!
//! Accepted forms:
//! - a JSON number: `443`
//! - a string: `"443"`, `"1000-2000"`, `"env:PORT"`
//! - for lists, a comma-separated string or an array of the above:
//!   `"80,443,1000-2000"`, `[80, "1000-2000"]`

use super::{expand_env, list::value_bytes};
use crate::base::neterror::NetError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// A TCP or UDP port number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(u16);

impl Port {
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Parses a decimal port. No whitespace is allowed.
    pub fn parse(text: &str) -> Result<Self, NetError> {
        text.parse::<u16>()
            .map(Port)
            .map_err(|_| NetError::invalid_port(text))
    }

    fn from_u64(value: u64) -> Result<Self, NetError> {
        u16::try_from(value)
            .map(Port)
            .map_err(|_| NetError::invalid_port(value.to_string()))
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Port(port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive range of ports. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    from: Port,
    to: Port,
}

impl PortRange {
    pub fn new(from: Port, to: Port) -> Result<Self, NetError> {
        if from > to {
            return Err(NetError::invalid_port_range(format!("{from}-{to}")));
        }
        Ok(Self { from, to })
    }

    pub const fn single(port: Port) -> Self {
        Self {
            from: port,
            to: port,
        }
    }

    /// Parses `"80"`, `"1000-2000"` or `"env:NAME"`.
    pub fn parse(text: &str) -> Result<Self, NetError> {
        let text = expand_env(text);
        match text.split_once('-') {
            None => Port::parse(&text).map(PortRange::single),
            Some((from, to)) => {
                let from = Port::parse(from)?;
                let to = Port::parse(to)?;
                if from > to {
                    return Err(NetError::invalid_port_range(text.to_string()));
                }
                Ok(Self { from, to })
            }
        }
    }

    /// Decodes a raw JSON fragment: a number or a string.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, NetError> {
        match serde_json::from_slice::<Value>(data) {
            Ok(value) => PortRange::from_value(&value),
            Err(_) => Err(NetError::invalid_port_range(String::from_utf8_lossy(data))),
        }
    }

    fn from_value(value: &Value) -> Result<Self, NetError> {
        match value {
            Value::Number(number) => match number.as_u64() {
                Some(n) => Port::from_u64(n).map(PortRange::single),
                None => Err(NetError::invalid_port(number.to_string())),
            },
            Value::String(text) => PortRange::parse(text),
            other => Err(NetError::invalid_port_range(other.to_string())),
        }
    }

    pub fn start(&self) -> Port {
        self.from
    }

    pub fn end(&self) -> Port {
        self.to
    }

    pub fn contains(&self, port: Port) -> bool {
        self.from <= port && port <= self.to
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

impl<'de> Deserialize<'de> for PortRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        PortRange::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// An ordered list of port ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortList {
    ranges: Vec<PortRange>,
}

impl PortList {
    pub fn new(ranges: Vec<PortRange>) -> Self {
        Self { ranges }
    }

    /// Decodes a raw JSON fragment. `null` decodes to an empty list.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, NetError> {
        match serde_json::from_slice::<Value>(data) {
            Ok(value) => PortList::from_value(&value),
            Err(_) => Err(NetError::invalid_port(String::from_utf8_lossy(data))),
        }
    }

    fn from_value(value: &Value) -> Result<Self, NetError> {
        let ranges = match value {
            Value::Null => Vec::new(),
            Value::Number(_) => vec![PortRange::from_value(value)?],
            Value::String(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PortRange::parse)
                .collect::<Result<_, _>>()?,
            Value::Array(items) => items
                .iter()
                .map(PortRange::from_value)
                .collect::<Result<_, _>>()?,
            other => return Err(NetError::invalid_port(other.to_string())),
        };
        Ok(Self { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.ranges
    }

    pub fn contains(&self, port: Port) -> bool {
        self.ranges.iter().any(|range| range.contains(port))
    }
}

impl<'de> Deserialize<'de> for PortList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        PortList::from_json_slice(&value_bytes(&value)).map_err(serde::de::Error::custom)
    }
}
