use std::{io, sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Configuration Errors
    #[error("unknown format of a list: {}", String::from_utf8_lossy(.raw))]
    MalformedListFormat { raw: Vec<u8> },
    #[error("invalid address: {raw}")]
    InvalidAddressFormat {
        raw: String,
        source: Arc<serde_json::Error>,
    },
    #[error("invalid port: {value}")]
    InvalidPort { value: String },
    #[error("invalid port range: {value}")]
    InvalidPortRange { value: String },
    #[error("invalid configuration: {source}")]
    InvalidConfig { source: Arc<serde_json::Error> },
    #[error("invalid IP pool: {value}")]
    InvalidIpPool { value: String },
    #[error("failed to read configuration from {path}")]
    ConfigRead { path: String, source: Arc<io::Error> },

    // DNS Errors
    #[error("invalid domain {domain:?}: {reason}")]
    ResolutionError { domain: String, reason: String },
    #[error("no address of the requested family for {domain}")]
    NoQualifyingAddress { domain: String },
    #[error("failed to resolve {domain}")]
    NameNotResolvedFor { domain: String, source: Arc<io::Error> },
    #[error("resolution of {domain} timed out after {timeout:?}")]
    ResolutionTimedOut { domain: String, timeout: Duration },
    #[error("resolver is closed")]
    ResolverClosed,
    #[error("fake address pool exhausted")]
    FakePoolExhausted,
}

impl NetError {
    pub fn malformed_list(raw: impl Into<Vec<u8>>) -> Self {
        NetError::MalformedListFormat { raw: raw.into() }
    }

    pub fn invalid_address(raw: impl Into<String>, source: serde_json::Error) -> Self {
        NetError::InvalidAddressFormat {
            raw: raw.into(),
            source: Arc::new(source),
        }
    }

    pub fn invalid_port(value: impl Into<String>) -> Self {
        NetError::InvalidPort {
            value: value.into(),
        }
    }

    pub fn invalid_port_range(value: impl Into<String>) -> Self {
        NetError::InvalidPortRange {
            value: value.into(),
        }
    }

    pub fn invalid_ip_pool(value: impl Into<String>) -> Self {
        NetError::InvalidIpPool {
            value: value.into(),
        }
    }

    pub fn invalid_config(source: serde_json::Error) -> Self {
        NetError::InvalidConfig {
            source: Arc::new(source),
        }
    }

    pub fn config_read_failed(path: impl Into<String>, source: io::Error) -> Self {
        NetError::ConfigRead {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn resolution(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        NetError::ResolutionError {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    pub fn no_qualifying_address(domain: impl Into<String>) -> Self {
        NetError::NoQualifyingAddress {
            domain: domain.into(),
        }
    }

    pub fn dns_failed(domain: impl Into<String>, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            source: Arc::new(source),
        }
    }

    pub fn timed_out(domain: impl Into<String>, timeout: Duration) -> Self {
        NetError::ResolutionTimedOut {
            domain: domain.into(),
            timeout,
        }
    }

    /// Returns true for errors raised while decoding configuration.
    pub fn is_config_error(&self) -> bool {
        self.as_i32() <= -1000
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::ResolutionError { .. } => -137,
            NetError::ResolutionTimedOut { .. } => -803,
            NetError::NoQualifyingAddress { .. } => -805,
            NetError::ResolverClosed => -810,
            NetError::FakePoolExhausted => -812,
            // Configuration errors (custom codes starting at -1000)
            NetError::MalformedListFormat { .. } => -1000,
            NetError::InvalidAddressFormat { .. } => -1001,
            NetError::InvalidPort { .. } => -1002,
            NetError::InvalidPortRange { .. } => -1003,
            NetError::InvalidConfig { .. } => -1004,
            NetError::ConfigRead { .. } => -1005,
            NetError::InvalidIpPool { .. } => -1006,
        }
    }
}
