//! Client binding configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use beer_core::config::non_empty_var;

use crate::error::ClientError;

/// Env var holding the service address (`scheme://host:port`).
pub const ADDRESS_VAR: &str = "GRPC_CLIENT_BEER_SERVICE_ADDRESS";
/// Env var holding `PLAINTEXT` or `TLS`.
pub const NEGOTIATION_VAR: &str = "GRPC_CLIENT_BEER_SERVICE_NEGOTIATION_TYPE";
/// Env var holding the per-call deadline in milliseconds.
pub const TIMEOUT_VAR: &str = "GRPC_CLIENT_BEER_SERVICE_TIMEOUT_MS";

const DEFAULT_ADDRESS: &str = "static://localhost:5432";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Transport security for the client channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NegotiationType {
    Plaintext,
    #[default]
    Tls,
}

impl FromStr for NegotiationType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "TLS" => Ok(Self::Tls),
            _ => Err(ClientError::InvalidNegotiation(s.to_owned())),
        }
    }
}

/// `scheme://host:port`, e.g. `static://localhost:5432`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ServiceAddress {
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }
}

impl FromStr for ServiceAddress {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidAddress(s.to_owned());

        let (scheme, rest) = s.trim().split_once("://").ok_or_else(invalid)?;
        let authority = rest.trim_end_matches('/');
        let (host, port) = authority.rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if scheme.is_empty() || host.is_empty() || host.contains('/') {
            return Err(invalid());
        }
        let port = port.parse().map_err(|_| invalid())?;

        Ok(Self {
            scheme: scheme.to_owned(),
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

/// Binding for the `beerService` client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcClientConfig {
    /// Logical service name passed to channel configurers.
    pub name: String,
    /// default: `static://localhost:5432`
    pub address: ServiceAddress,
    /// default: `TLS`
    pub negotiation: NegotiationType,
    /// Deadline applied to connect and to each call. default: 5s
    pub timeout: Duration,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            name: "beerService".to_owned(),
            address: ServiceAddress {
                scheme: "static".to_owned(),
                host: "localhost".to_owned(),
                port: 5432,
            },
            negotiation: NegotiationType::Tls,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl GrpcClientConfig {
    /// Load from the `GRPC_CLIENT_BEER_SERVICE_*` variables.
    ///
    /// Unset variables fall back to defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(non_empty_var)
    }

    /// Same as [`GrpcClientConfig::from_env`] with `lookup` in place of the
    /// process environment. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let address = match var(ADDRESS_VAR) {
            Some(v) => v.parse()?,
            None => DEFAULT_ADDRESS.parse()?,
        };
        let negotiation = match var(NEGOTIATION_VAR) {
            Some(v) => v.parse()?,
            None => NegotiationType::default(),
        };
        let timeout_ms = match var(TIMEOUT_VAR) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ClientError::InvalidTimeout(v.clone()))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            address,
            negotiation,
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        })
    }

    /// Same binding pointed at another port.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            address: self.address.with_port(port),
            ..self.clone()
        }
    }
}
