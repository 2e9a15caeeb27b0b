use std::net::SocketAddr;
use std::path::PathBuf;

/// Failures while resolving, loading or starting stubs.
///
/// Every variant is fatal for the suite that requested the stubs.
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("invalid stub coordinates `{0}`")]
    InvalidCoordinates(String),
    #[error("cannot resolve stubs for {coordinates}: {reason}")]
    Resolution { coordinates: String, reason: String },
    #[error("invalid contract {}: {reason}", .path.display())]
    InvalidContract { path: PathBuf, reason: String },
    #[error("cannot bind stub server to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid stub server address `{0}`")]
    InvalidAddress(String),
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

impl StubError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Self::Resolution { .. } => "RESOLUTION",
            Self::InvalidContract { .. } => "INVALID_CONTRACT",
            Self::Bind { .. } => "BIND",
            Self::InvalidAddress(_) => "INVALID_ADDRESS",
            Self::Tls(_) => "TLS",
        }
    }

    pub(crate) fn resolution(coordinates: impl ToString, reason: impl Into<String>) -> Self {
        Self::Resolution {
            coordinates: coordinates.to_string(),
            reason: reason.into(),
        }
    }
}
