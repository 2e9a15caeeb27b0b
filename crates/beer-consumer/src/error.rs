/// Client-side failures while building a channel or calling the service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid service address `{0}`")]
    InvalidAddress(String),
    #[error("invalid negotiation type `{0}` (expected PLAINTEXT or TLS)")]
    InvalidNegotiation(String),
    #[error("invalid timeout `{0}` (expected milliseconds)")]
    InvalidTimeout(String),
    #[error("age {0} does not fit the wire format")]
    InvalidAge(u32),
    #[error("TLS setup failed: {0}")]
    Tls(String),
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("rpc failed: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("unknown verdict value {0}")]
    UnknownVerdict(i32),
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidAddress(_) => "INVALID_ADDRESS",
            Self::InvalidNegotiation(_) => "INVALID_NEGOTIATION",
            Self::InvalidTimeout(_) => "INVALID_TIMEOUT",
            Self::InvalidAge(_) => "INVALID_AGE",
            Self::Tls(_) => "TLS",
            Self::Transport(_) => "TRANSPORT",
            Self::Rpc(_) => "RPC",
            Self::UnknownVerdict(_) => "UNKNOWN_VERDICT",
        }
    }
}
