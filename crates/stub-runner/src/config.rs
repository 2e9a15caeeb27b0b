//! Stub server configuration and the hook for overriding it per stub.

use std::path::PathBuf;

use crate::coordinates::StubCoordinates;

/// Certificate source for the stub server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsSource {
    /// Mint an ephemeral CA and server certificate for these names.
    SelfSigned { subject_alt_names: Vec<String> },
    /// Load PEM files from disk. `ca` defaults to `cert`.
    Pem {
        cert: PathBuf,
        key: PathBuf,
        ca: Option<PathBuf>,
    },
}

impl Default for TlsSource {
    fn default() -> Self {
        Self::SelfSigned {
            subject_alt_names: vec!["localhost".to_owned(), "127.0.0.1".to_owned()],
        }
    }
}

/// Effective settings for one stub server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubServerConfig {
    /// Interface to listen on. default: `127.0.0.1`
    pub host: String,
    /// HTTPS port; `0` lets the OS pick one. default: `0`
    pub https_port: u16,
    /// Hostname advertised in the binding. default: `localhost`
    pub advertised_host: String,
    pub tls: TlsSource,
}

impl Default for StubServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            https_port: 0,
            advertised_host: "localhost".to_owned(),
            tls: TlsSource::default(),
        }
    }
}

/// Adjusts the base configuration before a stub server starts.
pub trait StubServerConfigurer: Send + Sync {
    fn configure(&self, base: StubServerConfig, stub: &StubCoordinates) -> StubServerConfig;
}

impl<F> StubServerConfigurer for F
where
    F: Fn(StubServerConfig, &StubCoordinates) -> StubServerConfig + Send + Sync,
{
    fn configure(&self, base: StubServerConfig, stub: &StubCoordinates) -> StubServerConfig {
        self(base, stub)
    }
}

/// Pins every stub server to one HTTPS port.
#[derive(Debug, Clone, Copy)]
pub struct HttpsPort(pub u16);

impl StubServerConfigurer for HttpsPort {
    fn configure(&self, base: StubServerConfig, _stub: &StubCoordinates) -> StubServerConfig {
        StubServerConfig {
            https_port: self.0,
            ..base
        }
    }
}
