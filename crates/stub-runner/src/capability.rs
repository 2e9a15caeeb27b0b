//! Version and feature probe for consumers that gate on stub runner support.

/// Version of this stub runner crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Features a consumer may require before running a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Predicate matchers (`gte`, `lt`, `matches`, ...) in contract requests.
    RequestMatchers,
    /// Stubs are served over TLS.
    TlsTransport,
    /// The HTTPS port can be overridden through a configurer.
    PortOverride,
}

const SUPPORTED: &[Capability] = &[
    Capability::RequestMatchers,
    Capability::TlsTransport,
    Capability::PortOverride,
];

pub fn capabilities() -> &'static [Capability] {
    SUPPORTED
}

pub fn supports(capability: Capability) -> bool {
    SUPPORTED.contains(&capability)
}
