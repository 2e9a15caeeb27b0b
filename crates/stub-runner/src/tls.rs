//! TLS identity for the stub server.
//!
//! Self-signed mode mints an ephemeral CA plus a server certificate signed by
//! it, so clients can pin the CA without trusting the leaf directly.

use std::fs;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, Issuer, KeyPair,
};

use crate::config::TlsSource;
use crate::error::StubError;

/// PEM material the stub server presents, plus the CA clients should trust.
#[derive(Clone)]
pub struct ServerIdentity {
    pub cert_pem: String,
    pub key_pem: String,
    pub ca_pem: String,
}

impl std::fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerIdentity")
            .field("cert_pem", &self.cert_pem)
            .field("key_pem", &"<redacted>")
            .field("ca_pem", &self.ca_pem)
            .finish()
    }
}

impl ServerIdentity {
    pub fn from_source(source: &TlsSource) -> Result<Self, StubError> {
        match source {
            TlsSource::SelfSigned { subject_alt_names } => generate(subject_alt_names),
            TlsSource::Pem { cert, key, ca } => {
                let read = |path: &std::path::Path| {
                    fs::read_to_string(path)
                        .map_err(|e| StubError::Tls(format!("{}: {e}", path.display())))
                };
                let cert_pem = read(cert)?;
                let ca_pem = match ca {
                    Some(ca) => read(ca)?,
                    None => cert_pem.clone(),
                };
                Ok(Self {
                    key_pem: read(key)?,
                    cert_pem,
                    ca_pem,
                })
            }
        }
    }
}

fn generate(subject_alt_names: &[String]) -> Result<ServerIdentity, StubError> {
    let tls_err = |e: rcgen::Error| StubError::Tls(e.to_string());

    let ca_key = KeyPair::generate().map_err(tls_err)?;
    let mut ca_params = CertificateParams::default();
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.distinguished_name = distinguished_name("Beer Stub Runner Test CA");
    let ca_cert = ca_params.self_signed(&ca_key).map_err(tls_err)?;
    let issuer = Issuer::new(ca_params, ca_key);

    let server_key = KeyPair::generate().map_err(tls_err)?;
    let mut server_params = CertificateParams::new(subject_alt_names.to_vec()).map_err(tls_err)?;
    server_params.distinguished_name = distinguished_name("Beer Stub Runner");
    server_params.is_ca = IsCa::NoCa;
    let server_cert = server_params
        .signed_by(&server_key, &issuer)
        .map_err(tls_err)?;

    Ok(ServerIdentity {
        cert_pem: server_cert.pem(),
        key_pem: server_key.serialize_pem(),
        ca_pem: ca_cert.pem(),
    })
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut name = DistinguishedName::new();
    name.push(DnType::CommonName, common_name);
    name
}
