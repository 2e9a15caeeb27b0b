//! Insecure test transport: TLS that accepts any server certificate.
//!
//! Compiled only with the `insecure-test-transport` feature. Stub servers mint
//! throwaway certificates, so suites that cannot pin the stub CA use this to
//! still exercise the TLS code path.

use std::io;
use std::sync::Arc;

use hyper_util::rt::TokioIo;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tonic::transport::{Channel, Endpoint, Uri};
use tracing::warn;

use crate::channel::{ChannelBuilder, ChannelConfigurer, TrustPolicy};
use crate::error::ClientError;

/// Configurer that switches a channel to trust-everything TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureTestTransport;

impl ChannelConfigurer for InsecureTestTransport {
    fn configure(&self, builder: &mut ChannelBuilder, name: &str) {
        warn!(service = name, "using insecure test transport: server certificates are not verified");
        builder.trust = TrustPolicy::InsecureTrustAll;
    }
}

/// Accepts every certificate but still checks handshake signatures, so the
/// peer must hold the key for the certificate it presents.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn trust_everything_config() -> Result<ClientConfig, ClientError> {
    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];
    Ok(config)
}

/// Connect `endpoint` through a rustls connector that skips certificate checks.
///
/// `endpoint` must use the `http` scheme; TLS happens inside the connector.
pub(crate) async fn connect(
    endpoint: Endpoint,
    host: String,
    port: u16,
    server_name: String,
) -> Result<Channel, ClientError> {
    let connector = TlsConnector::from(Arc::new(trust_everything_config()?));
    let server_name = ServerName::try_from(server_name)
        .map_err(|e| ClientError::Tls(format!("invalid server name: {e}")))?;

    let channel = endpoint
        .connect_with_connector(tower::service_fn(move |_: Uri| {
            let connector = connector.clone();
            let host = host.clone();
            let server_name = server_name.clone();
            async move {
                let tcp = TcpStream::connect((host.as_str(), port)).await?;
                let tls = connector.connect(server_name, tcp).await?;
                Ok::<_, io::Error>(TokioIo::new(tls))
            }
        }))
        .await?;
    Ok(channel)
}
