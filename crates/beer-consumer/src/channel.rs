//! Channel construction and the configurer hook applied before connecting.

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use stub_runner::StubBinding;

use crate::config::{GrpcClientConfig, NegotiationType, ServiceAddress};
use crate::error::ClientError;

/// Which certificates the client accepts when negotiating TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Operating system trust store.
    NativeRoots,
    /// A single PEM-encoded CA.
    CaPem(String),
    /// The CA of the stub server the builder was rebound to.
    StubCa,
    /// Accept any server certificate. Test transports only.
    #[cfg(feature = "insecure-test-transport")]
    InsecureTrustAll,
}

/// Everything needed to open one client channel.
#[derive(Debug, Clone)]
pub struct ChannelBuilder {
    pub address: ServiceAddress,
    pub negotiation: NegotiationType,
    pub trust: TrustPolicy,
    pub timeout: std::time::Duration,
    /// TLS server name; defaults to the address host.
    pub domain_name: Option<String>,
    stub_ca_pem: Option<String>,
}

impl ChannelBuilder {
    pub fn from_config(config: &GrpcClientConfig) -> Self {
        Self {
            address: config.address.clone(),
            negotiation: config.negotiation,
            trust: TrustPolicy::NativeRoots,
            timeout: config.timeout,
            domain_name: None,
            stub_ca_pem: None,
        }
    }

    /// Point the builder at a running stub: take its port and remember its CA.
    pub fn rebind(mut self, binding: &StubBinding) -> Self {
        self.address = self.address.with_port(binding.port);
        self.stub_ca_pem = Some(binding.ca_pem.clone());
        self
    }

    fn uri(&self, scheme: &str) -> String {
        let authority = if self.address.host.contains(':') {
            format!("[{}]:{}", self.address.host, self.address.port)
        } else {
            format!("{}:{}", self.address.host, self.address.port)
        };
        format!("{scheme}://{authority}")
    }

    fn endpoint(&self, scheme: &str) -> Result<Endpoint, ClientError> {
        let uri = self.uri(scheme);
        Ok(Endpoint::from_shared(uri.clone())
            .map_err(|_| ClientError::InvalidAddress(uri))?
            .connect_timeout(self.timeout)
            .timeout(self.timeout))
    }

    fn server_name(&self) -> String {
        self.domain_name
            .clone()
            .unwrap_or_else(|| self.address.host.clone())
    }

    /// Open the channel. Connection failures surface here, not on first call.
    pub async fn connect(self) -> Result<Channel, ClientError> {
        debug!(
            address = %self.address,
            negotiation = ?self.negotiation,
            trust = ?self.trust,
            "connecting"
        );

        if self.negotiation == NegotiationType::Plaintext {
            return Ok(self.endpoint("http")?.connect().await?);
        }

        let tls = match &self.trust {
            TrustPolicy::NativeRoots => ClientTlsConfig::new().with_native_roots(),
            TrustPolicy::CaPem(pem) => {
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
            TrustPolicy::StubCa => {
                let pem = self.stub_ca_pem.as_ref().ok_or_else(|| {
                    ClientError::Tls("stub CA requested but builder was never rebound".to_owned())
                })?;
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
            #[cfg(feature = "insecure-test-transport")]
            TrustPolicy::InsecureTrustAll => {
                // TLS is done by the custom connector; tonic must see plain http.
                let endpoint = self.endpoint("http")?;
                return crate::insecure::connect(
                    endpoint,
                    self.address.host.clone(),
                    self.address.port,
                    self.server_name(),
                )
                .await;
            }
        };

        let endpoint = self
            .endpoint("https")?
            .tls_config(tls.domain_name(self.server_name()))?;
        Ok(endpoint.connect().await?)
    }
}

/// Adjusts a channel builder before it connects, keyed by service name.
pub trait ChannelConfigurer: Send + Sync {
    fn configure(&self, builder: &mut ChannelBuilder, name: &str);
}

impl<F> ChannelConfigurer for F
where
    F: Fn(&mut ChannelBuilder, &str) + Send + Sync,
{
    fn configure(&self, builder: &mut ChannelBuilder, name: &str) {
        self(builder, name)
    }
}

/// Trust the CA of whichever stub server the channel is rebound to.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustStubCa;

impl ChannelConfigurer for TrustStubCa {
    fn configure(&self, builder: &mut ChannelBuilder, _name: &str) {
        builder.trust = TrustPolicy::StubCa;
        builder.domain_name.get_or_insert_with(|| "localhost".to_owned());
    }
}
