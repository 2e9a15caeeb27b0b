//! Stub server lifecycle: resolve → configure → bind → serve → close.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing::{error, info, warn};

use beer_proto::beer::beer_service_server::BeerServiceServer;

use crate::config::{StubServerConfig, StubServerConfigurer};
use crate::coordinates::StubCoordinates;
use crate::error::StubError;
use crate::replay::ReplayBeerService;
use crate::repository::{StubRepository, StubsMode};
use crate::tls::ServerIdentity;

/// How long `close` waits for open connections to drain.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Network endpoint of one running stub server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubBinding {
    pub coordinates: StubCoordinates,
    pub host: String,
    pub port: u16,
    /// CA certificate that signed the server certificate.
    pub ca_pem: String,
}

impl StubBinding {
    pub fn url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

struct RunningStub {
    binding: StubBinding,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RunningStub {
    fn signal_shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Running stub servers for one suite.
///
/// Call [`StubRunner::close`] at suite teardown. Dropping the runner without
/// closing it still signals every server to stop, but does not wait for them.
pub struct StubRunner {
    stubs: Vec<RunningStub>,
}

impl StubRunner {
    pub fn builder() -> StubRunnerBuilder {
        StubRunnerBuilder::default()
    }

    /// Binding for a stub, looked up by `artifact_id` or `group_id:artifact_id`.
    pub fn find_stub_url(&self, artifact: &str) -> Option<&StubBinding> {
        self.stubs.iter().map(|s| &s.binding).find(|b| {
            b.coordinates.artifact_id == artifact
                || format!("{}:{}", b.coordinates.group_id, b.coordinates.artifact_id) == artifact
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = &StubBinding> {
        self.stubs.iter().map(|s| &s.binding)
    }

    /// Stop every stub server and wait for them to exit.
    pub async fn close(mut self) {
        for mut stub in std::mem::take(&mut self.stubs) {
            stub.signal_shutdown();
            if let Some(mut task) = stub.task.take() {
                match tokio::time::timeout(CLOSE_GRACE_PERIOD, &mut task).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(stub = %stub.binding.coordinates, error = %e, "stub server task failed");
                    }
                    Err(_) => {
                        warn!(stub = %stub.binding.coordinates, "stub server did not drain in time, aborting");
                        task.abort();
                    }
                }
            }
            info!(stub = %stub.binding.coordinates, port = stub.binding.port, "stub server stopped");
        }
    }
}

impl Drop for StubRunner {
    fn drop(&mut self) {
        for stub in &mut self.stubs {
            stub.signal_shutdown();
        }
    }
}

pub struct StubRunnerBuilder {
    repository_root: PathBuf,
    mode: StubsMode,
    stubs: Vec<String>,
    configurer: Option<Arc<dyn StubServerConfigurer>>,
}

impl Default for StubRunnerBuilder {
    fn default() -> Self {
        Self {
            repository_root: PathBuf::from("contracts/grpc"),
            mode: StubsMode::Local,
            stubs: Vec::new(),
            configurer: None,
        }
    }
}

impl StubRunnerBuilder {
    /// Root of the local stub repository. default: `contracts/grpc`
    pub fn repository_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repository_root = root.into();
        self
    }

    pub fn stubs_mode(mut self, mode: StubsMode) -> Self {
        self.mode = mode;
        self
    }

    /// Request a stub by `group:artifact[:version[:classifier]]`.
    pub fn download_stub(mut self, coordinates: impl Into<String>) -> Self {
        self.stubs.push(coordinates.into());
        self
    }

    pub fn with_configurer(mut self, configurer: impl StubServerConfigurer + 'static) -> Self {
        self.configurer = Some(Arc::new(configurer));
        self
    }

    /// Resolve every requested stub and start its server.
    ///
    /// On error, servers already started are signalled to stop.
    pub async fn start(self) -> Result<StubRunner, StubError> {
        if self.stubs.is_empty() {
            return Err(StubError::InvalidCoordinates(
                "no stubs requested".to_owned(),
            ));
        }

        let repository = StubRepository::new(&self.repository_root);
        let mut runner = StubRunner { stubs: Vec::new() };

        for raw in &self.stubs {
            let coordinates: StubCoordinates = raw.parse()?;
            let resolved = repository.resolve(&coordinates, self.mode)?;

            let base = StubServerConfig::default();
            let config = match &self.configurer {
                Some(configurer) => configurer.configure(base, &resolved.coordinates),
                None => base,
            };

            let stub = start_stub(resolved.coordinates, resolved.contracts, config).await?;
            runner.stubs.push(stub);
        }

        Ok(runner)
    }
}

async fn start_stub(
    coordinates: StubCoordinates,
    contracts: crate::contract::ContractTable,
    config: StubServerConfig,
) -> Result<RunningStub, StubError> {
    let identity = ServerIdentity::from_source(&config.tls)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.https_port)
        .parse()
        .map_err(|_| StubError::InvalidAddress(format!("{}:{}", config.host, config.https_port)))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StubError::Bind { addr, source })?;
    let port = listener
        .local_addr()
        .map_err(|source| StubError::Bind { addr, source })?
        .port();

    let tls = ServerTlsConfig::new().identity(Identity::from_pem(
        &identity.cert_pem,
        &identity.key_pem,
    ));
    let contract_count = contracts.len();
    // Identity PEM is parsed here, so bad key material surfaces as a TLS error.
    let router = Server::builder()
        .tls_config(tls)
        .map_err(|e| StubError::Tls(format!("invalid server identity: {e}")))?
        .add_service(BeerServiceServer::new(ReplayBeerService::new(Arc::new(
            contracts,
        ))));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let stub_name = coordinates.to_string();
    let task = tokio::spawn(async move {
        let incoming = TcpListenerStream::new(listener);
        let signal = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = router.serve_with_incoming_shutdown(incoming, signal).await {
            error!(stub = %stub_name, error = %e, "stub server error");
        }
    });

    info!(
        stub = %coordinates,
        %addr,
        port,
        contracts = contract_count,
        "stub server listening"
    );

    Ok(RunningStub {
        binding: StubBinding {
            coordinates,
            host: config.advertised_host,
            port,
            ca_pem: identity.ca_pem,
        },
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_https_url() {
        let binding = StubBinding {
            coordinates: StubCoordinates::new("com.example", "beer"),
            host: "localhost".to_owned(),
            port: 5432,
            ca_pem: String::new(),
        };
        assert_eq!(binding.url(), "https://localhost:5432");
    }

    #[tokio::test]
    async fn should_reject_empty_stub_list() {
        let result = StubRunner::builder().start().await;
        assert!(matches!(result, Err(StubError::InvalidCoordinates(_))));
    }
}
