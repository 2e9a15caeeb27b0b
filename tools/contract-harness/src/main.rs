//! Contract harness: replays stubbed gRPC contracts and runs scenario fixtures
//! against them with the consumer client.
//!
//! # Usage
//!
//! ```bash
//! # Run the beer scenarios against the latest local stubs
//! cargo run -p contract-harness -- --stub com.example:beer-api-producer-grpc
//!
//! # Pin the stub port and skip certificate verification
//! cargo run -p contract-harness -- --https-port 5432 --insecure
//! ```
//!
//! Exits 0 when all scenarios pass or the suite is skipped, 1 otherwise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use beer_consumer::{
    GrpcClientConfig, Harness, InsecureTestTransport, Preconditions, Scenario, TrustStubCa,
};
use stub_runner::{HttpsPort, StubRunner, StubsMode};

mod config;
mod fixture;
mod reporter;

use config::ContractHarnessConfig;

#[derive(Parser)]
#[command(about = "Run gRPC contract scenarios against replayed stubs")]
struct Args {
    /// Stub coordinates, `group:artifact[:version[:classifier]]`
    #[arg(long)]
    stub: Option<String>,

    /// Local stub repository root
    #[arg(long)]
    stubs_root: Option<PathBuf>,

    /// Scenario fixture root
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Run fixtures for this service
    #[arg(long, default_value = "beer")]
    service: String,

    /// Fixed HTTPS port for the stub server
    #[arg(long)]
    https_port: Option<u16>,

    /// Accept any stub certificate instead of pinning the stub CA
    #[arg(long)]
    insecure: bool,
}

impl Args {
    /// Flag paths are resolved against `workspace_root`, like env paths.
    fn apply(
        self,
        workspace_root: &Path,
        mut config: ContractHarnessConfig,
    ) -> (ContractHarnessConfig, String) {
        if let Some(stub) = self.stub {
            config.stub = stub;
        }
        if let Some(root) = self.stubs_root {
            config.stubs_root = workspace_root.join(root);
        }
        if let Some(root) = self.scenarios {
            config.scenarios_root = workspace_root.join(root);
        }
        if let Some(port) = self.https_port {
            config.https_port = port;
        }
        config.insecure |= self.insecure;
        (config, self.service)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    beer_core::tracing::init_tracing();

    let root = beer_core::config::workspace_root(env!("CARGO_MANIFEST_DIR"));
    let env_config =
        ContractHarnessConfig::from_env(&root).context("invalid harness configuration")?;
    let (config, service) = Args::parse().apply(&root, env_config);
    let client_config = GrpcClientConfig::from_env().context("invalid client configuration")?;

    let fixtures = fixture::load_all(&config.scenarios_root, &service)?;
    if fixtures.is_empty() {
        eprintln!("No fixtures found.");
        return Ok(());
    }
    let scenarios: Vec<Scenario> = fixtures.iter().map(fixture::Fixture::scenario).collect();

    info!(
        stub = %config.stub,
        fixtures = fixtures.len(),
        stubs_root = %config.stubs_root.display(),
        "running contract scenarios"
    );

    let mut harness = Harness::new(client_config, config.artifact())
        .with_preconditions(Preconditions::default());
    harness = if config.insecure {
        harness.with_channel_configurer(InsecureTestTransport)
    } else {
        harness.with_channel_configurer(TrustStubCa)
    };

    let report = harness
        .run(&scenarios, || {
            StubRunner::builder()
                .repository_root(&config.stubs_root)
                .stubs_mode(StubsMode::Local)
                .download_stub(config.stub.as_str())
                .with_configurer(HttpsPort(config.https_port))
                .start()
        })
        .await;

    print!("{}", reporter::render(&fixtures, &report));

    if report.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_has_contracts_dir() {
        let root = beer_core::config::workspace_root(env!("CARGO_MANIFEST_DIR"));
        assert!(
            root.join("contracts/grpc").is_dir(),
            "workspace root should contain contracts/grpc"
        );
    }

    #[test]
    fn should_let_flags_override_env_config() {
        let root = Path::new("/ws");
        let base = ContractHarnessConfig::from_lookup(root, |_| None).unwrap();
        let args = Args::parse_from([
            "contract-harness",
            "--stub",
            "com.example:cider",
            "--https-port",
            "6565",
            "--insecure",
        ]);

        let (config, service) = args.apply(root, base.clone());
        assert_eq!(config.stub, "com.example:cider");
        assert_eq!(config.https_port, 6565);
        assert!(config.insecure);
        assert_eq!(config.stubs_root, base.stubs_root);
        assert_eq!(service, "beer");
    }

    #[test]
    fn should_resolve_flag_paths_against_workspace_root() {
        let root = Path::new("/ws");
        let base = ContractHarnessConfig::from_lookup(root, |_| None).unwrap();
        let args = Args::parse_from([
            "contract-harness",
            "--stubs-root",
            "fixtures/grpc",
            "--scenarios",
            "/abs/scenarios",
        ]);

        let (config, _) = args.apply(root, base);
        assert_eq!(config.stubs_root, Path::new("/ws/fixtures/grpc"));
        assert_eq!(config.scenarios_root, Path::new("/abs/scenarios"));
    }
}
