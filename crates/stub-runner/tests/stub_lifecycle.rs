use std::fs;
use std::path::Path;

use tonic::Code;
use tonic::transport::{Certificate, Channel, ClientTlsConfig};

use beer_proto::beer::{
    PersonToCheck, beer_service_client::BeerServiceClient, response::BeerCheckStatus,
};
use stub_runner::{
    HttpsPort, StubBinding, StubError, StubRunner, StubServerConfig, StubsMode, TlsSource,
};

const ADULT: &str = r#"{
    "id": "adult",
    "request": { "method": "/beer.BeerService/check", "body": { "age": { "gte": 20 } } },
    "response": { "body": { "status": "OK" } }
}"#;

fn stub_repo(artifact: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let version_dir = dir.path().join("com.example").join(artifact).join("1.0.0");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(version_dir.join("adult.json"), ADULT).unwrap();
    dir
}

async fn start(root: &Path, artifact: &str) -> Result<StubRunner, StubError> {
    StubRunner::builder()
        .repository_root(root)
        .stubs_mode(StubsMode::Local)
        .download_stub(format!("com.example:{artifact}"))
        .start()
        .await
}

async fn client(binding: &StubBinding) -> BeerServiceClient<Channel> {
    let tls = ClientTlsConfig::new()
        .ca_certificate(Certificate::from_pem(&binding.ca_pem))
        .domain_name("localhost");
    let channel = Channel::from_shared(binding.url())
        .unwrap()
        .tls_config(tls)
        .unwrap()
        .connect()
        .await
        .unwrap();
    BeerServiceClient::new(channel)
}

#[tokio::test]
async fn should_serve_recorded_response_over_tls() {
    beer_core::tracing::init_test_tracing();
    let repo = stub_repo("beer");
    let runner = start(repo.path(), "beer").await.unwrap();

    let binding = runner.find_stub_url("beer").unwrap().clone();
    assert_ne!(binding.port, 0);
    assert_eq!(binding.coordinates.version, "1.0.0");

    let response = client(&binding)
        .await
        .check(PersonToCheck { age: 42 })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.status(), BeerCheckStatus::Ok);

    runner.close().await;
}

#[tokio::test]
async fn should_answer_not_found_for_unrecorded_request() {
    let repo = stub_repo("beer");
    let runner = start(repo.path(), "beer").await.unwrap();
    let binding = runner.find_stub_url("com.example:beer").unwrap().clone();

    let status = client(&binding)
        .await
        .check(PersonToCheck { age: 5 })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    runner.close().await;
}

#[tokio::test]
async fn should_fail_with_bind_error_when_port_taken() {
    let repo = stub_repo("beer");
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let result = StubRunner::builder()
        .repository_root(repo.path())
        .download_stub("com.example:beer")
        .with_configurer(HttpsPort(port))
        .start()
        .await;

    assert!(
        matches!(result, Err(StubError::Bind { .. })),
        "expected Bind error, got {:?}",
        result.as_ref().err()
    );
}

#[tokio::test]
async fn should_fail_with_resolution_error_for_unknown_artifact() {
    let repo = stub_repo("beer");
    let result = start(repo.path(), "wine").await;
    assert!(matches!(result, Err(StubError::Resolution { .. })));
}

#[tokio::test]
async fn should_listen_on_configured_port() {
    let repo = stub_repo("beer");
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    };

    let runner = StubRunner::builder()
        .repository_root(repo.path())
        .download_stub("com.example:beer")
        .with_configurer(move |base: StubServerConfig, _: &stub_runner::StubCoordinates| {
            StubServerConfig {
                https_port: port,
                ..base
            }
        })
        .start()
        .await
        .unwrap();

    assert_eq!(runner.find_stub_url("beer").unwrap().port, port);
    runner.close().await;
}

#[tokio::test]
async fn should_stop_accepting_connections_after_close() {
    let repo = stub_repo("beer");
    let runner = start(repo.path(), "beer").await.unwrap();
    let port = runner.find_stub_url("beer").unwrap().port;

    runner.close().await;

    assert!(tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err());
}

#[tokio::test]
async fn should_run_one_server_per_stub() {
    let repo = stub_repo("beer");
    let cider_dir = repo.path().join("com.example/cider/2.0.0");
    fs::create_dir_all(&cider_dir).unwrap();
    fs::write(cider_dir.join("adult.json"), ADULT).unwrap();

    let runner = StubRunner::builder()
        .repository_root(repo.path())
        .download_stub("com.example:beer")
        .download_stub("com.example:cider:2.0.0")
        .start()
        .await
        .unwrap();

    let beer = runner.find_stub_url("beer").unwrap().port;
    let cider = runner.find_stub_url("cider").unwrap().port;
    assert_ne!(beer, cider);
    assert_eq!(runner.bindings().count(), 2);

    runner.close().await;
}

#[tokio::test]
async fn should_fail_with_tls_error_for_garbage_pem() {
    let repo = stub_repo("beer");
    let cert = repo.path().join("server.crt");
    let key = repo.path().join("server.key");
    fs::write(&cert, "not a certificate").unwrap();
    fs::write(&key, "not a key").unwrap();

    let result = StubRunner::builder()
        .repository_root(repo.path())
        .download_stub("com.example:beer")
        .with_configurer(move |base: StubServerConfig, _: &stub_runner::StubCoordinates| {
            StubServerConfig {
                tls: TlsSource::Pem {
                    cert: cert.clone(),
                    key: key.clone(),
                    ca: None,
                },
                ..base
            }
        })
        .start()
        .await;

    let err = result.err().expect("garbage PEM must not start a server");
    assert_eq!(err.kind(), "TLS", "{err}");
}
