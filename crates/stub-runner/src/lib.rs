//! Contract stub runner.
//!
//! Resolves contract artifacts from a local stub repository and serves them
//! from an in-process TLS gRPC server that replays the recorded interactions.
//!
//! ```no_run
//! # async fn demo() -> Result<(), stub_runner::StubError> {
//! use stub_runner::{StubRunner, StubsMode};
//!
//! let runner = StubRunner::builder()
//!     .repository_root("contracts/grpc")
//!     .stubs_mode(StubsMode::Local)
//!     .download_stub("com.example:beer-api-producer-grpc")
//!     .start()
//!     .await?;
//! let port = runner.find_stub_url("beer-api-producer-grpc").map(|b| b.port);
//! runner.close().await;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod contract;
pub mod coordinates;
pub mod error;
pub mod replay;
pub mod repository;
pub mod server;
pub mod tls;

pub use capability::{Capability, VERSION, capabilities, supports};
pub use config::{HttpsPort, StubServerConfig, StubServerConfigurer, TlsSource};
pub use coordinates::StubCoordinates;
pub use error::StubError;
pub use repository::StubsMode;
pub use server::{StubBinding, StubRunner, StubRunnerBuilder};
