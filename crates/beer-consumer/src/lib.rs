//! Consumer-side harness for the beer eligibility contract.
//!
//! Builds a `BeerService` client from explicit configuration, gates a suite on
//! environment preconditions, runs scenarios against the stub runner and
//! reports per-scenario outcomes.

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod harness;
#[cfg(feature = "insecure-test-transport")]
pub mod insecure;

pub use channel::{ChannelBuilder, ChannelConfigurer, TrustPolicy, TrustStubCa};
pub use client::{BeerClient, Verdict};
pub use config::{GrpcClientConfig, NegotiationType, ServiceAddress};
pub use error::ClientError;
pub use gate::{Gate, Preconditions};
pub use harness::{Harness, Scenario, ScenarioOutcome, ScenarioReport, SuiteReport, SuiteStatus};
#[cfg(feature = "insecure-test-transport")]
pub use insecure::InsecureTestTransport;
