//! Scenario runner: gate → acquire stubs → rebind → call → assert → release.

use std::future::Future;

use serde::Deserialize;
use tracing::{info, warn};

use stub_runner::{StubBinding, StubError, StubRunner};

use crate::channel::{ChannelBuilder, ChannelConfigurer};
use crate::client::{BeerClient, Verdict};
use crate::config::GrpcClientConfig;
use crate::error::ClientError;
use crate::gate::{Gate, Preconditions};

/// One check call and the verdict it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub age: u32,
    pub expected: Verdict,
}

impl Scenario {
    pub fn new(name: impl Into<String>, age: u32, expected: Verdict) -> Self {
        Self {
            name: name.into(),
            age,
            expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    /// The call succeeded but returned the wrong verdict.
    Failed { expected: Verdict, actual: Verdict },
    /// The call itself failed (transport, TLS or RPC status).
    Errored(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub outcome: ScenarioOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteStatus {
    /// Preconditions not met; no scenario ran.
    Skipped(String),
    /// Setup failed; no scenario ran.
    Aborted(String),
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub status: SuiteStatus,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn skipped(reason: String) -> Self {
        Self {
            status: SuiteStatus::Skipped(reason),
            scenarios: Vec::new(),
        }
    }

    fn aborted(reason: String) -> Self {
        Self {
            status: SuiteStatus::Aborted(reason),
            scenarios: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| !matches!(o, ScenarioOutcome::Passed))
    }

    fn count(&self, pred: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.scenarios.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, SuiteStatus::Skipped(_))
    }

    /// Skipped suites are not failures; aborted ones are.
    pub fn is_success(&self) -> bool {
        match self.status {
            SuiteStatus::Skipped(_) => true,
            SuiteStatus::Aborted(_) => false,
            SuiteStatus::Completed => self.failed() == 0,
        }
    }
}

/// Runs scenarios against the stub for one artifact.
pub struct Harness {
    config: GrpcClientConfig,
    artifact: String,
    preconditions: Preconditions,
    configurers: Vec<Box<dyn ChannelConfigurer>>,
}

impl Harness {
    /// `artifact` is the stub whose port the client is rebound to.
    pub fn new(config: GrpcClientConfig, artifact: impl Into<String>) -> Self {
        Self {
            config,
            artifact: artifact.into(),
            preconditions: Preconditions::default(),
            configurers: Vec::new(),
        }
    }

    pub fn with_preconditions(mut self, preconditions: Preconditions) -> Self {
        self.preconditions = preconditions;
        self
    }

    /// Configurers run in registration order on every channel.
    pub fn with_channel_configurer(mut self, configurer: impl ChannelConfigurer + 'static) -> Self {
        self.configurers.push(Box::new(configurer));
        self
    }

    /// Full suite: evaluate the gate, start stubs with `acquire`, run every
    /// scenario, then release the stubs.
    pub async fn run<F, Fut>(&self, scenarios: &[Scenario], acquire: F) -> SuiteReport
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StubRunner, StubError>>,
    {
        match self.preconditions.evaluate() {
            Gate::Run => {}
            Gate::Skip(reason) => {
                warn!(%reason, "suite skipped");
                return SuiteReport::skipped(reason);
            }
            Gate::Abort(reason) => {
                warn!(%reason, "suite aborted by preconditions");
                return SuiteReport::aborted(reason);
            }
        }

        let runner = match acquire().await {
            Ok(runner) => runner,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "stub setup failed");
                return SuiteReport::aborted(e.to_string());
            }
        };

        let report = self.run_scenarios(&runner, scenarios).await;
        runner.close().await;
        report
    }

    /// Run scenarios against an already started runner. Does not evaluate the
    /// gate and does not close the runner.
    pub async fn run_scenarios(&self, runner: &StubRunner, scenarios: &[Scenario]) -> SuiteReport {
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            // Looked up per scenario so a restarted stub on a new port is picked up.
            let Some(binding) = runner.find_stub_url(&self.artifact) else {
                return SuiteReport::aborted(format!("no running stub for {}", self.artifact));
            };
            let outcome = self.run_scenario(binding, scenario).await;
            match &outcome {
                ScenarioOutcome::Passed => info!(scenario = %scenario.name, "passed"),
                other => warn!(scenario = %scenario.name, outcome = ?other, "did not pass"),
            }
            reports.push(ScenarioReport {
                scenario: scenario.clone(),
                outcome,
            });
        }

        let report = SuiteReport {
            status: SuiteStatus::Completed,
            scenarios: reports,
        };
        info!(passed = report.passed(), failed = report.failed(), "suite completed");
        report
    }

    /// Client rebound to `binding` with every configurer applied.
    pub async fn client_for(&self, binding: &StubBinding) -> Result<BeerClient, ClientError> {
        let mut builder = ChannelBuilder::from_config(&self.config).rebind(binding);
        for configurer in &self.configurers {
            configurer.configure(&mut builder, &self.config.name);
        }
        BeerClient::connect(builder).await
    }

    /// One scenario against `binding`. Connect and call are each bounded by the
    /// configured timeout.
    pub async fn run_scenario(&self, binding: &StubBinding, scenario: &Scenario) -> ScenarioOutcome {
        let verdict = match self.client_for(binding).await {
            Ok(client) => client.check(scenario.age).await,
            Err(e) => Err(e),
        };
        match verdict {
            Ok(actual) if actual == scenario.expected => ScenarioOutcome::Passed,
            Ok(actual) => ScenarioOutcome::Failed {
                expected: scenario.expected,
                actual,
            },
            Err(e) => ScenarioOutcome::Errored(format!("{}: {e}", e.kind())),
        }
    }
}
