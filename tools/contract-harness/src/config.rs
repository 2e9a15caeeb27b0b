//! Contract harness configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use beer_core::config::non_empty_var;

/// All configuration for a harness run.
///
/// Loaded from env vars after `dotenv::dotenv().ok()`; CLI flags override it.
/// Relative paths are resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHarnessConfig {
    /// Stub coordinates to start (`CONTRACT_HARNESS_STUB`).
    /// default: `"com.example:beer-api-producer-grpc"`
    pub stub: String,

    /// Local stub repository (`CONTRACT_HARNESS_STUBS_ROOT`).
    /// default: `"contracts/grpc"`
    pub stubs_root: PathBuf,

    /// Scenario fixture directory (`CONTRACT_HARNESS_SCENARIOS`).
    /// default: `"contracts/scenarios"`
    pub scenarios_root: PathBuf,

    /// Fixed stub HTTPS port; `0` picks a free one (`CONTRACT_HARNESS_HTTPS_PORT`).
    /// default: `0`
    pub https_port: u16,

    /// Use the trust-everything test transport (`CONTRACT_HARNESS_INSECURE`).
    /// default: `false`
    pub insecure: bool,
}

impl ContractHarnessConfig {
    pub fn from_env(workspace_root: &Path) -> Result<Self> {
        Self::from_lookup(workspace_root, non_empty_var)
    }

    /// Blank values count as unset; a malformed port is an error.
    pub fn from_lookup(
        workspace_root: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_owned());

        let https_port = match var("CONTRACT_HARNESS_HTTPS_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("invalid CONTRACT_HARNESS_HTTPS_PORT `{v}`"))?,
            None => 0,
        };

        Ok(Self {
            stub: var_or("CONTRACT_HARNESS_STUB", "com.example:beer-api-producer-grpc"),
            stubs_root: workspace_root.join(var_or("CONTRACT_HARNESS_STUBS_ROOT", "contracts/grpc")),
            scenarios_root: workspace_root
                .join(var_or("CONTRACT_HARNESS_SCENARIOS", "contracts/scenarios")),
            https_port,
            insecure: var("CONTRACT_HARNESS_INSECURE")
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes")),
        })
    }

    /// Artifact id of the configured stub, used to look up its binding.
    pub fn artifact(&self) -> &str {
        self.stub.split(':').nth(1).unwrap_or(&self.stub)
    }
}
