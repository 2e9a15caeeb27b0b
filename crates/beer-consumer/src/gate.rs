//! Suite preconditions, evaluated once before any scenario runs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use stub_runner::Capability;

/// Env var whose presence marks an old producer release train.
pub const OLD_PRODUCER_TRAIN: &str = "OLD_PRODUCER_TRAIN";

/// Result of evaluating the preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Run,
    /// Environment does not support the suite. Not a failure.
    Skip(String),
    /// The preconditions themselves are broken.
    Abort(String),
}

/// `major.minor.patch`; pre-release and build suffixes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = s
            .trim()
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(format!("invalid version `{s}`"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid version `{s}`"))?;
        }
        let [major, minor, patch] = numbers;
        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// What the environment must provide for the suite to run.
#[derive(Clone)]
pub struct Preconditions {
    /// default: `0.1.0`
    pub minimum_stub_runner_version: String,
    /// default: `Some(Capability::RequestMatchers)`
    pub required_capability: Option<Capability>,
    /// A non-empty value disables the suite. default: `OLD_PRODUCER_TRAIN`
    pub disabling_env_var: String,
    env: EnvLookup,
}

impl fmt::Debug for Preconditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preconditions")
            .field("minimum_stub_runner_version", &self.minimum_stub_runner_version)
            .field("required_capability", &self.required_capability)
            .field("disabling_env_var", &self.disabling_env_var)
            .finish_non_exhaustive()
    }
}

impl Default for Preconditions {
    fn default() -> Self {
        Self {
            minimum_stub_runner_version: "0.1.0".to_owned(),
            required_capability: Some(Capability::RequestMatchers),
            disabling_env_var: OLD_PRODUCER_TRAIN.to_owned(),
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }
}

impl Preconditions {
    /// Replace the process environment with `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.env = Arc::new(lookup);
        self
    }

    /// Evaluate against the linked stub runner.
    pub fn evaluate(&self) -> Gate {
        self.evaluate_against(stub_runner::VERSION, stub_runner::supports)
    }

    pub fn evaluate_against(
        &self,
        runner_version: &str,
        supports: impl Fn(Capability) -> bool,
    ) -> Gate {
        let minimum: Version = match self.minimum_stub_runner_version.parse() {
            Ok(v) => v,
            Err(e) => return Gate::Abort(format!("minimum stub runner version: {e}")),
        };
        let actual: Version = match runner_version.parse() {
            Ok(v) => v,
            Err(e) => return Gate::Abort(format!("stub runner version: {e}")),
        };

        if actual < minimum {
            return Gate::Skip(format!(
                "stub runner must be at least {minimum}, found {actual}"
            ));
        }
        if let Some(capability) = self.required_capability {
            if !supports(capability) {
                return Gate::Skip(format!("stub runner lacks {capability:?}"));
            }
        }
        let disabled = (self.env)(&self.disabling_env_var)
            .is_some_and(|v| !v.trim().is_empty());
        if disabled {
            return Gate::Skip(format!(
                "env var {} must not be set",
                self.disabling_env_var
            ));
        }

        Gate::Run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> Preconditions {
        Preconditions::default().with_env(|_| None)
    }

    #[test]
    fn should_parse_and_order_versions() {
        let v: Version = "3.0.0-SNAPSHOT".parse().unwrap();
        assert_eq!(v.to_string(), "3.0.0");
        assert!("2.9.9".parse::<Version>().unwrap() < v);
        assert_eq!("1".parse::<Version>().unwrap().to_string(), "1.0.0");
        assert!("x.y".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
    }

    #[test]
    fn should_run_with_linked_stub_runner() {
        assert_eq!(no_env().evaluate(), Gate::Run);
    }

    #[test]
    fn should_skip_when_runner_is_too_old() {
        let gate = Preconditions {
            minimum_stub_runner_version: "3.0.0".to_owned(),
            ..no_env()
        }
        .evaluate_against("2.2.1", |_| true);
        assert!(matches!(gate, Gate::Skip(_)), "{gate:?}");
    }

    #[test]
    fn should_skip_when_capability_missing() {
        let gate = no_env().evaluate_against("9.0.0", |_| false);
        assert!(matches!(gate, Gate::Skip(_)), "{gate:?}");
    }

    #[test]
    fn should_skip_when_disabling_env_var_is_set() {
        let gate = Preconditions::default()
            .with_env(|key| (key == OLD_PRODUCER_TRAIN).then(|| "true".to_owned()))
            .evaluate_against("9.0.0", |_| true);
        assert_eq!(
            gate,
            Gate::Skip("env var OLD_PRODUCER_TRAIN must not be set".to_owned())
        );
    }

    #[test]
    fn should_ignore_empty_disabling_env_var() {
        let gate = Preconditions::default()
            .with_env(|_| Some(String::new()))
            .evaluate_against("9.0.0", |_| true);
        assert_eq!(gate, Gate::Run);
    }

    #[test]
    fn should_abort_on_unparsable_minimum() {
        let gate = Preconditions {
            minimum_stub_runner_version: "three".to_owned(),
            ..no_env()
        }
        .evaluate_against("1.0.0", |_| true);
        assert!(matches!(gate, Gate::Abort(_)), "{gate:?}");
    }
}
