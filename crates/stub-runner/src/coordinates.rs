//! Stub artifact coordinates: `group:artifact[:version[:classifier]]`.

use std::fmt;
use std::str::FromStr;

use crate::error::StubError;

/// Version placeholder meaning "newest version available".
pub const LATEST_VERSION: &str = "+";
const DEFAULT_CLASSIFIER: &str = "stubs";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StubCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: String,
}

impl StubCoordinates {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: LATEST_VERSION.to_owned(),
            classifier: DEFAULT_CLASSIFIER.to_owned(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST_VERSION || self.version.eq_ignore_ascii_case("latest")
    }
}

impl FromStr for StubCoordinates {
    type Err = StubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 2 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(StubError::InvalidCoordinates(s.to_owned()));
        }

        let mut coords = StubCoordinates::new(parts[0], parts[1]);
        if let Some(version) = parts.get(2) {
            coords.version = (*version).to_owned();
        }
        if let Some(classifier) = parts.get(3) {
            coords.classifier = (*classifier).to_owned();
        }
        Ok(coords)
    }
}

impl fmt::Display for StubCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.classifier
        )
    }
}
