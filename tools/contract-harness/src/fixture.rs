//! Scenario fixture format and loader.
//!
//! Each fixture file at `contracts/scenarios/{service}/{id}.json` describes one
//! `check` call and the verdict it must produce.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use beer_consumer::{Scenario, Verdict};

/// A single scenario loaded from a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    /// Service directory the fixture was loaded from.
    #[serde(skip)]
    pub service: String,
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub request: Request,
    pub expect: Expect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub age: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expect {
    pub status: Verdict,
}

impl Fixture {
    pub fn scenario(&self) -> Scenario {
        Scenario::new(self.id.clone(), self.request.age, self.expect.status)
    }
}

/// Load every fixture under `{scenarios_root}/{service}/`, sorted by id.
pub fn load_all(scenarios_root: &Path, service: &str) -> Result<Vec<Fixture>> {
    let dir = scenarios_root.join(service);

    let mut fixtures = Vec::new();
    for entry in fs::read_dir(&dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let mut fixture: Fixture = serde_json::from_str(&content)
                .with_context(|| format!("invalid fixture JSON in {}", path.display()))?;
            fixture.service = service.to_owned();
            fixtures.push(fixture);
        }
    }

    fixtures.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(fixtures)
}
