//! Stub repository lookup.
//!
//! Local layout: `{root}/{group_id}/{artifact_id}/{version}/*.json`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::contract::{Contract, ContractTable};
use crate::coordinates::StubCoordinates;
use crate::error::StubError;

/// Where stubs are fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StubsMode {
    /// Read stubs from a directory on disk.
    #[default]
    Local,
    /// Download stubs from a remote artifact repository. Not supported; always
    /// fails resolution.
    Remote,
}

/// Stubs resolved for one artifact.
#[derive(Debug, Clone)]
pub struct ResolvedStubs {
    pub coordinates: StubCoordinates,
    pub version_dir: PathBuf,
    pub contracts: ContractTable,
}

pub struct StubRepository {
    root: PathBuf,
}

impl StubRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `coordinates` to a concrete version and load its contracts.
    pub fn resolve(
        &self,
        coordinates: &StubCoordinates,
        mode: StubsMode,
    ) -> Result<ResolvedStubs, StubError> {
        if mode == StubsMode::Remote {
            return Err(StubError::resolution(
                coordinates,
                "remote stub repositories are not supported; use local mode",
            ));
        }

        let artifact_dir = self
            .root
            .join(&coordinates.group_id)
            .join(&coordinates.artifact_id);
        if !artifact_dir.is_dir() {
            return Err(StubError::resolution(
                coordinates,
                format!("no artifact directory at {}", artifact_dir.display()),
            ));
        }

        let version = if coordinates.is_latest() {
            latest_version(&artifact_dir).ok_or_else(|| {
                StubError::resolution(
                    coordinates,
                    format!("no versions under {}", artifact_dir.display()),
                )
            })?
        } else {
            coordinates.version.clone()
        };

        let version_dir = artifact_dir.join(&version);
        if !version_dir.is_dir() {
            return Err(StubError::resolution(
                coordinates,
                format!("version {version} not found"),
            ));
        }

        let contracts = load_contracts(&version_dir)?;
        if contracts.is_empty() {
            return Err(StubError::resolution(
                coordinates,
                format!("no contracts in {}", version_dir.display()),
            ));
        }

        debug!(
            stub = %coordinates,
            %version,
            contracts = contracts.len(),
            "resolved stubs"
        );

        Ok(ResolvedStubs {
            coordinates: coordinates.clone().with_version(version),
            version_dir,
            contracts,
        })
    }
}

fn load_contracts(dir: &Path) -> Result<ContractTable, StubError> {
    let read_err = |e: std::io::Error| StubError::InvalidContract {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    let mut contracts = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            let content = fs::read_to_string(&path).map_err(|e| StubError::InvalidContract {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            contracts.push(Contract::parse(&path, &content)?);
        }
    }
    Ok(ContractTable::new(contracts))
}

/// Highest version directory name under `artifact_dir`.
fn latest_version(artifact_dir: &Path) -> Option<String> {
    fs::read_dir(artifact_dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .max_by(|a, b| compare_versions(a, b))
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum VersionPart {
    // Declared before `Number` so `1.0-SNAPSHOT` sorts below `1.0.1`.
    Text(String),
    Number(u64),
}

fn version_parts(version: &str) -> Vec<VersionPart> {
    version
        .split(['.', '-', '_'])
        .filter(|p| !p.is_empty())
        .map(|p| match p.parse() {
            Ok(n) => VersionPart::Number(n),
            Err(_) => VersionPart::Text(p.to_owned()),
        })
        .collect()
}

/// Numeric-aware comparison: `1.10.0 > 1.9.0`.
fn compare_versions(a: &str, b: &str) -> Ordering {
    version_parts(a).cmp(&version_parts(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = r#"{
        "id": "adult",
        "request": { "method": "/beer.BeerService/check", "body": { "age": { "gte": 20 } } },
        "response": { "body": { "status": "OK" } }
    }"#;

    fn write_stub(root: &Path, version: &str, file: &str, content: &str) {
        let dir = root.join("com.example/beer").join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn should_order_versions_numerically() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("2.0.0", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0-SNAPSHOT", "1.0.0.1"), Ordering::Less);
    }

    #[test]
    fn should_resolve_latest_version() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.9.0", "adult.json", CONTRACT);
        write_stub(dir.path(), "1.10.0", "adult.json", CONTRACT);

        let repo = StubRepository::new(dir.path());
        let coords = StubCoordinates::new("com.example", "beer");
        let resolved = repo.resolve(&coords, StubsMode::Local).unwrap();

        assert_eq!(resolved.coordinates.version, "1.10.0");
        assert_eq!(resolved.contracts.len(), 1);
    }

    #[test]
    fn should_resolve_pinned_version() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.9.0", "adult.json", CONTRACT);
        write_stub(dir.path(), "1.10.0", "adult.json", CONTRACT);

        let repo = StubRepository::new(dir.path());
        let coords = StubCoordinates::new("com.example", "beer").with_version("1.9.0");
        let resolved = repo.resolve(&coords, StubsMode::Local).unwrap();

        assert_eq!(resolved.coordinates.version, "1.9.0");
    }

    #[test]
    fn should_ignore_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.0.0", "adult.json", CONTRACT);
        write_stub(dir.path(), "1.0.0", "README.md", "# notes");

        let repo = StubRepository::new(dir.path());
        let resolved = repo
            .resolve(&StubCoordinates::new("com.example", "beer"), StubsMode::Local)
            .unwrap();
        assert_eq!(resolved.contracts.len(), 1);
    }

    #[test]
    fn should_fail_for_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let repo = StubRepository::new(dir.path());
        let err = repo
            .resolve(&StubCoordinates::new("com.example", "wine"), StubsMode::Local)
            .unwrap_err();
        assert!(matches!(err, StubError::Resolution { .. }), "{err:?}");
    }

    #[test]
    fn should_fail_for_missing_pinned_version() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.0.0", "adult.json", CONTRACT);

        let repo = StubRepository::new(dir.path());
        let coords = StubCoordinates::new("com.example", "beer").with_version("2.0.0");
        assert!(matches!(
            repo.resolve(&coords, StubsMode::Local),
            Err(StubError::Resolution { .. })
        ));
    }

    #[test]
    fn should_fail_for_empty_version_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("com.example/beer/1.0.0")).unwrap();

        let repo = StubRepository::new(dir.path());
        assert!(matches!(
            repo.resolve(&StubCoordinates::new("com.example", "beer"), StubsMode::Local),
            Err(StubError::Resolution { .. })
        ));
    }

    #[test]
    fn should_fail_remote_mode() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.0.0", "adult.json", CONTRACT);

        let repo = StubRepository::new(dir.path());
        assert!(matches!(
            repo.resolve(&StubCoordinates::new("com.example", "beer"), StubsMode::Remote),
            Err(StubError::Resolution { .. })
        ));
    }

    #[test]
    fn should_surface_malformed_contract() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1.0.0", "broken.json", "{ not json");

        let repo = StubRepository::new(dir.path());
        assert!(matches!(
            repo.resolve(&StubCoordinates::new("com.example", "beer"), StubsMode::Local),
            Err(StubError::InvalidContract { .. })
        ));
    }
}
