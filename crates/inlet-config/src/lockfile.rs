use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::manifest::RawDependency;

/// The `inlet.lock` resolution snapshot.
///
/// Lists every module the resolver may hand out, where its file lives, and
/// the dependencies its own descriptor declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lockfile {
    /// Root of a repository laid out as `group/artifact/version/file`.
    /// Modules without an explicit `path` are located under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "module", default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleLock>,
}

/// A locked module entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleLock {
    /// `group:artifact:version[:packaging[:classifier]]`.
    pub coordinate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<RawDependency>,
}

impl Lockfile {
    /// Read and parse an `inlet.lock` from the given path.
    /// Returns an empty lockfile if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, LockfileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| LockfileError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let lockfile: Lockfile = toml::from_str(&content).map_err(|e| LockfileError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(lockfile)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockfileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid inlet.lock at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_valid_lockfile() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("inlet.lock");
        fs::write(
            &path,
            r#"
repository = "/srv/repo"

[[module]]
coordinate = "org.tools:runner:2.0"

[[module.dependencies]]
group_id = "org.tools"
artifact_id = "runner-api"
version = "2.0"

[[module]]
coordinate = "org.tools:runner-api:2.0"
path = "/opt/runner-api.jar"
"#,
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let lockfile = Lockfile::from_path(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(lockfile.repository.as_deref(), Some("/srv/repo"));
        assert_eq!(lockfile.modules.len(), 2);
        let runner = lockfile
            .modules
            .first()
            .unwrap_or_else(|| panic!("missing module"));
        assert!(runner.path.is_none());
        assert_eq!(runner.dependencies.len(), 1);
        let api = lockfile
            .modules
            .get(1)
            .unwrap_or_else(|| panic!("missing module"));
        assert_eq!(api.path.as_deref(), Some("/opt/runner-api.jar"));
    }

    #[test]
    fn default_when_absent() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let lockfile = Lockfile::from_path(&dir.path().join("nonexistent.lock"))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(lockfile.repository.is_none());
        assert!(lockfile.modules.is_empty());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("inlet.lock");
        fs::write(&path, "[[module]]\npath = 3\n").unwrap_or_else(|e| panic!("{e}"));
        let err = Lockfile::from_path(&path)
            .err()
            .unwrap_or_else(|| panic!("expected an error"))
            .to_string();
        assert!(err.contains("invalid inlet.lock"), "error was: {err}");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            #[allow(clippy::unwrap_used)]
            fn lockfile_round_trip(
                group in "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}",
                artifact in "[a-z][a-z0-9-]{0,15}",
                version in "[0-9]{1,2}\\.[0-9]{1,2}",
                path in proptest::option::of("/[a-z]{1,10}/[a-z]{1,10}\\.jar"),
            ) {
                let original = Lockfile {
                    repository: None,
                    modules: vec![ModuleLock {
                        coordinate: format!("{group}:{artifact}:{version}"),
                        path,
                        dependencies: vec![RawDependency {
                            group_id: group.clone(),
                            artifact_id: format!("{artifact}-api"),
                            version: Some(version.clone()),
                            ..RawDependency::default()
                        }],
                    }],
                };
                let content = toml::to_string_pretty(&original).unwrap();
                let reparsed: Lockfile = toml::from_str(&content).unwrap();
                prop_assert_eq!(original, reparsed);
            }
        }
    }
}
