//! Normalization of declared dependencies.
//!
//! Raw descriptors come straight from `inlet.toml` or from a fetched module
//! descriptor. Normalizing applies the defaults (`jar` packaging, `compile`
//! scope), parses the version specification, and turns exclusions into an
//! [`ExclusionFilter`] that travels with the dependency into resolution.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use inlet_config::manifest::RawDependency;
use inlet_util::coordinate::{ArtifactKey, Coordinate, DEFAULT_PACKAGING};
use inlet_util::version::VersionSpec;

use crate::error::EngineError;
use crate::resolver::ResolvedArtifact;

/// Visibility classification of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Compile,
    Runtime,
    Test,
    Provided,
    System,
}

impl Scope {
    /// Parse a scope name, ignoring ASCII case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "compile" => Some(Self::Compile),
            "runtime" => Some(Self::Runtime),
            "test" => Some(Self::Test),
            "provided" => Some(Self::Provided),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::Provided => "provided",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of `group:artifact` pairs removed during transitive resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    pairs: BTreeSet<(String, String)>,
}

impl ExclusionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group_id: &str, artifact_id: &str) {
        self.pairs
            .insert((group_id.to_owned(), artifact_id.to_owned()));
    }

    /// Whether the artifact `group_id:artifact_id` is excluded.
    pub fn excludes(&self, group_id: &str, artifact_id: &str) -> bool {
        self.pairs
            .iter()
            .any(|(g, a)| g == group_id && a == artifact_id)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The union of this filter and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            pairs: self.pairs.union(&other.pairs).cloned().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ExclusionFilter {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut filter = Self::new();
        for (group_id, artifact_id) in iter {
            filter.insert(group_id, artifact_id);
        }
        filter
    }
}

/// A normalized dependency record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Coordinate whose `version` is the specification as written.
    pub coordinate: Coordinate,
    pub version: VersionSpec,
    pub scope: Scope,
    pub optional: bool,
    /// Explicit location, present exactly when `scope` is [`Scope::System`].
    pub system_path: Option<PathBuf>,
    pub exclusions: ExclusionFilter,
}

impl Dependency {
    /// The identity key: group, artifact, classifier and packaging.
    pub fn key(&self) -> ArtifactKey {
        self.coordinate.key()
    }
}

/// Normalize a single declared dependency.
///
/// # Errors
/// Returns `InvalidVersionSpec` if the version is missing or malformed,
/// `UnknownScope` for an unrecognized scope name, and `MissingSystemPath`
/// for a system-scope dependency without an explicit path.
pub fn normalize(raw: &RawDependency) -> Result<Dependency, EngineError> {
    let label = format!("{}:{}", raw.group_id, raw.artifact_id);

    let spec_text = raw.version.as_deref().unwrap_or_default();
    let version =
        VersionSpec::parse(spec_text).map_err(|source| EngineError::InvalidVersionSpec {
            coordinate: label.clone(),
            source,
        })?;

    let scope = match raw.scope.as_deref() {
        None => Scope::Compile,
        Some(name) => Scope::parse(name).ok_or_else(|| EngineError::UnknownScope {
            coordinate: label.clone(),
            scope: name.to_owned(),
        })?,
    };

    let system_path = if scope == Scope::System {
        let path = raw
            .system_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| EngineError::MissingSystemPath {
                coordinate: label.clone(),
            })?;
        Some(PathBuf::from(path))
    } else {
        None
    };

    let packaging = raw.packaging.as_deref().unwrap_or(DEFAULT_PACKAGING);
    let mut coordinate = Coordinate::new(&raw.group_id, &raw.artifact_id, spec_text.trim())
        .with_packaging(packaging);
    if let Some(classifier) = raw.classifier.as_deref() {
        coordinate = coordinate.with_classifier(classifier);
    }

    let exclusions = raw
        .exclusions
        .iter()
        .map(|e| (e.group_id.as_str(), e.artifact_id.as_str()))
        .collect();

    Ok(Dependency {
        coordinate,
        version,
        scope,
        optional: raw.optional,
        system_path,
        exclusions,
    })
}

/// Normalize every declared dependency, stopping at the first error.
///
/// # Errors
/// Returns the first normalization error, see [`normalize`].
pub fn normalize_all(raws: &[RawDependency]) -> Result<Vec<Dependency>, EngineError> {
    raws.iter().map(normalize).collect()
}

/// Recover the system-scope dependencies from the declared list.
///
/// Resolution engines never hand these back, so they are rebuilt here from
/// their explicit paths.
///
/// # Errors
/// Returns the first normalization error, see [`normalize`].
pub fn system_artifacts(declared: &[RawDependency]) -> Result<Vec<ResolvedArtifact>, EngineError> {
    let mut artifacts = Vec::new();
    for dependency in normalize_all(declared)? {
        if let Some(path) = dependency.system_path {
            artifacts.push(ResolvedArtifact {
                coordinate: dependency.coordinate,
                scope: Scope::System,
                path,
            });
        }
    }
    Ok(artifacts)
}
