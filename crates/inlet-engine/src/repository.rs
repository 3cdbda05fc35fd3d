//! A resolution engine backed by `inlet.lock`.
//!
//! Every module the lockfile lists is a candidate. Resolution walks the graph
//! breadth first; the first occurrence of an artifact key wins, so the
//! nearest declaration decides the version.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use inlet_config::lockfile::Lockfile;
use inlet_config::manifest::RawDependency;
use inlet_util::coordinate::{ArtifactKey, Coordinate};
use inlet_util::version::Version;

use crate::descriptor::{self, Dependency, ExclusionFilter, Scope};
use crate::error::EngineError;
use crate::resolver::{
    DescriptorSource, ModuleDescriptor, ResolutionEngine, ResolutionError, ResolvedArtifact,
    ScopeFilter,
};

#[derive(Debug, Clone)]
struct LockedModule {
    coordinate: Coordinate,
    version: Version,
    path: PathBuf,
    dependencies: Vec<RawDependency>,
}

/// The modules listed in a lockfile, with their locations resolved.
#[derive(Debug, Clone, Default)]
pub struct LockedRepository {
    modules: Vec<LockedModule>,
}

impl LockedRepository {
    /// Build a repository from a parsed lockfile.
    ///
    /// Relative paths, including the repository root, are taken relative to
    /// `base`.
    ///
    /// # Errors
    /// Returns an error if a module coordinate is malformed, or if a module
    /// has no explicit path and the lockfile names no repository root.
    pub fn from_lockfile(lockfile: &Lockfile, base: &Path) -> Result<Self, EngineError> {
        let root = lockfile.repository.as_deref().map(|r| base.join(r));
        let mut modules = Vec::with_capacity(lockfile.modules.len());
        for entry in &lockfile.modules {
            let coordinate = Coordinate::parse(&entry.coordinate)?;
            let path = match (&entry.path, &root) {
                (Some(path), _) => base.join(path),
                (None, Some(root)) => coordinate.local_path(root),
                (None, None) => {
                    return Err(EngineError::Repository {
                        coordinate: entry.coordinate.clone(),
                        reason: "no path given and no repository root configured".to_owned(),
                    })
                }
            };
            modules.push(LockedModule {
                version: Version::parse(&coordinate.version),
                coordinate,
                path,
                dependencies: entry.dependencies.clone(),
            });
        }
        Ok(Self { modules })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The locked module best satisfying `dependency`: the exact version for
    /// a soft version, otherwise the highest version inside the range.
    fn select(&self, dependency: &Dependency) -> Option<&LockedModule> {
        let key = dependency.key();
        self.modules
            .iter()
            .filter(|m| m.coordinate.key() == key && dependency.version.contains(&m.version))
            .max_by(|a, b| a.version.cmp(&b.version))
    }
}

impl ResolutionEngine for LockedRepository {
    fn resolve_transitively(
        &self,
        artifacts: &[Dependency],
        root: &Coordinate,
        scope: ScopeFilter,
        excludes: &ExclusionFilter,
    ) -> Result<Vec<ResolvedArtifact>, ResolutionError> {
        let mut seen: HashSet<ArtifactKey> = HashSet::new();
        seen.insert(root.key());

        let mut queue: VecDeque<(Dependency, ExclusionFilter)> = artifacts
            .iter()
            .filter(|d| d.scope != Scope::System)
            .filter(|d| !excludes.excludes(&d.coordinate.group_id, &d.coordinate.artifact_id))
            .map(|d| (d.clone(), ExclusionFilter::new()))
            .collect();

        let mut resolved = Vec::new();
        while let Some((dependency, inherited)) = queue.pop_front() {
            if !scope.accepts(dependency.scope) || !seen.insert(dependency.key()) {
                continue;
            }

            let module = self.select(&dependency).ok_or_else(|| ResolutionError::Unresolvable {
                coordinate: dependency.coordinate.to_string(),
                reason: format!("no locked module satisfies {}", dependency.version),
            })?;

            let mut coordinate = module.coordinate.clone();
            coordinate.packaging.clone_from(&dependency.coordinate.packaging);
            coordinate.classifier.clone_from(&dependency.coordinate.classifier);
            resolved.push(ResolvedArtifact {
                coordinate,
                scope: dependency.scope,
                path: module.path.clone(),
            });

            let filter = inherited.union(&dependency.exclusions);
            for raw in &module.dependencies {
                let child = descriptor::normalize(raw).map_err(|e| {
                    ResolutionError::InvalidDescriptor {
                        coordinate: module.coordinate.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                if child.optional
                    || matches!(child.scope, Scope::Test | Scope::Provided | Scope::System)
                {
                    continue;
                }
                let (group, artifact) = (&child.coordinate.group_id, &child.coordinate.artifact_id);
                if filter.excludes(group, artifact) || excludes.excludes(group, artifact) {
                    continue;
                }
                let child_scope = match (dependency.scope, child.scope) {
                    (Scope::Runtime, Scope::Compile) => Scope::Runtime,
                    (_, s) => s,
                };
                queue.push_back((
                    Dependency {
                        scope: child_scope,
                        ..child
                    },
                    filter.clone(),
                ));
            }
        }
        Ok(resolved)
    }
}

impl DescriptorSource for LockedRepository {
    fn fetch_module_descriptor(
        &self,
        coordinate: &Coordinate,
    ) -> Result<ModuleDescriptor, ResolutionError> {
        let version = Version::parse(&coordinate.version);
        self.modules
            .iter()
            .find(|m| {
                m.coordinate.group_id == coordinate.group_id
                    && m.coordinate.artifact_id == coordinate.artifact_id
                    && m.version == version
            })
            .map(|m| ModuleDescriptor {
                coordinate: coordinate.clone(),
                dependencies: m.dependencies.clone(),
            })
            .ok_or_else(|| ResolutionError::DescriptorNotFound {
                coordinate: coordinate.to_string(),
            })
    }
}
