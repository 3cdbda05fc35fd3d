//! Contracts of the resolution collaborators.
//!
//! The engine never resolves versions itself. It hands normalized
//! dependencies to a [`ResolutionEngine`], reads module descriptors through a
//! [`DescriptorSource`], and learns about the project through a
//! [`ProjectModel`].

use std::path::{Path, PathBuf};

use inlet_config::manifest::RawDependency;
use inlet_util::coordinate::Coordinate;

use crate::descriptor::{Dependency, ExclusionFilter, Scope};

/// A dependency together with the file the resolver found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub scope: Scope,
    /// For system scope, the declared `system_path`.
    pub path: PathBuf,
}

/// Which scopes a resolution should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeFilter {
    /// No filtering.
    #[default]
    All,
    /// What is needed to compile: compile, provided, system.
    Compile,
    /// What is needed to run: compile, runtime.
    Runtime,
    /// Everything, test included.
    Test,
}

impl ScopeFilter {
    pub fn accepts(self, scope: Scope) -> bool {
        match self {
            Self::All | Self::Test => true,
            Self::Compile => matches!(scope, Scope::Compile | Scope::Provided | Scope::System),
            Self::Runtime => matches!(scope, Scope::Compile | Scope::Runtime),
        }
    }
}

/// Metadata document describing a module's own dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub coordinate: Coordinate,
    pub dependencies: Vec<RawDependency>,
}

/// Turns dependency declarations into files.
pub trait ResolutionEngine {
    /// Resolve `artifacts` and everything they transitively require.
    ///
    /// Exclusions carried by each dependency, and `excludes`, are applied
    /// while walking the graph, so an excluded artifact's subtree is never
    /// visited. System-scope dependencies are not returned.
    ///
    /// # Errors
    /// Returns an error if any reachable artifact cannot be resolved.
    fn resolve_transitively(
        &self,
        artifacts: &[Dependency],
        root: &Coordinate,
        scope: ScopeFilter,
        excludes: &ExclusionFilter,
    ) -> Result<Vec<ResolvedArtifact>, ResolutionError>;
}

/// Reads module descriptors.
pub trait DescriptorSource {
    /// # Errors
    /// Returns an error if the descriptor does not exist or cannot be read.
    fn fetch_module_descriptor(
        &self,
        coordinate: &Coordinate,
    ) -> Result<ModuleDescriptor, ResolutionError>;
}

/// What the engine needs to know about the project being built.
pub trait ProjectModel {
    fn output_directory(&self) -> &Path;
    fn test_output_directory(&self) -> &Path;
    /// Resolved dependencies in resolver order. Never contains system scope.
    fn resolved_dependencies(&self) -> &[ResolvedArtifact];
    /// Dependencies exactly as declared.
    fn declared_dependencies(&self) -> &[RawDependency];
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("cannot resolve {coordinate}: {reason}")]
    Unresolvable { coordinate: String, reason: String },

    #[error("module descriptor {coordinate} not found")]
    DescriptorNotFound { coordinate: String },

    #[error("invalid module descriptor {coordinate}: {reason}")]
    InvalidDescriptor { coordinate: String, reason: String },
}
