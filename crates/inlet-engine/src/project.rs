//! A project on disk: `inlet.toml`, `inlet.lock`, and the resolved views
//! the engine needs from them.

use std::path::{Path, PathBuf};

use inlet_config::lockfile::Lockfile;
use inlet_config::manifest::{Manifest, RawDependency};
use inlet_util::coordinate::Coordinate;

use crate::classpath::ClasspathInputs;
use crate::descriptor::{self, ExclusionFilter};
use crate::error::EngineError;
use crate::exec::ExecRequest;
use crate::repository::LockedRepository;
use crate::resolver::{ProjectModel, ResolutionEngine, ResolvedArtifact, ScopeFilter};

pub const MANIFEST_FILE: &str = "inlet.toml";
pub const LOCKFILE_FILE: &str = "inlet.lock";

/// Output directories and dependencies of a project, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    coordinate: Coordinate,
    output_directory: PathBuf,
    test_output_directory: PathBuf,
    resolved: Vec<ResolvedArtifact>,
    declared: Vec<RawDependency>,
}

impl ProjectLayout {
    /// Resolve the manifest's dependencies, test scope included.
    ///
    /// Output directories are taken relative to `root`.
    ///
    /// # Errors
    /// Returns a normalization error for a malformed declaration, or a
    /// resolution error if the engine cannot resolve the graph.
    pub fn resolve(
        root: &Path,
        manifest: &Manifest,
        engine: &dyn ResolutionEngine,
    ) -> Result<Self, EngineError> {
        let project = &manifest.project;
        let coordinate = Coordinate::new(&project.group_id, &project.name, &project.version);
        let dependencies = descriptor::normalize_all(&manifest.dependencies)?;
        let resolved = engine.resolve_transitively(
            &dependencies,
            &coordinate,
            ScopeFilter::Test,
            &ExclusionFilter::new(),
        )?;
        Ok(Self {
            coordinate,
            output_directory: root.join(&project.output_directory),
            test_output_directory: root.join(&project.test_output_directory),
            resolved,
            declared: manifest.dependencies.clone(),
        })
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }
}

impl ProjectModel for ProjectLayout {
    fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    fn test_output_directory(&self) -> &Path {
        &self.test_output_directory
    }

    fn resolved_dependencies(&self) -> &[ResolvedArtifact] {
        &self.resolved
    }

    fn declared_dependencies(&self) -> &[RawDependency] {
        &self.declared
    }
}

/// The coordinate the tool's own dependencies are resolved under.
fn tool_coordinate() -> Coordinate {
    Coordinate::new("inlet", "inlet", env!("CARGO_PKG_VERSION"))
}

/// Resolve the tool's own dependencies, runtime scope only.
///
/// # Errors
/// Returns a normalization error for a malformed declaration, or a
/// resolution error if the engine cannot resolve the graph.
pub fn resolve_own_dependencies(
    declared: &[RawDependency],
    engine: &dyn ResolutionEngine,
) -> Result<Vec<ResolvedArtifact>, EngineError> {
    let dependencies = descriptor::normalize_all(declared)?;
    Ok(engine.resolve_transitively(
        &dependencies,
        &tool_coordinate(),
        ScopeFilter::Runtime,
        &ExclusionFilter::new(),
    )?)
}

/// A loaded project directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    manifest: Manifest,
    repository: LockedRepository,
}

impl Workspace {
    /// Load `inlet.toml` and `inlet.lock` from `root`. A missing lockfile
    /// behaves as an empty one.
    ///
    /// # Errors
    /// Returns an error if either file cannot be read or parsed, or if a
    /// locked module cannot be located.
    pub fn load(root: &Path) -> Result<Self, EngineError> {
        let manifest = Manifest::from_path(&root.join(MANIFEST_FILE))?;
        let lockfile = Lockfile::from_path(&root.join(LOCKFILE_FILE))?;
        let repository = LockedRepository::from_lockfile(&lockfile, root)?;
        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            repository,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn repository(&self) -> &LockedRepository {
        &self.repository
    }

    /// # Errors
    /// See [`ProjectLayout::resolve`].
    pub fn project(&self) -> Result<ProjectLayout, EngineError> {
        ProjectLayout::resolve(&self.root, &self.manifest, &self.repository)
    }

    /// # Errors
    /// See [`resolve_own_dependencies`].
    pub fn own_dependencies(&self) -> Result<Vec<ResolvedArtifact>, EngineError> {
        resolve_own_dependencies(&self.manifest.exec.plugin_dependencies, &self.repository)
    }

    /// # Errors
    /// See [`ExecRequest::from_config`].
    pub fn request(&self) -> Result<ExecRequest, EngineError> {
        ExecRequest::from_config(&self.manifest.exec)
    }

    /// The assembler inputs for `project` and `own`, backed by this
    /// workspace's repository.
    pub fn inputs<'a>(
        &'a self,
        project: &'a ProjectLayout,
        own: &'a [ResolvedArtifact],
    ) -> ClasspathInputs<'a> {
        ClasspathInputs {
            project,
            own_dependencies: own,
            engine: &self.repository,
            descriptors: &self.repository,
        }
    }

    /// Validate every declaration without running anything.
    ///
    /// # Errors
    /// Returns the first problem found: a malformed declaration, an invalid
    /// `[exec]` table, or an unresolvable dependency.
    pub fn check(&self) -> Result<CheckSummary, EngineError> {
        let request = self.request()?;
        let project = self.project()?;
        let own = self.own_dependencies()?;
        let system = descriptor::system_artifacts(&self.manifest.dependencies)?;
        Ok(CheckSummary {
            entry_point: request.entry_point,
            project_dependencies: project.resolved_dependencies().len() + system.len(),
            own_dependencies: own.len(),
        })
    }
}

/// What `check` found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    pub entry_point: String,
    pub project_dependencies: usize,
    pub own_dependencies: usize,
}
