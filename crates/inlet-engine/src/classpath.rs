//! Ordered classpath assembly.
//!
//! The tool's own dependencies (or the executable's subtree) come first, so
//! they shadow the project. The project follows: compiled output, test output,
//! resolved dependencies, then system-scope dependencies. A location already
//! present is never appended again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::descriptor;
use crate::error::EngineError;
use crate::matcher::ExecutableMatcher;
use crate::reporter::Reporter;
use crate::resolver::{DescriptorSource, ProjectModel, ResolutionEngine, ResolvedArtifact};
use crate::subtree::SubtreeResolver;

/// An ordered list of distinct locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, path: &Path) -> bool {
        if !self.seen.insert(path.to_path_buf()) {
            return false;
        }
        self.entries.push(path.to_path_buf());
        true
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries joined by `separator`, e.g. `:` for a search path.
    pub fn join(&self, separator: &str) -> String {
        self.entries
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl<'p> FromIterator<&'p Path> for Classpath {
    fn from_iter<I: IntoIterator<Item = &'p Path>>(iter: I) -> Self {
        let mut classpath = Self::new();
        for path in iter {
            classpath.push(path);
        }
        classpath
    }
}

/// Everything the assembler reads.
#[derive(Clone, Copy)]
pub struct ClasspathInputs<'a> {
    pub project: &'a dyn ProjectModel,
    /// The tool's own resolved dependencies, in resolver order.
    pub own_dependencies: &'a [ResolvedArtifact],
    pub engine: &'a dyn ResolutionEngine,
    pub descriptors: &'a dyn DescriptorSource,
}

pub struct ClasspathAssembler<'a> {
    inputs: ClasspathInputs<'a>,
    reporter: &'a dyn Reporter,
}

impl<'a> ClasspathAssembler<'a> {
    pub fn new(inputs: ClasspathInputs<'a>, reporter: &'a dyn Reporter) -> Self {
        Self { inputs, reporter }
    }

    /// Build the classpath.
    ///
    /// With a `selector`, only the matched executable and its transitive
    /// dependencies are taken from the tool's pool. That subtree is resolved
    /// before anything is appended.
    ///
    /// # Errors
    /// Returns `ExecutableNotFound` or `ExecutableResolutionFailed` from the
    /// subtree resolver, or a normalization error from the project's declared
    /// system-scope dependencies.
    pub fn assemble(
        &self,
        include_project: bool,
        include_own: bool,
        selector: Option<&ExecutableMatcher>,
    ) -> Result<Classpath, EngineError> {
        let own: Vec<ResolvedArtifact> = match (include_own, selector) {
            (false, _) => Vec::new(),
            (true, None) => self.inputs.own_dependencies.to_vec(),
            (true, Some(matcher)) => SubtreeResolver::new(
                self.inputs.engine,
                self.inputs.descriptors,
                self.reporter,
            )
            .resolve_subtree(matcher, self.inputs.own_dependencies)?,
        };
        let system = if include_project {
            descriptor::system_artifacts(self.inputs.project.declared_dependencies())?
        } else {
            Vec::new()
        };

        let mut classpath = Classpath::new();
        for artifact in &own {
            self.append(&mut classpath, &artifact.path);
        }
        if include_project {
            let project = self.inputs.project;
            self.append(&mut classpath, project.output_directory());
            self.append(&mut classpath, project.test_output_directory());
            for artifact in project.resolved_dependencies() {
                self.append(&mut classpath, &artifact.path);
            }
            for artifact in &system {
                self.append(&mut classpath, &artifact.path);
            }
        }
        Ok(classpath)
    }

    fn append(&self, classpath: &mut Classpath, path: &Path) {
        if classpath.push(path) {
            self.reporter
                .debug(&format!("Adding to classpath: {}", path.display()));
        }
    }
}
