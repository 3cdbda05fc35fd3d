//! Restricting the tool's dependencies to one artifact's subtree.

use crate::descriptor::{self, ExclusionFilter};
use crate::error::EngineError;
use crate::matcher::ExecutableMatcher;
use crate::reporter::Reporter;
use crate::resolver::{DescriptorSource, ResolutionEngine, ResolvedArtifact, ScopeFilter};

/// Finds the executable in a pool and resolves what it needs to run.
pub struct SubtreeResolver<'a> {
    engine: &'a dyn ResolutionEngine,
    descriptors: &'a dyn DescriptorSource,
    reporter: &'a dyn Reporter,
}

impl<'a> SubtreeResolver<'a> {
    pub fn new(
        engine: &'a dyn ResolutionEngine,
        descriptors: &'a dyn DescriptorSource,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            engine,
            descriptors,
            reporter,
        }
    }

    /// The first artifact of `pool` satisfying `matcher`.
    ///
    /// # Errors
    /// Returns `ExecutableNotFound` if nothing matches.
    pub fn find_executable<'p>(
        &self,
        matcher: &ExecutableMatcher,
        pool: &'p [ResolvedArtifact],
    ) -> Result<&'p ResolvedArtifact, EngineError> {
        pool.iter()
            .find(|artifact| matcher.matches(artifact))
            .ok_or_else(|| EngineError::ExecutableNotFound {
                matcher: matcher.to_string(),
            })
    }

    /// The executable matched by `matcher` plus its transitive dependencies.
    ///
    /// The executable's module descriptor is the resolution root; its
    /// declared dependencies and exclusions are honored, and no scope filter
    /// applies.
    ///
    /// # Errors
    /// Returns `ExecutableNotFound` if nothing matches, and
    /// `ExecutableResolutionFailed` if the descriptor cannot be read or the
    /// subtree cannot be resolved.
    pub fn resolve_subtree(
        &self,
        matcher: &ExecutableMatcher,
        pool: &[ResolvedArtifact],
    ) -> Result<Vec<ResolvedArtifact>, EngineError> {
        let executable = self.find_executable(matcher, pool)?;
        let failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            EngineError::ExecutableResolutionFailed {
                executable: executable.coordinate.to_string(),
                source,
            }
        };

        self.reporter.debug(&format!(
            "Resolving the dependencies of the executable {}",
            executable.coordinate
        ));
        let root = executable.coordinate.descriptor();
        let module = self
            .descriptors
            .fetch_module_descriptor(&root)
            .map_err(|e| failed(Box::new(e)))?;

        let mut artifacts =
            descriptor::normalize_all(&module.dependencies).map_err(|e| failed(Box::new(e)))?;
        let own = inlet_config::manifest::RawDependency {
            group_id: executable.coordinate.group_id.clone(),
            artifact_id: executable.coordinate.artifact_id.clone(),
            version: Some(format!("[{}]", executable.coordinate.version)),
            packaging: Some(executable.coordinate.packaging.clone()),
            classifier: executable.coordinate.classifier.clone(),
            ..Default::default()
        };
        artifacts.push(descriptor::normalize(&own).map_err(|e| failed(Box::new(e)))?);

        self.engine
            .resolve_transitively(&artifacts, &root, ScopeFilter::All, &ExclusionFilter::new())
            .map_err(|e| failed(Box::new(e)))
    }
}
