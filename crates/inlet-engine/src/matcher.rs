//! Selecting the executable dependency out of the tool's pool.

use std::fmt;

use inlet_config::manifest::ExecutableDependency;
use inlet_util::version::{Version, VersionSpec};

use crate::error::EngineError;
use crate::resolver::ResolvedArtifact;

/// Selects one artifact out of a dependency pool.
///
/// Every field is optional; an absent field matches anything. The version is
/// a specification, so a range selects every version inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutableMatcher {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<VersionSpec>,
    pub packaging: Option<String>,
    pub classifier: Option<String>,
}

impl ExecutableMatcher {
    /// Build a matcher from the `[exec.executable_dependency]` table.
    ///
    /// # Errors
    /// Returns `InvalidVersionSpec` if the version is not a valid specification.
    pub fn from_config(config: &ExecutableDependency) -> Result<Self, EngineError> {
        let version = config
            .version
            .as_deref()
            .map(VersionSpec::parse)
            .transpose()
            .map_err(|source| EngineError::InvalidVersionSpec {
                coordinate: "executable dependency".to_owned(),
                source,
            })?;
        Ok(Self {
            group_id: config.group_id.clone(),
            artifact_id: config.artifact_id.clone(),
            version,
            packaging: config.packaging.clone(),
            classifier: config.classifier.clone(),
        })
    }

    pub fn matches(&self, artifact: &ResolvedArtifact) -> bool {
        let c = &artifact.coordinate;
        field_matches(self.group_id.as_deref(), &c.group_id)
            && field_matches(self.artifact_id.as_deref(), &c.artifact_id)
            && field_matches(self.packaging.as_deref(), &c.packaging)
            && self
                .classifier
                .as_deref()
                .is_none_or(|want| c.classifier.as_deref() == Some(want))
            && self
                .version
                .as_ref()
                .is_none_or(|spec| spec.contains(&Version::parse(&c.version)))
    }
}

fn field_matches(want: Option<&str>, actual: &str) -> bool {
    want.is_none_or(|w| w == actual)
}

impl fmt::Display for ExecutableMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |value: Option<&str>| value.unwrap_or("*").to_owned();
        write!(
            f,
            "{}:{}:{}:{}",
            part(self.group_id.as_deref()),
            part(self.artifact_id.as_deref()),
            self.version
                .as_ref()
                .map_or_else(|| "*".to_owned(), ToString::to_string),
            part(self.packaging.as_deref()),
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}
