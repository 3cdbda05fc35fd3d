//! Artifact coordinate parsing and repository layout.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::UtilError;

/// Packaging used when a coordinate or descriptor does not name one.
pub const DEFAULT_PACKAGING: &str = "jar";

/// Packaging of a module descriptor document.
pub const DESCRIPTOR_PACKAGING: &str = "pom";

/// A parsed coordinate identifying a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    /// Group identifier, e.g. `"org.apache.commons"`.
    pub group_id: String,
    /// Artifact identifier, e.g. `"commons-lang3"`.
    pub artifact_id: String,
    /// Artifact version, e.g. `"3.14.0"`.
    pub version: String,
    /// File extension / packaging type (defaults to `"jar"`).
    pub packaging: String,
    /// Optional classifier, e.g. `"sources"` or `"linux-x86_64"`.
    pub classifier: Option<String>,
}

/// The identity of an artifact regardless of version.
///
/// Two artifacts with the same key are the same artifact for de-duplication
/// purposes. Scope and exclusions are attributes, not identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: Option<String>,
    pub packaging: String,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.packaging)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

impl Coordinate {
    /// Create a new coordinate with default packaging ("jar") and no classifier.
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_owned(),
            artifact_id: artifact_id.to_owned(),
            version: version.to_owned(),
            packaging: DEFAULT_PACKAGING.to_owned(),
            classifier: None,
        }
    }

    /// Builder method to override the packaging type.
    pub fn with_packaging(mut self, packaging: &str) -> Self {
        self.packaging = packaging.to_owned();
        self
    }

    /// Builder method to set the classifier.
    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_owned());
        self
    }

    /// Parse a coordinate string.
    ///
    /// Accepted formats:
    /// - `"group:artifact:version"` (packaging defaults to "jar")
    /// - `"group:artifact:version:packaging"`
    /// - `"group:artifact:version:packaging:classifier"`
    ///
    /// # Errors
    /// Returns `UtilError::InvalidCoordinate` when the string has fewer than 3
    /// or more than 5 colon-separated parts, or any part is empty.
    pub fn parse(coord: &str) -> Result<Self, UtilError> {
        let parts: Vec<&str> = coord.split(':').collect();

        if parts.len() < 3 || parts.len() > 5 {
            return Err(UtilError::InvalidCoordinate {
                coordinate: coord.to_owned(),
                reason: format!(
                    "expected 3 to 5 colon-separated parts (group:artifact:version[:packaging[:classifier]]), got {}",
                    parts.len()
                ),
            });
        }

        for (i, part) in parts.iter().enumerate() {
            if part.trim().is_empty() {
                let label = match i {
                    0 => "group_id",
                    1 => "artifact_id",
                    2 => "version",
                    3 => "packaging",
                    _ => "classifier",
                };
                return Err(UtilError::InvalidCoordinate {
                    coordinate: coord.to_owned(),
                    reason: format!("{label} is empty"),
                });
            }
        }

        let (Some(group), Some(artifact), Some(version)) =
            (parts.first(), parts.get(1), parts.get(2))
        else {
            return Err(UtilError::InvalidCoordinate {
                coordinate: coord.to_owned(),
                reason: "expected at least 3 parts".to_owned(),
            });
        };

        let mut result = Self::new(group, artifact, version);
        if let Some(packaging) = parts.get(3) {
            result.packaging = (*packaging).to_owned();
        }
        if let Some(classifier) = parts.get(4) {
            result.classifier = Some((*classifier).to_owned());
        }
        Ok(result)
    }

    /// The identity key of this coordinate.
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
            packaging: self.packaging.clone(),
        }
    }

    /// The coordinate of the module descriptor describing this artifact.
    ///
    /// Same group, artifact and version; descriptor packaging; no classifier.
    pub fn descriptor(&self) -> Self {
        Self::new(&self.group_id, &self.artifact_id, &self.version)
            .with_packaging(DESCRIPTOR_PACKAGING)
    }

    /// The filename for this artifact:
    /// `"{artifact_id}-{version}[-{classifier}].{packaging}"`.
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, classifier, self.packaging
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.packaging),
        }
    }

    /// The repository-relative path for this artifact.
    ///
    /// Dots in `group_id` are replaced with `/`, then:
    /// `"{group_path}/{artifact_id}/{version}/{filename}"`.
    pub fn repository_path(&self) -> String {
        let group_path = self.group_id.replace('.', "/");
        format!(
            "{}/{}/{}/{}",
            group_path,
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Return the local path for this artifact inside a repository rooted at `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        let group_path = self.group_id.replace('.', "/");
        root.join(group_path)
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.packaging
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parse_three_part() {
        let coord = Coordinate::parse("org.apache.commons:commons-lang3:3.14.0").unwrap();
        assert_eq!(coord.group_id, "org.apache.commons");
        assert_eq!(coord.artifact_id, "commons-lang3");
        assert_eq!(coord.version, "3.14.0");
        assert_eq!(coord.packaging, "jar");
        assert!(coord.classifier.is_none());
    }

    #[test]
    fn parse_five_part() {
        let coord = Coordinate::parse("io.netty:netty-transport:4.1.0:jar:linux-x86_64").unwrap();
        assert_eq!(coord.packaging, "jar");
        assert_eq!(coord.classifier.as_deref(), Some("linux-x86_64"));
    }

    #[test]
    fn parse_rejects_two_parts() {
        let err = Coordinate::parse("org.example:artifact")
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid artifact coordinate"), "error was: {err}");
    }

    #[test]
    fn parse_rejects_six_parts() {
        let err = Coordinate::parse("a:b:c:d:e:f").unwrap_err().to_string();
        assert!(err.contains("3 to 5"), "error was: {err}");
    }

    #[test]
    fn parse_rejects_empty_parts() {
        let err = Coordinate::parse("org.example::1.0").unwrap_err().to_string();
        assert!(err.contains("artifact_id is empty"), "error was: {err}");
    }

    #[test]
    fn key_ignores_version() {
        let a = Coordinate::new("g", "a", "1.0");
        let b = Coordinate::new("g", "a", "2.0");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), b.clone().with_classifier("tests").key());
        assert_ne!(a.key(), b.with_packaging("war").key());
    }

    #[test]
    fn descriptor_drops_classifier_and_uses_pom() {
        let coord = Coordinate::new("g", "tool", "1.2")
            .with_packaging("zip")
            .with_classifier("bin");
        let descriptor = coord.descriptor();
        assert_eq!(descriptor.to_string(), "g:tool:1.2:pom");
    }

    #[test]
    fn filename_with_classifier() {
        let coord = Coordinate::new("org.example", "artifact", "1.0.0").with_classifier("tests");
        assert_eq!(coord.filename(), "artifact-1.0.0-tests.jar");
    }

    #[test]
    fn repository_path_dots_to_slashes() {
        let coord = Coordinate::new("org.apache.commons", "commons-lang3", "3.14.0");
        assert_eq!(
            coord.repository_path(),
            "org/apache/commons/commons-lang3/3.14.0/commons-lang3-3.14.0.jar"
        );
    }

    #[test]
    fn local_path_layout() {
        let coord = Coordinate::new("org.apache.commons", "commons-lang3", "3.14.0");
        let path = coord.local_path(Path::new("/home/user/.m2/repository"));
        assert_eq!(
            path,
            Path::new("/home/user/.m2/repository/org/apache/commons/commons-lang3/3.14.0/commons-lang3-3.14.0.jar")
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        let coord = Coordinate::new("g", "a", "1").with_classifier("c");
        assert_eq!(Coordinate::parse(&coord.to_string()).unwrap(), coord);
    }
}
