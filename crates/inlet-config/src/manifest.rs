use serde::{Deserialize, Serialize};
use std::path::Path;

/// The `inlet.toml` project manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: Project,
    /// Dependencies declared by the project, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    pub exec: ExecConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Directory holding the project's compiled main output.
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
    /// Directory holding the project's compiled test output.
    #[serde(default = "default_test_output_directory")]
    pub test_output_directory: String,
}

fn default_group_id() -> String {
    "local".to_owned()
}

fn default_version() -> String {
    "0.0.0".to_owned()
}

fn default_output_directory() -> String {
    "target/classes".to_owned()
}

fn default_test_output_directory() -> String {
    "target/test-classes".to_owned()
}

/// A dependency as declared, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependency {
    pub group_id: String,
    pub artifact_id: String,
    /// Version or version range, e.g. `"1.2"` or `"[1.0,2.0)"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: bool,
    /// Explicit location; only meaningful for `scope = "system"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<Exclusion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

/// The `[exec]` table: what to run and how to wind it down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Name of the entry point to invoke.
    pub main_class: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    /// A single command line; when set it replaces `arguments`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commandline_args: Option<String>,
    #[serde(default)]
    pub system_properties: Vec<Property>,
    #[serde(default = "default_true")]
    pub include_project_dependencies: bool,
    #[serde(default)]
    pub include_plugin_dependencies: bool,
    /// Dependencies of the executing tool itself.
    #[serde(default)]
    pub plugin_dependencies: Vec<RawDependency>,
    /// Restricts the tool's dependencies to one artifact's subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_dependency: Option<ExecutableDependency>,
    #[serde(default = "default_true")]
    pub cleanup_daemon_threads: bool,
    /// Milliseconds; zero or negative waits without a deadline.
    #[serde(default = "default_daemon_thread_join_timeout")]
    pub daemon_thread_join_timeout: i64,
    #[serde(default)]
    pub stop_unresponsive_daemon_threads: bool,
    /// Deprecated; accepted but has no effect.
    #[serde(default)]
    pub keep_alive: bool,
    /// Deprecated; accepted but has no effect.
    #[serde(default = "default_kill_after")]
    pub kill_after: i64,
}

fn default_true() -> bool {
    true
}

fn default_daemon_thread_join_timeout() -> i64 {
    15_000
}

fn default_kill_after() -> i64 {
    -1
}

/// A global property set for the duration of the execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Selects one of the tool's dependencies; omitted fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
}

impl Manifest {
    /// Read and parse an `inlet.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or names an empty entry point.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        if manifest.exec.main_class.trim().is_empty() {
            return Err(ManifestError::Invalid {
                path: path.display().to_string(),
                reason: "exec.main_class is empty".to_owned(),
            });
        }
        Ok(manifest)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid inlet.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid inlet.toml at {path}: {reason}")]
    Invalid { path: String, reason: String },
}
