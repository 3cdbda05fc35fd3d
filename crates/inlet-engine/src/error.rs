//! Error types for inlet-engine.

use crate::group::{Failure, GroupError};
use crate::resolver::ResolutionError;

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A dependency declares a version that is neither a version nor a range.
    #[error("invalid version for {coordinate}: {source}")]
    InvalidVersionSpec {
        coordinate: String,
        source: inlet_util::error::UtilError,
    },

    /// A dependency declares a scope outside compile/runtime/test/provided/system.
    #[error("unknown scope `{scope}` for {coordinate}; expected one of compile, runtime, test, provided, system")]
    UnknownScope { coordinate: String, scope: String },

    /// A system-scope dependency does not say where its file is.
    #[error("system-scope dependency {coordinate} has no system_path")]
    MissingSystemPath { coordinate: String },

    /// The executable selector matched none of the tool's dependencies.
    #[error("no dependency of the tool matches the executable dependency {matcher}")]
    ExecutableNotFound { matcher: String },

    /// Resolving the executable's own dependency subtree failed.
    #[error("cannot resolve dependencies of the executable {executable} in preparation for its execution: {source}")]
    ExecutableResolutionFailed {
        executable: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Resolving declared dependencies failed.
    #[error("cannot resolve dependencies: {0}")]
    Resolution(#[from] ResolutionError),

    /// The entry point is not provided by any classpath location.
    #[error("entry point `{name}` not found on the classpath")]
    EntryPointNotFound { name: String },

    /// The entry point, or a task it started, failed.
    #[error("execution of `{entry_point}` failed: {source}")]
    ExecutionFailure { entry_point: String, source: Failure },

    /// The isolation group could not start a task.
    #[error("{0}")]
    Group(#[from] GroupError),

    /// A lockfile module cannot be located.
    #[error("cannot locate module {coordinate}: {reason}")]
    Repository { coordinate: String, reason: String },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] inlet_util::error::UtilError),

    /// A manifest operation failed.
    #[error("{0}")]
    Manifest(#[from] inlet_config::manifest::ManifestError),

    /// A lockfile operation failed.
    #[error("{0}")]
    Lockfile(#[from] inlet_config::lockfile::LockfileError),
}
