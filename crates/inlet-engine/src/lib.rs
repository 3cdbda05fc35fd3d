//! Classpath assembly and supervised in-process execution for Inlet.

#![forbid(unsafe_code)]

pub mod classpath;
pub mod descriptor;
pub mod error;
pub mod exec;
pub mod executor;
pub mod group;
pub mod isolation;
pub mod lifecycle;
pub mod matcher;
pub mod project;
pub mod properties;
pub mod reporter;
pub mod repository;
pub mod resolver;
pub mod subtree;

pub use classpath::{Classpath, ClasspathAssembler, ClasspathInputs};
pub use descriptor::{Dependency, ExclusionFilter, Scope};
pub use error::EngineError;
pub use exec::{execute, ExecRequest};
pub use group::{Failure, IsolationGroup, TaskContext, TaskHandle};
pub use isolation::{EntryPointRegistry, ExecContext, IsolationContext};
pub use lifecycle::ShutdownPolicy;
pub use matcher::ExecutableMatcher;
pub use project::Workspace;
pub use reporter::{MemoryReporter, Reporter, TracingReporter};
pub use repository::LockedRepository;
pub use resolver::{ResolutionEngine, ResolvedArtifact};
