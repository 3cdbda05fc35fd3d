//! The single blocking call a host makes to run an entry point.

use std::sync::Arc;

use inlet_config::manifest::ExecConfig;
use inlet_util::args::split_command_line;

use crate::classpath::{ClasspathAssembler, ClasspathInputs};
use crate::error::EngineError;
use crate::executor::IsolatedExecutor;
use crate::group::Failure;
use crate::isolation::EntryPointRegistry;
use crate::lifecycle::{LifecycleManager, ShutdownPolicy};
use crate::matcher::ExecutableMatcher;
use crate::properties::PropertyOverlay;
use crate::reporter::Reporter;

/// Everything that describes one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub entry_point: String,
    pub args: Vec<String>,
    /// Global properties set for the duration of the run. `None` is written
    /// as the empty string.
    pub system_properties: Vec<(String, Option<String>)>,
    pub include_project_dependencies: bool,
    /// Include the tool's own dependencies.
    pub include_own_dependencies: bool,
    /// Restrict the tool's dependencies to one artifact's subtree.
    pub executable: Option<ExecutableMatcher>,
    pub shutdown: ShutdownPolicy,
    /// Deprecated; only produces a warning.
    pub keep_alive: bool,
    /// Deprecated; only produces a warning when not `-1`.
    pub kill_after: i64,
}

impl ExecRequest {
    pub fn new(entry_point: &str) -> Self {
        Self {
            entry_point: entry_point.to_owned(),
            args: Vec::new(),
            system_properties: Vec::new(),
            include_project_dependencies: true,
            include_own_dependencies: false,
            executable: None,
            shutdown: ShutdownPolicy::default(),
            keep_alive: false,
            kill_after: -1,
        }
    }

    /// Build a request from the `[exec]` table of `inlet.toml`.
    ///
    /// `commandline_args`, when present, replaces `arguments`.
    ///
    /// # Errors
    /// Returns an error if `commandline_args` has unbalanced quotes or the
    /// executable dependency names an invalid version.
    pub fn from_config(config: &ExecConfig) -> Result<Self, EngineError> {
        let args = match config.commandline_args.as_deref() {
            Some(line) => split_command_line(line)?,
            None => config.arguments.clone(),
        };
        let executable = config
            .executable_dependency
            .as_ref()
            .map(ExecutableMatcher::from_config)
            .transpose()?;
        Ok(Self {
            entry_point: config.main_class.trim().to_owned(),
            args,
            system_properties: config
                .system_properties
                .iter()
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect(),
            include_project_dependencies: config.include_project_dependencies,
            include_own_dependencies: config.include_plugin_dependencies,
            executable,
            shutdown: ShutdownPolicy {
                cleanup_daemon_tasks: config.cleanup_daemon_threads,
                daemon_join_timeout: config.daemon_thread_join_timeout,
                stop_unresponsive: config.stop_unresponsive_daemon_threads,
            },
            keep_alive: config.keep_alive,
            kill_after: config.kill_after,
        })
    }
}

/// Assemble the classpath, run the entry point in isolation, and wind the
/// run down.
///
/// Returns once every non-daemon task has finished and daemon tasks have
/// been handled per the shutdown policy. Global properties are restored
/// before returning, whatever the outcome.
///
/// # Errors
/// Classpath errors are returned before anything runs. A failure raised by
/// the entry point or any task it started is returned as
/// `ExecutionFailure` (or `EntryPointNotFound`) only after shutdown.
pub fn execute(
    request: &ExecRequest,
    inputs: ClasspathInputs<'_>,
    registry: &EntryPointRegistry,
    reporter: Arc<dyn Reporter>,
) -> Result<(), EngineError> {
    if request.keep_alive {
        reporter.warn(
            "keep_alive is deprecated and has no effect; \
             non-daemon tasks are always awaited",
        );
    }
    if request.kill_after != -1 {
        reporter.warn("kill_after is deprecated and has no effect");
    }
    reporter.debug(&format!(
        "Invoking: {}.main({})",
        request.entry_point,
        request.args.join(", ")
    ));

    let classpath = ClasspathAssembler::new(inputs, reporter.as_ref()).assemble(
        request.include_project_dependencies,
        request.include_own_dependencies,
        request.executable.as_ref(),
    )?;

    let overlay = PropertyOverlay::apply(&request.system_properties);
    let group = IsolatedExecutor::new(registry, Arc::clone(&reporter)).start(
        &classpath,
        &request.entry_point,
        &request.args,
        &request.system_properties,
    )?;
    let failure = LifecycleManager::new(request.shutdown, reporter.as_ref()).shutdown(&group);
    drop(overlay);

    match failure {
        None => Ok(()),
        Some(Failure::EntryPointNotFound { name }) => Err(EngineError::EntryPointNotFound { name }),
        Some(source) => Err(EngineError::ExecutionFailure {
            entry_point: request.entry_point.clone(),
            source,
        }),
    }
}
