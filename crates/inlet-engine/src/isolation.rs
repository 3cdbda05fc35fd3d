//! Entry points and the namespace a run can see.
//!
//! Programs register their entry points in an [`EntryPointRegistry`], each
//! under the classpath location that provides it. An [`IsolationContext`]
//! built from a classpath exposes only the entry points whose provider is on
//! that classpath; when two locations provide the same name, the earlier
//! location wins.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classpath::Classpath;
use crate::group::{Failure, GroupError, TaskContext, TaskHandle, TaskResult};
use crate::properties::SystemProperties;

/// The callable behind an entry point.
pub type EntryFn = dyn Fn(ExecContext) -> TaskResult + Send + Sync;

#[derive(Clone)]
pub struct EntryPoint {
    name: String,
    provider: PathBuf,
    func: Arc<EntryFn>,
}

impl EntryPoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The classpath location that provides this entry point.
    pub fn provider(&self) -> &Path {
        &self.provider
    }

    /// # Errors
    /// Returns whatever the entry point returns.
    pub fn invoke(&self, context: ExecContext) -> TaskResult {
        (self.func)(context)
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Every entry point known to the host, tagged with its provider.
#[derive(Debug, Clone, Default)]
pub struct EntryPointRegistry {
    symbols: Vec<EntryPoint>,
}

impl EntryPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as provided by the classpath location `provider`.
    pub fn register<F>(&mut self, provider: impl Into<PathBuf>, name: &str, func: F) -> &mut Self
    where
        F: Fn(ExecContext) -> TaskResult + Send + Sync + 'static,
    {
        self.symbols.push(EntryPoint {
            name: name.to_owned(),
            provider: provider.into(),
            func: Arc::new(func),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The symbols visible to one run. Built once, never changed.
#[derive(Debug, Clone, Default)]
pub struct IsolationContext {
    symbols: BTreeMap<String, EntryPoint>,
}

impl IsolationContext {
    pub fn new(registry: &EntryPointRegistry, classpath: &Classpath) -> Self {
        let mut symbols = BTreeMap::new();
        for location in classpath.entries() {
            for symbol in registry.symbols.iter().filter(|s| &s.provider == location) {
                symbols
                    .entry(symbol.name.clone())
                    .or_insert_with(|| symbol.clone());
            }
        }
        Self { symbols }
    }

    /// # Errors
    /// Returns `Failure::EntryPointNotFound` if no classpath location
    /// provides `name`.
    pub fn lookup(&self, name: &str) -> Result<&EntryPoint, Failure> {
        self.symbols
            .get(name)
            .ok_or_else(|| Failure::EntryPointNotFound {
                name: name.to_owned(),
            })
    }

    /// Names of the visible entry points, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

/// What an invoked entry point receives.
#[derive(Clone)]
pub struct ExecContext {
    args: Vec<String>,
    properties: Arc<BTreeMap<String, String>>,
    task: TaskContext,
}

impl ExecContext {
    pub(crate) fn new(
        args: Vec<String>,
        properties: Arc<BTreeMap<String, String>>,
        task: TaskContext,
    ) -> Self {
        Self {
            args,
            properties,
            task,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// A property set for this run, falling back to the global store.
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties
            .get(key)
            .cloned()
            .or_else(|| SystemProperties::get(key))
    }

    pub fn task(&self) -> &TaskContext {
        &self.task
    }

    /// Start a task in this run's group.
    ///
    /// # Errors
    /// See [`crate::IsolationGroup::spawn`].
    pub fn spawn<F>(&self, name: &str, daemon: bool, body: F) -> Result<TaskHandle, GroupError>
    where
        F: FnOnce(TaskContext) -> TaskResult + Send + 'static,
    {
        self.task.spawn(name, daemon, body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn noop(_: ExecContext) -> TaskResult {
        Ok(())
    }

    fn classpath(entries: &[&str]) -> Classpath {
        entries.iter().map(Path::new).collect()
    }

    #[test]
    fn only_classpath_providers_visible() {
        let mut registry = EntryPointRegistry::new();
        registry
            .register("/cp/app.jar", "app.Main", noop)
            .register("/elsewhere/other.jar", "other.Main", noop);

        let context = IsolationContext::new(&registry, &classpath(&["/cp/app.jar"]));
        assert!(context.lookup("app.Main").is_ok());
        let err = context.lookup("other.Main").unwrap_err();
        assert!(matches!(err, Failure::EntryPointNotFound { ref name } if name == "other.Main"));
        assert_eq!(context.names().collect::<Vec<_>>(), vec!["app.Main"]);
    }

    #[test]
    fn earlier_location_shadows_later() {
        let mut registry = EntryPointRegistry::new();
        registry
            .register("/cp/second.jar", "app.Main", noop)
            .register("/cp/first.jar", "app.Main", noop);

        let context =
            IsolationContext::new(&registry, &classpath(&["/cp/first.jar", "/cp/second.jar"]));
        let entry = context.lookup("app.Main").unwrap();
        assert_eq!(entry.provider(), Path::new("/cp/first.jar"));
    }

    #[test]
    fn empty_classpath_sees_nothing() {
        let mut registry = EntryPointRegistry::new();
        registry.register("/cp/app.jar", "app.Main", noop);
        let context = IsolationContext::new(&registry, &Classpath::new());
        assert_eq!(context.names().count(), 0);
        assert_eq!(registry.len(), 1);
    }
}
