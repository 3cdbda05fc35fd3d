//! Starting an entry point on its bootstrap task.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::classpath::Classpath;
use crate::group::{GroupError, IsolationGroup};
use crate::isolation::{EntryPointRegistry, ExecContext, IsolationContext};
use crate::reporter::Reporter;

/// Starts an entry point inside a fresh isolation group.
pub struct IsolatedExecutor<'a> {
    registry: &'a EntryPointRegistry,
    reporter: Arc<dyn Reporter>,
}

impl<'a> IsolatedExecutor<'a> {
    pub fn new(registry: &'a EntryPointRegistry, reporter: Arc<dyn Reporter>) -> Self {
        Self { registry, reporter }
    }

    /// Start `entry_point` on a non-daemon bootstrap task named
    /// `<entry_point>.main()` and return the group without waiting.
    ///
    /// A missing entry point, an error returned by it, or a panic all end up
    /// as the group's failure.
    ///
    /// # Errors
    /// Returns an error if the bootstrap task cannot be started.
    pub fn start(
        &self,
        classpath: &Classpath,
        entry_point: &str,
        args: &[String],
        properties: &[(String, Option<String>)],
    ) -> Result<IsolationGroup, GroupError> {
        let context = IsolationContext::new(self.registry, classpath);
        let properties: Arc<BTreeMap<String, String>> = Arc::new(
            properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
                .collect(),
        );
        let args = args.to_vec();
        let name = entry_point.to_owned();

        let group = IsolationGroup::new(entry_point, Arc::clone(&self.reporter));
        group.spawn(&format!("{entry_point}.main()"), false, move |task| {
            let entry = match context.lookup(&name) {
                Ok(entry) => entry.clone(),
                Err(failure) => {
                    task.group().uncaught(failure);
                    return Ok(());
                }
            };
            drop(context);
            entry.invoke(ExecContext::new(args, properties, task))
        })?;
        Ok(group)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::group::Failure;
    use crate::reporter::MemoryReporter;

    fn classpath() -> Classpath {
        [Path::new("/cp/app.jar")].into_iter().collect()
    }

    #[test]
    fn bootstrap_task_named_after_entry_point() {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let mut registry = EntryPointRegistry::new();
        registry.register("/cp/app.jar", "app.Main", move |ctx| {
            let name = ctx.task().handle().name().to_owned();
            tx.lock().send((name, ctx.args().to_vec(), ctx.property("mode")))?;
            Ok(())
        });

        let executor = IsolatedExecutor::new(&registry, Arc::new(MemoryReporter::new()));
        let group = executor
            .start(
                &classpath(),
                "app.Main",
                &["a".to_owned(), "b".to_owned()],
                &[("mode".to_owned(), Some("fast".to_owned()))],
            )
            .unwrap();

        let (name, args, mode) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name, "app.Main.main()");
        assert_eq!(args, vec!["a", "b"]);
        assert_eq!(mode.as_deref(), Some("fast"));
        for task in group.active_tasks() {
            assert!(task.join(Some(Duration::from_secs(5))));
        }
        assert!(group.take_failure().is_none());
    }

    #[test]
    fn missing_entry_point_recorded_in_group() {
        let registry = EntryPointRegistry::new();
        let executor = IsolatedExecutor::new(&registry, Arc::new(MemoryReporter::new()));
        let group = executor
            .start(&classpath(), "app.Missing", &[], &[])
            .unwrap();
        for task in group.active_tasks() {
            assert!(task.join(Some(Duration::from_secs(5))));
        }
        let failure = group.take_failure().unwrap();
        assert!(matches!(failure, Failure::EntryPointNotFound { ref name } if name == "app.Missing"));
    }
}
