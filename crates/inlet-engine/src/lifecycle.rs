//! Winding an isolation group down after its entry point returns.
//!
//! Non-daemon tasks are always awaited. Daemon tasks are then interrupted and
//! given a shared time budget; whatever outlives it is either asked to stop
//! or left running, depending on the policy.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::group::{Failure, IsolationGroup, TaskHandle};
use crate::reporter::Reporter;

/// How to treat tasks still running once the program is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownPolicy {
    /// Interrupt and await daemon tasks, then release the group.
    pub cleanup_daemon_tasks: bool,
    /// Total budget for the daemon phase in milliseconds; zero or negative
    /// waits for every task without a deadline.
    pub daemon_join_timeout: i64,
    /// Request a forced stop of daemon tasks that outlive the budget.
    pub stop_unresponsive: bool,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            cleanup_daemon_tasks: true,
            daemon_join_timeout: 15_000,
            stop_unresponsive: false,
        }
    }
}

impl ShutdownPolicy {
    fn budget(&self) -> Option<Duration> {
        u64::try_from(self.daemon_join_timeout)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

pub struct LifecycleManager<'a> {
    policy: ShutdownPolicy,
    reporter: &'a dyn Reporter,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(policy: ShutdownPolicy, reporter: &'a dyn Reporter) -> Self {
        Self { policy, reporter }
    }

    /// Await the group and return its failure, if any.
    ///
    /// Blocks until every non-daemon task has finished, then handles daemon
    /// tasks according to the policy. Release problems are reported, never
    /// returned.
    pub fn shutdown(&self, group: &IsolationGroup) -> Option<Failure> {
        self.join_non_daemon(group);
        if self.policy.cleanup_daemon_tasks {
            self.terminate_daemons(group);
            if let Err(e) = group.release() {
                self.reporter.warn(&format!("{e}; leaving it behind"));
            }
        }
        group.take_failure()
    }

    /// Join every non-daemon task without a deadline, re-checking until a
    /// full pass finds none.
    pub fn join_non_daemon(&self, group: &IsolationGroup) {
        loop {
            let pending: Vec<TaskHandle> = group
                .active_tasks()
                .into_iter()
                .filter(|t| !t.is_daemon())
                .collect();
            if pending.is_empty() {
                break;
            }
            for task in pending {
                task.join(None);
            }
        }
    }

    /// Interrupt every task and wait for them within the budget.
    /// Returns how many tasks did not finish.
    pub fn terminate_daemons(&self, group: &IsolationGroup) -> usize {
        for task in group.active_tasks() {
            task.interrupt();
        }

        let budget = self.policy.budget();
        let start = Instant::now();
        let mut uncooperative: HashSet<u64> = HashSet::new();
        loop {
            let live: Vec<TaskHandle> = group
                .active_tasks()
                .into_iter()
                .filter(|t| !uncooperative.contains(&t.id()))
                .collect();
            if live.is_empty() {
                break;
            }
            for task in live {
                if !task.is_alive() {
                    continue;
                }
                // The task may have cleared its flag while handling it.
                if !task.is_interrupted() {
                    task.interrupt();
                }
                let remaining = budget.map(|total| total.saturating_sub(start.elapsed()));
                if task.join(remaining) {
                    continue;
                }
                uncooperative.insert(task.id());
                if self.policy.stop_unresponsive {
                    self.reporter
                        .warn(&format!("task `{}` will be stopped", task.name()));
                    task.request_stop();
                } else {
                    self.reporter.warn(&format!(
                        "task `{}` will linger despite being asked to finish via interruption",
                        task.name()
                    ));
                }
            }
        }

        if !uncooperative.is_empty() {
            self.reporter.warn(&format!(
                "{} task(s) did not finish despite being asked to via interruption. \
                 This is not a problem with inlet, it is a problem with the running code. \
                 Although not serious, it should be remedied.",
                uncooperative.len()
            ));
        } else {
            let still_active = group.active_count();
            if still_active > 0 {
                self.reporter.debug(&format!(
                    "isolation group `{}` still has {still_active} active task(s)",
                    group.name()
                ));
            }
        }
        uncooperative.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::reporter::MemoryReporter;

    fn setup() -> (IsolationGroup, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        (IsolationGroup::new("lifecycle", reporter.clone()), reporter)
    }

    fn policy(timeout: i64, stop: bool) -> ShutdownPolicy {
        ShutdownPolicy {
            cleanup_daemon_tasks: true,
            daemon_join_timeout: timeout,
            stop_unresponsive: stop,
        }
    }

    #[test]
    fn default_policy() {
        let policy = ShutdownPolicy::default();
        assert!(policy.cleanup_daemon_tasks);
        assert_eq!(policy.daemon_join_timeout, 15_000);
        assert!(!policy.stop_unresponsive);
        assert_eq!(policy.budget(), Some(Duration::from_secs(15)));
        assert_eq!(self::policy(0, false).budget(), None);
        assert_eq!(self::policy(-5, false).budget(), None);
    }

    #[test]
    fn non_daemon_tasks_awaited_including_late_children() {
        let (group, reporter) = setup();
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        group
            .spawn("main", false, move |ctx| {
                let inner = Arc::clone(&counter);
                ctx.spawn("worker", false, move |_| {
                    thread::sleep(Duration::from_millis(50));
                    inner.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })?;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let manager = LifecycleManager::new(ShutdownPolicy::default(), reporter.as_ref());
        assert!(manager.shutdown(&group).is_none());
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert!(group.is_released());
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn cooperative_daemon_interrupted() {
        let (group, reporter) = setup();
        let handle = group
            .spawn("daemon", true, |ctx| {
                while ctx.sleep(Duration::from_secs(60)).is_ok() {}
                Ok(())
            })
            .unwrap();

        let manager = LifecycleManager::new(policy(5_000, false), reporter.as_ref());
        let start = Instant::now();
        assert!(manager.shutdown(&group).is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!handle.is_alive());
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn uncooperative_daemon_lingers() {
        let (group, reporter) = setup();
        let release = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&release);
        let handle = group
            .spawn("deaf", true, move |_| {
                while !gate.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(())
            })
            .unwrap();

        let manager = LifecycleManager::new(policy(200, false), reporter.as_ref());
        let start = Instant::now();
        assert!(manager.shutdown(&group).is_none());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(5));

        let warnings = reporter.warnings();
        assert!(warnings.iter().any(|w| w.contains("`deaf` will linger")));
        assert!(warnings
            .iter()
            .any(|w| w.starts_with("1 task(s) did not finish despite being asked to via interruption")));
        assert!(warnings.iter().any(|w| w.starts_with("cannot release isolation group `lifecycle`")));
        assert!(handle.is_alive());
        assert!(!group.is_released());

        release.store(true, Ordering::SeqCst);
        assert!(handle.join(Some(Duration::from_secs(5))));
    }

    #[test]
    fn uncooperative_daemon_stopped() {
        let (group, reporter) = setup();
        let handle = group
            .spawn("spinner", true, |ctx| loop {
                ctx.checkpoint();
                thread::sleep(Duration::from_millis(5));
            })
            .unwrap();

        let manager = LifecycleManager::new(policy(100, true), reporter.as_ref());
        assert_eq!(manager.terminate_daemons(&group), 1);
        assert!(reporter
            .warnings()
            .iter()
            .any(|w| w.contains("`spinner` will be stopped")));
        assert!(handle.join(Some(Duration::from_secs(5))));
        assert!(group.take_failure().is_none());
    }

    #[test]
    fn budget_shared_across_tasks() {
        let (group, reporter) = setup();
        let release = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        for i in 0..3 {
            let gate = Arc::clone(&release);
            handles.push(
                group
                    .spawn(&format!("deaf-{i}"), true, move |_| {
                        while !gate.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(5));
                        }
                        Ok(())
                    })
                    .unwrap(),
            );
        }

        let manager = LifecycleManager::new(policy(300, false), reporter.as_ref());
        let start = Instant::now();
        assert_eq!(manager.terminate_daemons(&group), 3);
        // One budget for all three, not one each.
        assert!(start.elapsed() < Duration::from_millis(800));

        release.store(true, Ordering::SeqCst);
        for handle in handles {
            assert!(handle.join(Some(Duration::from_secs(5))));
        }
    }

    #[test]
    fn non_positive_timeout_waits_for_slow_daemon() {
        let (group, reporter) = setup();
        let handle = group
            .spawn("slow", true, |_| {
                thread::sleep(Duration::from_millis(150));
                Ok(())
            })
            .unwrap();

        let manager = LifecycleManager::new(policy(0, false), reporter.as_ref());
        assert!(manager.shutdown(&group).is_none());
        assert!(!handle.is_alive());
        assert!(reporter.warnings().is_empty());
        assert!(group.is_released());
    }

    #[test]
    fn negative_timeout_waits_for_every_daemon() {
        let (group, reporter) = setup();
        let delay = Duration::from_millis(200);
        let start = Instant::now();
        let handle = group
            .spawn("slow", true, move |_| {
                thread::sleep(delay);
                Ok(())
            })
            .unwrap();

        let manager = LifecycleManager::new(policy(-1, false), reporter.as_ref());
        assert!(manager.shutdown(&group).is_none());
        assert!(start.elapsed() >= delay);
        assert!(!handle.is_alive());
        assert!(reporter.warnings().is_empty());
        assert!(group.is_released());
    }

    #[test]
    fn cleanup_disabled_leaves_daemons_running() {
        let (group, reporter) = setup();
        let release = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&release);
        let handle = group
            .spawn("background", true, move |_| {
                while !gate.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(())
            })
            .unwrap();

        let policy = ShutdownPolicy {
            cleanup_daemon_tasks: false,
            ..ShutdownPolicy::default()
        };
        let manager = LifecycleManager::new(policy, reporter.as_ref());
        assert!(manager.shutdown(&group).is_none());
        assert!(handle.is_alive());
        assert!(!handle.is_interrupted());
        assert!(reporter.warnings().is_empty());

        release.store(true, Ordering::SeqCst);
        assert!(handle.join(Some(Duration::from_secs(5))));
    }
}
