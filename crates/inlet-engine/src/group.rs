//! A supervised group of OS threads.
//!
//! Every task started by an isolated program belongs to the group that
//! started it, transitively. The group records the first failure raised by
//! any of its tasks; later failures are only reported.
//!
//! Tasks are asked to finish cooperatively through an interrupt flag. A
//! forced stop is a request too: the task unwinds with [`ThreadDeath`] the
//! next time it reaches [`TaskContext::checkpoint`] or [`TaskContext::sleep`],
//! and never if it does not.

use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::reporter::Reporter;

/// Panic payload used to unwind a task whose stop was requested.
///
/// Unwinding with it is not a failure.
#[derive(Debug, Clone, Copy)]
pub struct ThreadDeath;

/// A failure captured in an isolation group.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("entry point `{name}` not found on the classpath")]
    EntryPointNotFound { name: String },

    #[error("task `{task}` failed: {source}")]
    Raised {
        task: String,
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("task `{task}` panicked: {message}")]
    Panicked { task: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("cannot start task `{name}`: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },

    #[error("cannot start a task in isolation group `{name}`: the group has been released")]
    Released { name: String },

    #[error("cannot release isolation group `{name}`: {count} task(s) still active")]
    StillActive { name: String, count: usize },
}

/// Returned by [`TaskContext::sleep`] when the task was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task interrupted")]
pub struct Interrupted;

/// What a task body returns.
pub type TaskResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Debug)]
struct TaskState {
    id: u64,
    name: String,
    daemon: bool,
    finished: Mutex<bool>,
    done: Condvar,
    park: Mutex<()>,
    wake: Condvar,
    interrupted: AtomicBool,
    stop: AtomicBool,
}

impl TaskState {
    fn finish(&self) {
        *self.finished.lock() = true;
        self.done.notify_all();
    }

    fn wake(&self) {
        let _park = self.park.lock();
        self.wake.notify_all();
    }
}

/// A shareable reference to one task of a group.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Arc<TaskState>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn is_daemon(&self) -> bool {
        self.state.daemon
    }

    pub fn is_alive(&self) -> bool {
        !*self.state.finished.lock()
    }

    /// Set the interrupt flag and wake the task if it is sleeping.
    pub fn interrupt(&self) {
        self.state.interrupted.store(true, Ordering::SeqCst);
        self.state.wake();
    }

    pub fn is_interrupted(&self) -> bool {
        self.state.interrupted.load(Ordering::SeqCst)
    }

    /// Ask the task to unwind at its next checkpoint.
    pub fn request_stop(&self) {
        self.state.stop.store(true, Ordering::SeqCst);
        self.state.wake();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state.stop.load(Ordering::SeqCst)
    }

    /// Wait for the task to finish, at most `timeout` when given.
    /// Returns whether the task has finished.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn join(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut finished = self.state.finished.lock();
        match deadline {
            None => {
                while !*finished {
                    self.state.done.wait(&mut finished);
                }
            }
            Some(deadline) => {
                while !*finished {
                    if self
                        .state
                        .done
                        .wait_until(&mut finished, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
        }
        *finished
    }
}

struct GroupInner {
    name: String,
    tasks: Mutex<Vec<TaskHandle>>,
    failure: Mutex<Option<Failure>>,
    reporter: Arc<dyn Reporter>,
    next_id: AtomicU64,
    released: AtomicBool,
}

/// A supervision domain for the tasks of one isolated run.
#[derive(Clone)]
pub struct IsolationGroup {
    inner: Arc<GroupInner>,
}

impl IsolationGroup {
    pub fn new(name: &str, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name: name.to_owned(),
                tasks: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
                reporter,
                next_id: AtomicU64::new(1),
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Start `body` on a new thread belonging to this group.
    ///
    /// The task is registered before its thread starts, so it is part of any
    /// snapshot taken after this returns. An `Err` returned by `body`, or a
    /// panic other than [`ThreadDeath`], is recorded as the group's failure.
    ///
    /// # Errors
    /// Returns `Released` if the group has been released, and `Spawn` if the
    /// operating system refuses to create the thread.
    pub fn spawn<F>(&self, name: &str, daemon: bool, body: F) -> Result<TaskHandle, GroupError>
    where
        F: FnOnce(TaskContext) -> TaskResult + Send + 'static,
    {
        if self.inner.released.load(Ordering::SeqCst) {
            return Err(GroupError::Released {
                name: self.inner.name.clone(),
            });
        }

        let handle = TaskHandle {
            state: Arc::new(TaskState {
                id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
                name: name.to_owned(),
                daemon,
                finished: Mutex::new(false),
                done: Condvar::new(),
                park: Mutex::new(()),
                wake: Condvar::new(),
                interrupted: AtomicBool::new(false),
                stop: AtomicBool::new(false),
            }),
        };
        self.inner.tasks.lock().push(handle.clone());

        let context = TaskContext {
            group: self.clone(),
            handle: handle.clone(),
        };
        let group = self.clone();
        let task = handle.clone();
        let spawned = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let _completion = Completion {
                    group: group.clone(),
                    task: task.clone(),
                };
                match panic::catch_unwind(AssertUnwindSafe(|| body(context))) {
                    Ok(Ok(())) => {}
                    Ok(Err(source)) => group.uncaught(Failure::Raised {
                        task: task.name().to_owned(),
                        source,
                    }),
                    Err(payload) if payload.is::<ThreadDeath>() => {}
                    Err(payload) => group.uncaught(Failure::Panicked {
                        task: task.name().to_owned(),
                        message: panic_message(payload.as_ref()),
                    }),
                }
            });

        match spawned {
            Ok(_detached) => Ok(handle),
            Err(source) => {
                self.forget(&handle);
                handle.state.finish();
                Err(GroupError::Spawn {
                    name: name.to_owned(),
                    source,
                })
            }
        }
    }

    /// A point-in-time list of the tasks still running.
    pub fn active_tasks(&self) -> Vec<TaskHandle> {
        self.inner
            .tasks
            .lock()
            .iter()
            .filter(|t| t.is_alive())
            .cloned()
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active_tasks().len()
    }

    /// Record `failure` unless one is already recorded, in which case it is
    /// reported as a warning.
    pub(crate) fn uncaught(&self, failure: Failure) {
        let mut slot = self.inner.failure.lock();
        if slot.is_none() {
            *slot = Some(failure);
            return;
        }
        drop(slot);
        self.inner
            .reporter
            .warn(&format!("an additional failure was raised: {failure}"));
    }

    /// The recorded failure, if any. Later calls return `None`.
    pub fn take_failure(&self) -> Option<Failure> {
        self.inner.failure.lock().take()
    }

    pub fn has_failure(&self) -> bool {
        self.inner.failure.lock().is_some()
    }

    /// Retire the group. No task can be started in it afterward.
    ///
    /// # Errors
    /// Returns `StillActive` if any task is still running; the group stays
    /// usable in that case.
    pub fn release(&self) -> Result<(), GroupError> {
        let count = self.active_count();
        if count > 0 {
            return Err(GroupError::StillActive {
                name: self.inner.name.clone(),
                count,
            });
        }
        self.inner.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    fn forget(&self, task: &TaskHandle) {
        self.inner.tasks.lock().retain(|t| t.id() != task.id());
    }
}

/// Marks the task finished and drops it from the group, however the body exits.
struct Completion {
    group: IsolationGroup,
    task: TaskHandle,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.group.forget(&self.task);
        self.task.state.finish();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// The view a running task has of itself and its group.
#[derive(Clone)]
pub struct TaskContext {
    group: IsolationGroup,
    handle: TaskHandle,
}

impl TaskContext {
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn group(&self) -> &IsolationGroup {
        &self.group
    }

    /// Start a task in the same group.
    ///
    /// # Errors
    /// See [`IsolationGroup::spawn`].
    pub fn spawn<F>(&self, name: &str, daemon: bool, body: F) -> Result<TaskHandle, GroupError>
    where
        F: FnOnce(TaskContext) -> TaskResult + Send + 'static,
    {
        self.group.spawn(name, daemon, body)
    }

    pub fn is_interrupted(&self) -> bool {
        self.handle.is_interrupted()
    }

    /// Read and clear the interrupt flag.
    pub fn take_interrupt(&self) -> bool {
        self.handle.state.interrupted.swap(false, Ordering::SeqCst)
    }

    /// Unwind with [`ThreadDeath`] if a stop was requested.
    pub fn checkpoint(&self) {
        if self.handle.is_stop_requested() {
            panic::resume_unwind(Box::new(ThreadDeath));
        }
    }

    /// Sleep for `duration`, waking early on interrupt or stop.
    ///
    /// # Errors
    /// Returns `Interrupted`, and clears the interrupt flag, if the task was
    /// interrupted before or during the sleep.
    ///
    /// A duration too large to express as a deadline sleeps until woken.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now().checked_add(duration);
        let state = &self.handle.state;
        let mut park = state.park.lock();
        loop {
            if state.stop.load(Ordering::SeqCst) {
                drop(park);
                panic::resume_unwind(Box::new(ThreadDeath));
            }
            if state.interrupted.swap(false, Ordering::SeqCst) {
                return Err(Interrupted);
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => return Ok(()),
                Some(deadline) => {
                    state.wake.wait_until(&mut park, deadline);
                }
                None => state.wake.wait(&mut park),
            }
        }
    }
}
