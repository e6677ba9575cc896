//! Server-side tasks.
//!
//! Annotations, coverages, and variations are processed asynchronously by
//! the server. Their representation carries a `task` object with the state
//! flags `waiting`, `running`, `success`, and `failure`, an optional
//! `progress` percentage, and an `error` once the task failed.
//!
//! [`TaskedResource::wait_and_monitor`] polls that state. The monitor is an
//! iterator: it does nothing between calls to `next()`, so the caller decides
//! whether and when to continue polling, and dropping it stops monitoring.
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::rest::TaskedResource;
//!
//! for state in variation.wait_and_monitor() {
//!     match state? {
//!         Some(percentage) => println!("done: {percentage}%"),
//!         None => println!("still working"),
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde_json::json;

use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::fields::{Field, FieldKind, TaskState};
use crate::rest::resource::RestResource;

/// The `task` field every tasked kind declares.
pub const TASK_FIELD: Field = Field::new("task", FieldKind::Task);

/// A resource kind whose server-side processing is asynchronous.
pub trait TaskedResource: RestResource {
    /// Returns the task state as last loaded.
    ///
    /// A missing task object reads as the default state.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored task object is malformed.
    fn task(&self) -> Result<TaskState, FieldError> {
        self.resource()
            .value::<Option<TaskState>>("task")
            .map(Option::unwrap_or_default)
    }

    /// Asks the server to run the task again, then reloads the resource.
    ///
    /// Unsaved changes are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if either request fails.
    fn resubmit(&mut self) -> Result<(), ResourceError> {
        tracing::debug!(uri = self.uri(), "Resubmitting task");
        let resource = self.resource();
        resource.session().patch(resource.uri(), json!({"task": {}}))?;
        self.refresh(true)
    }

    /// Returns an iterator that polls the task until it is done.
    fn wait_and_monitor(&mut self) -> TaskMonitor<'_, Self> {
        let poll_wait = self.resource().session().config().task_poll_wait();
        TaskMonitor::new(self, poll_wait)
    }

    /// Polls the task until it is done.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::TaskFailed`] if the task failed, and the
    /// request errors of polling.
    fn wait(&mut self) -> Result<(), ResourceError> {
        for state in self.wait_and_monitor() {
            state?;
        }
        Ok(())
    }
}

/// Polls the task of a resource.
///
/// Each call to `next()` reloads the resource, sleeping the configured poll
/// wait first except on the first call. It yields:
///
/// - `Ok(None)` while the task is waiting or running
/// - `Ok(Some(100))` once the task succeeded
/// - `Err(ResourceError::TaskFailed)` once the task failed
/// - `Err(_)` if polling failed
///
/// After a success or any error the iterator ends.
pub struct TaskMonitor<'a, R: TaskedResource> {
    resource: &'a mut R,
    poll_wait: Duration,
    polled: bool,
    done: bool,
}

impl<'a, R: TaskedResource> TaskMonitor<'a, R> {
    fn new(resource: &'a mut R, poll_wait: Duration) -> Self {
        Self {
            resource,
            poll_wait,
            polled: false,
            done: false,
        }
    }

    fn poll(&mut self) -> Result<Option<u8>, ResourceError> {
        if self.polled {
            std::thread::sleep(self.poll_wait);
        }
        self.polled = true;

        self.resource.refresh(true)?;
        let task = self.resource.task()?;

        tracing::trace!(
            uri = self.resource.uri(),
            waiting = task.waiting,
            running = task.running,
            progress = ?task.progress,
            "Polled task"
        );

        if task.failure {
            self.done = true;
            let (code, message) = task.error.map_or_else(
                || ("task_failed".to_string(), "Task failed".to_string()),
                |error| (error.code, error.message),
            );
            return Err(ResourceError::TaskFailed { code, message });
        }
        if task.success {
            self.done = true;
            return Ok(Some(100));
        }
        Ok(None)
    }
}

impl<R: TaskedResource> Iterator for TaskMonitor<'_, R> {
    type Item = Result<Option<u8>, ResourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.poll();
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<R: TaskedResource> fmt::Debug for TaskMonitor<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskMonitor")
            .field("uri", &self.resource.uri())
            .field("poll_wait", &self.poll_wait)
            .field("done", &self.done)
            .finish()
    }
}
