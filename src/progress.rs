//! Progress-callback trait for crew execution events.
//!
//! Inject an [`Arc<dyn CrewProgressCallback>`] via
//! [`crate::compare::Comparator::with_progress`] to receive events as the crew
//! runs each task. The CLI uses it to drive its spinner.
//!
//! # Example
//!
//! ```rust
//! use curriculum_compare::CrewProgressCallback;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl CrewProgressCallback for CountingCallback {
//!     fn on_task_complete(&self, task: usize, total_tasks: usize, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Task {}/{} done ({} chars)", task, total_tasks, output_len);
//!     }
//! }
//!
//! let cb: Arc<dyn CrewProgressCallback> = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//! cb.on_task_complete(1, 3, 42);
//! ```

use std::sync::Arc;

/// Called by the crew as it runs each task.
///
/// Tasks run strictly one after another, so events for a single kickoff
/// never interleave. All methods default to no-ops.
pub trait CrewProgressCallback: Send + Sync {
    /// Called once before the first task.
    fn on_kickoff_start(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// Called just before a task's tools run and its model call is sent.
    ///
    /// `task` is 1-indexed.
    fn on_task_start(&self, task: usize, total_tasks: usize, role: &str) {
        let _ = (task, total_tasks, role);
    }

    /// Called when a task produced its output.
    fn on_task_complete(&self, task: usize, total_tasks: usize, output_len: usize) {
        let _ = (task, total_tasks, output_len);
    }

    /// Called when a task fails; the kickoff stops after this.
    fn on_task_error(&self, task: usize, total_tasks: usize, error: &str) {
        let _ = (task, total_tasks, error);
    }

    /// Called once after the last task completed.
    fn on_kickoff_complete(&self, total_tasks: usize) {
        let _ = total_tasks;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CrewProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn CrewProgressCallback>;
