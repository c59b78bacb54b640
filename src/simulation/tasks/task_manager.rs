//! TaskManager - runs a worker's tasks over its partition, one full pass
//! per task per frame
//!
//! Tasks are never interleaved per cell: task B starts only after task A
//! finished its `after` hook. Failures stay inside the pass they happened
//! in; a panicking task is caught and the next task still runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::core::{Boundaries, SimError};
use crate::spatial::checkerboard;

use super::task::{Task, TaskContext};

struct TaskEntry {
    task: Box<dyn Task>,
    checked: bool,
}

/// What one frame of tasks did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PassReport {
    pub(crate) passes: u32,
    pub(crate) cells: u64,
    pub(crate) errors: u64,
    pub(crate) panics: u64,
}

pub(crate) struct TaskManager {
    bounds: Boundaries,
    tasks: Vec<TaskEntry>,
}

impl TaskManager {
    pub(crate) fn new(bounds: Boundaries) -> Self {
        Self { bounds, tasks: Vec::new() }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Construct and append a task. A task whose construction fails is
    /// dropped.
    pub(crate) fn add(&mut self, mut task: Box<dyn Task>, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        task.construct(ctx).map_err(|e| {
            log::warn!("worker {}: dropping task `{}`: {}", ctx.worker, task.name(), e);
            SimError::Task { task: task.name().to_string(), reason: e.to_string() }
        })?;
        log::debug!("worker {}: added task `{}`", ctx.worker, task.name());
        self.tasks.push(TaskEntry { task, checked: false });
        Ok(())
    }

    /// Run every task once over the partition.
    pub(crate) fn run_frame(&mut self, ctx: &TaskContext<'_>) -> PassReport {
        let mut report = PassReport::default();
        let bounds = self.bounds;
        for entry in self.tasks.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                run_pass(entry, bounds, ctx, &mut report)
            }));
            if let Err(payload) = outcome {
                report.panics += 1;
                log::error!(
                    "worker {}: task `{}` panicked in frame {}: {}",
                    ctx.worker,
                    entry.task.name(),
                    ctx.frame,
                    panic_message(payload.as_ref())
                );
            }
        }
        report
    }

    /// Remove single-shot tasks that have had their frame. Returns how many.
    pub(crate) fn trim(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|e| !(e.checked && e.task.single_shot()));
        before - self.tasks.len()
    }
}

fn run_pass(entry: &mut TaskEntry, bounds: Boundaries, ctx: &TaskContext<'_>, report: &mut PassReport) {
    let task = entry.task.as_mut();
    entry.checked = true;
    if !task.check(ctx) {
        return;
    }
    report.passes += 1;

    if let Err(e) = task.before(ctx) {
        report.errors += 1;
        log::warn!("worker {}: `{}` before() failed, skipping pass: {}", ctx.worker, task.name(), e);
        return;
    }

    let mut failed = 0u64;
    for (x, y) in checkerboard(bounds, ctx.frame) {
        report.cells += 1;
        if let Err(e) = task.perform(ctx, x, y) {
            if failed == 0 {
                log::warn!("worker {}: `{}` failed at ({}, {}): {}", ctx.worker, task.name(), x, y, e);
            }
            failed += 1;
        }
    }
    if failed > 1 {
        log::debug!("worker {}: `{}` failed on {} cells in frame {}", ctx.worker, task.name(), failed, ctx.frame);
    }
    report.errors += failed;

    if let Err(e) = task.after(ctx) {
        report.errors += 1;
        log::warn!("worker {}: `{}` after() failed: {}", ctx.worker, task.name(), e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic>".to_string())
}
