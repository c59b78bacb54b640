//! Task contract and the per-pass context handed to it
//!
//! A task instance belongs to exactly one worker, so it can keep private
//! state without sharing anything across threads. Lifecycle per frame:
//! `check` gates the frame, then `before`, `perform` for every cell of the
//! partition in checkerboard order, and `after`.

use std::sync::Arc;

use crate::core::{Boundaries, Direction, SimError, SimulationConfig};
use crate::domain::{Cell, MaterialCatalog};
use crate::spatial::Grid;

use super::events::{Event, EventKind, EventRouter, Inbound};

pub trait Task: Send {
    fn name(&self) -> &str;

    /// One-time setup when the task is added to a worker.
    fn construct(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    /// Whether this frame's pass should run. Single-shot tasks may do all
    /// their work here and return `false`.
    fn check(&mut self, _ctx: &TaskContext<'_>) -> bool {
        true
    }

    fn before(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    fn perform(&mut self, ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError>;

    fn after(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    /// Removed from its manager after the first frame it was checked in.
    fn single_shot(&self) -> bool {
        false
    }
}

/// Builds one task instance per worker id.
pub type TaskFactory = Arc<dyn Fn(usize) -> Box<dyn Task> + Send + Sync>;

/// Everything a task may touch during one frame on one worker.
///
/// Cell access goes through closures that receive a single cell, so a task
/// can never hold two cell guards at once.
pub struct TaskContext<'a> {
    pub worker: usize,
    pub bounds: Boundaries,
    pub frame: u64,
    pub config: &'a SimulationConfig,
    pub catalog: &'a MaterialCatalog,
    pub(crate) grid: &'a Grid,
    pub(crate) router: &'a EventRouter,
}

impl<'a> TaskContext<'a> {
    #[inline]
    pub fn owns(&self, x: u32, y: u32) -> bool {
        self.bounds.contains(x, y)
    }

    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid.size()
    }

    #[inline]
    pub fn neighbor(&self, x: u32, y: u32, dir: Direction) -> Option<(u32, u32)> {
        self.grid.neighbor(x, y, dir)
    }

    /// Read any cell. Foreign cells go through the timed guard.
    pub fn read<R>(&self, x: u32, y: u32, f: impl FnOnce(&Cell) -> R) -> Result<R, SimError> {
        if self.owns(x, y) {
            self.grid.read(x, y, f)
        } else {
            self.grid.guarded_read(x, y, self.config.guard_timeout(), f)
        }
    }

    /// Mutate a cell of this worker's own partition.
    pub fn write<R>(&self, x: u32, y: u32, f: impl FnOnce(&mut Cell) -> R) -> Result<R, SimError> {
        if !self.owns(x, y) {
            let owner = self.grid.owner_of(x, y)?;
            return Err(SimError::NotOwner { thread: self.thread_name(), x, y, owner });
        }
        self.grid.write(x, y, f)
    }

    /// Queue a mutation for the owner of (x, y).
    pub fn post(&self, x: u32, y: u32, kind: EventKind) -> Result<(), SimError> {
        let owner = self.grid.owner_of(x, y)?;
        let event = Event { frame: Some(self.frame), x, y, kind };
        self.router.post(owner, Inbound::Event(event))
    }

    /// Send a quantity to (x, y): buffered in place when this worker owns
    /// the cell, posted as an event otherwise.
    pub fn transfer(&self, x: u32, y: u32, kind: EventKind) -> Result<(), SimError> {
        if self.owns(x, y) {
            self.write(x, y, |cell| kind.stage(cell, self.catalog))?
        } else {
            self.post(x, y, kind)
        }
    }

    /// `transfer` for a quantity already reserved out of (x, y). If the
    /// transfer fails, `release` hands the reservation back to the source
    /// cell before the error is returned, so nothing is lost.
    pub fn transfer_reserved(
        &self,
        (x, y): (u32, u32),
        (tx, ty): (u32, u32),
        kind: EventKind,
        release: impl FnOnce(&mut Cell),
    ) -> Result<(), SimError> {
        if let Err(e) = self.transfer(tx, ty, kind) {
            self.write(x, y, release)?;
            return Err(e);
        }
        Ok(())
    }

    /// Apply `f` to every cell of the partition, row-major. Used by commit
    /// steps in `after`, where order does not matter. A failing cell does not
    /// stop the others; the first error is returned.
    pub fn for_each_owned(&self, mut f: impl FnMut(&mut Cell) -> Result<(), SimError>) -> Result<(), SimError> {
        let mut first_err = None;
        for (x, y) in self.bounds.cells() {
            if let Err(e) = self.grid.write(x, y, &mut f).and_then(|r| r) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn thread_name(&self) -> String {
        std::thread::current()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("worker-{}", self.worker))
    }
}
