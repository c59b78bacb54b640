//! Planet - orchestrates the partitioned worker threads
//!
//! Owns the grid, splits it into one partition per worker, spawns the
//! workers paused and exposes the control surface (play, pause, step,
//! shutdown), task registration, control-side events and render snapshots.
//!
//! Per-frame work lives in the workers; this type only wires them up.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::{Boundaries, SimError, SimulationConfig};
use crate::domain::{Cell, MaterialCatalog};
use crate::spatial::Grid;

#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/frame_stats.rs"]
mod frame_stats;
#[path = "sync/barrier.rs"]
mod barrier;
#[path = "sync/clock.rs"]
mod clock;
#[path = "events/events.rs"]
mod events;
#[path = "tasks/task.rs"]
mod task;
#[path = "tasks/task_manager.rs"]
mod task_manager;
#[path = "worker/worker.rs"]
mod worker;
#[path = "render/snapshot.rs"]
mod snapshot;
#[path = "init/init.rs"]
mod init;
#[path = "control/control.rs"]
mod control;
#[path = "commands/commands.rs"]
mod commands;

pub use events::{Event, EventKind};
pub use frame_stats::FrameStats;
pub use snapshot::{CellView, PlanetSnapshot};
pub use task::{Task, TaskContext, TaskFactory};

use barrier::FrameBarrier;
use clock::SimulationClock;
use events::EventRouter;
use perf_timer::PerfTimer;
use worker::WorkerHandle;

pub struct Planet {
    config: Arc<SimulationConfig>,
    catalog: Arc<MaterialCatalog>,
    grid: Arc<Grid>,
    router: Arc<EventRouter>,
    barrier: Arc<FrameBarrier>,
    clock: Arc<SimulationClock>,
    partitions: Vec<Boundaries>,
    handles: Vec<WorkerHandle>,
    stats: Vec<Arc<Mutex<FrameStats>>>,
}

impl Planet {
    /// Build a planet with the built-in material catalog. `seed(x, y, catalog)`
    /// produces each starting cell. Workers start paused.
    pub fn new<F>(config: SimulationConfig, seed: F) -> Result<Self, SimError>
    where
        F: FnMut(u32, u32, &MaterialCatalog) -> Result<Cell, SimError>,
    {
        init::create_planet(config, MaterialCatalog::builtin(), seed)
    }

    pub fn with_catalog<F>(config: SimulationConfig, catalog: MaterialCatalog, seed: F) -> Result<Self, SimError>
    where
        F: FnMut(u32, u32, &MaterialCatalog) -> Result<Cell, SimError>,
    {
        init::create_planet(config, catalog, seed)
    }

    // === Clock ===

    pub fn play(&self) {
        control::play(self);
    }

    /// Takes effect between frames; a pass in progress finishes.
    pub fn pause(&self) {
        control::pause(self);
    }

    pub fn is_paused(&self) -> bool {
        control::is_paused(self)
    }

    /// Run exactly `frames` lock-step frames, then park every worker.
    pub fn step(&self, frames: u64) -> Result<(), SimError> {
        control::step(self, frames)
    }

    /// Stop every worker and collect their final stats.
    pub fn shutdown(mut self) -> Result<Vec<FrameStats>, SimError> {
        control::shutdown(&mut self)
    }

    // === Tasks and events ===

    /// Give every worker its own instance from `factory`. While paused the
    /// task starts in the next frame; while running, one frame later, so
    /// that every partition starts it in the same frame.
    pub fn add_task(&self, factory: TaskFactory) -> Result<(), SimError> {
        commands::add_task(self, factory)
    }

    pub fn add_default_tasks(&self) -> Result<(), SimError> {
        commands::add_default_tasks(self)
    }

    /// Queue a mutation for the owner of (x, y), applied at its next drain.
    pub fn post_event(&self, x: u32, y: u32, kind: EventKind) -> Result<(), SimError> {
        commands::post_event(self, x, y, kind)
    }

    // === Read side ===

    /// Frames started so far.
    pub fn age(&self) -> u64 {
        self.barrier.generation()
    }

    pub fn size(&self) -> u32 {
        self.grid.size()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn partitions(&self) -> &[Boundaries] {
        &self.partitions
    }

    pub fn owner_of(&self, x: u32, y: u32) -> Result<usize, SimError> {
        self.grid.owner_of(x, y)
    }

    /// Latest per-worker stats.
    pub fn stats(&self) -> Vec<FrameStats> {
        self.stats
            .iter()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }

    /// Read one cell through the timed guard.
    pub fn read_cell<R>(&self, x: u32, y: u32, f: impl FnOnce(&Cell) -> R) -> Result<R, SimError> {
        self.grid.guarded_read(x, y, self.config.guard_timeout(), f)
    }

    pub fn cell_view(&self, x: u32, y: u32) -> Result<CellView, SimError> {
        snapshot::cell_view(&self.grid, &self.config, &self.catalog, x, y)
    }

    pub fn snapshot(&self) -> Result<PlanetSnapshot, SimError> {
        snapshot::snapshot(&self.grid, &self.config, &self.catalog, self.age())
    }
}

impl Drop for Planet {
    fn drop(&mut self) {
        control::stop_and_join(self);
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
