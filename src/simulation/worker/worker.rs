//! Worker - one OS thread per partition
//!
//! Idle -> Running { wait clock, barrier, drain events, run tasks, trim,
//! sleep } -> Stopped. The clock is consulted before the barrier, so a
//! pause or kill takes effect between frames, and the kill flag again
//! right after it. On the way out the worker
//! always gives up its barrier slot: normally by leaving, and by breaking
//! the barrier if it is unwinding from a panic, so siblings never wait on
//! a dead participant.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::core::{Boundaries, SimError, SimulationConfig};
use crate::domain::MaterialCatalog;
use crate::spatial::Grid;

use super::barrier::FrameBarrier;
use super::clock::SimulationClock;
use super::events::{Event, EventRouter, Inbound};
use super::frame_stats::FrameStats;
use super::task::{Task, TaskContext};
use super::task_manager::TaskManager;
use super::PerfTimer;

/// State every worker of one planet shares.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) grid: Arc<Grid>,
    pub(crate) router: Arc<EventRouter>,
    pub(crate) barrier: Arc<FrameBarrier>,
    pub(crate) clock: Arc<SimulationClock>,
    pub(crate) config: Arc<SimulationConfig>,
    pub(crate) catalog: Arc<MaterialCatalog>,
}

pub(crate) struct Worker {
    id: usize,
    bounds: Boundaries,
    inbound: Receiver<Inbound>,
    manager: TaskManager,
    backlog: Backlog,
    stats: FrameStats,
    published: Arc<Mutex<FrameStats>>,
    shared: Shared,
}

pub(crate) type WorkerHandle = JoinHandle<Result<FrameStats, SimError>>;

impl Worker {
    pub(crate) fn new(
        id: usize,
        bounds: Boundaries,
        inbound: Receiver<Inbound>,
        shared: Shared,
        published: Arc<Mutex<FrameStats>>,
    ) -> Self {
        Self {
            id,
            bounds,
            inbound,
            manager: TaskManager::new(bounds),
            backlog: Backlog::default(),
            stats: FrameStats::new(id),
            published,
            shared,
        }
    }

    pub(crate) fn thread_name(id: usize) -> String {
        format!("planet-worker-{}", id)
    }

    pub(crate) fn spawn(self) -> Result<WorkerHandle, SimError> {
        thread::Builder::new()
            .name(Self::thread_name(self.id))
            .spawn(move || self.run())
            .map_err(|e| SimError::Spawn(e.to_string()))
    }

    fn run(mut self) -> Result<FrameStats, SimError> {
        let _exit = ExitGuard {
            id: self.id,
            barrier: Arc::clone(&self.shared.barrier),
            clock: Arc::clone(&self.shared.clock),
        };
        log::info!("worker {} started on {}", self.id, self.bounds);

        let mut frames_done = 0u64;
        while self.shared.clock.wait_runnable(self.id, frames_done) {
            let frame = self.shared.barrier.wait().map_err(|e| {
                log::error!("worker {}: {}", self.id, e);
                e
            })?;
            if self.shared.clock.is_killed() {
                break;
            }
            self.run_frame(frame);
            frames_done += 1;
        }

        log::info!("worker {} stopped after {} frames", self.id, self.stats.frames);
        Ok(self.stats)
    }

    fn run_frame(&mut self, frame: u64) {
        let timer = PerfTimer::start();
        let shared = &self.shared;
        let ctx = TaskContext {
            worker: self.id,
            bounds: self.bounds,
            frame,
            config: &shared.config,
            catalog: &shared.catalog,
            grid: &shared.grid,
            router: &shared.router,
        };

        let drained = drain_inbound(&self.inbound, &mut self.backlog, &mut self.manager, &ctx);
        let report = self.manager.run_frame(&ctx);
        let trimmed = self.manager.trim();

        self.stats.events_applied += drained.applied;
        self.stats.events_deferred += drained.deferred;
        self.stats.task_passes += report.passes as u64;
        self.stats.task_errors += report.errors + drained.task_errors;
        self.stats.task_panics += report.panics;
        self.stats.record_frame(timer.elapsed_ms());
        *self.published.lock().unwrap_or_else(PoisonError::into_inner) = self.stats.clone();

        log::trace!(
            "worker {} frame {}: {} events, {}/{} tasks ran over {} cells, {} trimmed, {:.3} ms",
            self.id,
            frame,
            drained.applied,
            report.passes,
            self.manager.len(),
            report.cells,
            trimmed,
            self.stats.last_frame_ms
        );

        let delay = shared.config.frame_delay();
        let spent = std::time::Duration::from_secs_f64(self.stats.last_frame_ms / 1000.0);
        if let Some(rest) = delay.checked_sub(spent) {
            thread::sleep(rest);
        }
    }
}

/// Inbound items that arrived before their frame.
#[derive(Default)]
pub(super) struct Backlog {
    events: Vec<Event>,
    tasks: Vec<(u64, Box<dyn Task>)>,
}

/// What one drain did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct DrainReport {
    pub(super) applied: u64,
    pub(super) deferred: u64,
    pub(super) tasks_added: u64,
    /// Tasks dropped because `construct` failed.
    pub(super) task_errors: u64,
}

/// Install every due task, then apply every due event. Items that are not
/// due yet wait in `backlog`, in arrival order.
pub(super) fn drain_inbound(
    inbound: &Receiver<Inbound>,
    backlog: &mut Backlog,
    manager: &mut TaskManager,
    ctx: &TaskContext<'_>,
) -> DrainReport {
    let mut events = std::mem::take(&mut backlog.events);
    let mut tasks = std::mem::take(&mut backlog.tasks);
    loop {
        match inbound.try_recv() {
            Ok(Inbound::Event(event)) => events.push(event),
            Ok(Inbound::AddTask { due, task }) => tasks.push((due, task)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }

    let mut report = DrainReport::default();
    for (due, task) in tasks {
        if due > ctx.frame {
            backlog.tasks.push((due, task));
            continue;
        }
        match manager.add(task, ctx) {
            Ok(()) => report.tasks_added += 1,
            Err(_) => report.task_errors += 1,
        }
    }

    for event in events {
        if !event.is_due(ctx.frame) {
            backlog.events.push(event);
            continue;
        }
        let result = ctx
            .write(event.x, event.y, |cell| event.kind.apply(cell, ctx.catalog))
            .and_then(|r| r);
        match result {
            Ok(()) => report.applied += 1,
            Err(e) => log::warn!(
                "worker {}: dropping {:?} for ({}, {}): {}",
                ctx.worker,
                event.kind,
                event.x,
                event.y,
                e
            ),
        }
    }
    report.deferred = backlog.events.len() as u64;
    report
}

struct ExitGuard {
    id: usize,
    barrier: Arc<FrameBarrier>,
    clock: Arc<SimulationClock>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("worker {} panicked; breaking the frame barrier", self.id);
            self.barrier.break_barrier();
        } else {
            self.barrier.leave();
            log::debug!("worker {} left the barrier; {} parties remain", self.id, self.barrier.parties());
        }
        self.clock.retire(self.id);
    }
}
