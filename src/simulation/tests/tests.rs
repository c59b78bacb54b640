use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::events::{EventRouter, Inbound};
use super::task_manager::TaskManager;
use super::worker::{drain_inbound, Backlog};
use super::*;
use crate::core::Boundaries;
use crate::domain::Strata;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Fixture {
    grid: Grid,
    router: EventRouter,
    receivers: Vec<Receiver<Inbound>>,
    config: SimulationConfig,
    catalog: MaterialCatalog,
}

impl Fixture {
    fn new(size: u32, partitions: &[Boundaries]) -> Self {
        Self::with_queue(size, partitions, 64)
    }

    fn with_queue(size: u32, partitions: &[Boundaries], capacity: usize) -> Self {
        let config = SimulationConfig {
            grid_size: size,
            workers: partitions.len(),
            guard_timeout_ms: 50,
            event_queue_capacity: capacity,
            ..SimulationConfig::default()
        };
        let mut grid = Grid::new(size, |_, _| Ok(Cell::new(300.0, Strata::new()))).unwrap();
        grid.assign_owners(partitions).unwrap();
        let (router, receivers) = EventRouter::new(partitions.len(), capacity, config.guard_timeout());
        Self { grid, router, receivers, config, catalog: MaterialCatalog::builtin() }
    }

    fn ctx(&self, worker: usize, bounds: Boundaries, frame: u64) -> TaskContext<'_> {
        TaskContext {
            worker,
            bounds,
            frame,
            config: &self.config,
            catalog: &self.catalog,
            grid: &self.grid,
            router: &self.router,
        }
    }
}

/// Counts how often each cell of an `size` x `size` grid is performed.
struct VisitCounter {
    size: u32,
    hits: Arc<Mutex<Vec<u32>>>,
}

impl Task for VisitCounter {
    fn name(&self) -> &str {
        "visit-counter"
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError> {
        self.hits.lock().unwrap()[(y * self.size + x) as usize] += 1;
        Ok(())
    }
}

#[derive(Default)]
struct Scripted {
    single_shot: bool,
    fail_construct: bool,
    panic_in_perform: bool,
    fail_every_perform: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl Task for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn construct(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        if self.fail_construct {
            return Err(SimError::Config("not wired".into()));
        }
        self.log.lock().unwrap().push("construct".into());
        Ok(())
    }

    fn check(&mut self, ctx: &TaskContext<'_>) -> bool {
        self.log.lock().unwrap().push(format!("check {}", ctx.frame));
        true
    }

    fn before(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        self.log.lock().unwrap().push("before".into());
        Ok(())
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError> {
        if self.panic_in_perform {
            panic!("bad cell ({}, {})", x, y);
        }
        if self.fail_every_perform {
            return Err(SimError::Task { task: "scripted".into(), reason: "nope".into() });
        }
        Ok(())
    }

    fn after(&mut self, _ctx: &TaskContext<'_>) -> Result<(), SimError> {
        self.log.lock().unwrap().push("after".into());
        Ok(())
    }

    fn single_shot(&self) -> bool {
        self.single_shot
    }
}

#[test]
fn checkerboard_pass_visits_every_cell_once_per_frame() {
    let bounds = Boundaries::square(8);
    let fx = Fixture::new(8, &[bounds]);
    let hits = Arc::new(Mutex::new(vec![0u32; 64]));
    let mut manager = TaskManager::new(bounds);
    manager
        .add(Box::new(VisitCounter { size: 8, hits: Arc::clone(&hits) }), &fx.ctx(0, bounds, 0))
        .unwrap();

    for frame in 0..2 {
        let report = manager.run_frame(&fx.ctx(0, bounds, frame));
        assert_eq!(report.cells, 64);
        let counts = hits.lock().unwrap().clone();
        assert!(counts.iter().all(|&c| c == frame as u32 + 1), "frame {}: {:?}", frame, counts);
    }
}

#[test]
fn lifecycle_order_and_single_shot_trim() {
    let bounds = Boundaries::square(2);
    let fx = Fixture::new(2, &[bounds]);
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut manager = TaskManager::new(bounds);
    let task = Scripted { single_shot: true, log: Arc::clone(&log), ..Default::default() };
    manager.add(Box::new(task), &fx.ctx(0, bounds, 0)).unwrap();

    manager.run_frame(&fx.ctx(0, bounds, 0));
    assert_eq!(manager.trim(), 1);
    assert_eq!(manager.len(), 0);
    manager.run_frame(&fx.ctx(0, bounds, 1));

    assert_eq!(*log.lock().unwrap(), vec!["construct", "check 0", "before", "after"]);
}

#[test]
fn failed_construct_drops_the_task() {
    let bounds = Boundaries::square(2);
    let fx = Fixture::new(2, &[bounds]);
    let mut manager = TaskManager::new(bounds);
    let task = Scripted { fail_construct: true, ..Default::default() };
    let err = manager.add(Box::new(task), &fx.ctx(0, bounds, 0)).unwrap_err();
    assert!(matches!(err, SimError::Task { .. }));
    assert_eq!(manager.len(), 0);
}

#[test]
fn panicking_task_does_not_stop_the_frame() {
    init_logger();
    let bounds = Boundaries::square(4);
    let fx = Fixture::new(4, &[bounds]);
    let hits = Arc::new(Mutex::new(vec![0u32; 16]));
    let mut manager = TaskManager::new(bounds);
    let ctx = fx.ctx(0, bounds, 0);
    manager.add(Box::new(Scripted { panic_in_perform: true, ..Default::default() }), &ctx).unwrap();
    manager.add(Box::new(VisitCounter { size: 4, hits: Arc::clone(&hits) }), &ctx).unwrap();

    let report = manager.run_frame(&ctx);
    assert_eq!(report.panics, 1);
    assert!(hits.lock().unwrap().iter().all(|&c| c == 1));
    // the panicking task stays registered and panics again next frame
    assert_eq!(manager.run_frame(&fx.ctx(0, bounds, 1)).panics, 1);
}

#[test]
fn cell_errors_are_counted_and_the_pass_continues() {
    init_logger();
    let bounds = Boundaries::square(3);
    let fx = Fixture::new(3, &[bounds]);
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut manager = TaskManager::new(bounds);
    let task = Scripted { fail_every_perform: true, log: Arc::clone(&log), ..Default::default() };
    manager.add(Box::new(task), &fx.ctx(0, bounds, 0)).unwrap();

    let report = manager.run_frame(&fx.ctx(0, bounds, 0));
    assert_eq!(report.errors, 9);
    assert_eq!(report.cells, 9);
    assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("after"));
}

#[test]
fn foreign_write_is_refused_and_transfer_posts() {
    let top = Boundaries::new(0, 4, 0, 2).unwrap();
    let bottom = Boundaries::new(0, 4, 2, 4).unwrap();
    let fx = Fixture::new(4, &[top, bottom]);
    let ctx = fx.ctx(0, top, 7);

    let err = ctx.write(0, 2, |c| c.set_temperature(1.0)).unwrap_err();
    assert!(matches!(err, SimError::NotOwner { owner: 1, x: 0, y: 2, .. }));

    ctx.transfer(0, 2, EventKind::AddHeat(5.0)).unwrap();
    match fx.receivers[1].try_recv() {
        Ok(Inbound::Event(e)) => {
            assert_eq!(e.frame, Some(7));
            assert_eq!((e.x, e.y), (0, 2));
        }
        _ => panic!("expected an event on worker 1's queue"),
    }

    // own cells are staged in place, nothing is queued
    ctx.transfer(1, 1, EventKind::AddOceanMass(5.0)).unwrap();
    assert!(fx.receivers[0].try_recv().is_err());
    assert_eq!(ctx.read(1, 1, |c| c.ocean().projected()).unwrap(), 5.0);
}

#[test]
fn failed_transfer_refunds_the_source() {
    let top = Boundaries::new(0, 4, 0, 2).unwrap();
    let bottom = Boundaries::new(0, 4, 2, 4).unwrap();
    let fx = Fixture::with_queue(4, &[top, bottom], 1);
    let ctx = fx.ctx(0, top, 0);
    ctx.write(1, 1, |c| c.ocean_mut().reset(10.0)).unwrap();

    // occupy worker 1's only queue slot
    ctx.post(0, 3, EventKind::AddHeat(1.0)).unwrap();

    let moved = ctx.write(1, 1, |c| c.ocean_mut().remove(10.0)).unwrap();
    let err = ctx
        .transfer_reserved((1, 1), (1, 2), EventKind::AddOceanMass(moved), |c| c.ocean_mut().refund(moved))
        .unwrap_err();
    assert!(matches!(err, SimError::Starvation { .. }));
    assert_eq!(ctx.read(1, 1, |c| c.ocean().available()).unwrap(), 10.0);
    assert_eq!(ctx.write(1, 1, |c| c.ocean_mut().apply()).unwrap(), 10.0);

    // with room in the queue the reservation is sent and committed away
    fx.receivers[1].try_recv().unwrap();
    let moved = ctx.write(1, 1, |c| c.ocean_mut().remove(10.0)).unwrap();
    ctx.transfer_reserved((1, 1), (1, 2), EventKind::AddOceanMass(moved), |c| c.ocean_mut().refund(moved))
        .unwrap();
    assert_eq!(ctx.write(1, 1, |c| c.ocean_mut().apply()).unwrap(), 0.0);
}

#[test]
fn events_wait_for_the_next_frame() {
    let top = Boundaries::new(0, 4, 0, 2).unwrap();
    let bottom = Boundaries::new(0, 4, 2, 4).unwrap();
    let fx = Fixture::new(4, &[top, bottom]);
    let mut manager = TaskManager::new(bottom);
    let mut backlog = Backlog::default();

    fx.ctx(0, top, 3).post(1, 2, EventKind::AddHeat(50.0)).unwrap();

    let report = drain_inbound(&fx.receivers[1], &mut backlog, &mut manager, &fx.ctx(1, bottom, 3));
    assert_eq!((report.applied, report.deferred), (0, 1));
    assert_eq!(fx.grid.read(1, 2, |c| c.temperature()).unwrap(), 300.0);

    let report = drain_inbound(&fx.receivers[1], &mut backlog, &mut manager, &fx.ctx(1, bottom, 4));
    assert_eq!((report.applied, report.deferred), (1, 0));
    assert_eq!(fx.grid.read(1, 2, |c| c.temperature()).unwrap(), 350.0);
}

#[test]
fn drain_installs_tasks_in_their_frame() {
    let bounds = Boundaries::square(2);
    let fx = Fixture::new(2, &[bounds]);
    let mut manager = TaskManager::new(bounds);
    let mut backlog = Backlog::default();
    fx.router.post(0, Inbound::AddTask { due: 0, task: Box::new(Scripted::default()) }).unwrap();
    fx.router.post(0, Inbound::AddTask { due: 2, task: Box::new(Scripted::default()) }).unwrap();

    let report = drain_inbound(&fx.receivers[0], &mut backlog, &mut manager, &fx.ctx(0, bounds, 1));
    assert_eq!(report.tasks_added, 1);
    assert_eq!(manager.len(), 1);

    let report = drain_inbound(&fx.receivers[0], &mut backlog, &mut manager, &fx.ctx(0, bounds, 2));
    assert_eq!(report.tasks_added, 1);
    assert_eq!(manager.len(), 2);
}

#[test]
fn failed_construct_at_drain_is_counted() {
    init_logger();
    let bounds = Boundaries::square(2);
    let fx = Fixture::new(2, &[bounds]);
    let mut manager = TaskManager::new(bounds);
    let mut backlog = Backlog::default();
    let task = Scripted { fail_construct: true, ..Default::default() };
    fx.router.post(0, Inbound::AddTask { due: 0, task: Box::new(task) }).unwrap();

    let report = drain_inbound(&fx.receivers[0], &mut backlog, &mut manager, &fx.ctx(0, bounds, 0));
    assert_eq!((report.tasks_added, report.task_errors), (0, 1));
    assert_eq!(manager.len(), 0);
}

// === Planet ===

fn flat_planet(size: u32, workers: usize) -> Planet {
    let config = SimulationConfig {
        grid_size: size,
        workers,
        guard_timeout_ms: 1_000,
        ..SimulationConfig::default()
    };
    Planet::new(config, |_, _, catalog| Cell::with_rock(catalog, "granite", 1.0e9, 500.0)).unwrap()
}

/// Records the temperature of one cell at the start of every frame.
struct TemperatureWatch {
    cell: (u32, u32),
    seen: Arc<Mutex<Vec<(u64, f64)>>>,
}

impl Task for TemperatureWatch {
    fn name(&self) -> &str {
        "temperature-watch"
    }

    fn check(&mut self, ctx: &TaskContext<'_>) -> bool {
        if ctx.owns(self.cell.0, self.cell.1) {
            if let Ok(t) = ctx.read(self.cell.0, self.cell.1, |c| c.temperature()) {
                self.seen.lock().unwrap().push((ctx.frame, t));
            }
        }
        false
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, _x: u32, _y: u32) -> Result<(), SimError> {
        Ok(())
    }
}

/// Posts one heat event at a foreign cell from worker 0, in the first frame.
struct Poster {
    cell: (u32, u32),
}

impl Task for Poster {
    fn name(&self) -> &str {
        "poster"
    }

    fn check(&mut self, ctx: &TaskContext<'_>) -> bool {
        if ctx.worker == 0 {
            if let Err(e) = ctx.post(self.cell.0, self.cell.1, EventKind::AddHeat(100.0)) {
                log::error!("post failed: {}", e);
            }
        }
        false
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, _x: u32, _y: u32) -> Result<(), SimError> {
        Ok(())
    }

    fn single_shot(&self) -> bool {
        true
    }
}

#[test]
fn cross_partition_event_lands_in_the_owners_next_frame() {
    init_logger();
    let planet = flat_planet(4, 2);
    let target = (0, 2);
    assert_eq!(planet.owner_of(target.0, target.1).unwrap(), 1);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let watch_seen = Arc::clone(&seen);
    planet
        .add_task(Arc::new(move |_: usize| Box::new(TemperatureWatch { cell: target, seen: Arc::clone(&watch_seen) }) as Box<dyn Task>))
        .unwrap();
    planet
        .add_task(Arc::new(move |_: usize| Box::new(Poster { cell: target }) as Box<dyn Task>))
        .unwrap();

    planet.step(3).unwrap();
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![(0, 500.0), (1, 600.0), (2, 600.0)]);
    assert_eq!(planet.stats()[1].events_applied(), 1);
}

#[test]
fn step_advances_exact_frames_and_parks() {
    let planet = flat_planet(4, 4);
    assert!(planet.is_paused());
    assert_eq!(planet.age(), 0);

    planet.step(5).unwrap();
    assert_eq!(planet.age(), 5);
    assert!(planet.is_paused());
    assert!(planet.stats().iter().all(|s| s.frames() == 5));

    planet.step(2).unwrap();
    assert_eq!(planet.age(), 7);

    let stats = planet.shutdown().unwrap();
    assert_eq!(stats.len(), 4);
    assert!(stats.iter().all(|s| s.frames() == 7));
}

#[test]
fn play_and_pause_between_frames() {
    let planet = flat_planet(4, 2);
    planet.play();
    assert!(!planet.is_paused());
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while planet.age() < 3 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    planet.pause();
    assert!(planet.is_paused());
    assert!(planet.age() >= 3);

    // stepping from a paused state still lands on a frame boundary
    planet.step(1).unwrap();
    let ages: Vec<u64> = planet.stats().iter().map(|s| s.frames()).collect();
    assert_eq!(ages[0], ages[1]);
    assert_eq!(planet.age(), ages[0]);
}

#[test]
fn control_events_apply_at_the_next_frame() {
    let planet = flat_planet(4, 2);
    planet.post_event(3, 3, EventKind::SetTemperature(1_234.0)).unwrap();
    assert_eq!(planet.read_cell(3, 3, |c| c.temperature()).unwrap(), 500.0);
    planet.step(1).unwrap();
    assert_eq!(planet.read_cell(3, 3, |c| c.temperature()).unwrap(), 1_234.0);
    assert!(matches!(planet.post_event(9, 0, EventKind::AddHeat(1.0)), Err(SimError::OutOfBounds { .. })));
}

#[test]
fn snapshot_reports_every_cell() {
    let planet = flat_planet(4, 2);
    planet.post_event(1, 1, EventKind::AddOceanMass(2.0e6)).unwrap();
    planet.step(1).unwrap();

    let snap = planet.snapshot().unwrap();
    assert_eq!(snap.age, 1);
    assert_eq!(snap.cells.len(), 16);
    let view = snap.cell(1, 1).unwrap();
    assert_eq!(view.ocean_mass, 2.0e6);
    assert!((view.ocean_depth - 0.002).abs() < 1e-12);
    assert_eq!(view.material.as_deref(), Some("granite"));
    assert_eq!(view.color_index, 1);
    assert_eq!(planet.cell_view(1, 1).unwrap(), *view);
    assert!(snap.to_json().unwrap().contains("\"age\":1"));
}

/// Panics while being installed on worker 1, outside any task pass.
struct BrokenInstall;

impl Task for BrokenInstall {
    fn name(&self) -> &str {
        "broken-install"
    }

    fn construct(&mut self, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        if ctx.worker == 1 {
            panic!("install failed on worker {}", ctx.worker);
        }
        Ok(())
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, _x: u32, _y: u32) -> Result<(), SimError> {
        Ok(())
    }
}

#[test]
fn worker_dying_mid_frame_does_not_block_its_siblings() {
    init_logger();
    let planet = flat_planet(4, 2);
    planet.add_task(Arc::new(|_: usize| Box::new(BrokenInstall) as Box<dyn Task>)).unwrap();

    let started = std::time::Instant::now();
    assert!(matches!(planet.step(3), Err(SimError::WorkerGone(_))));
    assert!(matches!(planet.step(1), Err(SimError::WorkerGone(_))));
    assert!(planet.shutdown().is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn failed_construct_shows_up_in_stats() {
    let planet = flat_planet(2, 1);
    let failing = Arc::new(|_: usize| Box::new(Scripted { fail_construct: true, ..Default::default() }) as Box<dyn Task>);
    planet.add_task(failing).unwrap();
    planet.step(1).unwrap();
    assert_eq!(planet.stats()[0].task_errors(), 1);
}

#[test]
fn tasks_added_while_running_start_together() {
    let config = SimulationConfig { grid_size: 4, workers: 2, frame_delay_ms: 20, ..SimulationConfig::default() };
    let planet = Planet::new(config, |_, _, catalog| Cell::with_rock(catalog, "granite", 1.0e9, 500.0)).unwrap();
    planet.play();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first_seen = Arc::clone(&seen);
    let first_frames = Arc::new(move |_: usize| {
        Box::new(FirstFrame { seen: Arc::clone(&first_seen), done: false }) as Box<dyn Task>
    });
    planet.add_task(first_frames).unwrap();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while seen.lock().unwrap().len() < 2 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(1));
    }
    planet.pause();
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
}

/// Records the first frame it runs in.
struct FirstFrame {
    seen: Arc<Mutex<Vec<u64>>>,
    done: bool,
}

impl Task for FirstFrame {
    fn name(&self) -> &str {
        "first-frame"
    }

    fn check(&mut self, ctx: &TaskContext<'_>) -> bool {
        if !self.done {
            self.done = true;
            self.seen.lock().unwrap().push(ctx.frame);
        }
        false
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, _x: u32, _y: u32) -> Result<(), SimError> {
        Ok(())
    }
}

#[test]
fn catalog_without_deposit_materials_is_rejected() {
    let json = r#"{ "materials": [
        { "name": "granite", "density": 2700.0, "specific_heat": 790.0, "erosion_factor": 0.3, "color_index": 1 }
    ] }"#;
    let catalog = MaterialCatalog::from_bundle_json(json).unwrap();
    let config = SimulationConfig { grid_size: 2, workers: 1, ..SimulationConfig::default() };
    let err = Planet::with_catalog(config, catalog, |_, _, c| Cell::with_rock(c, "granite", 1.0, 300.0)).err();
    assert!(matches!(err, Some(SimError::Config(msg)) if msg.contains("sediment")));
}

#[test]
fn invalid_config_is_rejected_before_spawning() {
    let config = SimulationConfig { workers: 0, ..SimulationConfig::default() };
    let err = Planet::new(config, |_, _, _| Ok(Cell::default())).err();
    assert!(matches!(err, Some(SimError::Config(_))));
}
