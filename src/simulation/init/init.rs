use std::sync::{Arc, Mutex};

use crate::core::{SimError, SimulationConfig};
use crate::domain::{Cell, MaterialCatalog};
use crate::spatial::{partition_grid, Grid};

use super::worker::{Shared, Worker};
use super::{EventRouter, FrameBarrier, FrameStats, Planet, SimulationClock};

pub(super) fn create_planet<F>(
    config: SimulationConfig,
    catalog: MaterialCatalog,
    mut seed: F,
) -> Result<Planet, SimError>
where
    F: FnMut(u32, u32, &MaterialCatalog) -> Result<Cell, SimError>,
{
    config.validate()?;
    catalog.require(&config.hydro.sediment_material, "hydro.sediment")?;
    catalog.require(&config.magma.rock_material, "magma.rock")?;
    let workers = config.workers;
    let partitions = partition_grid(config.grid_size, workers)?;

    let mut grid = Grid::new(config.grid_size, |x, y| seed(x, y, &catalog))?;
    grid.assign_owners(&partitions)?;

    let (router, receivers) = EventRouter::new(workers, config.event_queue_capacity, config.guard_timeout());
    let shared = Shared {
        grid: Arc::new(grid),
        router: Arc::new(router),
        barrier: Arc::new(FrameBarrier::new(workers)),
        clock: Arc::new(SimulationClock::new(workers)),
        config: Arc::new(config),
        catalog: Arc::new(catalog),
    };

    let mut planet = Planet {
        config: Arc::clone(&shared.config),
        catalog: Arc::clone(&shared.catalog),
        grid: Arc::clone(&shared.grid),
        router: Arc::clone(&shared.router),
        barrier: Arc::clone(&shared.barrier),
        clock: Arc::clone(&shared.clock),
        partitions: partitions.clone(),
        handles: Vec::with_capacity(workers),
        stats: Vec::with_capacity(workers),
    };

    for (id, (bounds, inbound)) in partitions.into_iter().zip(receivers).enumerate() {
        let published = Arc::new(Mutex::new(FrameStats::new(id)));
        let worker = Worker::new(id, bounds, inbound, shared.clone(), Arc::clone(&published));
        // a failed spawn drops `planet`, which stops the workers already running
        planet.handles.push(worker.spawn()?);
        planet.stats.push(published);
    }

    log::info!(
        "planet {}x{} started with {} workers (paused)",
        planet.grid.size(),
        planet.grid.size(),
        workers
    );
    Ok(planet)
}
