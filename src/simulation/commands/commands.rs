use crate::core::SimError;
use crate::systems;

use super::events::{Event, EventKind, Inbound};
use super::{Planet, TaskFactory};

/// While parked, no frame can open before every worker has the task, so it
/// is due in the next frame. While running, some workers may already be
/// past that frame's drain, so it is due one frame later.
pub(super) fn add_task(planet: &Planet, factory: TaskFactory) -> Result<(), SimError> {
    let due = planet.barrier.generation() + u64::from(!planet.clock.is_paused());
    for worker in 0..planet.router.workers() {
        planet.router.post(worker, Inbound::AddTask { due, task: factory(worker) })?;
    }
    log::debug!("task scheduled for frame {} on {} workers", due, planet.router.workers());
    Ok(())
}

pub(super) fn add_default_tasks(planet: &Planet) -> Result<(), SimError> {
    for factory in systems::default_tasks() {
        add_task(planet, factory)?;
    }
    Ok(())
}

pub(super) fn post_event(planet: &Planet, x: u32, y: u32, kind: EventKind) -> Result<(), SimError> {
    let owner = planet.grid.owner_of(x, y)?;
    planet.router.post(owner, Inbound::Event(Event { frame: None, x, y, kind }))
}
