use crate::core::SimError;

use super::worker::Worker;
use super::{FrameStats, Planet};

pub(super) fn play(planet: &Planet) {
    log::debug!("planet resumed at age {}", planet.age());
    planet.clock.play();
}

pub(super) fn pause(planet: &Planet) {
    log::debug!("planet paused at age {}", planet.age());
    planet.clock.pause();
}

pub(super) fn is_paused(planet: &Planet) -> bool {
    planet.clock.is_paused()
}

pub(super) fn step(planet: &Planet, frames: u64) -> Result<(), SimError> {
    if let Some(&gone) = planet.clock.retired().first() {
        return Err(SimError::WorkerGone(gone));
    }
    let target = planet.clock.advance(frames);
    let retired = planet.clock.wait_until_parked(target);
    match retired.first() {
        Some(&gone) => Err(SimError::WorkerGone(gone)),
        None => Ok(()),
    }
}

pub(super) fn shutdown(planet: &mut Planet) -> Result<Vec<FrameStats>, SimError> {
    planet.clock.shutdown();
    let mut stats = Vec::with_capacity(planet.handles.len());
    let mut first_err = None;
    for (id, handle) in planet.handles.drain(..).enumerate() {
        match handle.join() {
            Ok(Ok(s)) => stats.push(s),
            Ok(Err(e)) => {
                first_err.get_or_insert(e);
            }
            Err(_) => {
                first_err.get_or_insert(SimError::WorkerPanicked(Worker::thread_name(id)));
            }
        }
    }
    log::info!("planet shut down at age {}", planet.age());
    match first_err {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

/// Drop path: kill and join, ignoring results.
pub(super) fn stop_and_join(planet: &mut Planet) {
    if planet.handles.is_empty() {
        return;
    }
    planet.clock.shutdown();
    for handle in planet.handles.drain(..) {
        let _ = handle.join();
    }
}
