//! Systems - payload tasks run by every worker
//!
//! - temperature: heat conduction between cells and boundary layers
//! - hydrosphere: ocean flow, sediment transport, erosion
//! - magma:       hotspot seeding and convection

pub mod hydrosphere;
pub mod magma;
pub mod temperature;

use std::sync::Arc;

use crate::simulation::{Task, TaskFactory};

pub use hydrosphere::HydrosphereTask;
pub use magma::{HotspotSeedTask, MagmaConvectionTask};
pub use temperature::HeatConductionTask;

/// Factory giving every worker a fresh `T::default()`.
pub fn factory<T: Task + Default + 'static>() -> TaskFactory {
    Arc::new(|_worker: usize| Box::new(T::default()) as Box<dyn Task>)
}

/// Factories for the standard task set, in run order.
pub fn default_tasks() -> Vec<TaskFactory> {
    vec![
        factory::<HotspotSeedTask>(),
        factory::<HeatConductionTask>(),
        factory::<HydrosphereTask>(),
        factory::<MagmaConvectionTask>(),
    ]
}
