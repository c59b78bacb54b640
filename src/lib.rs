//! Planet Engine - partitioned, lock-step planet surface simulation
//!
//! A square grid of cells (strata, temperature, magma, ocean) is split into
//! one rectangle per worker thread. Workers meet at a barrier every frame,
//! drain the events other workers posted for them, then run their tasks
//! over their own partition in checkerboard order.
//!
//! Architecture:
//! - core/       - leaf types, errors, configuration
//! - domain/     - cell, strata and material model
//! - spatial/    - grid storage, partitioning, traversal order
//! - systems/    - heat, hydrosphere and magma tasks
//! - simulation/ - workers, barrier, events, orchestration

pub mod core;
pub mod domain;
pub mod simulation;
pub mod spatial;
pub mod systems;

pub use crate::core::{Boundaries, Direction, SimError, SimulationConfig};
pub use domain::{Cell, Layer, Material, MaterialCatalog, Strata, TBuffer};
pub use simulation::{
    CellView, Event, EventKind, FrameStats, Planet, PlanetSnapshot, Task, TaskContext, TaskFactory,
};

/// Get engine version
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
