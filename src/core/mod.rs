//! Core - leaf types shared by every layer of the engine
//!
//! - boundaries: immutable partition rectangles
//! - config:     process-wide simulation constants
//! - direction:  lateral neighbor directions
//! - error:      the crate error type
//! - rng:        tiny deterministic generator for seeding

pub mod boundaries;
pub mod config;
pub mod direction;
pub mod error;
pub mod rng;

pub use boundaries::Boundaries;
pub use direction::Direction;
pub use config::{HeatConfig, HydroConfig, MagmaConfig, SimulationConfig};
pub use error::SimError;
