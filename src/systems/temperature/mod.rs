pub mod conduction;

pub use conduction::{conductance, conduction_delta, HeatConductionTask, ThermalNode};
