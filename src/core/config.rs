//! Simulation configuration
//!
//! Built once at startup, validated, then shared read-only (behind `Arc`)
//! with every worker and task. Missing JSON fields fall back to defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SimError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cells per grid edge (the grid is square).
    pub grid_size: u32,
    /// Number of worker threads / partitions.
    pub workers: usize,
    /// Minimum wall-clock time per frame.
    pub frame_delay_ms: u64,
    /// How long a thread waits on a foreign guard or full queue before
    /// reporting starvation.
    pub guard_timeout_ms: u64,
    /// Bounded capacity of each worker's inbound queue.
    pub event_queue_capacity: usize,
    /// Surface area of one cell (m^2).
    pub cell_area: f64,
    /// Density of ocean water (kg/m^3).
    pub water_density: f64,
    pub heat: HeatConfig,
    pub hydro: HydroConfig,
    pub magma: MagmaConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Explicit integration step (fraction of the equilibrium gap closed per frame).
    /// Stays in (0, 1]; larger values oscillate.
    pub time_step: f64,
    /// Conductivity per unit of specific heat.
    pub conductivity_per_heat_capacity: f64,
    /// Extra resistance added to every lateral channel.
    pub lateral_resistance: f64,
    /// Couple cells to the surface and mantle boundary nodes.
    pub vertical_exchange: bool,
    pub surface_temperature: f64,
    pub surface_resistance: f64,
    pub mantle_temperature: f64,
    pub mantle_resistance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydroConfig {
    /// Fraction of the surface height difference moved per frame (0.5 = equalize).
    pub flow_fraction: f64,
    /// Suspended sediment a water column can hold, as a fraction of its mass.
    pub sediment_capacity: f64,
    /// Lower bound on the slope angle (radians) used for sediment transport.
    pub min_slope_angle: f64,
    /// Eroded mass per unit of displaced water and slope pressure.
    pub erosion_rate: f64,
    /// Loose sediment in the top stratum above which erosion stops.
    pub loose_sediment_threshold: f64,
    /// Material name deposited sediment is stored as.
    pub sediment_material: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagmaConfig {
    /// Hotspots seeded per partition at startup.
    pub max_hotspots: usize,
    pub hotspot_heat: f64,
    pub hotspot_magma: f64,
    /// Acceleration per unit of magma difference between neighbors.
    pub acceleration: f64,
    /// Velocity retained from one frame to the next.
    pub damping: f64,
    /// Below this temperature magma starts to solidify.
    pub solidus: f64,
    /// Fraction of magma solidified per frame below the solidus.
    pub solidify_rate: f64,
    /// Material name solidified magma is deposited as.
    pub rock_material: String,
    pub seed: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 64,
            workers: 4,
            frame_delay_ms: 0,
            guard_timeout_ms: 2_000,
            event_queue_capacity: 4_096,
            cell_area: 1.0e6,
            water_density: 1_000.0,
            heat: HeatConfig::default(),
            hydro: HydroConfig::default(),
            magma: MagmaConfig::default(),
        }
    }
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            time_step: 0.2,
            conductivity_per_heat_capacity: 0.003,
            lateral_resistance: 0.0,
            vertical_exchange: true,
            surface_temperature: 288.0,
            surface_resistance: 5.0e5,
            mantle_temperature: 1_600.0,
            mantle_resistance: 2.0e6,
        }
    }
}

impl Default for HydroConfig {
    fn default() -> Self {
        Self {
            flow_fraction: 0.5,
            sediment_capacity: 0.01,
            min_slope_angle: 0.01,
            erosion_rate: 1.0e-4,
            loose_sediment_threshold: 10.0,
            sediment_material: "sediment".to_string(),
        }
    }
}

impl Default for MagmaConfig {
    fn default() -> Self {
        Self {
            max_hotspots: 1,
            hotspot_heat: 400.0,
            hotspot_magma: 1.0e7,
            acceleration: 1.0e-8,
            damping: 0.8,
            solidus: 1_200.0,
            solidify_rate: 0.05,
            rock_material: "basalt".to_string(),
            seed: 12345,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimulationConfig =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_size == 0 {
            return Err(SimError::Config("grid_size must be positive".into()));
        }
        if self.workers == 0 {
            return Err(SimError::Config("at least one worker is required".into()));
        }
        if self.workers > (self.grid_size as usize) * (self.grid_size as usize) {
            return Err(SimError::Config(format!(
                "{} workers cannot each own a cell of a {}x{} grid",
                self.workers, self.grid_size, self.grid_size
            )));
        }
        if self.event_queue_capacity == 0 {
            return Err(SimError::Config("event_queue_capacity must be positive".into()));
        }
        if !(self.cell_area > 0.0) || !(self.water_density > 0.0) {
            return Err(SimError::Config("cell_area and water_density must be positive".into()));
        }
        if !(self.heat.time_step > 0.0 && self.heat.time_step <= 1.0) {
            return Err(SimError::Config(format!(
                "heat.time_step {} is outside (0, 1]",
                self.heat.time_step
            )));
        }
        if !(self.hydro.flow_fraction > 0.0 && self.hydro.flow_fraction <= 0.5) {
            return Err(SimError::Config(format!(
                "hydro.flow_fraction {} would invert slopes (must be in (0, 0.5])",
                self.hydro.flow_fraction
            )));
        }
        if self.hydro.sediment_capacity < 0.0 || self.hydro.erosion_rate < 0.0 {
            return Err(SimError::Config("hydro rates must be non-negative".into()));
        }
        if !(0.0..=1.0).contains(&self.magma.damping) || !(0.0..=1.0).contains(&self.magma.solidify_rate) {
            return Err(SimError::Config("magma damping and solidify_rate must be in [0, 1]".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    #[inline]
    pub fn guard_timeout(&self) -> Duration {
        Duration::from_millis(self.guard_timeout_ms)
    }
}
