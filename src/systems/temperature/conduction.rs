//! Heat conduction between thermal nodes
//!
//! Each cell is a node with four lateral channels and two vertical ones
//! (surface above, mantle below). Channel conductance is
//! `area / (z1 / (2 k1) + z2 / (2 k2) + extra)`; the new temperature is
//! `T + dt * sum(K_i (T_i - T)) / sum(K_i)`.
//!
//! Lateral edges are insulated: a missing neighbor is a mirror of the cell
//! itself, so it adds to `sum(K)` but never carries heat. Vertical channels
//! run to fixed boundary temperatures.
//!
//! Deltas are staged during the pass and applied in `after`, so every cell
//! of the pass reads the same temperatures regardless of sweep order.

use crate::core::{Direction, SimError, SimulationConfig};
use crate::domain::Cell;
use crate::simulation::{Task, TaskContext};

/// Thickness floor (m); keeps thin columns from blowing up conductance.
pub const MIN_NODE_THICKNESS: f64 = 1.0;

/// One side of a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermalNode {
    pub temperature: f64,
    /// m
    pub thickness: f64,
    pub conductivity: f64,
}

impl ThermalNode {
    pub fn of(cell: &Cell, config: &SimulationConfig) -> Self {
        ThermalNode {
            temperature: cell.temperature(),
            thickness: cell.height(config.cell_area),
            conductivity: cell.strata().specific_heat() * config.heat.conductivity_per_heat_capacity,
        }
    }

    #[inline]
    fn half_resistance(&self) -> Option<f64> {
        (self.conductivity > 0.0).then(|| self.thickness.max(MIN_NODE_THICKNESS) / (2.0 * self.conductivity))
    }
}

/// Conductance between two nodes. Zero when either side is an insulator.
pub fn conductance(area: f64, a: &ThermalNode, b: &ThermalNode, extra_resistance: f64) -> f64 {
    match (a.half_resistance(), b.half_resistance()) {
        (Some(ra), Some(rb)) => area / (ra + rb + extra_resistance.max(0.0)),
        _ => 0.0,
    }
}

/// Conductance from a node to a fixed boundary temperature.
pub fn boundary_conductance(area: f64, node: &ThermalNode, resistance: f64) -> f64 {
    match node.half_resistance() {
        Some(r) if r + resistance > 0.0 => area / (r + resistance.max(0.0)),
        _ => 0.0,
    }
}

/// Explicit step from `(K, T)` channels.
pub fn conduction_delta(center: f64, channels: &[(f64, f64)], time_step: f64) -> f64 {
    let sum_k: f64 = channels.iter().map(|&(k, _)| k).sum();
    if sum_k <= 0.0 {
        return 0.0;
    }
    let flow: f64 = channels.iter().map(|&(k, t)| k * (t - center)).sum();
    flow / sum_k * time_step
}

#[derive(Default)]
pub struct HeatConductionTask {
    channels: Vec<(f64, f64)>,
}

impl HeatConductionTask {
    pub fn new() -> Self {
        Self { channels: Vec::with_capacity(6) }
    }
}

impl Task for HeatConductionTask {
    fn name(&self) -> &str {
        "heat-conduction"
    }

    fn perform(&mut self, ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError> {
        let cfg = ctx.config;
        let area = cfg.cell_area;
        let center = ctx.read(x, y, |c| ThermalNode::of(c, cfg))?;

        self.channels.clear();
        for dir in Direction::ALL {
            match ctx.neighbor(x, y, dir) {
                Some((nx, ny)) => {
                    let other = ctx.read(nx, ny, |c| ThermalNode::of(c, cfg))?;
                    let k = conductance(area, &center, &other, cfg.heat.lateral_resistance);
                    self.channels.push((k, other.temperature));
                }
                None => {
                    let k = conductance(area, &center, &center, cfg.heat.lateral_resistance);
                    self.channels.push((k, center.temperature));
                }
            }
        }
        if cfg.heat.vertical_exchange {
            let up = boundary_conductance(area, &center, cfg.heat.surface_resistance);
            let down = boundary_conductance(area, &center, cfg.heat.mantle_resistance);
            self.channels.push((up, cfg.heat.surface_temperature));
            self.channels.push((down, cfg.heat.mantle_temperature));
        }

        let delta = conduction_delta(center.temperature, &self.channels, cfg.heat.time_step);
        if delta != 0.0 {
            ctx.write(x, y, |c| c.stage_heat(delta))?;
        }
        Ok(())
    }

    fn after(&mut self, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        ctx.for_each_owned(|cell| {
            cell.apply_heat();
            Ok(())
        })
    }
}
