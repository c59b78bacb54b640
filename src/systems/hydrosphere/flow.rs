//! Ocean flow, sediment transport and erosion
//!
//! Per cell and frame, water runs toward the single lowest lateral
//! neighbor (steepest descent). The amount is `flow_fraction` of the
//! surface-height gap, so with 0.5 both sides at most meet in the middle.
//! Suspended sediment follows the water in proportion to the sine of the
//! slope angle, and the receiving cell's top stratum is eroded in
//! proportion to the water moved. Everything lands in TBuffers and is
//! committed once, in `after`. A reservation whose transfer fails is
//! refunded to the source.

use crate::core::{Direction, SimError};
use crate::simulation::{EventKind, Task, TaskContext};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Column {
    surface: f64,
    water: f64,
    sediment: f64,
}

/// Slope angle (radians) for a height drop over one cell.
pub fn slope_angle(drop: f64, cell_width: f64) -> f64 {
    if cell_width <= 0.0 {
        return std::f64::consts::FRAC_PI_2;
    }
    (drop / cell_width).atan()
}

#[derive(Default)]
pub struct HydrosphereTask;

impl HydrosphereTask {
    pub fn new() -> Self {
        Self
    }
}

impl Task for HydrosphereTask {
    fn name(&self) -> &str {
        "hydrosphere"
    }

    fn perform(&mut self, ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError> {
        let cfg = ctx.config;
        let here = ctx.read(x, y, |c| Column {
            surface: c.surface_height(cfg),
            water: c.ocean().available(),
            sediment: c.sediment().available(),
        })?;
        if here.water <= 0.0 {
            return Ok(());
        }

        let mut lowest: Option<((u32, u32), f64)> = None;
        for dir in Direction::ALL {
            let Some((nx, ny)) = ctx.neighbor(x, y, dir) else {
                continue;
            };
            let h = ctx.read(nx, ny, |c| c.surface_height(cfg))?;
            if h < here.surface && lowest.map_or(true, |(_, best)| h < best) {
                lowest = Some(((nx, ny), h));
            }
        }
        let Some(((tx, ty), low)) = lowest else {
            return Ok(());
        };

        let drop = here.surface - low;
        let wanted = cfg.hydro.flow_fraction * drop * cfg.water_density * cfg.cell_area;
        let moved = ctx.write(x, y, |c| c.ocean_mut().remove(wanted))?;
        if moved <= 0.0 {
            return Ok(());
        }
        ctx.transfer_reserved((x, y), (tx, ty), EventKind::AddOceanMass(moved), |c| {
            c.ocean_mut().refund(moved)
        })?;

        let angle = slope_angle(drop, cfg.cell_area.sqrt()).max(cfg.hydro.min_slope_angle);
        let pressure = angle.sin();

        if here.sediment > 0.0 {
            let share = here.sediment * (moved / here.water) * pressure;
            let carried = ctx.write(x, y, |c| c.sediment_mut().remove(share))?;
            if carried > 0.0 {
                ctx.transfer_reserved((x, y), (tx, ty), EventKind::AddSediment(carried), |c| {
                    c.sediment_mut().refund(carried)
                })?;
            }
        }

        let erosion = cfg.hydro.erosion_rate * moved * pressure;
        if erosion > 0.0 {
            ctx.transfer(tx, ty, EventKind::Erode(erosion))?;
        }
        Ok(())
    }

    fn after(&mut self, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        ctx.for_each_owned(|cell| cell.commit_hydrology(ctx.config, ctx.catalog).map(|_| ()))
    }
}
