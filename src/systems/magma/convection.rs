//! Magma convection over the 4-direction velocity field
//!
//! Each neighbor with less magma pulls on the cell: the acceleration
//! toward it is proportional to the magma difference, velocities carry
//! over between frames with damping and never go negative. A velocity is
//! the fraction of the cell's magma sent that way this frame; fractions are
//! scaled down when they would add up to more than the whole.

use crate::core::{Direction, SimError};
use crate::simulation::{EventKind, Task, TaskContext};

/// New (acceleration, velocity) for one direction.
pub fn accelerate(accel_per_mass: f64, damping: f64, here: f64, there: f64, velocity: f64) -> (f64, f64) {
    let a = accel_per_mass * (here - there);
    (a, ((velocity + a) * damping).max(0.0))
}

/// Per-direction outflow fractions with a total of at most one.
pub fn outflow_fractions(velocity: [f64; 4]) -> [f64; 4] {
    let total: f64 = velocity.iter().sum();
    if total <= 1.0 {
        return velocity;
    }
    velocity.map(|v| v / total)
}

#[derive(Default)]
pub struct MagmaConvectionTask;

impl MagmaConvectionTask {
    pub fn new() -> Self {
        Self
    }
}

impl Task for MagmaConvectionTask {
    fn name(&self) -> &str {
        "magma-convection"
    }

    fn perform(&mut self, ctx: &TaskContext<'_>, x: u32, y: u32) -> Result<(), SimError> {
        let cfg = &ctx.config.magma;
        let (here, old_velocity) = ctx.read(x, y, |c| (c.magma().value(), Direction::ALL.map(|d| c.velocity(d))))?;

        let mut accel = [0.0; 4];
        let mut velocity = [0.0; 4];
        let mut targets = [None; 4];
        for dir in Direction::ALL {
            let i = dir.index();
            let Some((nx, ny)) = ctx.neighbor(x, y, dir) else {
                continue;
            };
            let there = ctx.read(nx, ny, |c| c.magma().value())?;
            (accel[i], velocity[i]) = accelerate(cfg.acceleration, cfg.damping, here, there, old_velocity[i]);
            targets[i] = Some((nx, ny));
        }

        let fractions = outflow_fractions(velocity);
        let available = ctx.write(x, y, |c| {
            for dir in Direction::ALL {
                c.set_acceleration(dir, accel[dir.index()]);
                c.set_velocity(dir, velocity[dir.index()]);
            }
            c.magma().available()
        })?;

        // one failed direction does not stop the others
        let mut first_err = None;
        for (i, target) in targets.iter().enumerate() {
            let Some(to) = *target else {
                continue;
            };
            let sent = ctx.write(x, y, |c| c.magma_mut().remove(available * fractions[i]))?;
            if sent <= 0.0 {
                continue;
            }
            let delivered =
                ctx.transfer_reserved((x, y), to, EventKind::AddMagma(sent), |c| c.magma_mut().refund(sent));
            if let Err(e) = delivered {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn after(&mut self, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        ctx.for_each_owned(|cell| cell.commit_magma(ctx.config, ctx.catalog).map(|_| ()))
    }
}
