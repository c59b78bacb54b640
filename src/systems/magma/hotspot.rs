use crate::core::rng::Xorshift32;
use crate::core::SimError;
use crate::simulation::{Task, TaskContext};

/// Seeds up to `max_hotspots` magma/heat hotspots in its worker's
/// partition, once. All of the work happens in `check`, which then returns
/// `false` so no per-cell pass runs, and the manager trims the task.
#[derive(Default)]
pub struct HotspotSeedTask {
    seeded: Vec<(u32, u32)>,
}

impl HotspotSeedTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(&self) -> &[(u32, u32)] {
        &self.seeded
    }

    fn seed(&mut self, ctx: &TaskContext<'_>) -> Result<(), SimError> {
        let cfg = &ctx.config.magma;
        let b = ctx.bounds;
        if b.is_empty() {
            return Ok(());
        }
        let mut rng = Xorshift32::for_worker(cfg.seed, ctx.worker);
        for _ in 0..cfg.max_hotspots {
            let x = b.lower_x() + rng.below(b.width());
            let y = b.lower_y() + rng.below(b.height());
            ctx.write(x, y, |c| {
                c.magma_mut().credit(cfg.hotspot_magma);
                c.add_temperature(cfg.hotspot_heat);
            })?;
            log::debug!("worker {}: hotspot at ({}, {})", ctx.worker, x, y);
            self.seeded.push((x, y));
        }
        Ok(())
    }
}

impl Task for HotspotSeedTask {
    fn name(&self) -> &str {
        "hotspot-seed"
    }

    fn check(&mut self, ctx: &TaskContext<'_>) -> bool {
        if let Err(e) = self.seed(ctx) {
            log::warn!("worker {}: hotspot seeding failed: {}", ctx.worker, e);
        }
        false
    }

    fn perform(&mut self, _ctx: &TaskContext<'_>, _x: u32, _y: u32) -> Result<(), SimError> {
        Ok(())
    }

    fn single_shot(&self) -> bool {
        true
    }
}
