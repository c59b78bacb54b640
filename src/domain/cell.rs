//! Cell - per-position simulation state
//!
//! Holds temperature, magma, a 4-direction velocity/acceleration field, the
//! ocean column, suspended sediment and the strata stack. A cell owns no
//! synchronization; the grid wraps each one in its cross-thread guard.
//!
//! Everything a pass both reads and writes is staged and committed at a
//! single apply point:
//! - temperature: `stage_heat` / `apply_heat`
//! - ocean, sediment, erosion: `commit_hydrology`
//! - magma: `commit_magma`

use crate::core::{Direction, SimError, SimulationConfig};

use super::content::MaterialCatalog;
use super::strata::Strata;
use super::tbuffer::TBuffer;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    temperature: f64,
    heat_delta: f64,
    magma: TBuffer,
    velocity: [f64; 4],
    acceleration: [f64; 4],
    ocean: TBuffer,
    sediment: TBuffer,
    pending_erosion: f64,
    strata: Strata,
}

/// What one hydrology commit did to the cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HydroCommit {
    pub eroded: f64,
    pub deposited: f64,
}

impl Cell {
    pub fn new(temperature: f64, strata: Strata) -> Self {
        Self { temperature: temperature.max(0.0), strata, ..Self::default() }
    }

    /// Single-stratum cell of `mass` kg of a catalog rock.
    pub fn with_rock(
        catalog: &MaterialCatalog,
        rock: &str,
        mass: f64,
        temperature: f64,
    ) -> Result<Self, SimError> {
        let mut strata = Strata::new();
        strata.deposit(catalog.material(rock, mass)?);
        Ok(Self::new(temperature, strata))
    }

    pub fn with_ocean(mut self, mass: f64) -> Self {
        self.ocean.reset(mass);
        self
    }

    pub fn with_magma(mut self, mass: f64) -> Self {
        self.magma.reset(mass);
        self
    }

    // === Temperature ===

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature.max(0.0);
        self.heat_delta = 0.0;
    }

    /// Immediate temperature change, used between passes.
    pub fn add_temperature(&mut self, delta: f64) {
        self.temperature = (self.temperature + delta).max(0.0);
    }

    /// Stage a temperature change; visible after `apply_heat`.
    #[inline]
    pub fn stage_heat(&mut self, delta: f64) {
        self.heat_delta += delta;
    }

    #[inline]
    pub fn staged_heat(&self) -> f64 {
        self.heat_delta
    }

    pub fn apply_heat(&mut self) -> f64 {
        self.temperature = (self.temperature + self.heat_delta).max(0.0);
        self.heat_delta = 0.0;
        self.temperature
    }

    /// J/K of the whole column.
    pub fn heat_capacity(&self) -> f64 {
        self.strata.heat_capacity()
    }

    // === Magma and velocity field ===

    pub fn magma(&self) -> &TBuffer {
        &self.magma
    }

    pub fn magma_mut(&mut self) -> &mut TBuffer {
        &mut self.magma
    }

    #[inline]
    pub fn velocity(&self, dir: Direction) -> f64 {
        self.velocity[dir.index()]
    }

    #[inline]
    pub fn set_velocity(&mut self, dir: Direction, v: f64) {
        self.velocity[dir.index()] = v;
    }

    #[inline]
    pub fn acceleration(&self, dir: Direction) -> f64 {
        self.acceleration[dir.index()]
    }

    #[inline]
    pub fn set_acceleration(&mut self, dir: Direction, a: f64) {
        self.acceleration[dir.index()] = a;
    }

    /// Commit magma transfers, then solidify part of the melt when the cell
    /// has cooled below the solidus. Returns the solidified mass.
    pub fn commit_magma(&mut self, config: &SimulationConfig, catalog: &MaterialCatalog) -> Result<f64, SimError> {
        self.magma.apply();
        if self.temperature >= config.magma.solidus || self.magma.value() <= 0.0 {
            return Ok(0.0);
        }
        let wanted = self.magma.value() * config.magma.solidify_rate;
        if wanted <= 0.0 {
            return Ok(0.0);
        }
        // resolve the rock before any magma leaves the cell
        let rock = catalog.material(&config.magma.rock_material, wanted)?;
        let solid = self.magma.remove(wanted);
        self.magma.apply();
        self.strata.deposit(rock);
        Ok(solid)
    }

    // === Hydrosphere ===

    pub fn ocean(&self) -> &TBuffer {
        &self.ocean
    }

    pub fn ocean_mut(&mut self) -> &mut TBuffer {
        &mut self.ocean
    }

    pub fn sediment(&self) -> &TBuffer {
        &self.sediment
    }

    pub fn sediment_mut(&mut self) -> &mut TBuffer {
        &mut self.sediment
    }

    /// Committed ocean depth in meters.
    pub fn ocean_depth(&self, config: &SimulationConfig) -> f64 {
        self.ocean.value() / (config.water_density * config.cell_area)
    }

    /// Water surface height: rock column plus ocean depth.
    pub fn surface_height(&self, config: &SimulationConfig) -> f64 {
        self.height(config.cell_area) + self.ocean_depth(config)
    }

    /// Loose sediment already sitting in the top stratum.
    pub fn loose_sediment(&self, config: &SimulationConfig) -> f64 {
        self.strata
            .top()
            .map(|l| l.mass_of(&config.hydro.sediment_material))
            .unwrap_or(0.0)
    }

    /// Request erosion of the top stratum at the next hydrology commit.
    pub fn stage_erosion(&mut self, mass: f64) {
        if mass > 0.0 {
            self.pending_erosion += mass;
        }
    }

    #[inline]
    pub fn staged_erosion(&self) -> f64 {
        self.pending_erosion
    }

    /// Apply point for ocean, erosion and sediment.
    ///
    /// Order: ocean transfers, erosion of the top stratum into suspension
    /// (skipped while loose sediment is above the threshold), sediment
    /// transfers, then deposit of whatever exceeds the column's capacity.
    pub fn commit_hydrology(
        &mut self,
        config: &SimulationConfig,
        catalog: &MaterialCatalog,
    ) -> Result<HydroCommit, SimError> {
        let mut out = HydroCommit::default();
        self.ocean.apply();

        let erosion = std::mem::take(&mut self.pending_erosion);
        if erosion > 0.0 && self.loose_sediment(config) < config.hydro.loose_sediment_threshold {
            let factor = self.strata.top().map(|l| l.erosion_factor()).unwrap_or(0.0);
            out.eroded = self.strata.erode_top(erosion * factor);
            self.sediment.add(out.eroded);
        }

        self.sediment.apply();

        let capacity = config.hydro.sediment_capacity * self.ocean.value();
        let excess = self.sediment.value() - capacity;
        if excess > 0.0 {
            let settled = catalog.material(&config.hydro.sediment_material, excess)?;
            self.sediment.reset(capacity);
            self.strata.deposit(settled);
            out.deposited = excess;
        }
        Ok(out)
    }

    // === Strata ===

    pub fn strata(&self) -> &Strata {
        &self.strata
    }

    pub fn strata_mut(&mut self) -> &mut Strata {
        &mut self.strata
    }

    /// Rock column thickness in meters.
    pub fn height(&self, area: f64) -> f64 {
        self.strata.thickness(area)
    }

    /// Name of the dominant material of the top stratum.
    pub fn top_material(&self) -> Option<&str> {
        self.strata.top().and_then(|l| l.dominant()).map(|m| m.name())
    }
}
