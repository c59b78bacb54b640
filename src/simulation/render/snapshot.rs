//! Render extraction - read-only per-cell view for display collaborators
//!
//! Pulled on demand, never pushed. Each cell is read through the timed
//! guard, so taking a snapshot while the planet is running is safe; cells
//! may then come from adjacent frames.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use crate::core::{SimError, SimulationConfig};
use crate::domain::{Cell, MaterialCatalog};
use crate::spatial::Grid;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellView {
    pub x: u32,
    pub y: u32,
    /// Rock column thickness (m).
    pub height: f64,
    pub temperature: f64,
    pub ocean_mass: f64,
    /// m
    pub ocean_depth: f64,
    pub magma: f64,
    /// Dominant material of the top stratum.
    pub material: Option<String>,
    pub color_index: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanetSnapshot {
    /// Frames started so far; never decreases.
    pub age: u64,
    pub size: u32,
    /// Row-major.
    pub cells: Vec<CellView>,
}

impl PlanetSnapshot {
    pub fn cell(&self, x: u32, y: u32) -> Option<&CellView> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells.get(y as usize * self.size as usize + x as usize)
    }

    pub fn total_ocean_mass(&self) -> f64 {
        self.cells.iter().map(|c| c.ocean_mass).sum()
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string(self).map_err(|e| SimError::Config(e.to_string()))
    }
}

pub(super) fn cell_view(
    grid: &Grid,
    config: &SimulationConfig,
    catalog: &MaterialCatalog,
    x: u32,
    y: u32,
) -> Result<CellView, SimError> {
    grid.guarded_read(x, y, config.guard_timeout(), |cell| view_of(cell, config, catalog, x, y))
}

fn view_of(cell: &Cell, config: &SimulationConfig, catalog: &MaterialCatalog, x: u32, y: u32) -> CellView {
    let material = cell.top_material().map(str::to_string);
    let color_index = material.as_deref().map_or(0, |name| catalog.color_index(name));
    CellView {
        x,
        y,
        height: cell.height(config.cell_area),
        temperature: cell.temperature(),
        ocean_mass: cell.ocean().value(),
        ocean_depth: cell.ocean_depth(config),
        magma: cell.magma().value(),
        material,
        color_index,
    }
}

pub(super) fn snapshot(
    grid: &Grid,
    config: &SimulationConfig,
    catalog: &MaterialCatalog,
    age: u64,
) -> Result<PlanetSnapshot, SimError> {
    let count = grid.cell_count();

    #[cfg(feature = "parallel")]
    let cells: Result<Vec<CellView>, SimError> = (0..count)
        .into_par_iter()
        .map(|idx| {
            let (x, y) = grid.coords(idx);
            cell_view(grid, config, catalog, x, y)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let cells: Result<Vec<CellView>, SimError> = (0..count)
        .map(|idx| {
            let (x, y) = grid.coords(idx);
            cell_view(grid, config, catalog, x, y)
        })
        .collect();

    Ok(PlanetSnapshot { age, size: grid.size(), cells: cells? })
}
