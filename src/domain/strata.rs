//! Strata - ordered stack of layers, bottom first
//!
//! Layers are addressed by stack index instead of linking to each other.
//! `above`/`below` answer the neighbor question, and insertion or removal
//! shifts indices without any per-layer bookkeeping.

use super::layer::Layer;
use super::material::Material;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Strata {
    layers: Vec<Layer>,
}

impl Strata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from layers listed bottom to top. Empty layers are dropped.
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        let mut strata = Self { layers };
        strata.prune();
        strata
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn bottom(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn top_index(&self) -> Option<usize> {
        self.layers.len().checked_sub(1)
    }

    /// Index of the layer directly above `index`.
    pub fn above(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.layers.len()).then_some(next)
    }

    /// Index of the layer directly below `index`.
    pub fn below(&self, index: usize) -> Option<usize> {
        (index > 0 && index < self.layers.len()).then(|| index - 1)
    }

    pub fn push_top(&mut self, layer: Layer) {
        if !layer.is_empty() {
            self.layers.push(layer);
        }
    }

    /// Insert at `index` (clamped to the top), shifting layers above it up.
    pub fn insert(&mut self, index: usize, layer: Layer) {
        if layer.is_empty() {
            return;
        }
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
    }

    pub fn remove(&mut self, index: usize) -> Option<Layer> {
        (index < self.layers.len()).then(|| self.layers.remove(index))
    }

    /// Deposit onto the top stratum when it already carries this material,
    /// otherwise start a new stratum.
    pub fn deposit(&mut self, material: Material) {
        if material.mass() <= 0.0 {
            return;
        }
        match self.layers.last_mut() {
            Some(top) if top.mass_of(material.name()) > 0.0 => top.add_material(material),
            _ => self.layers.push(Layer::from_material(material)),
        }
    }

    /// Remove up to `mass` from the topmost stratum only. Returns what was
    /// removed; an emptied stratum is pruned.
    pub fn erode_top(&mut self, mass: f64) -> f64 {
        let Some(top) = self.layers.last_mut() else {
            return 0.0;
        };
        let removed = top.remove_material(mass);
        if top.is_empty() {
            self.layers.pop();
        }
        removed
    }

    pub fn total_mass(&self) -> f64 {
        self.layers.iter().map(Layer::total_mass).sum()
    }

    pub fn heat_capacity(&self) -> f64 {
        self.layers.iter().map(Layer::heat_capacity).sum()
    }

    /// Mass-weighted specific heat of the whole column.
    pub fn specific_heat(&self) -> f64 {
        let mass = self.total_mass();
        if mass > 0.0 { self.heat_capacity() / mass } else { 0.0 }
    }

    /// Column thickness in meters over a cell of `area` m^2.
    pub fn thickness(&self, area: f64) -> f64 {
        if area <= 0.0 {
            return 0.0;
        }
        self.layers.iter().map(Layer::volume).sum::<f64>() / area
    }

    /// Drop every empty stratum.
    pub fn prune(&mut self) {
        self.layers.retain(|l| !l.is_empty());
    }
}
