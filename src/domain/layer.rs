//! Layer - one stratum in a cell's vertical stack
//!
//! A layer is an aggregate of named materials. Its density, specific heat,
//! erosion factor and mass are derived from the materials every time they
//! are asked for; nothing is cached across mutations.

use super::material::Material;

/// Masses at or below this are treated as gone.
pub const MASS_EPSILON: f64 = 1.0e-9;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    materials: Vec<Material>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_material(material: Material) -> Self {
        let mut layer = Self::new();
        layer.add_material(material);
        layer
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Add a material, merging with an existing entry of the same name.
    pub fn add_material(&mut self, material: Material) {
        if material.mass() <= MASS_EPSILON {
            return;
        }
        match self.materials.iter_mut().find(|m| m.name() == material.name()) {
            Some(existing) => existing.add_mass(material.mass()),
            None => self.materials.push(material),
        }
    }

    /// Remove `mass` spread over all materials in proportion to their share.
    /// Returns the mass actually removed (never more than the layer holds).
    pub fn remove_material(&mut self, mass: f64) -> f64 {
        let total = self.total_mass();
        if mass <= 0.0 || total <= 0.0 {
            return 0.0;
        }
        if mass >= total {
            self.materials.clear();
            return total;
        }

        let fraction = mass / total;
        let mut removed = 0.0;
        for m in self.materials.iter_mut() {
            let share = m.mass() * fraction;
            removed += m.take_mass(share);
        }
        self.prune();
        removed
    }

    /// Remove up to `mass` of one named material.
    pub fn remove_named(&mut self, name: &str, mass: f64) -> f64 {
        let removed = match self.materials.iter_mut().find(|m| m.name() == name) {
            Some(m) => m.take_mass(mass),
            None => 0.0,
        };
        self.prune();
        removed
    }

    pub fn mass_of(&self, name: &str) -> f64 {
        self.materials
            .iter()
            .filter(|m| m.name() == name)
            .map(Material::mass)
            .sum()
    }

    pub fn total_mass(&self) -> f64 {
        self.materials.iter().map(Material::mass).sum()
    }

    pub fn volume(&self) -> f64 {
        self.materials.iter().map(Material::volume).sum()
    }

    /// Bulk density: total mass over total volume.
    pub fn density(&self) -> f64 {
        let volume = self.volume();
        if volume > 0.0 { self.total_mass() / volume } else { 0.0 }
    }

    /// Mass-weighted specific heat.
    pub fn specific_heat(&self) -> f64 {
        self.mass_weighted(Material::specific_heat)
    }

    /// Mass-weighted erosion factor.
    pub fn erosion_factor(&self) -> f64 {
        self.mass_weighted(Material::erosion_factor)
    }

    /// Total heat capacity (J/K).
    pub fn heat_capacity(&self) -> f64 {
        self.materials.iter().map(|m| m.mass() * m.specific_heat()).sum()
    }

    /// Material with the largest mass.
    pub fn dominant(&self) -> Option<&Material> {
        self.materials
            .iter()
            .max_by(|a, b| a.mass().total_cmp(&b.mass()))
    }

    pub fn is_empty(&self) -> bool {
        self.total_mass() <= MASS_EPSILON
    }

    fn mass_weighted(&self, prop: impl Fn(&Material) -> f64) -> f64 {
        let total = self.total_mass();
        if total <= 0.0 {
            return 0.0;
        }
        self.materials.iter().map(|m| prop(m) * m.mass()).sum::<f64>() / total
    }

    fn prune(&mut self) {
        self.materials.retain(|m| m.mass() > MASS_EPSILON);
    }
}
