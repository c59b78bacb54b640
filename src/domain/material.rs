/// A named amount of one rock or sediment type.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    name: String,
    mass: f64,
    density: f64,
    specific_heat: f64,
    erosion_factor: f64,
}

impl Material {
    pub fn new(name: &str, mass: f64, density: f64, specific_heat: f64, erosion_factor: f64) -> Self {
        Self {
            name: name.to_string(),
            mass: mass.max(0.0),
            density,
            specific_heat,
            erosion_factor,
        }
    }

    #[inline]
    pub fn name(&self) -> &str { &self.name }

    #[inline]
    pub fn mass(&self) -> f64 { self.mass }

    #[inline]
    pub fn density(&self) -> f64 { self.density }

    #[inline]
    pub fn specific_heat(&self) -> f64 { self.specific_heat }

    #[inline]
    pub fn erosion_factor(&self) -> f64 { self.erosion_factor }

    /// Volume in m^3.
    #[inline]
    pub fn volume(&self) -> f64 {
        if self.density > 0.0 { self.mass / self.density } else { 0.0 }
    }

    pub(crate) fn add_mass(&mut self, mass: f64) {
        self.mass += mass.max(0.0);
    }

    /// Remove up to `mass`, returning what was actually taken.
    pub(crate) fn take_mass(&mut self, mass: f64) -> f64 {
        let taken = mass.clamp(0.0, self.mass);
        self.mass -= taken;
        taken
    }

    /// Same material with a different amount.
    pub fn with_mass(&self, mass: f64) -> Self {
        Self { mass: mass.max(0.0), ..self.clone() }
    }
}
