//! Material catalog - named rock/sediment properties
//!
//! Layers store material *amounts*; the catalog is where a name is turned
//! into density, specific heat, erosion factor and the color index renderers
//! key on. Ships with a built-in set and can be replaced from a JSON bundle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::SimError;

use super::material::Material;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialProps {
    pub name: String,
    /// kg/m^3
    pub density: f64,
    /// J/(kg K)
    pub specific_heat: f64,
    /// 0 = unerodible, 1 = loose
    pub erosion_factor: f64,
    pub color_index: u32,
}

#[derive(Deserialize)]
struct BundleRoot {
    materials: Vec<MaterialProps>,
}

#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    props: Vec<MaterialProps>,
    by_name: HashMap<String, usize>,
}

impl MaterialCatalog {
    pub fn builtin() -> Self {
        let table = [
            ("granite", 2_700.0, 790.0, 0.3, 1),
            ("basalt", 3_000.0, 840.0, 0.4, 2),
            ("sandstone", 2_300.0, 920.0, 0.8, 3),
            ("limestone", 2_500.0, 880.0, 0.6, 4),
            ("sediment", 1_600.0, 800.0, 1.0, 5),
        ];
        let props: Vec<MaterialProps> = table
            .iter()
            .map(|&(name, density, specific_heat, erosion_factor, color_index)| MaterialProps {
                name: name.to_string(),
                density,
                specific_heat,
                erosion_factor,
                color_index,
            })
            .collect();
        let by_name = props
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.name.clone(), idx))
            .collect();
        Self { props, by_name }
    }

    pub fn from_bundle_json(json: &str) -> Result<Self, SimError> {
        let bundle: BundleRoot =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        Self::from_props(bundle.materials)
    }

    fn from_props(props: Vec<MaterialProps>) -> Result<Self, SimError> {
        let mut by_name = HashMap::with_capacity(props.len());
        for (idx, p) in props.iter().enumerate() {
            if p.name.is_empty() {
                return Err(SimError::Config(format!("material #{} has an empty name", idx)));
            }
            if !(p.density > 0.0) || !(p.specific_heat > 0.0) {
                return Err(SimError::Config(format!(
                    "material {} needs positive density and specific heat",
                    p.name
                )));
            }
            if !(0.0..=1.0).contains(&p.erosion_factor) {
                return Err(SimError::Config(format!(
                    "material {} erosion_factor {} is outside [0, 1]",
                    p.name, p.erosion_factor
                )));
            }
            if by_name.insert(p.name.clone(), idx).is_some() {
                return Err(SimError::Config(format!("duplicate material {}", p.name)));
            }
        }
        Ok(Self { props, by_name })
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn props(&self, name: &str) -> Option<&MaterialProps> {
        self.by_name.get(name).map(|&idx| &self.props[idx])
    }

    /// Fail with `SimError::Config` unless `name` is in the catalog.
    /// `role` names what the material is used for in the message.
    pub fn require(&self, name: &str, role: &str) -> Result<&MaterialProps, SimError> {
        self.props(name)
            .ok_or_else(|| SimError::Config(format!("{} material `{}` is not in the catalog", role, name)))
    }

    /// Color index for a material name; 0 when unknown.
    pub fn color_index(&self, name: &str) -> u32 {
        self.props(name).map(|p| p.color_index).unwrap_or(0)
    }

    /// Instantiate `mass` kg of a named material.
    pub fn material(&self, name: &str, mass: f64) -> Result<Material, SimError> {
        let p = self
            .props(name)
            .ok_or_else(|| SimError::Config(format!("unknown material {}", name)))?;
        Ok(Material::new(&p.name, mass, p.density, p.specific_heat, p.erosion_factor))
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
