//! Domain - per-cell geological state
//!
//! - material / layer / strata: the vertical stack of deposits
//! - tbuffer:                   two-phase transfer buffers
//! - cell:                      everything one grid position holds
//! - content:                   named material properties

pub mod cell;
pub mod content;
pub mod layer;
pub mod material;
pub mod strata;
pub mod tbuffer;

pub use cell::{Cell, HydroCommit};
pub use content::{MaterialCatalog, MaterialProps};
pub use layer::Layer;
pub use material::Material;
pub use strata::Strata;
pub use tbuffer::TBuffer;
